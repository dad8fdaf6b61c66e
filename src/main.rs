use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    let cli = taskboard::cli::Cli::parse();
    taskboard::logging::init_tracing(cli.log_filter.as_deref())?;

    let config = taskboard::config::from_cli(&cli)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        let mut workspace = taskboard::Workspace::open(config)?;
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        taskboard::commands::execute(&mut workspace, cli.command, &mut handle).await
    })
}
