use std::io::Write;

use anyhow::{anyhow, bail, Result};
use chrono::{Local, NaiveDate};

use crate::cli::{
    BoardArgs, CliCommand, ListCommand, LoginArgs, RegisterArgs, TaskAddArgs, TaskCommand,
    TaskEditArgs, ThemeArgs,
};
use crate::core::{greeting, Gateway, ListDraft, TaskDraft, Workspace, WorkspaceError};
use crate::model::{parse_due_date, ListKey, Theme};
use crate::render;

/// Run one command against `workspace`, writing human-readable output to `writer`.
pub async fn execute<G: Gateway, W: Write>(
    workspace: &mut Workspace<G>,
    command: CliCommand,
    mut writer: W,
) -> Result<()> {
    let today = Local::now().date_naive();
    match command {
        CliCommand::Register(args) => handle_register(workspace, &args, &mut writer).await,
        CliCommand::Login(args) => handle_login(workspace, &args, &mut writer).await,
        CliCommand::Logout => {
            workspace.logout().map_err(describe)?;
            writeln!(writer, "Signed out")?;
            Ok(())
        }
        CliCommand::Whoami => {
            match workspace.current_user() {
                Some(user) => {
                    writeln!(writer, "{}", greeting(user, Local::now().time()))?;
                    writeln!(writer, "Signed in as {} (user {})", user.username, user.id)?;
                }
                None => writeln!(writer, "Not signed in")?,
            }
            Ok(())
        }
        CliCommand::Board(args) => handle_board(workspace, &args, today, &mut writer).await,
        CliCommand::Task(command) => handle_task(workspace, command, &mut writer).await,
        CliCommand::List(command) => handle_list(workspace, command, today, &mut writer).await,
        CliCommand::Theme(args) => handle_theme(workspace, &args, &mut writer),
    }
}

/// Turn workspace failures into messages that tell the user what to do next.
fn describe(err: WorkspaceError) -> anyhow::Error {
    match err {
        WorkspaceError::NotAuthenticated => {
            anyhow!("Not signed in. Run `taskboard login` first.")
        }
        err if err.is_unauthorized() => {
            anyhow!("{err}. Your session has ended; run `taskboard login` again.")
        }
        err => anyhow!(err),
    }
}

async fn handle_register<G: Gateway, W: Write>(
    workspace: &mut Workspace<G>,
    args: &RegisterArgs,
    mut writer: W,
) -> Result<()> {
    let response = workspace
        .register(&args.name, &args.username, &args.password)
        .await?;
    match response.user_id {
        Some(user_id) => writeln!(writer, "Registered {} (user {user_id})", args.username)?,
        None => writeln!(writer, "Registered {}", args.username)?,
    }
    writeln!(writer, "Run `taskboard login` to sign in.")?;
    Ok(())
}

async fn handle_login<G: Gateway, W: Write>(
    workspace: &mut Workspace<G>,
    args: &LoginArgs,
    mut writer: W,
) -> Result<()> {
    // A rejected login is a wrong password, not an expired session.
    let user = workspace.login(&args.username, &args.password).await?;
    writeln!(writer, "Signed in as {} ({})", user.name, user.username)?;
    Ok(())
}

async fn handle_board<G: Gateway, W: Write>(
    workspace: &mut Workspace<G>,
    args: &BoardArgs,
    today: NaiveDate,
    mut writer: W,
) -> Result<()> {
    workspace.start().await.map_err(describe)?;

    let filters = workspace.filters_mut();
    if !args.status.is_empty() {
        filters.set_status_filter(args.status.iter().copied());
    }
    if let Some(window) = args.time {
        filters.set_time_filter(window);
    }
    if args.all_lists {
        filters.set_all_lists(true);
    } else if !args.lists.is_empty() {
        filters.set_lists_filter(args.lists.iter().copied());
    }

    let buckets = workspace.buckets(today);
    render::write_board(&mut writer, &buckets, workspace.filters(), today)?;
    Ok(())
}

async fn handle_task<G: Gateway, W: Write>(
    workspace: &mut Workspace<G>,
    command: TaskCommand,
    mut writer: W,
) -> Result<()> {
    match command {
        TaskCommand::Add(args) => {
            let draft = add_draft(&args)?;
            let task_id = workspace.create_task(&draft).await.map_err(describe)?;
            writeln!(writer, "Created task {task_id}")?;
        }
        TaskCommand::Edit(args) => {
            workspace.start().await.map_err(describe)?;
            let Some(task) = workspace.board().task(args.id) else {
                bail!("Task {} not found", args.id);
            };
            let draft = edit_draft(TaskDraft::from_task(task), &args)?;
            workspace
                .edit_task(args.id, &draft)
                .await
                .map_err(describe)?;
            writeln!(writer, "Updated task {}", args.id)?;
        }
        TaskCommand::Status(args) => {
            workspace.start().await.map_err(describe)?;
            workspace
                .change_status(args.id, args.status)
                .await
                .map_err(describe)?;
            writeln!(writer, "Moved task {} to {}", args.id, args.status)?;
        }
        TaskCommand::Delete(args) => {
            workspace.delete_task(args.id).await.map_err(describe)?;
            writeln!(writer, "Deleted task {}", args.id)?;
        }
    }
    Ok(())
}

fn add_draft(args: &TaskAddArgs) -> Result<TaskDraft> {
    let mut draft = TaskDraft::new(args.title.clone(), parse_due_date(&args.due)?);
    draft.description = args.description.clone();
    draft.status = args.status;
    draft.list_id = args.list.and_then(|key| key.list_id());
    Ok(draft)
}

fn edit_draft(mut draft: TaskDraft, args: &TaskEditArgs) -> Result<TaskDraft> {
    if let Some(title) = &args.title {
        draft.title = title.clone();
    }
    if let Some(due) = &args.due {
        draft.due_date = Some(parse_due_date(due)?);
    }
    if let Some(description) = &args.description {
        draft.description = Some(description.clone());
    }
    if let Some(status) = args.status {
        draft.status = status;
    }
    if let Some(list) = args.list {
        draft.list_id = list.list_id();
    }
    Ok(draft)
}

async fn handle_list<G: Gateway, W: Write>(
    workspace: &mut Workspace<G>,
    command: ListCommand,
    today: NaiveDate,
    mut writer: W,
) -> Result<()> {
    if !workspace.session().is_authenticated() {
        return Err(describe(WorkspaceError::NotAuthenticated));
    }
    // Edit and delete resolve ids against the loaded list set.
    if !matches!(command, ListCommand::Add(_)) {
        workspace.ensure_lists_loaded().await.map_err(describe)?;
    }

    match command {
        ListCommand::Show(args) => match args.list {
            None => render::write_lists(&mut writer, workspace.filters().user_lists())?,
            Some(key) => {
                let tasks = workspace.tasks_in_list(key).await.map_err(describe)?;
                let title = match key {
                    ListKey::Unlisted => "Tasks without a list".to_string(),
                    ListKey::List(id) => workspace
                        .filters()
                        .list(id)
                        .map(|list| format!("Tasks in {}", list.name))
                        .unwrap_or_else(|| format!("Tasks in list {id}")),
                };
                writeln!(writer, "{title}")?;
                render::write_tasks(&mut writer, &tasks, today)?;
            }
        },
        ListCommand::Add(args) => {
            let list_id = workspace
                .create_list(&ListDraft::new(args.name.clone(), args.color.clone()))
                .await
                .map_err(describe)?;
            writeln!(writer, "Created list {list_id}")?;
        }
        ListCommand::Edit(args) => {
            let Some(list) = workspace.filters().list(args.id) else {
                bail!("List {} not found", args.id);
            };
            let draft = ListDraft::new(
                args.name.clone().unwrap_or_else(|| list.name.clone()),
                args.color.clone().unwrap_or_else(|| list.color.clone()),
            );
            workspace
                .update_list(args.id, &draft)
                .await
                .map_err(describe)?;
            writeln!(writer, "Updated list {}", args.id)?;
        }
        ListCommand::Delete(args) => {
            workspace.delete_list(args.id).await.map_err(describe)?;
            writeln!(writer, "Deleted list {}", args.id)?;
        }
    }
    Ok(())
}

fn handle_theme<G: Gateway, W: Write>(
    workspace: &mut Workspace<G>,
    args: &ThemeArgs,
    mut writer: W,
) -> Result<()> {
    match args.theme {
        Some(theme) => {
            workspace.set_theme(theme).map_err(describe)?;
            writeln!(writer, "Theme set to {theme}")?;
        }
        None => {
            let current = workspace.filters().background();
            writeln!(writer, "Current theme: {current} ({})", current.style_class())?;
            let names = Theme::ALL
                .iter()
                .map(Theme::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(writer, "Available: {names}")?;
        }
    }
    Ok(())
}
