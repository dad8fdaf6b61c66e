use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::model::{ListId, ListKey, TaskId, TaskStatus, Theme, TimeWindow};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskboard",
    version,
    about = "Kanban board client for a remote task service.",
    after_help = "Examples:\n  taskboard login --username alice --password password1\n  taskboard board --time 3 --status todo --status doing\n  taskboard task add \"Buy milk\" --due 2025-06-11 --list 7\n  taskboard list delete 7"
)]
pub struct Cli {
    /// Override the data directory (defaults to platform-specific app dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the task service (defaults to $TASKBOARD_API_URL or http://localhost:5000)
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Tracing filter for diagnostics on stderr (e.g. "info", "taskboard_core=debug")
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Create an account
    Register(RegisterArgs),
    /// Sign in and remember the session
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Greet the signed-in user
    Whoami,
    /// Print the board, one column per status
    Board(BoardArgs),
    /// Create, edit, move or delete tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Show and manage task lists
    #[command(subcommand)]
    List(ListCommand),
    /// Show or change the background theme
    Theme(ThemeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug, Clone)]
pub struct BoardArgs {
    /// Only show these statuses (repeat the flag; defaults to all)
    #[arg(long, value_enum, action = ArgAction::Append)]
    pub status: Vec<TaskStatus>,

    /// Due-date window
    #[arg(long, value_enum, value_name = "WINDOW")]
    pub time: Option<TimeWindow>,

    /// Only show tasks in these lists; `none` selects tasks without a list
    #[arg(
        long = "list",
        value_name = "ID|none",
        action = ArgAction::Append,
        allow_negative_numbers = true
    )]
    pub lists: Vec<ListKey>,

    /// Show every list plus tasks without a list (the default)
    #[arg(long, conflicts_with = "lists")]
    pub all_lists: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    /// Create a task
    Add(TaskAddArgs),
    /// Change fields of an existing task
    Edit(TaskEditArgs),
    /// Move a task to another column
    Status(TaskStatusArgs),
    /// Delete a task
    Delete(TaskDeleteArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TaskAddArgs {
    #[arg(value_name = "TITLE")]
    pub title: String,

    /// Due date (2025-06-11, 2025-06-11T09:00:00 or RFC 3339)
    #[arg(long = "due", value_name = "DATE")]
    pub due: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_enum, default_value = "todo")]
    pub status: TaskStatus,

    /// List id, or `none` (also `-1`)
    #[arg(long = "list", value_name = "ID|none", allow_negative_numbers = true)]
    pub list: Option<ListKey>,
}

#[derive(Args, Debug, Clone)]
pub struct TaskEditArgs {
    #[arg(value_name = "ID")]
    pub id: TaskId,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long = "due", value_name = "DATE")]
    pub due: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_enum)]
    pub status: Option<TaskStatus>,

    /// Move to another list, or `none` (also `-1`)
    #[arg(long = "list", value_name = "ID|none", allow_negative_numbers = true)]
    pub list: Option<ListKey>,
}

#[derive(Args, Debug, Clone)]
pub struct TaskStatusArgs {
    #[arg(value_name = "ID")]
    pub id: TaskId,

    #[arg(value_enum, value_name = "STATUS")]
    pub status: TaskStatus,
}

#[derive(Args, Debug, Clone)]
pub struct TaskDeleteArgs {
    #[arg(value_name = "ID")]
    pub id: TaskId,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListCommand {
    /// Print your lists, or the tasks of one list
    Show(ListShowArgs),
    /// Create a list
    Add(ListAddArgs),
    /// Rename or recolor a list
    Edit(ListEditArgs),
    /// Delete a list that no task uses
    Delete(ListDeleteArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListShowArgs {
    /// List id, or `none` (also `-1`) for tasks without a list
    #[arg(value_name = "ID|none", allow_negative_numbers = true)]
    pub list: Option<ListKey>,
}

#[derive(Args, Debug, Clone)]
pub struct ListAddArgs {
    #[arg(value_name = "NAME")]
    pub name: String,

    /// One of blue, green, yellow, orange, gray
    #[arg(long, default_value = "blue")]
    pub color: String,
}

#[derive(Args, Debug, Clone)]
pub struct ListEditArgs {
    #[arg(value_name = "ID")]
    pub id: ListId,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListDeleteArgs {
    #[arg(value_name = "ID")]
    pub id: ListId,
}

#[derive(Args, Debug, Clone)]
pub struct ThemeArgs {
    #[arg(value_enum, value_name = "NAME")]
    pub theme: Option<Theme>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn board_flags_collect_repeated_values() {
        let cli = Cli::try_parse_from([
            "taskboard", "board", "--status", "todo", "--status", "doing", "--time", "3",
            "--list", "7", "--list", "none",
        ])
        .unwrap();

        let CliCommand::Board(args) = cli.command else {
            panic!("expected board command");
        };
        assert_eq!(args.status, vec![TaskStatus::ToDo, TaskStatus::Doing]);
        assert_eq!(args.time, Some(TimeWindow::ThreeDays));
        assert_eq!(args.lists, vec![ListKey::List(ListId(7)), ListKey::Unlisted]);
    }

    #[test]
    fn minus_one_selects_tasks_without_a_list() {
        let cli = Cli::try_parse_from(["taskboard", "board", "--list", "-1", "--list", "4"]).unwrap();
        let CliCommand::Board(args) = cli.command else {
            panic!("expected board command");
        };
        assert_eq!(args.lists, vec![ListKey::Unlisted, ListKey::List(ListId(4))]);

        let cli = Cli::try_parse_from(["taskboard", "list", "show", "-1"]).unwrap();
        let CliCommand::List(ListCommand::Show(args)) = cli.command else {
            panic!("expected list show");
        };
        assert_eq!(args.list, Some(ListKey::Unlisted));

        let cli = Cli::try_parse_from(["taskboard", "task", "edit", "3", "--list", "-1"]).unwrap();
        let CliCommand::Task(TaskCommand::Edit(args)) = cli.command else {
            panic!("expected task edit");
        };
        assert_eq!(args.list, Some(ListKey::Unlisted));
    }

    #[test]
    fn all_lists_conflicts_with_explicit_lists() {
        let parsed = Cli::try_parse_from(["taskboard", "board", "--all-lists", "--list", "3"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "taskboard",
            "whoami",
            "--api-url",
            "http://tasks.internal:8080",
            "--log",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://tasks.internal:8080"));
        assert_eq!(cli.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn task_add_requires_due_date() {
        assert!(Cli::try_parse_from(["taskboard", "task", "add", "Buy milk"]).is_err());

        let cli = Cli::try_parse_from([
            "taskboard", "task", "add", "Buy milk", "--due", "2025-06-11", "--list", "none",
        ])
        .unwrap();
        let CliCommand::Task(TaskCommand::Add(args)) = cli.command else {
            panic!("expected task add");
        };
        assert_eq!(args.status, TaskStatus::ToDo);
        assert_eq!(args.list, Some(ListKey::Unlisted));
    }

    #[test]
    fn unknown_theme_is_rejected() {
        assert!(Cli::try_parse_from(["taskboard", "theme", "magenta"]).is_err());
        let cli = Cli::try_parse_from(["taskboard", "theme", "pink"]).unwrap();
        let CliCommand::Theme(args) = cli.command else {
            panic!("expected theme command");
        };
        assert_eq!(args.theme, Some(Theme::Pink));
    }
}
