pub use taskboard_cli::cli;
pub use taskboard_cli::commands;
pub use taskboard_cli::config;
pub use taskboard_cli::logging;
pub use taskboard_cli::render;
pub use taskboard_cli::AppConfig;

pub use taskboard_core as core;
pub use taskboard_core::model;
pub use taskboard_core::{Workspace, WorkspaceError};
