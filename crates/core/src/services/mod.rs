mod workspace;

pub use workspace::{greeting, TaskDraft, Workspace, WorkspaceError, WorkspaceResult};
