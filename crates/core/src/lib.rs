pub mod api;
pub mod board;
pub mod config;
pub mod filters;
pub mod model;
pub mod services;
pub mod session;
pub mod storage;

pub use api::{ApiFailure, ApiResult, FailureKind, Gateway, HttpGateway};
pub use board::{Board, Buckets, LoadState};
pub use config::AppConfig;
pub use filters::{FilterCriteria, FilterState, ListDraft, ListMutationError, ReloadRequest};
pub use model::*;
pub use services::{greeting, TaskDraft, Workspace, WorkspaceError, WorkspaceResult};
pub use session::{BearerToken, Credentials, SessionState};
pub use storage::LocalStore;
