//! Typed contracts for the remote task store and credential service.
//!
//! Every operation resolves to [`ApiResult`]: either the decoded payload or an
//! [`ApiFailure`] carrying a user-facing message. Transport problems never escape
//! as raw errors.

mod http;
#[cfg(test)]
pub(crate) mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{List, ListId, NewList, NewTask, Task, TaskId, User, UserId};
use crate::session::BearerToken;

pub use http::HttpGateway;

pub type ApiResult<T> = Result<T, ApiFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Unreachable server, unreadable body, or malformed JSON.
    Transport,
    Validation,
    /// Credential missing, expired, or rejected.
    Unauthorized,
    NotFound,
    Conflict,
    Server,
}

impl FailureKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => FailureKind::Validation,
            401 | 403 => FailureKind::Unauthorized,
            404 => FailureKind::NotFound,
            409 => FailureKind::Conflict,
            _ => FailureKind::Server,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(operation: Operation) -> Self {
        Self::new(
            FailureKind::Transport,
            format!("An error occurred during {}", operation.label()),
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == FailureKind::Unauthorized
    }
}

/// Remote actions, used to pick log labels and fallback messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Register,
    FetchTasks,
    CreateTask,
    EditTask,
    DeleteTask,
    FetchLists,
    CreateList,
    EditList,
    DeleteList,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::Register => "registration",
            Operation::FetchTasks => "loading tasks",
            Operation::CreateTask => "task creation",
            Operation::EditTask => "task update",
            Operation::DeleteTask => "task deletion",
            Operation::FetchLists => "loading lists",
            Operation::CreateList => "list creation",
            Operation::EditList => "list update",
            Operation::DeleteList => "list deletion",
        }
    }

    /// Message used when a failed response carries none of its own.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Operation::Login => "Login failed",
            Operation::Register => "Registration failed",
            Operation::FetchTasks => "Failed to load tasks",
            Operation::CreateTask => "Failed to create task",
            Operation::EditTask => "Failed to update task",
            Operation::DeleteTask => "Failed to delete task",
            Operation::FetchLists => "Failed to load lists",
            Operation::CreateList => "Failed to create list",
            Operation::EditList => "Failed to update list",
            Operation::DeleteList => "Failed to delete list",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreated {
    #[serde(default)]
    pub message: String,
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCreated {
    #[serde(default)]
    pub message: String,
    pub list_id: ListId,
}

/// Remote store of users, lists, and tasks.
///
/// Authenticated operations take the bearer credential as an argument; callers
/// decide what to do when no session is available.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse>;

    async fn register(&self, request: &RegisterRequest) -> ApiResult<RegisterResponse>;

    async fn tasks_by_user(&self, user_id: UserId, token: &BearerToken) -> ApiResult<Vec<Task>>;

    /// Tasks filed under one list, or under no list when `list_id` is `None`.
    async fn tasks_by_list(
        &self,
        list_id: Option<ListId>,
        token: &BearerToken,
    ) -> ApiResult<Vec<Task>>;

    async fn create_task(&self, task: &NewTask, token: &BearerToken) -> ApiResult<TaskCreated>;

    async fn edit_task(&self, task: &Task, token: &BearerToken) -> ApiResult<MessageResponse>;

    async fn delete_task(&self, task_id: TaskId, token: &BearerToken)
        -> ApiResult<MessageResponse>;

    async fn lists_by_user(&self, user_id: UserId, token: &BearerToken) -> ApiResult<Vec<List>>;

    async fn create_list(&self, list: &NewList, token: &BearerToken) -> ApiResult<ListCreated>;

    async fn edit_list(&self, list: &List, token: &BearerToken) -> ApiResult<MessageResponse>;

    async fn delete_list(&self, list_id: ListId, token: &BearerToken)
        -> ApiResult<MessageResponse>;
}
