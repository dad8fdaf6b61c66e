//! In-process gateway honoring the remote contract, for exercising the engine in tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    ApiFailure, ApiResult, FailureKind, Gateway, ListCreated, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, RegisterResponse, TaskCreated,
};
use crate::model::{List, ListId, NewList, NewTask, Task, TaskId, User, UserId};
use crate::session::BearerToken;

#[derive(Debug, Default)]
struct Store {
    users: Vec<(User, String)>,
    tokens: HashMap<String, UserId>,
    lists: Vec<List>,
    tasks: Vec<Task>,
    next_id: i64,
    fail_edits: bool,
    conflict_status: bool,
    reject_list_reads: bool,
    task_fetches: usize,
    list_fetches: usize,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn owner(&self, token: &BearerToken) -> ApiResult<UserId> {
        self.tokens
            .get(token.as_str())
            .copied()
            .ok_or_else(|| ApiFailure::new(FailureKind::Unauthorized, "Unauthorized"))
    }

    /// Join list metadata the way the server does at query time.
    fn joined(&self, task: &Task) -> Task {
        let mut task = task.clone();
        if let Some(list) = task
            .list_id
            .and_then(|id| self.lists.iter().find(|list| list.id == id))
        {
            task.list_name = Some(list.name.clone());
            task.list_color = Some(list.color.clone());
        } else {
            task.list_name = None;
            task.list_color = Some("gray".into());
        }
        task
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryGateway {
    store: Mutex<Store>,
}

impl MemoryGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut Store) -> T) -> T {
        let mut store = self.store.lock().unwrap();
        f(&mut store)
    }

    /// Seed a user and hand back an already issued credential.
    pub(crate) fn seed_user(&self, username: &str) -> (User, BearerToken) {
        self.with_store(|store| {
            let id = UserId(store.next_id());
            let user = User {
                id,
                name: username.to_string(),
                username: username.to_string(),
            };
            store.users.push((user.clone(), "password".into()));
            let token = format!("token-{username}");
            store.tokens.insert(token.clone(), id);
            (user, BearerToken::new(token))
        })
    }

    pub(crate) fn seed_list(&self, user_id: UserId, name: &str, color: &str) -> List {
        self.with_store(|store| {
            let list = List {
                id: ListId(store.next_id()),
                user_id,
                name: name.to_string(),
                color: color.to_string(),
            };
            store.lists.push(list.clone());
            list
        })
    }

    pub(crate) fn seed_task(&self, mut task: Task) -> Task {
        self.with_store(|store| {
            task.id = TaskId(store.next_id());
            store.tasks.push(task.clone());
            task
        })
    }

    /// Pin a denormalized list name on a task, as a stale server join would.
    pub(crate) fn pin_list_name(&self, task_id: TaskId, name: &str) {
        self.with_store(|store| {
            if let Some(task) = store.tasks.iter_mut().find(|task| task.id == task_id) {
                task.list_name = Some(name.to_string());
            }
        });
    }

    pub(crate) fn fail_edits(&self, fail: bool) {
        self.with_store(|store| store.fail_edits = fail);
    }

    /// Answer referenced-list deletes with 409 instead of the legacy 404.
    pub(crate) fn use_conflict_status(&self, enabled: bool) {
        self.with_store(|store| store.conflict_status = enabled);
    }

    /// Answer list reads with 401 while other calls keep working.
    pub(crate) fn reject_list_reads(&self, reject: bool) {
        self.with_store(|store| store.reject_list_reads = reject);
    }

    pub(crate) fn revoke(&self, token: &BearerToken) {
        self.with_store(|store| {
            store.tokens.remove(token.as_str());
        });
    }

    pub(crate) fn stored_task(&self, task_id: TaskId) -> Option<Task> {
        self.with_store(|store| store.tasks.iter().find(|task| task.id == task_id).cloned())
    }

    pub(crate) fn task_fetches(&self) -> usize {
        self.with_store(|store| store.task_fetches)
    }

    pub(crate) fn list_fetches(&self) -> usize {
        self.with_store(|store| store.list_fetches)
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        self.with_store(|store| {
            let user = store
                .users
                .iter()
                .find(|(user, password)| {
                    user.username == request.username && *password == request.password
                })
                .map(|(user, _)| user.clone())
                .ok_or_else(|| {
                    ApiFailure::new(FailureKind::Unauthorized, "Invalid username or password.")
                })?;
            let token = format!("token-{}-{}", user.username, store.next_id());
            store.tokens.insert(token.clone(), user.id);
            Ok(LoginResponse {
                message: "Login successful.".into(),
                token,
                user,
            })
        })
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<RegisterResponse> {
        self.with_store(|store| {
            if store
                .users
                .iter()
                .any(|(user, _)| user.username == request.username)
            {
                return Err(ApiFailure::new(
                    FailureKind::Validation,
                    "Username already exists.",
                ));
            }
            let id = UserId(store.next_id());
            store.users.push((
                User {
                    id,
                    name: request.name.clone(),
                    username: request.username.clone(),
                },
                request.password.clone(),
            ));
            Ok(RegisterResponse {
                message: "User registered successfully.".into(),
                user_id: Some(id),
            })
        })
    }

    async fn tasks_by_user(&self, user_id: UserId, token: &BearerToken) -> ApiResult<Vec<Task>> {
        self.with_store(|store| {
            store.owner(token)?;
            store.task_fetches += 1;
            Ok(store
                .tasks
                .iter()
                .filter(|task| task.user_id == user_id)
                .map(|task| {
                    if task.list_name.is_some() {
                        task.clone()
                    } else {
                        store.joined(task)
                    }
                })
                .collect())
        })
    }

    async fn tasks_by_list(
        &self,
        list_id: Option<ListId>,
        token: &BearerToken,
    ) -> ApiResult<Vec<Task>> {
        self.with_store(|store| {
            let owner = store.owner(token)?;
            Ok(store
                .tasks
                .iter()
                .filter(|task| task.user_id == owner && task.list_id == list_id)
                .map(|task| store.joined(task))
                .collect())
        })
    }

    async fn create_task(&self, task: &NewTask, token: &BearerToken) -> ApiResult<TaskCreated> {
        self.with_store(|store| {
            store.owner(token)?;
            let id = TaskId(store.next_id());
            store.tasks.push(Task {
                id,
                user_id: task.user_id,
                title: task.title.clone(),
                description: task.description.clone(),
                due_date: task.due_date,
                status: task.status,
                list_id: task.list_id,
                list_name: None,
                list_color: None,
            });
            Ok(TaskCreated {
                message: "Task created successfully".into(),
                task_id: id,
            })
        })
    }

    async fn edit_task(&self, task: &Task, token: &BearerToken) -> ApiResult<MessageResponse> {
        self.with_store(|store| {
            let owner = store.owner(token)?;
            if store.fail_edits {
                return Err(ApiFailure::new(FailureKind::Server, "Failed to update task"));
            }
            let Some(existing) = store
                .tasks
                .iter_mut()
                .find(|existing| existing.id == task.id && existing.user_id == owner)
            else {
                return Err(ApiFailure::new(
                    FailureKind::NotFound,
                    "Task not found or update failed.",
                ));
            };
            *existing = Task {
                list_name: existing.list_name.clone(),
                list_color: existing.list_color.clone(),
                ..task.clone()
            };
            Ok(MessageResponse {
                message: "Task updated successfully.".into(),
            })
        })
    }

    async fn delete_task(
        &self,
        task_id: TaskId,
        token: &BearerToken,
    ) -> ApiResult<MessageResponse> {
        self.with_store(|store| {
            let owner = store.owner(token)?;
            let before = store.tasks.len();
            store
                .tasks
                .retain(|task| !(task.id == task_id && task.user_id == owner));
            if store.tasks.len() == before {
                return Err(ApiFailure::new(
                    FailureKind::NotFound,
                    "Task not found or deletion failed.",
                ));
            }
            Ok(MessageResponse {
                message: "Task deleted successfully.".into(),
            })
        })
    }

    async fn lists_by_user(&self, user_id: UserId, token: &BearerToken) -> ApiResult<Vec<List>> {
        self.with_store(|store| {
            store.owner(token)?;
            store.list_fetches += 1;
            if store.reject_list_reads {
                return Err(ApiFailure::new(FailureKind::Unauthorized, "Unauthorized"));
            }
            Ok(store
                .lists
                .iter()
                .filter(|list| list.user_id == user_id)
                .cloned()
                .collect())
        })
    }

    async fn create_list(&self, list: &NewList, token: &BearerToken) -> ApiResult<ListCreated> {
        self.with_store(|store| {
            store.owner(token)?;
            let id = ListId(store.next_id());
            store.lists.push(List {
                id,
                user_id: list.user_id,
                name: list.name.clone(),
                color: list.color.clone(),
            });
            Ok(ListCreated {
                message: "List created successfully".into(),
                list_id: id,
            })
        })
    }

    async fn edit_list(&self, list: &List, token: &BearerToken) -> ApiResult<MessageResponse> {
        self.with_store(|store| {
            let owner = store.owner(token)?;
            let Some(existing) = store
                .lists
                .iter_mut()
                .find(|existing| existing.id == list.id && existing.user_id == owner)
            else {
                return Err(ApiFailure::new(
                    FailureKind::NotFound,
                    "List not found or update failed",
                ));
            };
            *existing = list.clone();
            Ok(MessageResponse {
                message: "List updated successfully".into(),
            })
        })
    }

    async fn delete_list(
        &self,
        list_id: ListId,
        token: &BearerToken,
    ) -> ApiResult<MessageResponse> {
        self.with_store(|store| {
            let owner = store.owner(token)?;
            let referenced = store.tasks.iter().any(|task| task.list_id == Some(list_id));
            let owned = store
                .lists
                .iter()
                .any(|list| list.id == list_id && list.user_id == owner);
            if referenced && store.conflict_status {
                return Err(ApiFailure::new(
                    FailureKind::Conflict,
                    "List is still used by tasks",
                ));
            }
            if referenced || !owned {
                return Err(ApiFailure::new(
                    FailureKind::NotFound,
                    "List not found or deletion failed",
                ));
            }
            store.lists.retain(|list| list.id != list_id);
            Ok(MessageResponse {
                message: "List deleted successfully".into(),
            })
        })
    }
}
