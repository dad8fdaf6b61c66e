use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{
    ApiFailure, Gateway, HttpGateway, LoginRequest, RegisterRequest, RegisterResponse,
};
use crate::board::{enrich, Board, Buckets};
use crate::config::AppConfig;
use crate::filters::{
    reload_channel, FilterState, ListDraft, ListMutationError, ReloadReceiver, ReloadRequest,
};
use crate::model::{ListId, ListKey, NewTask, Task, TaskId, TaskStatus, Theme, User};
use crate::session::{BearerToken, SessionState};
use crate::storage::LocalStore;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Api(#[from] ApiFailure),
    #[error(transparent)]
    List(#[from] ListMutationError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl WorkspaceError {
    pub fn is_unauthorized(&self) -> bool {
        match self {
            WorkspaceError::Api(failure) => failure.is_unauthorized(),
            WorkspaceError::List(err) => err.api_failure().is_some_and(ApiFailure::is_unauthorized),
            _ => false,
        }
    }
}

pub type WorkspaceResult<T> = std::result::Result<T, WorkspaceError>;

/// Fields of the task form. Title and due date are mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDateTime>,
    pub status: TaskStatus,
    pub list_id: Option<ListId>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, due_date: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_date: Some(due_date),
            status: TaskStatus::ToDo,
            list_id: None,
        }
    }

    /// Start from an existing task, for partial edits.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            status: task.status,
            list_id: task.list_id,
        }
    }

    fn validated(&self) -> WorkspaceResult<(String, NaiveDateTime)> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(WorkspaceError::Invalid("Task title is required".into()));
        }
        let Some(due_date) = self.due_date else {
            return Err(WorkspaceError::Invalid("Task due date is required".into()));
        };
        Ok((title.to_string(), due_date))
    }

    fn description(&self) -> Option<String> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }
}

/// Greeting line for the signed-in user, by local hour.
pub fn greeting(user: &User, now: NaiveTime) -> String {
    let salutation = if (5..17).contains(&now.hour()) {
        "Good morning"
    } else {
        "Good evening"
    };
    format!("{salutation}, {}!", user.name)
}

/// Session, filters and board of one client, wired to a gateway.
///
/// The workspace registers itself as the task-reload subscriber of its filter
/// state; list mutations queue reload requests that [`Workspace::process_reloads`]
/// turns into task fetches.
pub struct Workspace<G: Gateway = HttpGateway> {
    config: AppConfig,
    gateway: G,
    session: SessionState,
    filters: FilterState,
    board: Board,
    reloads: ReloadReceiver,
}

impl Workspace<HttpGateway> {
    pub fn open(config: AppConfig) -> Result<Self> {
        let gateway = HttpGateway::from_config(&config)?;
        Ok(Self::with_gateway(config, gateway))
    }
}

impl<G: Gateway> Workspace<G> {
    pub fn with_gateway(config: AppConfig, gateway: G) -> Self {
        let store = LocalStore::open(&config);
        let session = SessionState::hydrate(store.clone());
        let mut filters = FilterState::new(store);
        let (sender, reloads) = reload_channel();
        filters.set_reload_tasks(sender);
        Self {
            config,
            gateway,
            session,
            filters,
            board: Board::new(),
            reloads,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    pub async fn register(
        &self,
        name: &str,
        username: &str,
        password: &str,
    ) -> WorkspaceResult<RegisterResponse> {
        if [name, username, password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(WorkspaceError::Invalid(
                "Name, username and password are required".into(),
            ));
        }
        let request = RegisterRequest {
            name: name.trim().to_string(),
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.gateway.register(&request).await?;
        info!(username = request.username.as_str(), "user registered");
        Ok(response)
    }

    /// Sign in, persist the session, and load the user's lists once.
    pub async fn login(&mut self, username: &str, password: &str) -> WorkspaceResult<User> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(WorkspaceError::Invalid(
                "Username and password are required".into(),
            ));
        }
        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.gateway.login(&request).await?;
        self.session
            .login(BearerToken::new(response.token), response.user.clone())?;
        self.filters.reset();
        self.board.clear();
        match self.ensure_lists_loaded().await {
            Ok(_) => {}
            Err(err) if err.is_unauthorized() => return Err(err),
            Err(err) => warn!(error = %err, "lists unavailable after login"),
        }
        Ok(response.user)
    }

    pub fn logout(&mut self) -> WorkspaceResult<()> {
        self.session.logout()?;
        self.filters.reset();
        self.board.clear();
        while self.reloads.try_recv().is_ok() {}
        Ok(())
    }

    /// Load lists once for a restored identity, then the board.
    pub async fn start(&mut self) -> WorkspaceResult<usize> {
        if !self.session.is_authenticated() {
            return Err(WorkspaceError::NotAuthenticated);
        }
        self.ensure_lists_loaded().await?;
        self.refresh_tasks().await
    }

    /// Load lists for the current identity unless that already happened.
    /// Returns whether a load was issued; unauthenticated sessions are a no-op.
    pub async fn ensure_lists_loaded(&mut self) -> WorkspaceResult<bool> {
        let needs_load = self
            .session
            .user()
            .is_some_and(|user| self.filters.needs_initial_load(user.id));
        if !needs_load {
            return Ok(false);
        }
        self.reload_lists().await
    }

    /// Re-fetch the list set. Unauthenticated sessions are a no-op.
    pub async fn reload_lists(&mut self) -> WorkspaceResult<bool> {
        let result = {
            let Some(credentials) = self.session.credentials() else {
                return Ok(false);
            };
            self.filters
                .load_user_lists(&self.gateway, credentials)
                .await
                .map_err(WorkspaceError::from)
        };
        self.settle(result)?;
        self.board.reenrich(self.filters.user_lists());
        Ok(true)
    }

    pub async fn refresh_tasks(&mut self) -> WorkspaceResult<usize> {
        let result = {
            let Some(credentials) = self.session.credentials() else {
                return Err(WorkspaceError::NotAuthenticated);
            };
            self.board
                .fetch(&self.gateway, credentials, self.filters.user_lists())
                .await
                .map_err(WorkspaceError::from)
        };
        self.settle(result)
    }

    /// Serve every queued reload request with a task fetch. Returns the number of
    /// fetches issued.
    pub async fn process_reloads(&mut self) -> WorkspaceResult<usize> {
        let mut fetches = 0;
        while let Ok(request) = self.reloads.try_recv() {
            debug!(?request, "reloading tasks");
            self.refresh_tasks().await?;
            fetches += 1;
        }
        Ok(fetches)
    }

    pub async fn change_status(&mut self, task_id: TaskId, status: TaskStatus) -> WorkspaceResult<()> {
        let result = {
            let Some(credentials) = self.session.credentials() else {
                return Err(WorkspaceError::NotAuthenticated);
            };
            self.board
                .change_status(&self.gateway, credentials, task_id, status)
                .await
                .map_err(WorkspaceError::from)
        };
        self.settle(result)
    }

    pub async fn create_task(&mut self, draft: &TaskDraft) -> WorkspaceResult<TaskId> {
        let (title, due_date) = draft.validated()?;
        let result = {
            let Some(credentials) = self.session.credentials() else {
                return Err(WorkspaceError::NotAuthenticated);
            };
            let task = NewTask {
                user_id: credentials.user.id,
                title,
                description: draft.description(),
                due_date: Some(due_date),
                status: draft.status,
                list_id: draft.list_id,
            };
            self.gateway
                .create_task(&task, credentials.token)
                .await
                .map_err(WorkspaceError::from)
        };
        let task_id = self.settle(result)?.task_id;
        info!(task_id = task_id.0, "task created");
        self.after_task_mutation(task_id).await;
        Ok(task_id)
    }

    pub async fn edit_task(&mut self, task_id: TaskId, draft: &TaskDraft) -> WorkspaceResult<()> {
        let (title, due_date) = draft.validated()?;
        let result = {
            let Some(credentials) = self.session.credentials() else {
                return Err(WorkspaceError::NotAuthenticated);
            };
            let task = Task {
                id: task_id,
                user_id: credentials.user.id,
                title,
                description: draft.description(),
                due_date: Some(due_date),
                status: draft.status,
                list_id: draft.list_id,
                list_name: None,
                list_color: None,
            };
            self.gateway
                .edit_task(&task, credentials.token)
                .await
                .map_err(WorkspaceError::from)
        };
        self.settle(result)?;
        info!(task_id = task_id.0, "task updated");
        self.after_task_mutation(task_id).await;
        Ok(())
    }

    pub async fn delete_task(&mut self, task_id: TaskId) -> WorkspaceResult<()> {
        let result = {
            let Some(credentials) = self.session.credentials() else {
                return Err(WorkspaceError::NotAuthenticated);
            };
            self.gateway
                .delete_task(task_id, credentials.token)
                .await
                .map_err(WorkspaceError::from)
        };
        self.settle(result)?;
        info!(task_id = task_id.0, "task deleted");
        self.after_task_mutation(task_id).await;
        Ok(())
    }

    pub async fn create_list(&mut self, draft: &ListDraft) -> WorkspaceResult<ListId> {
        let result = {
            let Some(credentials) = self.session.credentials() else {
                return Err(WorkspaceError::NotAuthenticated);
            };
            self.filters
                .create_list(&self.gateway, credentials, draft)
                .await
                .map_err(WorkspaceError::from)
        };
        let list_id = self.settle(result)?;
        self.after_list_mutation().await;
        Ok(list_id)
    }

    pub async fn update_list(&mut self, list_id: ListId, draft: &ListDraft) -> WorkspaceResult<()> {
        let result = {
            let Some(credentials) = self.session.credentials() else {
                return Err(WorkspaceError::NotAuthenticated);
            };
            self.filters
                .update_list(&self.gateway, credentials, list_id, draft)
                .await
                .map_err(WorkspaceError::from)
        };
        self.settle(result)?;
        self.after_list_mutation().await;
        Ok(())
    }

    pub async fn delete_list(&mut self, list_id: ListId) -> WorkspaceResult<()> {
        let result = {
            let Some(credentials) = self.session.credentials() else {
                return Err(WorkspaceError::NotAuthenticated);
            };
            self.filters
                .delete_list(&self.gateway, credentials, list_id)
                .await
                .map_err(WorkspaceError::from)
        };
        self.settle(result)?;
        self.after_list_mutation().await;
        Ok(())
    }

    /// Tasks of one list (or of no list) straight from the server, joined against
    /// the current list set.
    pub async fn tasks_in_list(&mut self, key: ListKey) -> WorkspaceResult<Vec<Task>> {
        let result = {
            let Some(credentials) = self.session.credentials() else {
                return Err(WorkspaceError::NotAuthenticated);
            };
            self.gateway
                .tasks_by_list(key.list_id(), credentials.token)
                .await
                .map_err(WorkspaceError::from)
        };
        let tasks = self.settle(result)?;
        Ok(enrich(tasks, self.filters.user_lists()))
    }

    pub fn set_theme(&mut self, theme: Theme) -> WorkspaceResult<()> {
        self.filters.set_background(theme)?;
        Ok(())
    }

    pub fn buckets(&self, today: NaiveDate) -> Buckets<'_> {
        self.board.buckets(self.filters.criteria(), today)
    }

    async fn after_task_mutation(&mut self, task_id: TaskId) {
        self.filters
            .request_task_reload(ReloadRequest::TaskChanged(task_id));
        self.after_list_mutation().await;
    }

    async fn after_list_mutation(&mut self) {
        self.board.reenrich(self.filters.user_lists());
        if let Err(err) = self.process_reloads().await {
            warn!(error = %err, "task reload after mutation failed");
        }
    }

    /// A rejected credential ends the session.
    fn settle<T>(&mut self, result: WorkspaceResult<T>) -> WorkspaceResult<T> {
        if let Err(err) = &result {
            if err.is_unauthorized() && self.session.is_authenticated() {
                warn!(error = %err, "credential rejected; signing out");
                if let Err(logout) = self.logout() {
                    warn!(error = %logout, "could not clear stored session");
                }
            }
        }
        result
    }
}
