//! Filter criteria, the user's list set, theme, and the task-reload slot.

mod lists;

use std::collections::BTreeSet;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ApiResult, Gateway};
use crate::model::{List, ListId, ListKey, TaskId, TaskStatus, Theme, TimeWindow, UserId};
use crate::session::Credentials;
use crate::storage::{LocalStore, BACKGROUND_KEY};

pub use lists::{ListDraft, ListMutationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub statuses: BTreeSet<TaskStatus>,
    pub time: TimeWindow,
    pub lists: BTreeSet<ListKey>,
}

impl Default for FilterCriteria {
    /// Every status, any due date, and no list membership until lists are loaded.
    fn default() -> Self {
        Self {
            statuses: TaskStatus::ALL.into_iter().collect(),
            time: TimeWindow::All,
            lists: BTreeSet::new(),
        }
    }
}

/// Why a task reload was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadRequest {
    ListCreated(ListId),
    ListUpdated(ListId),
    ListDeleted(ListId),
    TaskChanged(TaskId),
}

pub type ReloadSender = mpsc::UnboundedSender<ReloadRequest>;
pub type ReloadReceiver = mpsc::UnboundedReceiver<ReloadRequest>;

pub fn reload_channel() -> (ReloadSender, ReloadReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug)]
pub struct FilterState {
    store: LocalStore,
    criteria: FilterCriteria,
    background: Theme,
    lists: Vec<List>,
    loaded_for: Option<UserId>,
    reload: Option<ReloadSender>,
}

impl FilterState {
    /// Start with default criteria and the theme restored from storage.
    pub fn new(store: LocalStore) -> Self {
        let background = restore_background(&store);
        Self {
            store,
            criteria: FilterCriteria::default(),
            background,
            lists: Vec::new(),
            loaded_for: None,
            reload: None,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn background(&self) -> Theme {
        self.background
    }

    pub fn user_lists(&self) -> &[List] {
        &self.lists
    }

    pub fn list(&self, list_id: ListId) -> Option<&List> {
        self.lists.iter().find(|list| list.id == list_id)
    }

    pub fn set_status_filter(&mut self, statuses: impl IntoIterator<Item = TaskStatus>) {
        self.criteria.statuses = statuses.into_iter().collect();
    }

    pub fn toggle_status(&mut self, status: TaskStatus) {
        if !self.criteria.statuses.remove(&status) {
            self.criteria.statuses.insert(status);
        }
    }

    pub fn set_all_statuses(&mut self, selected: bool) {
        if selected {
            self.set_status_filter(TaskStatus::ALL);
        } else {
            self.criteria.statuses.clear();
        }
    }

    pub fn is_all_statuses_selected(&self) -> bool {
        TaskStatus::ALL
            .iter()
            .all(|status| self.criteria.statuses.contains(status))
    }

    pub fn set_time_filter(&mut self, window: TimeWindow) {
        self.criteria.time = window;
    }

    pub fn set_lists_filter(&mut self, keys: impl IntoIterator<Item = ListKey>) {
        self.criteria.lists = keys.into_iter().collect();
    }

    pub fn toggle_list(&mut self, key: ListKey) {
        if !self.criteria.lists.remove(&key) {
            self.criteria.lists.insert(key);
        }
    }

    pub fn set_all_lists(&mut self, selected: bool) {
        if selected {
            self.criteria.lists = self.all_list_keys();
        } else {
            self.criteria.lists.clear();
        }
    }

    /// True when every known list and the no-list bucket are selected.
    pub fn is_all_lists_selected(&self) -> bool {
        self.all_list_keys()
            .iter()
            .all(|key| self.criteria.lists.contains(key))
    }

    /// Every known list id plus the unlisted sentinel.
    pub fn all_list_keys(&self) -> BTreeSet<ListKey> {
        self.lists
            .iter()
            .map(|list| ListKey::List(list.id))
            .chain([ListKey::Unlisted])
            .collect()
    }

    /// Change the theme and persist it right away.
    pub fn set_background(&mut self, theme: Theme) -> Result<()> {
        self.background = theme;
        self.store.set(BACKGROUND_KEY, theme.as_str())
    }

    /// True until lists were loaded once for `user_id`.
    pub fn needs_initial_load(&self, user_id: UserId) -> bool {
        self.loaded_for != Some(user_id)
    }

    /// Replace the list set from the server. On success the list filter is reset to
    /// show every list plus unlisted tasks, discarding any custom selection.
    pub async fn load_user_lists(
        &mut self,
        gateway: &dyn Gateway,
        credentials: Credentials<'_>,
    ) -> ApiResult<()> {
        self.loaded_for = Some(credentials.user.id);
        match gateway
            .lists_by_user(credentials.user.id, credentials.token)
            .await
        {
            Ok(lists) => {
                debug!(count = lists.len(), "user lists loaded");
                self.replace_lists(lists);
                Ok(())
            }
            Err(failure) => {
                warn!(error = %failure, "failed to load lists");
                Err(failure)
            }
        }
    }

    pub(crate) fn replace_lists(&mut self, lists: Vec<List>) {
        self.lists = lists;
        self.criteria.lists = self.all_list_keys();
    }

    /// Forget lists and criteria for a signed-out session. The theme is kept.
    pub fn reset(&mut self) {
        self.lists.clear();
        self.criteria = FilterCriteria::default();
        self.loaded_for = None;
    }

    /// Register the task view's reload endpoint, replacing any earlier one.
    pub fn set_reload_tasks(&mut self, sender: ReloadSender) {
        self.reload = Some(sender);
    }

    /// Ask the registered task view to reload. Returns whether anyone received it.
    pub fn request_task_reload(&self, request: ReloadRequest) -> bool {
        let Some(sender) = &self.reload else {
            debug!(?request, "no task reload registered");
            return false;
        };
        match sender.send(request) {
            Ok(()) => true,
            Err(_) => {
                debug!(?request, "task reload subscriber is gone");
                false
            }
        }
    }
}

fn restore_background(store: &LocalStore) -> Theme {
    match store.get(BACKGROUND_KEY) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|err| {
            warn!(error = %err, "ignoring stored background");
            Theme::default()
        }),
        Ok(None) => Theme::default(),
        Err(err) => {
            warn!(error = %err, "could not read stored background");
            Theme::default()
        }
    }
}
