//! View reconciliation for the Kanban board.
//!
//! Raw tasks are joined against the client's current list set, filtered by the
//! active [`FilterCriteria`], and split into one bucket per status. Filtering never
//! touches the stored tasks.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::api::{ApiFailure, ApiResult, FailureKind, Gateway};
use crate::filters::FilterCriteria;
use crate::model::{List, ListKey, Task, TaskId, TaskStatus, TimeWindow};
use crate::session::Credentials;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct Board {
    tasks: Vec<Task>,
    state: LoadState,
    version: u64,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            state: LoadState::Idle,
            version: 0,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Bumped every time a fetch result replaces the task set.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.state = LoadState::Idle;
    }

    /// Fetch every task of the signed-in user and replace local state wholesale.
    pub async fn fetch(
        &mut self,
        gateway: &dyn Gateway,
        credentials: Credentials<'_>,
        lists: &[List],
    ) -> ApiResult<usize> {
        self.state = LoadState::Loading;
        match gateway
            .tasks_by_user(credentials.user.id, credentials.token)
            .await
        {
            Ok(tasks) => {
                self.replace(tasks, lists);
                debug!(
                    count = self.tasks.len(),
                    version = self.version,
                    "board tasks replaced"
                );
                Ok(self.tasks.len())
            }
            Err(failure) => {
                warn!(error = %failure, "failed to load tasks");
                self.state = LoadState::Error(failure.message.clone());
                Err(failure)
            }
        }
    }

    pub(crate) fn replace(&mut self, tasks: Vec<Task>, lists: &[List]) {
        self.tasks = enrich(tasks, lists);
        self.state = LoadState::Idle;
        self.version += 1;
    }

    /// Reapply list metadata after the list set changed, without a round-trip.
    pub fn reenrich(&mut self, lists: &[List]) {
        let tasks = std::mem::take(&mut self.tasks);
        self.tasks = enrich(tasks, lists);
    }

    /// Move a task to another column once the server confirms the edit.
    pub async fn change_status(
        &mut self,
        gateway: &dyn Gateway,
        credentials: Credentials<'_>,
        task_id: TaskId,
        status: TaskStatus,
    ) -> ApiResult<()> {
        let Some(current) = self.task(task_id) else {
            return Err(ApiFailure::new(
                FailureKind::NotFound,
                format!("Task {task_id} is not on the board"),
            ));
        };
        let updated = Task {
            status,
            user_id: credentials.user.id,
            ..current.clone()
        };

        if let Err(failure) = gateway.edit_task(&updated, credentials.token).await {
            warn!(task_id = task_id.0, error = %failure, "status update rejected");
            return Err(failure);
        }

        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == task_id) {
            task.status = status;
        }
        Ok(())
    }

    pub fn filtered(&self, criteria: &FilterCriteria, today: NaiveDate) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| matches(task, criteria, today))
            .collect()
    }

    pub fn buckets(&self, criteria: &FilterCriteria, today: NaiveDate) -> Buckets<'_> {
        Buckets::partition(self.filtered(criteria, today))
    }
}

/// Filtered tasks split by status, each bucket in fetch order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buckets<'a> {
    pub to_do: Vec<&'a Task>,
    pub doing: Vec<&'a Task>,
    pub done: Vec<&'a Task>,
}

impl<'a> Buckets<'a> {
    pub fn partition(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut buckets = Self::default();
        for task in tasks {
            match task.status {
                TaskStatus::ToDo => buckets.to_do.push(task),
                TaskStatus::Doing => buckets.doing.push(task),
                TaskStatus::Done => buckets.done.push(task),
            }
        }
        buckets
    }

    pub fn get(&self, status: TaskStatus) -> &[&'a Task] {
        match status {
            TaskStatus::ToDo => &self.to_do,
            TaskStatus::Doing => &self.doing,
            TaskStatus::Done => &self.done,
        }
    }

    /// Columns in board order.
    pub fn columns(&self) -> impl Iterator<Item = (TaskStatus, &[&'a Task])> + '_ {
        TaskStatus::ALL
            .into_iter()
            .map(move |status| (status, self.get(status)))
    }

    pub fn len(&self) -> usize {
        self.to_do.len() + self.doing.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Overwrite each task's list name and color from the matching list in `lists`.
/// Tasks whose list is unknown keep what the server sent.
pub fn enrich(tasks: Vec<Task>, lists: &[List]) -> Vec<Task> {
    tasks
        .into_iter()
        .map(|mut task| {
            if let Some(list) = task
                .list_id
                .and_then(|id| lists.iter().find(|list| list.id == id))
            {
                task.list_name = Some(list.name.clone());
                task.list_color = Some(list.color.clone());
            }
            task
        })
        .collect()
}

pub fn matches(task: &Task, criteria: &FilterCriteria, today: NaiveDate) -> bool {
    matches_status(task, criteria)
        && matches_list(task, criteria)
        && matches_time(task, criteria.time, today)
}

pub fn matches_status(task: &Task, criteria: &FilterCriteria) -> bool {
    criteria.statuses.contains(&task.status)
}

pub fn matches_list(task: &Task, criteria: &FilterCriteria) -> bool {
    match task.list_key() {
        ListKey::Unlisted => criteria.lists.contains(&ListKey::Unlisted),
        key @ ListKey::List(_) => criteria.lists.contains(&key),
    }
}

pub fn matches_time(task: &Task, window: TimeWindow, today: NaiveDate) -> bool {
    if window == TimeWindow::All {
        return true;
    }
    let Some(due) = task.due_day() else {
        return false;
    };
    let diff = day_offset(due, today);

    match window {
        TimeWindow::All => true,
        TimeWindow::Today => diff == 0,
        TimeWindow::ThreeDays | TimeWindow::Week | TimeWindow::TwoWeeks | TimeWindow::Month => {
            let Some(days) = window.days() else {
                return false;
            };
            match task.status {
                TaskStatus::Done => (-(days - 1)..=0).contains(&diff),
                TaskStatus::ToDo | TaskStatus::Doing => (0..=days - 1).contains(&diff),
            }
        }
    }
}

/// Whole calendar days from `today` to `due`; negative when `due` is in the past.
pub fn day_offset(due: NaiveDate, today: NaiveDate) -> i64 {
    due.signed_duration_since(today).num_days()
}
