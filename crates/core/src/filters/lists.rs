use thiserror::Error;
use tracing::{info, warn};

use super::{FilterState, ReloadRequest};
use crate::api::{ApiFailure, FailureKind, Gateway};
use crate::model::{List, ListId, NewList, LIST_COLORS};
use crate::session::Credentials;

/// Name and color for a list about to be created or renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDraft {
    pub name: String,
    pub color: String,
}

impl ListDraft {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    fn validated(&self) -> Result<ListDraft, ListMutationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ListMutationError::EmptyName);
        }
        let color = self.color.trim().to_ascii_lowercase();
        if !LIST_COLORS.contains(&color.as_str()) {
            return Err(ListMutationError::UnknownColor(color));
        }
        Ok(ListDraft::new(name, color))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListMutationError {
    #[error("List name cannot be empty")]
    EmptyName,
    #[error("Unknown list color '{0}': expected blue|green|yellow|orange|gray")]
    UnknownColor(String),
    #[error("Delete failed - check if the list is used in any task.")]
    InUse(ListId),
    #[error(transparent)]
    Api(#[from] ApiFailure),
}

impl ListMutationError {
    pub fn api_failure(&self) -> Option<&ApiFailure> {
        match self {
            ListMutationError::Api(failure) => Some(failure),
            _ => None,
        }
    }
}

impl FilterState {
    pub async fn create_list(
        &mut self,
        gateway: &dyn Gateway,
        credentials: Credentials<'_>,
        draft: &ListDraft,
    ) -> Result<ListId, ListMutationError> {
        let draft = draft.validated()?;
        let request = NewList {
            user_id: credentials.user.id,
            name: draft.name,
            color: draft.color,
        };
        let created = gateway.create_list(&request, credentials.token).await?;
        info!(list_id = created.list_id.0, "list created");
        self.after_list_mutation(gateway, credentials, ReloadRequest::ListCreated(created.list_id))
            .await;
        Ok(created.list_id)
    }

    pub async fn update_list(
        &mut self,
        gateway: &dyn Gateway,
        credentials: Credentials<'_>,
        list_id: ListId,
        draft: &ListDraft,
    ) -> Result<(), ListMutationError> {
        let draft = draft.validated()?;
        let list = List {
            id: list_id,
            user_id: credentials.user.id,
            name: draft.name,
            color: draft.color,
        };
        gateway.edit_list(&list, credentials.token).await?;
        info!(list_id = list_id.0, "list updated");
        self.after_list_mutation(gateway, credentials, ReloadRequest::ListUpdated(list_id))
            .await;
        Ok(())
    }

    /// Delete a list. A list still referenced by tasks is reported as
    /// [`ListMutationError::InUse`], whether the server answers with a conflict or
    /// with not-found for a list the client still holds.
    pub async fn delete_list(
        &mut self,
        gateway: &dyn Gateway,
        credentials: Credentials<'_>,
        list_id: ListId,
    ) -> Result<(), ListMutationError> {
        if let Err(failure) = gateway.delete_list(list_id, credentials.token).await {
            let in_use = match failure.kind {
                FailureKind::Conflict => true,
                FailureKind::NotFound => self.list(list_id).is_some(),
                _ => false,
            };
            warn!(list_id = list_id.0, in_use, error = %failure, "list delete rejected");
            return Err(if in_use {
                ListMutationError::InUse(list_id)
            } else {
                ListMutationError::Api(failure)
            });
        }
        info!(list_id = list_id.0, "list deleted");
        self.after_list_mutation(gateway, credentials, ReloadRequest::ListDeleted(list_id))
            .await;
        Ok(())
    }

    /// Lists first, then tasks, so re-enriched tasks never see stale list metadata.
    async fn after_list_mutation(
        &mut self,
        gateway: &dyn Gateway,
        credentials: Credentials<'_>,
        request: ReloadRequest,
    ) {
        if self.load_user_lists(gateway, credentials).await.is_err() {
            warn!(?request, "list reload after mutation failed; keeping previous lists");
        }
        self.request_task_reload(request);
    }
}
