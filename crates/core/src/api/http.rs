use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    ApiFailure, ApiResult, FailureKind, Gateway, ListCreated, LoginRequest, LoginResponse,
    MessageResponse, Operation, RegisterRequest, RegisterResponse, TaskCreated,
};
use crate::config::AppConfig;
use crate::model::{List, ListId, NewList, NewTask, Task, TaskId, UserId};
use crate::session::BearerToken;

/// [`Gateway`] over the JSON REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building HTTP client for the task API")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.api_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> ApiResult<T> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(operation = operation.label(), error = %error, "request failed");
                return Err(ApiFailure::transport(operation));
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(error) => {
                warn!(operation = operation.label(), error = %error, "response body unreadable");
                return Err(ApiFailure::transport(operation));
            }
        };

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|body| body.message)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| operation.fallback_message().to_string());
            debug!(
                operation = operation.label(),
                status = status.as_u16(),
                message = message.as_str(),
                "request rejected"
            );
            return Err(ApiFailure::new(
                FailureKind::from_status(status.as_u16()),
                message,
            ));
        }

        serde_json::from_slice(&body).map_err(|error| {
            warn!(operation = operation.label(), error = %error, "response payload malformed");
            ApiFailure::transport(operation)
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        let builder = self.client.post(self.url("/api/user/login")).json(request);
        self.send(Operation::Login, builder).await
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<RegisterResponse> {
        let builder = self
            .client
            .post(self.url("/api/user/register"))
            .json(request);
        self.send(Operation::Register, builder).await
    }

    async fn tasks_by_user(&self, user_id: UserId, token: &BearerToken) -> ApiResult<Vec<Task>> {
        let builder = self
            .client
            .get(self.url("/api/tasks"))
            .query(&[("userId", user_id.0)])
            .bearer_auth(token.as_str());
        self.send(Operation::FetchTasks, builder).await
    }

    async fn tasks_by_list(
        &self,
        list_id: Option<ListId>,
        token: &BearerToken,
    ) -> ApiResult<Vec<Task>> {
        // listId=0 asks for tasks without a list.
        let raw = list_id.map_or(0, |id| id.0);
        let builder = self
            .client
            .get(self.url("/api/tasks"))
            .query(&[("listId", raw)])
            .bearer_auth(token.as_str());
        self.send(Operation::FetchTasks, builder).await
    }

    async fn create_task(&self, task: &NewTask, token: &BearerToken) -> ApiResult<TaskCreated> {
        let builder = self
            .client
            .post(self.url("/api/tasks"))
            .json(task)
            .bearer_auth(token.as_str());
        self.send(Operation::CreateTask, builder).await
    }

    async fn edit_task(&self, task: &Task, token: &BearerToken) -> ApiResult<MessageResponse> {
        let builder = self
            .client
            .put(self.url(&format!("/api/tasks/{}", task.id)))
            .json(task)
            .bearer_auth(token.as_str());
        self.send(Operation::EditTask, builder).await
    }

    async fn delete_task(
        &self,
        task_id: TaskId,
        token: &BearerToken,
    ) -> ApiResult<MessageResponse> {
        let builder = self
            .client
            .delete(self.url(&format!("/api/tasks/{task_id}")))
            .bearer_auth(token.as_str());
        self.send(Operation::DeleteTask, builder).await
    }

    async fn lists_by_user(&self, user_id: UserId, token: &BearerToken) -> ApiResult<Vec<List>> {
        let builder = self
            .client
            .get(self.url("/api/lists"))
            .query(&[("userId", user_id.0)])
            .bearer_auth(token.as_str());
        self.send(Operation::FetchLists, builder).await
    }

    async fn create_list(&self, list: &NewList, token: &BearerToken) -> ApiResult<ListCreated> {
        let builder = self
            .client
            .post(self.url("/api/lists"))
            .json(list)
            .bearer_auth(token.as_str());
        self.send(Operation::CreateList, builder).await
    }

    async fn edit_list(&self, list: &List, token: &BearerToken) -> ApiResult<MessageResponse> {
        let builder = self
            .client
            .put(self.url("/api/lists"))
            .json(list)
            .bearer_auth(token.as_str());
        self.send(Operation::EditList, builder).await
    }

    async fn delete_list(
        &self,
        list_id: ListId,
        token: &BearerToken,
    ) -> ApiResult<MessageResponse> {
        let builder = self
            .client
            .delete(self.url(&format!("/api/lists/{list_id}")))
            .bearer_auth(token.as_str());
        self.send(Operation::DeleteList, builder).await
    }
}
