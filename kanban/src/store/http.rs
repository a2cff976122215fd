//! HTTP task store client for `kanban-server`.

use std::time::Duration;

use kanban_proto::api::{ErrorBody, TASKS_PATH, task_path};
use kanban_proto::{Task, TaskDraft, TaskId};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::{StoreError, TaskStore};

/// [`TaskStore`] backed by the store server's JSON API.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: Client,
    base_url: Url,
}

impl HttpTaskStore {
    /// Creates a client for the store at `base_url`.
    ///
    /// Every request is bounded by `timeout`; a request that exceeds it
    /// fails with [`StoreError::Transport`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// Base URL this client talks to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

/// Maps a reqwest send failure.
fn transport_error(e: &reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

/// Turns a non-success response into a [`StoreError`], reading the
/// `{"error": ...}` body when there is one.
async fn rejection(resp: Response, id: Option<&TaskId>) -> StoreError {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND
        && let Some(id) = id
    {
        return StoreError::NotFound(id.clone());
    }
    let body = resp.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<ErrorBody>(&body).map_or(body, |b| b.error);
    StoreError::Rejected {
        status: status.as_u16(),
        reason,
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, StoreError> {
    let bytes = resp.bytes().await.map_err(|e| transport_error(&e))?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

impl TaskStore for HttpTaskStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let resp = self
            .client
            .get(self.endpoint(TASKS_PATH))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        if !resp.status().is_success() {
            return Err(rejection(resp, None).await);
        }
        decode(resp).await
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, StoreError> {
        let resp = self
            .client
            .post(self.endpoint(TASKS_PATH))
            .json(draft)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        if !resp.status().is_success() {
            return Err(rejection(resp, None).await);
        }
        decode(resp).await
    }

    async fn update_task(&self, id: &TaskId, record: &Task) -> Result<Task, StoreError> {
        let resp = self
            .client
            .put(self.endpoint(&task_path(id)))
            .json(record)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        if !resp.status().is_success() {
            return Err(rejection(resp, Some(id)).await);
        }
        decode(resp).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), StoreError> {
        let resp = self
            .client
            .delete(self.endpoint(&task_path(id)))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        if !resp.status().is_success() {
            return Err(rejection(resp, Some(id)).await);
        }
        Ok(())
    }
}
