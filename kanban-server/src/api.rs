//! HTTP API for the task store.
//!
//! Routes:
//!
//! | Method   | Path          | Success                 |
//! |----------|---------------|-------------------------|
//! | `GET`    | `/tasks`      | `200` with all tasks    |
//! | `POST`   | `/tasks`      | `201` with created task |
//! | `GET`    | `/tasks/{id}` | `200` with the task     |
//! | `PUT`    | `/tasks/{id}` | `200` with stored task  |
//! | `DELETE` | `/tasks/{id}` | `204`                   |
//!
//! Every failure answers with a JSON [`ErrorBody`].

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use kanban_proto::api::{ErrorBody, TASKS_PATH};
use kanban_proto::{Task, TaskDraft, TaskId};
use tower_http::cors::CorsLayer;

use crate::store::{RepositoryError, TaskRepository};

/// Errors surfaced by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body could not be decoded.
    #[error("invalid request body: {0}")]
    BadRequest(String),

    /// The repository refused or failed the operation.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Repository(RepositoryError::Validation(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Repository(
                RepositoryError::Load { .. }
                | RepositoryError::Persist { .. }
                | RepositoryError::Encode(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

async fn list_tasks(State(repo): State<Arc<TaskRepository>>) -> Json<Vec<Task>> {
    Json(repo.list().await)
}

async fn create_task(
    State(repo): State<Arc<TaskRepository>>,
    payload: Result<Json<TaskDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(draft) = payload?;
    let task = repo.create(draft).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(repo): State<Arc<TaskRepository>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(repo.get(&TaskId::new(id)).await?))
}

async fn update_task(
    State(repo): State<Arc<TaskRepository>>,
    Path(id): Path<String>,
    payload: Result<Json<Task>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(task) = payload?;
    Ok(Json(repo.update(&TaskId::new(id), task).await?))
}

async fn delete_task(
    State(repo): State<Arc<TaskRepository>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    repo.delete(&TaskId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Builds the CORS layer for the given browser origins.
///
/// Origins that are not valid header values are skipped with a warning.
#[must_use]
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

/// Builds the task API router over a shared repository.
pub fn router(repo: Arc<TaskRepository>, cors: CorsLayer) -> Router {
    Router::new()
        .route(TASKS_PATH, get(list_tasks).post(create_task))
        .route(
            &format!("{TASKS_PATH}/{{id}}"),
            get(get_task).put(update_task).delete(delete_task),
        )
        .layer(cors)
        .with_state(repo)
}

/// Starts the store server on `addr` with an empty in-memory repository.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(TaskRepository::in_memory()), &[]).await
}

/// Starts the store server with a pre-opened repository and CORS origins.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    repo: Arc<TaskRepository>,
    allowed_origins: &[String],
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(repo, cors_layer(allowed_origins));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "store server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Starts the store server in-process for testing on `127.0.0.1:0`.
#[cfg(test)]
pub async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    start_server_with_state(
        "127.0.0.1:0",
        Arc::new(TaskRepository::in_memory()),
        &["http://localhost:5173".to_string()],
    )
    .await
    .expect("failed to start test server")
}
