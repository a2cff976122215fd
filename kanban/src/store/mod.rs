//! Task store clients.
//!
//! Defines the [`TaskStore`] trait the sync engine persists through.
//! Implementations:
//! - [`http::HttpTaskStore`] talks to `kanban-server` over HTTP
//! - [`memory::InMemoryTaskStore`] keeps tasks in process, with failure
//!   injection for tests and the offline demo mode

pub mod http;
pub mod memory;

use std::sync::Arc;

use kanban_proto::{Task, TaskDraft, TaskId};

pub use http::HttpTaskStore;
pub use memory::InMemoryTaskStore;

/// Errors returned by task store operations.
///
/// The sync engine treats every variant the same way; the distinction only
/// matters for logs and notifications.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The request did not complete (connection refused, timeout, ...).
    #[error("store unreachable: {0}")]
    Transport(String),

    /// The store answered with a non-success status.
    #[error("store rejected request ({status}): {reason}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Reason from the error body, or the raw body.
        reason: String,
    },

    /// The task does not exist in the store.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The response body could not be decoded.
    #[error("invalid store response: {0}")]
    Decode(String),
}

/// Async CRUD interface over the remote task collection.
///
/// Writes return the store's canonical representation, which callers must
/// prefer over whatever they sent.
pub trait TaskStore: Send + Sync {
    /// Fetch every task.
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Create a task; the store assigns the id.
    fn create_task(
        &self,
        draft: &TaskDraft,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Replace the full record stored under `id`.
    fn update_task(
        &self,
        id: &TaskId,
        record: &Task,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Delete the task stored under `id`.
    fn delete_task(&self, id: &TaskId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<S: TaskStore> TaskStore for Arc<S> {
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send {
        (**self).list_tasks()
    }

    fn create_task(
        &self,
        draft: &TaskDraft,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send {
        (**self).create_task(draft)
    }

    fn update_task(
        &self,
        id: &TaskId,
        record: &Task,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send {
        (**self).update_task(id, record)
    }

    fn delete_task(&self, id: &TaskId) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).delete_task(id)
    }
}
