//! HTTP route helpers and error body shared by the store and its clients.

use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// Collection route: `GET` lists, `POST` creates.
pub const TASKS_PATH: &str = "/tasks";

/// Item route for a single task: `GET`, `PUT`, `DELETE`.
#[must_use]
pub fn task_path(id: &TaskId) -> String {
    format!("{TASKS_PATH}/{id}")
}

/// JSON body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub error: String,
}

impl ErrorBody {
    /// Creates an error body with the given reason.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
