//! Shared wire definitions for the kanban task store.

pub mod api;
pub mod task;

pub use task::{Status, Task, TaskDraft, TaskId, ValidationError};
