//! Task model for the kanban board.
//!
//! A [`Task`] lives in exactly one of three fixed columns, modelled by
//! [`Status`]. The JSON shape matches the task store's HTTP API:
//!
//! ```json
//! { "id": "…", "title": "Buy milk", "description": "2 litres", "status": "A Fazer" }
//! ```
//!
//! `description` is omitted when empty, and [`TaskDraft`] is the same shape
//! without an `id` (the store assigns identifiers).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, store-assigned task identifier.
///
/// Clients never mint identifiers; they only echo what the store returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an identifier received from the store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh identifier. Only the store should call this.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed, ordered set of board columns.
///
/// The serialized form (and the column identifier used by drop targets) is
/// the column's display name.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Status {
    /// Not started.
    #[default]
    #[serde(rename = "A Fazer")]
    Todo,
    /// Being worked on.
    #[serde(rename = "Em Progresso")]
    InProgress,
    /// Finished.
    #[serde(rename = "Concluídas")]
    Done,
}

impl Status {
    /// All columns in board order (left to right).
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Column identifier, also the wire representation.
    #[must_use]
    pub const fn column_id(self) -> &'static str {
        match self {
            Self::Todo => "A Fazer",
            Self::InProgress => "Em Progresso",
            Self::Done => "Concluídas",
        }
    }

    /// Looks up the column whose identifier is exactly `id`.
    #[must_use]
    pub fn from_column_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.column_id() == id)
    }

    /// Zero-based position of the column on the board.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::Done => 2,
        }
    }

    /// The column at `index`, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_id())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_column_id(s).ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// Errors raised when a task or draft fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Task title is empty.
    #[error("task title is required")]
    TitleEmpty,
    /// Status string is not one of the board columns.
    #[error("invalid status: {0}")]
    UnknownStatus(String),
}

/// Checks a title against the store's rules.
///
/// Only the empty string is rejected; there is no length limit, and
/// whitespace-only titles are accepted here and filtered by the client forms.
///
/// # Errors
///
/// Returns [`ValidationError::TitleEmpty`].
pub const fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    Ok(())
}

#[allow(clippy::ref_option)]
fn description_is_empty(description: &Option<String>) -> bool {
    description.as_deref().is_none_or(str::is_empty)
}

/// A persisted task as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Non-empty title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "description_is_empty")]
    pub description: Option<String>,
    /// Column the task is in.
    pub status: Status,
}

impl Task {
    /// Description text, with an absent description reading as empty.
    #[must_use]
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Returns a copy of this task in another column.
    #[must_use]
    pub fn with_status(&self, status: Status) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Validates the task's content.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the title is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }
}

/// Content for a task that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Non-empty title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "description_is_empty")]
    pub description: Option<String>,
    /// Column the task should be created in.
    pub status: Status,
}

impl TaskDraft {
    /// Creates a draft, mapping an empty description to `None`.
    pub fn new(title: impl Into<String>, description: impl Into<String>, status: Status) -> Self {
        let description = description.into();
        Self {
            title: title.into(),
            description: (!description.is_empty()).then_some(description),
            status,
        }
    }

    /// Validates the draft's content.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the title is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }

    /// Turns the draft into a persisted task with the given identifier.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            status: self.status,
        }
    }
}
