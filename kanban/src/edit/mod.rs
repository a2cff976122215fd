//! Dirty-state guard for the task detail view.
//!
//! ```text
//!            begin_edit              request_dismiss (dirty)
//!  Viewing ─────────────→ Editing ─────────────────────────→ ConfirmingDiscard
//!     ↑  ←── cancel_edit ──┘ │ ↑  ←────── keep_editing ──────────┘    │
//!     │  ←── saved ──────────┘ │                                      │ discard
//!     │                        │ request_dismiss (clean)              ↓
//!     └── request_dismiss ─────┴───────────────────────────────────→ Closed
//! ```
//!
//! Dirtiness compares title and description field by field, with an absent
//! description equal to an empty one. Between [`EditGuard::mark_saving`] and
//! the store's answer the working copy is frozen, so nothing typed can be
//! overwritten by the saved record.

use kanban_proto::{Task, TaskId};

/// Where the detail view is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// Read-only view of the stored content.
    Viewing,
    /// The working copy is editable.
    Editing,
    /// A dismissal was attempted with unsaved changes.
    ConfirmingDiscard,
    /// The view is gone.
    Closed,
}

/// The editable fields of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditContent {
    /// Title text.
    pub title: String,
    /// Description text; empty when the task has none.
    pub description: String,
}

impl EditContent {
    /// Editable content of a stored task.
    #[must_use]
    pub fn of(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description_text().to_string(),
        }
    }
}

/// Reasons a save is refused locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// Saving is only possible while editing.
    #[error("not editing")]
    NotEditing,
    /// The title is empty or whitespace.
    #[error("title must not be blank")]
    BlankTitle,
    /// A save is already awaiting the store.
    #[error("save in progress")]
    SaveInFlight,
}

/// Tracks the baseline and working copy of one open detail view.
#[derive(Debug, Clone)]
pub struct EditGuard {
    task_id: TaskId,
    baseline: EditContent,
    working: EditContent,
    state: EditState,
    saving: bool,
}

impl EditGuard {
    /// Opens the detail view for `task` in [`EditState::Viewing`].
    #[must_use]
    pub fn open(task: &Task) -> Self {
        let baseline = EditContent::of(task);
        Self {
            task_id: task.id.clone(),
            working: baseline.clone(),
            baseline,
            state: EditState::Viewing,
            saving: false,
        }
    }

    /// The task being viewed.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EditState {
        self.state
    }

    /// Last content known to be stored.
    #[must_use]
    pub const fn baseline(&self) -> &EditContent {
        &self.baseline
    }

    /// The content shown: the working copy while editing, else the baseline.
    #[must_use]
    pub const fn content(&self) -> &EditContent {
        match self.state {
            EditState::Editing | EditState::ConfirmingDiscard => &self.working,
            EditState::Viewing | EditState::Closed => &self.baseline,
        }
    }

    /// Whether the working copy differs from the baseline.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        matches!(
            self.state,
            EditState::Editing | EditState::ConfirmingDiscard
        ) && self.working != self.baseline
    }

    /// Whether a save is awaiting the store.
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        self.saving
    }

    /// Whether the view has been dismissed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == EditState::Closed
    }

    /// Viewing → Editing, starting from the baseline.
    pub fn begin_edit(&mut self) {
        if self.state == EditState::Viewing {
            self.working = self.baseline.clone();
            self.state = EditState::Editing;
        }
    }

    /// Mutable access to the working copy while editing and not saving.
    pub const fn working_mut(&mut self) -> Option<&mut EditContent> {
        match self.state {
            EditState::Editing if !self.saving => Some(&mut self.working),
            _ => None,
        }
    }

    /// Editing → Viewing, throwing the working copy away. Ignored while a
    /// save is in flight.
    pub fn cancel_edit(&mut self) {
        if self.state == EditState::Editing && !self.saving {
            self.working = self.baseline.clone();
            self.state = EditState::Viewing;
        }
    }

    /// Attempts to close the view.
    ///
    /// Closes immediately unless there are unsaved edits, in which case the
    /// guard moves to [`EditState::ConfirmingDiscard`]. Returns the new state.
    pub fn request_dismiss(&mut self) -> EditState {
        self.state = match self.state {
            EditState::Editing if self.working != self.baseline => EditState::ConfirmingDiscard,
            EditState::Viewing | EditState::Editing => EditState::Closed,
            other => other,
        };
        self.state
    }

    /// ConfirmingDiscard → Editing, keeping the working copy.
    pub fn keep_editing(&mut self) {
        if self.state == EditState::ConfirmingDiscard {
            self.state = EditState::Editing;
        }
    }

    /// ConfirmingDiscard → Closed, dropping the working copy.
    pub fn discard(&mut self) {
        if self.state == EditState::ConfirmingDiscard {
            self.working = self.baseline.clone();
            self.state = EditState::Closed;
        }
    }

    /// Builds the full record to send on save.
    ///
    /// `stored` is the board's current version of the task; every field
    /// the editor does not cover (status, id) is taken from it. The guard
    /// stays in [`EditState::Editing`] until [`saved`](Self::saved).
    ///
    /// # Errors
    ///
    /// [`EditError::NotEditing`] outside the editing state,
    /// [`EditError::SaveInFlight`] while a save awaits the store, or
    /// [`EditError::BlankTitle`] if the title is empty or whitespace.
    pub fn prepare_save(&self, stored: &Task) -> Result<Task, EditError> {
        if self.state != EditState::Editing {
            return Err(EditError::NotEditing);
        }
        if self.saving {
            return Err(EditError::SaveInFlight);
        }
        if self.working.title.trim().is_empty() {
            return Err(EditError::BlankTitle);
        }
        let description = &self.working.description;
        Ok(Task {
            id: self.task_id.clone(),
            title: self.working.title.clone(),
            description: (!description.is_empty()).then(|| description.clone()),
            status: stored.status,
        })
    }

    /// Freezes the working copy once the save request has been issued.
    pub fn mark_saving(&mut self) {
        if self.state == EditState::Editing {
            self.saving = true;
        }
    }

    /// Unfreezes the working copy after a refused save; edits are kept.
    pub const fn save_failed(&mut self) {
        self.saving = false;
    }

    /// Editing → Viewing after the store confirmed a save; the store's
    /// record becomes the new baseline.
    pub fn saved(&mut self, stored: &Task) {
        self.saving = false;
        self.baseline = EditContent::of(stored);
        self.working = self.baseline.clone();
        if matches!(
            self.state,
            EditState::Editing | EditState::ConfirmingDiscard
        ) {
            self.state = EditState::Viewing;
        }
    }

    /// Refreshes the baseline from the board while only viewing.
    pub fn refresh(&mut self, stored: &Task) {
        if self.state == EditState::Viewing {
            self.baseline = EditContent::of(stored);
            self.working = self.baseline.clone();
        }
    }
}
