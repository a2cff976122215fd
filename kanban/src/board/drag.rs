//! Ephemeral drag session state.

use kanban_proto::{Status, Task, TaskId};

use super::{BoardState, resolve_drop};

/// A surface a dragged card can be released over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// An empty area of a column.
    Column(Status),
    /// Another card.
    Card(TaskId),
}

impl DropTarget {
    /// Identifier of the surface, as seen by drop resolution.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Column(status) => status.column_id(),
            Self::Card(id) => id.as_str(),
        }
    }
}

/// A card being dragged. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    task_id: TaskId,
    origin: Status,
    over: Option<DropTarget>,
}

impl DragSession {
    /// Picks up `task`. The pointer starts over the task's own column.
    #[must_use]
    pub fn start(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            origin: task.status,
            over: Some(DropTarget::Column(task.status)),
        }
    }

    /// Id of the dragged task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Column the task was picked up from.
    #[must_use]
    pub const fn origin(&self) -> Status {
        self.origin
    }

    /// Surface currently under the pointer.
    #[must_use]
    pub const fn over(&self) -> Option<&DropTarget> {
        self.over.as_ref()
    }

    /// Moves the pointer over `target` (or over nothing).
    pub fn hover(&mut self, target: Option<DropTarget>) {
        self.over = target;
    }

    /// Ends the drag, returning the task id and the column it should move
    /// to, or `None` if the release is a no-op.
    #[must_use]
    pub fn release(self, board: &BoardState) -> Option<(TaskId, Status)> {
        let target = resolve_drop(
            &self.task_id,
            self.over.as_ref().map(DropTarget::id),
            board,
        )?;
        Some((self.task_id, target))
    }
}
