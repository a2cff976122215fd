//! Board model: the in-memory task collection, drop resolution and drag
//! sessions.

pub mod drag;
pub mod drop;
pub mod state;

use kanban_proto::Status;

pub use drag::{DragSession, DropTarget};
pub use drop::resolve_drop;
pub use state::BoardState;

/// Result of an optimistic status change once the store has answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The store accepted the move; the task stays in this column.
    Applied(Status),
    /// The store refused or was unreachable; the task returns to this column.
    RolledBackTo(Status),
    /// The completion was stale and must not touch the board.
    Discarded,
}
