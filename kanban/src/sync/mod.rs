//! Optimistic board synchronization.
//!
//! [`SyncEngine`] owns the rules: moves patch the board first and roll back
//! if the store refuses, while create, update and delete only touch the
//! board once the store has confirmed. Each operation is split into a
//! synchronous `begin_*` half, which validates, claims the task and returns
//! a ticket, and a `complete_*` half, which consumes the ticket together
//! with the store's answer.
//!
//! Two drivers run tickets against a [`TaskStore`](crate::store::TaskStore):
//! - [`worker::spawn_worker`] executes them on background tokio tasks and
//!   reports back over a channel, for the UI loop
//! - [`SyncSession`] awaits each call inline, for library use and tests

pub mod engine;
pub mod session;
pub mod worker;

use kanban_proto::{Status, TaskId, ValidationError};

use crate::store::StoreError;

pub use engine::{CreateTicket, DeleteTicket, MoveTicket, MutationKind, SyncEngine, UpdateTicket};
pub use session::SyncSession;
pub use worker::{SyncCommand, SyncEvent, request_shutdown, spawn_worker};

/// Reasons a mutation is refused before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Another mutation for this task has not completed yet.
    #[error("task {0} has a change in flight")]
    Busy(TaskId),

    /// The task is not on the board.
    #[error("task {0} is not on the board")]
    NotOnBoard(TaskId),

    /// The task is already in the requested column.
    #[error("task {id} is already in {status}")]
    NoChange {
        /// The task.
        id: TaskId,
        /// Its current column.
        status: Status,
    },

    /// A full reload is awaiting the store; its answer would overwrite the
    /// change.
    #[error("tasks are still loading")]
    Loading,

    /// A reload was asked for while changes are still awaiting the store.
    #[error("{0} change(s) still in flight")]
    Unsettled(usize),

    /// The content fails the store's validation rules.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Result of a confirm-first mutation once the store has answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The store accepted the change and the board now reflects it.
    Confirmed(T),
    /// The store refused or was unreachable; the board is unchanged.
    Failed(StoreError),
    /// The completion was stale and was ignored.
    Discarded,
}

impl<T> Outcome<T> {
    /// Whether the store confirmed the change.
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}
