//! Inline driver: a board, an engine and a store, with each operation
//! awaited end to end.

use kanban_proto::{Status, Task, TaskDraft, TaskId};

use super::{Outcome, SyncEngine, SyncError};
use crate::board::{BoardState, StatusChange, resolve_drop};
use crate::store::{StoreError, TaskStore};

/// A synchronized board bound to one store.
pub struct SyncSession<S> {
    store: S,
    board: BoardState,
    engine: SyncEngine,
}

impl<S: TaskStore> SyncSession<S> {
    /// Creates a session with an empty board.
    pub fn new(store: S) -> Self {
        Self {
            store,
            board: BoardState::new(),
            engine: SyncEngine::new(),
        }
    }

    /// The board as it currently stands.
    pub const fn board(&self) -> &BoardState {
        &self.board
    }

    /// The engine's in-flight bookkeeping.
    pub const fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Replaces the board with the store's task list.
    ///
    /// Returns the number of tasks loaded.
    ///
    /// # Errors
    ///
    /// Returns the store error; the board is left as it was.
    pub async fn load(&mut self) -> Result<usize, StoreError> {
        // Every operation here is awaited under `&mut self`, so nothing can
        // be in flight alongside the list request.
        let result = self.store.list_tasks().await;
        self.engine.complete_load(&mut self.board, result)
    }

    /// Moves a task optimistically and waits for the store.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if the move is refused up front.
    pub async fn move_task(
        &mut self,
        id: &TaskId,
        target: Status,
    ) -> Result<StatusChange, SyncError> {
        let ticket = self.engine.begin_move(&mut self.board, id, target)?;
        let result = self.store.update_task(ticket.task_id(), ticket.record()).await;
        Ok(self.engine.complete_move(&mut self.board, ticket, result))
    }

    /// Resolves a drag release and, if it lands in another column, moves
    /// the task there. Returns `None` for a no-op drop.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if the resulting move is refused.
    pub async fn drop_task(
        &mut self,
        dragged: &TaskId,
        release_target: Option<&str>,
    ) -> Result<Option<StatusChange>, SyncError> {
        let Some(target) = resolve_drop(dragged, release_target, &self.board) else {
            return Ok(None);
        };
        self.move_task(dragged, target).await.map(Some)
    }

    /// Creates a task and appends the store's record once confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Invalid`] if the draft fails validation.
    pub async fn create_task(&mut self, draft: TaskDraft) -> Result<Outcome<Task>, SyncError> {
        let ticket = self.engine.begin_create(draft)?;
        let result = self.store.create_task(ticket.draft()).await;
        Ok(self.engine.complete_create(&mut self.board, ticket, result))
    }

    /// Sends an edited record and applies the store's version once confirmed.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if the update is refused up front.
    pub async fn update_task(&mut self, record: Task) -> Result<Outcome<Task>, SyncError> {
        let ticket = self.engine.begin_update(&self.board, record)?;
        let result = self.store.update_task(ticket.task_id(), ticket.record()).await;
        Ok(self.engine.complete_update(&mut self.board, ticket, result))
    }

    /// Deletes a task, removing it from the board once confirmed.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if the delete is refused up front.
    pub async fn delete_task(&mut self, id: &TaskId) -> Result<Outcome<()>, SyncError> {
        let ticket = self.engine.begin_delete(&self.board, id)?;
        let result = self.store.delete_task(ticket.task_id()).await;
        Ok(self.engine.complete_delete(&mut self.board, ticket, result))
    }
}
