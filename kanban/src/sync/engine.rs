//! Two-phase sync engine.
//!
//! At most one move, update or delete per task is in flight at a time; a
//! second `begin_*` for the same task fails with [`SyncError::Busy`]. Every
//! ticket carries a generation number, and a completion is only applied if
//! its generation is still the pending one for that task and the task is
//! still on the board.
//!
//! A full reload replaces the whole board, so it never overlaps a mutation:
//! [`SyncEngine::begin_load`] waits for an idle engine, and every `begin_*`
//! is refused with [`SyncError::Loading`] until the list has answered.

use std::collections::HashMap;

use kanban_proto::{Status, Task, TaskDraft, TaskId};

use super::{Outcome, SyncError};
use crate::board::{BoardState, StatusChange};
use crate::store::StoreError;

/// Kind of per-task mutation in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Optimistic status change.
    Move,
    /// Full record update.
    Update,
    /// Deletion.
    Delete,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    generation: u64,
    kind: MutationKind,
}

/// A pending optimistic move. The board already shows `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTicket {
    generation: u64,
    rollback: Status,
    record: Task,
}

impl MoveTicket {
    /// The moved task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.record.id
    }

    /// Full record to send, carrying the new status.
    #[must_use]
    pub const fn record(&self) -> &Task {
        &self.record
    }

    /// Column the task moves to.
    #[must_use]
    pub const fn target(&self) -> Status {
        self.record.status
    }

    /// Column the task returns to if the store refuses.
    #[must_use]
    pub const fn rollback(&self) -> Status {
        self.rollback
    }

    /// Generation this ticket was issued under.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// A pending create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTicket {
    generation: u64,
    draft: TaskDraft,
}

impl CreateTicket {
    /// Content to create.
    #[must_use]
    pub const fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    /// Column the task is created in.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.draft.status
    }

    /// Generation this ticket was issued under.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// A pending full-record update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTicket {
    generation: u64,
    record: Task,
}

impl UpdateTicket {
    /// The updated task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.record.id
    }

    /// Full record to send.
    #[must_use]
    pub const fn record(&self) -> &Task {
        &self.record
    }

    /// Generation this ticket was issued under.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// A pending deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTicket {
    generation: u64,
    task_id: TaskId,
}

impl DeleteTicket {
    /// The task to delete.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Generation this ticket was issued under.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tracks in-flight mutations and applies their outcomes to a [`BoardState`].
#[derive(Debug, Default)]
pub struct SyncEngine {
    in_flight: HashMap<TaskId, InFlight>,
    creates_in_flight: usize,
    loading: bool,
    next_generation: u64,
}

impl SyncEngine {
    /// Creates an idle engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a mutation for `id` is in flight.
    #[must_use]
    pub fn is_busy(&self, id: &TaskId) -> bool {
        self.in_flight.contains_key(id)
    }

    /// Kind of the mutation in flight for `id`, if any.
    #[must_use]
    pub fn in_flight_kind(&self, id: &TaskId) -> Option<MutationKind> {
        self.in_flight.get(id).map(|f| f.kind)
    }

    /// Number of requests awaiting a store answer.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.in_flight.len() + self.creates_in_flight
    }

    /// Whether a full reload is awaiting the store.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether no request, reload included, is awaiting a store answer.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending_count() == 0 && !self.loading
    }

    const fn issue_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn claim(&mut self, id: &TaskId, kind: MutationKind) -> u64 {
        let generation = self.issue_generation();
        self.in_flight
            .insert(id.clone(), InFlight { generation, kind });
        generation
    }

    /// Releases the claim on `id` if `generation` is still the pending one.
    fn settle(&mut self, id: &TaskId, generation: u64) -> bool {
        match self.in_flight.get(id) {
            Some(pending) if pending.generation == generation => {
                self.in_flight.remove(id);
                true
            }
            _ => false,
        }
    }

    const fn ensure_not_loading(&self) -> Result<(), SyncError> {
        if self.loading {
            return Err(SyncError::Loading);
        }
        Ok(())
    }

    fn ensure_free<'a>(&self, board: &'a BoardState, id: &TaskId) -> Result<&'a Task, SyncError> {
        self.ensure_not_loading()?;
        let task = board
            .get(id)
            .ok_or_else(|| SyncError::NotOnBoard(id.clone()))?;
        if self.is_busy(id) {
            return Err(SyncError::Busy(id.clone()));
        }
        Ok(task)
    }

    // --- load ---

    /// Marks a full reload as outstanding.
    ///
    /// # Errors
    ///
    /// [`SyncError::Loading`] if a reload is already outstanding, or
    /// [`SyncError::Unsettled`] while any mutation awaits the store.
    pub fn begin_load(&mut self) -> Result<(), SyncError> {
        self.ensure_not_loading()?;
        let pending = self.pending_count();
        if pending > 0 {
            return Err(SyncError::Unsettled(pending));
        }
        self.loading = true;
        Ok(())
    }

    /// Replaces the board with the store's list on success.
    ///
    /// Returns the number of tasks loaded. On failure the board is left as
    /// it was.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub fn complete_load(
        &mut self,
        board: &mut BoardState,
        result: Result<Vec<Task>, StoreError>,
    ) -> Result<usize, StoreError> {
        self.loading = false;
        match result {
            Ok(tasks) => {
                let count = tasks.len();
                board.replace_all(tasks);
                tracing::info!(count, "board loaded");
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "load failed");
                Err(e)
            }
        }
    }

    // --- move ---

    /// Moves a task to `target` on the board immediately and returns the
    /// ticket for the store update.
    ///
    /// # Errors
    ///
    /// [`SyncError::Loading`], [`SyncError::NotOnBoard`], [`SyncError::Busy`],
    /// or [`SyncError::NoChange`] if the task is already in `target`. The board
    /// is untouched on error.
    pub fn begin_move(
        &mut self,
        board: &mut BoardState,
        id: &TaskId,
        target: Status,
    ) -> Result<MoveTicket, SyncError> {
        let task = self.ensure_free(board, id)?;
        if task.status == target {
            return Err(SyncError::NoChange {
                id: id.clone(),
                status: target,
            });
        }
        let rollback = task.status;
        let record = task.with_status(target);

        let generation = self.claim(id, MutationKind::Move);
        board.patch_status(id, target);
        tracing::debug!(task_id = %id, from = %rollback, to = %target, "move started");

        Ok(MoveTicket {
            generation,
            rollback,
            record,
        })
    }

    /// Settles a move with the store's answer.
    ///
    /// Success keeps the new column; failure patches the status back to the
    /// pre-move column. Stale completions are discarded.
    pub fn complete_move(
        &mut self,
        board: &mut BoardState,
        ticket: MoveTicket,
        result: Result<Task, StoreError>,
    ) -> StatusChange {
        let id = ticket.task_id();
        if !self.settle(id, ticket.generation) || !board.contains(id) {
            tracing::debug!(task_id = %id, generation = ticket.generation, "stale move discarded");
            return StatusChange::Discarded;
        }

        let change = match result {
            Ok(_) => {
                tracing::debug!(task_id = %id, status = %ticket.target(), "move confirmed");
                StatusChange::Applied(ticket.target())
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %id,
                    status = %ticket.rollback,
                    error = %e,
                    "move rejected, rolling back"
                );
                StatusChange::RolledBackTo(ticket.rollback)
            }
        };
        board.apply_status_change(id, change);
        change
    }

    // --- create ---

    /// Validates a draft and returns the ticket for the create request.
    ///
    /// Nothing is added to the board until the store answers.
    ///
    /// # Errors
    ///
    /// [`SyncError::Loading`] while a reload is outstanding, or
    /// [`SyncError::Invalid`] if the draft fails validation.
    pub fn begin_create(&mut self, draft: TaskDraft) -> Result<CreateTicket, SyncError> {
        self.ensure_not_loading()?;
        draft.validate()?;
        self.creates_in_flight += 1;
        Ok(CreateTicket {
            generation: self.issue_generation(),
            draft,
        })
    }

    /// Appends the store's canonical record on success.
    pub fn complete_create(
        &mut self,
        board: &mut BoardState,
        ticket: CreateTicket,
        result: Result<Task, StoreError>,
    ) -> Outcome<Task> {
        self.creates_in_flight = self.creates_in_flight.saturating_sub(1);
        match result {
            Ok(task) => {
                tracing::debug!(task_id = %task.id, status = %task.status, "create confirmed");
                board.upsert(task.clone());
                Outcome::Confirmed(task)
            }
            Err(e) => {
                tracing::warn!(
                    title = %ticket.draft.title,
                    generation = ticket.generation,
                    error = %e,
                    "create failed"
                );
                Outcome::Failed(e)
            }
        }
    }

    // --- update ---

    /// Validates an edited record and returns the ticket for the update.
    ///
    /// # Errors
    ///
    /// [`SyncError::Loading`], [`SyncError::NotOnBoard`], [`SyncError::Busy`]
    /// or [`SyncError::Invalid`].
    pub fn begin_update(
        &mut self,
        board: &BoardState,
        record: Task,
    ) -> Result<UpdateTicket, SyncError> {
        self.ensure_free(board, &record.id)?;
        record.validate()?;
        let generation = self.claim(&record.id, MutationKind::Update);
        Ok(UpdateTicket { generation, record })
    }

    /// Replaces the board entry with the store's record on success.
    pub fn complete_update(
        &mut self,
        board: &mut BoardState,
        ticket: UpdateTicket,
        result: Result<Task, StoreError>,
    ) -> Outcome<Task> {
        let id = ticket.task_id();
        if !self.settle(id, ticket.generation) || !board.contains(id) {
            tracing::debug!(task_id = %id, "stale update discarded");
            return Outcome::Discarded;
        }
        match result {
            Ok(task) => {
                tracing::debug!(task_id = %id, "update confirmed");
                board.upsert(task.clone());
                Outcome::Confirmed(task)
            }
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "update failed");
                Outcome::Failed(e)
            }
        }
    }

    // --- delete ---

    /// Returns the ticket for deleting `id`. The task stays on the board.
    ///
    /// # Errors
    ///
    /// [`SyncError::Loading`], [`SyncError::NotOnBoard`] or
    /// [`SyncError::Busy`].
    pub fn begin_delete(
        &mut self,
        board: &BoardState,
        id: &TaskId,
    ) -> Result<DeleteTicket, SyncError> {
        self.ensure_free(board, id)?;
        let generation = self.claim(id, MutationKind::Delete);
        Ok(DeleteTicket {
            generation,
            task_id: id.clone(),
        })
    }

    /// Removes the task from the board once the store confirms.
    pub fn complete_delete(
        &mut self,
        board: &mut BoardState,
        ticket: DeleteTicket,
        result: Result<(), StoreError>,
    ) -> Outcome<()> {
        let id = &ticket.task_id;
        if !self.settle(id, ticket.generation) {
            tracing::debug!(task_id = %id, "stale delete discarded");
            return Outcome::Discarded;
        }
        match result {
            Ok(()) => {
                if board.remove(id).is_none() {
                    return Outcome::Discarded;
                }
                tracing::debug!(task_id = %id, "delete confirmed");
                Outcome::Confirmed(())
            }
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "delete failed");
                Outcome::Failed(e)
            }
        }
    }
}
