//! Background worker bridging the UI loop to the task store.
//!
//! The UI thread owns the board and the engine. It sends tickets as
//! [`SyncCommand`]s and drains [`SyncEvent`]s on every tick of its loop,
//! handing each result back to the engine's `complete_*` methods.
//!
//! ```text
//! UI loop  ─── SyncCommand ──→  dispatcher ──spawn──→ one task per request
//!          ←── SyncEvent ────────────────────────────┘
//! ```
//!
//! Every request runs on its own tokio task, so requests for different
//! tasks never wait on each other.

use std::sync::Arc;

use kanban_proto::Task;
use tokio::sync::mpsc;

use super::{CreateTicket, DeleteTicket, MoveTicket, UpdateTicket};
use crate::store::{StoreError, TaskStore};

/// Requests from the UI loop to the worker.
#[derive(Debug)]
pub enum SyncCommand {
    /// Fetch the full task list.
    Load,
    /// Persist an optimistic move.
    Move(MoveTicket),
    /// Create a task.
    Create(CreateTicket),
    /// Persist an edited record.
    Update(UpdateTicket),
    /// Delete a task.
    Delete(DeleteTicket),
    /// Stop accepting commands.
    Shutdown,
}

/// Store answers delivered back to the UI loop.
#[derive(Debug)]
pub enum SyncEvent {
    /// Answer to [`SyncCommand::Load`].
    Loaded(Result<Vec<Task>, StoreError>),
    /// Answer to [`SyncCommand::Move`].
    Moved(MoveTicket, Result<Task, StoreError>),
    /// Answer to [`SyncCommand::Create`].
    Created(CreateTicket, Result<Task, StoreError>),
    /// Answer to [`SyncCommand::Update`].
    Updated(UpdateTicket, Result<Task, StoreError>),
    /// Answer to [`SyncCommand::Delete`].
    Deleted(DeleteTicket, Result<(), StoreError>),
}

/// Spawns the worker for `store` and returns its channel handles.
///
/// Must be called from within a tokio runtime.
pub fn spawn_worker<S>(
    store: Arc<S>,
    channel_capacity: usize,
) -> (mpsc::Sender<SyncCommand>, mpsc::Receiver<SyncEvent>)
where
    S: TaskStore + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<SyncCommand>(channel_capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<SyncEvent>(channel_capacity);

    tokio::spawn(async move {
        command_handler(store, cmd_rx, evt_tx).await;
    });

    (cmd_tx, evt_rx)
}

/// Asks the worker to stop without waiting for queue space.
///
/// Returns whether the request was queued; a full queue or a worker that is
/// already gone is logged and otherwise ignored.
pub fn request_shutdown(cmd_tx: &mpsc::Sender<SyncCommand>) -> bool {
    match cmd_tx.try_send(SyncCommand::Shutdown) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "shutdown not delivered to sync worker");
            false
        }
    }
}

/// Receives commands and runs each one on its own task.
async fn command_handler<S>(
    store: Arc<S>,
    mut cmd_rx: mpsc::Receiver<SyncCommand>,
    evt_tx: mpsc::Sender<SyncEvent>,
) where
    S: TaskStore + 'static,
{
    while let Some(cmd) = cmd_rx.recv().await {
        if matches!(cmd, SyncCommand::Shutdown) {
            tracing::info!("sync worker shutting down");
            break;
        }
        let store = Arc::clone(&store);
        let evt_tx = evt_tx.clone();
        tokio::spawn(async move {
            let event = execute(store.as_ref(), cmd).await;
            if let Some(event) = event
                && evt_tx.send(event).await.is_err()
            {
                tracing::debug!("sync event dropped, UI loop is gone");
            }
        });
    }
}

/// Runs one command against the store.
async fn execute<S: TaskStore>(store: &S, cmd: SyncCommand) -> Option<SyncEvent> {
    let event = match cmd {
        SyncCommand::Load => SyncEvent::Loaded(store.list_tasks().await),
        SyncCommand::Move(ticket) => {
            let result = store.update_task(ticket.task_id(), ticket.record()).await;
            SyncEvent::Moved(ticket, result)
        }
        SyncCommand::Create(ticket) => {
            let result = store.create_task(ticket.draft()).await;
            SyncEvent::Created(ticket, result)
        }
        SyncCommand::Update(ticket) => {
            let result = store.update_task(ticket.task_id(), ticket.record()).await;
            SyncEvent::Updated(ticket, result)
        }
        SyncCommand::Delete(ticket) => {
            let result = store.delete_task(ticket.task_id()).await;
            SyncEvent::Deleted(ticket, result)
        }
        SyncCommand::Shutdown => return None,
    };
    Some(event)
}
