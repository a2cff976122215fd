//! End-to-end tests: `HttpTaskStore` and `SyncSession` against an
//! in-process `kanban-server`.
//!
//! These tests validate:
//! - The HTTP store round-trips create/list/update/delete
//! - Server errors map onto `StoreError` (400 → Rejected, 404 → NotFound)
//! - A move the server refuses is rolled back on the board
//! - An unreachable server surfaces as a transport error

use std::sync::Arc;
use std::time::Duration;

use kanban::board::StatusChange;
use kanban::store::{HttpTaskStore, StoreError, TaskStore};
use kanban::sync::{Outcome, SyncSession};
use kanban_proto::{Status, TaskDraft, TaskId};
use url::Url;

/// Start the store server in-process and return a client for it.
async fn start_store() -> (HttpTaskStore, tokio::task::JoinHandle<()>) {
    let (addr, handle) = kanban_server::api::start_server("127.0.0.1:0")
        .await
        .expect("failed to start store server");
    let url = Url::parse(&format!("http://{addr}/")).expect("valid url");
    let store = HttpTaskStore::new(url, Duration::from_secs(5)).expect("client");
    (store, handle)
}

// =============================================================================
// Store client
// =============================================================================

#[tokio::test]
async fn crud_round_trip() {
    let (store, _handle) = start_store().await;
    assert!(store.list_tasks().await.unwrap().is_empty());

    let created = store
        .create_task(&TaskDraft::new("Buy milk", "2 litres", Status::Todo))
        .await
        .unwrap();
    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.description.as_deref(), Some("2 litres"));
    assert!(!created.id.as_str().is_empty());

    let moved = store
        .update_task(&created.id, &created.with_status(Status::Done))
        .await
        .unwrap();
    assert_eq!(moved.status, Status::Done);
    assert_eq!(store.list_tasks().await.unwrap(), vec![moved]);

    store.delete_task(&created.id).await.unwrap();
    assert!(store.list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_title_is_rejected_with_reason() {
    let (store, _handle) = start_store().await;
    let err = store
        .create_task(&TaskDraft::new("", "", Status::Todo))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::Rejected {
            status: 400,
            reason: "task title is required".to_string(),
        }
    );
}

#[tokio::test]
async fn unknown_ids_map_to_not_found() {
    let (store, _handle) = start_store().await;
    let ghost = TaskDraft::new("Ghost", "", Status::Todo).into_task(TaskId::new("ghost"));

    assert_eq!(
        store.update_task(&ghost.id, &ghost).await,
        Err(StoreError::NotFound(ghost.id.clone()))
    );
    assert_eq!(
        store.delete_task(&ghost.id).await,
        Err(StoreError::NotFound(ghost.id.clone()))
    );
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let (store, handle) = start_store().await;
    let url = store.base_url().clone();
    handle.abort();
    let _ = handle.await;

    let store = HttpTaskStore::new(url, Duration::from_millis(500)).unwrap();
    let err = store.list_tasks().await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)), "got {err:?}");
}

// =============================================================================
// Sync session over HTTP
// =============================================================================

#[tokio::test]
async fn session_moves_persist_on_server() {
    let (store, _handle) = start_store().await;
    let store = Arc::new(store);
    let mut session = SyncSession::new(Arc::clone(&store));

    let Outcome::Confirmed(task) = session
        .create_task(TaskDraft::new("Buy milk", "", Status::Todo))
        .await
        .unwrap()
    else {
        panic!("create should be confirmed");
    };

    let change = session
        .drop_task(&task.id, Some(Status::InProgress.column_id()))
        .await
        .unwrap();
    assert_eq!(change, Some(StatusChange::Applied(Status::InProgress)));

    // A fresh session sees the same board.
    let mut other = SyncSession::new(Arc::clone(&store));
    assert_eq!(other.load().await.unwrap(), 1);
    assert_eq!(
        other.board().get(&task.id).unwrap().status,
        Status::InProgress
    );
}

#[tokio::test]
async fn move_refused_by_server_rolls_back() {
    let (store, _handle) = start_store().await;
    let store = Arc::new(store);
    let task = store
        .create_task(&TaskDraft::new("Buy milk", "", Status::Todo))
        .await
        .unwrap();
    let mut session = SyncSession::new(Arc::clone(&store));
    session.load().await.unwrap();

    // Someone else deletes it; the board still shows the card.
    store.delete_task(&task.id).await.unwrap();

    let change = session.move_task(&task.id, Status::Done).await.unwrap();
    assert_eq!(change, StatusChange::RolledBackTo(Status::Todo));
    assert_eq!(session.board().get(&task.id).unwrap().status, Status::Todo);
    assert!(session.engine().is_idle());
}

#[tokio::test]
async fn session_delete_removes_from_board_and_server() {
    let (store, _handle) = start_store().await;
    let store = Arc::new(store);
    let mut session = SyncSession::new(Arc::clone(&store));
    let Outcome::Confirmed(task) = session
        .create_task(TaskDraft::new("Buy milk", "", Status::Todo))
        .await
        .unwrap()
    else {
        panic!("create should be confirmed");
    };

    let outcome = session.delete_task(&task.id).await.unwrap();
    assert!(outcome.is_confirmed());
    assert!(session.board().is_empty());
    assert!(store.list_tasks().await.unwrap().is_empty());
}
