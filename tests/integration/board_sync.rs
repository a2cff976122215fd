//! Integration tests for optimistic board synchronization.
//!
//! Drives `SyncSession` and the background worker against an
//! `InMemoryTaskStore` with injected failures and latency.
//!
//! These tests validate:
//! - A refused move snaps the card back to its original column
//! - Dropping on a card moves the dragged task to that card's column
//! - No-op drops never reach the store
//! - A failed delete leaves the task on the board and in the store
//! - The optimistic patch is visible before the store answers
//! - Requests for different tasks settle independently

use std::sync::Arc;
use std::time::Duration;

use kanban::board::{BoardState, StatusChange};
use kanban::store::memory::{StoreCall, StoreOp};
use kanban::store::{InMemoryTaskStore, StoreError};
use kanban::sync::{Outcome, SyncCommand, SyncEngine, SyncError, SyncEvent, SyncSession, spawn_worker};
use kanban_proto::{Status, Task, TaskDraft, TaskId};

fn make_task(id: &str, title: &str, status: Status) -> Task {
    TaskDraft::new(title, "", status).into_task(TaskId::new(id))
}

fn server_error() -> StoreError {
    StoreError::Rejected {
        status: 500,
        reason: "failed to persist tasks".to_string(),
    }
}

/// A loaded session over the given tasks.
async fn make_session(tasks: Vec<Task>) -> SyncSession<Arc<InMemoryTaskStore>> {
    let store = Arc::new(InMemoryTaskStore::with_tasks(tasks));
    let mut session = SyncSession::new(store);
    session.load().await.expect("load failed");
    session
}

fn updates(store: &InMemoryTaskStore) -> usize {
    store
        .calls()
        .iter()
        .filter(|c| c.op == StoreOp::Update)
        .count()
}

// =============================================================================
// Moves
// =============================================================================

#[tokio::test]
async fn refused_move_snaps_back() {
    let mut session = make_session(vec![make_task("milk", "Buy milk", Status::Todo)]).await;
    session.store().fail_next(StoreOp::Update, server_error());

    let change = session
        .drop_task(&TaskId::new("milk"), Some("Em Progresso"))
        .await
        .unwrap();

    assert_eq!(change, Some(StatusChange::RolledBackTo(Status::Todo)));
    let task = session.board().get(&TaskId::new("milk")).unwrap();
    assert_eq!(task.status, Status::Todo);
    assert_eq!(task.title, "Buy milk");
    assert_eq!(session.store().tasks()[0].status, Status::Todo);
    assert!(session.engine().is_idle());
}

#[tokio::test]
async fn drop_on_card_takes_its_column() {
    let mut session = make_session(vec![
        make_task("milk", "Buy milk", Status::Todo),
        make_task("review", "Review PR", Status::Done),
    ])
    .await;

    let change = session
        .drop_task(&TaskId::new("milk"), Some("review"))
        .await
        .unwrap();

    assert_eq!(change, Some(StatusChange::Applied(Status::Done)));
    assert_eq!(
        session.board().get(&TaskId::new("milk")).unwrap().status,
        Status::Done
    );
    let stored = session.store().tasks();
    assert!(stored.iter().all(|t| t.status == Status::Done));
}

#[tokio::test]
async fn move_sends_the_full_record() {
    let mut task = make_task("milk", "Buy milk", Status::Todo);
    task.description = Some("2 litres".to_string());
    let mut session = make_session(vec![task]).await;

    session
        .move_task(&TaskId::new("milk"), Status::InProgress)
        .await
        .unwrap();

    let stored = &session.store().tasks()[0];
    assert_eq!(stored.status, Status::InProgress);
    assert_eq!(stored.description.as_deref(), Some("2 litres"));
}

#[tokio::test]
async fn no_op_drops_never_reach_the_store() {
    let mut session = make_session(vec![
        make_task("milk", "Buy milk", Status::Todo),
        make_task("bread", "Buy bread", Status::Todo),
    ])
    .await;
    let milk = TaskId::new("milk");

    // Released over nothing, over its own column, over a sibling card,
    // over an unknown surface.
    for target in [None, Some("A Fazer"), Some("bread"), Some("ghost")] {
        assert_eq!(session.drop_task(&milk, target).await.unwrap(), None);
    }
    // Dragged task that is not on the board.
    assert_eq!(
        session
            .drop_task(&TaskId::new("ghost"), Some("Concluídas"))
            .await
            .unwrap(),
        None
    );

    assert_eq!(updates(session.store()), 0);
}

#[tokio::test]
async fn moving_to_current_column_is_refused_up_front() {
    let mut session = make_session(vec![make_task("milk", "Buy milk", Status::Todo)]).await;
    let err = session
        .move_task(&TaskId::new("milk"), Status::Todo)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NoChange { .. }));
    assert_eq!(updates(session.store()), 0);
}

// =============================================================================
// Create / delete
// =============================================================================

#[tokio::test]
async fn created_task_uses_store_identity() {
    let mut session = make_session(Vec::new()).await;
    let outcome = session
        .create_task(TaskDraft::new("Plan sprint", "", Status::InProgress))
        .await
        .unwrap();

    let Outcome::Confirmed(task) = outcome else {
        panic!("create should be confirmed");
    };
    assert_eq!(session.board().list(), std::slice::from_ref(&task));
    assert_eq!(session.store().tasks(), vec![task]);
}

#[tokio::test]
async fn failed_create_adds_nothing() {
    let mut session = make_session(Vec::new()).await;
    session.store().set_unreachable(true);
    let outcome = session
        .create_task(TaskDraft::new("Plan sprint", "", Status::Todo))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Failed(StoreError::Transport(_))));
    assert!(session.board().is_empty());
}

#[tokio::test]
async fn failed_delete_keeps_task() {
    let mut session = make_session(vec![make_task("milk", "Buy milk", Status::Todo)]).await;
    session.store().fail_next(StoreOp::Delete, server_error());

    let outcome = session.delete_task(&TaskId::new("milk")).await.unwrap();
    assert_eq!(outcome, Outcome::Failed(server_error()));
    assert!(session.board().contains(&TaskId::new("milk")));
    assert_eq!(session.store().tasks().len(), 1);

    // A retry goes through.
    let outcome = session.delete_task(&TaskId::new("milk")).await.unwrap();
    assert!(outcome.is_confirmed());
    assert!(session.board().is_empty());
    assert_eq!(
        session.store().calls().last(),
        Some(&StoreCall {
            op: StoreOp::Delete,
            task_id: Some(TaskId::new("milk")),
        })
    );
}

#[tokio::test]
async fn failed_load_keeps_board() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![make_task(
        "milk",
        "Buy milk",
        Status::Todo,
    )]));
    store.set_unreachable(true);
    let mut session = SyncSession::new(Arc::clone(&store));
    assert!(session.load().await.is_err());
    assert!(session.board().is_empty());
}

// =============================================================================
// Worker-driven timing
// =============================================================================

#[tokio::test(start_paused = true)]
async fn optimistic_patch_is_visible_before_the_answer() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![make_task(
        "milk",
        "Buy milk",
        Status::Todo,
    )]));
    store.set_latency(StoreOp::Update, Some(Duration::from_secs(2)));
    store.fail_next(StoreOp::Update, server_error());
    let mut board = BoardState::from_tasks(store.tasks());
    let mut engine = SyncEngine::new();
    let mut revisions = board.subscribe();
    let (tx, mut rx) = spawn_worker(Arc::clone(&store), 8);

    let ticket = engine
        .begin_move(&mut board, &TaskId::new("milk"), Status::InProgress)
        .unwrap();
    assert!(revisions.has_changed().unwrap());
    revisions.mark_unchanged();
    assert_eq!(
        board.get(&TaskId::new("milk")).unwrap().status,
        Status::InProgress
    );
    tx.send(SyncCommand::Move(ticket)).await.unwrap();

    let Some(SyncEvent::Moved(ticket, result)) = rx.recv().await else {
        panic!("expected a move answer");
    };
    assert!(result.is_err());
    let change = engine.complete_move(&mut board, ticket, result);
    assert_eq!(change, StatusChange::RolledBackTo(Status::Todo));
    assert!(revisions.has_changed().unwrap());
    assert_eq!(board.get(&TaskId::new("milk")).unwrap().status, Status::Todo);
}

#[tokio::test(start_paused = true)]
async fn requests_for_different_tasks_settle_independently() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![
        make_task("a", "Task A", Status::Todo),
        make_task("b", "Task B", Status::Todo),
    ]));
    store.set_latency(StoreOp::Update, Some(Duration::from_secs(1)));
    store.fail_next(StoreOp::Update, server_error());
    let mut board = BoardState::from_tasks(store.tasks());
    let mut engine = SyncEngine::new();
    let (tx, mut rx) = spawn_worker(Arc::clone(&store), 8);

    let a = engine
        .begin_move(&mut board, &TaskId::new("a"), Status::Done)
        .unwrap();
    tx.send(SyncCommand::Move(a)).await.unwrap();
    let b = engine
        .begin_move(&mut board, &TaskId::new("b"), Status::InProgress)
        .unwrap();
    tx.send(SyncCommand::Move(b)).await.unwrap();
    assert_eq!(engine.pending_count(), 2);

    for _ in 0..2 {
        let Some(SyncEvent::Moved(ticket, result)) = rx.recv().await else {
            panic!("expected a move answer");
        };
        engine.complete_move(&mut board, ticket, result);
    }

    // Exactly one of the two updates hit the injected failure.
    let statuses = [
        board.get(&TaskId::new("a")).unwrap().status,
        board.get(&TaskId::new("b")).unwrap().status,
    ];
    let rolled_back = statuses.iter().filter(|s| **s == Status::Todo).count();
    assert_eq!(rolled_back, 1);
    assert!(engine.is_idle());
    for task in store.tasks() {
        assert_eq!(Some(task.status), board.get(&task.id).map(|t| t.status));
    }
}

#[test]
fn rollback_restores_status_over_concurrent_edit() {
    let mut board = BoardState::from_tasks(vec![make_task("milk", "Buy milk", Status::Todo)]);
    let mut engine = SyncEngine::new();
    let id = TaskId::new("milk");
    let ticket = engine.begin_move(&mut board, &id, Status::InProgress).unwrap();

    let mut edited = board.get(&id).cloned().unwrap();
    edited.title = "Buy oat milk".to_string();
    board.upsert(edited);

    engine.complete_move(&mut board, ticket, Err(server_error()));
    let task = board.get(&id).unwrap();
    assert_eq!(task.status, Status::Todo);
    assert_eq!(task.title, "Buy oat milk");
}

#[tokio::test]
async fn second_mutation_on_busy_task_is_refused() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![make_task(
        "milk",
        "Buy milk",
        Status::Todo,
    )]));
    let mut board = BoardState::from_tasks(store.tasks());
    let mut engine = SyncEngine::new();
    let id = TaskId::new("milk");

    let _ticket = engine.begin_move(&mut board, &id, Status::Done).unwrap();
    assert_eq!(
        engine.begin_delete(&board, &id),
        Err(SyncError::Busy(id.clone()))
    );
    assert_eq!(
        engine.begin_move(&mut board, &id, Status::InProgress),
        Err(SyncError::Busy(id.clone()))
    );
    assert_eq!(board.get(&id).unwrap().status, Status::Done);
}
