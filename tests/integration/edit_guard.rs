//! Integration tests for the detail view's edit guard.
//!
//! Runs `EditGuard` together with a `SyncSession` so that saves go through
//! the sync engine and an `InMemoryTaskStore`.
//!
//! These tests validate:
//! - Viewing and clean edits close without confirmation
//! - Dirty edits ask before discarding, and keeping the edit preserves it
//! - Saves send the full record and rebase the guard on the store's answer
//! - A refused save keeps the working copy
//! - Blank titles are refused before any request

use std::sync::Arc;

use kanban::edit::{EditError, EditGuard, EditState};
use kanban::store::memory::StoreOp;
use kanban::store::{InMemoryTaskStore, StoreError};
use kanban::sync::{Outcome, SyncSession};
use kanban_proto::{Status, Task, TaskDraft, TaskId};

fn make_task(description: &str) -> Task {
    TaskDraft::new("Buy milk", description, Status::InProgress).into_task(TaskId::new("milk"))
}

async fn make_session(task: Task) -> SyncSession<Arc<InMemoryTaskStore>> {
    let mut session = SyncSession::new(Arc::new(InMemoryTaskStore::with_tasks(vec![task])));
    session.load().await.expect("load failed");
    session
}

fn stored(session: &SyncSession<Arc<InMemoryTaskStore>>) -> Task {
    session
        .board()
        .get(&TaskId::new("milk"))
        .cloned()
        .expect("task on board")
}

// =============================================================================
// Dismissal
// =============================================================================

#[test]
fn viewing_dismisses_immediately() {
    let mut guard = EditGuard::open(&make_task(""));
    assert_eq!(guard.request_dismiss(), EditState::Closed);
}

#[test]
fn dirty_edit_requires_confirmation() {
    let mut guard = EditGuard::open(&make_task(""));
    guard.begin_edit();
    guard.working_mut().unwrap().description = "semi-skimmed".to_string();

    assert_eq!(guard.request_dismiss(), EditState::ConfirmingDiscard);
    guard.keep_editing();
    assert_eq!(guard.state(), EditState::Editing);
    assert_eq!(guard.content().description, "semi-skimmed");

    assert_eq!(guard.request_dismiss(), EditState::ConfirmingDiscard);
    guard.discard();
    assert!(guard.is_closed());
    assert_eq!(guard.content().description, "");
}

#[test]
fn reverting_field_by_field_is_clean() {
    let mut guard = EditGuard::open(&make_task("2 litres"));
    guard.begin_edit();
    guard.working_mut().unwrap().title = "Buy oat milk".to_string();
    assert!(guard.is_dirty());
    guard.working_mut().unwrap().title = "Buy milk".to_string();
    assert!(!guard.is_dirty());
    assert_eq!(guard.request_dismiss(), EditState::Closed);
}

// =============================================================================
// Saving
// =============================================================================

#[tokio::test]
async fn save_round_trip_rebases_guard() {
    let mut session = make_session(make_task("")).await;
    let mut guard = EditGuard::open(&stored(&session));
    guard.begin_edit();
    guard.working_mut().unwrap().title = "Buy oat milk".to_string();
    guard.working_mut().unwrap().description = "2 litres".to_string();

    let record = guard.prepare_save(&stored(&session)).unwrap();
    assert_eq!(record.status, Status::InProgress);
    let Outcome::Confirmed(task) = session.update_task(record).await.unwrap() else {
        panic!("update should be confirmed");
    };
    guard.saved(&task);

    assert_eq!(guard.state(), EditState::Viewing);
    assert!(!guard.is_dirty());
    assert_eq!(session.store().tasks(), vec![task.clone()]);
    assert_eq!(stored(&session), task);
    assert_eq!(guard.request_dismiss(), EditState::Closed);
}

#[tokio::test]
async fn refused_save_keeps_working_copy() {
    let mut session = make_session(make_task("")).await;
    session.store().fail_next(
        StoreOp::Update,
        StoreError::Rejected {
            status: 500,
            reason: "failed to persist tasks".to_string(),
        },
    );
    let mut guard = EditGuard::open(&stored(&session));
    guard.begin_edit();
    guard.working_mut().unwrap().title = "Buy oat milk".to_string();

    let record = guard.prepare_save(&stored(&session)).unwrap();
    let outcome = session.update_task(record).await.unwrap();
    assert!(matches!(outcome, Outcome::Failed(_)));

    assert_eq!(guard.state(), EditState::Editing);
    assert!(guard.is_dirty());
    assert_eq!(stored(&session).title, "Buy milk");
    assert_eq!(guard.request_dismiss(), EditState::ConfirmingDiscard);
}

#[tokio::test]
async fn blank_title_is_refused_before_any_request() {
    let session = make_session(make_task("")).await;
    let mut guard = EditGuard::open(&stored(&session));
    guard.begin_edit();
    guard.working_mut().unwrap().title = " \t ".to_string();

    assert_eq!(
        guard.prepare_save(&stored(&session)),
        Err(EditError::BlankTitle)
    );
    assert!(
        session
            .store()
            .calls()
            .iter()
            .all(|c| c.op != StoreOp::Update)
    );
}

#[tokio::test]
async fn save_keeps_column_moved_meanwhile() {
    let mut session = make_session(make_task("")).await;
    let mut guard = EditGuard::open(&stored(&session));
    guard.begin_edit();
    guard.working_mut().unwrap().description = "urgent".to_string();

    session
        .move_task(&TaskId::new("milk"), Status::Done)
        .await
        .unwrap();

    let record = guard.prepare_save(&stored(&session)).unwrap();
    assert_eq!(record.status, Status::Done);
    let outcome = session.update_task(record).await.unwrap();
    assert!(outcome.is_confirmed());
    assert_eq!(session.store().tasks()[0].status, Status::Done);
}
