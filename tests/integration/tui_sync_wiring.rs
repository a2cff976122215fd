//! Integration tests for the TUI ↔ sync worker wiring.
//!
//! Feeds key events into `App`, forwards the returned commands to a worker
//! spawned over an `InMemoryTaskStore`, and applies the worker's events
//! back to the app, the same way the main loop does.
//!
//! These tests validate:
//! - The initial load fills the board
//! - A keyboard drag is persisted to the store
//! - A refused move snaps back without a notification
//! - Create, save and delete flow through the worker
//! - Failed confirm-first requests surface a notice
//! - A reload never overwrites a change confirmed while it was in flight

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use kanban::app::{App, NoticeLevel};
use kanban::edit::EditState;
use kanban::store::memory::StoreOp;
use kanban::store::{InMemoryTaskStore, StoreError};
use kanban::sync::{SyncCommand, SyncEvent, spawn_worker};
use kanban_proto::{Status, Task, TaskDraft, TaskId};
use tokio::sync::mpsc;

struct Harness {
    app: App,
    store: Arc<InMemoryTaskStore>,
    tx: mpsc::Sender<SyncCommand>,
    rx: mpsc::Receiver<SyncEvent>,
}

impl Harness {
    /// Spawn a worker over `tasks` and run the initial load.
    async fn start(tasks: Vec<Task>) -> Self {
        let store = Arc::new(InMemoryTaskStore::with_tasks(tasks));
        let (tx, rx) = spawn_worker(Arc::clone(&store), 16);
        let mut harness = Self {
            app: App::new("memory"),
            store,
            tx,
            rx,
        };
        let load = harness.app.start_load().expect("engine should be idle");
        harness.send(load).await;
        harness.settle().await;
        harness
    }

    async fn send(&self, cmd: SyncCommand) {
        self.tx.send(cmd).await.expect("worker gone");
    }

    /// Press a key and forward any resulting command to the worker.
    async fn press(&mut self, key: KeyEvent) {
        if let Some(cmd) = self.app.handle_key_event(key) {
            self.send(cmd).await;
        }
    }

    async fn press_code(&mut self, code: KeyCode) {
        self.press(KeyEvent::new(code, KeyModifiers::NONE)).await;
    }

    async fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press_code(KeyCode::Char(c)).await;
        }
    }

    /// Apply worker events until nothing is pending.
    async fn settle(&mut self) {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
                .await
                .expect("timeout waiting for sync event")
                .expect("event channel closed");
            self.app.apply_sync_event(event);
            if self.app.engine().is_idle() && self.app.loaded {
                break;
            }
        }
    }

    fn status_of(&self, id: &str) -> Status {
        self.app.board().get(&TaskId::new(id)).unwrap().status
    }
}

fn make_task(id: &str, title: &str, status: Status) -> Task {
    TaskDraft::new(title, "", status).into_task(TaskId::new(id))
}

fn seed() -> Vec<Task> {
    vec![
        make_task("milk", "Buy milk", Status::Todo),
        make_task("notes", "Release notes", Status::InProgress),
    ]
}

// =============================================================================
// Load
// =============================================================================

#[tokio::test]
async fn initial_load_fills_board() {
    let h = Harness::start(seed()).await;
    assert_eq!(h.app.board().len(), 2);
    assert_eq!(h.app.focused_task().unwrap().title, "Buy milk");
}

#[tokio::test]
async fn failed_load_is_reported() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(seed()));
    store.set_unreachable(true);
    let (tx, mut rx) = spawn_worker(Arc::clone(&store), 4);
    let mut app = App::new("memory");
    tx.send(SyncCommand::Load).await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    app.apply_sync_event(event);
    assert!(app.board().is_empty());
    assert_eq!(app.notices.len(), 1);
    assert_eq!(app.notices[0].level, NoticeLevel::Error);
}

// =============================================================================
// Moves
// =============================================================================

#[tokio::test]
async fn keyboard_drag_is_persisted() {
    let mut h = Harness::start(seed()).await;
    h.press_code(KeyCode::Char(' ')).await;
    h.press_code(KeyCode::Right).await;
    h.press_code(KeyCode::Right).await;
    h.press_code(KeyCode::Enter).await;
    assert_eq!(h.status_of("milk"), Status::Done);

    h.settle().await;
    assert_eq!(h.status_of("milk"), Status::Done);
    let stored = h.store.tasks();
    assert_eq!(
        stored.iter().find(|t| t.id.as_str() == "milk").unwrap().status,
        Status::Done
    );
}

#[tokio::test]
async fn refused_move_snaps_back_quietly() {
    let mut h = Harness::start(seed()).await;
    h.store.fail_next(
        StoreOp::Update,
        StoreError::Transport("connection reset".to_string()),
    );

    h.press_code(KeyCode::Char(' ')).await;
    h.press_code(KeyCode::Right).await;
    h.press_code(KeyCode::Enter).await;
    assert_eq!(h.status_of("milk"), Status::InProgress);

    h.settle().await;
    assert_eq!(h.status_of("milk"), Status::Todo);
    assert!(h.app.notices.is_empty());
}

// =============================================================================
// Create / save / delete
// =============================================================================

#[tokio::test]
async fn create_form_adds_store_record() {
    let mut h = Harness::start(seed()).await;
    h.press_code(KeyCode::Char('n')).await;
    h.type_text("Plan sprint").await;
    h.press_code(KeyCode::Enter).await;
    assert_eq!(h.app.board().len(), 2);

    h.settle().await;
    assert_eq!(h.app.board().len(), 3);
    let stored = h.store.tasks();
    let created = stored.iter().find(|t| t.title == "Plan sprint").unwrap();
    assert_eq!(created.status, Status::Todo);
    assert_eq!(h.app.board().get(&created.id), Some(created));
}

#[tokio::test]
async fn detail_save_round_trip() {
    let mut h = Harness::start(seed()).await;
    h.press_code(KeyCode::Enter).await;
    h.press_code(KeyCode::Char('e')).await;
    h.press_code(KeyCode::Tab).await;
    h.type_text("2 litres").await;
    h.press(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL))
        .await;

    h.settle().await;
    let guard = h.app.detail().unwrap();
    assert_eq!(guard.state(), EditState::Viewing);
    assert_eq!(guard.baseline().description, "2 litres");
    assert_eq!(
        h.store.tasks()[0].description.as_deref(),
        Some("2 litres")
    );
}

#[tokio::test]
async fn failed_delete_keeps_card_and_notifies() {
    let mut h = Harness::start(seed()).await;
    h.store.fail_next(
        StoreOp::Delete,
        StoreError::Rejected {
            status: 500,
            reason: "failed to persist tasks".to_string(),
        },
    );
    h.press_code(KeyCode::Char('d')).await;
    h.settle().await;

    assert!(h.app.board().contains(&TaskId::new("milk")));
    assert_eq!(h.app.notices.len(), 1);

    h.press_code(KeyCode::Char('d')).await;
    h.settle().await;
    assert!(!h.app.board().contains(&TaskId::new("milk")));
    assert_eq!(h.store.tasks().len(), 1);
}

// =============================================================================
// Reload
// =============================================================================

#[tokio::test]
async fn reload_in_flight_holds_back_delete() {
    let mut h = Harness::start(seed()).await;
    h.press_code(KeyCode::Char('r')).await;
    assert!(h.app.engine().is_loading());

    // Refused outright: the list answer would otherwise bring the task back.
    let delete = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE);
    assert!(h.app.handle_key_event(delete).is_none());
    h.settle().await;
    assert!(h.app.board().contains(&TaskId::new("milk")));

    h.press_code(KeyCode::Char('d')).await;
    h.settle().await;
    h.press_code(KeyCode::Char('r')).await;
    h.settle().await;

    assert!(!h.app.board().contains(&TaskId::new("milk")));
    assert!(h.store.tasks().iter().all(|t| t.id.as_str() != "milk"));
    assert_eq!(h.app.board().len(), h.store.tasks().len());
}
