//! Application state and event handling.
//!
//! `App` owns the board and the sync engine. Key handling runs the
//! synchronous `begin_*` half of every mutation and returns the resulting
//! [`SyncCommand`] for the main loop to hand to the worker; store answers
//! come back through [`App::apply_sync_event`].

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use kanban_proto::{Status, Task, TaskDraft, TaskId};

use crate::board::{BoardState, DragSession, DropTarget};
use crate::edit::{EditContent, EditError, EditGuard, EditState};
use crate::search;
use crate::store::StoreError;
use crate::sync::{Outcome, SyncCommand, SyncEngine, SyncError, SyncEvent};

/// Maximum number of notices kept on screen.
const MAX_NOTICES: usize = 5;

/// Which text field of a form has the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormField {
    /// Title input (default).
    #[default]
    Title,
    /// Description input.
    Description,
}

impl FormField {
    const fn toggle(self) -> Self {
        match self {
            Self::Title => Self::Description,
            Self::Description => Self::Title,
        }
    }
}

/// What the keyboard currently drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Navigating the board.
    Board,
    /// Carrying a card.
    Dragging,
    /// Typing into the create form.
    Creating,
    /// The detail view is open.
    Detail,
    /// Typing the search term.
    Search,
}

/// Inline create form, shown at the bottom of its column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateForm {
    /// Column the task will be created in.
    pub column: Status,
    /// Title input.
    pub title: String,
    /// Description input.
    pub description: String,
    /// Field with the cursor.
    pub field: FormField,
    /// Generation of the submitted create request, while it is in flight.
    pub pending: Option<u64>,
}

impl CreateForm {
    fn new(column: Status) -> Self {
        Self {
            column,
            title: String::new(),
            description: String::new(),
            field: FormField::Title,
            pending: None,
        }
    }

    const fn input_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Title => &mut self.title,
            FormField::Description => &mut self.description,
        }
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational hint.
    Info,
    /// A request failed or was refused.
    Error,
}

/// A message in the notification area.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Formatted local time (e.g., "14:23:05").
    pub timestamp: String,
    /// Message text.
    pub text: String,
    /// Severity.
    pub level: NoticeLevel,
    created: Instant,
}

/// Main application state.
pub struct App {
    board: BoardState,
    engine: SyncEngine,
    drag: Option<DragSession>,
    create_form: Option<CreateForm>,
    detail: Option<EditGuard>,
    /// Focused column.
    pub column: Status,
    /// Focused card, as an index into the column's visible tasks.
    pub card: usize,
    /// Field with the cursor while editing in the detail view.
    pub detail_field: FormField,
    /// Current search term.
    pub search: String,
    /// Whether keys go to the search input.
    pub searching: bool,
    /// Visible notifications, oldest first.
    pub notices: Vec<Notice>,
    notice_ttl: Duration,
    /// Where tasks are stored (shown in the status bar).
    pub store_label: String,
    /// Whether the initial load has answered.
    pub loaded: bool,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Create an empty board backed by the store described by `store_label`.
    #[must_use]
    pub fn new(store_label: impl Into<String>) -> Self {
        Self {
            board: BoardState::new(),
            engine: SyncEngine::new(),
            drag: None,
            create_form: None,
            detail: None,
            column: Status::Todo,
            card: 0,
            detail_field: FormField::Title,
            search: String::new(),
            searching: false,
            notices: Vec::new(),
            notice_ttl: Duration::from_secs(6),
            store_label: store_label.into(),
            loaded: false,
            should_quit: false,
        }
    }

    /// Set how long notices stay visible.
    #[must_use]
    pub const fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    /// The board as currently displayed.
    #[must_use]
    pub const fn board(&self) -> &BoardState {
        &self.board
    }

    /// The sync engine.
    #[must_use]
    pub const fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// The card being carried, if any.
    #[must_use]
    pub const fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// The open create form, if any.
    #[must_use]
    pub const fn create_form(&self) -> Option<&CreateForm> {
        self.create_form.as_ref()
    }

    /// The column whose create form is open. At most one at a time.
    #[must_use]
    pub fn active_column(&self) -> Option<Status> {
        self.create_form.as_ref().map(|f| f.column)
    }

    /// The open detail view, if any.
    #[must_use]
    pub const fn detail(&self) -> Option<&EditGuard> {
        self.detail.as_ref()
    }

    /// What the keyboard currently drives.
    #[must_use]
    pub const fn input_mode(&self) -> InputMode {
        if self.detail.is_some() {
            InputMode::Detail
        } else if self.create_form.is_some() {
            InputMode::Creating
        } else if self.searching {
            InputMode::Search
        } else if self.drag.is_some() {
            InputMode::Dragging
        } else {
            InputMode::Board
        }
    }

    /// Tasks of `status` that match the search term, in board order.
    #[must_use]
    pub fn visible_tasks(&self, status: Status) -> Vec<&Task> {
        self.board
            .tasks_in(status)
            .filter(|t| search::matches(t, &self.search))
            .collect()
    }

    /// The task under the cursor.
    #[must_use]
    pub fn focused_task(&self) -> Option<&Task> {
        self.visible_tasks(self.column).get(self.card).copied()
    }

    /// Add a notice, dropping the oldest past [`MAX_NOTICES`].
    pub fn push_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(Notice {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            text: text.into(),
            level,
            created: Instant::now(),
        });
        if self.notices.len() > MAX_NOTICES {
            self.notices.remove(0);
        }
    }

    /// Drop notices older than the configured lifetime.
    pub fn tick(&mut self) {
        let ttl = self.notice_ttl;
        self.notices.retain(|n| n.created.elapsed() < ttl);
    }

    /// Handle a key event.
    ///
    /// Returns a command when the key started a store request.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        match self.input_mode() {
            InputMode::Detail => self.handle_detail_key(key),
            InputMode::Creating => self.handle_form_key(key),
            InputMode::Search => {
                self.handle_search_key(key);
                None
            }
            InputMode::Dragging => self.handle_drag_key(key),
            InputMode::Board => self.handle_board_key(key),
        }
    }

    /// Apply a store answer delivered by the sync worker.
    pub fn apply_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Loaded(result) => {
                self.loaded = true;
                if let Err(e) = self.engine.complete_load(&mut self.board, result) {
                    self.push_notice(NoticeLevel::Error, format!("Could not load tasks: {e}"));
                }
            }
            SyncEvent::Moved(ticket, result) => {
                // Rollback is silent; the card simply snaps back.
                self.engine.complete_move(&mut self.board, ticket, result);
            }
            SyncEvent::Created(ticket, result) => {
                let generation = ticket.generation();
                let outcome = self.engine.complete_create(&mut self.board, ticket, result);
                let form_pending = self
                    .create_form
                    .as_ref()
                    .is_some_and(|f| f.pending == Some(generation));
                match outcome {
                    Outcome::Confirmed(_) if form_pending => self.create_form = None,
                    Outcome::Failed(e) => {
                        if form_pending && let Some(form) = self.create_form.as_mut() {
                            form.pending = None;
                        }
                        self.push_notice(NoticeLevel::Error, format!("Could not create task: {e}"));
                    }
                    _ => {}
                }
            }
            SyncEvent::Updated(ticket, result) => {
                let id = ticket.task_id().clone();
                let outcome = self.engine.complete_update(&mut self.board, ticket, result);
                let guard = self.detail.as_mut().filter(|g| g.task_id() == &id);
                match outcome {
                    Outcome::Confirmed(task) => {
                        if let Some(guard) = guard {
                            guard.saved(&task);
                        }
                    }
                    Outcome::Failed(e) => {
                        if let Some(guard) = guard {
                            guard.save_failed();
                        }
                        self.push_notice(NoticeLevel::Error, format!("Could not save task: {e}"));
                    }
                    Outcome::Discarded => {
                        if let Some(guard) = guard {
                            guard.save_failed();
                        }
                    }
                }
            }
            SyncEvent::Deleted(ticket, result) => {
                if let Outcome::Failed(e) = self.engine.complete_delete(&mut self.board, ticket, result)
                {
                    self.push_notice(NoticeLevel::Error, format!("Could not delete task: {e}"));
                }
            }
        }
        self.sync_detail();
        self.clamp_card();
    }

    /// Settle a command that never reached the worker as a transport failure.
    pub fn command_not_sent(&mut self, cmd: SyncCommand, reason: &str) {
        let error = StoreError::Transport(reason.to_string());
        let event = match cmd {
            SyncCommand::Load => SyncEvent::Loaded(Err(error)),
            SyncCommand::Move(ticket) => SyncEvent::Moved(ticket, Err(error)),
            SyncCommand::Create(ticket) => SyncEvent::Created(ticket, Err(error)),
            SyncCommand::Update(ticket) => SyncEvent::Updated(ticket, Err(error)),
            SyncCommand::Delete(ticket) => SyncEvent::Deleted(ticket, Err(error)),
            SyncCommand::Shutdown => return,
        };
        self.push_notice(NoticeLevel::Error, format!("Request not sent: {reason}"));
        self.apply_sync_event(event);
    }

    // --- board ---

    fn handle_board_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => self.step_column(false),
            KeyCode::Right | KeyCode::Char('l') => self.step_column(true),
            KeyCode::Up | KeyCode::Char('k') => self.card = self.card.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.step_card_down(),
            KeyCode::Char(' ' | 'm') => self.start_drag(),
            KeyCode::Enter => {
                self.detail = self.focused_task().map(EditGuard::open);
                self.detail_field = FormField::Title;
            }
            KeyCode::Char('n') => self.create_form = Some(CreateForm::new(self.column)),
            KeyCode::Char('d') => return self.delete_focused(),
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('r') => return self.start_load(),
            KeyCode::Esc => {
                self.search.clear();
                self.clamp_card();
            }
            _ => {}
        }
        None
    }

    fn step_column(&mut self, forward: bool) {
        let index = self.column.index();
        let next = if forward {
            Some(index + 1)
        } else {
            index.checked_sub(1)
        };
        if let Some(status) = next.and_then(Status::from_index) {
            self.focus_column(status);
        }
    }

    /// Moves the focus to `status`. Leaving the active column closes its
    /// create form.
    fn focus_column(&mut self, status: Status) {
        if self.active_column().is_some_and(|c| c != status) {
            self.create_form = None;
        }
        self.column = status;
        self.clamp_card();
    }

    fn step_card_down(&mut self) {
        if self.card + 1 < self.visible_tasks(self.column).len() {
            self.card += 1;
        }
    }

    fn clamp_card(&mut self) {
        let len = self.visible_tasks(self.column).len();
        self.card = self.card.min(len.saturating_sub(1));
    }

    /// Puts the cursor on `id` wherever it now is.
    fn follow_task(&mut self, id: &TaskId) {
        let Some(status) = self.board.get(id).map(|t| t.status) else {
            return;
        };
        self.column = status;
        self.card = self
            .visible_tasks(status)
            .iter()
            .position(|t| &t.id == id)
            .unwrap_or(0);
    }

    fn delete_focused(&mut self) -> Option<SyncCommand> {
        let id = self.focused_task()?.id.clone();
        match self.engine.begin_delete(&self.board, &id) {
            Ok(ticket) => Some(SyncCommand::Delete(ticket)),
            Err(e) => {
                self.report_refusal(&e);
                None
            }
        }
    }

    /// Starts a full reload of the board.
    ///
    /// Refused while changes are in flight; changes are refused in turn
    /// until the list has answered.
    pub fn start_load(&mut self) -> Option<SyncCommand> {
        match self.engine.begin_load() {
            Ok(()) => Some(SyncCommand::Load),
            Err(e) => {
                self.report_refusal(&e);
                None
            }
        }
    }

    fn report_refusal(&mut self, error: &SyncError) {
        match error {
            SyncError::NoChange { .. } => {}
            SyncError::Busy(_) => self.push_notice(
                NoticeLevel::Info,
                "That task still has a change in flight",
            ),
            SyncError::Loading => {
                self.push_notice(NoticeLevel::Info, "Tasks are still loading");
            }
            SyncError::Unsettled(_) => self.push_notice(
                NoticeLevel::Info,
                "Wait for pending changes before reloading",
            ),
            other => self.push_notice(NoticeLevel::Error, other.to_string()),
        }
    }

    // --- drag ---

    fn start_drag(&mut self) {
        let Some(task) = self.focused_task() else {
            return;
        };
        let refusal = if self.engine.is_loading() {
            Some(SyncError::Loading)
        } else if self.engine.is_busy(&task.id) {
            Some(SyncError::Busy(task.id.clone()))
        } else {
            None
        };
        if let Some(error) = refusal {
            self.report_refusal(&error);
            return;
        }
        let session = DragSession::start(task);
        tracing::debug!(task_id = %session.task_id(), "drag started");
        self.drag = Some(session);
    }

    fn handle_drag_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.step_column(false);
                self.hover_column();
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.step_column(true);
                self.hover_column();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.card = self.card.saturating_sub(1);
                self.hover_card();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.step_card_down();
                self.hover_card();
            }
            KeyCode::Enter | KeyCode::Char(' ' | 'm') => return self.drop_dragged(),
            KeyCode::Esc => {
                if let Some(drag) = self.drag.as_mut() {
                    drag.hover(None);
                }
                return self.drop_dragged();
            }
            _ => {}
        }
        None
    }

    fn hover_column(&mut self) {
        let column = self.column;
        if let Some(drag) = self.drag.as_mut() {
            drag.hover(Some(DropTarget::Column(column)));
        }
    }

    fn hover_card(&mut self) {
        let target = self.focused_task().map_or(DropTarget::Column(self.column), |t| {
            DropTarget::Card(t.id.clone())
        });
        if let Some(drag) = self.drag.as_mut() {
            drag.hover(Some(target));
        }
    }

    fn drop_dragged(&mut self) -> Option<SyncCommand> {
        let drag = self.drag.take()?;
        let origin = drag.task_id().clone();
        let Some((id, target)) = drag.release(&self.board) else {
            self.follow_task(&origin);
            return None;
        };
        match self.engine.begin_move(&mut self.board, &id, target) {
            Ok(ticket) => {
                self.follow_task(&id);
                Some(SyncCommand::Move(ticket))
            }
            Err(e) => {
                self.report_refusal(&e);
                self.follow_task(&id);
                None
            }
        }
    }

    // --- create form ---

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        let pending = self.create_form.as_ref().is_some_and(|f| f.pending.is_some());
        match key.code {
            KeyCode::Esc => self.create_form = None,
            KeyCode::Enter if !pending => return self.submit_create_form(),
            KeyCode::Left => self.step_column(false),
            KeyCode::Right => self.step_column(true),
            KeyCode::Tab | KeyCode::BackTab => {
                if let Some(form) = self.create_form.as_mut() {
                    form.field = form.field.toggle();
                }
            }
            KeyCode::Backspace if !pending => {
                if let Some(form) = self.create_form.as_mut() {
                    form.input_mut().pop();
                }
            }
            KeyCode::Char(c) if !pending => {
                if let Some(form) = self.create_form.as_mut() {
                    form.input_mut().push(c);
                }
            }
            _ => {}
        }
        None
    }

    fn submit_create_form(&mut self) -> Option<SyncCommand> {
        let form = self.create_form.as_ref()?;
        if form.title.trim().is_empty() {
            return None;
        }
        let draft = TaskDraft::new(form.title.clone(), form.description.clone(), form.column);
        match self.engine.begin_create(draft) {
            Ok(ticket) => {
                if let Some(form) = self.create_form.as_mut() {
                    form.pending = Some(ticket.generation());
                }
                Some(SyncCommand::Create(ticket))
            }
            Err(e) => {
                self.report_refusal(&e);
                None
            }
        }
    }

    // --- detail view ---

    fn handle_detail_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let guard = self.detail.as_mut()?;
        match guard.state() {
            EditState::Viewing => match key.code {
                KeyCode::Char('e') => {
                    guard.begin_edit();
                    self.detail_field = FormField::Title;
                }
                KeyCode::Esc | KeyCode::Char('q') => {
                    guard.request_dismiss();
                }
                _ => {}
            },
            EditState::Editing => match key.code {
                KeyCode::Char('s') if ctrl => return self.save_detail(),
                KeyCode::Char('r') if ctrl => guard.cancel_edit(),
                KeyCode::Esc => {
                    guard.request_dismiss();
                }
                KeyCode::Tab | KeyCode::BackTab => self.detail_field = self.detail_field.toggle(),
                KeyCode::Backspace => {
                    if let Some(content) = guard.working_mut() {
                        field_text(content, self.detail_field).pop();
                    }
                }
                KeyCode::Char(c) if !ctrl => {
                    if let Some(content) = guard.working_mut() {
                        field_text(content, self.detail_field).push(c);
                    }
                }
                _ => {}
            },
            EditState::ConfirmingDiscard => match key.code {
                KeyCode::Char('y' | 'd') => guard.discard(),
                KeyCode::Char('n') | KeyCode::Esc => guard.keep_editing(),
                _ => {}
            },
            EditState::Closed => {}
        }

        if self.detail.as_ref().is_some_and(EditGuard::is_closed) {
            self.detail = None;
        }
        None
    }

    fn save_detail(&mut self) -> Option<SyncCommand> {
        let guard = self.detail.as_ref()?;
        let Some(stored) = self.board.get(guard.task_id()) else {
            self.push_notice(NoticeLevel::Error, "Task is no longer on the board");
            return None;
        };
        let record = match guard.prepare_save(stored) {
            Ok(record) => record,
            Err(EditError::BlankTitle) => {
                self.push_notice(NoticeLevel::Info, "Title must not be blank");
                return None;
            }
            Err(EditError::SaveInFlight) => {
                self.push_notice(NoticeLevel::Info, "Still saving");
                return None;
            }
            Err(EditError::NotEditing) => return None,
        };
        match self.engine.begin_update(&self.board, record) {
            Ok(ticket) => {
                if let Some(guard) = self.detail.as_mut() {
                    guard.mark_saving();
                }
                Some(SyncCommand::Update(ticket))
            }
            Err(e) => {
                self.report_refusal(&e);
                None
            }
        }
    }

    /// Keeps an open detail view in step with the board.
    fn sync_detail(&mut self) {
        let Some(guard) = self.detail.as_mut() else {
            return;
        };
        match self.board.get(guard.task_id()) {
            Some(task) => guard.refresh(task),
            None => self.detail = None,
        }
    }

    // --- search ---

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.searching = false,
            KeyCode::Esc => {
                self.search.clear();
                self.searching = false;
            }
            KeyCode::Backspace => {
                self.search.pop();
            }
            KeyCode::Char(c) => self.search.push(c),
            _ => {}
        }
        self.clamp_card();
    }
}

const fn field_text(content: &mut EditContent, field: FormField) -> &mut String {
    match field {
        FormField::Title => &mut content.title,
        FormField::Description => &mut content.description,
    }
}
