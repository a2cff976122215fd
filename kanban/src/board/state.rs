//! The authoritative in-memory task collection the UI renders from.
//!
//! All mutations are total: a missing id is a no-op, never an error. Each
//! mutation that actually changes the collection bumps a revision counter
//! published on a [`watch`] channel, so the render loop can redraw on
//! change instead of polling the tasks.

use kanban_proto::{Status, Task, TaskId};
use tokio::sync::watch;

use super::StatusChange;

/// Collection of tasks plus a change notification channel.
#[derive(Debug)]
pub struct BoardState {
    tasks: Vec<Task>,
    revision: watch::Sender<u64>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            revision: watch::Sender::new(0),
        }
    }

    /// Creates a board holding `tasks`.
    #[must_use]
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut board = Self::new();
        board.replace_all(tasks);
        board
    }

    /// All tasks, in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Whether a task with this id is on the board.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.get(id).is_some()
    }

    /// Tasks in one column, in insertion order.
    pub fn tasks_in(&self, status: Status) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.status == status)
    }

    /// Number of tasks on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the board has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Replaces the task with the same id, or appends it.
    pub fn upsert(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) if *existing == task => return,
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
        self.bump();
    }

    /// Removes a task, returning it if it was present.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| &t.id == id)?;
        let removed = self.tasks.remove(pos);
        self.bump();
        Some(removed)
    }

    /// Sets one task's status, leaving every other field alone.
    ///
    /// Returns `true` if the status actually changed.
    pub fn patch_status(&mut self, id: &TaskId, status: Status) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) else {
            return false;
        };
        if task.status == status {
            return false;
        }
        task.status = status;
        self.bump();
        true
    }

    /// Replaces the whole collection (initial load or reload).
    ///
    /// Later duplicates of an id win.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks.clear();
        for task in tasks {
            match self.tasks.iter_mut().find(|t| t.id == task.id) {
                Some(existing) => *existing = task,
                None => self.tasks.push(task),
            }
        }
        self.bump();
    }

    /// Applies the outcome of an optimistic move.
    ///
    /// Both applied and rolled-back changes only patch the status.
    pub fn apply_status_change(&mut self, id: &TaskId, change: StatusChange) {
        match change {
            StatusChange::Applied(status) | StatusChange::RolledBackTo(status) => {
                self.patch_status(id, status);
            }
            StatusChange::Discarded => {}
        }
    }

    /// Current revision; increases on every effective mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Subscribes to revision changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
