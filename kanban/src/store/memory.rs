//! In-process task store.
//!
//! Used by tests (with failure injection and artificial latency) and by the
//! client's offline demo mode.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use kanban_proto::{Status, Task, TaskDraft, TaskId};
use parking_lot::Mutex;

use super::{StoreError, TaskStore};

/// The kind of store call, for call logs and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// `list_tasks`
    List,
    /// `create_task`
    Create,
    /// `update_task`
    Update,
    /// `delete_task`
    Delete,
}

/// A recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    /// Which operation was called.
    pub op: StoreOp,
    /// Target task id, for update and delete.
    pub task_id: Option<TaskId>,
}

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    calls: Vec<StoreCall>,
    injected: VecDeque<(StoreOp, StoreError)>,
    unreachable: bool,
}

/// [`TaskStore`] that keeps tasks in memory.
#[derive(Default)]
pub struct InMemoryTaskStore {
    inner: Mutex<Inner>,
    latency: Mutex<HashMap<StoreOp, Duration>>,
}

impl InMemoryTaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `tasks`.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let store = Self::default();
        store.inner.lock().tasks = tasks;
        store
    }

    /// Creates a store seeded with a few sample tasks for the demo board.
    #[must_use]
    pub fn demo() -> Self {
        let seed = [
            ("Buy milk", "2 litres, semi-skimmed", Status::Todo),
            ("Plan sprint", "", Status::Todo),
            ("Write release notes", "Cover the new drag and drop", Status::InProgress),
            ("Fix login redirect", "", Status::Done),
        ];
        Self::with_tasks(
            seed.into_iter()
                .map(|(title, description, status)| {
                    TaskDraft::new(title, description, status).into_task(TaskId::generate())
                })
                .collect(),
        )
    }

    /// Makes the next call of kind `op` fail with `error`.
    ///
    /// Injected failures are consumed in order, one per matching call.
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.inner.lock().injected.push_back((op, error));
    }

    /// While set, every call fails with [`StoreError::Transport`].
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unreachable = unreachable;
    }

    /// Delays every call of kind `op` by `latency` before it takes effect.
    pub fn set_latency(&self, op: StoreOp, latency: Option<Duration>) {
        let mut table = self.latency.lock();
        match latency {
            Some(latency) => table.insert(op, latency),
            None => table.remove(&op),
        };
    }

    /// Snapshot of the stored tasks.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.lock().tasks.clone()
    }

    /// Every call made so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    async fn enter(&self, op: StoreOp, task_id: Option<&TaskId>) -> Result<(), StoreError> {
        let latency = self.latency.lock().get(&op).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall {
            op,
            task_id: task_id.cloned(),
        });
        if inner.unreachable {
            return Err(StoreError::Transport("store is unreachable".to_string()));
        }
        if let Some(pos) = inner.injected.iter().position(|(o, _)| *o == op)
            && let Some((_, error)) = inner.injected.remove(pos)
        {
            return Err(error);
        }
        Ok(())
    }
}

impl TaskStore for InMemoryTaskStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.enter(StoreOp::List, None).await?;
        Ok(self.tasks())
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, StoreError> {
        self.enter(StoreOp::Create, None).await?;
        draft.validate().map_err(|e| StoreError::Rejected {
            status: 400,
            reason: e.to_string(),
        })?;
        let task = draft.clone().into_task(TaskId::generate());
        self.inner.lock().tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &TaskId, record: &Task) -> Result<Task, StoreError> {
        self.enter(StoreOp::Update, Some(id)).await?;
        record.validate().map_err(|e| StoreError::Rejected {
            status: 400,
            reason: e.to_string(),
        })?;
        let mut inner = self.inner.lock();
        let slot = inner
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        *slot = Task {
            id: id.clone(),
            ..record.clone()
        };
        Ok(slot.clone())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), StoreError> {
        self.enter(StoreOp::Delete, Some(id)).await?;
        let mut inner = self.inner.lock();
        let before = inner.tasks.len();
        inner.tasks.retain(|t| &t.id != id);
        if inner.tasks.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}
