//! Task repository backing the store server.
//!
//! [`TaskRepository`] keeps every task in a map guarded by a tokio
//! [`RwLock`]. When opened with a data file, each successful mutation
//! rewrites the whole file as a pretty-printed JSON object keyed by task id.
//! A mutation is staged on a copy of the map and only committed once the
//! file write succeeds, so memory and disk never disagree. The file is
//! written next to its final path, synced, then renamed over it, so a crash
//! mid-write leaves the previous contents intact.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use kanban_proto::{Task, TaskDraft, TaskId, ValidationError};
use tokio::sync::RwLock;

/// Errors returned by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No task with the given id exists.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The submitted content failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Reading the data file failed for a reason other than absence.
    #[error("failed to read tasks from {path}: {source}")]
    Load {
        /// Data file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the data file failed; the mutation was not applied.
    #[error("failed to save tasks to {path}: {source}")]
    Persist {
        /// Data file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serializing the task map failed.
    #[error("failed to encode tasks: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Task storage with optional JSON file persistence.
pub struct TaskRepository {
    tasks: RwLock<HashMap<TaskId, Task>>,
    data_file: Option<PathBuf>,
}

impl Default for TaskRepository {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl TaskRepository {
    /// Creates an empty repository that never touches the disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            data_file: None,
        }
    }

    /// Opens a repository persisted at `path`.
    ///
    /// A missing or empty file starts an empty store. A file that is not
    /// valid JSON is logged and also starts an empty store, so a corrupted
    /// file never keeps the server from starting.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Load`] if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let tasks = load_tasks(&path).await?;
        tracing::info!(path = %path.display(), count = tasks.len(), "loaded tasks");
        Ok(Self {
            tasks: RwLock::new(tasks),
            data_file: Some(path),
        })
    }

    /// Returns every task, ordered by id.
    pub async fn list(&self) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut list: Vec<Task> = tasks.values().cloned().collect();
        drop(tasks);
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// Returns the task with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no such task exists.
    pub async fn get(&self, id: &TaskId) -> Result<Task, RepositoryError> {
        let tasks = self.tasks.read().await;
        tasks
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }

    /// Creates a task from a draft, assigning a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Validation`] for invalid content, or a
    /// persistence error if the data file cannot be written.
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, RepositoryError> {
        draft.validate()?;
        let task = draft.into_task(TaskId::generate());

        let mut tasks = self.tasks.write().await;
        let mut staged = tasks.clone();
        staged.insert(task.id.clone(), task.clone());
        self.persist(&staged).await?;
        *tasks = staged;
        drop(tasks);

        tracing::info!(task_id = %task.id, status = %task.status, "task created");
        Ok(task)
    }

    /// Replaces the task stored under `id` with `task`.
    ///
    /// The stored record always carries `id`, whatever `task.id` says.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Validation`], [`RepositoryError::NotFound`],
    /// or a persistence error.
    pub async fn update(&self, id: &TaskId, mut task: Task) -> Result<Task, RepositoryError> {
        task.validate()?;
        task.id = id.clone();

        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(id) {
            return Err(RepositoryError::NotFound(id.clone()));
        }
        let mut staged = tasks.clone();
        staged.insert(id.clone(), task.clone());
        self.persist(&staged).await?;
        *tasks = staged;
        drop(tasks);

        tracing::info!(task_id = %id, status = %task.status, "task updated");
        Ok(task)
    }

    /// Deletes the task stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] or a persistence error.
    pub async fn delete(&self, id: &TaskId) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(id) {
            return Err(RepositoryError::NotFound(id.clone()));
        }
        let mut staged = tasks.clone();
        staged.remove(id);
        self.persist(&staged).await?;
        *tasks = staged;
        drop(tasks);

        tracing::info!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Number of stored tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether the store holds no tasks.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    async fn persist(&self, tasks: &HashMap<TaskId, Task>) -> Result<(), RepositoryError> {
        let Some(path) = &self.data_file else {
            return Ok(());
        };
        let ordered: BTreeMap<&TaskId, &Task> = tasks.iter().collect();
        let bytes = serde_json::to_vec_pretty(&ordered)?;
        write_atomically(path, &bytes).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to save tasks");
            RepositoryError::Persist {
                path: path.clone(),
                source: e,
            }
        })
    }
}

/// Sibling path the data file is staged at before the rename.
fn staging_path(path: &Path) -> PathBuf {
    let mut staged = OsString::from(path.as_os_str());
    staged.push(".tmp");
    PathBuf::from(staged)
}

/// Writes `bytes` to a sibling file, syncs it and renames it over `path`.
async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let staged = staging_path(path);
    let result = async {
        tokio::fs::write(&staged, bytes).await?;
        tokio::fs::OpenOptions::new()
            .write(true)
            .open(&staged)
            .await?
            .sync_all()
            .await?;
        tokio::fs::rename(&staged, path).await
    }
    .await;
    if result.is_err() && tokio::fs::remove_file(&staged).await.is_ok() {
        tracing::debug!(path = %staged.display(), "removed staged data file");
    }
    result
}

/// Reads the data file into a task map, tolerating absent or corrupt files.
async fn load_tasks(path: &Path) -> Result<HashMap<TaskId, Task>, RepositoryError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "data file not found, starting empty");
            return Ok(HashMap::new());
        }
        Err(e) => {
            return Err(RepositoryError::Load {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        tracing::info!(path = %path.display(), "data file is empty, starting empty");
        return Ok(HashMap::new());
    }

    match serde_json::from_slice::<HashMap<TaskId, Task>>(&bytes) {
        Ok(stored) => Ok(stored
            .into_iter()
            .map(|(id, mut task)| {
                task.id = id.clone();
                (id, task)
            })
            .collect()),
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "data file is corrupted, starting empty"
            );
            Ok(HashMap::new())
        }
    }
}
