//! File-backed task store — durable CRUD over `{data_dir}/tasks.json`.
//!
//! Every mutation is a full read-modify-write under a single mutex: load the
//! whole collection, apply one change, write the whole collection back as an
//! atomic replace (tmp file → rename). Readers never observe a partial
//! document. An unreadable or corrupt file is treated as an empty collection
//! and repaired with one write of `[]`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::tasks::{Task, TaskPatch};

pub const TASKS_FILE: &str = "tasks.json";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    /// Bad input shape/content — maps to HTTP 400.
    #[error("{0}")]
    Validation(String),
    /// Referenced id absent — maps to HTTP 404.
    #[error("Task not found")]
    NotFound,
    #[error("task store I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("task store serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ─── TaskStore ───────────────────────────────────────────────────────────────

pub struct TaskStore {
    path: PathBuf,
    /// Serializes every read-modify-write so concurrent callers cannot lose
    /// updates against the single durable file.
    lock: Mutex<()>,
}

impl TaskStore {
    /// Store backed by `{data_dir}/tasks.json`. The file is created lazily on
    /// first read or write.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(TASKS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full ordered collection. Never fails for a missing or corrupt file —
    /// both heal to an empty collection.
    pub async fn list(&self) -> StoreResult<Vec<Task>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// Validates and appends a new task, assigning a fresh uuid. `completed`
    /// defaults to `false` when not given.
    pub async fn create(&self, title: &str, completed: Option<bool>) -> StoreResult<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::Validation(
                "Field \"title\" is required and must be a non-empty string".to_string(),
            ));
        }

        let _guard = self.lock.lock().await;
        let mut tasks = self.load().await?;
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            completed: completed.unwrap_or(false),
        };
        tasks.push(task.clone());
        self.persist(&tasks).await?;
        debug!(id = %task.id, "task created");
        Ok(task)
    }

    /// Applies a partial update. An unknown id fails before any field is
    /// looked at; an invalid present field rejects the whole patch — no
    /// partial apply.
    pub async fn patch(&self, id: &str, patch: &TaskPatch) -> StoreResult<Task> {
        let _guard = self.lock.lock().await;
        let mut tasks = self.load().await?;
        let idx = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;

        let new_title = match patch.title.as_deref() {
            Some(t) => {
                let t = t.trim();
                if t.is_empty() {
                    return Err(StoreError::Validation(
                        "If provided, \"title\" must be a non-empty string".to_string(),
                    ));
                }
                Some(t.to_string())
            }
            None => None,
        };

        if let Some(title) = new_title {
            tasks[idx].title = title;
        }
        if let Some(completed) = patch.completed {
            tasks[idx].completed = completed;
        }
        let updated = tasks[idx].clone();
        self.persist(&tasks).await?;
        debug!(id = %updated.id, "task patched");
        Ok(updated)
    }

    /// Removes a task and returns it, so callers can show what was deleted.
    pub async fn delete(&self, id: &str) -> StoreResult<Task> {
        let _guard = self.lock.lock().await;
        let mut tasks = self.load().await?;
        let idx = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;
        let removed = tasks.remove(idx);
        self.persist(&tasks).await?;
        debug!(id = %removed.id, "task deleted");
        Ok(removed)
    }

    // ─── Durable file ─────────────────────────────────────────────────────────

    /// Reads the durable collection. A missing, empty, or unparseable file is
    /// healed by one repair write of `[]`; a UTF-8 BOM prefix is stripped
    /// before parsing. Callers must hold `self.lock`.
    async fn load(&self) -> StoreResult<Vec<Task>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.persist(&[]).await?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let text = raw.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            self.persist(&[]).await?;
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<Task>>(text) {
            Ok(tasks) => Ok(tasks),
            Err(e) => {
                warn!(path = %self.path.display(), err = %e, "tasks file corrupt — repairing to []");
                self.persist(&[]).await?;
                Ok(Vec::new())
            }
        }
    }

    /// Atomic replace: write to a tmp file, then rename over the real one, so
    /// a crash mid-write never leaves a partial document.
    async fn persist(&self, tasks: &[Task]) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(tasks)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}
