//! In-memory mirror of the server's task collection.
//!
//! The mirror is replaced wholesale on every successful list and reconciled
//! per-mutation otherwise. Toggling completion is optimistic: the mirror is
//! mutated before the patch resolves and rolled back to a value-copied
//! snapshot if it fails. Create and delete are not optimistic — the mirror
//! only changes on success, so a failure leaves nothing to undo.

use tokio::sync::mpsc;
use tracing::debug;

use super::{ApiError, TasksApi};
use crate::tasks::{Task, TaskPatch};

// ─── Notifications ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warn,
    Error,
}

/// One user-facing notification. The presentation layer decides how (or
/// whether) to render these.
#[derive(Debug, Clone)]
pub struct Notification {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

/// Fire-and-forget notification channel. Never blocks; if the receiver is
/// gone the notification is dropped.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, severity: Severity, summary: &str, detail: impl Into<String>) {
        let _ = self.tx.send(Notification {
            severity,
            summary: summary.to_string(),
            detail: detail.into(),
        });
    }

    fn success(&self, summary: &str, detail: impl Into<String>) {
        self.notify(Severity::Success, summary, detail);
    }

    fn error(&self, summary: &str, err: &ApiError) {
        self.notify(Severity::Error, summary, err.to_string());
    }
}

// ─── SyncClient ──────────────────────────────────────────────────────────────

/// State container owning the mirror and its derived filtered view.
///
/// All mutation goes through the methods below; operations are serialized per
/// instance by `&mut self`, so a delete can never interleave with an in-flight
/// toggle on the same client.
pub struct SyncClient<A: TasksApi> {
    api: A,
    notifier: Notifier,
    tasks: Vec<Task>,
    filtered: Vec<Task>,
    query: String,
    busy: bool,
    loading: bool,
}

impl<A: TasksApi> SyncClient<A> {
    pub fn new(api: A, notifier: Notifier) -> Self {
        Self {
            api,
            notifier,
            tasks: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            busy: false,
            loading: false,
        }
    }

    /// The authoritative-as-known mirror.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The mirror narrowed by the current filter, order preserved.
    pub fn filtered_tasks(&self) -> &[Task] {
        &self.filtered
    }

    /// Current filter term, lowercased.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Replace the mirror wholesale from the server. On failure the mirror
    /// keeps its last-known state.
    pub async fn reload(&mut self) {
        self.loading = true;
        match self.api.list().await {
            Ok(tasks) => {
                debug!(count = tasks.len(), "mirror reloaded");
                self.tasks = tasks;
                self.apply_filter();
            }
            Err(e) => self.notifier.error("Load failed", &e),
        }
        self.loading = false;
    }

    /// Local-only: case-insensitive substring match on title OR id. A blank
    /// query shows everything.
    pub fn set_filter(&mut self, query: &str) {
        self.query = query.to_lowercase();
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        if self.query.trim().is_empty() {
            self.filtered = self.tasks.clone();
            return;
        }
        self.filtered = self
            .tasks
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&self.query)
                    || t.id.to_lowercase().contains(&self.query)
            })
            .cloned()
            .collect();
    }

    /// Not optimistic: the new task (with its server-assigned id) is prepended
    /// only once the server confirms it.
    pub async fn create(&mut self, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        match self.api.create(title).await {
            Ok(task) => {
                let detail = format!("Task \"{}\" added", task.title);
                self.tasks.insert(0, task);
                self.apply_filter();
                self.notifier.success("Created", detail);
            }
            Err(e) => self.notifier.error("Create failed", &e),
        }
    }

    /// Optimistic: the mirror flips before the patch resolves. On failure the
    /// snapshot captured here — a value copy, so later mirror mutations cannot
    /// corrupt it — is restored wholesale.
    pub async fn toggle_completed(&mut self, id: &str, new_value: bool) {
        let snapshot = self.tasks.clone();
        for task in &mut self.tasks {
            if task.id == id {
                task.completed = new_value;
            }
        }
        self.apply_filter();

        match self.api.patch(id, &TaskPatch::completed(new_value)).await {
            Ok(_) => {
                let summary = if new_value { "Done" } else { "Reopened" };
                self.notifier.success(summary, "Task status updated");
            }
            Err(e) => {
                self.tasks = snapshot;
                self.apply_filter();
                self.notifier.error("Update failed", &e);
            }
        }
    }

    /// Guarded by `busy`: a second invocation while one delete is in flight is
    /// a no-op. Not optimistic — the task leaves the mirror only on success.
    pub async fn delete(&mut self, id: &str) {
        if self.busy {
            return;
        }
        self.busy = true;
        match self.api.delete(id).await {
            Ok(removed) => {
                self.tasks.retain(|t| t.id != id);
                self.apply_filter();
                self.notifier
                    .success("Deleted", format!("Task \"{}\" deleted", removed.title));
            }
            Err(e) => self.notifier.error("Delete failed", &e),
        }
        self.busy = false;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
