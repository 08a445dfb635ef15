//! Task model shared by the store, the REST surface, and the sync client.

use serde::{Deserialize, Serialize};

/// The unit entity being tracked.
///
/// This exact shape (`{id, title, completed}`) is both the wire format and the
/// durable file format — the store persists a JSON array of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned, immutable, never reused after deletion.
    pub id: String,
    /// Trimmed, never empty once stored.
    pub title: String,
    pub completed: bool,
}

/// Partial update addressing one field or both.
///
/// Absent fields are left untouched. An invalid present field rejects the
/// whole patch — nothing is applied partially.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            title: None,
            completed: Some(value),
        }
    }

    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            completed: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}
