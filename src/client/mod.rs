//! Client side of the tracker: the HTTP API wrapper and the sync mirror.
//!
//! `TasksApi` is the seam between the mirror and the wire — the sync logic in
//! [`sync`] only sees the trait, so tests can inject failing implementations.

pub mod sync;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::tasks::{Task, TaskPatch};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the request with a structured `{message}` payload.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// Network/connection failure — the request may never have reached the
    /// server.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

// ─── TasksApi ────────────────────────────────────────────────────────────────

/// The four wire operations the sync client consumes.
#[async_trait]
pub trait TasksApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, ApiError>;
    async fn create(&self, title: &str) -> Result<Task, ApiError>;
    async fn patch(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError>;
    async fn delete(&self, id: &str) -> Result<Task, ApiError>;
}

// ─── HTTP implementation ─────────────────────────────────────────────────────

/// reqwest-backed [`TasksApi`] targeting `{base_url}/tasks`.
pub struct HttpTasksApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTasksApi {
    /// `base_url` is the API root, e.g. `http://127.0.0.1:3000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    /// Decode a success body, or turn a failure status into `ApiError::Api`
    /// using the server's `{message}` payload when it has one.
    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        let message = resp
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TasksApi for HttpTasksApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let resp = self.http.get(self.tasks_url()).send().await?;
        Self::decode(resp).await
    }

    async fn create(&self, title: &str) -> Result<Task, ApiError> {
        let body = serde_json::json!({ "title": title, "completed": false });
        let resp = self.http.post(self.tasks_url()).json(&body).send().await?;
        Self::decode(resp).await
    }

    async fn patch(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        let url = format!("{}/{}", self.tasks_url(), id);
        let resp = self.http.patch(url).json(patch).send().await?;
        Self::decode(resp).await
    }

    async fn delete(&self, id: &str) -> Result<Task, ApiError> {
        let url = format!("{}/{}", self.tasks_url(), id);
        let resp = self.http.delete(url).send().await?;
        Self::decode(resp).await
    }
}
