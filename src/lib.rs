pub mod client;
pub mod config;
pub mod rest;
pub mod store;
pub mod tasks;

use std::sync::Arc;

use config::DaemonConfig;
use store::TaskStore;

/// Shared application state passed to every REST handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    /// Durable task collection ({data_dir}/tasks.json).
    pub store: Arc<TaskStore>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: Arc<DaemonConfig>, store: Arc<TaskStore>) -> Self {
        Self {
            config,
            store,
            started_at: std::time::Instant::now(),
        }
    }
}
