//! Daemon configuration.
//!
//! Precedence: CLI flag / env var > `{data_dir}/config.toml` > built-in
//! default. The config file is optional and only read at startup.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Optional overrides from `{data_dir}/config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    port: Option<u16>,
    bind_address: Option<String>,
    log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// REST API port.
    pub port: u16,
    /// Bind address (default 127.0.0.1; use 0.0.0.0 for LAN access).
    pub bind_address: String,
    /// Directory holding tasks.json and the optional config.toml.
    pub data_dir: PathBuf,
    /// Log level / EnvFilter directive.
    pub log_level: String,
}

impl DaemonConfig {
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log_level: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let file = read_config_file(&data_dir);

        Self {
            port: port.or(file.port).unwrap_or(DEFAULT_PORT),
            bind_address: bind_address
                .or(file.bind_address)
                .unwrap_or_else(default_bind_address),
            log_level: log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            data_dir,
        }
    }

    /// Base URL of the REST API served by this configuration.
    pub fn api_base_url(&self) -> String {
        format!("http://127.0.0.1:{}/api", self.port)
    }
}

fn read_config_file(data_dir: &Path) -> FileConfig {
    let path = data_dir.join("config.toml");
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => return FileConfig::default(),
    };
    match toml::from_str(&raw) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), err = %e, "ignoring unparseable config.toml");
            FileConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_given() {
        let cfg = DaemonConfig::new(None, Some(PathBuf::from("/nonexistent")), None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.bind_address, "127.0.0.1");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn cli_args_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "port = 4100\nlog_level = \"debug\"\n")
            .unwrap();

        let cfg = DaemonConfig::new(
            Some(5000),
            Some(dir.path().to_path_buf()),
            None,
            None,
        );
        assert_eq!(cfg.port, 5000, "CLI wins over file");
        assert_eq!(cfg.log_level, "debug", "file wins over default");
    }
}
