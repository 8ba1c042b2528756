use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use client_logging::{client_error, client_info, client_warn};
use codex_engine::{ensure_state_dir, AtomicFileWriter};
use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "codex_client.ron";
const SESSION_FILENAME: &str = ".codex_session.ron";

/// On-disk client configuration, read from `./codex_client.ron` when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AppConfig {
    pub base_url: String,
    pub state_dir: PathBuf,
    pub poll_interval_secs: u64,
    pub items_per_page: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            state_dir: PathBuf::from("./state"),
            poll_interval_secs: 5,
            items_per_page: 21,
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    token: String,
}

pub(crate) fn load_config() -> AppConfig {
    let path = PathBuf::from(CONFIG_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return AppConfig::default();
        }
        Err(err) => {
            client_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            client_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}

/// Restores the bearer token from the previous run, if any.
pub(crate) fn load_session(state_dir: &Path) -> Option<String> {
    let path = state_dir.join(SESSION_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            client_warn!("Failed to read session from {:?}: {}", path, err);
            return None;
        }
    };

    let session: PersistedSession = match ron::from_str(&content) {
        Ok(session) => session,
        Err(err) => {
            client_warn!("Failed to parse session from {:?}: {}", path, err);
            return None;
        }
    };

    client_info!("Restored session from {:?}", path);
    Some(session.token)
}

pub(crate) fn save_session(state_dir: &Path, token: &str) {
    if let Err(err) = ensure_state_dir(state_dir) {
        client_error!("Failed to ensure state dir {:?}: {}", state_dir, err);
        return;
    }

    let session = PersistedSession {
        token: token.to_string(),
    };
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&session, pretty) {
        Ok(text) => text,
        Err(err) => {
            client_error!("Failed to serialize session: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    if let Err(err) = writer.write(SESSION_FILENAME, &content) {
        client_error!("Failed to write session to {:?}: {}", state_dir, err);
    }
}

pub(crate) fn clear_session(state_dir: &Path) {
    let path = state_dir.join(SESSION_FILENAME);
    match fs::remove_file(&path) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => client_warn!("Failed to remove session at {:?}: {}", path, err),
    }
}
