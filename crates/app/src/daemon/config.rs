use std::path::PathBuf;

use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// Port the HTTP server listens on (all interfaces)
    pub app_port: u16,

    // registry configuration
    /// JSON document holding the share registry
    pub storage_path: PathBuf,
    /// Scopes the registry inside the storage document
    pub machine_id: String,
    /// Where uploaded files are written
    pub upload_dir: PathBuf,

    // auth
    pub auth_enabled: bool,
    pub password: String,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_app_state(state: &AppState) -> Self {
        Self {
            app_port: state.config.app_port,
            storage_path: state.storage_path.clone(),
            machine_id: state.machine_id(),
            upload_dir: state.upload_dir.clone(),
            auth_enabled: state.config.auth_enabled,
            password: state.config.password.clone(),
            log_level: tracing::Level::INFO,
            log_dir: state.config.log_dir.clone(),
        }
    }
}
