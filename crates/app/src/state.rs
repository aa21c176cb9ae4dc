//! On-disk application state
//!
//! Everything fshare keeps between runs lives in one config directory
//! (`~/.fshare` unless overridden): the TOML config, the JSON document
//! holding the share registry, and the default upload directory.

use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "fshare";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STORAGE_FILE_NAME: &str = "files.json";
pub const UPLOADS_DIR_NAME: &str = "uploads";
/// Token saved by `fshare login` for later commands
pub const SESSION_FILE_NAME: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the HTTP server
    #[serde(default = "default_app_port")]
    pub app_port: u16,
    /// Where uploaded files are written (defaults to `<config dir>/uploads`)
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,
    /// Require a password login before using the API
    #[serde(default)]
    pub auth_enabled: bool,
    #[serde(default = "default_password")]
    pub password: String,
    /// Scopes the registry inside the storage document (defaults to the host name)
    #[serde(default)]
    pub machine_id: Option<String>,
    /// Directory for rolling log files; stdout only if unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_app_port() -> u16 {
    5421
}

fn default_password() -> String {
    "password".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_port: default_app_port(),
            upload_dir: None,
            auth_enabled: false,
            password: default_password(),
            machine_id: None,
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the config directory (~/.fshare)
    pub app_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Path to the registry storage document
    pub storage_path: PathBuf,
    /// Effective upload directory
    pub upload_dir: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the config directory path (custom or default ~/.fshare)
    pub fn app_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }
        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Where `fshare login` keeps its token.
    pub fn session_path(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        Ok(Self::app_dir(custom_path)?.join(SESSION_FILE_NAME))
    }

    /// Initialize a new config directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;
        let config_path = app_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&app_dir)?;

        let config = config.unwrap_or_default();
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        let state = Self::from_parts(app_dir, config);
        fs::create_dir_all(&state.upload_dir)?;
        Ok(state)
    }

    /// Load existing state from the config directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;
        let config_path = app_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;
        Ok(Self::from_parts(app_dir, config))
    }

    fn from_parts(app_dir: PathBuf, config: AppConfig) -> Self {
        let upload_dir = config
            .upload_dir
            .clone()
            .unwrap_or_else(|| app_dir.join(UPLOADS_DIR_NAME));
        Self {
            config_path: app_dir.join(CONFIG_FILE_NAME),
            storage_path: app_dir.join(STORAGE_FILE_NAME),
            upload_dir,
            app_dir,
            config,
        }
    }

    /// Identity used to scope the registry inside the storage document.
    pub fn machine_id(&self) -> String {
        self.config.machine_id.clone().unwrap_or_else(host_name)
    }
}

/// Best-effort host name, `unknown` if none can be found.
pub fn host_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("fshare directory not initialized. Run 'fshare init' first")]
    NotInitialized,

    #[error("fshare directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
