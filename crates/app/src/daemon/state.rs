use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::prelude::{JsonStore, RegistryStore};

use super::config::Config;
use super::events::Events;
use super::sessions::{AuthSettings, Sessions};

/// Main service state, cloned into every handler
#[derive(Clone)]
pub struct State {
    registry: RegistryStore,
    upload_dir: Arc<PathBuf>,
    auth: Arc<AuthSettings>,
    sessions: Sessions,
    events: Events,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        std::fs::create_dir_all(&config.upload_dir).map_err(|source| {
            StateSetupError::UploadDir {
                path: config.upload_dir.clone(),
                source,
            }
        })?;

        let storage = Arc::new(JsonStore::open(&config.storage_path));
        let registry = RegistryStore::new(storage, &config.machine_id);
        tracing::info!(
            storage = %config.storage_path.display(),
            key = registry.key(),
            "registry store ready"
        );

        Ok(Self::new(
            registry,
            config.upload_dir.clone(),
            AuthSettings {
                enabled: config.auth_enabled,
                password: config.password.clone(),
            },
        ))
    }

    pub fn new(registry: RegistryStore, upload_dir: PathBuf, auth: AuthSettings) -> Self {
        Self {
            registry,
            upload_dir: Arc::new(upload_dir),
            auth: Arc::new(auth),
            sessions: Sessions::default(),
            events: Events::default(),
        }
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn auth(&self) -> &AuthSettings {
        &self.auth
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub fn events(&self) -> &Events {
        &self.events
    }

    /// Whether a request carrying `token` may use the protected API.
    pub fn is_authorized(&self, token: Option<&str>) -> bool {
        !self.auth.enabled || token.is_some_and(|t| self.sessions.is_valid(t))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("failed to create upload directory {path}: {source}")]
    UploadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
