use std::path::PathBuf;

use clap::Args;

use fshare::daemon::process::ServiceError;
use fshare::daemon::{spawn_service, ServiceConfig};
use fshare::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override the configured port
    #[arg(long)]
    pub port: Option<u16>,

    /// Require a password login, whatever the config says
    #[arg(long)]
    pub auth: bool,

    /// Override the configured log directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log level for stdout and file logs
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] fshare::state::StateError),

    #[error("daemon failed: {0}")]
    Failed(#[from] ServiceError),
}

#[async_trait::async_trait]
impl crate::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;

        let mut config = ServiceConfig::from_app_state(&state);
        if let Some(port) = self.port {
            config.app_port = port;
        }
        if self.auth {
            config.auth_enabled = true;
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = Some(log_dir.clone());
        }
        config.log_level = self.log_level;

        spawn_service(&config).await?;
        Ok("daemon ended".to_string())
    }
}
