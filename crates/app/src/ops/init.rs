use std::path::PathBuf;

use clap::Args;

use fshare::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Port for the HTTP server
    #[arg(long, default_value_t = 5421)]
    pub port: u16,

    /// Where uploads are stored (default: <config dir>/uploads)
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Require a password login
    #[arg(long)]
    pub auth: bool,

    /// Login password
    #[arg(long, default_value = "password")]
    pub password: String,

    /// Registry scope inside the storage file (default: host name)
    #[arg(long)]
    pub machine_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] fshare::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            app_port: self.port,
            upload_dir: self.upload_dir.clone(),
            auth_enabled: self.auth,
            password: self.password.clone(),
            machine_id: self.machine_id.clone(),
            log_dir: None,
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let output = format!(
            "Initialized fshare directory at: {}\n\
             - Config: {}\n\
             - Registry: {}\n\
             - Uploads: {}\n\
             - Port: {}\n\
             - Auth: {}",
            state.app_dir.display(),
            state.config_path.display(),
            state.storage_path.display(),
            state.upload_dir.display(),
            state.config.app_port,
            if state.config.auth_enabled {
                "enabled"
            } else {
                "disabled"
            },
        );

        Ok(output)
    }
}
