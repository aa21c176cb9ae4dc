use std::env;
use std::path::PathBuf;

use clap::Args;

use fshare::http_server::api::client::ApiError;
use fshare::http_server::api::v0::share::{ShareRequest, ShareResponse};

#[derive(Args, Debug, Clone)]
pub struct Share {
    /// File or directory to share (must be on the daemon's machine)
    pub path: PathBuf,

    /// Name to share it under (defaults to the base name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Share {
    type Error = ShareError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        // the daemon resolves relative paths against its own working directory
        let path = if self.path.is_absolute() {
            self.path.clone()
        } else {
            env::current_dir()?.join(&self.path)
        };

        let response: ShareResponse = ctx
            .client
            .call(ShareRequest {
                path,
                name: self.name.clone(),
            })
            .await?;

        Ok(format!(
            "Shared {} as {:?}",
            response.entry.kind, response.entry.name
        ))
    }
}
