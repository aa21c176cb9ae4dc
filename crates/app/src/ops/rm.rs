use clap::Args;

use fshare::http_server::api::client::ApiError;
use fshare::http_server::api::v0::remove::{RemoveRequest, RemoveResponse};

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Name of the entry to stop sharing
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for Rm {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response: RemoveResponse = ctx
            .client
            .call(RemoveRequest {
                name: self.name.clone(),
            })
            .await?;

        if response.removed {
            Ok(format!("Stopped sharing {:?}", response.name))
        } else {
            Ok(format!("Nothing shared as {:?}", response.name))
        }
    }
}
