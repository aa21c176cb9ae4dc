use clap::Args;

use fshare::http_server::api::client::ApiError;
use fshare::http_server::api::v0::logout::{LogoutRequest, LogoutResponse};
use fshare::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Logout {}

#[derive(Debug, thiserror::Error)]
pub enum LogoutError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("failed to clear session: {0}")]
    Clear(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Logout {
    type Error = LogoutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        // a stale saved token would be rejected, so clear it regardless
        ctx.forget_token()?;
        let response: LogoutResponse = ctx.client.call(LogoutRequest::default()).await?;
        if response.revoked {
            Ok("Logged out".to_string())
        } else {
            Ok("No session to end".to_string())
        }
    }
}
