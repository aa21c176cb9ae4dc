use clap::Args;

use fshare::http_server::api::client::ApiError;
use fshare::http_server::api::v0::text::{TextRequest, TextResponse};

#[derive(Args, Debug, Clone)]
pub struct Text {
    /// Text to share
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for Text {
    type Error = TextError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response: TextResponse = ctx
            .client
            .call(TextRequest {
                message: self.message.clone(),
            })
            .await?;

        Ok(format!("Shared text as {:?}", response.entry.name))
    }
}
