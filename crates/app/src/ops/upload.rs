use std::path::PathBuf;

use clap::Args;
use reqwest::multipart;

use fshare::http_server::api::client::{ApiClient, ApiError};
use fshare::http_server::api::v0::upload::{UploadResponse, FILE_FIELD};

#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Local file to send to the daemon
    pub file: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("{0} is not a file")]
    NotAFile(PathBuf),
}

#[async_trait::async_trait]
impl crate::op::Op for Upload {
    type Error = UploadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let file_name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::NotAFile(self.file.clone()))?;
        let data = tokio::fs::read(&self.file).await?;

        let form = multipart::Form::new().part(
            FILE_FIELD,
            multipart::Part::bytes(data).file_name(file_name),
        );

        let url = ctx.client.base_url().join("/api/v0/files/upload").map_err(ApiError::from)?;
        let response = ctx
            .client
            .http_client()
            .post(url)
            .multipart(form)
            .send()
            .await?;
        let response: UploadResponse = ApiClient::check(response).await?.json().await?;

        Ok(format!("Uploaded and shared as {:?}", response.entry.name))
    }
}
