use std::path::PathBuf;

use clap::Args;
use tokio::io::AsyncWriteExt;

use fshare::http_server::api::client::{ApiClient, ApiError};
use fshare::http_server::api::v0::download::DOWNLOAD_FILENAME;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// What to download, e.g. `photos/2024/beach.jpg`; directories arrive as zips
    pub path: String,

    /// Where to write it (default: the served file name in the current directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Get {
    type Error = GetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let url = ctx.client.base_url().join("/api/v0/download").map_err(ApiError::from)?;
        let mut query = vec![("filename", self.path.clone())];
        if let Some(token) = &ctx.token {
            query.push(("token", token.clone()));
        }

        let response = ctx
            .client
            .http_client()
            .get(url)
            .query(&query)
            .send()
            .await?;
        let mut response = ApiClient::check(response).await?;

        let output = match &self.output {
            Some(path) => path.clone(),
            None => PathBuf::from(served_name(&response, &self.path)),
        };

        let mut file = tokio::fs::File::create(&output).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(format!("Saved {} bytes to {}", written, output.display()))
    }
}

/// Name the server suggested, or the last segment of the requested path.
fn served_name(response: &reqwest::Response, requested: &str) -> String {
    let suggested = response
        .headers()
        .get(DOWNLOAD_FILENAME.as_str())
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            url::form_urlencoded::parse(format!("n={}", v).as_bytes())
                .map(|(_, value)| value.into_owned())
                .next()
        });
    let fallback = requested.rsplit('/').find(|s| !s.is_empty());

    let name = suggested
        .as_deref()
        .or(fallback)
        .unwrap_or_default()
        .replace(['/', '\\'], "_");
    match name.as_str() {
        "" | "." | ".." => "download".to_string(),
        _ => name,
    }
}
