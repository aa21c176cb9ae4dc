use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{Entry, RegistryError};

use super::{error_response, run_blocking};
use crate::daemon::events::{ChangeAction, ServerEvent};
use crate::daemon::http_server::api::client::{ApiError, ApiRequest};
use crate::daemon::http_server::ClientAddr;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct TextRequest {
    /// Text to share
    #[arg(long)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResponse {
    pub entry: Entry,
}

pub async fn handler(
    State(state): State<ServiceState>,
    client: ClientAddr,
    Json(req): Json<TextRequest>,
) -> Result<impl IntoResponse, TextError> {
    if req.message.trim().is_empty() {
        return Err(TextError::Empty);
    }

    let registry = state.registry().clone();
    let owner = client.as_str().to_string();
    let entry = run_blocking(move || {
        registry
            .add_text(&req.message, &owner)
            .map_err(TextError::from)
    })
    .await?;

    state
        .events()
        .publish(ServerEvent::files_changed(&entry.name, ChangeAction::Added));

    Ok((StatusCode::OK, Json(TextResponse { entry })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("message cannot be empty")]
    Empty,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("text task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for TextError {
    fn into_response(self) -> Response {
        let status = match &self {
            TextError::Empty => StatusCode::BAD_REQUEST,
            TextError::Registry(_) | TextError::Join(_) => {
                tracing::error!("adding text failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, self.to_string())
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for TextRequest {
    type Response = TextResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/text")?;
        Ok(client.post(full_url).json(&self))
    }
}
