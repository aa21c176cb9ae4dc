use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::RegistryError;

use super::{error_response, run_blocking};
use crate::daemon::events::{ChangeAction, ServerEvent};
use crate::daemon::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RemoveRequest {
    /// Name of the entry to stop sharing
    #[arg(long)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub name: String,
    /// False if nothing was registered under `name`
    pub removed: bool,
}

/// Stop sharing an entry. The file or directory on disk is left alone.
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<RemoveRequest>,
) -> Result<impl IntoResponse, RemoveError> {
    let registry = state.registry().clone();
    let name = req.name.clone();
    let removed = run_blocking(move || registry.remove(&name).map_err(RemoveError::from)).await?;

    if removed.is_some() {
        state
            .events()
            .publish(ServerEvent::files_changed(&req.name, ChangeAction::Removed));
    }

    Ok((
        StatusCode::OK,
        Json(RemoveResponse {
            name: req.name,
            removed: removed.is_some(),
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum RemoveError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("remove task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for RemoveError {
    fn into_response(self) -> Response {
        tracing::error!("remove failed: {}", self);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for RemoveRequest {
    type Response = RemoveResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/files/remove")?;
        Ok(client.post(full_url).json(&self))
    }
}
