use std::path::PathBuf;

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
pub struct ShareRequest {
    /// File or directory on the daemon's machine
    #[arg(long)]
    pub path: PathBuf,

    /// Name to share it under (defaults to the base name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub entry: Entry,
}

/// Share a path that already exists on this machine.
///
/// Only callers on the same machine may do this; everyone else can only
/// upload.
pub async fn handler(
    State(state): State<ServiceState>,
    client: ClientAddr,
    Json(req): Json<ShareRequest>,
) -> Result<impl IntoResponse, ShareError> {
    if !client.is_local_peer() {
        return Err(ShareError::NotLocal(client.as_str().to_string()));
    }

    let registry = state.registry().clone();
    let owner = client.as_str().to_string();
    let entry = run_blocking(move || {
        registry
            .add_path(&req.path, req.name.as_deref(), &owner)
            .map_err(ShareError::from)
    })
    .await?;

    state
        .events()
        .publish(ServerEvent::files_changed(&entry.name, ChangeAction::Added));

    Ok((StatusCode::OK, Json(ShareResponse { entry })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("sharing local paths is only allowed from this machine (client {0:?})")]
    NotLocal(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("share task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        let status = match &self {
            ShareError::NotLocal(_) => StatusCode::FORBIDDEN,
            ShareError::Registry(RegistryError::StatTargetMissing { .. }) => StatusCode::NOT_FOUND,
            ShareError::Registry(RegistryError::InvalidName(_)) => StatusCode::BAD_REQUEST,
            ShareError::Registry(_) | ShareError::Join(_) => {
                tracing::error!("share failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, self.to_string())
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for ShareRequest {
    type Response = ShareResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/files/share")?;
        Ok(client.post(full_url).json(&self))
    }
}
