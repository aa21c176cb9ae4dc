use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{
    list_path, list_top, resolve, ListItem, ListingError, RegistryStore, ResolveError,
};

use super::{error_response, resolve_status, run_blocking};
use crate::daemon::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct FilesRequest {
    /// Path to list, e.g. `photos/2024`; empty lists every share
    #[serde(default)]
    #[arg(long, default_value = "")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesResponse {
    /// Segments of the listed path, empty at the top level
    pub path: Vec<String>,
    pub files: Vec<ListItem>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Query(req): Query<FilesRequest>,
) -> Result<impl IntoResponse, FilesError> {
    let registry = state.registry().clone();
    let response = run_blocking(move || list(&registry, &req.path)).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

fn list(registry: &RegistryStore, raw: &str) -> Result<FilesResponse, FilesError> {
    let resolved = resolve(registry, raw)?;
    if resolved.is_root() {
        return Ok(FilesResponse {
            path: Vec::new(),
            files: list_top(registry)?,
        });
    }

    if resolved.entry.as_ref().is_some_and(|e| e.is_text()) {
        return Err(FilesError::NotBrowsable(resolved.root_name));
    }

    let target = resolved.target_path()?;
    let files = list_path(&target)?;
    Ok(FilesResponse {
        path: resolved.segments,
        files,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Listing(#[from] ListingError),
    #[error("{0:?} is a text entry and cannot be browsed")]
    NotBrowsable(String),
    #[error("listing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for FilesError {
    fn into_response(self) -> Response {
        let status = match &self {
            FilesError::Resolve(e) => resolve_status(e),
            FilesError::Listing(ListingError::NotFound(_)) => StatusCode::NOT_FOUND,
            FilesError::Listing(ListingError::NotADirectory(_)) | FilesError::NotBrowsable(_) => {
                StatusCode::BAD_REQUEST
            }
            FilesError::Listing(_) | FilesError::Join(_) => {
                tracing::error!("failed to list files: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, self.to_string())
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for FilesRequest {
    type Response = FilesResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/files")?;
        Ok(client.get(full_url).query(&self))
    }
}
