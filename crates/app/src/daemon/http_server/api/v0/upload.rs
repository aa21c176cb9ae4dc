use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use common::prelude::{Entry, RegistryError};

use super::{error_response, run_blocking};
use crate::daemon::events::{ChangeAction, ServerEvent};
use crate::daemon::http_server::ClientAddr;
use crate::ServiceState;

pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub entry: Entry,
}

/// Save the multipart `file` field into the upload directory and share it
/// under its file name.
pub async fn handler(
    State(state): State<ServiceState>,
    client: ClientAddr,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::InvalidRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(sanitize_file_name)
            .ok_or(UploadError::MissingFileName)?;
        let data = field
            .bytes()
            .await
            .map_err(|e| UploadError::InvalidRequest(e.to_string()))?;

        let dest = state.upload_dir().join(&file_name);
        tokio::fs::write(&dest, &data)
            .await
            .map_err(|source| UploadError::Write {
                path: dest.clone(),
                source,
            })?;
        tracing::info!(
            name = %file_name,
            bytes = data.len(),
            owner = %client.as_str(),
            "received upload"
        );

        let registry = state.registry().clone();
        let owner = client.as_str().to_string();
        let entry = run_blocking(move || {
            registry
                .add_path(&dest, Some(&file_name), &owner)
                .map_err(UploadError::from)
        })
        .await?;
        state
            .events()
            .publish(ServerEvent::files_changed(&entry.name, ChangeAction::Added));

        return Ok((StatusCode::OK, Json(UploadResponse { entry })).into_response());
    }

    Err(UploadError::MissingFile)
}

/// Last path component only, so a crafted name can't escape the upload
/// directory.
fn sanitize_file_name(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let name = Path::new(&normalized).file_name()?.to_string_lossy();
    match name.as_ref() {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid multipart request: {0}")]
    InvalidRequest(String),
    #[error("missing '{}' field", FILE_FIELD)]
    MissingFile,
    #[error("uploaded file has no usable name")]
    MissingFileName,
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("upload task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = match &self {
            UploadError::InvalidRequest(_)
            | UploadError::MissingFile
            | UploadError::MissingFileName => StatusCode::BAD_REQUEST,
            UploadError::Write { .. } | UploadError::Registry(_) | UploadError::Join(_) => {
                tracing::error!("upload failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("photo.jpg").as_deref(), Some("photo.jpg"));
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_file_name("C:\\Users\\me\\notes.txt").as_deref(),
            Some("notes.txt")
        );
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name(""), None);
    }
}
