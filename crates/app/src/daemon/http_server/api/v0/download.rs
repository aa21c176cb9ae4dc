//! Download a registered entry, or anything beneath a shared directory
//!
//! Files stream straight from disk. Directories are archived to a scoped
//! temporary zip that is deleted once the response body is done with it,
//! whether the client read to the end or went away. Text entries come
//! back as plain text attachments.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::stream;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

use common::prelude::{
    resolve, ArchiveError, RegistryError, RegistryStore, ResolveError, ScopedArchive,
};

use super::{error_response, resolve_status, run_blocking};
use crate::daemon::events::{ChangeAction, Events, ServerEvent};
use crate::ServiceState;

pub const DOWNLOAD_FILENAME: HeaderName = HeaderName::from_static("download-filename");

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadQuery {
    /// Path of what to download, e.g. `photos/2024/beach.jpg`
    #[serde(default)]
    pub filename: String,
    /// Session token, needed when auth is enabled
    #[serde(default)]
    pub token: Option<String>,
}

enum Prepared {
    File { file: File, name: String, len: u64 },
    Archive(ScopedArchive),
    Text { name: String, content: String },
}

pub async fn handler(
    State(state): State<ServiceState>,
    Query(query): Query<DownloadQuery>,
) -> Result<impl IntoResponse, DownloadError> {
    if !state.is_authorized(query.token.as_deref()) {
        return Err(DownloadError::Forbidden);
    }

    let registry = state.registry().clone();
    let events = state.events().clone();
    let filename = query.filename;
    let prepared = run_blocking(move || prepare(&registry, &events, &filename)).await?;

    let response = match prepared {
        Prepared::File { file, name, len } => {
            let mime = mime_guess::from_path(&name).first_or_octet_stream();
            let escaped = escape(&name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime.to_string()),
                    (header::CONTENT_LENGTH, len.to_string()),
                    (header::CONTENT_DISPOSITION, attachment(&escaped)),
                    (DOWNLOAD_FILENAME, escaped),
                ],
                file_body(tokio::fs::File::from_std(file), None),
            )
                .into_response()
        }
        Prepared::Archive(archive) => {
            let file = archive.reopen()?;
            let len = archive.size()?;
            let escaped = escape(archive.download_name());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (header::CONTENT_LENGTH, len.to_string()),
                    (header::CONTENT_DISPOSITION, attachment(&escaped)),
                    (DOWNLOAD_FILENAME, escaped),
                ],
                file_body(tokio::fs::File::from_std(file), Some(archive)),
            )
                .into_response()
        }
        Prepared::Text { name, content } => {
            let escaped = escape(&format!("{}.txt", name));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, attachment(&escaped)),
                    (DOWNLOAD_FILENAME, escaped),
                ],
                content,
            )
                .into_response()
        }
    };

    Ok(response)
}

fn prepare(
    registry: &RegistryStore,
    events: &Events,
    raw: &str,
) -> Result<Prepared, DownloadError> {
    let resolved = resolve(registry, raw)?;
    let Some(entry) = resolved.entry.clone() else {
        return Err(DownloadError::NothingToDownload);
    };

    if entry.is_text() {
        return Ok(Prepared::Text {
            name: entry.name,
            content: entry.content.unwrap_or_default(),
        });
    }

    // the shared target itself is gone: forget about it
    if let Err(e) = fs::metadata(&resolved.resolved_path) {
        if e.kind() == io::ErrorKind::NotFound {
            tracing::warn!(
                name = %resolved.root_name,
                path = %resolved.resolved_path.display(),
                "shared path disappeared, pruning entry"
            );
            if registry.remove(&resolved.root_name)?.is_some() {
                events.publish(ServerEvent::files_changed(
                    &resolved.root_name,
                    ChangeAction::Pruned,
                ));
            }
            return Err(DownloadError::Stale(resolved.root_name));
        }
        return Err(DownloadError::io(&resolved.resolved_path, e));
    }

    let target = resolved.target_path()?;
    let metadata = fs::metadata(&target).map_err(|e| DownloadError::io(&target, e))?;
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or(entry.name);

    if metadata.is_dir() {
        return Ok(Prepared::Archive(ScopedArchive::create(&target, &name)?));
    }

    let file = File::open(&target).map_err(|e| DownloadError::io(&target, e))?;
    Ok(Prepared::File {
        file,
        name,
        len: metadata.len(),
    })
}

/// Stream `file` in chunks. `guard` is dropped with the stream, which
/// deletes a scoped archive once the body is finished or abandoned.
fn file_body(file: tokio::fs::File, guard: Option<ScopedArchive>) -> Body {
    let chunks = stream::unfold(Some((file, guard)), |state| async move {
        let (mut file, guard) = state?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(Bytes::from(buf)), Some((file, guard))))
            }
            Err(e) => Some((Err::<Bytes, io::Error>(e), None)),
        }
    });
    Body::from_stream(chunks)
}

fn escape(name: &str) -> String {
    url::form_urlencoded::byte_serialize(name.as_bytes()).collect()
}

fn attachment(escaped: &str) -> String {
    format!("attachment; filename={}", escaped)
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("a valid session token is required")]
    Forbidden,
    #[error("no file name given")]
    NothingToDownload,
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("shared path for {0:?} no longer exists")]
    Stale(String),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("download task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl DownloadError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        let status = match &self {
            DownloadError::Forbidden => StatusCode::FORBIDDEN,
            DownloadError::NothingToDownload => StatusCode::BAD_REQUEST,
            DownloadError::Resolve(e) => resolve_status(e),
            DownloadError::Stale(_) => StatusCode::NOT_FOUND,
            DownloadError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            DownloadError::Io { .. }
            | DownloadError::Archive(_)
            | DownloadError::Registry(_)
            | DownloadError::Join(_) => {
                tracing::error!("download failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, self.to_string())
    }
}
