use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};

use common::prelude::ResolveError;

pub mod download;
pub mod events;
pub mod files;
pub mod login;
pub mod logout;
pub mod remove;
pub mod share;
pub mod text;
pub mod upload;

use crate::daemon::http_server::auth;
use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    let protected = Router::new()
        .route("/files", get(files::handler))
        .route("/files/upload", post(upload::handler))
        .route("/files/share", post(share::handler))
        .route("/files/remove", post(remove::handler))
        .route("/text", post(text::handler))
        .route("/events", get(events::handler))
        .route("/logout", post(logout::handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    // download checks its own token parameter
    Router::new()
        .route("/login", post(login::handler))
        .route("/download", get(download::handler))
        .merge(protected)
        .with_state(state)
}

/// Run synchronous registry or filesystem work off the async workers.
pub(crate) async fn run_blocking<T, E, F>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<tokio::task::JoinError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// `{code, message}` error body shared by every v0 route.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let msg = serde_json::json!({"code": status.as_u16(), "message": message.into()});
    (status, Json(msg)).into_response()
}

pub(crate) fn resolve_status(err: &ResolveError) -> StatusCode {
    match err {
        ResolveError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        ResolveError::EntryNotFound(_) => StatusCode::NOT_FOUND,
        ResolveError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
