//! Session check for the protected API routes
//!
//! Only mounted in front of routes that need a login. Browsers can't set
//! headers on an `EventSource`, so a `token` query parameter is accepted
//! as well as the `Authorization` header.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::ServiceState;

pub async fn require_session(
    State(state): State<ServiceState>,
    request: Request,
    next: Next,
) -> Response {
    let token = request_token(request.headers(), request.uri());
    if state.is_authorized(token.as_deref()) {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "rejected request without a valid session");
    let msg = serde_json::json!({"code": 401, "message": "login required"});
    (StatusCode::UNAUTHORIZED, Json(msg)).into_response()
}

/// The session token a request carries, header first.
pub(crate) fn request_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    header_token(headers).or_else(|| query_token(uri))
}

/// `Authorization: Bearer <token>`, or the bare token.
fn header_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn query_token(uri: &Uri) -> Option<String> {
    url::form_urlencoded::parse(uri.query()?.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}
