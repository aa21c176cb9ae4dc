use axum::extract::{Json, State};
use axum::http::{HeaderMap, Uri};
use axum::response::IntoResponse;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::daemon::http_server::api::client::{ApiError, ApiRequest};
use crate::daemon::http_server::auth::request_token;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogoutRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// False when the request carried no live session
    pub revoked: bool,
}

/// End the session whose token came with the request.
pub async fn handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    uri: Uri,
) -> impl IntoResponse {
    let revoked = request_token(&headers, &uri)
        .map(|token| state.sessions().revoke(&token))
        .unwrap_or(false);
    if revoked {
        tracing::info!("session revoked");
    }
    (StatusCode::OK, Json(LogoutResponse { revoked }))
}

// Client implementation - builds request for this operation
impl ApiRequest for LogoutRequest {
    type Response = LogoutResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/logout")?;
        Ok(client.post(full_url).json(&self))
    }
}
