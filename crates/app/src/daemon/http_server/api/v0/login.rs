use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::error_response;
use crate::daemon::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct LoginRequest {
    #[serde(default)]
    #[arg(long, default_value = "")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Whether the server requires a login at all
    pub auth_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, LoginError> {
    let auth = state.auth();
    if !auth.enabled {
        return Ok((
            StatusCode::OK,
            Json(LoginResponse {
                auth_enabled: false,
                token: None,
            }),
        )
            .into_response());
    }

    if req.password != auth.password {
        tracing::warn!("login attempt with a wrong password");
        return Err(LoginError::WrongPassword);
    }

    let token = state.sessions().issue();
    tracing::info!("session issued");
    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            auth_enabled: true,
            token: Some(token),
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("wrong password")]
    WrongPassword,
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        match self {
            LoginError::WrongPassword => error_response(StatusCode::FORBIDDEN, self.to_string()),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for LoginRequest {
    type Response = LoginResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/login")?;
        Ok(client.post(full_url).json(&self))
    }
}
