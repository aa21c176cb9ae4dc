use clap::Args;

use fshare::http_server::api::client::ApiError;
use fshare::http_server::api::v0::login::{LoginRequest, LoginResponse};
use fshare::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Login {
    /// Password configured on the daemon
    #[arg(long, env = "FSHARE_PASSWORD")]
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("failed to save session: {0}")]
    Save(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Login {
    type Error = LoginError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response: LoginResponse = ctx
            .client
            .call(LoginRequest {
                password: self.password.clone(),
            })
            .await?;

        match response.token {
            Some(token) => {
                let path = ctx.save_token(&token)?;
                Ok(format!("Logged in, session saved to {}", path.display()))
            }
            None => Ok("auth is disabled on this daemon, no token needed".to_string()),
        }
    }
}
