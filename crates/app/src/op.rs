use std::error::Error;
use std::fs;
use std::path::PathBuf;

use url::Url;

use fshare::http_server::api::client::{ApiClient, ApiError};
use fshare::state::{AppConfig, AppState, StateError};

/// Pick the daemon to talk to.
///
/// Priority: explicit `--remote` > `app_port` from the config file >
/// the default port on localhost.
pub fn resolve_remote(explicit: Option<Url>, config_path: Option<PathBuf>) -> Result<Url, ApiError> {
    if let Some(url) = explicit {
        return Ok(url);
    }
    let port = AppState::load(config_path)
        .map(|state| state.config.app_port)
        .unwrap_or_else(|_| AppConfig::default().app_port);
    Ok(Url::parse(&format!("http://localhost:{}", port))?)
}

/// Token left behind by `fshare login`, if any.
pub fn saved_token(config_path: Option<PathBuf>) -> Option<String> {
    let path = AppState::session_path(config_path).ok()?;
    let token = fs::read_to_string(path).ok()?;
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[derive(Clone)]
pub struct OpContext {
    /// API client, sends `token` as a bearer header
    pub client: ApiClient,
    /// Session token: `--token`, else the one saved by `fshare login`
    pub token: Option<String>,
    /// Optional custom config path (defaults to ~/.fshare)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(
        remote: Option<Url>,
        token: Option<String>,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        let remote = resolve_remote(remote, config_path.clone())?;
        let token = token.or_else(|| saved_token(config_path.clone()));
        Ok(Self {
            client: ApiClient::new(&remote, token.as_deref())?,
            token,
            config_path,
        })
    }

    /// Persist `token` for later commands. Returns where it went.
    pub fn save_token(&self, token: &str) -> Result<PathBuf, StateError> {
        let path = AppState::session_path(self.config_path.clone())?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, token)?;
        Ok(path)
    }

    /// Drop the saved token, if there is one.
    pub fn forget_token(&self) -> Result<(), StateError> {
        let path = AppState::session_path(self.config_path.clone())?;
        match fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

/// Builds the `Command` subcommand enum plus its `OpOutput`/`OpError`
/// wrappers, dispatching each variant to its `Op` impl.
#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => op
                            .execute(ctx)
                            .await
                            .map(OpOutput::$variant)
                            .map_err(OpError::$variant),
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(OpOutput::$variant(output) => write!(f, "{}", output),)*
                }
            }
        }
    };
}
