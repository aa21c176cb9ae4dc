pub mod utils;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::daemon::events::{ServerEvent, ServerStatus};
use crate::daemon::http_server;
use crate::daemon::state::StateSetupError;
use crate::daemon::{ServiceConfig, ServiceState};
use utils::Shutdown;

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const LOG_FILE_NAME: &str = "fshare.log";

/// Initialize logging, panic handler, and build info reporting.
/// Returns guards that must be kept alive for the duration of the program.
fn init_logging(
    service_config: &ServiceConfig,
) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(service_config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    if let Some(log_dir) = &service_config.log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(service_config.log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    utils::register_panic_logger();
    utils::report_startup(service_config);

    guards
}

/// Runs the daemon until SIGINT or SIGTERM.
///
/// The registry is opened, the HTTP server bound on all interfaces at
/// `app_port`, and on shutdown every open event stream is told the
/// server is stopping before the listener drains.
pub async fn spawn_service(service_config: &ServiceConfig) -> Result<(), ServiceError> {
    let _guards = init_logging(service_config);
    let shutdown = Shutdown::listen(utils::SIGTERM_GRACE)?;
    let state = ServiceState::from_config(service_config)?;

    let listen_addr = SocketAddr::from(([0, 0, 0, 0], service_config.app_port));
    let app_config = http_server::Config::new(listen_addr, service_config.log_level);

    state.events().publish(ServerEvent::StatusChange {
        status: ServerStatus::Start,
    });

    // end event streams first so the server's graceful drain can finish
    let events = state.events().clone();
    let mut close_rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = close_rx.wait_for(|stopping| *stopping).await;
        events.close();
    });

    let app_rx = shutdown.subscribe();
    let mut app_handle = tokio::spawn(async move {
        tracing::info!("Starting App server on {}", listen_addr);
        http_server::run_app(app_config, state, app_rx).await
    });

    tokio::select! {
        _ = shutdown.wait() => {}
        // the server only stops on its own if it failed
        result = &mut app_handle => {
            shutdown.trigger();
            return match result {
                Ok(result) => result.map_err(ServiceError::from),
                Err(e) => Err(ServiceError::Join(e)),
            };
        }
    }

    match timeout(FINAL_SHUTDOWN_TIMEOUT, app_handle).await {
        Ok(Ok(Err(e))) => tracing::error!("App server error: {}", e),
        Ok(Err(e)) => tracing::error!("App server task failed: {}", e),
        Ok(Ok(Ok(()))) => {}
        Err(_) => {
            tracing::error!(
                "Failed to shut down within {} seconds",
                FINAL_SHUTDOWN_TIMEOUT.as_secs()
            );
            return Err(ServiceError::ShutdownTimeout(FINAL_SHUTDOWN_TIMEOUT));
        }
    }

    tracing::info!("service stopped");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to install signal handlers: {0}")]
    Signals(#[from] std::io::Error),
    #[error("error creating server state: {0}")]
    State(#[from] StateSetupError),
    #[error("HTTP server error: {0}")]
    Http(#[from] http_server::HttpServerError),
    #[error("HTTP server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("failed to shut down within {0:?}")]
    ShutdownTimeout(Duration),
}
