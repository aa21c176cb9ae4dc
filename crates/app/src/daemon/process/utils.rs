use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::daemon::ServiceConfig;

/// How long SIGTERM waits before shutdown starts, so requests already in
/// flight (downloads, mostly) can finish.
pub const SIGTERM_GRACE: Duration = Duration::from_secs(10);

/// Fan-out of the daemon's stop signal.
///
/// Fires once, on SIGINT right away, on SIGTERM after the grace period,
/// or when [`Shutdown::trigger`] is called.
pub struct Shutdown {
    listener: JoinHandle<()>,
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Install the signal handlers.
    pub fn listen(grace: Duration) -> std::io::Result<Self> {
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let (tx, _) = watch::channel(false);

        let signal_tx = tx.clone();
        let listener = tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => tracing::info!("SIGINT received, stopping"),
                _ = sigterm.recv() => {
                    tracing::info!(grace_secs = grace.as_secs(), "SIGTERM received, stopping after grace period");
                    tokio::time::sleep(grace).await;
                }
            }
            signal_tx.send_replace(true);
        });

        Ok(Self { listener, tx })
    }

    /// A receiver that sees the flag flip to `true` on shutdown.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Start shutdown without a signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Resolves once shutdown has started.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        // the sender lives in `self`, so this only errors after drop
        let _ = rx.wait_for(|stopping| *stopping).await;
    }
}

impl Drop for Shutdown {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Route panics through `tracing` so they end up in the log file too.
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(loc) => {
            tracing::error!(
                message = %panic,
                panic.file = loc.file(),
                panic.line = loc.line(),
            );
        }
        None => tracing::error!(message = %panic),
    }));
}

/// Log the build and the share settings this daemon runs with.
pub fn report_startup(config: &ServiceConfig) {
    let build = crate::version::build_info();

    tracing::info!(
        version = %build.version,
        build_profile = %build.build_profile,
        port = config.app_port,
        machine_id = %config.machine_id,
        registry = %config.storage_path.display(),
        uploads = %config.upload_dir.display(),
        auth = config.auth_enabled,
        "fshare daemon starting"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_subscribers() {
        let shutdown = Shutdown::listen(SIGTERM_GRACE).unwrap();
        let mut rx = shutdown.subscribe();
        assert!(!*rx.borrow());

        shutdown.trigger();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());

        // late subscribers see it too
        shutdown.wait().await;
    }
}
