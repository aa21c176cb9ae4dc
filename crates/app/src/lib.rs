// Library exports for the binary and integration tests

// Daemon/service modules (HTTP server, sessions, events)
pub mod daemon;
pub mod state;
pub mod version;

// Re-export key types for convenience
pub use daemon::http_server;
pub use daemon::spawn_service;
pub use daemon::ServiceConfig;
pub use daemon::ServiceState;
pub use state::{AppConfig, AppState, StateError};
