#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use ::common::prelude::{JsonStore, RegistryStore};
use fshare::daemon::sessions::AuthSettings;
use fshare::ServiceState;

pub const PASSWORD: &str = "secret";

pub struct TestApp {
    pub router: Router,
    pub state: ServiceState,
    pub dir: TempDir,
}

impl TestApp {
    pub fn new(auth_enabled: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(JsonStore::open(dir.path().join("files.json")));
        let registry = RegistryStore::new(storage, "test");
        let uploads = dir.path().join("uploads");
        fs::create_dir_all(&uploads).unwrap();

        let state = ServiceState::new(
            registry,
            uploads,
            AuthSettings {
                enabled: auth_enabled,
                password: PASSWORD.to_string(),
            },
        );
        let router = fshare::http_server::router(state.clone());

        Self { router, state, dir }
    }

    /// Shared content lives under `<tmp>/data`
    pub fn data_dir(&self) -> PathBuf {
        let dir = self.dir.path().join("data");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        self.send(json_request(uri, body)).await
    }
}

pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Mark a request as coming from this machine.
pub fn from_loopback(mut request: Request<Body>) -> Request<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 50000))));
    request
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn write_file(root: &Path, rel: &str, contents: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}
