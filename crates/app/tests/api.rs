mod common;

use std::fs;
use std::io::{Cursor, Read};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use futures::StreamExt;

use crate::common::*;
use fshare::daemon::events::{ChangeAction, ServerEvent};

fn names(listing: &serde_json::Value) -> Vec<String> {
    listing["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_files_root_lists_registry() {
    let app = TestApp::new(false);
    let data = app.data_dir();
    write_file(&data, "docs/a.txt", b"a");
    write_file(&data, "photo.jpg", b"jpg");

    let registry = app.state.registry();
    registry.add_path(&data.join("docs"), None, "1.1.1.1").unwrap();
    registry.add_path(&data.join("photo.jpg"), None, "1.1.1.1").unwrap();
    registry.add_text("remember the milk", "2.2.2.2").unwrap();

    let response = app.get("/api/v0/files").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["path"], serde_json::json!([]));
    assert_eq!(names(&json), vec!["docs", "photo.jpg", "remember the milk"]);

    let text = &json["files"][2];
    assert_eq!(text["type"], "text");
    assert_eq!(text["summary"], "remember the milk");
    assert!(text.get("content").is_none());
}

#[tokio::test]
async fn test_files_nested_reads_live_directory() {
    let app = TestApp::new(false);
    let data = app.data_dir();
    write_file(&data, "docs/sub/b.txt", b"bbbb");
    write_file(&data, "docs/sub/inner/c.txt", b"c");
    app.state
        .registry()
        .add_path(&data.join("docs"), None, "")
        .unwrap();

    let response = app.get("/api/v0/files?path=docs/sub").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["path"], serde_json::json!(["docs", "sub"]));
    assert_eq!(names(&json), vec!["b.txt", "inner"]);
    assert_eq!(json["files"][0]["size"], 4);
    assert_eq!(json["files"][1]["type"], "directory");
}

#[tokio::test]
async fn test_files_errors() {
    let app = TestApp::new(false);
    let data = app.data_dir();
    write_file(&data, "docs/a.txt", b"a");
    app.state
        .registry()
        .add_path(&data.join("docs"), None, "")
        .unwrap();

    let response = app.get("/api/v0/files?path=nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 404);

    let response = app.get("/api/v0/files?path=docs/../..").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/v0/files?path=docs/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/v0/files?path=docs/a.txt").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_file_headers_and_body() {
    let app = TestApp::new(false);
    let data = app.data_dir();
    let file = write_file(&data, "my notes.txt", b"hello");
    app.state.registry().add_path(&file, None, "").unwrap();

    let response = app.get("/api/v0/download?filename=my%20notes.txt").await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    assert_eq!(headers[header::CONTENT_LENGTH], "5");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=my+notes.txt"
    );
    assert_eq!(headers["download-filename"], "my+notes.txt");

    assert_eq!(body_bytes(response).await, b"hello");
}

#[tokio::test]
async fn test_download_file_inside_shared_directory() {
    let app = TestApp::new(false);
    let data = app.data_dir();
    write_file(&data, "docs/sub/b.txt", b"nested");
    app.state
        .registry()
        .add_path(&data.join("docs"), Some("papers"), "")
        .unwrap();

    let response = app.get("/api/v0/download?filename=papers/sub/b.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["download-filename"], "b.txt");
    assert_eq!(body_bytes(response).await, b"nested");
}

#[tokio::test]
async fn test_download_directory_streams_zip_and_cleans_up() {
    let app = TestApp::new(false);
    let data = app.data_dir();
    write_file(&data, "docs/a.txt", b"aaa");
    write_file(&data, "docs/sub/b.txt", b"bbb");
    app.state
        .registry()
        .add_path(&data.join("docs"), None, "")
        .unwrap();

    let response = app.get("/api/v0/download?filename=docs").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=docs.zip"
    );

    let bytes = body_bytes(response).await;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entries: Vec<String> = archive.file_names().map(str::to_string).collect();
    entries.sort();
    assert_eq!(entries, vec!["a.txt", "sub/", "sub/b.txt"]);

    let mut contents = String::new();
    archive
        .by_name("sub/b.txt")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "bbb");

    // the scoped archive went away with the body
    let leftovers: Vec<_> = fs::read_dir(&data)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".zip"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_download_stale_entry_is_pruned() {
    let app = TestApp::new(false);
    let data = app.data_dir();
    write_file(&data, "gone/a.txt", b"a");
    app.state
        .registry()
        .add_path(&data.join("gone"), None, "")
        .unwrap();
    fs::remove_dir_all(data.join("gone")).unwrap();

    let mut events = app.state.events().subscribe();

    let response = app.get("/api/v0/download?filename=gone").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert!(app.state.registry().get("gone").unwrap().is_none());
    assert_eq!(
        events.next().await,
        Some(ServerEvent::files_changed("gone", ChangeAction::Pruned))
    );

    let json = body_json(app.get("/api/v0/files").await).await;
    assert!(names(&json).is_empty());
}

#[tokio::test]
async fn test_download_missing_child_keeps_entry() {
    let app = TestApp::new(false);
    let data = app.data_dir();
    write_file(&data, "docs/a.txt", b"a");
    app.state
        .registry()
        .add_path(&data.join("docs"), None, "")
        .unwrap();

    let response = app.get("/api/v0/download?filename=docs/nope.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.state.registry().get("docs").unwrap().is_some());
}

#[tokio::test]
async fn test_download_bad_requests() {
    let app = TestApp::new(false);

    let response = app.get("/api/v0/download").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/v0/download?filename=///").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/v0/download?filename=unknown").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_text_add_then_download() {
    let app = TestApp::new(false);
    let message = "The quick brown fox jumps over the lazy dog";

    let response = app
        .post_json("/api/v0/text", serde_json::json!({ "message": message }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["entry"]["name"], "The quick brown fox ...");
    assert_eq!(json["entry"]["content"], message);

    let response = app
        .get("/api/v0/download?filename=The%20quick%20brown%20fox%20...")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_bytes(response).await, message.as_bytes());

    let response = app
        .post_json("/api/v0/text", serde_json::json!({ "message": "   " }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let link = "see https://example.com/page";
    let response = app
        .post_json("/api/v0/text", serde_json::json!({ "message": link }))
        .await;
    assert_eq!(body_json(response).await["entry"]["name"], "see https:__example....");

    let response = app
        .get("/api/v0/download?filename=see%20https%3A__example....")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, link.as_bytes());
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let app = TestApp::new(false);
    app.state.registry().add_text("hello", "").unwrap();

    let response = app
        .post_json("/api/v0/files/remove", serde_json::json!({ "name": "hello" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["removed"], true);

    let response = app
        .post_json("/api/v0/files/remove", serde_json::json!({ "name": "hello" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["removed"], false);
}

#[tokio::test]
async fn test_share_requires_local_client() {
    let app = TestApp::new(false);
    let data = app.data_dir();
    write_file(&data, "docs/a.txt", b"a");
    let body = serde_json::json!({ "path": data.join("docs"), "name": "papers" });

    let response = app
        .send(json_request("/api/v0/files/share", body.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(from_loopback(json_request("/api/v0/files/share", body)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["entry"]["name"], "papers");
    assert_eq!(json["entry"]["type"], "directory");
    assert_eq!(json["entry"]["owner"], "127.0.0.1");

    let missing = serde_json::json!({ "path": data.join("ghost") });
    let response = app
        .send(from_loopback(json_request("/api/v0/files/share", missing)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let nested_name = serde_json::json!({ "path": data.join("docs"), "name": "a/b" });
    let response = app
        .send(from_loopback(json_request("/api/v0/files/share", nested_name)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_registers_file() {
    let app = TestApp::new(false);
    let boundary = "fshare-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"../report.csv\"\r\n\
         Content-Type: text/csv\r\n\r\na,b\n1,2\n\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::post("/api/v0/files/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header("x-real-ip", "192.168.1.9")
        .body(Body::from(body))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["entry"]["name"], "report.csv");
    assert_eq!(json["entry"]["owner"], "192.168.1.9");

    let stored = app.state.upload_dir().join("report.csv");
    assert_eq!(fs::read(stored).unwrap(), b"a,b\n1,2\n");
    assert!(app.state.registry().get("report.csv").unwrap().is_some());
}

#[tokio::test]
async fn test_auth_gates_api() {
    let app = TestApp::new(true);
    app.state.registry().add_text("secret note", "").unwrap();

    let response = app.get("/api/v0/files").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], 401);

    let response = app
        .post_json("/api/v0/login", serde_json::json!({ "password": "wrong" }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post_json("/api/v0/login", serde_json::json!({ "password": PASSWORD }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let request = Request::get("/api/v0/files")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::OK);

    let response = app.get("/api/v0/download?filename=secret%20note").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/v0/download?filename=secret%20note&token={}", token);
    assert_eq!(app.get(&uri).await.status(), StatusCode::OK);

    // status routes stay open
    assert_eq!(app.get("/_status/livez").await.status(), StatusCode::OK);

    let logout = |token: &str| {
        Request::post("/api/v0/logout")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    };
    let response = app.send(logout(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["revoked"], true);
    assert!(app.state.sessions().is_empty());

    // the revoked token no longer opens anything, logout included
    assert_eq!(app.send(logout(&token)).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.get(&uri).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_without_auth() {
    let app = TestApp::new(false);
    let response = app
        .post_json("/api/v0/login", serde_json::json!({ "password": "anything" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["auth_enabled"], false);
    assert!(json.get("token").is_none());
}

#[tokio::test]
async fn test_event_stream_starts_with_registry() {
    let app = TestApp::new(false);

    let response = app.get("/api/v0/events").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let mut body = response.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    let first = String::from_utf8(first.to_vec()).unwrap();
    assert!(first.contains("event: registry"));
    assert!(first.contains("\"type\":\"registry\""));

    app.state.events().close();
    let mut rest = String::new();
    while let Some(chunk) = body.next().await {
        rest.push_str(&String::from_utf8(chunk.unwrap().to_vec()).unwrap());
    }
    assert!(rest.contains("server.statusChange"));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new(false);
    let request = Request::get("/nope")
        .header(header::ACCEPT, "application/json")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 404);
}
