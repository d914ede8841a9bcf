#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;

use handoff::config::ShareConfig;
use handoff::server::{routes, AppState};

pub fn setup_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

//===========
// App Factory
//===========

/// Builds a router over real (validated) paths and returns it with the
/// generated token and the state for later inspection.
pub fn create_test_app(download: Option<PathBuf>, upload_dir: PathBuf) -> (Router, String) {
    let config = ShareConfig::new(download, Some(upload_dir), 0).expect("valid test config");
    let token = config.token.clone();
    let state = AppState::new(config);
    (routes::build_router(&state), token)
}

//=================
// Request Builders
//=================

pub fn build_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

pub fn build_get_with_headers(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).expect("Failed to build request")
}

/// Multipart POST with a single `file` field carrying `declared_name`.
pub fn build_upload_request(uri: &str, declared_name: &str, content: &[u8]) -> Request<Body> {
    let boundary = "----WebKitFormBoundary7MA4YWxkTrZu0gW";
    let mut body = Vec::new();

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{declared_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("Failed to build multipart request")
}

/// Multipart POST with no `file` field at all.
pub fn build_upload_without_file_field(uri: &str) -> Request<Body> {
    let boundary = "----WebKitFormBoundary7MA4YWxkTrZu0gW";
    let mut body = Vec::new();

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"comment\"\r\n\r\n");
    body.extend_from_slice(b"not a file");
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("Failed to build multipart request")
}

//=================
// Response Helpers
//=================

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes()
        .to_vec()
}

pub async fn body_string(response: axum::response::Response) -> String {
    String::from_utf8(body_bytes(response).await).expect("body should be UTF-8")
}
