#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode},
};
use hero_registry::config::{Config, ImageStorageMode};
use hero_registry::router::{RegistryState, registry_router};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "hero-registry-test-boundary";

pub struct TestApp {
    pub app: Router,
    pub upload_dir: PathBuf,
    _dir: TempDir,
}

pub async fn spawn_app(mode: ImageStorageMode) -> TestApp {
    spawn_app_with(mode, |_| {}).await
}

pub async fn spawn_app_with(mode: ImageStorageMode, tweak: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");

    let mut cfg = Config::default();
    cfg.basic.database_url = format!("sqlite:{}", dir.path().join("registry.sqlite").display());
    cfg.storage.mode = mode;
    cfg.storage.upload_dir = dir.path().join("uploads");
    tweak(&mut cfg);

    let state = RegistryState::from_config(&cfg)
        .await
        .expect("failed to build registry state");
    TestApp {
        app: registry_router(state, &cfg),
        upload_dir: cfg.storage.upload_dir.clone(),
        _dir: dir,
    }
}

pub enum Part {
    Text(&'static str, String),
    File {
        name: &'static str,
        file_name: &'static str,
        content_type: &'static str,
        data: Vec<u8>,
    },
}

pub fn text(name: &'static str, value: impl Into<String>) -> Part {
    Part::Text(name, value.into())
}

pub fn png(file_name: &'static str, data: &[u8]) -> Part {
    Part::File {
        name: "images",
        file_name,
        content_type: "image/png",
        data: data.to_vec(),
    }
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn send_multipart(app: &Router, method: &str, uri: &str, parts: &[Part]) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(parts)))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed")
}

pub async fn send(app: &Router, method: &str, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed")
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body")
        .to_vec()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = body_bytes(resp).await;
    serde_json::from_slice(&bytes).expect("response body was not json")
}

/// POST a hero and return its id.
pub async fn create_hero(app: &Router, parts: &[Part]) -> i64 {
    let resp = send_multipart(app, "POST", "/superheroes", parts).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["id"].as_i64().expect("id in create response")
}

pub async fn image_urls(app: &Router, id: i64) -> Vec<String> {
    let resp = send(app, "GET", &format!("/superheroes/{id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["images"]
        .as_array()
        .expect("images array")
        .iter()
        .map(|v| v.as_str().expect("image url").to_string())
        .collect()
}

pub fn file_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
