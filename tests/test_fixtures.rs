//! Shared test fixtures for the integration and HTTP tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use std::sync::Arc;
use tempfile::TempDir;

use pasted::api::{create_router, router::AppState};
use pasted::application::builder::ApplicationBuilder;
use pasted::application::ports::ManualClock;
use pasted::config::StorageBackend;
use pasted::infrastructure::cdn::InMemoryObjectStore;
use pasted::Config;

pub const HOST: &str = "paste.test";
pub const HELLO_KEY: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

/// Scratch directories plus the state built from them
pub struct TestEnvironment {
    pub dir: TempDir,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub objects: Option<Arc<InMemoryObjectStore>>,
}

impl TestEnvironment {
    /// Local store only, rate limiting off
    pub async fn local() -> Self {
        Self::with(|config| config.testing = true, false).await
    }

    /// Local store plus an in-memory CDN receiving writes, rate limiting off
    pub async fn with_cdn() -> Self {
        Self::with(
            |config| {
                config.testing = true;
                config.storage_backend = StorageBackend::Cdn;
            },
            true,
        )
        .await
    }

    /// Build from a config adjusted by `tweak`
    pub async fn with(tweak: impl FnOnce(&mut Config), cdn: bool) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = test_config(&dir);
        tweak(&mut config);

        let clock = Arc::new(ManualClock::default());
        let mut builder = ApplicationBuilder::new(config).with_clock(clock.clone());

        let objects = cdn.then(|| Arc::new(InMemoryObjectStore::new()));
        if let Some(objects) = &objects {
            builder = builder.with_object_store(objects.clone());
        }

        let state = builder
            .with_storage()
            .await
            .expect("Failed to init storage")
            .with_rate_limiter()
            .build()
            .expect("Failed to build state");

        Self {
            dir,
            state,
            clock,
            objects,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub fn paste_path(&self, key: &str) -> std::path::PathBuf {
        self.dir.path().join("pastes").join(key)
    }
}

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        paste_dir: dir.path().join("pastes"),
        rate_limit_file: dir.path().join("ratelimit.json"),
        retry_delay_ms: 1,
        ..Config::default()
    }
}

/// JSON POST carrying `{"content": content}`
pub fn post_content(uri: &str, content: &str) -> Request<Body> {
    post_raw(uri, serde_json::json!({ "content": content }).to_string())
}

pub fn post_raw(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("Failed to build request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::HOST, HOST)
        .body(Body::empty())
        .expect("Failed to build request")
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("Body is not JSON")
}
