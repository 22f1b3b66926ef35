//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use ephemera_core::clock::Clock;
use ephemera_core::rng::DeterministicRng;
use ephemera_kv::file_store::FileKeyValueStore;
use ephemera_media::application::ingest::IngestPipeline;
use ephemera_playback::application::runtime::{ViewerHandle, spawn_viewer};
use ephemera_playback::application::viewer::StoryViewer;
use ephemera_playback::domain::session::PlaybackSettings;
use ephemera_stories::application::store::{StoreSettings, StoryStore};
use ephemera_test_support::{FixedClock, MockRng, SequenceRng};
use http_body_util::BodyExt;
use tower::ServiceExt;

use ephemera_api::state::AppState;

/// Upload limit used across integration tests.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Fixed timestamp used across all integration tests.
pub fn fixed_now() -> chrono::DateTime<chrono::Utc> {
    chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap()
}

fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(FixedClock(fixed_now()))
}

/// A running app over a file-backed store, plus its viewer handle.
pub struct TestApp {
    pub router: Router,
    pub viewer: ViewerHandle,
}

/// Build the full app over a file store in `data_dir` with deterministic
/// Clock/RNG. Uses the same route structure as `main.rs`.
pub async fn build_test_app(data_dir: &Path) -> TestApp {
    build_test_app_with_rng(data_dir, SequenceRng::new(vec![])).await
}

/// Build the full app with a custom `SequenceRng` for tests that need
/// specific placeholder metadata.
pub async fn build_test_app_with_rng(data_dir: &Path, rng: SequenceRng) -> TestApp {
    let clock = fixed_clock();
    let kv = FileKeyValueStore::open(data_dir).await.unwrap();
    let mut store = StoryStore::new(
        Arc::new(kv),
        Arc::<dyn Clock + Send + Sync>::clone(&clock),
        Box::new(MockRng),
        StoreSettings::default(),
    );
    store.load().await.unwrap();

    let settings = PlaybackSettings::default();
    let (viewer, _runtime) = spawn_viewer(
        StoryViewer::new(store, &settings),
        settings,
        IngestPipeline::default(),
    );
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let app_state = AppState::new(viewer.clone(), clock, rng);

    TestApp {
        router: ephemera_api::app(app_state, MAX_UPLOAD_BYTES),
        viewer,
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Framework rejections (404, 413) carry plain-text or empty bodies.
    let json = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Upload raw bytes with the given content type.
pub async fn post_bytes(
    app: Router,
    uri: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(bytes))
        .unwrap();
    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a DELETE request and return the response.
pub async fn delete(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
