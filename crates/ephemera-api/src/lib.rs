//! Ephemera: local HTTP bridge.
//!
//! Exposes the viewer runtime to a presentation layer: story listing,
//! uploads, confirmed deletes, and the playback intents.

pub mod config;
pub mod error;
pub mod placeholder;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/stories", routes::stories::router(max_upload_bytes))
        .nest("/api/v1/viewer", routes::viewer::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
