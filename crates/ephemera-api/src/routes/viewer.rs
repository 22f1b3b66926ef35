//! Routes for the story viewer: snapshot and playback intents.

use axum::extract::State;
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use ephemera_playback::application::runtime::{Intent, ViewerSnapshot};
use ephemera_playback::domain::session::SessionSnapshot;

use crate::error::ApiError;
use crate::routes::stories::StoryResponse;
use crate::state::AppState;

/// Request body for POST /open.
#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    /// Index into the live story sequence.
    pub index: usize,
}

/// Request body for POST /swipe.
#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    /// Horizontal swipe distance; negative is leftwards.
    pub delta_x: f64,
}

/// The viewer as rendered to the presentation layer.
#[derive(Debug, Serialize)]
pub struct ViewerResponse {
    /// Live stories, oldest first.
    pub stories: Vec<StoryResponse>,
    /// The open session, if any.
    pub session: Option<SessionSnapshot>,
    /// Id of the story on screen.
    pub current_story_id: Option<String>,
    /// Whether autoplay is running.
    pub autoplay_running: bool,
}

impl ViewerResponse {
    fn render(state: &AppState, snapshot: &ViewerSnapshot) -> Self {
        let now = state.clock.now();
        let current_story_id = snapshot
            .session
            .and_then(|s| snapshot.stories.get(s.index))
            .map(|s| s.id.clone());
        Self {
            stories: snapshot
                .stories
                .iter()
                .map(|s| StoryResponse::from_story(s, now))
                .collect(),
            session: snapshot.session,
            current_story_id,
            autoplay_running: snapshot.autoplay_running,
        }
    }
}

fn log_intent(intent: Intent) {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        command_type = intent.command_type(),
        "handling viewer intent"
    );
}

/// GET /
#[instrument(skip(state))]
async fn get_viewer(State(state): State<AppState>) -> Json<ViewerResponse> {
    let snapshot = state.viewer.snapshot();
    Json(ViewerResponse::render(&state, &snapshot))
}

/// POST /open
#[instrument(skip(state, request), fields(index = request.index))]
async fn open_story(
    State(state): State<AppState>,
    Json(request): Json<OpenRequest>,
) -> Result<Json<ViewerResponse>, ApiError> {
    log_intent(Intent::Open(request.index));
    let snapshot = state.viewer.open_story(request.index).await?;
    Ok(Json(ViewerResponse::render(&state, &snapshot)))
}

/// POST /close
#[instrument(skip(state))]
async fn close_viewer(State(state): State<AppState>) -> Result<Json<ViewerResponse>, ApiError> {
    log_intent(Intent::Close);
    let snapshot = state.viewer.close_viewer().await?;
    Ok(Json(ViewerResponse::render(&state, &snapshot)))
}

/// POST /next
#[instrument(skip(state))]
async fn advance(State(state): State<AppState>) -> Result<Json<ViewerResponse>, ApiError> {
    log_intent(Intent::Advance);
    let snapshot = state.viewer.advance().await?;
    Ok(Json(ViewerResponse::render(&state, &snapshot)))
}

/// POST /prev
#[instrument(skip(state))]
async fn retreat(State(state): State<AppState>) -> Result<Json<ViewerResponse>, ApiError> {
    log_intent(Intent::Retreat);
    let snapshot = state.viewer.retreat().await?;
    Ok(Json(ViewerResponse::render(&state, &snapshot)))
}

/// POST /swipe
#[instrument(skip(state, request), fields(delta_x = request.delta_x))]
async fn swipe(
    State(state): State<AppState>,
    Json(request): Json<SwipeRequest>,
) -> Result<Json<ViewerResponse>, ApiError> {
    log_intent(Intent::Swipe(request.delta_x));
    let snapshot = state.viewer.swipe(request.delta_x).await?;
    Ok(Json(ViewerResponse::render(&state, &snapshot)))
}

/// POST /double-tap
#[instrument(skip(state))]
async fn double_tap(State(state): State<AppState>) -> Result<Json<ViewerResponse>, ApiError> {
    log_intent(Intent::DoubleTap);
    let snapshot = state.viewer.double_tap().await?;
    Ok(Json(ViewerResponse::render(&state, &snapshot)))
}

/// POST /like
#[instrument(skip(state))]
async fn like_toggle(State(state): State<AppState>) -> Result<Json<ViewerResponse>, ApiError> {
    log_intent(Intent::LikeToggle);
    let snapshot = state.viewer.like_toggle().await?;
    Ok(Json(ViewerResponse::render(&state, &snapshot)))
}

/// Returns the router for the viewer.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_viewer))
        .route("/open", post(open_story))
        .route("/close", post(close_viewer))
        .route("/next", post(advance))
        .route("/prev", post(retreat))
        .route("/swipe", post(swipe))
        .route("/double-tap", post(double_tap))
        .route("/like", post(like_toggle))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::state::testing::{fixed_now, state_with, story};

    async fn three_story_state() -> AppState {
        let now = fixed_now();
        state_with(&[story("a", now), story("b", now), story("c", now)]).await
    }

    async fn post(state: &AppState, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let app = router().with_state(state.clone());
        let builder = Request::builder().method("POST").uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_get_viewer_starts_closed() {
        // Arrange
        let state = three_story_state().await;
        let app = router().with_state(state);
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["session"].is_null());
        assert_eq!(json["autoplay_running"], false);
        assert_eq!(json["stories"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_open_marks_viewed_and_starts_autoplay() {
        let state = three_story_state().await;

        let (status, json) = post(&state, "/open", Some(serde_json::json!({ "index": 1 }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["session"]["index"], 1);
        assert_eq!(json["current_story_id"], "b");
        assert_eq!(json["autoplay_running"], true);
        assert_eq!(json["stories"][1]["viewed"], true);
    }

    #[tokio::test]
    async fn test_navigation_and_close() {
        let state = three_story_state().await;
        post(&state, "/open", Some(serde_json::json!({ "index": 0 }))).await;

        let (_, next) = post(&state, "/next", None).await;
        let (_, prev) = post(&state, "/prev", None).await;
        let (_, closed) = post(&state, "/close", None).await;

        assert_eq!(next["session"]["index"], 1);
        assert_eq!(prev["session"]["index"], 0);
        assert!(closed["session"].is_null());
        assert_eq!(closed["autoplay_running"], false);
    }

    #[tokio::test]
    async fn test_swipe_respects_dead_zone() {
        let state = three_story_state().await;
        post(&state, "/open", Some(serde_json::json!({ "index": 1 }))).await;

        let (_, small) = post(&state, "/swipe", Some(serde_json::json!({ "delta_x": -30.0 }))).await;
        let (_, large) = post(&state, "/swipe", Some(serde_json::json!({ "delta_x": -80.0 }))).await;

        assert_eq!(small["session"]["index"], 1);
        assert_eq!(large["session"]["index"], 2);
    }

    #[tokio::test]
    async fn test_double_tap_and_like_toggle() {
        let state = three_story_state().await;
        post(&state, "/open", Some(serde_json::json!({ "index": 0 }))).await;

        let (_, tapped) = post(&state, "/double-tap", None).await;
        let (_, toggled) = post(&state, "/like", None).await;

        assert_eq!(tapped["session"]["liked"], true);
        assert_eq!(tapped["session"]["heart_burst"], true);
        assert_eq!(toggled["session"]["liked"], false);
    }

    #[tokio::test]
    async fn test_open_with_missing_body_returns_client_error() {
        let state = three_story_state().await;

        let (status, _) = post(&state, "/open", Some(serde_json::json!({}))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_intent_after_shutdown_returns_503() {
        let state = three_story_state().await;
        state.viewer.shutdown().await.unwrap();

        let (status, json) = post(&state, "/next", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "viewer_unavailable");
    }
}
