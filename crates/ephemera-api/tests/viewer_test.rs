//! Integration tests for the viewer intents.

mod common;

use axum::http::StatusCode;
use ephemera_test_support::encode_test_png;
use tempfile::tempdir;

async fn app_with_stories(dir: &std::path::Path, count: usize) -> (common::TestApp, Vec<String>) {
    let app = common::build_test_app(dir).await;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let (_, created) = common::post_bytes(
            app.router.clone(),
            "/api/v1/stories",
            "image/png",
            encode_test_png(8, 8),
        )
        .await;
        ids.push(created["id"].as_str().unwrap().to_owned());
    }
    (app, ids)
}

#[tokio::test]
async fn test_open_then_confirmed_delete_shows_next_story() {
    // Arrange
    let dir = tempdir().unwrap();
    let (app, ids) = app_with_stories(dir.path(), 3).await;
    let (status, opened) = common::post_json(
        app.router.clone(),
        "/api/v1/viewer/open",
        &serde_json::json!({ "index": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(opened["current_story_id"], ids[1].as_str());

    // Act
    let (status, _) =
        common::delete(app.router.clone(), &format!("/api/v1/stories/{}", ids[1])).await;

    // Assert
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, viewer) = common::get_json(app.router, "/api/v1/viewer").await;
    assert_eq!(viewer["session"]["index"], 1);
    assert_eq!(viewer["current_story_id"], ids[2].as_str());
    assert_eq!(viewer["stories"][1]["viewed"], true);
    assert_eq!(viewer["autoplay_running"], true);
}

#[tokio::test]
async fn test_next_past_last_story_closes_viewer() {
    let dir = tempdir().unwrap();
    let (app, _) = app_with_stories(dir.path(), 2).await;
    common::post_json(
        app.router.clone(),
        "/api/v1/viewer/open",
        &serde_json::json!({ "index": 1 }),
    )
    .await;

    let (status, json) = common::post_empty(app.router, "/api/v1/viewer/next").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["session"].is_null());
    assert_eq!(json["autoplay_running"], false);
}

#[tokio::test]
async fn test_viewed_flag_is_persisted() {
    let dir = tempdir().unwrap();
    let (app, _) = app_with_stories(dir.path(), 1).await;

    common::post_json(
        app.router,
        "/api/v1/viewer/open",
        &serde_json::json!({ "index": 0 }),
    )
    .await;
    app.viewer.shutdown().await.unwrap();

    let reopened = common::build_test_app(dir.path()).await;
    let (_, listed) = common::get_json(reopened.router, "/api/v1/stories").await;
    assert_eq!(listed["stories"][0]["viewed"], true);
}
