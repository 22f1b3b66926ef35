//! Routes for the story collection: listing, uploads and confirmed deletes.

use std::sync::PoisonError;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::{Json, Router, routing::delete, routing::get};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use ephemera_core::error::StoryError;
use ephemera_media::domain::media::RawMedia;
use ephemera_stories::domain::story::{EXPIRY_WINDOW_HOURS, Story};

use crate::error::ApiError;
use crate::placeholder::{self, MetadataOverrides};
use crate::state::AppState;

/// Default page size of GET /recent.
const DEFAULT_RECENT_LIMIT: usize = 6;

/// A story as rendered to the presentation layer.
#[derive(Debug, Serialize)]
pub struct StoryResponse {
    /// Story identifier.
    pub id: String,
    /// JPEG data URL.
    pub image_data: String,
    /// Creation instant.
    pub timestamp: DateTime<Utc>,
    /// Instant the story stops being live.
    pub expires_at: DateTime<Utc>,
    /// Compact age label such as `5m` or `3h`.
    pub age_label: String,
    /// Author display name.
    pub username: String,
    /// Avatar URL.
    pub avatar: Option<String>,
    /// Whether the story has been opened.
    pub viewed: bool,
    /// Cosmetic like count.
    pub likes: u32,
    /// Optional caption.
    pub caption: Option<String>,
}

impl StoryResponse {
    /// Renders `story` relative to `now`.
    #[must_use]
    pub fn from_story(story: &Story, now: DateTime<Utc>) -> Self {
        Self {
            id: story.id.clone(),
            image_data: story.image_data.clone(),
            timestamp: story.timestamp,
            expires_at: story.expires_at(Duration::hours(EXPIRY_WINDOW_HOURS)),
            age_label: story.age_label(now),
            username: story.username.clone(),
            avatar: story.avatar.clone(),
            viewed: story.viewed,
            likes: story.likes,
            caption: story.caption.clone(),
        }
    }
}

/// Response body for story listings.
#[derive(Debug, Serialize)]
pub struct StoryListResponse {
    /// Stories in response order.
    pub stories: Vec<StoryResponse>,
}

/// Query string of GET /recent.
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    /// Maximum number of stories to return.
    pub limit: Option<usize>,
}

/// Query string of an upload. Missing fields get placeholder values.
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Author display name.
    pub username: Option<String>,
    /// Caption text.
    pub caption: Option<String>,
    /// Avatar URL.
    pub avatar: Option<String>,
    /// Like count.
    pub likes: Option<u32>,
}

/// GET /
#[instrument(skip(state))]
async fn list_stories(State(state): State<AppState>) -> Json<StoryListResponse> {
    let now = state.clock.now();
    let stories = state
        .viewer
        .snapshot()
        .stories
        .iter()
        .map(|s| StoryResponse::from_story(s, now))
        .collect();
    Json(StoryListResponse { stories })
}

/// GET /recent
#[instrument(skip(state))]
async fn recent_stories(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Json<StoryListResponse> {
    let now = state.clock.now();
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let stories = state
        .viewer
        .snapshot()
        .recent(limit)
        .iter()
        .map(|s| StoryResponse::from_story(s, now))
        .collect();
    Json(StoryListResponse { stories })
}

/// POST /
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
async fn upload_story(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<StoryResponse>), ApiError> {
    let correlation_id = Uuid::new_v4();
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    info!(correlation_id = %correlation_id, mime_type = %mime_type, "handling story upload");

    let overrides = MetadataOverrides {
        username: query.username,
        caption: query.caption,
        avatar: query.avatar,
        likes: query.likes,
    };
    let metadata = {
        let mut rng = state.rng.lock().unwrap_or_else(PoisonError::into_inner);
        placeholder::fill(overrides, &mut *rng)
    };

    let raw = RawMedia::new(mime_type, body.to_vec());
    let story = state.viewer.add_story_from_file(raw, metadata).await?;

    info!(correlation_id = %correlation_id, story_id = %story.id, "story created");

    Ok((
        StatusCode::CREATED,
        Json(StoryResponse::from_story(&story, state.clock.now())),
    ))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, story_id = %id, "handling story delete");

    if state.viewer.request_delete(id.clone()).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StoryError::StoryNotFound(id).into())
    }
}

/// Returns the router for the story collection.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_stories).post(upload_story))
        .route("/recent", get(recent_stories))
        .route("/{id}", delete(delete_story))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
