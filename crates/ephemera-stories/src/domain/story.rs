//! The story entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a story stays live after creation.
pub const EXPIRY_WINDOW_HOURS: i64 = 24;

/// A short-lived image post.
///
/// `id`, `image_data` and `timestamp` never change after creation; `viewed`
/// only ever goes from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Unique story identifier.
    pub id: String,
    /// Encoded image payload (a data URL).
    pub image_data: String,
    /// Creation instant, persisted as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Display name of the author.
    pub username: String,
    /// Avatar image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Whether the story has been opened in the viewer.
    #[serde(default)]
    pub viewed: bool,
    /// Cosmetic like count.
    #[serde(default)]
    pub likes: u32,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Caller-supplied descriptive fields for a new story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryMetadata {
    /// Display name of the author.
    pub username: String,
    /// Avatar image reference.
    pub avatar: Option<String>,
    /// Optional caption.
    pub caption: Option<String>,
    /// Cosmetic like count.
    pub likes: u32,
}

impl Story {
    /// Returns `true` while the story is younger than `window`.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.timestamp) < window
    }

    /// Returns the instant at which the story stops being live.
    #[must_use]
    pub fn expires_at(&self, window: Duration) -> DateTime<Utc> {
        self.timestamp + window
    }

    /// Compact age label: minutes under an hour, hours under a day.
    /// Anything older renders as `23h`, the last label a live story can show.
    #[must_use]
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let minutes = now
            .signed_duration_since(self.timestamp)
            .num_minutes()
            .max(0);
        if minutes < 60 {
            return format!("{minutes}m");
        }
        let hours = minutes / 60;
        if hours < EXPIRY_WINDOW_HOURS {
            return format!("{hours}h");
        }
        "23h".to_owned()
    }
}
