//! Persisted layout of the story collection.
//!
//! The whole collection lives under one key as a JSON array of story
//! records, oldest first.

use super::story::Story;

/// Key under which the collection is persisted.
pub const STORIES_KEY: &str = "stories";

/// Serializes the collection.
///
/// # Errors
///
/// Returns the underlying `serde_json` error if serialization fails.
pub fn encode(stories: &[Story]) -> Result<String, serde_json::Error> {
    serde_json::to_string(stories)
}

/// Parses a persisted collection.
///
/// # Errors
///
/// Returns the underlying `serde_json` error if the text is not a valid
/// array of story records.
pub fn decode(text: &str) -> Result<Vec<Story>, serde_json::Error> {
    serde_json::from_str(text)
}
