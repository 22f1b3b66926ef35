//! Domain error types.

use thiserror::Error;

/// Top-level error type for story ingestion, storage and playback.
#[derive(Debug, Error)]
pub enum StoryError {
    /// The input is not an image, or exceeds the accepted input size.
    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),

    /// The input claims to be an image but could not be decoded or encoded.
    #[error("image decode failure: {0}")]
    DecodeFailure(String),

    /// The persisted story collection could not be read.
    #[error("persistence read error: {0}")]
    PersistenceRead(String),

    /// The persisted story collection could not be written.
    #[error("persistence write error: {0}")]
    PersistenceWrite(String),

    /// No live story carries the given id.
    #[error("story not found: {0}")]
    StoryNotFound(String),

    /// A validation error in caller-supplied input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The viewer runtime has shut down and no longer accepts intents.
    #[error("viewer unavailable: {0}")]
    ViewerUnavailable(String),
}
