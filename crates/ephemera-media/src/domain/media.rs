//! Media value types.

use serde::{Deserialize, Serialize};

/// Maximum output width in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 1080;

/// Maximum output height in pixels.
pub const DEFAULT_MAX_HEIGHT: u32 = 1920;

/// JPEG quality on a 1–100 scale (0.9 of the full range).
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Largest raw input accepted before decoding is attempted.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 25 * 1024 * 1024;

/// A raw file handed over by the media source, with its declared MIME type.
#[derive(Debug, Clone)]
pub struct RawMedia {
    /// Declared MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Undecoded file contents.
    pub bytes: Vec<u8>,
}

impl RawMedia {
    /// Creates a raw media blob.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Returns `true` when the declared type is in the `image/*` family.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// The re-encoded image produced by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImagePayload {
    /// `data:image/jpeg;base64,...` payload.
    pub data_url: String,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Width of the decoded input.
    pub source_width: u32,
    /// Height of the decoded input.
    pub source_height: u32,
}

/// Tunables for the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaSettings {
    /// Output width cap.
    pub max_width: u32,
    /// Output height cap.
    pub max_height: u32,
    /// JPEG quality, 1–100.
    pub jpeg_quality: u8,
    /// Raw inputs larger than this are rejected.
    pub max_input_bytes: usize,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}
