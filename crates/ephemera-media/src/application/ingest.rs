//! The ingestion pipeline: validate, decode, resize, re-encode.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Limits};
use tracing::{debug, info, warn};

use ephemera_core::error::StoryError;

use crate::domain::dimensions::fit_within;
use crate::domain::media::{EncodedImagePayload, MediaSettings, RawMedia};

/// Upper bound on decoder allocations.
const MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

/// Prefix of every payload produced by the pipeline.
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Normalizes user images into bounded-size JPEG payloads.
#[derive(Debug, Clone, Default)]
pub struct IngestPipeline {
    settings: MediaSettings,
}

impl IngestPipeline {
    /// Creates a pipeline with the given settings.
    #[must_use]
    pub fn new(settings: MediaSettings) -> Self {
        Self { settings }
    }

    /// Returns the pipeline settings.
    #[must_use]
    pub fn settings(&self) -> &MediaSettings {
        &self.settings
    }

    /// Ingests a raw image. CPU-bound; async callers should run it on a
    /// blocking thread.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::UnsupportedMedia` if the declared type is not an
    /// image or the input is larger than `max_input_bytes`, and
    /// `StoryError::DecodeFailure` if the bytes cannot be decoded or the
    /// result cannot be re-encoded.
    pub fn ingest(&self, raw: &RawMedia) -> Result<EncodedImagePayload, StoryError> {
        if !raw.is_image() {
            warn!(mime_type = %raw.mime_type, "rejecting non-image upload");
            return Err(StoryError::UnsupportedMedia(format!(
                "{:?} is not an image type",
                raw.mime_type
            )));
        }
        if raw.bytes.len() > self.settings.max_input_bytes {
            warn!(
                bytes = raw.bytes.len(),
                limit = self.settings.max_input_bytes,
                "rejecting oversized upload"
            );
            return Err(StoryError::UnsupportedMedia(format!(
                "input of {} bytes exceeds the {} byte limit",
                raw.bytes.len(),
                self.settings.max_input_bytes
            )));
        }

        let decoded = decode(&raw.bytes)?;
        let (source_width, source_height) = (decoded.width(), decoded.height());
        let (width, height) = fit_within(
            source_width,
            source_height,
            self.settings.max_width,
            self.settings.max_height,
        );

        let resized = if (width, height) == (source_width, source_height) {
            decoded
        } else {
            debug!(source_width, source_height, width, height, "resizing image");
            decoded.resize_exact(width, height, FilterType::Triangle)
        };

        let jpeg = encode_jpeg(&resized, self.settings.jpeg_quality)?;
        let data_url = format!("{JPEG_DATA_URL_PREFIX}{}", STANDARD.encode(&jpeg));

        info!(
            mime_type = %raw.mime_type,
            input_bytes = raw.bytes.len(),
            output_bytes = jpeg.len(),
            width,
            height,
            "ingested image"
        );

        Ok(EncodedImagePayload {
            data_url,
            width,
            height,
            source_width,
            source_height,
        })
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, StoryError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| StoryError::DecodeFailure(format!("cannot sniff format: {e}")))?;
    if reader.format().is_none() {
        return Err(StoryError::DecodeFailure(
            "unrecognised image format".to_owned(),
        ));
    }

    let mut limits = Limits::default();
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    reader.limits(limits);

    reader
        .decode()
        .map_err(|e| StoryError::DecodeFailure(e.to_string()))
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, StoryError> {
    // JPEG carries no alpha channel.
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| StoryError::DecodeFailure(format!("jpeg encoding failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use ephemera_core::error::StoryError;
    use ephemera_test_support::encode_test_png;
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    use super::{IngestPipeline, JPEG_DATA_URL_PREFIX};
    use crate::domain::media::{MediaSettings, RawMedia};

    fn small_caps() -> MediaSettings {
        MediaSettings {
            max_width: 108,
            max_height: 192,
            ..MediaSettings::default()
        }
    }

    fn decode_payload(data_url: &str) -> image::DynamicImage {
        let encoded = data_url.strip_prefix(JPEG_DATA_URL_PREFIX).unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        let format = image::guess_format(&bytes).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn test_ingest_wide_image_is_width_bound() {
        // Arrange
        let pipeline = IngestPipeline::new(small_caps());
        let raw = RawMedia::new("image/png", encode_test_png(400, 200));

        // Act
        let payload = pipeline.ingest(&raw).unwrap();

        // Assert
        assert_eq!((payload.width, payload.height), (108, 54));
        assert_eq!((payload.source_width, payload.source_height), (400, 200));
        assert_eq!(decode_payload(&payload.data_url).dimensions(), (108, 54));
    }

    #[test]
    fn test_ingest_tall_image_is_height_bound() {
        // Arrange
        let pipeline = IngestPipeline::new(small_caps());
        let raw = RawMedia::new("image/png", encode_test_png(100, 300));

        // Act
        let payload = pipeline.ingest(&raw).unwrap();

        // Assert
        assert_eq!((payload.width, payload.height), (64, 192));
        assert_eq!(decode_payload(&payload.data_url).dimensions(), (64, 192));
    }

    #[test]
    fn test_ingest_small_image_keeps_dimensions_and_becomes_jpeg() {
        let pipeline = IngestPipeline::default();
        let raw = RawMedia::new("image/png", encode_test_png(32, 48));

        let payload = pipeline.ingest(&raw).unwrap();

        assert_eq!((payload.width, payload.height), (32, 48));
        assert!(payload.data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_ingest_flattens_transparent_png() {
        let img = RgbaImage::from_pixel(20, 10, Rgba([10, 20, 30, 0]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        let raw = RawMedia::new("image/png", bytes.into_inner());

        let payload = IngestPipeline::default().ingest(&raw).unwrap();

        assert_eq!(decode_payload(&payload.data_url).dimensions(), (20, 10));
    }

    #[test]
    fn test_ingest_rejects_non_image_mime_type_before_decoding() {
        // Valid PNG bytes, but the declared type is not an image.
        let raw = RawMedia::new("application/pdf", encode_test_png(10, 10));

        let result = IngestPipeline::default().ingest(&raw);

        match result.unwrap_err() {
            StoryError::UnsupportedMedia(msg) => assert!(msg.contains("application/pdf")),
            other => panic!("expected UnsupportedMedia, got {other:?}"),
        }
    }

    #[test]
    fn test_ingest_rejects_oversized_input() {
        let settings = MediaSettings {
            max_input_bytes: 16,
            ..MediaSettings::default()
        };
        let raw = RawMedia::new("image/png", encode_test_png(10, 10));

        let result = IngestPipeline::new(settings).ingest(&raw);

        assert!(matches!(result, Err(StoryError::UnsupportedMedia(_))));
    }

    #[test]
    fn test_ingest_reports_decode_failure_for_corrupt_bytes() {
        let raw = RawMedia::new("image/png", b"definitely not a png".to_vec());

        let result = IngestPipeline::default().ingest(&raw);

        assert!(matches!(result, Err(StoryError::DecodeFailure(_))));
    }

    #[test]
    fn test_ingest_reports_decode_failure_for_truncated_png() {
        let mut bytes = encode_test_png(50, 50);
        bytes.truncate(40);
        let raw = RawMedia::new("image/png", bytes);

        let result = IngestPipeline::default().ingest(&raw);

        assert!(matches!(result, Err(StoryError::DecodeFailure(_))));
    }
}
