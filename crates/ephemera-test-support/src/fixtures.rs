//! Synthetic image fixtures.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

/// Encodes a solid-colour PNG of the given dimensions.
///
/// # Panics
///
/// Panics if PNG encoding fails, which only happens for zero dimensions.
#[must_use]
pub fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 120]));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)
        .expect("test PNG encoding");
    bytes.into_inner()
}
