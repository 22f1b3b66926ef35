//! Target dimension computation.

/// Computes output dimensions that fit within `max_width` × `max_height`
/// while preserving the aspect ratio.
///
/// The clamp runs in two passes: width first, then height if the
/// width-corrected result is still too tall. A width-only fix leaves tall
/// portrait images over the height cap. Images already within both caps are
/// returned unchanged; results are rounded and never drop below one pixel.
#[must_use]
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let mut w = f64::from(width);
    let mut h = f64::from(height);
    let cap_w = f64::from(max_width);
    let cap_h = f64::from(max_height);

    if w > cap_w {
        h *= cap_w / w;
        w = cap_w;
    }
    if h > cap_h {
        w *= cap_h / h;
        h = cap_h;
    }

    (to_pixels(w), to_pixels(h))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixels(value: f64) -> u32 {
    // Bounded by the u32 input, so the cast cannot overflow.
    value.round().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_image_is_width_bound() {
        assert_eq!(fit_within(4000, 2000, 1080, 1920), (1080, 540));
    }

    #[test]
    fn test_tall_image_needs_second_pass() {
        assert_eq!(fit_within(1000, 3000, 1080, 1920), (640, 1920));
    }

    #[test]
    fn test_image_over_both_caps_is_clamped_by_height_after_width() {
        // 2160x7680: width pass gives 1080x3840, height pass gives 540x1920.
        assert_eq!(fit_within(2160, 7680, 1080, 1920), (540, 1920));
    }

    #[test]
    fn test_image_within_caps_is_unchanged() {
        assert_eq!(fit_within(800, 600, 1080, 1920), (800, 600));
        assert_eq!(fit_within(1080, 1920, 1080, 1920), (1080, 1920));
    }

    #[test]
    fn test_extreme_panorama_keeps_at_least_one_pixel() {
        assert_eq!(fit_within(100_000, 10, 1080, 1920), (1080, 1));
    }
}
