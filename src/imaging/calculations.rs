//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images. The
//! engines never do their own dimension math: every resize, crop and place
//! resolves its pixel geometry here first.

use super::params::{Dimension, Rect, ResizeFlags, Size};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("stretching requires both width and height")]
    StretchNeedsBoth,
    #[error("at least one of width or height must be specified")]
    NoDimensions,
}

/// Resolve a dimension against `span`, percentages rounded half away from zero.
fn resolve(dimension: Dimension, span: f64) -> f64 {
    match dimension {
        Dimension::Pixels(px) => f64::from(px),
        Dimension::Percent(p) => (span / 100.0 * p).round(),
    }
}

/// Clamp a computed dimension to a pixel count of at least 1.
fn at_least_one(value: f64) -> u32 {
    value.max(1.0).min(f64::from(u32::MAX)) as u32
}

/// Calculate the output size of a resize.
///
/// Width and height are absolute pixels or percentages of the source; the
/// sign is ignored here (mirroring is the caller's job). `None` or a value
/// resolving to 0 leaves that axis unconstrained. Two percentages imply
/// [`ResizeFlags::STRETCH`].
///
/// # Errors
/// * [`GeometryError::StretchNeedsBoth`] - STRETCH with an unconstrained axis
/// * [`GeometryError::NoDimensions`] - proportional mode with both axes unconstrained
///
/// # Examples
/// ```
/// # use image_facade::imaging::{calculate_size, Dimension, ResizeFlags, Size};
/// // Proportional by width
/// let size = calculate_size(100, 200, Some(Dimension::px(50)), None, ResizeFlags::FIT);
/// assert_eq!(size, Ok(Size::new(50, 100)));
/// ```
pub fn calculate_size(
    src_width: u32,
    src_height: u32,
    width: Option<Dimension>,
    height: Option<Dimension>,
    mut flags: ResizeFlags,
) -> Result<Size, GeometryError> {
    let src_w = f64::from(src_width.max(1));
    let src_h = f64::from(src_height.max(1));

    let new_w = width.map_or(0.0, |d| resolve(d.abs(), src_w));
    let new_h = height.map_or(0.0, |d| resolve(d.abs(), src_h));

    if matches!(width, Some(Dimension::Percent(_))) && matches!(height, Some(Dimension::Percent(_))) {
        flags |= ResizeFlags::STRETCH;
    }

    let (out_w, out_h) = if flags.contains(ResizeFlags::STRETCH) {
        // Non-proportional: each axis on its own
        if new_w == 0.0 || new_h == 0.0 {
            return Err(GeometryError::StretchNeedsBoth);
        }
        if flags.contains(ResizeFlags::SHRINK_ONLY) {
            (
                (src_w * (new_w / src_w).min(1.0)).round(),
                (src_h * (new_h / src_h).min(1.0)).round(),
            )
        } else {
            (new_w, new_h)
        }
    } else {
        // Proportional: one scale for both axes
        if new_w == 0.0 && new_h == 0.0 {
            return Err(GeometryError::NoDimensions);
        }

        let mut scales = Vec::with_capacity(2);
        if new_w > 0.0 {
            scales.push(new_w / src_w);
        }
        if new_h > 0.0 {
            scales.push(new_h / src_h);
        }

        let mut scale = if flags.contains(ResizeFlags::FILL) {
            scales.iter().copied().fold(f64::MIN, f64::max)
        } else {
            scales.iter().copied().fold(f64::MAX, f64::min)
        };
        if flags.contains(ResizeFlags::SHRINK_ONLY) {
            scale = scale.min(1.0);
        }

        ((src_w * scale).round(), (src_h * scale).round())
    };

    Ok(Size::new(at_least_one(out_w), at_least_one(out_h)))
}

/// Calculate a crop window inside a `src_width` × `src_height` image.
///
/// Percentage width/height are relative to the source. Percentage offsets are
/// relative to the *remaining* space, so `0%` aligns to the top/left edge,
/// `100%` to the bottom/right edge and `50%` centers the window. A negative
/// offset shrinks the window by the deficit instead of extending past the
/// origin; the far side is clipped to the source.
///
/// # Examples
/// ```
/// # use image_facade::imaging::{calculate_cutout, Dimension, Rect};
/// let rect = calculate_cutout(
///     100, 100,
///     Dimension::percent(50.0), Dimension::percent(50.0),
///     Dimension::px(50), Dimension::px(50),
/// );
/// assert_eq!(rect, Rect::new(25, 25, 50, 50));
/// ```
pub fn calculate_cutout(
    src_width: u32,
    src_height: u32,
    left: Dimension,
    top: Dimension,
    width: Dimension,
    height: Dimension,
) -> Rect {
    let src_w = f64::from(src_width);
    let src_h = f64::from(src_height);

    let mut new_w = resolve(width, src_w);
    let mut new_h = resolve(height, src_h);
    let mut left = resolve(left, src_w - new_w);
    let mut top = resolve(top, src_h - new_h);

    if left < 0.0 {
        new_w += left;
        left = 0.0;
    }
    if top < 0.0 {
        new_h += top;
        top = 0.0;
    }

    let left = left.min(src_w);
    let top = top.min(src_h);
    let new_w = new_w.min(src_w - left).max(0.0);
    let new_h = new_h.min(src_h - top).max(0.0);

    Rect::new(left as u32, top as u32, new_w as u32, new_h as u32)
}

/// Resolve where an overlay of size `overlay` lands on a `target` canvas.
///
/// Percentages are relative to `target - overlay` (same convention as crop
/// offsets). Pixel offsets pass through and may be negative or exceed the
/// canvas; the compositor clips. Results are clamped to `±u32::MAX`, which is
/// already far outside any canvas.
pub fn calculate_placement(target: Size, overlay: Size, left: Dimension, top: Dimension) -> (i64, i64) {
    let free_w = f64::from(target.width) - f64::from(overlay.width);
    let free_h = f64::from(target.height) - f64::from(overlay.height);
    let limit = f64::from(u32::MAX);
    let offset = |value: f64| value.clamp(-limit, limit) as i64;
    (offset(resolve(left, free_w)), offset(resolve(top, free_h)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(v: i32) -> Option<Dimension> {
        Some(Dimension::px(v))
    }

    fn pct(v: f64) -> Option<Dimension> {
        Some(Dimension::percent(v))
    }

    // =========================================================================
    // calculate_size tests
    // =========================================================================

    #[test]
    fn fit_proportional_by_width() {
        assert_eq!(
            calculate_size(100, 200, px(50), None, ResizeFlags::FIT),
            Ok(Size::new(50, 100))
        );
    }

    #[test]
    fn fit_picks_smaller_scale() {
        // Scales 0.5 and 0.25 → 0.25
        assert_eq!(
            calculate_size(100, 200, px(50), px(50), ResizeFlags::FIT),
            Ok(Size::new(25, 50))
        );
    }

    #[test]
    fn fill_picks_larger_scale() {
        // Scales 0.5 and 0.25 → 0.5
        assert_eq!(
            calculate_size(100, 200, px(50), px(50), ResizeFlags::FILL),
            Ok(Size::new(50, 100))
        );
    }

    #[test]
    fn stretch_ignores_aspect() {
        assert_eq!(
            calculate_size(100, 200, px(50), px(50), ResizeFlags::STRETCH),
            Ok(Size::new(50, 50))
        );
    }

    #[test]
    fn shrink_only_never_upscales() {
        let flags = ResizeFlags::FIT | ResizeFlags::SHRINK_ONLY;
        assert_eq!(
            calculate_size(100, 100, px(200), None, flags),
            Ok(Size::new(100, 100))
        );
    }

    #[test]
    fn shrink_only_still_downscales() {
        let flags = ResizeFlags::FILL | ResizeFlags::SHRINK_ONLY;
        assert_eq!(
            calculate_size(400, 200, px(100), px(100), flags),
            Ok(Size::new(200, 100))
        );
    }

    #[test]
    fn shrink_only_under_stretch_caps_axes_independently() {
        let flags = ResizeFlags::STRETCH | ResizeFlags::SHRINK_ONLY;
        assert_eq!(
            calculate_size(100, 100, px(300), px(40), flags),
            Ok(Size::new(100, 40))
        );
    }

    #[test]
    fn stretch_with_one_dimension_fails() {
        assert_eq!(
            calculate_size(100, 100, px(50), None, ResizeFlags::STRETCH),
            Err(GeometryError::StretchNeedsBoth)
        );
    }

    #[test]
    fn proportional_without_dimensions_fails() {
        assert_eq!(
            calculate_size(100, 100, None, None, ResizeFlags::FIT),
            Err(GeometryError::NoDimensions)
        );
        // Zero is "unconstrained" too
        assert_eq!(
            calculate_size(100, 100, px(0), px(0), ResizeFlags::FILL),
            Err(GeometryError::NoDimensions)
        );
    }

    #[test]
    fn negative_dimensions_use_magnitude() {
        assert_eq!(
            calculate_size(100, 200, px(-50), None, ResizeFlags::FIT),
            Ok(Size::new(50, 100))
        );
    }

    #[test]
    fn single_percentage_stays_proportional() {
        assert_eq!(
            calculate_size(200, 100, pct(50.0), None, ResizeFlags::FIT),
            Ok(Size::new(100, 50))
        );
    }

    #[test]
    fn two_percentages_imply_stretch() {
        assert_eq!(
            calculate_size(200, 100, pct(50.0), pct(20.0), ResizeFlags::FIT),
            Ok(Size::new(100, 20))
        );
    }

    #[test]
    fn mixed_percentage_and_pixels_stays_proportional() {
        // 25% of 200 = 50 → scale 0.25; 80 / 100 = 0.8 → FIT picks 0.25
        assert_eq!(
            calculate_size(200, 100, pct(25.0), px(80), ResizeFlags::FIT),
            Ok(Size::new(50, 25))
        );
    }

    #[test]
    fn tiny_results_floor_at_one_pixel() {
        assert_eq!(
            calculate_size(1000, 10, px(1), None, ResizeFlags::FIT),
            Ok(Size::new(1, 1))
        );
    }

    #[test]
    fn never_returns_zero_over_a_grid() {
        let flag_sets = [
            ResizeFlags::FIT,
            ResizeFlags::FILL,
            ResizeFlags::STRETCH,
            ResizeFlags::FIT | ResizeFlags::SHRINK_ONLY,
            ResizeFlags::FILL | ResizeFlags::SHRINK_ONLY,
            ResizeFlags::STRETCH | ResizeFlags::SHRINK_ONLY,
        ];
        for (sw, sh) in [(1, 1), (1, 5000), (5000, 1), (640, 480)] {
            for (w, h) in [(1, 1), (3, 7000), (7000, 3), (-2, 9)] {
                for flags in flag_sets {
                    let size = calculate_size(sw, sh, px(w), px(h), flags).unwrap();
                    assert!(
                        size.width >= 1 && size.height >= 1,
                        "{sw}x{sh} → {w}x{h} {flags:?} gave {size}"
                    );
                }
            }
        }
    }

    // =========================================================================
    // calculate_cutout tests
    // =========================================================================

    #[test]
    fn cutout_negative_left_shrinks_width() {
        let rect = calculate_cutout(
            100,
            100,
            Dimension::px(-10),
            Dimension::px(0),
            Dimension::px(50),
            Dimension::px(50),
        );
        assert_eq!(rect, Rect::new(0, 0, 40, 50));
    }

    #[test]
    fn cutout_percent_offsets_use_remaining_space() {
        let rect = calculate_cutout(
            100,
            100,
            Dimension::percent(50.0),
            Dimension::percent(50.0),
            Dimension::px(50),
            Dimension::px(50),
        );
        assert_eq!(rect, Rect::new(25, 25, 50, 50));
    }

    #[test]
    fn cutout_full_offset_aligns_far_edge() {
        let rect = calculate_cutout(
            200,
            100,
            Dimension::percent(100.0),
            Dimension::percent(0.0),
            Dimension::px(50),
            Dimension::px(50),
        );
        assert_eq!(rect, Rect::new(150, 0, 50, 50));
    }

    #[test]
    fn cutout_percent_size_relative_to_source() {
        let rect = calculate_cutout(
            200,
            100,
            Dimension::px(0),
            Dimension::px(0),
            Dimension::percent(50.0),
            Dimension::percent(25.0),
        );
        assert_eq!(rect, Rect::new(0, 0, 100, 25));
    }

    #[test]
    fn cutout_clips_far_side() {
        let rect = calculate_cutout(
            100,
            80,
            Dimension::px(70),
            Dimension::px(60),
            Dimension::px(50),
            Dimension::px(50),
        );
        assert_eq!(rect, Rect::new(70, 60, 30, 20));
    }

    #[test]
    fn cutout_offset_beyond_source_is_empty() {
        let rect = calculate_cutout(
            100,
            100,
            Dimension::px(150),
            Dimension::px(0),
            Dimension::px(20),
            Dimension::px(20),
        );
        assert!(rect.is_empty());
        assert!(rect.left <= 100);
    }

    #[test]
    fn cutout_stays_within_bounds() {
        for left in [-200, -5, 0, 5, 99, 250] {
            for top in [-200, -5, 0, 5, 99, 250] {
                let r = calculate_cutout(
                    100,
                    60,
                    Dimension::px(left),
                    Dimension::px(top),
                    Dimension::px(40),
                    Dimension::px(40),
                );
                assert!(r.left + r.width <= 100, "{r:?}");
                assert!(r.top + r.height <= 60, "{r:?}");
            }
        }
    }

    // =========================================================================
    // calculate_placement tests
    // =========================================================================

    #[test]
    fn placement_percent_centers_overlay() {
        let pos = calculate_placement(
            Size::new(100, 60),
            Size::new(20, 20),
            Dimension::percent(50.0),
            Dimension::percent(100.0),
        );
        assert_eq!(pos, (40, 40));
    }

    #[test]
    fn placement_pixels_pass_through() {
        let pos = calculate_placement(
            Size::new(100, 60),
            Size::new(20, 20),
            Dimension::px(-5),
            Dimension::px(70),
        );
        assert_eq!(pos, (-5, 70));
    }

    #[test]
    fn placement_huge_percent_is_clamped() {
        let limit = i64::from(u32::MAX);
        let pos = calculate_placement(
            Size::new(100, 60),
            Size::new(20, 20),
            Dimension::percent(1e300),
            Dimension::percent(-1e300),
        );
        assert_eq!(pos, (limit, -limit));
    }
}
