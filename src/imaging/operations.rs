//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! declarative inputs (percentages, flags, opacity), resolve exact pixel
//! geometry and call the engine's primitives. Because this is the only place
//! the policy lives, every engine behaves identically from the outside.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_cutout, calculate_placement, calculate_size};
use super::format::ImageFormat;
use super::params::{Dimension, MAX_PIXELS, ResizeFlags, Size};
use image::RgbaImage;
use std::io::Write;
use std::path::Path;
use tracing::{debug, trace};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Reject canvases larger than [`MAX_PIXELS`] or than the address space.
///
/// # Errors
/// [`BackendError::InvalidArgument`] naming the offending size.
pub fn check_canvas(size: Size) -> Result<()> {
    let bytes = usize::try_from(size.pixel_count())
        .ok()
        .and_then(|pixels| pixels.checked_mul(4));
    if size.pixel_count() > MAX_PIXELS || bytes.is_none() {
        return Err(BackendError::InvalidArgument(format!(
            "Image size {size} is too large."
        )));
    }
    Ok(())
}

/// Resize according to `flags`.
///
/// - EXACT fills the box with the engine's
///   [`exact_fill_flags`](ImageBackend::exact_fill_flags), then center-crops.
/// - Otherwise the target comes from [`calculate_size`]; the engine only
///   resamples when it differs from the current size.
/// - A negative width or height mirrors that axis in a separate pass.
pub fn resize<B: ImageBackend + ?Sized>(
    backend: &mut B,
    width: Option<Dimension>,
    height: Option<Dimension>,
    flags: ResizeFlags,
) -> Result<()> {
    if flags.contains(ResizeFlags::EXACT) {
        let fill = backend.exact_fill_flags() - ResizeFlags::EXACT;
        resize(backend, width, height, fill)?;
        let whole = Dimension::percent(100.0);
        return crop(
            backend,
            Dimension::center(),
            Dimension::center(),
            width.map_or(whole, Dimension::abs),
            height.map_or(whole, Dimension::abs),
        );
    }

    let current = backend.size();
    let target = calculate_size(current.width, current.height, width, height, flags)?;

    if target != current {
        check_canvas(target)?;
        debug!(from = %current, to = %target, ?flags, "resample");
        backend.resample(target)?;
    } else {
        trace!(size = %current, "resize is a no-op");
    }

    // Mirroring is its own pass for better quality
    let horizontal = width.is_some_and(Dimension::is_negative);
    let vertical = height.is_some_and(Dimension::is_negative);
    if horizontal || vertical {
        debug!(horizontal, vertical, "flip");
        backend.flip(horizontal, vertical)?;
    }

    Ok(())
}

/// Crop to the window resolved by [`calculate_cutout`].
///
/// # Errors
/// [`BackendError::InvalidArgument`] when the window lies entirely outside
/// the image.
pub fn crop<B: ImageBackend + ?Sized>(
    backend: &mut B,
    left: Dimension,
    top: Dimension,
    width: Dimension,
    height: Dimension,
) -> Result<()> {
    let current = backend.size();
    let rect = calculate_cutout(current.width, current.height, left, top, width, height);

    if rect.is_empty() {
        return Err(BackendError::InvalidArgument(format!(
            "crop window {}x{} at ({}, {}) is empty inside {current}",
            rect.width, rect.height, rect.left, rect.top
        )));
    }
    if rect.left == 0 && rect.top == 0 && rect.size() == current {
        trace!(size = %current, "crop covers the whole image");
        return Ok(());
    }

    debug!(?rect, "extract");
    backend.extract(rect)
}

/// Sharpen with the engine's primitive.
pub fn sharpen<B: ImageBackend + ?Sized>(backend: &mut B) -> Result<()> {
    backend.sharpen()
}

/// Composite `overlay` onto the image.
///
/// Percentage offsets are relative to the free space `(this - overlay)`.
/// `opacity` is clamped to 0..=100; 0 leaves the image untouched.
pub fn place<B: ImageBackend + ?Sized>(
    backend: &mut B,
    overlay: &RgbaImage,
    left: Dimension,
    top: Dimension,
    opacity: i32,
) -> Result<()> {
    let opacity = opacity.clamp(0, 100) as u8;
    if opacity == 0 {
        trace!("place with opacity 0 is a no-op");
        return Ok(());
    }

    let overlay_size = Size::new(overlay.width(), overlay.height());
    let (x, y) = calculate_placement(backend.size(), overlay_size, left, top);
    debug!(x, y, opacity, overlay = %overlay_size, "composite");
    backend.composite(overlay, x, y, opacity)
}

/// Pick the output format: explicit wins, otherwise the path's extension.
pub fn resolve_format(path: &Path, format: Option<ImageFormat>) -> Result<ImageFormat> {
    format.or_else(|| ImageFormat::from_path(path)).ok_or_else(|| {
        BackendError::InvalidArgument(format!(
            "Unsupported image type: cannot infer format from {}",
            path.display()
        ))
    })
}

/// Encode and write to `path`.
pub fn save<B: ImageBackend + ?Sized>(
    backend: &B,
    path: &Path,
    quality: Option<i32>,
    format: Option<ImageFormat>,
) -> Result<()> {
    let format = resolve_format(path, format)?;
    let bytes = backend.encode(format, quality)?;
    debug!(path = %path.display(), %format, bytes = bytes.len(), "save");
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode into a byte buffer.
pub fn to_bytes<B: ImageBackend + ?Sized>(
    backend: &B,
    format: ImageFormat,
    quality: Option<i32>,
) -> Result<Vec<u8>> {
    backend.encode(format, quality)
}

/// Encode and write to `out`.
///
/// Returns the MIME type the caller must declare as `Content-Type`.
pub fn send<B: ImageBackend + ?Sized, W: Write + ?Sized>(
    backend: &B,
    out: &mut W,
    format: ImageFormat,
    quality: Option<i32>,
) -> Result<&'static str> {
    let bytes = backend.encode(format, quality)?;
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(format.mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::params::Rect;

    fn px(v: i32) -> Option<Dimension> {
        Some(Dimension::px(v))
    }

    // =========================================================================
    // resize
    // =========================================================================

    #[test]
    fn resize_resamples_to_calculated_size() {
        let mut backend = MockBackend::new(100, 200);
        resize(&mut backend, px(50), None, ResizeFlags::FIT).unwrap();
        assert_eq!(
            backend.operations,
            vec![RecordedOp::Resample(Size::new(50, 100))]
        );
    }

    #[test]
    fn resize_refuses_unallocatable_target() {
        let mut backend = MockBackend::new(100, 100);
        let huge = Some(Dimension::percent(1e9));
        let err = resize(&mut backend, huge, None, ResizeFlags::FIT).unwrap_err();
        assert!(matches!(err, BackendError::InvalidArgument(_)));

        let err = resize(&mut backend, px(i32::MAX), px(i32::MAX), ResizeFlags::STRETCH)
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidArgument(_)));
        assert!(backend.operations.is_empty());
        assert_eq!(backend.size, Size::new(100, 100));
    }

    #[test]
    fn check_canvas_accepts_the_limit_itself() {
        assert!(check_canvas(Size::new(16384, 16384)).is_ok());
        assert!(check_canvas(Size::new(16384, 16385)).is_err());
        assert!(check_canvas(Size::new(u32::MAX, u32::MAX)).is_err());
    }

    #[test]
    fn resize_to_same_size_is_a_noop() {
        let mut backend = MockBackend::new(100, 200);
        resize(&mut backend, px(60), px(60), ResizeFlags::STRETCH).unwrap();
        resize(&mut backend, px(60), px(60), ResizeFlags::STRETCH).unwrap();
        assert_eq!(
            backend.operations,
            vec![RecordedOp::Resample(Size::new(60, 60))]
        );
    }

    #[test]
    fn negative_dimension_adds_flip_pass() {
        let mut backend = MockBackend::new(100, 100);
        resize(&mut backend, px(-50), px(50), ResizeFlags::FIT).unwrap();
        assert_eq!(
            backend.operations,
            vec![
                RecordedOp::Resample(Size::new(50, 50)),
                RecordedOp::Flip {
                    horizontal: true,
                    vertical: false
                },
            ]
        );
    }

    #[test]
    fn flip_happens_even_without_resample() {
        let mut backend = MockBackend::new(80, 40);
        resize(&mut backend, None, px(-40), ResizeFlags::FIT).unwrap();
        assert_eq!(
            backend.operations,
            vec![RecordedOp::Flip {
                horizontal: false,
                vertical: true
            }]
        );
    }

    #[test]
    fn exact_fills_then_center_crops() {
        let mut backend = MockBackend::new(400, 200);
        resize(&mut backend, px(100), px(100), ResizeFlags::EXACT).unwrap();
        // FILL: scales 0.25 / 0.5 → 0.5 → 200x100, then center 100x100
        assert_eq!(
            backend.operations,
            vec![
                RecordedOp::Resample(Size::new(200, 100)),
                RecordedOp::Extract(Rect::new(50, 0, 100, 100)),
            ]
        );
        assert_eq!(backend.size, Size::new(100, 100));
    }

    #[test]
    fn exact_honours_engine_fill_flags() {
        // Shrink-only engine: a small source is not upscaled before the crop
        let mut backend =
            MockBackend::new(60, 30).with_exact_flags(ResizeFlags::FILL | ResizeFlags::SHRINK_ONLY);
        resize(&mut backend, px(100), px(20), ResizeFlags::EXACT).unwrap();
        assert_eq!(
            backend.operations,
            vec![RecordedOp::Extract(Rect::new(0, 5, 60, 20))]
        );
    }

    #[test]
    fn exact_with_negative_width_flips_and_crops_magnitude() {
        let mut backend = MockBackend::new(200, 200);
        resize(&mut backend, px(-100), px(50), ResizeFlags::EXACT).unwrap();
        assert_eq!(
            backend.operations,
            vec![
                RecordedOp::Resample(Size::new(100, 100)),
                RecordedOp::Flip {
                    horizontal: true,
                    vertical: false
                },
                RecordedOp::Extract(Rect::new(0, 25, 100, 50)),
            ]
        );
    }

    #[test]
    fn stretch_with_one_dimension_is_invalid() {
        let mut backend = MockBackend::new(100, 100);
        let err = resize(&mut backend, px(50), None, ResizeFlags::STRETCH).unwrap_err();
        assert!(matches!(err, BackendError::InvalidArgument(_)));
        assert!(backend.operations.is_empty());
    }

    #[test]
    fn proportional_without_dimensions_is_invalid() {
        let mut backend = MockBackend::new(100, 100);
        let err = resize(&mut backend, None, None, ResizeFlags::FIT).unwrap_err();
        assert!(matches!(err, BackendError::InvalidArgument(_)));
    }

    // =========================================================================
    // crop
    // =========================================================================

    #[test]
    fn crop_extracts_resolved_window() {
        let mut backend = MockBackend::new(100, 100);
        crop(
            &mut backend,
            Dimension::px(-10),
            Dimension::px(0),
            Dimension::px(50),
            Dimension::px(50),
        )
        .unwrap();
        assert_eq!(
            backend.operations,
            vec![RecordedOp::Extract(Rect::new(0, 0, 40, 50))]
        );
    }

    #[test]
    fn crop_outside_image_is_invalid() {
        let mut backend = MockBackend::new(100, 100);
        let err = crop(
            &mut backend,
            Dimension::px(100),
            Dimension::px(0),
            Dimension::px(10),
            Dimension::px(10),
        )
        .unwrap_err();
        assert!(matches!(err, BackendError::InvalidArgument(_)));
    }

    #[test]
    fn crop_of_whole_image_skips_extract() {
        let mut backend = MockBackend::new(64, 48);
        crop(
            &mut backend,
            Dimension::px(0),
            Dimension::px(0),
            Dimension::percent(100.0),
            Dimension::percent(100.0),
        )
        .unwrap();
        assert!(backend.operations.is_empty());
    }

    // =========================================================================
    // place
    // =========================================================================

    #[test]
    fn place_opacity_zero_is_a_noop() {
        let mut backend = MockBackend::new(100, 100);
        let overlay = RgbaImage::new(10, 10);
        place(&mut backend, &overlay, Dimension::px(5), Dimension::px(5), 0).unwrap();
        place(&mut backend, &overlay, Dimension::px(5), Dimension::px(5), -20).unwrap();
        assert!(backend.operations.is_empty());
    }

    #[test]
    fn place_clamps_opacity_and_resolves_percentages() {
        let mut backend = MockBackend::new(100, 60);
        let overlay = RgbaImage::new(20, 20);
        place(
            &mut backend,
            &overlay,
            Dimension::percent(50.0),
            Dimension::percent(100.0),
            150,
        )
        .unwrap();
        assert_eq!(
            backend.operations,
            vec![RecordedOp::Composite {
                left: 40,
                top: 40,
                opacity: 100,
                overlay: Size::new(20, 20),
            }]
        );
    }

    // =========================================================================
    // save / send
    // =========================================================================

    #[test]
    fn resolve_format_prefers_explicit() {
        assert_eq!(
            resolve_format(Path::new("out.png"), Some(ImageFormat::Gif)).unwrap(),
            ImageFormat::Gif
        );
        assert_eq!(
            resolve_format(Path::new("out.JPG"), None).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn save_with_unknown_extension_is_invalid() {
        let backend = MockBackend::new(10, 10);
        let err = save(&backend, Path::new("/tmp/out.webp"), None, None).unwrap_err();
        assert!(matches!(err, BackendError::InvalidArgument(_)));
    }

    #[test]
    fn save_writes_encoded_bytes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.gif");
        let backend = MockBackend::new(10, 10);
        save(&backend, &path, None, None).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"image/gif");
    }

    #[test]
    fn send_reports_content_type() {
        let backend = MockBackend::new(10, 10);
        let mut out = Vec::new();
        let mime = send(&backend, &mut out, ImageFormat::Png, None).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(out, b"image/png");
    }
}
