//! Image engine trait and shared error type.
//!
//! The [`ImageBackend`] trait is the closed capability set every engine must
//! provide for a single owned image: report its size, resample, flip, extract
//! a window, sharpen, composite another image, and encode.
//!
//! Engines do no geometry math of their own. The policy layer in
//! [`operations`](super::operations) resolves percentages, flags and offsets
//! through [`calculations`](super::calculations) and hands the engine exact
//! pixel values, which is what keeps the engines interchangeable.
//!
//! | Capability | [`RasterBackend`](super::raster_backend::RasterBackend) | [`MetadataBackend`](super::metadata_backend::MetadataBackend) |
//! |---|---|---|
//! | storage | `RgbaImage`, swapped on every change | `DynamicImage`, replaced in place |
//! | resample | Triangle filter | configured filter (Lanczos3) |
//! | sharpen | 3×3 convolution | unsharp mask |
//! | composite | copy / per-channel merge | alpha-scaled over |
//! | encode | pixels only | ICC profile + JPEG metadata segments |

use super::calculations::GeometryError;
use super::format::ImageFormat;
use super::params::{Rect, ResizeFlags, Size};
use image::RgbaImage;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Unknown image file: {0}")]
    UnknownImageFile(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

impl From<GeometryError> for BackendError {
    fn from(e: GeometryError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

/// Trait for image engines.
///
/// Every engine owns exactly one image and implements all of these
/// primitives, so the rest of the crate is engine-agnostic.
/// See the [module docs](self) for the parity table.
pub trait ImageBackend {
    /// Current dimensions.
    fn size(&self) -> Size;

    /// Resample to exactly `size`.
    fn resample(&mut self, size: Size) -> Result<(), BackendError>;

    /// Mirror along the requested axes.
    fn flip(&mut self, horizontal: bool, vertical: bool) -> Result<(), BackendError>;

    /// Replace the image with the window `rect` (already clipped, non-empty).
    fn extract(&mut self, rect: Rect) -> Result<(), BackendError>;

    /// Apply the engine's sharpening primitive.
    fn sharpen(&mut self) -> Result<(), BackendError>;

    /// Draw `overlay` at `(left, top)` with `opacity` in `1..=100`.
    ///
    /// Offsets may be negative or run past the edge; only the overlap is
    /// touched.
    fn composite(
        &mut self,
        overlay: &RgbaImage,
        left: i64,
        top: i64,
        opacity: u8,
    ) -> Result<(), BackendError>;

    /// Encode the current pixels.
    fn encode(&self, format: ImageFormat, quality: Option<i32>) -> Result<Vec<u8>, BackendError>;

    /// Straight-alpha RGBA view, used when this image is placed onto another.
    fn to_rgba(&self) -> Cow<'_, RgbaImage>;

    /// Flags EXACT uses for its fill pass before center-cropping.
    fn exact_fill_flags(&self) -> ResizeFlags {
        ResizeFlags::FILL
    }
}
