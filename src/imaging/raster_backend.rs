//! Raster engine: plain 8-bit RGBA buffer, pixels only.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF) | [`format::decode`](super::format::decode) → `to_rgba8` |
//! | Resample | `image::imageops::resize` with `Triangle` filter |
//! | Flip | `imageops::flip_horizontal` / `flip_vertical` |
//! | Extract | copy into a fresh buffer |
//! | Sharpen | 3×3 convolution, edge-clamped |
//! | Composite | `imageops::overlay` (alpha "over") at 100, per-channel merge below |
//! | Encode | [`format::encode`](super::format::encode), no profile |
//!
//! Every change builds a new buffer and swaps it in; the engine never carries
//! metadata, so saved files contain pixels only.

use super::backend::{BackendError, ImageBackend};
use super::color::Color;
use super::format::{self, ImageFormat};
use super::params::{Rect, Size};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use std::borrow::Cow;
use tracing::trace;

/// 3×3 sharpening kernel; weights sum to 16, which is also the divisor.
const SHARPEN_KERNEL: [[i32; 3]; 3] = [[-1, -1, -1], [-1, 24, -1], [-1, -1, -1]];
const SHARPEN_DIVISOR: i32 = 16;

/// Raster engine owning one RGBA buffer.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone)]
pub struct RasterBackend {
    pixels: RgbaImage,
}

impl RasterBackend {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Decode bytes; returns the engine and the detected format.
    pub fn decode(bytes: &[u8]) -> Result<(Self, ImageFormat), BackendError> {
        let decoded = format::decode(bytes)?;
        Ok((Self::from_rgba(decoded.image.to_rgba8()), decoded.format))
    }

    /// A `width`×`height` canvas filled with `color`.
    pub fn blank(size: Size, color: Color) -> Self {
        Self::from_rgba(RgbaImage::from_pixel(size.width, size.height, color.to_rgba()))
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }
}

impl ImageBackend for RasterBackend {
    fn size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }

    fn resample(&mut self, size: Size) -> Result<(), BackendError> {
        self.pixels = imageops::resize(&self.pixels, size.width, size.height, FilterType::Triangle);
        Ok(())
    }

    fn flip(&mut self, horizontal: bool, vertical: bool) -> Result<(), BackendError> {
        if horizontal {
            self.pixels = imageops::flip_horizontal(&self.pixels);
        }
        if vertical {
            self.pixels = imageops::flip_vertical(&self.pixels);
        }
        Ok(())
    }

    fn extract(&mut self, rect: Rect) -> Result<(), BackendError> {
        let view = imageops::crop_imm(&self.pixels, rect.left, rect.top, rect.width, rect.height);
        self.pixels = view.to_image();
        Ok(())
    }

    fn sharpen(&mut self) -> Result<(), BackendError> {
        self.pixels = convolve3(&self.pixels, &SHARPEN_KERNEL, SHARPEN_DIVISOR);
        Ok(())
    }

    fn composite(
        &mut self,
        overlay: &RgbaImage,
        left: i64,
        top: i64,
        opacity: u8,
    ) -> Result<(), BackendError> {
        if opacity >= 100 {
            imageops::overlay(&mut self.pixels, overlay, left, top);
        } else {
            merge(&mut self.pixels, overlay, left, top, opacity);
        }
        Ok(())
    }

    fn encode(&self, format: ImageFormat, quality: Option<i32>) -> Result<Vec<u8>, BackendError> {
        let image = DynamicImage::ImageRgba8(self.pixels.clone());
        format::encode(&image, format, quality, None)
    }

    fn to_rgba(&self) -> Cow<'_, RgbaImage> {
        Cow::Borrowed(&self.pixels)
    }
}

/// Apply a 3×3 kernel to the colour channels, keeping alpha.
///
/// Samples past the border are clamped to the nearest edge pixel.
fn convolve3(src: &RgbaImage, kernel: &[[i32; 3]; 3], divisor: i32) -> RgbaImage {
    let (width, height) = src.dimensions();
    trace!(width, height, "convolve3");
    let max_x = i64::from(width) - 1;
    let max_y = i64::from(height) - 1;

    RgbaImage::from_fn(width, height, |x, y| {
        let mut sums = [0i32; 3];
        for (ky, row) in kernel.iter().enumerate() {
            for (kx, weight) in row.iter().enumerate() {
                let sx = (i64::from(x) + kx as i64 - 1).clamp(0, max_x) as u32;
                let sy = (i64::from(y) + ky as i64 - 1).clamp(0, max_y) as u32;
                let pixel = src.get_pixel(sx, sy);
                for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                    *sum += i32::from(channel) * weight;
                }
            }
        }
        let [r, g, b] = sums.map(|s| (s / divisor).clamp(0, 255) as u8);
        Rgba([r, g, b, src.get_pixel(x, y).0[3]])
    })
}

/// Blend `overlay` into `dst` as `dst + (src - dst) * pct / 100` per colour
/// channel. Source alpha is ignored and destination alpha kept.
fn merge(dst: &mut RgbaImage, overlay: &RgbaImage, left: i64, top: i64, pct: u8) {
    let pct = i32::from(pct);
    let (dst_w, dst_h) = (i64::from(dst.width()), i64::from(dst.height()));

    for (ox, oy, src) in overlay.enumerate_pixels() {
        let (Some(x), Some(y)) = (
            left.checked_add(i64::from(ox)),
            top.checked_add(i64::from(oy)),
        ) else {
            continue;
        };
        if x < 0 || y < 0 || x >= dst_w || y >= dst_h {
            continue;
        }
        let target = dst.get_pixel_mut(x as u32, y as u32);
        for c in 0..3 {
            let d = i32::from(target.0[c]);
            let s = i32::from(src.0[c]);
            target.0[c] = (d + (s - d) * pct / 100).clamp(0, 255) as u8;
        }
    }
}
