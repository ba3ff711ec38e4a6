//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! vocabulary shared by the pure [`calculations`](super::calculations), the
//! high-level [`operations`](super::operations) and every
//! [`backend`](super::backend).
//!
//! ## Types
//!
//! - [`Dimension`]: Absolute pixels or a percentage of a source dimension.
//! - [`ResizeFlags`]: FIT / FILL / STRETCH / SHRINK_ONLY / EXACT policy bits.
//! - [`Size`]: Resolved output dimensions, always at least 1×1.
//! - [`Rect`]: A crop window clipped to the owning image's bounds.
//! - [`Quality`]: Per-format encoder quality, clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters for the metadata-aware engine.

use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

/// A requested dimension or offset.
///
/// The sign of a [`Dimension::Pixels`] value carries intent: a negative
/// resize dimension requests a mirrored result, a negative crop offset slides
/// the window off the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Pixels(i32),
    /// Percentage of the relevant source span (`50.0` is 50%).
    Percent(f64),
}

impl Dimension {
    pub fn px(value: i32) -> Self {
        Self::Pixels(value)
    }

    pub fn percent(value: f64) -> Self {
        Self::Percent(value)
    }

    /// Centre of the available span, used by EXACT's crop pass.
    pub fn center() -> Self {
        Self::Percent(50.0)
    }

    pub fn is_negative(self) -> bool {
        match self {
            Self::Pixels(px) => px < 0,
            Self::Percent(p) => p < 0.0,
        }
    }

    pub fn abs(self) -> Self {
        match self {
            Self::Pixels(px) => Self::Pixels(px.saturating_abs()),
            Self::Percent(p) => Self::Percent(p.abs()),
        }
    }
}

impl From<i32> for Dimension {
    fn from(px: i32) -> Self {
        Self::Pixels(px)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pixels(px) => write!(f, "{px}"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    /// Parses `"120"`, `"-10"`, `"50%"` or `"12.5%"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(number) = s.strip_suffix('%') {
            number
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite())
                .map(Self::Percent)
                .ok_or_else(|| format!("invalid percentage: {s:?}"))
        } else {
            s.parse::<i32>()
                .map(Self::Pixels)
                .map_err(|_| format!("invalid dimension: {s:?}"))
        }
    }
}

bitflags! {
    /// Scaling policy for [`resize`](super::operations::resize).
    ///
    /// FIT is the empty set: proportional scaling that fits inside the box.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResizeFlags: u8 {
        /// Never upscale.
        const SHRINK_ONLY = 1;
        /// Ignore aspect ratio; both dimensions are required.
        const STRETCH = 2;
        /// Cover the box, possibly overflowing one axis.
        const FILL = 4;
        /// Fill, then center-crop to the exact box.
        const EXACT = 8;
    }
}

impl ResizeFlags {
    pub const FIT: Self = Self::empty();
}

impl Default for ResizeFlags {
    fn default() -> Self {
        Self::FIT
    }
}

/// Parse a flag list such as `"fill|shrink-only"` or `"exact"`.
///
/// Accepts `|`, `,` or `+` as separators and is case-insensitive.
pub fn parse_resize_flags(s: &str) -> Result<ResizeFlags, String> {
    let mut flags = ResizeFlags::FIT;
    for name in s.split(['|', ',', '+']).map(str::trim) {
        flags |= match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "" | "fit" => ResizeFlags::FIT,
            "fill" => ResizeFlags::FILL,
            "stretch" => ResizeFlags::STRETCH,
            "exact" => ResizeFlags::EXACT,
            "shrink-only" | "shrink" => ResizeFlags::SHRINK_ONLY,
            other => return Err(format!("unknown resize flag: {other:?}")),
        };
    }
    Ok(flags)
}

/// Resolved image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Largest canvas an engine is asked to allocate (16384×16384, 1 GiB of RGBA).
pub const MAX_PIXELS: u64 = 1 << 28;

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A window inside an image. Always lies within the source bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Encoder quality, resolved per output format.
///
/// JPEG takes a 0–100 quality (default 85). PNG takes a 0–9 compression
/// level (default 9). GIF ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub const JPEG_DEFAULT: u8 = 85;
    pub const PNG_DEFAULT: u8 = 9;

    pub fn jpeg(requested: Option<i32>) -> Self {
        Self(requested.map_or(Self::JPEG_DEFAULT, |q| q.clamp(0, 100) as u8))
    }

    pub fn png(requested: Option<i32>) -> Self {
        Self(requested.map_or(Self::PNG_DEFAULT, |q| q.clamp(0, 9) as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Strength matched to the raster engine's 3×3 kernel.
    pub fn standard() -> Self {
        Self {
            sigma: 1.0,
            threshold: 0,
        }
    }
}

impl Default for Sharpening {
    fn default() -> Self {
        Self::standard()
    }
}
