//! Metadata-aware engine: keeps colour profile and descriptive metadata.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode | [`format::decode`](super::format::decode) + [`segments`](super::segments) walker |
//! | Resample | `DynamicImage::resize_exact` with the configured filter |
//! | Flip | `DynamicImage::fliph` / `flipv` |
//! | Extract | `DynamicImage::crop_imm` |
//! | Sharpen | `DynamicImage::unsharpen` (σ 1.0, threshold 0) |
//! | Composite | overlay alpha scaled by opacity, then `imageops::overlay` |
//! | Encode | [`format::encode`](super::format::encode) with the ICC profile |
//!
//! The ICC profile always survives a save. EXIF, XMP, IPTC and comment
//! segments from a JPEG source are written back into JPEG output only when
//! `preserve_metadata` is on.

use super::backend::{BackendError, ImageBackend};
use super::color::Color;
use super::format::{self, ImageFormat};
use super::params::{Rect, ResizeFlags, Sharpening, Size};
use super::segments::{MetadataSegment, insert_metadata_segments, read_metadata_segments};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::borrow::Cow;
use tracing::debug;

/// Per-engine knobs taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetadataSettings {
    pub preserve_metadata: bool,
    pub filter: FilterType,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            preserve_metadata: true,
            filter: FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataBackend {
    image: DynamicImage,
    icc_profile: Option<Vec<u8>>,
    segments: Vec<MetadataSegment>,
    settings: MetadataSettings,
}

impl MetadataBackend {
    pub fn new(image: DynamicImage, settings: MetadataSettings) -> Self {
        Self {
            image,
            icc_profile: None,
            segments: Vec::new(),
            settings,
        }
    }

    /// Decode bytes, capturing the colour profile and JPEG metadata segments.
    pub fn decode(
        bytes: &[u8],
        settings: MetadataSettings,
    ) -> Result<(Self, ImageFormat), BackendError> {
        let decoded = format::decode(bytes)?;
        let segments = match decoded.format {
            ImageFormat::Jpeg => read_metadata_segments(bytes),
            _ => Vec::new(),
        };
        debug!(
            format = %decoded.format,
            icc = decoded.icc_profile.is_some(),
            segments = segments.len(),
            "decoded with metadata"
        );
        let backend = Self {
            image: decoded.image,
            icc_profile: decoded.icc_profile,
            segments,
            settings,
        };
        Ok((backend, decoded.format))
    }

    pub fn blank(size: Size, color: Color, settings: MetadataSettings) -> Self {
        let canvas = RgbaImage::from_pixel(size.width, size.height, color.to_rgba());
        Self::new(DynamicImage::ImageRgba8(canvas), settings)
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut DynamicImage {
        &mut self.image
    }

    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.icc_profile.as_deref()
    }

    pub fn set_icc_profile(&mut self, profile: Option<Vec<u8>>) {
        self.icc_profile = profile;
    }

    pub fn segments(&self) -> &[MetadataSegment] {
        &self.segments
    }

    pub fn settings(&self) -> MetadataSettings {
        self.settings
    }

    pub fn set_preserve_metadata(&mut self, preserve: bool) {
        self.settings.preserve_metadata = preserve;
    }
}

impl ImageBackend for MetadataBackend {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    fn resample(&mut self, size: Size) -> Result<(), BackendError> {
        self.image = self
            .image
            .resize_exact(size.width, size.height, self.settings.filter);
        Ok(())
    }

    fn flip(&mut self, horizontal: bool, vertical: bool) -> Result<(), BackendError> {
        if horizontal {
            self.image = self.image.fliph();
        }
        if vertical {
            self.image = self.image.flipv();
        }
        Ok(())
    }

    fn extract(&mut self, rect: Rect) -> Result<(), BackendError> {
        self.image = self
            .image
            .crop_imm(rect.left, rect.top, rect.width, rect.height);
        Ok(())
    }

    fn sharpen(&mut self) -> Result<(), BackendError> {
        let Sharpening { sigma, threshold } = Sharpening::standard();
        self.image = self.image.unsharpen(sigma, threshold);
        Ok(())
    }

    fn composite(
        &mut self,
        overlay: &RgbaImage,
        left: i64,
        top: i64,
        opacity: u8,
    ) -> Result<(), BackendError> {
        let mut base = self.image.to_rgba8();
        if opacity >= 100 {
            imageops::overlay(&mut base, overlay, left, top);
        } else {
            let mut faded = overlay.clone();
            for pixel in faded.pixels_mut() {
                pixel.0[3] = (u16::from(pixel.0[3]) * u16::from(opacity) / 100) as u8;
            }
            imageops::overlay(&mut base, &faded, left, top);
        }
        self.image = DynamicImage::ImageRgba8(base);
        Ok(())
    }

    fn encode(&self, format: ImageFormat, quality: Option<i32>) -> Result<Vec<u8>, BackendError> {
        let bytes = format::encode(&self.image, format, quality, self.icc_profile())?;
        if format == ImageFormat::Jpeg && self.settings.preserve_metadata && !self.segments.is_empty() {
            debug!(segments = self.segments.len(), "re-inserting JPEG metadata");
            return Ok(insert_metadata_segments(&bytes, &self.segments));
        }
        Ok(bytes)
    }

    fn to_rgba(&self) -> Cow<'_, RgbaImage> {
        match &self.image {
            DynamicImage::ImageRgba8(buf) => Cow::Borrowed(buf),
            other => Cow::Owned(other.to_rgba8()),
        }
    }

    fn exact_fill_flags(&self) -> ResizeFlags {
        ResizeFlags::FILL | ResizeFlags::SHRINK_ONLY
    }
}
