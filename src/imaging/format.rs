//! Output format registry and the shared codec helpers.
//!
//! | Format | MIME type | Extensions | Quality |
//! |---|---|---|---|
//! | [`ImageFormat::Jpeg`] | `image/jpeg` | `jpg`, `jpeg` | 0–100, default 85 |
//! | [`ImageFormat::Png`] | `image/png` | `png` | compression 0–9, default 9 |
//! | [`ImageFormat::Gif`] | `image/gif` | `gif` | ignored |
//!
//! Pixel codecs are delegated to the `image` crate; both engines decode and
//! encode through [`decode`] and [`encode`] so their byte streams agree.

use super::backend::BackendError;
use super::params::Quality;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// The formats every engine can decode and encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    pub const ALL: [Self; 3] = [Self::Jpeg, Self::Png, Self::Gif];

    /// Canonical MIME type, suitable for a `Content-Type` header.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    /// Every file extension mapped to this format, preferred first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::Gif => &["gif"],
        }
    }

    /// Preferred file extension.
    pub fn extension(self) -> &'static str {
        self.extensions()[0]
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.mime_type().eq_ignore_ascii_case(mime.trim()))
    }

    /// Classify a byte buffer by its magic signature.
    ///
    /// Sniffing is advisory: anything that is not JPEG, PNG or GIF yields
    /// `None` rather than an error.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Gif => image::ImageFormat::Gif,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
        })
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim().trim_start_matches('.'))
            .or_else(|| Self::from_mime_type(s))
            .ok_or_else(|| format!("unsupported image format: {s:?}"))
    }
}

/// A decoded image with what the container told us about it.
pub struct Decoded {
    pub image: DynamicImage,
    pub format: ImageFormat,
    pub icc_profile: Option<Vec<u8>>,
}

/// Decode a JPEG, PNG or GIF byte buffer.
///
/// The ICC profile is captured when the decoder exposes one; engines that do
/// not care simply drop it.
pub fn decode(bytes: &[u8]) -> Result<Decoded, BackendError> {
    let format = ImageFormat::sniff(bytes).ok_or_else(|| {
        BackendError::UnknownImageFile("not a JPEG, PNG or GIF stream".to_string())
    })?;

    let unreadable =
        |e: image::ImageError| BackendError::UnknownImageFile(format!("Failed to decode {format}: {e}"));

    let mut decoder = ImageReader::with_format(Cursor::new(bytes), format.to_image_format())
        .into_decoder()
        .map_err(unreadable)?;
    let icc_profile = decoder.icc_profile().ok().flatten();
    let image = DynamicImage::from_decoder(decoder).map_err(unreadable)?;

    Ok(Decoded {
        image,
        format,
        icc_profile,
    })
}

/// Encode `image` as `format`.
///
/// `quality` is interpreted per format (see the [module docs](self)). The ICC
/// profile is embedded when the encoder supports it; otherwise it is dropped
/// with a warning.
pub fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    quality: Option<i32>,
    icc_profile: Option<&[u8]>,
) -> Result<Vec<u8>, BackendError> {
    let failed =
        |e: image::ImageError| BackendError::ProcessingFailed(format!("{format} encode failed: {e}"));
    let mut buf = Vec::new();

    match format {
        ImageFormat::Jpeg => {
            // The encoder's floor is 1
            let quality = Quality::jpeg(quality).value().max(1);
            let rgb = image.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            attach_icc_profile(&mut encoder, icc_profile, format);
            encoder
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                .map_err(failed)?;
        }
        ImageFormat::Png => {
            let compression = match Quality::png(quality).value() {
                0..=3 => CompressionType::Fast,
                4..=6 => CompressionType::Default,
                _ => CompressionType::Best,
            };
            let rgba = image.to_rgba8();
            let mut encoder =
                PngEncoder::new_with_quality(&mut buf, compression, PngFilterType::Adaptive);
            attach_icc_profile(&mut encoder, icc_profile, format);
            encoder
                .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
                .map_err(failed)?;
        }
        ImageFormat::Gif => {
            let rgba = image.to_rgba8();
            let mut encoder = GifEncoder::new(&mut buf);
            encoder
                .encode(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
                .map_err(failed)?;
        }
    }

    Ok(buf)
}

fn attach_icc_profile<E: ImageEncoder>(encoder: &mut E, icc_profile: Option<&[u8]>, format: ImageFormat) {
    if let Some(profile) = icc_profile {
        if let Err(e) = encoder.set_icc_profile(profile.to_vec()) {
            warn!(%format, error = %e, "ICC profile dropped");
        }
    }
}
