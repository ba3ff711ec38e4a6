//! Engine selection and the [`Image`] handle.
//!
//! [`Engine`] is a closed enum over the compiled-in engines; the variant is
//! picked from [`EngineConfig::engine`] when an image is created and never
//! changes afterwards. [`Image`] wraps an engine with the fluent editing API
//! and remembers the format the source was decoded from.
//!
//! ```no_run
//! use image_facade::config::EngineConfig;
//! use image_facade::imaging::{Dimension, Image, ResizeFlags};
//!
//! # fn main() -> Result<(), image_facade::imaging::BackendError> {
//! let config = EngineConfig::default();
//! let mut photo = Image::open("photo.jpg", &config)?;
//! photo
//!     .resize(Some(Dimension::px(800)), None, ResizeFlags::FIT)?
//!     .sharpen()?;
//! photo.save("photo-small.jpg", Some(80), None)?;
//! # Ok(())
//! # }
//! ```

use super::backend::{BackendError, ImageBackend};
use super::color::Color;
use super::format::ImageFormat;
#[cfg(feature = "metadata")]
use super::metadata_backend::MetadataBackend;
use super::operations;
use super::params::{Dimension, Rect, ResizeFlags, Size};
#[cfg(feature = "raster")]
use super::raster_backend::RasterBackend;
use crate::config::{EngineConfig, EngineKind};
#[cfg(feature = "metadata")]
use image::DynamicImage;
use image::RgbaImage;
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use tracing::debug;

type Result<T> = std::result::Result<T, BackendError>;

/// Run `$body` against whichever engine variant `$engine` holds.
macro_rules! dispatch {
    ($engine:expr, $backend:ident => $body:expr) => {
        match $engine {
            #[cfg(feature = "raster")]
            Engine::Raster($backend) => $body,
            #[cfg(feature = "metadata")]
            Engine::Metadata($backend) => $body,
        }
    };
}

/// The compiled-in engines.
#[derive(Debug, Clone)]
pub enum Engine {
    #[cfg(feature = "raster")]
    Raster(RasterBackend),
    #[cfg(feature = "metadata")]
    Metadata(MetadataBackend),
}

fn unavailable(kind: EngineKind) -> BackendError {
    BackendError::UnsupportedOperation(format!(
        "engine \"{kind}\" is not compiled into this build"
    ))
}

impl Engine {
    /// Decode `bytes` with the configured engine.
    pub fn decode(bytes: &[u8], config: &EngineConfig) -> Result<(Self, ImageFormat)> {
        match config.engine {
            #[cfg(feature = "raster")]
            EngineKind::Raster => RasterBackend::decode(bytes).map(|(b, f)| (Self::Raster(b), f)),
            #[cfg(feature = "metadata")]
            EngineKind::MetadataAware => MetadataBackend::decode(bytes, config.metadata_settings())
                .map(|(b, f)| (Self::Metadata(b), f)),
            #[allow(unreachable_patterns)]
            kind => Err(unavailable(kind)),
        }
    }

    /// A solid canvas from the configured engine.
    pub fn blank(size: Size, color: Color, config: &EngineConfig) -> Result<Self> {
        operations::check_canvas(size)?;
        match config.engine {
            #[cfg(feature = "raster")]
            EngineKind::Raster => Ok(Self::Raster(RasterBackend::blank(size, color))),
            #[cfg(feature = "metadata")]
            EngineKind::MetadataAware => Ok(Self::Metadata(MetadataBackend::blank(
                size,
                color,
                config.metadata_settings(),
            ))),
            #[allow(unreachable_patterns)]
            kind => Err(unavailable(kind)),
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            #[cfg(feature = "raster")]
            Self::Raster(_) => EngineKind::Raster,
            #[cfg(feature = "metadata")]
            Self::Metadata(_) => EngineKind::MetadataAware,
        }
    }
}

impl ImageBackend for Engine {
    fn size(&self) -> Size {
        dispatch!(self, b => b.size())
    }

    fn resample(&mut self, size: Size) -> Result<()> {
        dispatch!(self, b => b.resample(size))
    }

    fn flip(&mut self, horizontal: bool, vertical: bool) -> Result<()> {
        dispatch!(self, b => b.flip(horizontal, vertical))
    }

    fn extract(&mut self, rect: Rect) -> Result<()> {
        dispatch!(self, b => b.extract(rect))
    }

    fn sharpen(&mut self) -> Result<()> {
        dispatch!(self, b => b.sharpen())
    }

    fn composite(&mut self, overlay: &RgbaImage, left: i64, top: i64, opacity: u8) -> Result<()> {
        dispatch!(self, b => b.composite(overlay, left, top, opacity))
    }

    fn encode(&self, format: ImageFormat, quality: Option<i32>) -> Result<Vec<u8>> {
        dispatch!(self, b => b.encode(format, quality))
    }

    fn to_rgba(&self) -> Cow<'_, RgbaImage> {
        dispatch!(self, b => b.to_rgba())
    }

    fn exact_fill_flags(&self) -> ResizeFlags {
        dispatch!(self, b => b.exact_fill_flags())
    }
}

/// Borrowed view of the engine's own image object.
#[derive(Debug)]
pub enum NativeImage<'a> {
    #[cfg(feature = "raster")]
    Raster(&'a RgbaImage),
    #[cfg(feature = "metadata")]
    Metadata(&'a DynamicImage),
}

/// Mutable view of the engine's own image object.
#[derive(Debug)]
pub enum NativeImageMut<'a> {
    #[cfg(feature = "raster")]
    Raster(&'a mut RgbaImage),
    #[cfg(feature = "metadata")]
    Metadata(&'a mut DynamicImage),
}

/// One image owned by one engine.
#[derive(Debug, Clone)]
pub struct Image {
    engine: Engine,
    source_format: Option<ImageFormat>,
}

impl Image {
    /// Open a JPEG, PNG or GIF file.
    ///
    /// # Errors
    /// - [`BackendError::Io`] if the file cannot be read.
    /// - [`BackendError::UnknownImageFile`] if it is not a decodable JPEG, PNG or GIF.
    /// - [`BackendError::UnsupportedOperation`] if the configured engine is compiled out.
    pub fn open(path: impl AsRef<Path>, config: &EngineConfig) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, config).map_err(|e| match e {
            BackendError::UnknownImageFile(msg) => {
                BackendError::UnknownImageFile(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Decode an in-memory JPEG, PNG or GIF stream.
    pub fn from_bytes(bytes: &[u8], config: &EngineConfig) -> Result<Self> {
        let (engine, format) = Engine::decode(bytes, config)?;
        debug!(engine = %engine.kind(), %format, size = %engine.size(), "decoded image");
        Ok(Self {
            engine,
            source_format: Some(format),
        })
    }

    /// A `width`×`height` canvas filled with `color` (opaque black if `None`).
    ///
    /// # Errors
    /// [`BackendError::InvalidArgument`] if either dimension is below 1 or
    /// the canvas exceeds [`MAX_PIXELS`](super::params::MAX_PIXELS).
    pub fn blank(
        width: i64,
        height: i64,
        color: Option<Color>,
        config: &EngineConfig,
    ) -> Result<Self> {
        if width < 1 || height < 1 {
            return Err(BackendError::InvalidArgument(
                "Image width and height must be greater than zero.".to_string(),
            ));
        }
        let too_large =
            |_| BackendError::InvalidArgument(format!("Image size {width}x{height} is too large."));
        let size = Size::new(
            u32::try_from(width).map_err(too_large)?,
            u32::try_from(height).map_err(too_large)?,
        );
        let engine = Engine::blank(size, color.unwrap_or_else(Color::black), config)?;
        Ok(Self::from_engine(engine))
    }

    /// Wrap an already built engine.
    pub fn from_engine(engine: Engine) -> Self {
        Self {
            engine,
            source_format: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.engine.size().width
    }

    pub fn height(&self) -> u32 {
        self.engine.size().height
    }

    pub fn size(&self) -> Size {
        self.engine.size()
    }

    /// Format the image was decoded from; `None` for blank canvases.
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.engine.kind()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Resize; see [`operations::resize`] for flag semantics.
    pub fn resize(
        &mut self,
        width: Option<Dimension>,
        height: Option<Dimension>,
        flags: ResizeFlags,
    ) -> Result<&mut Self> {
        operations::resize(&mut self.engine, width, height, flags)?;
        Ok(self)
    }

    /// Crop to a window; offsets and sizes may be pixels or percentages.
    pub fn crop(
        &mut self,
        left: impl Into<Dimension>,
        top: impl Into<Dimension>,
        width: impl Into<Dimension>,
        height: impl Into<Dimension>,
    ) -> Result<&mut Self> {
        operations::crop(
            &mut self.engine,
            left.into(),
            top.into(),
            width.into(),
            height.into(),
        )?;
        Ok(self)
    }

    pub fn sharpen(&mut self) -> Result<&mut Self> {
        operations::sharpen(&mut self.engine)?;
        Ok(self)
    }

    /// Mirror along the requested axes.
    pub fn flip(&mut self, horizontal: bool, vertical: bool) -> Result<&mut Self> {
        if horizontal || vertical {
            self.engine.flip(horizontal, vertical)?;
        }
        Ok(self)
    }

    /// Draw `other` on top of this image.
    ///
    /// Percentage offsets are relative to the free space, so `50%` centres.
    /// `opacity` is clamped to 0..=100.
    pub fn place(
        &mut self,
        other: &Image,
        left: impl Into<Dimension>,
        top: impl Into<Dimension>,
        opacity: i32,
    ) -> Result<&mut Self> {
        let overlay = other.engine.to_rgba();
        operations::place(&mut self.engine, &overlay, left.into(), top.into(), opacity)?;
        Ok(self)
    }

    /// Write to `path`; the format comes from `format` or the extension.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        quality: Option<i32>,
        format: Option<ImageFormat>,
    ) -> Result<()> {
        operations::save(&self.engine, path.as_ref(), quality, format)
    }

    pub fn to_bytes(&self, format: ImageFormat, quality: Option<i32>) -> Result<Vec<u8>> {
        operations::to_bytes(&self.engine, format, quality)
    }

    /// Write the encoded image to `out`; returns its MIME type.
    pub fn send<W: Write + ?Sized>(
        &self,
        out: &mut W,
        format: ImageFormat,
        quality: Option<i32>,
    ) -> Result<&'static str> {
        operations::send(&self.engine, out, format, quality)
    }

    /// The engine's underlying image object.
    pub fn native(&self) -> NativeImage<'_> {
        match &self.engine {
            #[cfg(feature = "raster")]
            Engine::Raster(b) => NativeImage::Raster(b.pixels()),
            #[cfg(feature = "metadata")]
            Engine::Metadata(b) => NativeImage::Metadata(b.image()),
        }
    }

    /// Mutable access to the engine's underlying image object.
    pub fn native_mut(&mut self) -> NativeImageMut<'_> {
        match &mut self.engine {
            #[cfg(feature = "raster")]
            Engine::Raster(b) => NativeImageMut::Raster(b.pixels_mut()),
            #[cfg(feature = "metadata")]
            Engine::Metadata(b) => NativeImageMut::Metadata(b.image_mut()),
        }
    }
}
