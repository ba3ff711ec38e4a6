//! Image editing behind interchangeable engines.
//!
//! | Operation | Engine primitive |
//! |---|---|
//! | **Resize** | resample, then an optional flip pass |
//! | **Crop** | extract a clipped window |
//! | **Sharpen** | 3×3 convolution (raster) / unsharp mask (metadata-aware) |
//! | **Place** | composite at a resolved offset and opacity |
//! | **Save / send** | encode JPEG, PNG or GIF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry math (unit testable)
//! - **Parameters**: Dimensions, flags, quality, colours and formats
//! - **Backend**: [`ImageBackend`] trait + [`RasterBackend`] and [`MetadataBackend`]
//! - **Operations**: High-level functions combining calculations + backend
//! - **Engine**: [`Engine`] selection and the fluent [`Image`] handle

#[cfg(not(any(feature = "raster", feature = "metadata")))]
compile_error!("enable at least one engine feature: `raster` or `metadata`");

pub mod backend;
mod calculations;
mod color;
mod engine;
pub mod format;
#[cfg(feature = "metadata")]
pub mod metadata_backend;
pub mod operations;
mod params;
#[cfg(feature = "raster")]
pub mod raster_backend;
pub mod segments;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{GeometryError, calculate_cutout, calculate_placement, calculate_size};
pub use color::{ALPHA_TRANSPARENT, Color};
pub use engine::{Engine, Image, NativeImage, NativeImageMut};
pub use format::ImageFormat;
#[cfg(feature = "metadata")]
pub use metadata_backend::{MetadataBackend, MetadataSettings};
pub use params::{
    Dimension, MAX_PIXELS, Quality, Rect, ResizeFlags, Sharpening, Size, parse_resize_flags,
};
#[cfg(feature = "raster")]
pub use raster_backend::RasterBackend;
