//! # Image Facade
//!
//! One editing API for JPEG, PNG and GIF images, backed by interchangeable
//! engines. Code written against [`imaging::Image`] behaves the same whichever
//! engine is selected; only output fidelity differs.
//!
//! ```text
//! caller ──► Image (fluent API) ──► operations (policy) ──► Engine ──► raster | metadata-aware
//!                                        │
//!                                        └──► calculations (pure geometry)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Geometry calculator, colour and format registry, engines, the `Image` handle |
//! | [`config`] | `EngineConfig` TOML loading and the stock config |
//! | [`output`] | CLI output formatting for `identify` and write results |
//!
//! # Design Decisions
//!
//! ## Geometry Lives Outside the Engines
//!
//! Every percentage, flag and offset is resolved by the pure functions in
//! [`imaging::calculate_size`], [`imaging::calculate_cutout`] and
//! [`imaging::calculate_placement`]. Engines receive exact pixel values and
//! only implement primitives (resample, extract, flip, composite, encode).
//! Both engines therefore produce identical dimensions for the same calls.
//!
//! ## Closed Engine Set, Chosen at Construction
//!
//! Engines are variants of [`imaging::Engine`], each behind a cargo feature
//! (`raster`, `metadata`). The variant is picked from an explicit
//! [`config::EngineConfig`] passed to `Image::open`, `Image::from_bytes` or
//! `Image::blank`; there is no global default to mutate. Anything the closed
//! capability set does not cover is reachable through `Image::native()`.
//!
//! ## Metadata Policy
//!
//! The raster engine keeps pixels only. The metadata-aware engine keeps the
//! ICC profile on every save, and writes EXIF/XMP/IPTC segments back into
//! JPEG output when `preserve_metadata_on_save` is on.

pub mod config;
pub mod imaging;
pub mod output;
