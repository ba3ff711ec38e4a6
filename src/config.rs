//! Engine configuration.
//!
//! Selects which engine new images are built with and tunes the
//! metadata-aware engine. The configuration is a plain value handed to the
//! [`Image`](crate::imaging::Image) constructors; nothing is stored globally.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! engine = "metadata-aware"          # or "raster"
//! preserve_metadata_on_save = true   # keep EXIF/XMP/IPTC on JPEG output
//! filter = "lanczos3"                # nearest | triangle | catmull-rom | gaussian | lanczos3
//! ```
//!
//! The colour profile is kept regardless of `preserve_metadata_on_save`.
//! Both tuning keys only affect the metadata-aware engine.
//!
//! Unknown keys are rejected to catch typos early.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Which engine backs newly created images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// Plain pixel buffer; metadata is dropped on load.
    Raster,
    /// Keeps the colour profile and, optionally, JPEG metadata.
    #[default]
    MetadataAware,
}

impl EngineKind {
    pub const ALL: [Self; 2] = [Self::Raster, Self::MetadataAware];

    pub fn name(self) -> &'static str {
        match self {
            Self::Raster => "raster",
            Self::MetadataAware => "metadata-aware",
        }
    }

    /// Whether this engine was compiled into the crate.
    pub fn is_available(self) -> bool {
        match self {
            Self::Raster => cfg!(feature = "raster"),
            Self::MetadataAware => cfg!(feature = "metadata"),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raster" | "gd" => Ok(Self::Raster),
            "metadata-aware" | "metadata" | "imagick" => Ok(Self::MetadataAware),
            other => Err(format!(
                "unknown engine {other:?}, expected \"raster\" or \"metadata-aware\""
            )),
        }
    }
}

/// Resampling filter for the metadata-aware engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResampleFilter {
    pub fn to_filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Engine configuration loaded from a TOML file.
///
/// Every field has a default; files only need the keys they override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Engine used by `Image::open`, `Image::from_bytes` and `Image::blank`.
    pub engine: EngineKind,
    /// Write EXIF/XMP/IPTC back into JPEG output (metadata-aware engine).
    pub preserve_metadata_on_save: bool,
    /// Resampling filter (metadata-aware engine).
    pub filter: ResampleFilter,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            preserve_metadata_on_save: true,
            filter: ResampleFilter::default(),
        }
    }
}

impl EngineConfig {
    /// Shorthand for the defaults with a different engine.
    pub fn with_engine(engine: EngineKind) -> Self {
        Self {
            engine,
            ..Self::default()
        }
    }

    /// Check the selected engine is compiled in.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.engine.is_available() {
            return Err(ConfigError::Validation(format!(
                "engine \"{}\" is not compiled into this build",
                self.engine
            )));
        }
        Ok(())
    }

    #[cfg(feature = "metadata")]
    pub fn metadata_settings(&self) -> crate::imaging::MetadataSettings {
        crate::imaging::MetadataSettings {
            preserve_metadata: self.preserve_metadata_on_save,
            filter: self.filter.to_filter_type(),
        }
    }
}

/// Parse a TOML string over the defaults and validate it.
pub fn parse_config(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file is an error; callers that want defaults should not pass a
/// path at all.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image engine configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Engine used for every image the tool opens or creates.
#   "metadata-aware" keeps the colour profile and JPEG metadata.
#   "raster" works on plain pixels and drops all metadata.
engine = "metadata-aware"

# Write EXIF, XMP and IPTC back into JPEG output.
# The colour profile is kept either way. Metadata-aware engine only.
preserve_metadata_on_save = true

# Resampling filter used when resizing. Metadata-aware engine only.
# One of: nearest, triangle, catmull-rom, gaussian, lanczos3
filter = "lanczos3"
"##
}
