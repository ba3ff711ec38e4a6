//! CLI output formatting.
//!
//! Formatting is kept apart from `main.rs` so every line the tool prints can
//! be unit tested without running the binary.
//!
//! ## Identify
//!
//! ```text
//! 640x480 JPEG (image/jpeg)
//! ```
//!
//! With `--json`:
//!
//! ```text
//! {
//!   "width": 640,
//!   "height": 480,
//!   "format": "jpeg",
//!   "mime_type": "image/jpeg",
//!   "engine": "metadata-aware"
//! }
//! ```
//!
//! ## Write
//!
//! ```text
//! out/thumb.png: 120x80 PNG
//! ```

use crate::config::EngineKind;
use crate::imaging::{Image, ImageFormat};
use serde::Serialize;
use std::path::Path;

/// What `identify` reports about an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
    pub mime_type: Option<&'static str>,
    pub engine: EngineKind,
}

impl Identity {
    pub fn of(image: &Image) -> Self {
        let format = image.source_format();
        Self {
            width: image.width(),
            height: image.height(),
            format,
            mime_type: format.map(ImageFormat::mime_type),
            engine: image.engine_kind(),
        }
    }
}

pub fn format_identify(identity: &Identity) -> String {
    match (identity.format, identity.mime_type) {
        (Some(format), Some(mime)) => {
            format!("{}x{} {format} ({mime})", identity.width, identity.height)
        }
        _ => format!("{}x{}", identity.width, identity.height),
    }
}

pub fn format_identify_json(identity: &Identity) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(identity)
}

/// One line confirming a file was written.
pub fn format_written(path: &Path, image: &Image, format: ImageFormat) -> String {
    format!(
        "{}: {}x{} {format}",
        path.display(),
        image.width(),
        image.height()
    )
}
