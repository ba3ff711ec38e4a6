//! RGB colour with a 7-bit transparency channel.
//!
//! Alpha follows the legacy convention used by blank-canvas fills: `0` is
//! fully opaque and `127` fully transparent. [`Color::to_rgba`] converts to
//! the 8-bit straight alpha the engines work in.

use image::Rgba;
use std::fmt;
use std::str::FromStr;

/// Maximum value of the transparency channel.
pub const ALPHA_TRANSPARENT: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// Transparency, 0 (opaque) ..= 127 (transparent).
    pub alpha: u8,
}

impl Color {
    /// Build a colour, clamping every channel into range.
    pub fn rgb(red: i32, green: i32, blue: i32, alpha: i32) -> Self {
        Self {
            red: red.clamp(0, 255) as u8,
            green: green.clamp(0, 255) as u8,
            blue: blue.clamp(0, 255) as u8,
            alpha: alpha.clamp(0, i32::from(ALPHA_TRANSPARENT)) as u8,
        }
    }

    pub fn black() -> Self {
        Self::rgb(0, 0, 0, 0)
    }

    pub fn transparent() -> Self {
        Self::rgb(0, 0, 0, i32::from(ALPHA_TRANSPARENT))
    }

    /// 8-bit RGBA with straight alpha (255 = opaque).
    pub fn to_rgba(self) -> Rgba<u8> {
        let opacity = 255.0 - (f32::from(self.alpha) * 255.0 / f32::from(ALPHA_TRANSPARENT)).round();
        Rgba([self.red, self.green, self.blue, opacity as u8])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.red, self.green, self.blue, self.alpha)
    }
}

impl FromStr for Color {
    type Err = String;

    /// Parses `"r,g,b"` or `"r,g,b,alpha"`; out-of-range values are clamped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid colour {s:?}: {e}"))?;
        match parts.as_slice() {
            [r, g, b] => Ok(Self::rgb(*r, *g, *b, 0)),
            [r, g, b, a] => Ok(Self::rgb(*r, *g, *b, *a)),
            _ => Err(format!("invalid colour {s:?}: expected r,g,b[,alpha]")),
        }
    }
}
