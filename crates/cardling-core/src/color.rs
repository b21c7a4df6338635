//! RGB colors as used by text, strokes and backgrounds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::Background;

/// Selection highlight used when the background has no single color
pub const DEFAULT_SELECTION_COLOR: Color = Color::rgb(0x00, 0x7b, 0xff);

const SELECTION_ON_LIGHT: Color = Color::rgb(0x00, 0x56, 0xb3);
const SELECTION_ON_DARK: Color = Color::rgb(0x66, 0xb3, 0xff);

/// An sRGB color, serialized as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid color `{0}`, expected #rrggbb")]
pub struct ParseColorError(pub String);

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Relative luminance in `0.0..=1.0`
    pub fn luminance(self) -> f64 {
        (0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64) / 255.0
    }
}

/// Selection/border color that stays visible over `background`.
///
/// An unset background is the white canvas.
pub fn contrast_color(background: Option<&Background>) -> Color {
    let color = match background {
        None => Color::WHITE,
        Some(Background::Color { color }) => *color,
        Some(Background::Pattern { .. }) => return DEFAULT_SELECTION_COLOR,
    };
    if color.luminance() > 0.5 {
        SELECTION_ON_LIGHT
    } else {
        SELECTION_ON_DARK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseColorError(s.to_string()))
        };
        Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}
