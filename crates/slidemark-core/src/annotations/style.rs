//! Pen settings carried by each annotation.

use crate::error::SchemaError;
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Format as `#RRGGBB` (alpha dropped, as in saved documents).
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#RRGGBB` or `#AARRGGBB`.
    pub fn from_hex(hex: &str) -> Result<Self, SchemaError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let byte = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| SchemaError::BadColor(hex.to_string()))
        };
        match digits.len() {
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::new(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
            _ => Err(SchemaError::BadColor(hex.to_string())),
        }
    }

    pub fn to_rgba_u8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Color, line thickness and font size of one annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenStyle {
    pub color: SerializableColor,
    /// Line thickness in image pixels.
    pub thickness: u32,
    /// Font size in points.
    pub font_size: u32,
}

impl PenStyle {
    /// Get the color as a peniko Color.
    pub fn color(&self) -> Color {
        self.color.into()
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_thickness(mut self, thickness: u32) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn with_font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::rgb(0xff, 0x00, 0x00),
            thickness: 4,
            font_size: 14,
        }
    }
}
