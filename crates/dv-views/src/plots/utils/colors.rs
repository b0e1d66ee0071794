//! Colour utilities shared by every view

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// An sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

/// The ten-colour categorical palette
pub const CATEGORY10: [Color; 10] = [
    Color::from_rgb(0x1f, 0x77, 0xb4), // Blue
    Color::from_rgb(0xff, 0x7f, 0x0e), // Orange
    Color::from_rgb(0x2c, 0xa0, 0x2c), // Green
    Color::from_rgb(0xd6, 0x27, 0x28), // Red
    Color::from_rgb(0x94, 0x67, 0xbd), // Purple
    Color::from_rgb(0x8c, 0x56, 0x4b), // Brown
    Color::from_rgb(0xe3, 0x77, 0xc2), // Pink
    Color::from_rgb(0x7f, 0x7f, 0x7f), // Gray
    Color::from_rgb(0xbc, 0xbd, 0x22), // Olive
    Color::from_rgb(0x17, 0xbe, 0xcf), // Cyan
];

/// Get a categorical color from the palette
pub fn categorical_color(index: usize) -> Color {
    CATEGORY10[index % CATEGORY10.len()]
}

/// Ordinal scale: each new key takes the next palette colour, so an entity
/// keeps its colour across every view until the scale is reset.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct OrdinalColorScale {
    assigned: IndexMap<String, Color>,
}

impl OrdinalColorScale {
    pub fn new() -> Self {
        Self::default()
    }

    /// Colour for `key`, assigning the next one on first request
    pub fn color_for(&mut self, key: &str) -> Color {
        if let Some(color) = self.assigned.get(key) {
            return *color;
        }
        let color = categorical_color(self.assigned.len());
        self.assigned.insert(key.to_string(), color);
        color
    }

    /// Colour already assigned to `key`
    pub fn get(&self, key: &str) -> Option<Color> {
        self.assigned.get(key).copied()
    }

    /// Keys in assignment order
    pub fn domain(&self) -> impl Iterator<Item = &str> {
        self.assigned.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    pub fn reset(&mut self) {
        self.assigned.clear();
    }
}
