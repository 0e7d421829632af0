//! Colors and the 256-entry palette
//!
//! Cells store a compact tagged `Color`; the palette resolving indexed
//! entries to RGB lives on the screen and is seeded from `TerminalConfig`
//! rather than any process-wide default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 24-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Color of a cell attribute: default, palette-indexed or direct RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    Default,
    /// Indexed color (0-7 standard, 8-15 bright, 16-231 cube, 232-255 gray).
    Indexed(u8),
    Rgb(Rgb),
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb(Rgb::new(r, g, b))
    }
}

/// Convert a 256-color index to RGB values using the xterm palette.
pub fn index_to_rgb(index: u8) -> Rgb {
    match index {
        0 => Rgb::new(0, 0, 0),
        1 => Rgb::new(205, 0, 0),
        2 => Rgb::new(0, 205, 0),
        3 => Rgb::new(205, 205, 0),
        4 => Rgb::new(0, 0, 238),
        5 => Rgb::new(205, 0, 205),
        6 => Rgb::new(0, 205, 205),
        7 => Rgb::new(229, 229, 229),
        8 => Rgb::new(127, 127, 127),
        9 => Rgb::new(255, 0, 0),
        10 => Rgb::new(0, 255, 0),
        11 => Rgb::new(255, 255, 0),
        12 => Rgb::new(92, 92, 255),
        13 => Rgb::new(255, 0, 255),
        14 => Rgb::new(0, 255, 255),
        15 => Rgb::new(255, 255, 255),
        // 6x6x6 cube
        16..=231 => {
            let idx = index - 16;
            let r = idx / 36;
            let g = (idx % 36) / 6;
            let b = idx % 6;
            let level = |v: u8| if v == 0 { 0 } else { 55 + v * 40 };
            Rgb::new(level(r), level(g), level(b))
        }
        // grayscale ramp
        232..=255 => {
            let gray = 8 + (index - 232) * 10;
            Rgb::new(gray, gray, gray)
        }
    }
}

/// Failure to parse a textual color specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("unrecognized color syntax: {0:?}")]
    Syntax(String),
    #[error("invalid hex digits in color: {0:?}")]
    HexDigits(String),
}

/// Parse the color forms accepted by OSC 4/10/11/12:
/// `rgb:RR/GG/BB` (1-4 hex digits per channel), `#RRGGBB` and `#RGB`.
pub fn parse_color(value: &str) -> Result<Rgb, ColorParseError> {
    fn channel(s: &str) -> Option<u8> {
        // X11 scales an n-digit channel to 16 bits; we keep the top 8.
        if s.is_empty() || s.len() > 4 {
            return None;
        }
        let v = u16::from_str_radix(s, 16).ok()?;
        let bits = 4 * s.len() as u32;
        let scaled = (u32::from(v) * 0xFFFF) / ((1u32 << bits) - 1);
        Some((scaled >> 8) as u8)
    }

    if let Some(rest) = value.strip_prefix("rgb:") {
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != 3 {
            return Err(ColorParseError::Syntax(value.to_string()));
        }
        let (r, g, b) = (channel(parts[0]), channel(parts[1]), channel(parts[2]));
        return match (r, g, b) {
            (Some(r), Some(g), Some(b)) => Ok(Rgb::new(r, g, b)),
            _ => Err(ColorParseError::HexDigits(value.to_string())),
        };
    }

    if let Some(hex) = value.strip_prefix('#') {
        let digit = |i: usize| {
            hex.get(i..i + 1)
                .and_then(|d| u8::from_str_radix(d, 16).ok())
        };
        match hex.len() {
            3 => {
                let (r, g, b) = (digit(0), digit(1), digit(2));
                return match (r, g, b) {
                    (Some(r), Some(g), Some(b)) => Ok(Rgb::new(r << 4, g << 4, b << 4)),
                    _ => Err(ColorParseError::HexDigits(value.to_string())),
                };
            }
            6 => {
                let parse = |i| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                return match (parse(0), parse(2), parse(4)) {
                    (Some(r), Some(g), Some(b)) => Ok(Rgb::new(r, g, b)),
                    _ => Err(ColorParseError::HexDigits(value.to_string())),
                };
            }
            _ => return Err(ColorParseError::Syntax(value.to_string())),
        }
    }

    Err(ColorParseError::Syntax(value.to_string()))
}

/// Format an RGB color the way xterm reports it: 16-bit channels as
/// `rgb:RRRR/GGGG/BBBB` with each 8-bit value doubled into both bytes.
pub fn format_color_report(color: Rgb) -> String {
    let wide = |v: u8| (u16::from(v) << 8) | u16::from(v);
    format!(
        "rgb:{:04x}/{:04x}/{:04x}",
        wide(color.r),
        wide(color.g),
        wide(color.b)
    )
}

/// Dynamic colors addressable via OSC 10/11/12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicColor {
    Foreground,
    Background,
    Cursor,
}

/// The screen's color palette: 256 indexed entries plus the dynamic
/// defaults. Constructed from configuration; OSC 4/104 mutate the indexed
/// entries, OSC 10-12/110-112 the dynamic ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    indexed: Vec<Rgb>,
    defaults: Vec<Rgb>,
    pub foreground: Rgb,
    pub background: Rgb,
    pub cursor: Rgb,
    default_foreground: Rgb,
    default_background: Rgb,
    default_cursor: Rgb,
}

impl Default for ColorPalette {
    fn default() -> Self {
        let mut indexed = vec![Rgb::default(); 256];
        for (i, slot) in indexed.iter_mut().enumerate() {
            *slot = index_to_rgb(i as u8);
        }
        let defaults = indexed.clone();
        let foreground = Rgb::new(229, 229, 229);
        let background = Rgb::new(0, 0, 0);
        let cursor = Rgb::new(229, 229, 229);
        Self {
            indexed,
            defaults,
            foreground,
            background,
            cursor,
            default_foreground: foreground,
            default_background: background,
            default_cursor: cursor,
        }
    }
}

impl ColorPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a palette with host-supplied defaults.
    pub fn with_defaults(foreground: Rgb, background: Rgb, cursor: Rgb) -> Self {
        let mut palette = Self::default();
        palette.foreground = foreground;
        palette.background = background;
        palette.cursor = cursor;
        palette.default_foreground = foreground;
        palette.default_background = background;
        palette.default_cursor = cursor;
        palette
    }

    pub fn indexed(&self, index: u8) -> Rgb {
        self.indexed[usize::from(index)]
    }

    pub fn set_indexed(&mut self, index: u8, color: Rgb) {
        self.indexed[usize::from(index)] = color;
    }

    /// Reset one indexed entry to its configured default.
    pub fn reset_indexed(&mut self, index: u8) {
        self.indexed[usize::from(index)] = self.defaults[usize::from(index)];
    }

    /// Reset every indexed entry.
    pub fn reset_all_indexed(&mut self) {
        self.indexed.copy_from_slice(&self.defaults);
    }

    pub fn dynamic(&self, name: DynamicColor) -> Rgb {
        match name {
            DynamicColor::Foreground => self.foreground,
            DynamicColor::Background => self.background,
            DynamicColor::Cursor => self.cursor,
        }
    }

    pub fn set_dynamic(&mut self, name: DynamicColor, color: Rgb) {
        match name {
            DynamicColor::Foreground => self.foreground = color,
            DynamicColor::Background => self.background = color,
            DynamicColor::Cursor => self.cursor = color,
        }
    }

    pub fn reset_dynamic(&mut self, name: DynamicColor) {
        match name {
            DynamicColor::Foreground => self.foreground = self.default_foreground,
            DynamicColor::Background => self.background = self.default_background,
            DynamicColor::Cursor => self.cursor = self.default_cursor,
        }
    }

    /// Resolve a cell color against this palette.
    pub fn resolve(&self, color: Color, is_foreground: bool) -> Rgb {
        match color {
            Color::Default => {
                if is_foreground {
                    self.foreground
                } else {
                    self.background
                }
            }
            Color::Indexed(i) => self.indexed(i),
            Color::Rgb(rgb) => rgb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_to_rgb_corners() {
        assert_eq!(index_to_rgb(0), Rgb::new(0, 0, 0));
        assert_eq!(index_to_rgb(15), Rgb::new(255, 255, 255));
        assert_eq!(index_to_rgb(16), Rgb::new(0, 0, 0));
        assert_eq!(index_to_rgb(196), Rgb::new(255, 0, 0));
        assert_eq!(index_to_rgb(231), Rgb::new(255, 255, 255));
        assert_eq!(index_to_rgb(232), Rgb::new(8, 8, 8));
        assert_eq!(index_to_rgb(255), Rgb::new(238, 238, 238));
    }

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("rgb:ff/00/80"), Ok(Rgb::new(255, 0, 128)));
        assert_eq!(parse_color("rgb:ffff/0000/8080"), Ok(Rgb::new(255, 0, 128)));
        assert_eq!(parse_color("#ff0080"), Ok(Rgb::new(255, 0, 128)));
        assert_eq!(parse_color("#f08"), Ok(Rgb::new(240, 0, 128)));
    }

    #[test]
    fn test_parse_color_rejects_garbage() {
        assert!(parse_color("").is_err());
        assert!(parse_color("red").is_err());
        assert!(parse_color("rgb:gg/00/00").is_err());
        assert!(parse_color("#12345").is_err());
    }

    #[test]
    fn test_format_color_report() {
        assert_eq!(format_color_report(Rgb::new(0xcd, 0, 0)), "rgb:cdcd/0000/0000");
    }

    #[test]
    fn test_palette_set_reset() {
        let mut palette = ColorPalette::new();
        palette.set_indexed(1, Rgb::new(1, 2, 3));
        assert_eq!(palette.indexed(1), Rgb::new(1, 2, 3));
        palette.reset_indexed(1);
        assert_eq!(palette.indexed(1), Rgb::new(205, 0, 0));
    }

    #[test]
    fn test_palette_dynamic_round_trip() {
        let mut palette = ColorPalette::new();
        let original = palette.dynamic(DynamicColor::Background);
        palette.set_dynamic(DynamicColor::Background, Rgb::new(9, 9, 9));
        assert_eq!(palette.dynamic(DynamicColor::Background), Rgb::new(9, 9, 9));
        palette.reset_dynamic(DynamicColor::Background);
        assert_eq!(palette.dynamic(DynamicColor::Background), original);
    }

    #[test]
    fn test_resolve() {
        let palette = ColorPalette::new();
        assert_eq!(palette.resolve(Color::Indexed(1), true), Rgb::new(205, 0, 0));
        assert_eq!(palette.resolve(Color::rgb(1, 2, 3), false), Rgb::new(1, 2, 3));
        assert_eq!(palette.resolve(Color::Default, false), palette.background);
    }
}
