//! Per-vertex color filters

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{emit, FilterXml};
use crate::error::{MeshScriptError, Result};
use crate::layers::LayerEffect;
use crate::script::FilterSink;

/// RGBA color, 0-255 per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("lime", [0, 255, 0]),
    ("green", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("silver", [192, 192, 192]),
    ("gray", [128, 128, 128]),
    ("maroon", [128, 0, 0]),
    ("olive", [128, 128, 0]),
    ("purple", [128, 0, 128]),
    ("teal", [0, 128, 128]),
    ("navy", [0, 0, 128]),
    ("orange", [255, 165, 0]),
    ("gold", [255, 215, 0]),
    ("brown", [165, 42, 42]),
    ("pink", [255, 192, 203]),
];

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from a basic color name (case-insensitive)
    pub fn named(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, [r, g, b])| Color::rgb(*r, *g, *b))
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = MeshScriptError;

    /// Accepts a color name, `#rrggbb` or `#rrggbbaa`
    fn from_str(s: &str) -> Result<Self> {
        if let Some(color) = Color::named(s) {
            return Ok(color);
        }
        let invalid = || MeshScriptError::InvalidParameter {
            filter: "color".to_string(),
            reason: format!("'{}' is not a color name or #rrggbb[aa] value", s),
        };
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

/// Per-vertex color from muparser expressions, one per channel (0-255)
///
/// Expressions may use the vertex variables `x, y, z`, `nx, ny, nz`,
/// `r, g, b, a`, `q`, `rad`, `vi`, `vtu, vtv, ti` and `vsel`.
pub fn color_function(
    sink: &mut impl FilterSink,
    red: &str,
    green: &str,
    blue: &str,
    alpha: &str,
) -> Result<()> {
    let filter = FilterXml::new("Per Vertex Color Function")
        .string("x", "func r = ", red)
        .tooltip("Function to generate Red component. Expected Range 0-255")
        .string("y", "func g = ", green)
        .tooltip("Function to generate Green component. Expected Range 0-255")
        .string("z", "func b = ", blue)
        .tooltip("Function to generate Blue component. Expected Range 0-255")
        .string("a", "func alpha = ", alpha)
        .tooltip("Function to generate Alpha component. Expected Range 0-255");
    emit(sink, filter, LayerEffect::None)
}

/// Paint every vertex of the current layer one color
pub fn uniform_color(sink: &mut impl FilterSink, color: Color) -> Result<()> {
    color_function(
        sink,
        &color.r.to_string(),
        &color.g.to_string(),
        &color.b.to_string(),
        &color.a.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        assert_eq!("Silver".parse::<Color>().unwrap(), Color::rgb(192, 192, 192));
        assert_eq!("#ff000080".parse::<Color>().unwrap(), Color::rgba(255, 0, 0, 128));
        assert_eq!("#0000ff".parse::<Color>().unwrap(), Color::rgb(0, 0, 255));
        assert!("chartreuse-ish".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
    }

    #[test]
    fn test_uniform_color_fragment() {
        let mut script = crate::script::Script::builder().mesh("m.ply").build().unwrap();
        uniform_color(&mut script, Color::rgb(255, 0, 0)).unwrap();
        let fragment = script.records()[0].fragment();
        assert!(fragment.contains("name=\"x\" value=\"255\" description=\"func r = \""));
        assert!(fragment.contains("name=\"y\" value=\"0\""));
        assert!(fragment.contains("name=\"a\" value=\"255\""));
    }
}
