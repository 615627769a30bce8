use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel depth a color was written with.
///
/// CherryTree files carry both `#rrggbb` and the GTK-style `#rrrrggggbbbb`
/// notation; the depth is kept so a color re-encodes in the form it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorDepth {
    /// Two hex digits per channel
    Eight,
    /// Four hex digits per channel
    Sixteen,
}

/// RGB color of a foreground/background span.
///
/// # Examples
///
/// ```rust
/// use cherrytree_core::common::RGBColor;
///
/// let red = RGBColor::from_hex("#ff0000").unwrap();
/// assert_eq!(red.to_hex(), "#ff0000");
///
/// let gtk = RGBColor::from_hex("#ffff00000000").unwrap();
/// assert_eq!(gtk.to_hex(), "#ffff00000000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RGBColor {
    /// Red component
    pub r: u16,
    /// Green component
    pub g: u16,
    /// Blue component
    pub b: u16,
    /// Notation the components are expressed in
    pub depth: ColorDepth,
}

impl RGBColor {
    /// Create a new 8-bit-per-channel color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as u16,
            g: g as u16,
            b: b as u16,
            depth: ColorDepth::Eight,
        }
    }

    /// Parse `#rrggbb` or `#rrrrggggbbbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let (width, depth) = match hex.len() {
            6 => (2, ColorDepth::Eight),
            12 => (4, ColorDepth::Sixteen),
            _ => return None,
        };
        if !hex.is_ascii() {
            return None;
        }

        let channel = |i: usize| u16::from_str_radix(&hex[i * width..(i + 1) * width], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(1)?,
            b: channel(2)?,
            depth,
        })
    }

    /// Convert to a lowercase hex string with `#` prefix, in the original depth.
    pub fn to_hex(&self) -> String {
        match self.depth {
            ColorDepth::Eight => format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b),
            ColorDepth::Sixteen => format!("#{:04x}{:04x}{:04x}", self.r, self.g, self.b),
        }
    }
}

impl fmt::Display for RGBColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_short() {
        let c = RGBColor::from_hex("#00FF7f").unwrap();
        assert_eq!((c.r, c.g, c.b), (0, 255, 127));
        assert_eq!(c.to_hex(), "#00ff7f");
    }

    #[test]
    fn test_from_hex_long_keeps_low_bytes() {
        let c = RGBColor::from_hex("#12345678abcd").unwrap();
        assert_eq!(c.depth, ColorDepth::Sixteen);
        assert_eq!(c.to_hex(), "#12345678abcd");
    }

    #[test]
    fn test_from_hex_rejects() {
        assert!(RGBColor::from_hex("#fff").is_none());
        assert!(RGBColor::from_hex("#gg0000").is_none());
        assert!(RGBColor::from_hex("#ééé").is_none());
    }
}
