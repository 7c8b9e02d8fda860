// SPDX-License-Identifier: MIT
//
// Terminal color model and SGR parameter encoding.
//
// Three color spaces, matching what terminals actually accept: the
// sixteen named ANSI colors (compact SGR codes 30-37 / 90-97), the
// 256-color palette (`38;5;N`), and 24-bit RGB (`38;2;R;G;B`).
// Background colors use the same scheme shifted by 10.
//
// This module only produces SGR *parameters*; the full `ESC[...m`
// sequence is assembled by `Style` and the `ansi` module.

/// The eight basic ANSI colors, their bright variants, and the
/// terminal default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    /// The terminal's configured default (SGR 39 / 49).
    Default,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

/// A terminal color in any of the supported color spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// One of the sixteen named colors or the terminal default.
    Named(NamedColor),
    /// 256-color palette index. Indices 0-15 are encoded with the
    /// compact named-color codes, 16-255 with the extended format.
    Indexed(u8),
    /// 24-bit true color.
    Rgb(u8, u8, u8),
}

impl Color {
    /// Parse a `#rrggbb` (or bare `rrggbb`) hex string.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::Rgb(r, g, b))
    }

    /// SGR parameters for this color as a foreground or background.
    ///
    /// Foreground uses bases 30 (standard) and 90 (bright); background
    /// uses 40 and 100.
    pub(crate) fn sgr_params(self, foreground: bool) -> Vec<u16> {
        let base: u16 = if foreground { 30 } else { 40 };
        let bright: u16 = if foreground { 90 } else { 100 };

        match self {
            Self::Named(named) => {
                let (offset, family) = named_offset(named);
                let block = match family {
                    Family::Standard => base,
                    Family::Bright => bright,
                };
                vec![block + offset]
            }
            Self::Indexed(idx) => match idx {
                0..=7 => vec![base + u16::from(idx)],
                8..=15 => vec![bright + u16::from(idx - 8)],
                _ => vec![base + 8, 5, u16::from(idx)],
            },
            Self::Rgb(r, g, b) => {
                vec![base + 8, 2, u16::from(r), u16::from(g), u16::from(b)]
            }
        }
    }
}

impl From<NamedColor> for Color {
    fn from(named: NamedColor) -> Self {
        Self::Named(named)
    }
}

/// Palette family a named color belongs to.
#[derive(Clone, Copy)]
enum Family {
    Standard,
    Bright,
}

/// Offset within the SGR block (0-7, or 9 for default) and the family.
const fn named_offset(named: NamedColor) -> (u16, Family) {
    match named {
        NamedColor::Black => (0, Family::Standard),
        NamedColor::Red => (1, Family::Standard),
        NamedColor::Green => (2, Family::Standard),
        NamedColor::Yellow => (3, Family::Standard),
        NamedColor::Blue => (4, Family::Standard),
        NamedColor::Magenta => (5, Family::Standard),
        NamedColor::Cyan => (6, Family::Standard),
        NamedColor::White => (7, Family::Standard),
        NamedColor::Default => (9, Family::Standard),
        NamedColor::BrightBlack => (0, Family::Bright),
        NamedColor::BrightRed => (1, Family::Bright),
        NamedColor::BrightGreen => (2, Family::Bright),
        NamedColor::BrightYellow => (3, Family::Bright),
        NamedColor::BrightBlue => (4, Family::Bright),
        NamedColor::BrightMagenta => (5, Family::Bright),
        NamedColor::BrightCyan => (6, Family::Bright),
        NamedColor::BrightWhite => (7, Family::Bright),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
