// SPDX-License-Identifier: MIT
//
// Reusable text styles.
//
// A `Style` bundles foreground/background colors with text attributes
// and knows how to render itself as a single SGR sequence. Attribute
// codes come first, then foreground, then background, all semicolon
// joined: bold blue text is `ESC[1;34m`, never two sequences.
//
// Styles are plain values — build them once, reuse them everywhere.

use std::fmt;

use bitflags::bitflags;

use crate::color::Color;

bitflags! {
    /// Text attribute flags, each mapping to one SGR code.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        const BOLD          = 0b0000_0001;
        const DIM           = 0b0000_0010;
        const ITALIC        = 0b0000_0100;
        const UNDERLINE     = 0b0000_1000;
        const BLINK         = 0b0001_0000;
        const REVERSE       = 0b0010_0000;
        const HIDDEN        = 0b0100_0000;
        const STRIKETHROUGH = 0b1000_0000;
    }
}

/// SGR code for each attribute flag, in emission order.
const ATTR_CODES: [(Attr, u16); 8] = [
    (Attr::BOLD, 1),
    (Attr::DIM, 2),
    (Attr::ITALIC, 3),
    (Attr::UNDERLINE, 4),
    (Attr::BLINK, 5),
    (Attr::REVERSE, 7),
    (Attr::HIDDEN, 8),
    (Attr::STRIKETHROUGH, 9),
];

/// A text style: optional colors plus attribute flags.
///
/// # Example
///
/// ```
/// use vtio::{Color, NamedColor, Style};
///
/// let alert = Style::new().fg(Color::Named(NamedColor::Red)).bold();
/// assert_eq!(alert.wrap("boom"), "\x1b[1;31mboom\x1b[0m");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    fg: Option<Color>,
    bg: Option<Color>,
    attrs: Attr,
}

impl Style {
    /// An empty style: no colors, no attributes.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            attrs: Attr::empty(),
        }
    }

    /// Set the foreground color.
    #[must_use]
    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    /// Set the background color.
    #[must_use]
    pub const fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Add attribute flags to the style.
    #[must_use]
    pub fn attrs(mut self, attrs: Attr) -> Self {
        self.attrs |= attrs;
        self
    }

    #[must_use]
    pub fn bold(self) -> Self {
        self.attrs(Attr::BOLD)
    }

    #[must_use]
    pub fn dim(self) -> Self {
        self.attrs(Attr::DIM)
    }

    #[must_use]
    pub fn italic(self) -> Self {
        self.attrs(Attr::ITALIC)
    }

    #[must_use]
    pub fn underline(self) -> Self {
        self.attrs(Attr::UNDERLINE)
    }

    #[must_use]
    pub fn blink(self) -> Self {
        self.attrs(Attr::BLINK)
    }

    #[must_use]
    pub fn reverse(self) -> Self {
        self.attrs(Attr::REVERSE)
    }

    #[must_use]
    pub fn hidden(self) -> Self {
        self.attrs(Attr::HIDDEN)
    }

    #[must_use]
    pub fn strikethrough(self) -> Self {
        self.attrs(Attr::STRIKETHROUGH)
    }

    /// Overlay `other` on top of this style: colors set in `other` win,
    /// attribute flags are combined.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            attrs: self.attrs | other.attrs,
        }
    }

    /// Whether the style sets anything at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attrs.is_empty()
    }

    /// Wrap `text` in this style's SGR sequence and a reset.
    ///
    /// An empty style returns the text unchanged — no stray reset.
    #[must_use]
    pub fn wrap(&self, text: &str) -> String {
        if self.is_empty() {
            return text.to_owned();
        }
        format!("{self}{text}\x1b[0m")
    }

    /// All SGR parameters: attributes, then foreground, then background.
    pub(crate) fn sgr_params(&self) -> Vec<u16> {
        let mut params = Vec::new();
        for (flag, code) in ATTR_CODES {
            if self.attrs.contains(flag) {
                params.push(code);
            }
        }
        if let Some(fg) = self.fg {
            params.extend(fg.sgr_params(true));
        }
        if let Some(bg) = self.bg {
            params.extend(bg.sgr_params(false));
        }
        params
    }
}

impl fmt::Display for Style {
    /// The style's SGR sequence, or nothing when the style is empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.sgr_params();
        if params.is_empty() {
            return Ok(());
        }
        write!(f, "\x1b[")?;
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, "m")
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
