// SPDX-License-Identifier: MIT
//
// Terminal capability detection from environment variables.
//
// No terminal querying — detection reads TERM, COLORTERM, TERM_PROGRAM,
// and NO_COLOR and nothing else. That keeps startup fast and makes the
// result fully deterministic for a given environment.

use std::env;

/// How many colors the terminal is believed to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorLevel {
    /// No color output (NO_COLOR set, or a dumb terminal).
    None,
    /// The 16 named ANSI colors.
    Basic,
    /// The 256-color palette.
    Extended,
    /// 24-bit RGB.
    TrueColor,
}

/// Detected terminal capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    colors: ColorLevel,
}

impl Capabilities {
    /// Build capabilities with an explicit color level.
    #[must_use]
    pub const fn new(colors: ColorLevel) -> Self {
        Self { colors }
    }

    /// Detect capabilities from the process environment.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_env(
            env::var("TERM").ok().as_deref(),
            env::var("COLORTERM").ok().as_deref(),
            env::var("TERM_PROGRAM").ok().as_deref(),
            env::var_os("NO_COLOR").is_some(),
        )
    }

    /// Detection with injectable inputs.
    ///
    /// NO_COLOR wins over everything. COLORTERM is the most reliable
    /// true-color signal, then known TERM_PROGRAM values, then TERM
    /// itself. Unknown terminals get basic color rather than none —
    /// almost everything alive today supports 16 colors.
    #[must_use]
    pub fn from_env(
        term: Option<&str>,
        colorterm: Option<&str>,
        term_program: Option<&str>,
        no_color: bool,
    ) -> Self {
        if no_color {
            return Self::new(ColorLevel::None);
        }

        if let Some(ct) = colorterm {
            if matches!(ct.to_lowercase().as_str(), "truecolor" | "24bit") {
                return Self::new(ColorLevel::TrueColor);
            }
        }

        if let Some(program) = term_program {
            if matches!(
                program.to_lowercase().as_str(),
                "iterm.app" | "apple_terminal" | "hyper" | "vscode"
            ) {
                return Self::new(ColorLevel::TrueColor);
            }
        }

        if let Some(term) = term {
            let term = term.to_lowercase();
            if term.contains("truecolor") || term.contains("24bit") {
                return Self::new(ColorLevel::TrueColor);
            }
            if term.contains("256color") {
                return Self::new(ColorLevel::Extended);
            }
        }

        Self::new(ColorLevel::Basic)
    }

    /// The detected color level.
    #[must_use]
    pub const fn colors(&self) -> ColorLevel {
        self.colors
    }

    /// Any color support at all.
    #[must_use]
    pub const fn color(&self) -> bool {
        !matches!(self.colors, ColorLevel::None)
    }

    /// 24-bit RGB support.
    #[must_use]
    pub const fn true_color(&self) -> bool {
        matches!(self.colors, ColorLevel::TrueColor)
    }

    /// 256-color palette support (implied by true color).
    #[must_use]
    pub const fn extended_color(&self) -> bool {
        matches!(self.colors, ColorLevel::Extended | ColorLevel::TrueColor)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
