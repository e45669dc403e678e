// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// Generic font families, named after CSS.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    /// Glyphs have finishing strokes, flared or tapering ends, or have actual serifed endings.
    Serif,
    /// Glyphs have stroke endings that are plain.
    SansSerif,
    /// All glyphs have the same fixed width.
    Monospace,
    /// Glyphs that look more like handwritten pen or brush writing than printed letter work.
    Cursive,
    /// Decorative fonts with playful representations of characters.
    Fantasy,
    /// Glyphs are taken from the default user interface font on a given platform.
    SystemUi,
    /// Fonts that are specifically designed to render emoji.
    Emoji,
    /// Fonts designed for mathematics.
    Math,
}

impl GenericFamily {
    /// Parses a generic family from a CSS generic family name.
    ///
    /// ```
    /// use svgtext_primitives::GenericFamily;
    ///
    /// assert_eq!(
    ///     GenericFamily::parse("sans-serif"),
    ///     Some(GenericFamily::SansSerif)
    /// );
    /// assert_eq!(GenericFamily::parse("Arial"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim() {
            "serif" => Self::Serif,
            "sans-serif" => Self::SansSerif,
            "monospace" => Self::Monospace,
            "cursive" => Self::Cursive,
            "fantasy" => Self::Fantasy,
            "system-ui" => Self::SystemUi,
            "emoji" => Self::Emoji,
            "math" => Self::Math,
            _ => return None,
        })
    }
}

impl fmt::Display for GenericFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Serif => "serif",
            Self::SansSerif => "sans-serif",
            Self::Monospace => "monospace",
            Self::Cursive => "cursive",
            Self::Fantasy => "fantasy",
            Self::SystemUi => "system-ui",
            Self::Emoji => "emoji",
            Self::Math => "math",
        })
    }
}
