// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fonts: keys, metrics backends and the character table.
//!
//! A [`FontKey`] names a font by the four properties that select it. The *nominal* key of
//! some text is read from its style; the *true* key is the font the font matcher actually
//! picks, which differs when the requested family is missing or lacks a glyph. A
//! [`FontBackend`] answers matching and metrics queries, and a [`CharacterTable`] caches
//! every answer the layout engine needs for one document.

mod table;

#[cfg(feature = "system")]
mod system;

use core::fmt;

use hashbrown::{HashMap, HashSet};
use svgtext_primitives::{FamilyList, FamilyName, FontStyle, FontWeight, FontWidth, GenericFamily};

use crate::dom::Style;

pub use table::{CProp, CharacterTable, Measurement};

#[cfg(feature = "system")]
pub use system::SystemFonts;

/// The properties that select a font face.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontKey {
    /// The family fallback list.
    pub family: FamilyList,
    /// The weight.
    pub weight: FontWeight,
    /// The slant.
    pub style: FontStyle,
    /// The width.
    pub width: FontWidth,
}

/// The style properties a [`FontKey`] is built from.
pub const FONT_PROPERTIES: [&str; 4] = ["font-family", "font-weight", "font-style", "font-stretch"];

impl FontKey {
    /// Creates a key.
    pub fn new(family: FamilyList, weight: FontWeight, style: FontStyle, width: FontWidth) -> Self {
        Self {
            family,
            weight,
            style,
            width,
        }
    }

    /// The nominal font of a style. Missing or invalid values take their CSS defaults,
    /// and the default family is `sans-serif`.
    ///
    /// ```
    /// use svgtext::dom::Style;
    /// use svgtext::font::FontKey;
    ///
    /// let key = FontKey::from_style(&Style::parse("font-family:Arial;font-weight:bold"));
    /// assert_eq!(
    ///     key.to_string(),
    ///     "font-family:'Arial';font-weight:bold;font-style:normal;font-stretch:normal"
    /// );
    /// ```
    pub fn from_style(sty: &Style) -> Self {
        let family = sty
            .get("font-family")
            .map(FamilyList::parse)
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| FamilyList::single(FamilyName::Generic(GenericFamily::SansSerif)));
        Self {
            family,
            weight: sty.get("font-weight").and_then(FontWeight::parse).unwrap_or_default(),
            style: sty.get("font-style").and_then(FontStyle::parse).unwrap_or_default(),
            width: sty.get("font-stretch").and_then(FontWidth::parse).unwrap_or_default(),
        }
    }

    /// The key as the four CSS properties.
    pub fn to_style(&self) -> Style {
        let mut sty = Style::new();
        sty.set("font-family", self.family.to_css());
        sty.set("font-weight", self.weight.to_string());
        sty.set("font-style", self.style.to_string());
        sty.set("font-stretch", self.width.to_string());
        sty
    }

    /// The first family in the list.
    pub fn primary_family(&self) -> Option<&FamilyName> {
        self.family.families().first()
    }
}

impl fmt::Display for FontKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_style())
    }
}

/// Vertical metrics of a font, per em.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontMetrics {
    /// Ascent, normalized so that ascent and descent sum to one.
    pub ascent: f64,
    /// Descent, normalized so that ascent and descent sum to one.
    pub descent: f64,
    /// Height of flat capitals above the baseline.
    pub cap_height: f64,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            ascent: 0.8,
            descent: 0.2,
            cap_height: 1.0,
        }
    }
}

/// Per-glyph metrics of one font, per em.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphMetrics {
    /// Horizontal advance of each character.
    pub advances: HashMap<char, f64>,
    /// Ink box of each character as `[x, y, width, height]`, with `y` the top of the ink
    /// measured downwards from the baseline.
    pub ink: HashMap<char, [f64; 4]>,
    /// Advance correction when the second character follows the first, relative to the sum
    /// of their advances: a ligature's advance change, or else the kerning value.
    pub pair_deltas: HashMap<(char, char), f64>,
    /// Cap height of the font.
    pub cap_height: f64,
}

/// The logical advance and ink box of a shaped string, per em.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StringMetrics {
    /// Total advance.
    pub advance: f64,
    /// Ink box as `[x, y, width, height]`, `y` measured downwards from the baseline.
    pub ink: [f64; 4],
}

/// A source of font matching and metrics.
pub trait FontBackend: fmt::Debug {
    /// The font the matcher picks for a nominal font, or `None` if no font matches.
    fn true_font(&mut self, nominal: &FontKey) -> Option<FontKey>;

    /// The font each character is drawn with, falling back through the system's fonts
    /// for characters the true font lacks. `None` marks characters no font covers.
    fn true_fonts_by_char(
        &mut self,
        nominal: &FontKey,
        chars: &[char],
    ) -> HashMap<char, Option<FontKey>>;

    /// Vertical metrics of a true font.
    fn font_metrics(&mut self, font: &FontKey) -> FontMetrics;

    /// Advances, ink boxes and pair deltas of `chars` in a true font.
    ///
    /// `preceding[c]` lists the characters whose pair delta with `c` following is needed.
    /// Returns `None` if the font's tables cannot be read.
    fn glyph_metrics(
        &mut self,
        font: &FontKey,
        chars: &[char],
        preceding: &HashMap<char, HashSet<char>>,
    ) -> Option<GlyphMetrics>;

    /// Returns `true` if the true font has a glyph for `ch`.
    fn covers(&mut self, font: &FontKey, ch: char) -> bool;

    /// The full face name of a true font, such as `Arial Bold`.
    fn full_name(&mut self, font: &FontKey) -> Option<String> {
        let _ = font;
        None
    }

    /// Shapes each string in a true font and measures it.
    ///
    /// Backends without a shaping engine return `None`, and the character table falls back
    /// to [`FontBackend::glyph_metrics`].
    fn measure_strings(
        &mut self,
        font: &FontKey,
        strings: &[String],
    ) -> Option<Vec<StringMetrics>> {
        let _ = (font, strings);
        None
    }
}

impl<B: FontBackend + ?Sized> FontBackend for Box<B> {
    fn true_font(&mut self, nominal: &FontKey) -> Option<FontKey> {
        (**self).true_font(nominal)
    }

    fn true_fonts_by_char(
        &mut self,
        nominal: &FontKey,
        chars: &[char],
    ) -> HashMap<char, Option<FontKey>> {
        (**self).true_fonts_by_char(nominal, chars)
    }

    fn font_metrics(&mut self, font: &FontKey) -> FontMetrics {
        (**self).font_metrics(font)
    }

    fn glyph_metrics(
        &mut self,
        font: &FontKey,
        chars: &[char],
        preceding: &HashMap<char, HashSet<char>>,
    ) -> Option<GlyphMetrics> {
        (**self).glyph_metrics(font, chars, preceding)
    }

    fn covers(&mut self, font: &FontKey, ch: char) -> bool {
        (**self).covers(font, ch)
    }

    fn full_name(&mut self, font: &FontKey) -> Option<String> {
        (**self).full_name(font)
    }

    fn measure_strings(
        &mut self,
        font: &FontKey,
        strings: &[String],
    ) -> Option<Vec<StringMetrics>> {
        (**self).measure_strings(font, strings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_from_styles() {
        let a = FontKey::from_style(&Style::parse(
            "font-family:\"DejaVu Sans\", serif;font-weight:700",
        ));
        let b = FontKey::from_style(&Style::parse(
            "font-family:'DejaVu Sans',serif;font-weight:bold",
        ));
        assert_eq!(a, b);
        assert_eq!(a.family.to_css(), "'DejaVu Sans','serif'");
        let d = FontKey::from_style(&Style::parse("font-weight:bolder;font-style:oblique 5deg"));
        assert_eq!(d.weight, FontWeight::NORMAL);
        assert_eq!(d.style, FontStyle::Oblique);
        assert_eq!(d.family.to_css(), "'sans-serif'");
    }

    #[test]
    fn key_round_trips_through_style() {
        let key = FontKey::new(
            FamilyList::parse("Fixed"),
            FontWeight::BOLD,
            FontStyle::Italic,
            FontWidth::CONDENSED,
        );
        assert_eq!(FontKey::from_style(&key.to_style()), key);
    }
}
