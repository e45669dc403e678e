// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic font backend for tests.
//!
//! [`FixedFonts`] makes up metrics instead of reading installed fonts, so layouts computed
//! with it are the same on every machine.

use hashbrown::{HashMap, HashSet};
use svgtext_primitives::{FamilyList, FamilyName, FontStyle, FontWeight};

use crate::font::{FontBackend, FontKey, FontMetrics, GlyphMetrics, StringMetrics};

/// The family that covers the characters registered with [`FixedFonts::with_fallback`].
pub const FALLBACK_FAMILY: &str = "Fallback";

/// A font backend with synthetic metrics.
///
/// Every family it knows draws characters with the same advances (see
/// [`FixedFonts::advance`]), scaled by the font's width. Any nominal font matches the
/// first family of its list the backend knows, or else the backend's first family.
///
/// Pairs registered with [`FixedFonts::with_kerning`] change the advance of the second
/// character; no ligatures form. Ink boxes are 90% of the advance wide and reach from
/// the baseline up to the cap height.
#[derive(Clone, Debug)]
pub struct FixedFonts {
    families: Vec<String>,
    advances: HashMap<char, f64>,
    kerning: HashMap<(char, char), f64>,
    fallback: HashSet<char>,
    missing: HashSet<char>,
    shaping: bool,
    metrics: FontMetrics,
}

impl Default for FixedFonts {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedFonts {
    /// Creates a backend with the single family `Fixed`.
    pub fn new() -> Self {
        Self {
            families: vec!["Fixed".to_owned()],
            advances: HashMap::new(),
            kerning: HashMap::new(),
            fallback: HashSet::new(),
            missing: HashSet::new(),
            shaping: true,
            metrics: FontMetrics {
                ascent: 0.8,
                descent: 0.2,
                cap_height: 0.7,
            },
        }
    }

    /// Adds a family name the backend matches.
    pub fn with_family(mut self, name: &str) -> Self {
        self.families.push(name.to_owned());
        self
    }

    /// Overrides the advance of a character, per em.
    pub fn with_advance(mut self, ch: char, advance: f64) -> Self {
        self.advances.insert(ch, advance);
        self
    }

    /// Adds a kerning pair: `right` moves by `delta` em when it follows `left`.
    pub fn with_kerning(mut self, left: char, right: char, delta: f64) -> Self {
        self.kerning.insert((left, right), delta);
        self
    }

    /// Makes `ch` drawn by the [`FALLBACK_FAMILY`] instead of the requested font.
    pub fn with_fallback(mut self, ch: char) -> Self {
        self.fallback.insert(ch);
        self
    }

    /// Makes `ch` covered by no font at all.
    pub fn with_missing(mut self, ch: char) -> Self {
        self.missing.insert(ch);
        self
    }

    /// Disables [`FontBackend::measure_strings`], so that character tables read glyph
    /// metrics instead.
    pub fn without_shaping(mut self) -> Self {
        self.shaping = false;
        self
    }

    /// The advance of a character at width `normal`, per em.
    pub fn advance(&self, ch: char) -> f64 {
        if let Some(&adv) = self.advances.get(&ch) {
            return adv;
        }
        match ch {
            ' ' | '\u{a0}' => 0.25,
            'i' | 'l' | 'j' | '.' | ',' | '\'' | '!' | '|' | 'I' => 0.3,
            'W' | 'M' | 'm' | 'w' => 0.9,
            '0'..='9' => 0.55,
            c if c.is_ascii_uppercase() => 0.7,
            c if c.is_ascii_lowercase() => 0.5,
            '\n' | '\r' | '\t' => 0.,
            _ => 0.6,
        }
    }

    fn font_advance(&self, font: &FontKey, ch: char) -> f64 {
        self.advance(ch) * f64::from(font.width.ratio())
    }

    fn ink(&self, font: &FontKey, ch: char) -> [f64; 4] {
        if ch.is_whitespace() {
            return [0.; 4];
        }
        let adv = self.font_advance(font, ch);
        let cap = self.metrics.cap_height;
        [0.05 * adv, -cap, 0.9 * adv, cap]
    }

    fn family_of(&self, font: &FontKey) -> Option<String> {
        match font.primary_family() {
            Some(FamilyName::Named(name)) => Some(name.clone()),
            _ => None,
        }
    }

    fn with_family_of(font: &FontKey, family: &str) -> FontKey {
        FontKey::new(
            FamilyList::single(FamilyName::Named(family.to_owned())),
            font.weight,
            font.style,
            font.width,
        )
    }
}

impl FontBackend for FixedFonts {
    fn true_font(&mut self, nominal: &FontKey) -> Option<FontKey> {
        let family = nominal
            .family
            .families()
            .iter()
            .find_map(|f| match f {
                FamilyName::Named(name) => self
                    .families
                    .iter()
                    .find(|known| known.eq_ignore_ascii_case(name))
                    .cloned(),
                FamilyName::Generic(_) => None,
            })
            .or_else(|| self.families.first().cloned())?;
        Some(Self::with_family_of(nominal, &family))
    }

    fn true_fonts_by_char(
        &mut self,
        nominal: &FontKey,
        chars: &[char],
    ) -> HashMap<char, Option<FontKey>> {
        let font = self.true_font(nominal);
        chars
            .iter()
            .map(|&c| {
                let f = if self.missing.contains(&c) {
                    None
                } else if self.fallback.contains(&c) {
                    Some(Self::with_family_of(nominal, FALLBACK_FAMILY))
                } else {
                    font.clone()
                };
                (c, f)
            })
            .collect()
    }

    fn font_metrics(&mut self, _font: &FontKey) -> FontMetrics {
        self.metrics
    }

    fn glyph_metrics(
        &mut self,
        font: &FontKey,
        chars: &[char],
        preceding: &HashMap<char, HashSet<char>>,
    ) -> Option<GlyphMetrics> {
        let mut gm = GlyphMetrics {
            cap_height: self.metrics.cap_height,
            ..GlyphMetrics::default()
        };
        for &c in chars {
            gm.advances.insert(c, self.font_advance(font, c));
            gm.ink.insert(c, self.ink(font, c));
        }
        for (&c, before) in preceding {
            for &p in before {
                if let Some(&k) = self.kerning.get(&(p, c)) {
                    gm.pair_deltas.insert((p, c), k);
                }
            }
        }
        Some(gm)
    }

    fn covers(&mut self, font: &FontKey, ch: char) -> bool {
        if self.missing.contains(&ch) {
            return false;
        }
        let is_fallback = self.family_of(font).as_deref() == Some(FALLBACK_FAMILY);
        is_fallback || !self.fallback.contains(&ch)
    }

    fn full_name(&mut self, font: &FontKey) -> Option<String> {
        let mut name = self.family_of(font)?;
        if font.weight.value() >= FontWeight::BOLD.value() {
            name.push_str(" Bold");
        }
        if font.style != FontStyle::Normal {
            name.push_str(" Italic");
        }
        Some(name)
    }

    fn measure_strings(
        &mut self,
        font: &FontKey,
        strings: &[String],
    ) -> Option<Vec<StringMetrics>> {
        if !self.shaping {
            return None;
        }
        let mut ret = Vec::with_capacity(strings.len());
        for s in strings {
            let mut pen = 0.;
            let mut ink: Option<kurbo::Rect> = None;
            let mut prev = None;
            for c in s.chars() {
                if !self.covers(font, c) {
                    return None;
                }
                if let Some(p) = prev {
                    pen += self.kerning.get(&(p, c)).copied().unwrap_or(0.);
                }
                let [x, y, w, h] = self.ink(font, c);
                if w > 0. || h > 0. {
                    let r = kurbo::Rect::new(pen + x, y, pen + x + w, y + h);
                    ink = Some(ink.map_or(r, |i| i.union(r)));
                }
                pen += self.font_advance(font, c);
                prev = Some(c);
            }
            let ink = ink.map_or([0.; 4], |r| [r.x0, r.y0, r.width(), r.height()]);
            ret.push(StringMetrics { advance: pen, ink });
        }
        Some(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Style;

    #[test]
    fn matching_and_fallback() {
        let mut fonts = FixedFonts::new().with_family("Serifed").with_fallback('λ');
        let nominal = FontKey::from_style(&Style::parse("font-family:Nope,serifed"));
        let tf = fonts.true_font(&nominal).unwrap();
        assert_eq!(fonts.full_name(&tf).as_deref(), Some("Serifed"));
        let by_char = fonts.true_fonts_by_char(&nominal, &['a', 'λ']);
        assert_eq!(by_char[&'a'], Some(tf.clone()));
        let fb = by_char[&'λ'].clone().unwrap();
        assert!(fonts.covers(&fb, 'λ'));
        assert!(!fonts.covers(&tf, 'λ'));
    }

    #[test]
    fn shaped_strings_sum_advances_and_kerning() {
        let mut fonts = FixedFonts::new().with_kerning('A', 'V', -0.1);
        let font = fonts.true_font(&FontKey::from_style(&Style::new())).unwrap();
        let m = fonts
            .measure_strings(&font, &["AV".to_owned(), " ".to_owned()])
            .unwrap();
        assert!((m[0].advance - (0.7 + 0.7 - 0.1)).abs() < 1e-12);
        assert!((m[0].ink[1] + 0.7).abs() < 1e-12);
        assert_eq!(m[1].ink, [0.; 4]);
        assert!(fonts.without_shaping().measure_strings(&font, &[]).is_none());
    }
}
