// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use core::hash::{Hash, Hasher};

/// Visual weight class of a font, on the CSS scale from 1 to 1000.
///
/// In CSS, this corresponds to the `font-weight` property.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct FontWeight(f32);

impl FontWeight {
    /// Weight value of 100.
    pub const THIN: Self = Self(100.0);

    /// Weight value of 300.
    pub const LIGHT: Self = Self(300.0);

    /// Weight value of 400. This is the default value.
    pub const NORMAL: Self = Self(400.0);

    /// Weight value of 500.
    pub const MEDIUM: Self = Self(500.0);

    /// Weight value of 700.
    pub const BOLD: Self = Self(700.0);

    /// Weight value of 900.
    pub const BLACK: Self = Self(900.0);

    /// Creates a new weight value.
    pub fn new(weight: f32) -> Self {
        Self(weight)
    }

    /// Returns the underlying weight value.
    pub fn value(self) -> f32 {
        self.0
    }

    /// Parses a CSS `font-weight` value.
    ///
    /// Supported syntax (after trimming ASCII whitespace):
    /// - `normal` → `FontWeight::NORMAL`
    /// - `bold` → `FontWeight::BOLD`
    /// - a number → `FontWeight::new(value)`
    ///
    /// The relative keywords `bolder` and `lighter` are not resolved and return `None`, as does
    /// anything else.
    ///
    /// ```
    /// use svgtext_primitives::FontWeight;
    ///
    /// assert_eq!(FontWeight::parse("normal"), Some(FontWeight::NORMAL));
    /// assert_eq!(FontWeight::parse("bold"), Some(FontWeight::BOLD));
    /// assert_eq!(FontWeight::parse("850"), Some(FontWeight::new(850.0)));
    /// assert_eq!(FontWeight::parse("bolder"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Some(match s {
            "normal" => Self::NORMAL,
            "bold" => Self::BOLD,
            _ => Self(s.parse::<f32>().ok().filter(|v| v.is_finite())?),
        })
    }

    /// Snaps the weight to the nearest multiple of 100 in `100..=900`.
    ///
    /// Font matching reports arbitrary weights; this is the CSS value a matched face is
    /// written back as.
    ///
    /// ```
    /// use svgtext_primitives::FontWeight;
    ///
    /// assert_eq!(FontWeight::new(380.0).snapped(), FontWeight::NORMAL);
    /// assert_eq!(FontWeight::new(1000.0).snapped(), FontWeight::BLACK);
    /// ```
    #[cfg(feature = "std")]
    pub fn snapped(self) -> Self {
        let v = (self.0 / 100.0).round().clamp(1.0, 9.0) * 100.0;
        Self(v)
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl Eq for FontWeight {}

impl Hash for FontWeight {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NORMAL {
            f.write_str("normal")
        } else if *self == Self::BOLD {
            f.write_str("bold")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Visual width of a font, relative to the normal aspect ratio.
///
/// In CSS, this corresponds to the `font-stretch` property.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct FontWidth(f32);

impl FontWidth {
    /// Width that is 50% of normal.
    pub const ULTRA_CONDENSED: Self = Self(0.5);

    /// Width that is 62.5% of normal.
    pub const EXTRA_CONDENSED: Self = Self(0.625);

    /// Width that is 75% of normal.
    pub const CONDENSED: Self = Self(0.75);

    /// Width that is 87.5% of normal.
    pub const SEMI_CONDENSED: Self = Self(0.875);

    /// Width that is 100% of normal. This is the default value.
    pub const NORMAL: Self = Self(1.0);

    /// Width that is 112.5% of normal.
    pub const SEMI_EXPANDED: Self = Self(1.125);

    /// Width that is 125% of normal.
    pub const EXPANDED: Self = Self(1.25);

    /// Width that is 150% of normal.
    pub const EXTRA_EXPANDED: Self = Self(1.5);

    /// Width that is 200% of normal.
    pub const ULTRA_EXPANDED: Self = Self(2.0);

    const KEYWORDS: [(Self, &'static str); 9] = [
        (Self::ULTRA_CONDENSED, "ultra-condensed"),
        (Self::EXTRA_CONDENSED, "extra-condensed"),
        (Self::CONDENSED, "condensed"),
        (Self::SEMI_CONDENSED, "semi-condensed"),
        (Self::NORMAL, "normal"),
        (Self::SEMI_EXPANDED, "semi-expanded"),
        (Self::EXPANDED, "expanded"),
        (Self::EXTRA_EXPANDED, "extra-expanded"),
        (Self::ULTRA_EXPANDED, "ultra-expanded"),
    ];

    /// Creates a new width value with the given ratio.
    pub fn from_ratio(ratio: f32) -> Self {
        Self(ratio)
    }

    /// Returns the width value as a ratio, with `1.0` being normal width.
    pub fn ratio(self) -> f32 {
        self.0
    }

    /// Parses a CSS `font-stretch` value.
    ///
    /// Keywords from `ultra-condensed` to `ultra-expanded` are accepted, as are percentages.
    ///
    /// ```
    /// use svgtext_primitives::FontWidth;
    ///
    /// assert_eq!(FontWidth::parse("semi-condensed"), Some(FontWidth::SEMI_CONDENSED));
    /// assert_eq!(FontWidth::parse("150%"), Some(FontWidth::EXTRA_EXPANDED));
    /// assert_eq!(FontWidth::parse("wide"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some((width, _)) = Self::KEYWORDS.iter().find(|(_, k)| *k == s) {
            return Some(*width);
        }
        let pct = s.strip_suffix('%')?.parse::<f32>().ok()?;
        Some(Self(pct / 100.0))
    }

    /// Snaps the width to the nearest keyword value.
    #[cfg(feature = "std")]
    pub fn snapped(self) -> Self {
        let mut best = Self::NORMAL;
        for (width, _) in Self::KEYWORDS {
            if (width.0 - self.0).abs() < (best.0 - self.0).abs() {
                best = width;
            }
        }
        best
    }
}

impl Default for FontWidth {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl Eq for FontWidth {}

impl Hash for FontWidth {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for FontWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::KEYWORDS.iter().find(|(w, _)| w == self) {
            Some((_, keyword)) => f.write_str(keyword),
            None => write!(f, "{}%", self.0 * 100.0),
        }
    }
}

/// Slant of a font.
///
/// Oblique angles are not distinguished: SVG renderers select faces by the keyword alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    /// `normal`.
    #[default]
    Normal,
    /// `italic`.
    Italic,
    /// `oblique`, with or without an angle.
    Oblique,
}

impl FontStyle {
    /// Parses a CSS `font-style` value.
    ///
    /// ```
    /// use svgtext_primitives::FontStyle;
    ///
    /// assert_eq!(FontStyle::parse("italic"), Some(FontStyle::Italic));
    /// assert_eq!(FontStyle::parse("oblique 10deg"), Some(FontStyle::Oblique));
    /// assert_eq!(FontStyle::parse("slanted"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Some(match s {
            "normal" => Self::Normal,
            "italic" => Self::Italic,
            "oblique" => Self::Oblique,
            _ if s.starts_with("oblique ") => Self::Oblique,
            _ => return None,
        })
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Italic => "italic",
            Self::Oblique => "oblique",
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::string::ToString;

    use super::{FontStyle, FontWeight, FontWidth};

    #[test]
    fn weight_display_round_trips_keywords() {
        assert_eq!(FontWeight::NORMAL.to_string(), "normal");
        assert_eq!(FontWeight::BOLD.to_string(), "bold");
        assert_eq!(FontWeight::new(600.0).to_string(), "600");
        assert_eq!(FontWeight::parse(" 600 "), Some(FontWeight::new(600.0)));
        assert_eq!(FontWeight::parse("NaN"), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn snapping_clamps() {
        assert_eq!(FontWeight::new(40.0).snapped(), FontWeight::THIN);
        assert_eq!(FontWeight::new(649.0).snapped(), FontWeight::new(600.0));
        assert_eq!(FontWidth::from_ratio(0.8).snapped(), FontWidth::CONDENSED);
    }

    #[test]
    fn width_keywords_and_percentages() {
        assert_eq!(FontWidth::parse(" condensed "), Some(FontWidth::CONDENSED));
        assert_eq!(FontWidth::parse("87.5%"), Some(FontWidth::SEMI_CONDENSED));
        assert_eq!(FontWidth::parse("80"), None);
        assert_eq!(FontWidth::parse("%"), None);
        assert_eq!(FontWidth::CONDENSED.to_string(), "condensed");
        assert_eq!(FontWidth::from_ratio(0.8).to_string(), "80%");
    }

    #[test]
    fn style_keywords() {
        assert_eq!(FontStyle::parse("normal"), Some(FontStyle::Normal));
        assert_eq!(FontStyle::parse("oblique"), Some(FontStyle::Oblique));
        assert_eq!(FontStyle::Italic.to_string(), "italic");
    }
}
