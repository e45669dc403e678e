// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// The font size used when no other size applies, in user units.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Units a [`Length`] can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Unit {
    /// A bare number, interpreted as user units.
    #[default]
    None,
    /// CSS pixels.
    Px,
    /// Points, 1/72 in.
    Pt,
    /// Picas, 1/6 in.
    Pc,
    /// Inches.
    In,
    /// Centimeters.
    Cm,
    /// Millimeters.
    Mm,
    /// Quarter-millimeters.
    Q,
    /// Multiples of the font size.
    Em,
    /// Multiples of the x-height.
    Ex,
    /// Percentage of some reference length.
    Percent,
}

impl Unit {
    /// Parses a unit suffix. The empty string is [`Unit::None`].
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "" => Self::None,
            "px" => Self::Px,
            "pt" => Self::Pt,
            "pc" => Self::Pc,
            "in" => Self::In,
            "cm" => Self::Cm,
            "mm" => Self::Mm,
            "Q" => Self::Q,
            "em" => Self::Em,
            "ex" => Self::Ex,
            "%" => Self::Percent,
            _ => return None,
        })
    }

    /// Size of one unit in px, for absolute units.
    pub fn px_per_unit(self) -> Option<f64> {
        Some(match self {
            Self::None | Self::Px => 1.0,
            Self::Pt => 4.0 / 3.0,
            Self::Pc => 16.0,
            Self::In => 96.0,
            Self::Cm => 96.0 / 2.54,
            Self::Mm => 96.0 / 25.4,
            Self::Q => 96.0 / 101.6,
            Self::Em | Self::Ex | Self::Percent => return None,
        })
    }

    /// Returns the suffix this unit is written with.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Px => "px",
            Self::Pt => "pt",
            Self::Pc => "pc",
            Self::In => "in",
            Self::Cm => "cm",
            Self::Mm => "mm",
            Self::Q => "Q",
            Self::Em => "em",
            Self::Ex => "ex",
            Self::Percent => "%",
        }
    }
}

/// A number with an optional unit, as found in SVG attributes and CSS properties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Length {
    /// The numeric part.
    pub value: f64,
    /// The unit suffix.
    pub unit: Unit,
}

impl Length {
    /// Creates a length.
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Creates a unitless length.
    pub const fn number(value: f64) -> Self {
        Self::new(value, Unit::None)
    }

    /// Parses a length such as `12`, `-1.5e1px`, `80%` or `2 em`.
    ///
    /// Whitespace is allowed around the value and between the number and its unit.
    ///
    /// ```
    /// use svgtext_primitives::{Length, Unit};
    ///
    /// assert_eq!(Length::parse(" 1.5e1px "), Some(Length::new(15.0, Unit::Px)));
    /// assert_eq!(Length::parse("80 %"), Some(Length::new(80.0, Unit::Percent)));
    /// assert_eq!(Length::parse(".5"), Some(Length::number(0.5)));
    /// assert_eq!(Length::parse("12furlongs"), None);
    /// assert_eq!(Length::parse("px"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let split = number_prefix_len(s)?;
        let value = s.get(..split)?.parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }
        let unit = Unit::parse(s.get(split..)?.trim_start())?;
        Some(Self { value, unit })
    }

    /// Converts an absolute length to px. Relative lengths give `None`.
    ///
    /// A bare number counts as px, matching how SVG renderers treat presentation values.
    pub fn to_px(self) -> Option<f64> {
        Some(self.value * self.unit.px_per_unit()?)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}

/// Returns the byte length of the leading CSS number in `s`, if there is one.
fn number_prefix_len(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while b.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let mut digits = i - int_start;
    if b.get(i) == Some(&b'.') {
        i += 1;
        let frac_start = i;
        while b.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return None;
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        // Only an exponent if digits follow, so `1em` stays a length in em.
        let mut j = i + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        if b.get(j).is_some_and(u8::is_ascii_digit) {
            while b.get(j).is_some_and(u8::is_ascii_digit) {
                j += 1;
            }
            i = j;
        }
    }
    Some(i)
}

#[cfg(test)]
mod tests {
    use super::{Length, Unit};

    fn px(s: &str) -> Option<f64> {
        Length::parse(s).and_then(Length::to_px)
    }

    #[test]
    fn absolute_units_convert() {
        assert_eq!(px("12"), Some(12.0));
        assert_eq!(px("3pt"), Some(4.0));
        assert_eq!(px("1in"), Some(96.0));
        assert_eq!(px("1pc"), Some(16.0));
        assert!((px("25.4mm").unwrap() - 96.0).abs() < 1e-9, "mm conversion");
        assert!((px("2.54cm").unwrap() - 96.0).abs() < 1e-9, "cm conversion");
        assert!((px("101.6Q").unwrap() - 96.0).abs() < 1e-9, "Q conversion");
    }

    #[test]
    fn relative_units_have_no_px_value() {
        assert_eq!(Length::parse("1em"), Some(Length::new(1.0, Unit::Em)));
        assert_eq!(px("1em"), None);
        assert_eq!(px("2ex"), None);
        assert_eq!(px("50%"), None);
    }

    #[test]
    fn exponent_is_not_confused_with_em() {
        assert_eq!(Length::parse("1e2"), Some(Length::number(100.0)));
        assert_eq!(Length::parse("-2E-1px"), Some(Length::new(-0.2, Unit::Px)));
        assert_eq!(Length::parse("3e"), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(Length::parse(""), None);
        assert_eq!(Length::parse("none"), None);
        assert_eq!(Length::parse("1..2"), None);
        assert_eq!(Length::parse("4 px px"), None);
    }
}
