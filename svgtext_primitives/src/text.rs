// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// The SVG `text-anchor` property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TextAnchor {
    /// The anchor point is the start of the run.
    #[default]
    Start,
    /// The anchor point is the middle of the run.
    Middle,
    /// The anchor point is the end of the run.
    End,
}

impl TextAnchor {
    /// Parses a `text-anchor` value.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim() {
            "start" => Self::Start,
            "middle" => Self::Middle,
            "end" => Self::End,
            _ => return None,
        })
    }

    /// The anchor fraction: where the anchor sits between a run's left (0) and right (1) edge.
    ///
    /// ```
    /// use svgtext_primitives::TextAnchor;
    ///
    /// assert_eq!(TextAnchor::Start.fraction(), 0.0);
    /// assert_eq!(TextAnchor::Middle.fraction(), 0.5);
    /// assert_eq!(TextAnchor::End.fraction(), 1.0);
    /// ```
    pub fn fraction(self) -> f64 {
        match self {
            Self::Start => 0.0,
            Self::Middle => 0.5,
            Self::End => 1.0,
        }
    }

    /// Swaps `start` and `end`, as right-to-left text does.
    pub fn mirrored(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::Middle => Self::Middle,
            Self::End => Self::Start,
        }
    }

    /// The `text-align` keyword with the same visual effect.
    pub fn to_align(self) -> TextAlign {
        match self {
            Self::Start => TextAlign::Start,
            Self::Middle => TextAlign::Center,
            Self::End => TextAlign::End,
        }
    }

    /// Returns the keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

impl fmt::Display for TextAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The CSS `text-align` property, as used by flowed text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    /// Align to the start edge.
    #[default]
    Start,
    /// Align to the end edge.
    End,
    /// Align to the left edge.
    Left,
    /// Align to the right edge.
    Right,
    /// Center within the line box.
    Center,
    /// Justify. Laid out like `start`.
    Justify,
}

impl TextAlign {
    /// Parses a `text-align` value.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim() {
            "start" => Self::Start,
            "end" => Self::End,
            "left" => Self::Left,
            "right" => Self::Right,
            "center" => Self::Center,
            "justify" => Self::Justify,
            _ => return None,
        })
    }

    /// The `text-anchor` that positions a line the same way.
    ///
    /// ```
    /// use svgtext_primitives::{TextAlign, TextAnchor};
    ///
    /// assert_eq!(TextAlign::Center.to_anchor(), TextAnchor::Middle);
    /// assert_eq!(TextAlign::Right.to_anchor(), TextAnchor::End);
    /// assert_eq!(TextAlign::Justify.to_anchor(), TextAnchor::Start);
    /// ```
    pub fn to_anchor(self) -> TextAnchor {
        match self {
            Self::Start | Self::Left | Self::Justify => TextAnchor::Start,
            Self::Center => TextAnchor::Middle,
            Self::End | Self::Right => TextAnchor::End,
        }
    }

    /// Returns the keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
            Self::Justify => "justify",
        }
    }
}

impl fmt::Display for TextAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The CSS `direction` property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

impl Direction {
    /// Parses a `direction` value.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim() {
            "ltr" => Self::Ltr,
            "rtl" => Self::Rtl,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, TextAlign, TextAnchor};

    #[test]
    fn anchor_mirroring() {
        assert_eq!(TextAnchor::Start.mirrored(), TextAnchor::End);
        assert_eq!(TextAnchor::Middle.mirrored(), TextAnchor::Middle);
        assert_eq!(TextAnchor::parse(" end "), Some(TextAnchor::End));
        assert_eq!(TextAnchor::parse("left"), None);
    }

    #[test]
    fn align_round_trip() {
        for anchor in [TextAnchor::Start, TextAnchor::Middle, TextAnchor::End] {
            assert_eq!(anchor.to_align().to_anchor(), anchor, "{anchor}");
        }
        assert_eq!(TextAlign::parse("center"), Some(TextAlign::Center));
        assert_eq!(Direction::parse("rtl"), Some(Direction::Rtl));
    }
}
