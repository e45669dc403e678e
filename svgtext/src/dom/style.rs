// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use svgtext_primitives::{
    Direction, FamilyList, FontStyle, FontWeight, FontWidth, Length, TextAlign, TextAnchor,
};

use super::{Document, NodeId};

/// SVG presentation attributes that take part in the style cascade.
///
/// `clip-path`, `mask` and `transform` are presentation attributes too, but they are not
/// inherited and the text engine reads them directly.
pub const PRESENTATION_ATTRIBUTES: &[&str] = &[
    "alignment-baseline",
    "baseline-shift",
    "clip-rule",
    "color",
    "direction",
    "display",
    "dominant-baseline",
    "fill",
    "fill-opacity",
    "fill-rule",
    "filter",
    "font-family",
    "font-size",
    "font-size-adjust",
    "font-stretch",
    "font-style",
    "font-variant",
    "font-weight",
    "letter-spacing",
    "line-height",
    "opacity",
    "overflow",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "text-align",
    "text-anchor",
    "text-decoration",
    "unicode-bidi",
    "visibility",
    "white-space",
    "word-spacing",
    "writing-mode",
];

const INITIAL_VALUES: &[(&str, &str)] = &[
    ("alignment-baseline", "baseline"),
    ("baseline-shift", "0"),
    ("clip-rule", "nonzero"),
    ("color", "black"),
    ("direction", "ltr"),
    ("display", "inline"),
    ("dominant-baseline", "auto"),
    ("fill", "black"),
    ("fill-opacity", "1"),
    ("fill-rule", "nonzero"),
    ("filter", "none"),
    ("font-family", "sans-serif"),
    ("font-size", "medium"),
    ("font-size-adjust", "none"),
    ("font-stretch", "normal"),
    ("font-style", "normal"),
    ("font-variant", "normal"),
    ("font-weight", "normal"),
    ("letter-spacing", "normal"),
    ("line-height", "normal"),
    ("opacity", "1"),
    ("overflow", "visible"),
    ("stroke", "none"),
    ("stroke-dasharray", "none"),
    ("stroke-dashoffset", "0"),
    ("stroke-linecap", "butt"),
    ("stroke-linejoin", "miter"),
    ("stroke-miterlimit", "4"),
    ("stroke-opacity", "1"),
    ("stroke-width", "1"),
    ("text-align", "start"),
    ("text-anchor", "start"),
    ("text-decoration", "none"),
    ("unicode-bidi", "normal"),
    ("visibility", "visible"),
    ("white-space", "normal"),
    ("word-spacing", "normal"),
    ("writing-mode", "horizontal-tb"),
    ("-inkscape-font-specification", "sans-serif"),
];

/// The CSS initial value of a property, if it is one the cascade knows.
///
/// ```
/// use svgtext::dom::initial_value;
///
/// assert_eq!(initial_value("font-size"), Some("medium"));
/// assert_eq!(initial_value("x"), None);
/// ```
pub fn initial_value(name: &str) -> Option<&'static str> {
    INITIAL_VALUES
        .iter()
        .find_map(|&(k, v)| (k == name).then_some(v))
}

/// An ordered map of CSS properties, as found in a `style` attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Style {
    props: Vec<(String, String)>,
}

impl Style {
    /// Creates an empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses declarations such as `font-size:12px;fill:red`.
    ///
    /// Declarations without a colon are dropped. A repeated property keeps its first
    /// position and its last value.
    pub fn parse(s: &str) -> Self {
        let mut style = Self::new();
        for decl in s.split(';') {
            let Some((k, v)) = decl.split_once(':') else {
                continue;
            };
            let (k, v) = (k.trim(), v.trim());
            if !k.is_empty() {
                style.set(k, v);
            }
        }
        style
    }

    /// Gets a property value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v.as_str()))
    }

    /// Returns `true` if the property is set.
    pub fn contains(&self, name: &str) -> bool {
        self.props.iter().any(|(k, _)| k == name)
    }

    /// Sets a property, keeping its position if it is already set.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.props.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.props.push((name.to_owned(), value)),
        }
    }

    /// Removes a property, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.props.iter().position(|(k, _)| k == name)?;
        Some(self.props.remove(pos).1)
    }

    /// Sets every property of `other` on `self`.
    pub fn update(&mut self, other: &Self) {
        for (k, v) in &other.props {
            self.set(k, v.clone());
        }
    }

    /// Iterates over the properties in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The number of properties.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Returns `true` if no property is set.
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Parses a property into its typed value.
    pub fn value(&self, name: &str) -> Option<PropertyValue> {
        Property::from_name(name).parse(self.get(name)?)
    }

    /// The effective `text-anchor`, with `direction: rtl` swapping start and end.
    pub fn text_anchor(&self) -> Option<TextAnchor> {
        let anchor = match self.value("text-anchor")? {
            PropertyValue::Anchor(a) => a,
            _ => return None,
        };
        Some(match self.value("direction") {
            Some(PropertyValue::Direction(Direction::Rtl)) => anchor.mirrored(),
            _ => anchor,
        })
    }

    /// The `text-align` keyword.
    pub fn text_align(&self) -> Option<TextAlign> {
        match self.value("text-align")? {
            PropertyValue::Align(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.props.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{k}:{v}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Style {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut style = Self::new();
        for (k, v) in iter {
            style.set(&k.into(), v);
        }
        style
    }
}

/// CSS properties with a typed value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Property {
    /// `font-family`.
    FontFamily,
    /// `font-size`.
    FontSize,
    /// `font-stretch`.
    FontStretch,
    /// `font-style`.
    FontStyle,
    /// `font-weight`.
    FontWeight,
    /// `letter-spacing`.
    LetterSpacing,
    /// `line-height`.
    LineHeight,
    /// `baseline-shift`.
    BaselineShift,
    /// `text-anchor`.
    TextAnchor,
    /// `text-align`.
    TextAlign,
    /// `direction`.
    Direction,
    /// `inline-size`.
    InlineSize,
    /// `shape-inside`.
    ShapeInside,
    /// `shape-padding`.
    ShapePadding,
    /// Anything else; read as a raw string.
    Other,
}

impl Property {
    /// Looks up a property by its CSS name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "font-family" => Self::FontFamily,
            "font-size" => Self::FontSize,
            "font-stretch" => Self::FontStretch,
            "font-style" => Self::FontStyle,
            "font-weight" => Self::FontWeight,
            "letter-spacing" => Self::LetterSpacing,
            "line-height" => Self::LineHeight,
            "baseline-shift" => Self::BaselineShift,
            "text-anchor" => Self::TextAnchor,
            "text-align" => Self::TextAlign,
            "direction" => Self::Direction,
            "inline-size" => Self::InlineSize,
            "shape-inside" => Self::ShapeInside,
            "shape-padding" => Self::ShapePadding,
            _ => Self::Other,
        }
    }

    /// Parses a value of this property. Invalid values give `None`.
    pub fn parse(self, value: &str) -> Option<PropertyValue> {
        let value = value.trim();
        match self {
            Self::FontFamily => {
                let list = FamilyList::parse(value);
                (!list.is_empty()).then_some(PropertyValue::Families(list))
            }
            Self::FontSize
            | Self::LetterSpacing
            | Self::BaselineShift
            | Self::InlineSize
            | Self::ShapePadding => Some(length_or_keyword(value)),
            Self::LineHeight => Some(match value {
                "normal" => PropertyValue::Keyword(value.to_owned()),
                _ => match value.parse::<f64>() {
                    Ok(n) if n.is_finite() => PropertyValue::Number(n),
                    _ => PropertyValue::Length(Length::parse(value)?),
                },
            }),
            Self::FontStretch => FontWidth::parse(value).map(PropertyValue::Width),
            Self::FontStyle => FontStyle::parse(value).map(PropertyValue::Slant),
            Self::FontWeight => FontWeight::parse(value).map(PropertyValue::Weight),
            Self::TextAnchor => TextAnchor::parse(value).map(PropertyValue::Anchor),
            Self::TextAlign => TextAlign::parse(value).map(PropertyValue::Align),
            Self::Direction => {
                svgtext_primitives::Direction::parse(value).map(PropertyValue::Direction)
            }
            Self::ShapeInside => url_id(value)
                .map(|id| PropertyValue::Url(id.to_owned()))
                .or_else(|| Some(PropertyValue::Keyword(value.to_owned()))),
            Self::Other => Some(PropertyValue::Raw(value.to_owned())),
        }
    }
}

fn length_or_keyword(value: &str) -> PropertyValue {
    match Length::parse(value) {
        Some(len) => PropertyValue::Length(len),
        None => PropertyValue::Keyword(value.to_owned()),
    }
}

/// The id inside `url(#id)`.
pub(crate) fn url_id(value: &str) -> Option<&str> {
    value
        .trim()
        .strip_prefix("url(")?
        .strip_suffix(')')?
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .strip_prefix('#')
}

/// A typed property value.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum PropertyValue {
    /// A length, possibly relative.
    Length(Length),
    /// A bare number.
    Number(f64),
    /// A keyword such as `normal`, `medium` or `super`.
    Keyword(String),
    /// A font family list.
    Families(FamilyList),
    /// A font weight.
    Weight(FontWeight),
    /// A font width.
    Width(FontWidth),
    /// A font slant.
    Slant(FontStyle),
    /// A text anchor.
    Anchor(TextAnchor),
    /// A text alignment.
    Align(TextAlign),
    /// A text direction.
    Direction(Direction),
    /// The id of a referenced element.
    Url(String),
    /// An untyped value.
    Raw(String),
}

/// The element's own style.
pub(super) fn cascade(doc: &Document, id: NodeId) -> Style {
    let mut style = Style::new();
    for (k, v) in doc.attributes(id) {
        if PRESENTATION_ATTRIBUTES.contains(&k.as_str()) {
            style.set(k, v.clone());
        }
    }
    if let Some(own) = doc.get(id, "id") {
        for (sel, rules) in doc.sheet() {
            if sel == own {
                style.update(rules);
            }
        }
    }
    style.update(&doc.style_attr(id));
    style
}

/// Collects `#id { ... }` rules from every `style` element.
pub(super) fn parse_sheets(doc: &Document) -> Vec<(String, Style)> {
    let mut rules = Vec::new();
    for el in doc.descendants(doc.root()) {
        if doc.tag(el) != "style" {
            continue;
        }
        let mut css = doc.text(el).unwrap_or_default().to_owned();
        for &k in doc.children(el) {
            css.push_str(doc.text(k).unwrap_or_default());
            css.push_str(doc.tail(k).unwrap_or_default());
        }
        let mut rest = css.as_str();
        while let Some((selectors, after)) = rest.split_once('{') {
            let Some((body, next)) = after.split_once('}') else {
                break;
            };
            let decls = Style::parse(body);
            for sel in selectors.split(',') {
                let sel = strip_comments(sel);
                if let Some(id) = sel.trim().strip_prefix('#') {
                    if !id.is_empty() && !id.contains(char::is_whitespace) {
                        rules.push((id.to_owned(), decls.clone()));
                    }
                }
            }
            rest = next;
        }
    }
    rules
}

fn strip_comments(s: &str) -> String {
    let mut out = String::new();
    let mut rest = s;
    while let Some((before, after)) = rest.split_once("/*") {
        out.push_str(before);
        rest = after.split_once("*/").map_or("", |(_, a)| a);
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_write() {
        let mut sty = Style::parse(" font-size : 12px;;fill:red; bogus ;font-size:14px");
        assert_eq!(sty.get("font-size"), Some("14px"));
        assert_eq!(sty.len(), 2);
        sty.set("fill", "blue");
        sty.set("stroke", "none");
        assert_eq!(sty.to_string(), "font-size:14px;fill:blue;stroke:none");
        assert_eq!(sty.remove("fill").as_deref(), Some("blue"));
        assert!(!sty.contains("fill"));
    }

    #[test]
    fn typed_values() {
        let sty = Style::parse(
            "font-size:50%;line-height:1.25;font-weight:bold;text-anchor:end;direction:rtl;\
             shape-inside:url(#r);baseline-shift:super",
        );
        assert_eq!(
            sty.value("font-size"),
            Some(PropertyValue::Length(Length::new(
                50.0,
                svgtext_primitives::Unit::Percent
            )))
        );
        assert_eq!(sty.value("line-height"), Some(PropertyValue::Number(1.25)));
        assert_eq!(
            sty.value("font-weight"),
            Some(PropertyValue::Weight(FontWeight::BOLD))
        );
        assert_eq!(sty.value("shape-inside"), Some(PropertyValue::Url("r".into())));
        assert_eq!(
            sty.value("baseline-shift"),
            Some(PropertyValue::Keyword("super".into()))
        );
        assert_eq!(sty.text_anchor(), Some(TextAnchor::Start));
    }

    #[test]
    fn sheet_rules_apply_by_id() {
        let doc = Document::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><style>/* c */ #t, .x { font-size: 20px }</style>"#,
            r#"<text id="t" font-size="10" style="fill:red"/></svg>"#
        ))
        .unwrap();
        let t = doc.element_by_id("t").unwrap();
        let sty = doc.cascaded_style(t);
        assert_eq!(sty.get("font-size"), Some("20px"));
        assert_eq!(sty.get("fill"), Some("red"));
    }
}
