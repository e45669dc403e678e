// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use svgtext_primitives::{Length, DEFAULT_FONT_SIZE};

use super::{Document, NodeId};

/// The CSS `line-height: normal` multiplier.
pub(crate) const NORMAL_LINE_HEIGHT: f64 = 1.25;

/// Converts an absolute length to px (user units).
///
/// Relative lengths (`em`, `ex`, `%`) and malformed values give `None`.
///
/// ```
/// use svgtext::dom::ipx;
///
/// assert_eq!(ipx("12"), Some(12.0));
/// assert_eq!(ipx("1in"), Some(96.0));
/// assert_eq!(ipx("2em"), None);
/// ```
pub fn ipx(s: &str) -> Option<f64> {
    Length::parse(s)?.to_px()
}

fn keyword_size(kw: &str) -> Option<f64> {
    Some(match kw {
        "xx-small" => 8.,
        "x-small" => 9.,
        "small" => 10.,
        "medium" => 12.,
        "large" => 14.,
        "x-large" => 18.,
        "xx-large" => 24.,
        _ => return None,
    })
}

fn relative_keyword(kw: &str) -> Option<f64> {
    Some(match kw {
        "smaller" => 1. / 1.2,
        "larger" => 1.2,
        _ => return None,
    })
}

/// A font size resolved against the composed transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSize {
    /// The size as drawn, in document units.
    pub transformed: f64,
    /// The scale factor of the composed transform, `sqrt(|det|)`.
    pub scale: f64,
    /// The size in the element's own user units.
    pub untransformed: f64,
}

/// The drawn font size of an element.
///
/// Percentages and `smaller`/`larger` are resolved against the ancestor that declares
/// them; keywords use a 12px `medium`.
pub fn composed_font_size(doc: &Document, id: NodeId) -> FontSize {
    let specified = doc.specified_style(id);
    let value = specified.get("font-size").unwrap_or("medium").trim();
    let relative = value
        .strip_suffix('%')
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|p| p / 100.)
        .or_else(|| relative_keyword(value));

    if let Some(factor) = relative {
        // Find the ancestor the value comes from, and scale its parent's size.
        let mut cel = id;
        loop {
            let own = doc.style_attr(cel);
            if own.get("font-size").map(str::trim) == Some(value)
                || doc.get(cel, "font-size").map(str::trim) == Some(value)
            {
                break;
            }
            match doc.parent(cel) {
                Some(p) => cel = p,
                None => break,
            }
        }
        let base = match doc.parent(cel) {
            Some(p) => composed_font_size(doc, p),
            None => {
                let scale = scale_of(doc, cel);
                FontSize {
                    transformed: DEFAULT_FONT_SIZE * scale,
                    scale,
                    untransformed: DEFAULT_FONT_SIZE,
                }
            }
        };
        let transformed = base.transformed * factor;
        return FontSize {
            transformed,
            scale: base.scale,
            untransformed: transformed / base.scale,
        };
    }

    let size = ipx(value)
        .filter(|&v| v != 0.)
        .or_else(|| keyword_size(value))
        .unwrap_or(DEFAULT_FONT_SIZE);
    let scale = scale_of(doc, id);
    FontSize {
        transformed: size * scale,
        scale,
        untransformed: size,
    }
}

fn scale_of(doc: &Document, id: NodeId) -> f64 {
    doc.composed_transform(id).determinant().abs().sqrt()
}

/// The drawn line height of an element.
///
/// `normal` is 1.25 font sizes; percentages, bare numbers and `em` values are multiples of
/// the font size; absolute lengths are in user units.
pub fn composed_line_height(doc: &Document, id: NodeId) -> f64 {
    let specified = doc.specified_style(id);
    let value = specified.get("line-height").unwrap_or("normal").trim();
    let fs = composed_font_size(doc, id);
    let factor = if value == "normal" {
        NORMAL_LINE_HEIGHT
    } else if let Some(p) = value.strip_suffix('%') {
        p.trim().parse::<f64>().map_or(NORMAL_LINE_HEIGHT, |p| p / 100.)
    } else if let Ok(v) = value.trim_matches(|c| c == 'e' || c == 'm').parse::<f64>() {
        v
    } else {
        ipx(value).map_or(NORMAL_LINE_HEIGHT, |v| v / fs.untransformed)
    };
    factor * fs.transformed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg">"#,
            r#"<g transform="scale(2)"><text id="t" style="font-size:10px;line-height:150%">"#,
            r#"<tspan id="a" style="font-size:50%">a<tspan id="b">b</tspan></tspan>"#,
            r#"<tspan id="c" style="font-size:larger;line-height:6px">c</tspan>"#,
            r#"<tspan id="d" style="font-size:large;line-height:normal">d</tspan>"#,
            r#"</text></g><text id="e">e</text></svg>"#
        ))
        .unwrap()
    }

    fn size(d: &Document, id: &str) -> FontSize {
        composed_font_size(d, d.element_by_id(id).unwrap())
    }

    #[test]
    fn font_sizes() {
        let d = doc();
        let t = size(&d, "t");
        assert_eq!((t.transformed, t.scale, t.untransformed), (20., 2., 10.));
        assert_eq!(size(&d, "a").transformed, 10.);
        assert_eq!(size(&d, "b").untransformed, 5.);
        assert!((size(&d, "c").transformed - 24.).abs() < 1e-9);
        assert_eq!(size(&d, "d").untransformed, 14.);
        assert_eq!(size(&d, "e").transformed, 12.);
    }

    #[test]
    fn line_heights() {
        let d = doc();
        let lh = |id| composed_line_height(&d, d.element_by_id(id).unwrap());
        assert!((lh("t") - 30.).abs() < 1e-9);
        assert!((lh("a") - 15.).abs() < 1e-9);
        assert!((lh("c") - 12.).abs() < 1e-9);
        assert!((lh("d") - 35.).abs() < 1e-9);
        assert!((lh("e") - 15.).abs() < 1e-9);
    }
}
