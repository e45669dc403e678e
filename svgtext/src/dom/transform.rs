// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Affine;

/// Parses an SVG `transform` attribute.
///
/// Unknown or malformed items make the whole list invalid, which (as in renderers) leaves
/// the element untransformed.
///
/// ```
/// use svgtext::dom::parse_transform;
/// use svgtext::kurbo::{Affine, Point};
///
/// let xf = parse_transform("translate(10, 5) scale(2)");
/// assert_eq!(xf * Point::new(1.0, 1.0), Point::new(12.0, 7.0));
/// assert_eq!(parse_transform("skew(3)"), Affine::IDENTITY);
/// ```
pub fn parse_transform(input: &str) -> Affine {
    try_parse(input).unwrap_or(Affine::IDENTITY)
}

fn try_parse(input: &str) -> Option<Affine> {
    let mut xform = Affine::IDENTITY;
    let mut rest = input.trim();
    while !rest.is_empty() {
        let (name, after) = rest.split_once('(')?;
        let (args, next) = after.split_once(')')?;
        let vals = args
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|v| !v.is_empty())
            .map(|v| v.parse::<f64>().ok())
            .collect::<Option<Vec<_>>>()?;
        let item = match (name.trim(), vals.as_slice()) {
            ("matrix", &[a, b, c, d, e, f]) => Affine::new([a, b, c, d, e, f]),
            ("translate", &[x]) => Affine::translate((x, 0.)),
            ("translate", &[x, y]) => Affine::translate((x, y)),
            ("scale", &[s]) => Affine::scale(s),
            ("scale", &[sx, sy]) => Affine::scale_non_uniform(sx, sy),
            ("rotate", &[a]) => Affine::rotate(a.to_radians()),
            ("rotate", &[a, cx, cy]) => {
                Affine::translate((cx, cy))
                    * Affine::rotate(a.to_radians())
                    * Affine::translate((-cx, -cy))
            }
            ("skewX", &[a]) => Affine::new([1., 0., a.to_radians().tan(), 1., 0., 0.]),
            ("skewY", &[a]) => Affine::new([1., a.to_radians().tan(), 0., 1., 0., 0.]),
            _ => return None,
        };
        xform *= item;
        rest = next.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    }
    Some(xform)
}

/// Writes a transform as a `transform` attribute value, or `None` for the identity.
pub fn format_transform(xform: Affine) -> Option<String> {
    if xform == Affine::IDENTITY {
        return None;
    }
    let [a, b, c, d, e, f] = xform.as_coeffs();
    if [a, b, c, d] == [1., 0., 0., 1.] {
        return Some(format!("translate({e},{f})"));
    }
    Some(format!("matrix({a},{b},{c},{d},{e},{f})"))
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;

    fn close(p: Point, q: Point) -> bool {
        (p - q).hypot() < 1e-9
    }

    #[test]
    fn items_compose_left_to_right() {
        let xf = parse_transform("scale(2) translate(1,1)");
        assert!(close(xf * Point::ORIGIN, Point::new(2., 2.)));
        let xf = parse_transform("rotate(90 10 10)");
        assert!(close(xf * Point::new(20., 10.), Point::new(10., 20.)));
        let xf = parse_transform("matrix(1 0 0 1 3 4), skewX(45)");
        assert!(close(xf * Point::new(0., 1.), Point::new(4., 5.)));
    }

    #[test]
    fn malformed_is_identity() {
        assert_eq!(parse_transform("translate(1"), Affine::IDENTITY);
        assert_eq!(parse_transform("rotate(a)"), Affine::IDENTITY);
        assert_eq!(parse_transform(""), Affine::IDENTITY);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_transform(Affine::IDENTITY), None);
        assert_eq!(
            format_transform(Affine::translate((1.5, -2.))).as_deref(),
            Some("translate(1.5,-2)")
        );
        assert_eq!(
            format_transform(Affine::scale(2.)).as_deref(),
            Some("matrix(2,0,0,2,0,0)")
        );
    }
}
