// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{BezPath, Circle, Ellipse, PathEl, Point, Rect, Shape};

use super::{Document, NodeId};
use crate::util::unique_tol;

const CURVE_TOLERANCE: f64 = 0.01;

fn num(doc: &Document, id: NodeId, name: &str) -> f64 {
    doc.get(id, name)
        .and_then(super::ipx)
        .unwrap_or_default()
}

fn points(s: &str) -> Vec<Point> {
    let vals: Vec<f64> = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|v| v.parse().ok())
        .collect();
    vals.chunks_exact(2).map(|p| Point::new(p[0], p[1])).collect()
}

fn polyline(pts: &[Point], close: bool) -> BezPath {
    let mut path = BezPath::new();
    for (i, &p) in pts.iter().enumerate() {
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    if close && !pts.is_empty() {
        path.close_path();
    }
    path
}

/// The outline of a shape element in its own coordinates, without its transform.
///
/// Supports `path`, `rect`, `line`, `polyline`, `polygon`, `circle` and `ellipse`.
pub fn shape_path(doc: &Document, id: NodeId) -> Option<BezPath> {
    Some(match doc.tag(id) {
        "path" => BezPath::from_svg(doc.get(id, "d")?).ok()?,
        "rect" => {
            let (x, y) = (num(doc, id, "x"), num(doc, id, "y"));
            Rect::new(x, y, x + num(doc, id, "width"), y + num(doc, id, "height"))
                .to_path(CURVE_TOLERANCE)
        }
        "line" => {
            let p0 = Point::new(num(doc, id, "x1"), num(doc, id, "y1"));
            let p1 = Point::new(num(doc, id, "x2"), num(doc, id, "y2"));
            polyline(&[p0, p1], false)
        }
        "polyline" => polyline(&points(doc.get(id, "points")?), false),
        "polygon" => polyline(&points(doc.get(id, "points")?), true),
        "circle" => Circle::new(
            (num(doc, id, "cx"), num(doc, id, "cy")),
            num(doc, id, "r"),
        )
        .to_path(CURVE_TOLERANCE),
        "ellipse" => Ellipse::new(
            (num(doc, id, "cx"), num(doc, id, "cy")),
            (num(doc, id, "rx"), num(doc, id, "ry")),
            0.,
        )
        .to_path(CURVE_TOLERANCE),
        _ => return None,
    })
}

fn end_points(path: &BezPath) -> Vec<Point> {
    let mut start = None;
    path.elements()
        .iter()
        .filter_map(|el| match *el {
            PathEl::MoveTo(p) => {
                start = Some(p);
                Some(p)
            }
            PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => Some(p),
            PathEl::ClosePath => start,
        })
        .collect()
}

fn count_path_commands(d: &str) -> usize {
    d.chars()
        .filter(|c| "MmLlHhVvCcSsQqTtAaZz".contains(*c))
        .count()
}

fn has_two_by_two_corners(doc: &Document, id: NodeId, including_transform: bool) -> bool {
    let Some(path) = shape_path(doc, id) else {
        return false;
    };
    let xform = if including_transform {
        doc.composed_transform(id)
    } else {
        kurbo::Affine::IDENTITY
    };
    corners_are_rectangular(&end_points(&(xform * path)))
}

fn corners_are_rectangular(pts: &[Point]) -> bool {
    if pts.is_empty() {
        return false;
    }
    let xs: Vec<f64> = pts.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = pts.iter().map(|p| p.y).collect();
    let span = |v: &[f64]| {
        v.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            - v.iter().copied().fold(f64::INFINITY, f64::min)
    };
    let tol = 1e-3 * span(&xs).max(span(&ys));
    unique_tol(&xs, tol).len() == 2 && unique_tol(&ys, tol).len() == 2
}

/// Returns `true` if a path is an axis-aligned rectangle: four or five commands whose
/// end points take two distinct x and two distinct y values.
pub(crate) fn path_is_rectangle(path: &BezPath) -> bool {
    (4..=5).contains(&path.elements().len()) && corners_are_rectangular(&end_points(path))
}

/// Returns `true` if the element is drawn as an axis-aligned rectangle.
///
/// Paths, lines and polylines count when their end points take exactly two distinct x and
/// two distinct y values (paths must also have four or five commands). With
/// `including_transform`, the composed transform is applied first, so a rotated `rect` is
/// not a rectangle. Masked elements never count; clipped ones only when every clip child
/// does. A `use` defers to the element it references.
pub fn is_rectangle(doc: &Document, id: NodeId, including_transform: bool) -> bool {
    match doc.tag(id) {
        "rect" if !including_transform => {}
        tag @ ("path" | "rect" | "line" | "polyline") => {
            if tag == "path"
                && !(4..=5).contains(&count_path_commands(doc.get(id, "d").unwrap_or("")))
            {
                return false;
            }
            if !has_two_by_two_corners(doc, id, including_transform) {
                return false;
            }
        }
        "use" => {
            return match doc.get_link(id, "href") {
                Some(target) => is_rectangle(doc, target, true),
                None => true,
            };
        }
        _ => return false,
    }

    if doc.get_link(id, "mask").is_some() {
        return false;
    }
    if let Some(clip) = doc.get_link(id, "clip-path") {
        if doc
            .element_children(clip)
            .into_iter()
            .any(|k| !is_rectangle(doc, k, true))
        {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">{body}</svg>"#
        ))
        .unwrap()
    }

    #[test]
    fn rectangles() {
        let d = doc(concat!(
            r#"<rect id="a" width="10" height="5"/>"#,
            r#"<path id="b" d="M 0,0 H 10 V 5 H 0 Z"/>"#,
            r#"<path id="c" d="M 0,0 L 10,2 L 10,5 L 0,5 Z"/>"#,
            r#"<rect id="d" width="10" height="5" transform="rotate(30)"/>"#,
            r#"<circle id="e" r="3"/>"#,
            r##"<use id="f" xlink:href="#a"/>"##,
        ));
        let get = |id| d.element_by_id(id).unwrap();
        assert!(is_rectangle(&d, get("a"), true));
        assert!(is_rectangle(&d, get("b"), true));
        assert!(!is_rectangle(&d, get("c"), true));
        assert!(!is_rectangle(&d, get("d"), true));
        assert!(is_rectangle(&d, get("d"), false));
        assert!(!is_rectangle(&d, get("e"), true));
        assert!(is_rectangle(&d, get("f"), true));
    }

    #[test]
    fn masked_and_clipped() {
        let d = doc(concat!(
            r#"<clipPath id="cp"><circle r="2"/></clipPath><mask id="m"/>"#,
            r#"<rect id="a" width="10" height="5" clip-path="url(#cp)"/>"#,
            r#"<rect id="b" width="10" height="5" mask="url(#m)"/>"#,
        ));
        assert!(!is_rectangle(&d, d.element_by_id("a").unwrap(), true));
        assert!(!is_rectangle(&d, d.element_by_id("b").unwrap(), false));
    }

    #[test]
    fn paths() {
        let d = doc(r#"<polygon id="p" points="0,0 4,0 4,3"/><line id="l" x2="3" y2="4"/>"#);
        let p = shape_path(&d, d.element_by_id("p").unwrap()).unwrap();
        assert_eq!(p.bounding_box(), Rect::new(0., 0., 4., 3.));
        let l = shape_path(&d, d.element_by_id("l").unwrap()).unwrap();
        assert_eq!(l.elements().len(), 2);
    }
}
