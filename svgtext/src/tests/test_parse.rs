// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use svgtext_primitives::TextAnchor;

use super::utils::{assert_near, assert_rects_near, char_boxes, TestEnv};

#[test]
fn hello_is_one_chunk() {
    let mut env = TestEnv::new(r#"<text id="t" x="10" y="20" style="font-size:10px">Hello</text>"#);
    let pt = env.parse_id("t");

    assert_eq!(pt.lines().len(), 1);
    let line = &pt.lines()[0];
    assert_eq!(line.chunks().len(), 1);
    assert_eq!(line.chars().len(), 5);
    assert_eq!(line.anchor(), TextAnchor::Start);
    assert_eq!(line.anchfrac(), 0.);
    assert_near(pt.chunk_x(0, 0), 10., "chunk x");
    assert_near(pt.chunk_y(0, 0), 20., "chunk y");

    // H, e, l, l, o
    let width = (0.7 + 0.5 + 0.3 + 0.3 + 0.5) * 10.;
    let ext = pt.get_full_extent(false).unwrap();
    assert_near(ext.width(), width, "extent width");
    assert_near(ext.x0, 10., "extent left");
    assert_near(ext.y1, 20., "extent bottom");
    assert_near(ext.y0, 20. - 7., "extent top");
}

#[test]
fn reparsing_is_idempotent() {
    let mut env = TestEnv::new(concat!(
        r#"<text id="t" x="3" y="9" dx="0 1.5" style="font-size:12px">"#,
        r#"Ab<tspan dy="2" style="font-size:8px">cd</tspan>ef"#,
        r#"<tspan x="40 50" y="30">gh</tspan></text>"#
    ));
    let first = env.parse_id("t");
    let second = env.parse_id("t");

    assert_eq!(first.char_count(), second.char_count());
    assert_eq!(first.txt(), second.txt());
    assert_eq!(first.lines().len(), second.lines().len());
    for (a, b) in first.lines().iter().zip(second.lines()) {
        let ia: Vec<&[usize]> = a.chunks().iter().map(|c| c.indices()).collect();
        let ib: Vec<&[usize]> = b.chunks().iter().map(|c| c.indices()).collect();
        assert_eq!(ia, ib, "chunk segmentation");
    }
    assert_rects_near(&char_boxes(&first), &char_boxes(&second), "reparse");
}

#[test]
fn anchors_weight_the_chunk_width() {
    // H, i, l
    let width = (0.7 + 0.3 + 0.3) * 10.;
    for (anchor, left) in [("start", 50.), ("middle", 50. - width / 2.), ("end", 50. - width)] {
        let mut env = TestEnv::new(&format!(
            r#"<text id="t" x="50" y="20" style="font-size:10px;text-anchor:{anchor}">Hil</text>"#
        ));
        let pt = env.parse_id("t");
        let pts = pt.chunk_pts_ut(0, 0);
        assert_near(pts[0].x, left, anchor);
        assert_near(pts[3].x - pts[0].x, width, anchor);
    }
}

#[test]
fn position_lists_start_chunks() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="0 20 40" y="10" style="font-size:10px">abcd</text>"#,
    );
    let pt = env.parse_id("t");
    let line = &pt.lines()[0];
    let chunks: Vec<String> = (0..line.chunks().len()).map(|ci| pt.chunk_txt(0, ci)).collect();
    assert_eq!(chunks, ["a", "b", "cd"]);
    assert_near(pt.chunk_x(0, 2), 40., "third chunk");
    // The last character continues the third chunk.
    assert_near(pt.char_pts_ut(0, 3)[0].x, 45., "last character");
}

#[test]
fn sodipodi_lines() {
    let mut env = TestEnv::new(concat!(
        r#"<text id="t" x="5" y="10" style="font-size:10px">"#,
        r#"<tspan sodipodi:role="line" x="5" y="10">ab</tspan>"#,
        r#"<tspan sodipodi:role="line" x="5" y="22">cd</tspan></text>"#
    ));
    let pt = env.parse_id("t");
    assert_eq!(pt.txt(), ["ab", "cd"]);
    assert!(pt.lines()[1].is_sodipodi_line());
    // Lines after the first follow the line height, not their own y.
    assert_near(pt.chunk_y(1, 0), 10. + 12.5, "second line");
}

#[test]
fn deltas_accumulate() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="0" y="10" dx="1 2" dy="0 3" style="font-size:10px">ab</text>"#,
    );
    let pt = env.parse_id("t");
    let a = pt.char_pts_ut(0, 0);
    let b = pt.char_pts_ut(0, 1);
    assert_near(a[0].x, 1., "first dx");
    assert_near(b[0].x, 1. + 5. + 2., "second dx");
    assert_near(b[0].y, 13., "second dy");
}

#[test]
fn non_text_elements_are_rejected() {
    let mut env = TestEnv::new(r#"<rect id="r" width="1" height="1"/>"#);
    let r = env.id("r");
    assert!(matches!(
        env.cx.parsed_text(&mut env.doc, r),
        Err(crate::Error::NotText(_))
    ));
}
