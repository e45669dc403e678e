// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Rect;

use crate::testing::FixedFonts;
use crate::text::{HighlightKind, ParsedText, ParsedTextList, Quad};

use super::utils::{assert_near, assert_rects_near, TestEnv};

const HELLO: &str =
    r#"<text id="t" x="10" y="20" transform="translate(5,0)" style="font-size:10px">Hello</text>"#;

#[test]
fn extents_of_one_chunk() {
    let mut env = TestEnv::new(HELLO);
    let pt = env.parse_id("t");
    let whole = Rect::new(10., 13., 33., 20.);

    assert_eq!(pt.get_char_extents().len(), 5);
    assert_rects_near(&pt.get_chunk_extents(), &[whole], "chunk");
    assert_rects_near(&pt.get_line_extents(), &[whole], "line");
    assert_rects_near(&pt.get_full_extent(false).into_iter().collect::<Vec<_>>(), &[whole], "all");
}

#[test]
fn ink_is_inside_the_advances() {
    let mut env = TestEnv::new(HELLO);
    let pt = env.parse_id("t");
    let ink = pt.get_char_inkbbox();
    let ext = pt.get_char_extents();
    assert_eq!(ink.len(), ext.len());
    for (i, e) in ink.iter().zip(&ext) {
        assert!(i.x0 > e.x0 && i.x1 < e.x1, "{i:?} in {e:?}");
        assert_near(i.y0, e.y0, "cap height");
    }
    let full = pt.get_full_inkbbox().unwrap();
    // H starts at 10 and o ends at 33, each with a margin of 5% of its advance.
    assert_near(full.x0, 10. + 0.05 * 7., "ink left");
    assert_near(full.x1, 28. + 0.95 * 5., "ink right");
    assert_rects_near(&pt.get_line_ink(), &[full], "line ink");
    assert_rects_near(&pt.get_chunk_ink(), &[full], "chunk ink");
}

#[test]
fn highlights_are_drawn_on_the_root() {
    let mut env = TestEnv::new(HELLO);
    let pt = env.parse_id("t");
    let rects = pt.make_highlights(&mut env.doc, HighlightKind::Char);
    assert_eq!(rects.len(), 5);
    let root = env.doc.root();
    for (i, &r) in rects.iter().enumerate() {
        assert_eq!(env.doc.tag(r), "rect");
        assert_eq!(env.doc.parent(r), Some(root));
        assert_eq!(env.doc.get(r, "transform"), Some("translate(5,0)"));
        let opacity = if i % 2 == 0 { "0.4675" } else { "0.5675" };
        assert_eq!(env.doc.style_attr(r).get("fill-opacity"), Some(opacity));
    }
    assert_eq!(env.doc.get(rects[0], "x"), Some("10"));
    assert_eq!(env.doc.get(rects[0], "width"), Some("7"));
}

#[test]
fn highlight_kinds_by_name() {
    assert_eq!(HighlightKind::parse("chunkink"), Some(HighlightKind::ChunkInk));
    assert_eq!(HighlightKind::parse("all"), Some(HighlightKind::All));
    assert_eq!(HighlightKind::parse("glyph"), None);
}

#[test]
fn recorded_extent_survives_edits() {
    let mut env = TestEnv::new(HELLO);
    let el = env.id("t");
    let mut pt = env.parse(el);
    pt.record_parsed_positions();
    pt.delc(&mut env.doc, 0, 4, true);

    let parsed = pt.get_full_extent(true).unwrap();
    let current = pt.get_full_extent(false).unwrap();
    assert_near(parsed.x1, 28., "recorded");
    assert_near(current.x1, 28., "current");
    assert_near(parsed.x0, 10., "recorded");

    // Characters still present keep their recorded boxes; the deleted one is gone.
    assert_eq!(pt.char_count(), 4);
    assert!(pt.chrs().all(|c| c.parsed_pts_ut().is_some()));
}

#[test]
fn lists_share_one_table() {
    let mut env = TestEnv::new(concat!(
        r#"<text id="a" x="0" y="10" style="font-size:10px">ab</text>"#,
        r#"<text id="b" x="0 20" y="30" style="font-size:20px;font-weight:bold">cd</text>"#
    ));
    let (a, b) = (env.id("a"), env.id("b"));
    let mut list = ParsedTextList::new(&mut env.cx, &mut env.doc, &[a, b]).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(env.cx.char_table(&env.doc).elements(), [a, b]);

    list.precalcs();
    list.make_next_chain();
    for pt in &list {
        assert!(pt.chrs().all(|c| c.parsed_pts_ut().is_some()));
    }
    let second = &list.texts()[1];
    let chunks = second.lines()[0].chunks();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].next(), Some(chunks[1].id()));
    assert_eq!(chunks[1].prev(), Some(chunks[0].id()));
    assert!(chunks[1].prev_same_span());
}

fn assert_quads_near(a: &Quad, b: &Quad, case: &str) {
    for (p, q) in a.iter().zip(b) {
        assert_near(p.x, q.x, case);
        assert_near(p.y, q.y, case);
    }
}

#[test]
fn batch_geometry_agrees_with_each_chunk() {
    let fonts = FixedFonts::new()
        .with_kerning('A', 'V', -0.1)
        .with_kerning('V', 'A', -0.1);
    let mut env = TestEnv::with_fonts(
        concat!(
            r#"<text id="a" x="40" y="20" transform="rotate(30) translate(4,2)" "#,
            r#"style="font-size:10px;text-anchor:middle">"#,
            r#"AVA<tspan dx="1.5 0 -2" dy="-2">bcd</tspan></text>"#,
            r#"<text id="b" x="0 30" y="50" style="font-size:12px;letter-spacing:1px">"#,
            r#"abcd<tspan y="70">ef</tspan></text>"#
        ),
        fonts,
    );
    let (a, b) = (env.id("a"), env.id("b"));
    let mut list = ParsedTextList::new(&mut env.cx, &mut env.doc, &[a, b]).unwrap();
    // Copies that only ever measure chunk by chunk.
    let lazy: Vec<ParsedText> = list.texts().to_vec();
    list.precalcs();

    let first = &list.texts()[0];
    assert_ne!(first.chunk_pts_t(0, 0), first.chunk_pts_ut(0, 0), "transformed");
    assert_eq!(lazy[1].lines().len(), 2);
    for (pt, each) in list.texts().iter().zip(&lazy) {
        for (li, line) in each.lines().iter().enumerate() {
            for ci in 0..line.chunks().len() {
                let case = format!("line {li}, chunk {ci}");
                assert_quads_near(&pt.chunk_pts_ut(li, ci), &each.chunk_pts_ut(li, ci), &case);
                assert_quads_near(&pt.chunk_pts_t(li, ci), &each.chunk_pts_t(li, ci), &case);
            }
            for (i, c) in pt.lines()[li].chars().iter().enumerate() {
                let case = format!("line {li}, character {i}");
                assert_quads_near(&c.parsed_pts_ut().unwrap(), &each.char_pts_ut(li, i), &case);
                assert_quads_near(&c.parsed_pts_t().unwrap(), &each.char_pts_t(li, i), &case);
            }
        }
    }
}
