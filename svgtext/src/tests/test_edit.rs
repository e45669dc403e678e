// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Rect;
use svgtext_primitives::TextAnchor;

use crate::dom::Style;
use crate::testing::FixedFonts;
use crate::text::{CharId, ScriptPosition};

use super::utils::{assert_near, assert_rects_near, char_boxes, TestEnv};

fn without(boxes: &[Rect], k: usize) -> Vec<Rect> {
    boxes
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != k)
        .map(|(_, r)| *r)
        .collect()
}

#[test]
fn deleting_keeps_other_characters_in_place() {
    for anchor in ["start", "middle", "end"] {
        for k in [0, 2, 4] {
            let case = format!("{anchor}, deleting {k}");
            let mut env = TestEnv::new(&format!(
                r#"<text id="t" x="50" y="20" style="font-size:10px;text-anchor:{anchor}">Hello</text>"#
            ));
            let el = env.id("t");
            let mut pt = env.parse(el);
            let before = char_boxes(&pt);

            pt.delc(&mut env.doc, 0, k, true);
            assert_rects_near(&char_boxes(&pt), &without(&before, k), &case);

            let fresh = env.parse(el);
            assert_eq!(fresh.char_count(), 4, "{case}");
            assert_rects_near(&char_boxes(&fresh), &without(&before, k), &case);
        }
    }
}

#[test]
fn deleting_before_a_continued_line() {
    for k in [0, 2] {
        let case = format!("deleting {k}");
        let mut env = TestEnv::new(concat!(
            r#"<text id="t" x="10" y="20" style="font-size:10px">"#,
            r#"abc<tspan y="40">def</tspan></text>"#
        ));
        let el = env.id("t");
        let mut pt = env.parse(el);
        assert_eq!(pt.lines().len(), 2, "{case}");
        let before = char_boxes(&pt);
        assert_near(before[3].x0, 25., &case);

        pt.delc(&mut env.doc, 0, k, true);
        assert_rects_near(&char_boxes(&pt), &without(&before, k), &case);

        let fresh = env.parse(el);
        assert_rects_near(&char_boxes(&fresh), &without(&before, k), &case);
    }
}

#[test]
fn deleting_across_kerning() {
    let fonts = FixedFonts::new()
        .with_kerning('A', 'V', -0.1)
        .with_kerning('V', 'A', -0.1);
    let mut env = TestEnv::with_fonts(
        r#"<text id="t" x="0" y="20" style="font-size:10px">AVA</text>"#,
        fonts,
    );
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);
    pt.delc(&mut env.doc, 0, 1, true);

    let fresh = env.parse(el);
    assert_eq!(fresh.txt(), ["AA"]);
    assert_rects_near(&char_boxes(&fresh), &without(&before, 1), "middle of a kerned run");
}

#[test]
fn deleting_the_last_character_deletes_the_line() {
    let mut env = TestEnv::new(concat!(
        r#"<text id="t" x="0" y="10" style="font-size:10px">"#,
        r#"<tspan sodipodi:role="line" x="0" y="10">a</tspan>"#,
        r#"<tspan sodipodi:role="line" x="0" y="22">bc</tspan></text>"#
    ));
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);
    pt.delc(&mut env.doc, 0, 0, true);
    assert_eq!(pt.txt(), ["bc"]);

    let fresh = env.parse(el);
    assert_eq!(fresh.txt().concat(), "bc");
    assert_rects_near(&char_boxes(&fresh), &before[1..], "remaining line");
}

#[test]
fn deleting_a_chunk() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="0 30" y="10" style="font-size:10px">abcd</text>"#,
    );
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);
    pt.del_chk(&mut env.doc, 0, 0, true);

    let fresh = env.parse(el);
    assert_eq!(fresh.txt(), ["bcd"]);
    assert_rects_near(&char_boxes(&fresh), &before[1..], "second chunk");
}

#[test]
fn splitting_conserves_characters_and_positions() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="10" y="20" style="font-size:10px">Hello world</text>"#,
    );
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);
    let ids: Vec<CharId> = pt.lines()[0].chars()[6..].iter().map(|c| c.id()).collect();

    let npt = pt.split_off_characters(&mut env.doc, &ids).unwrap().unwrap();
    let new_el = npt.element();
    assert_ne!(new_el, el);

    let rest = env.parse(el);
    let split = env.parse(new_el);
    assert_eq!(rest.char_count() + split.char_count(), 11);
    assert_eq!(rest.txt().concat() + &split.txt().concat(), "Hello world");
    assert_rects_near(&char_boxes(&rest), &before[..6], "remainder");
    assert_rects_near(&char_boxes(&split), &before[6..], "split off");
}

#[test]
fn splitting_a_line_by_index() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="10" y="20" style="font-size:10px;text-anchor:middle">abcdef</text>"#,
    );
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);
    let npt = pt.split_line(&mut env.doc, 0, 3).unwrap().unwrap();

    let rest = env.parse(el);
    let split = env.parse(npt.element());
    assert_eq!(rest.txt(), ["abc"]);
    assert_eq!(split.txt(), ["def"]);
    assert_rects_near(&char_boxes(&rest), &before[..3], "first half");
    assert_rects_near(&char_boxes(&split), &before[3..], "second half");
}

#[test]
fn differential_kerning_becomes_absolute() {
    let mut env = TestEnv::new(concat!(
        r#"<text id="t" x="10" y="20" dx="0 2 0 3" dy="0 0 1" "#,
        r#"style="font-size:10px">Hello</text>"#
    ));
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);

    pt.differential_to_absolute_kerning(&mut env.doc).unwrap();
    assert!(pt.chrs().all(|c| c.dx() == 0. && c.dy() == 0.));
    assert_rects_near(&char_boxes(&pt), &before, "after conversion");
    assert_eq!(env.doc.get(el, "dx"), None);

    let fresh = env.parse(el);
    assert_rects_near(&char_boxes(&fresh), &before, "reparsed");
}

#[test]
fn realigning_keeps_characters_in_place() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="10 40" y="20" style="font-size:10px">abcd</text>"#,
    );
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);

    pt.change_alignment(&mut env.doc, 0, TextAnchor::End);
    let style = env.doc.style_attr(el);
    assert_eq!(style.get("text-anchor"), Some("end"));
    assert_eq!(style.get("text-align"), Some("end"));

    let fresh = env.parse(el);
    assert_eq!(fresh.lines()[0].anchor(), TextAnchor::End);
    assert_rects_near(&char_boxes(&fresh), &before, "realigned");
}

#[test]
fn styling_a_character_wraps_it() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="0" y="20" style="font-size:10px">abc</text>"#,
    );
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);

    let span = pt.add_style(&mut env.doc, 0, 1, &Style::parse("fill:red"), false, false);
    assert_eq!(env.doc.text(el), Some("a"));
    assert_eq!(env.doc.text(span), Some("b"));
    assert_eq!(env.doc.tail(span), Some("c"));
    assert_eq!(env.doc.style_attr(span).get("fill"), Some("red"));
    assert_eq!(pt.lines()[0].chars()[2].loc().elem, span);

    let fresh = env.parse(el);
    assert_eq!(fresh.txt(), ["abc"]);
    assert_rects_near(&char_boxes(&fresh), &before, "wrapped");
}

#[test]
fn appending_a_chunk() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="0 none 20" y="20" style="font-size:10px">abcd</text>"#,
    );
    let el = env.id("t");
    let mut pt = env.parse(el);
    assert_eq!(pt.chunk_txt(0, 0), "ab");
    pt.record_parsed_positions();
    let before = char_boxes(&pt);

    pt.append_chk(&mut env.doc, (0, 0), (0, 1), ScriptPosition::Normal, None)
        .unwrap();
    assert_eq!(pt.lines()[0].chunks().len(), 1);

    let fresh = env.parse(el);
    let txt = fresh.txt().concat();
    // The gap of 10 between "ab" and "cd" is filled with spaces.
    assert_eq!(txt.trim_start_matches("ab").trim_end_matches("cd").len(), 4);
    assert!(txt.starts_with("ab") && txt.ends_with("cd"), "{txt}");
    let after = char_boxes(&fresh);
    assert_rects_near(&after[..2], &before[..2], "first chunk");
}

#[test]
fn duplicates_refer_to_the_copy() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="0" y="20" style="font-size:10px">ab<tspan id="s">cd</tspan></text>"#,
    );
    let el = env.id("t");
    let pt = env.parse(el);
    let copy = pt.duplicate(&mut env.doc);
    assert_ne!(copy.element(), el);
    assert_eq!(copy.txt(), pt.txt());
    for c in copy.chrs() {
        assert!(env.doc.is_ancestor_or_self(copy.element(), c.loc().elem));
    }
}

#[test]
fn stripping_sodipodi_lines_keeps_positions() {
    let mut env = TestEnv::new(concat!(
        r#"<text id="t" x="5" y="10" style="font-size:10px">"#,
        r#"<tspan sodipodi:role="line" x="5" y="10">ab</tspan>"#,
        r#"<tspan sodipodi:role="line" x="5" y="22">cd</tspan></text>"#
    ));
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);
    pt.strip_sodipodi_role_line(&mut env.doc).unwrap();

    let fresh = env.parse(el);
    assert!(fresh.lines().iter().all(|l| !l.is_sodipodi_line()));
    assert_rects_near(&char_boxes(&fresh), &before, "stripped");
}

#[test]
fn fusing_fonts_names_the_face() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="0" y="20" style="font-size:10px;font-weight:bold">ab</text>"#,
    );
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);
    pt.fuse_fonts(&mut env.doc);
    assert_eq!(
        env.doc.style_attr(el).get("font-family"),
        Some("'Fixed Bold','Fixed'")
    );

    env.cx.reset_char_table();
    let fresh = env.parse(el);
    assert_rects_near(&char_boxes(&fresh), &before, "fused");
}

#[test]
fn text_baseline_shift_moves_into_y() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="0" y="20" style="font-size:10px;baseline-shift:4px">ab</text>"#,
    );
    let el = env.id("t");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);
    pt.strip_text_baseline_shift(&mut env.doc).unwrap();
    assert!(!env.doc.style_attr(el).contains("baseline-shift"));

    let fresh = env.parse(el);
    assert_rects_near(&char_boxes(&fresh), &before, "shift removed");
}

#[test]
fn empty_spans_are_removed() {
    let mut env = TestEnv::new(concat!(
        r#"<text id="t" x="0" y="20" style="font-size:10px">"#,
        r#"ab<tspan id="e"/><tspan id="s" style="fill:red">cd</tspan></text>"#
    ));
    let el = env.id("t");
    let e = env.id("e");
    let mut pt = env.parse(el);
    let before = char_boxes(&pt);
    pt.delete_empty(&mut env.doc).unwrap();
    assert!(!env.doc.contains(e));

    let fresh = env.parse(el);
    assert_rects_near(&char_boxes(&fresh), &before, "pruned");
}

#[test]
fn editable_text_carries_its_font() {
    let mut env = TestEnv::new(
        r#"<text id="t" x="0" y="20"><tspan style="font-size:10px;font-family:Fixed">ab</tspan></text>"#,
    );
    let el = env.id("t");
    let mut pt = env.parse(el);
    pt.make_editable(&mut env.doc);
    assert_eq!(env.doc.get(el, "xml:space"), Some("preserve"));
    assert_eq!(env.doc.style_attr(el).get("font-family"), Some("'Fixed'"));
}
