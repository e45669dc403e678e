// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{assert_near, TestEnv};

fn flow_root(width: f64, text: &str) -> String {
    format!(
        concat!(
            r#"<flowRoot id="f" style="font-size:10px">"#,
            r#"<flowRegion><rect x="0" y="0" width="{}" height="100"/></flowRegion>"#,
            r#"<flowPara>{}</flowPara></flowRoot>"#
        ),
        width, text
    )
}

#[test]
fn lines_break_at_spaces() {
    let mut env = TestEnv::new(&flow_root(22.5, "aaaa bbbb"));
    let pt = env.parse_id("f");
    let lines: Vec<String> = pt.txt().iter().map(|l| l.trim().to_owned()).collect();
    assert_eq!(lines, ["aaaa", "bbbb"]);
    assert_near(pt.chunk_x(0, 0), 0., "first line");
    assert_near(pt.chunk_x(1, 0), 0., "second line");
    assert!(pt.chunk_y(1, 0) > pt.chunk_y(0, 0));
}

#[test]
fn wide_regions_break_inside_words() {
    let mut env = TestEnv::new(&flow_root(200., &"a".repeat(50)));
    let pt = env.parse_id("f");
    // 40 characters of 5 fill the line exactly.
    assert_eq!(pt.lines()[0].chars().len(), 40);
    assert_eq!(pt.txt().concat(), "a".repeat(50));
}

#[test]
fn narrow_regions_move_long_words_down() {
    let mut env = TestEnv::new(&flow_root(20., &"a".repeat(16)));
    let pt = env.parse_id("f");
    assert!(pt.lines().iter().any(|l| l.chars().len() == 16));
    // The word never fits, so nothing is drawn.
    assert!(pt.get_char_extents().is_empty());
}

#[test]
fn flowed_text_becomes_text() {
    let mut env = TestEnv::new(&flow_root(22.5, "aaaa bbbb"));
    let el = env.id("f");
    let mut pt = env.parse(el);

    let texts = pt.flow_to_text(&mut env.doc).unwrap();
    assert_eq!(texts.len(), 2);
    assert!(!env.doc.contains(el));
    let mut words: Vec<String> = Vec::new();
    for &t in &texts {
        assert_eq!(env.doc.tag(t), "text");
        assert!(env.doc.descendants(t).iter().all(|&d| env.doc.tag(d) != "flowRegion"));
        words.push(env.parse(t).txt().concat().trim().to_owned());
    }
    words.sort();
    assert_eq!(words, ["aaaa", "bbbb"]);
}
