// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use svgtext_primitives::FamilyName;

use crate::testing::{FixedFonts, FALLBACK_FAMILY};
use crate::{LayoutSettings, TextContext};

use super::utils::{assert_near, assert_rects_near, char_boxes, TestEnv};

const AV: &str = r#"<text id="t" x="0" y="20" style="font-size:10px">AV</text>"#;

#[test]
fn kerning_moves_the_second_character() {
    let mut env = TestEnv::with_fonts(AV, FixedFonts::new().with_kerning('A', 'V', -0.1));
    let pt = env.parse_id("t");
    let boxes = char_boxes(&pt);
    assert_near(boxes[0].x1, 7., "A");
    assert_near(boxes[1].x0, 6., "V kerned");
    assert_near(boxes[1].x1, 13., "V kerned");
}

#[test]
fn pair_corrections_can_be_disabled() {
    let mut env = TestEnv::new(AV);
    env.cx = TextContext::with_backend(FixedFonts::new().with_kerning('A', 'V', -0.1))
        .with_settings(LayoutSettings {
            differential_advances: false,
            ..LayoutSettings::default()
        });
    let pt = env.parse_id("t");
    assert_near(char_boxes(&pt)[1].x0, 7., "V unkerned");
}

#[test]
fn shaping_and_glyph_tables_agree() {
    let body = concat!(
        r#"<text id="t" x="3" y="20" style="font-size:10px">iiiWWW"#,
        r#"<tspan style="font-weight:bold">Ma j</tspan></text>"#
    );
    let shaped = char_boxes(&TestEnv::new(body).parse_id("t"));
    let mut read_env = TestEnv::with_fonts(body, FixedFonts::new().without_shaping());
    let read = char_boxes(&read_env.parse_id("t"));
    assert_rects_near(&shaped, &read, "shaped against read");

    // Narrow letters first, then wide ones.
    let widths: Vec<f64> = shaped[..6].iter().map(|r| r.width()).collect();
    assert!(widths.windows(2).all(|w| w[0] <= w[1]), "{widths:?}");
}

#[test]
fn spaces_between_fallback_characters_use_the_fallback_font() {
    let mut env = TestEnv::with_fonts(
        r#"<text id="t" x="0" y="20" style="font-size:10px;font-family:Fixed">ab bc</text>"#,
        FixedFonts::new().with_fallback('b'),
    );
    let pt = env.parse_id("t");
    let chars = pt.lines()[0].chars();
    let family = |i: usize| chars[i].true_font().and_then(|f| f.primary_family()).cloned();
    let fixed = Some(FamilyName::Named("Fixed".to_owned()));
    // Other characters are measured in the font the text asks for.
    assert_eq!(family(0), fixed);
    assert_eq!(family(1), fixed);
    assert_eq!(family(2), Some(FamilyName::Named(FALLBACK_FAMILY.to_owned())));
    assert_eq!(family(4), fixed);
    assert_near(char_boxes(&pt)[4].x0, 17.5, "after the space");
}
