// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Documents and assertions shared by the tests.

use kurbo::Rect;

use crate::dom::{Document, NodeId};
use crate::testing::FixedFonts;
use crate::text::ParsedText;
use crate::TextContext;

/// Tolerance for positions, in user units.
pub(crate) const TOL: f64 = 1e-6;

/// A document with a context measuring it with [`FixedFonts`].
pub(crate) struct TestEnv {
    pub(crate) doc: Document,
    pub(crate) cx: TextContext,
}

impl TestEnv {
    /// Wraps `body` in an `svg` root that declares the editor namespaces.
    pub(crate) fn new(body: &str) -> Self {
        Self::with_fonts(body, FixedFonts::new())
    }

    pub(crate) fn with_fonts(body: &str, fonts: FixedFonts) -> Self {
        let src = format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" "#,
                r#"xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd" "#,
                r#"xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">{}</svg>"#
            ),
            body
        );
        let doc = Document::parse(&src).unwrap();
        Self {
            doc,
            cx: TextContext::with_backend(fonts),
        }
    }

    pub(crate) fn id(&self, id: &str) -> NodeId {
        self.doc
            .element_by_id(id)
            .unwrap_or_else(|| panic!("no element with id {id}"))
    }

    /// Parses an element from scratch.
    pub(crate) fn parse(&mut self, el: NodeId) -> ParsedText {
        self.cx.invalidate(el);
        self.cx.parsed_text(&mut self.doc, el).unwrap().clone()
    }

    pub(crate) fn parse_id(&mut self, id: &str) -> ParsedText {
        let el = self.id(id);
        self.parse(el)
    }
}

/// The extent of every character, in order.
pub(crate) fn char_boxes(pt: &ParsedText) -> Vec<Rect> {
    pt.get_char_extents()
}

pub(crate) fn assert_near(a: f64, b: f64, case: &str) {
    assert!((a - b).abs() < TOL, "{case}: {a} != {b}");
}

pub(crate) fn assert_rects_near(a: &[Rect], b: &[Rect], case: &str) {
    assert_eq!(a.len(), b.len(), "{case}: number of boxes");
    for (i, (ra, rb)) in a.iter().zip(b).enumerate() {
        for (va, vb) in [(ra.x0, rb.x0), (ra.y0, rb.y0), (ra.x1, rb.x1), (ra.y1, rb.y1)] {
            assert_near(va, vb, &format!("{case}, box {i}"));
        }
    }
}
