// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Extents and ink boxes, in the untransformed coordinates of the text element.

use kurbo::Rect;

use super::model::Quad;
use super::ParsedText;
use crate::dom::{format_transform, Document, NodeId};
use crate::util::format_coord;

/// Fill of the first highlight rectangle. Later rectangles alternate with
/// [`HIGHLIGHT_STYLE_ALT`].
const HIGHLIGHT_STYLE: &str = "fill:#007575;fill-opacity:0.4675";
const HIGHLIGHT_STYLE_ALT: &str = "fill:#007575;fill-opacity:0.5675";

/// What [`ParsedText::make_highlights`] draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    /// The extent of each character.
    Char,
    /// The ink box of each character.
    CharInk,
    /// The ink box of the whole element.
    FullInk,
    /// The extent of each chunk.
    Chunk,
    /// The extent of each line.
    Line,
    /// The ink box of each chunk.
    ChunkInk,
    /// The ink box of each line.
    LineInk,
    /// The extent of the whole element.
    All,
}

impl HighlightKind {
    /// Parses a kind by name: `char`, `charink`, `fullink`, `chunk`, `line`,
    /// `chunkink`, `lineink` or `all`.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "char" => Self::Char,
            "charink" => Self::CharInk,
            "fullink" => Self::FullInk,
            "chunk" => Self::Chunk,
            "line" => Self::Line,
            "chunkink" => Self::ChunkInk,
            "lineink" => Self::LineInk,
            "all" => Self::All,
            _ => return None,
        })
    }
}

/// The box spanned by the bottom left and top right corners of a quad.
fn extent(q: &Quad) -> Rect {
    Rect::from_points(q[0], q[2])
}

fn union_all(it: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    it.into_iter().reduce(|a, b| a.union(b))
}

impl ParsedText {
    /// Whether the element produced any lines to measure.
    fn has_extents(&self) -> bool {
        !self.lns.is_empty()
    }

    fn char_indices(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.lns
            .iter()
            .enumerate()
            .flat_map(|(li, l)| (0..l.chars.len()).map(move |i| (li, i)))
    }

    /// The ink box of every drawn character.
    ///
    /// Characters of flowed text that did not fit are skipped.
    pub fn get_char_inkbbox(&self) -> Vec<Rect> {
        if !self.has_extents() {
            return Vec::new();
        }
        self.char_indices()
            .map(|(li, i)| self.char_pts_ut_ink(li, i))
            .filter(|q| !q[0].y.is_nan())
            .map(|q| extent(&q))
            .collect()
    }

    /// The ink box of the whole element.
    pub fn get_full_inkbbox(&self) -> Option<Rect> {
        if !self.has_extents() {
            return None;
        }
        union_all(
            self.char_indices()
                .map(|(li, i)| extent(&self.char_pts_ut_ink(li, i))),
        )
    }

    /// The extent of every drawn character: its advance wide, from its baseline to its
    /// cap height.
    pub fn get_char_extents(&self) -> Vec<Rect> {
        if !self.has_extents() {
            return Vec::new();
        }
        self.char_indices()
            .map(|(li, i)| self.char_pts_ut(li, i))
            .filter(|q| !q[0].y.is_nan())
            .map(|q| extent(&q))
            .collect()
    }

    /// The extent of every drawn chunk.
    pub fn get_chunk_extents(&self) -> Vec<Rect> {
        if !self.has_extents() {
            return Vec::new();
        }
        (0..self.lns.len())
            .flat_map(|li| (0..self.lns[li].chks.len()).map(move |ci| (li, ci)))
            .map(|(li, ci)| self.chunk_pts_ut(li, ci))
            .filter(|q| !q[0].y.is_nan())
            .map(|q| extent(&q))
            .collect()
    }

    /// The extent of every line with drawn chunks.
    pub fn get_line_extents(&self) -> Vec<Rect> {
        if !self.has_extents() {
            return Vec::new();
        }
        (0..self.lns.len())
            .filter_map(|li| {
                union_all(
                    (0..self.lns[li].chks.len())
                        .map(|ci| self.chunk_pts_ut(li, ci))
                        .filter(|q| !q[0].y.is_nan())
                        .map(|q| extent(&q)),
                )
            })
            .collect()
    }

    /// The ink box of every chunk.
    pub fn get_chunk_ink(&self) -> Vec<Rect> {
        if !self.has_extents() {
            return Vec::new();
        }
        let mut exts = Vec::new();
        for (li, line) in self.lns.iter().enumerate() {
            for chk in &line.chks {
                exts.extend(union_all(
                    chk.iis.iter().map(|&i| extent(&self.char_pts_ut_ink(li, i))),
                ));
            }
        }
        exts
    }

    /// The ink box of every line.
    pub fn get_line_ink(&self) -> Vec<Rect> {
        if !self.has_extents() {
            return Vec::new();
        }
        (0..self.lns.len())
            .filter_map(|li| {
                union_all(
                    (0..self.lns[li].chars.len())
                        .map(|i| extent(&self.char_pts_ut_ink(li, i))),
                )
            })
            .collect()
    }

    /// The extent of the whole element.
    ///
    /// With `parsed`, characters use the positions recorded by
    /// [`ParsedTextList::precalcs`](super::ParsedTextList::precalcs) where there are
    /// any, which is where they were before the text was edited.
    pub fn get_full_extent(&self, parsed: bool) -> Option<Rect> {
        if !self.has_extents() {
            return None;
        }
        union_all(
            self.char_indices()
                .map(|(li, i)| {
                    let recorded = self.lns[li].chars[i].parsed_pts_ut.filter(|_| parsed);
                    recorded.unwrap_or_else(|| self.char_pts_ut(li, i))
                })
                .filter(|q| !q[0].y.is_nan())
                .map(|q| extent(&q)),
        )
    }

    /// The boxes drawn for a [`HighlightKind`].
    pub fn highlight_extents(&self, kind: HighlightKind) -> Vec<Rect> {
        match kind {
            HighlightKind::Char => self.get_char_extents(),
            HighlightKind::CharInk => self.get_char_inkbbox(),
            HighlightKind::FullInk => self.get_full_inkbbox().into_iter().collect(),
            HighlightKind::Chunk => self.get_chunk_extents(),
            HighlightKind::Line => self.get_line_extents(),
            HighlightKind::ChunkInk => self.get_chunk_ink(),
            HighlightKind::LineInk => self.get_line_ink(),
            HighlightKind::All => self.get_full_extent(false).into_iter().collect(),
        }
    }

    /// Draws a rectangle over every box of a [`HighlightKind`], appended to the root of
    /// the document, and returns the rectangles.
    pub fn make_highlights(&self, doc: &mut Document, kind: HighlightKind) -> Vec<NodeId> {
        let xform = format_transform(doc.composed_transform(self.textel));
        let root = doc.root();
        self.highlight_extents(kind)
            .into_iter()
            .enumerate()
            .map(|(i, ext)| {
                let r = doc.create_element("rect");
                doc.set(r, "x", format_coord(ext.x0));
                doc.set(r, "y", format_coord(ext.y0));
                doc.set(r, "width", format_coord(ext.width()));
                doc.set(r, "height", format_coord(ext.height()));
                doc.set_opt(r, "transform", xform.clone());
                let sty = if i % 2 == 0 {
                    HIGHLIGHT_STYLE
                } else {
                    HIGHLIGHT_STYLE_ALT
                };
                doc.set(r, "style", sty);
                doc.append(root, r);
                r
            })
            .collect()
    }
}
