// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The line, chunk and character model of text elements.
//!
//! A [`ParsedText`] owns its lines ([`TLine`]); each line owns its characters ([`TChar`])
//! and the chunks ([`TChunk`]) that group them by position anchor. Chunks refer to their
//! characters by index into the line, and characters record the index of their chunk.
//! Geometry is computed per chunk on demand and cached until the chunk changes.

mod batch;
mod edit;
mod flow;
mod geometry;
mod model;
mod parse;
mod query;
mod tree;
mod write;

use std::sync::Arc;

use crate::dom::{Document, NodeId};
use crate::font::CharacterTable;
use crate::{Error, LayoutSettings};

pub use batch::ParsedTextList;
pub use edit::{delete_empty_nodes, ChunkJoin, ScriptPosition};
pub use model::{CLoc, CharId, ChunkId, Quad, TChar, TChunk, TLine};
pub use query::HighlightKind;
pub use tree::{Block, BlockKind, TextTree};

/// A text element parsed into lines, chunks and characters.
///
/// Built by [`TextContext::parsed_text`](crate::TextContext::parsed_text). Queries take
/// `&self`; operations that change the document take the document they were parsed
/// from.
#[derive(Clone, Debug)]
pub struct ParsedText {
    pub(crate) textel: NodeId,
    pub(crate) ctable: Arc<CharacterTable>,
    pub(crate) settings: LayoutSettings,
    pub(crate) isflow: bool,
    pub(crate) lns: Vec<TLine>,
    /// `dx`/`dy` values changed and have to be written.
    pub(crate) dchange: bool,
    /// Absolute positions changed and have to be written.
    pub(crate) achange: bool,
    pub(crate) writtendx: bool,
    pub(crate) writtendy: bool,
    /// Flowed text only: a paragraph follows the last laid out character.
    pub(crate) fparaafter: bool,
    pub(crate) isinkscape: bool,
    pub(crate) ismlinkscape: bool,
    pub(crate) tree: Option<TextTree>,
    next_char: u32,
    next_chunk: u32,
}

impl ParsedText {
    /// Parses a `text` or `flowRoot` element.
    ///
    /// Parsing normalizes some markup in place: position lists longer than the text they
    /// annotate are redistributed, and inactive `sodipodi:role="line"` markers are
    /// removed (see [`LayoutSettings::remove_position_overflows`]).
    pub fn new(
        doc: &mut Document,
        elem: NodeId,
        ctable: Arc<CharacterTable>,
        settings: LayoutSettings,
    ) -> Result<Self, Error> {
        doc.check(elem)?;
        if !matches!(doc.tag(elem), "text" | "flowRoot") {
            return Err(Error::NotText(elem));
        }
        let mut ret = Self {
            textel: elem,
            ctable,
            settings,
            isflow: false,
            lns: Vec::new(),
            dchange: false,
            achange: false,
            writtendx: false,
            writtendy: false,
            fparaafter: false,
            isinkscape: false,
            ismlinkscape: false,
            tree: None,
            next_char: 0,
            next_chunk: 0,
        };
        ret.build(doc)?;
        Ok(ret)
    }

    /// The text element.
    pub fn element(&self) -> NodeId {
        self.textel
    }

    /// The character table the text was measured with.
    pub fn char_table(&self) -> &Arc<CharacterTable> {
        &self.ctable
    }

    /// The lines, in document order.
    pub fn lines(&self) -> &[TLine] {
        &self.lns
    }

    /// The text of each line.
    pub fn txt(&self) -> Vec<String> {
        self.lns.iter().map(TLine::txt).collect()
    }

    /// All characters, line by line.
    pub fn chrs(&self) -> impl Iterator<Item = &TChar> + '_ {
        self.lns.iter().flat_map(|l| l.chars.iter())
    }

    /// Number of characters.
    pub fn char_count(&self) -> usize {
        self.lns.iter().map(|l| l.chars.len()).sum()
    }

    /// Whether the text is flowed into a region.
    pub fn is_flow(&self) -> bool {
        self.isflow
    }

    /// Whether the text looks like an editor made it: every top-level line after the
    /// first is a `sodipodi:role="line"` line and every line names its font.
    pub fn is_inkscape(&self) -> bool {
        self.isinkscape
    }

    /// [`ParsedText::is_inkscape`] with more than one line.
    pub fn is_multiline_inkscape(&self) -> bool {
        self.ismlinkscape
    }

    /// Whether `dx`/`dy` values were changed but not written yet.
    pub fn has_pending_deltas(&self) -> bool {
        self.dchange
    }

    /// The line and index of a character.
    pub fn locate(&self, id: CharId) -> Option<(usize, usize)> {
        self.lns.iter().enumerate().find_map(|(li, l)| {
            l.chars
                .iter()
                .position(|c| c.id == id)
                .map(|i| (li, i))
        })
    }

    /// The line and index of a chunk.
    pub fn locate_chunk(&self, id: ChunkId) -> Option<(usize, usize)> {
        self.lns.iter().enumerate().find_map(|(li, l)| {
            l.chks
                .iter()
                .position(|c| c.id == id)
                .map(|i| (li, i))
        })
    }

    /// The character with the given id.
    pub fn char(&self, id: CharId) -> Option<&TChar> {
        let (li, i) = self.locate(id)?;
        Some(&self.lns[li].chars[i])
    }

    pub(crate) fn new_char_id(&mut self) -> CharId {
        self.next_char += 1;
        CharId(self.next_char)
    }

    pub(crate) fn new_chunk_id(&mut self) -> ChunkId {
        self.next_chunk += 1;
        ChunkId(self.next_chunk)
    }

    /// The tree of the text element, rebuilt if the document's structure changed.
    pub(crate) fn take_tree(&mut self, doc: &Document) -> TextTree {
        match self.tree.take() {
            Some(t) if t.is_current(doc) => t,
            _ => TextTree::new(doc, self.textel),
        }
    }

    /// Drops cached geometry of a line and of the lines that continue from it.
    pub(crate) fn invalidate_line(&mut self, li: usize) {
        let Some(line) = self.lns.get_mut(li) else {
            return;
        };
        line.invalidate();
        for next in self.lns.iter_mut().skip(li + 1) {
            if !(next.continuex || next.continuey) {
                break;
            }
            next.invalidate();
        }
    }

    /// Drops cached geometry of a chunk, and of the following lines if they continue
    /// from it.
    pub(crate) fn invalidate_chunk(&mut self, li: usize, ci: usize) {
        let nchks = self.lns[li].chks.len();
        if ci + 1 >= nchks {
            self.invalidate_line(li);
        } else if let Some(chk) = self.lns[li].chks.get_mut(ci) {
            chk.invalidate();
        }
    }

    pub(crate) fn invalidate_all(&mut self) {
        for line in &mut self.lns {
            line.invalidate();
        }
    }

    /// Sets the `dx` of a character. Written by [`ParsedText::write_dxdy`].
    pub fn set_dx(&mut self, li: usize, i: usize, dx: f64) {
        let c = &mut self.lns[li].chars[i];
        if c.dx != dx {
            c.dx = dx;
            let ci = c.chk;
            self.invalidate_chunk(li, ci);
            self.dchange = true;
        }
    }

    /// Sets the `dy` of a character. Written by [`ParsedText::write_dxdy`].
    pub fn set_dy(&mut self, li: usize, i: usize, dy: f64) {
        let c = &mut self.lns[li].chars[i];
        if c.dy != dy {
            c.dy = dy;
            let ci = c.chk;
            self.invalidate_chunk(li, ci);
            self.dchange = true;
        }
    }

    /// Sets the absolute `x` of a character. Written by [`ParsedText::write_axay`].
    pub fn set_ax(&mut self, li: usize, i: usize, ax: Option<f64>) {
        let c = &mut self.lns[li].chars[i];
        if c.ax != ax {
            c.ax = ax;
            self.achange = true;
        }
    }

    /// Sets the absolute `y` of a character. Written by [`ParsedText::write_axay`].
    pub fn set_ay(&mut self, li: usize, i: usize, ay: Option<f64>) {
        let c = &mut self.lns[li].chars[i];
        if c.ay != ay {
            c.ay = ay;
            self.achange = true;
        }
    }

    /// Sets the letter spacing of a character.
    pub fn set_lsp(&mut self, li: usize, i: usize, lsp: f64) {
        let c = &mut self.lns[li].chars[i];
        if c.lsp != lsp {
            c.lsp = lsp;
            let ci = c.chk;
            self.invalidate_chunk(li, ci);
        }
    }

    /// Sets the baseline shift of a character.
    pub fn set_bshft(&mut self, li: usize, i: usize, bshft: f64) {
        let c = &mut self.lns[li].chars[i];
        if c.bshft != bshft {
            c.bshft = bshft;
            let ci = c.chk;
            self.invalidate_chunk(li, ci);
        }
    }
}
