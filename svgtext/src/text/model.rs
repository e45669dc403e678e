// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cell::OnceCell;
use core::hash::{Hash, Hasher};
use std::sync::Arc;

use kurbo::{Affine, Point, Rect};
use smallvec::{smallvec, SmallVec};
use svgtext_primitives::TextAnchor;

use super::BlockKind;
use crate::dom::{FontSize, NodeId, Style};
use crate::font::{CProp, FontKey};

/// The four corners of a box: bottom left, top left, top right, bottom right.
pub type Quad = [Point; 4];

/// Where a character lives in the document.
///
/// Two locations are equal when they name the same character slot, whatever element
/// they take their style from.
#[derive(Clone, Copy, Debug)]
pub struct CLoc {
    /// The element whose text or tail holds the character.
    pub elem: NodeId,
    /// Whether the character is in the text or the tail of `elem`.
    pub kind: BlockKind,
    /// Index of the character in that string, in `char`s.
    pub ind: usize,
    /// The element the character takes its style from: `elem` for text and the parent
    /// of `elem` for tails.
    pub sel: NodeId,
}

impl CLoc {
    /// Creates a location.
    pub fn new(elem: NodeId, kind: BlockKind, ind: usize, sel: NodeId) -> Self {
        Self {
            elem,
            kind,
            ind,
            sel,
        }
    }
}

impl PartialEq for CLoc {
    fn eq(&self, other: &Self) -> bool {
        self.elem == other.elem && self.kind == other.kind && self.ind == other.ind
    }
}

impl Eq for CLoc {}

impl Hash for CLoc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.elem.hash(state);
        self.kind.hash(state);
        self.ind.hash(state);
    }
}

/// A stable handle to a character of a [`ParsedText`](super::ParsedText).
///
/// Indices of characters shift as characters are deleted; ids do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharId(pub(crate) u32);

/// A stable handle to a chunk of a [`ParsedText`](super::ParsedText).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub(crate) u32);

/// One character.
#[derive(Clone, Debug)]
pub struct TChar {
    pub(crate) id: CharId,
    pub(crate) c: char,
    /// Font size as drawn.
    pub(crate) tfs: f64,
    /// Font size in the user units of the character's element.
    pub(crate) utfs: f64,
    pub(crate) prop: CProp,
    pub(crate) sty: Arc<Style>,
    pub(crate) fsty: FontKey,
    pub(crate) tsty: Option<FontKey>,
    pub(crate) loc: CLoc,
    pub(crate) dx: f64,
    pub(crate) dy: f64,
    pub(crate) ax: Option<f64>,
    pub(crate) ay: Option<f64>,
    pub(crate) lsp: f64,
    pub(crate) bshft: f64,
    /// Index of the chunk in the line.
    pub(crate) chk: usize,
    /// Index in the chunk.
    pub(crate) windex: usize,
    /// Flowed text only: space above and below the baseline.
    pub(crate) lhs: (f64, f64),
    pub(crate) parsed_pts_ut: Option<Quad>,
    pub(crate) parsed_pts_t: Option<Quad>,
}

impl TChar {
    pub(crate) fn new(
        id: CharId,
        c: char,
        fs: FontSize,
        prop: CProp,
        sty: Arc<Style>,
        fsty: FontKey,
        tsty: Option<FontKey>,
        loc: CLoc,
        dx: f64,
        dy: f64,
    ) -> Self {
        Self {
            id,
            c,
            tfs: fs.transformed,
            utfs: fs.untransformed,
            prop,
            sty,
            fsty,
            tsty,
            loc,
            dx,
            dy,
            ax: None,
            ay: None,
            lsp: 0.,
            bshft: 0.,
            chk: 0,
            windex: 0,
            lhs: (0., 0.),
            parsed_pts_ut: None,
            parsed_pts_t: None,
        }
    }

    /// The stable id of the character.
    pub fn id(&self) -> CharId {
        self.id
    }

    /// The character.
    pub fn char(&self) -> char {
        self.c
    }

    /// Where the character lives in the document.
    pub fn loc(&self) -> CLoc {
        self.loc
    }

    /// The specified style of the element the character takes its style from.
    pub fn style(&self) -> &Style {
        &self.sty
    }

    /// The nominal font.
    pub fn font(&self) -> &FontKey {
        &self.fsty
    }

    /// The font the character is drawn with, `None` if no font covers it.
    pub fn true_font(&self) -> Option<&FontKey> {
        self.tsty.as_ref()
    }

    /// The metrics record of the character.
    pub fn prop(&self) -> &CProp {
        &self.prop
    }

    /// Font size as drawn, in document units.
    pub fn tfs(&self) -> f64 {
        self.tfs
    }

    /// Font size in the character's user units.
    pub fn utfs(&self) -> f64 {
        self.utfs
    }

    /// Scale from user units to document units.
    pub fn scf(&self) -> f64 {
        self.tfs / self.utfs
    }

    /// Advance, in user units.
    pub fn cwd(&self) -> f64 {
        self.prop.charw * self.utfs
    }

    /// Cap height, in user units.
    pub fn caph(&self) -> f64 {
        self.prop.caph * self.utfs
    }

    /// Width of a space in the character's font, in user units.
    pub fn spw(&self) -> f64 {
        self.prop.spacew * self.utfs
    }

    /// The advance correction when `right` follows `left` in this character's font.
    pub fn dadv(&self, left: char, right: char) -> f64 {
        self.prop.dadv(left, right) * self.utfs
    }

    /// Shift from the `dx` attribute.
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Shift from the `dy` attribute.
    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Absolute `x` to write for the character, if any.
    pub fn ax(&self) -> Option<f64> {
        self.ax
    }

    /// Absolute `y` to write for the character, if any.
    pub fn ay(&self) -> Option<f64> {
        self.ay
    }

    /// Letter spacing, added after the character.
    pub fn lsp(&self) -> f64 {
        self.lsp
    }

    /// Baseline shift, upwards.
    pub fn bshft(&self) -> f64 {
        self.bshft
    }

    /// Index of the character's chunk within its line.
    pub fn chunk(&self) -> usize {
        self.chk
    }

    /// Index of the character within its chunk.
    pub fn windex(&self) -> usize {
        self.windex
    }

    /// Untransformed box of the character when it was first parsed or precalculated.
    pub fn parsed_pts_ut(&self) -> Option<Quad> {
        self.parsed_pts_ut
    }

    /// Transformed box of the character when it was first parsed or precalculated.
    pub fn parsed_pts_t(&self) -> Option<Quad> {
        self.parsed_pts_t
    }
}

/// Positions of a chunk's characters relative to its line, and the chunk's box.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ChunkGeometry {
    pub(crate) lft: Vec<f64>,
    pub(crate) rgt: Vec<f64>,
    pub(crate) btm: Vec<f64>,
    pub(crate) top: Vec<f64>,
    pub(crate) pts_ut: Quad,
    pub(crate) pts_t: Quad,
    pub(crate) bbox: Rect,
}

/// A run of characters of one line that share one `x`/`y` anchor.
#[derive(Clone, Debug)]
pub struct TChunk {
    pub(crate) id: ChunkId,
    /// Indices of the chunk's characters in the line.
    pub(crate) iis: SmallVec<[usize; 8]>,
    pub(crate) nextw: Option<ChunkId>,
    pub(crate) prevw: Option<ChunkId>,
    pub(crate) prevsametspan: bool,
    pub(crate) geom: OnceCell<ChunkGeometry>,
}

impl TChunk {
    pub(crate) fn new(id: ChunkId, first: usize) -> Self {
        Self {
            id,
            iis: smallvec![first],
            nextw: None,
            prevw: None,
            prevsametspan: false,
            geom: OnceCell::new(),
        }
    }

    /// The stable id of the chunk.
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// Indices of the chunk's characters within the line.
    pub fn indices(&self) -> &[usize] {
        &self.iis
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.iis.len()
    }

    /// Returns `true` if the chunk has no characters.
    pub fn is_empty(&self) -> bool {
        self.iis.is_empty()
    }

    /// The chunk to the right on the same baseline, see
    /// [`ParsedText::make_next_chain`](super::ParsedText::make_next_chain).
    pub fn next(&self) -> Option<ChunkId> {
        self.nextw
    }

    /// The chunk to the left on the same baseline.
    pub fn prev(&self) -> Option<ChunkId> {
        self.prevw
    }

    /// Whether the chunk to the left ends in the element this chunk starts in.
    pub fn prev_same_span(&self) -> bool {
        self.prevsametspan
    }

    pub(crate) fn invalidate(&mut self) {
        self.geom.take();
    }
}

/// One line of text.
///
/// A line takes its position from one source element (a top-level `tspan`, the text
/// element, or a line of flowed text), or continues where the previous line ended.
#[derive(Clone, Debug)]
pub struct TLine {
    pub(crate) xv: Vec<Option<f64>>,
    pub(crate) yv: Vec<Option<f64>>,
    pub(crate) continuex: bool,
    pub(crate) continuey: bool,
    pub(crate) xsrc: NodeId,
    pub(crate) ysrc: NodeId,
    /// Whether the line is an enabled `sodipodi:role="line"` line.
    pub(crate) sprl: bool,
    /// Ancestors of the source (and the source) marked as `sodipodi:role="line"`.
    pub(crate) sprlabove: Vec<NodeId>,
    pub(crate) anchor: TextAnchor,
    pub(crate) transform: Affine,
    /// Position among the text element's children, for top-level lines.
    pub(crate) tlvlno: Option<usize>,
    pub(crate) style: Arc<Style>,
    pub(crate) chars: Vec<TChar>,
    pub(crate) chks: Vec<TChunk>,
    /// Flowed text only: whether the paragraph of the line was broken.
    pub(crate) broken: bool,
    pub(crate) effabsp: f64,
    pub(crate) effbbsp: f64,
}

impl TLine {
    pub(crate) fn new(
        xv: Vec<Option<f64>>,
        yv: Vec<Option<f64>>,
        xsrc: NodeId,
        ysrc: NodeId,
        anchor: TextAnchor,
        transform: Affine,
        style: Arc<Style>,
    ) -> Self {
        Self {
            xv,
            yv,
            continuex: false,
            continuey: false,
            xsrc,
            ysrc,
            sprl: false,
            sprlabove: Vec::new(),
            anchor,
            transform,
            tlvlno: None,
            style,
            chars: Vec::new(),
            chks: Vec::new(),
            broken: false,
            effabsp: 0.,
            effbbsp: 0.,
        }
    }

    /// The characters, in document order.
    pub fn chars(&self) -> &[TChar] {
        &self.chars
    }

    /// The chunks, in document order.
    pub fn chunks(&self) -> &[TChunk] {
        &self.chks
    }

    /// The characters of a chunk.
    pub fn chunk_chars(&self, chunk: usize) -> impl Iterator<Item = &TChar> + '_ {
        self.chks[chunk].iis.iter().map(|&i| &self.chars[i])
    }

    /// The text of the line.
    pub fn txt(&self) -> String {
        self.chars.iter().map(|c| c.c).collect()
    }

    /// The text anchor.
    pub fn anchor(&self) -> TextAnchor {
        self.anchor
    }

    /// The anchor fraction: 0 for start, 0.5 for middle and 1 for end.
    pub fn anchfrac(&self) -> f64 {
        self.anchor.fraction()
    }

    /// The composed transform of the line's element.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// The element the line's `x` is written to.
    pub fn xsrc(&self) -> NodeId {
        self.xsrc
    }

    /// The element the line's `y` is written to.
    pub fn ysrc(&self) -> NodeId {
        self.ysrc
    }

    /// Whether `x` continues from the end of the previous line.
    pub fn continues_x(&self) -> bool {
        self.continuex
    }

    /// Whether `y` continues from the end of the previous line.
    pub fn continues_y(&self) -> bool {
        self.continuey
    }

    /// Whether the line is an enabled `sodipodi:role="line"` line.
    pub fn is_sodipodi_line(&self) -> bool {
        self.sprl
    }

    /// Elements above the line's source marked as `sodipodi:role="line"`.
    pub fn sodipodi_above(&self) -> &[NodeId] {
        &self.sprlabove
    }

    /// Position of the line's element among the text element's children, for top-level
    /// lines.
    pub fn top_level_index(&self) -> Option<usize> {
        self.tlvlno
    }

    /// The specified style of the element that started the line.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// The rotation of the line, in degrees.
    pub fn angle(&self) -> f64 {
        let [_, _, c, d, _, _] = self.transform.as_coeffs();
        c.atan2(d).to_degrees()
    }

    /// Renumbers chunk membership after characters or chunks changed.
    pub(crate) fn reindex(&mut self) {
        for (k, chk) in self.chks.iter().enumerate() {
            for (w, &i) in chk.iis.iter().enumerate() {
                if let Some(c) = self.chars.get_mut(i) {
                    c.chk = k;
                    c.windex = w;
                }
            }
        }
    }

    pub(crate) fn invalidate(&mut self) {
        for chk in &mut self.chks {
            chk.invalidate();
        }
    }
}
