// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry of many text elements at once.

use core::cell::OnceCell;
use core::ops::Range;

use kurbo::Affine;

use super::geometry::{dxeff, quad, quad_bbox, transform_quad};
use super::model::{ChunkGeometry, Quad};
use super::ParsedText;
use crate::dom::{Document, NodeId};
use crate::{Error, TextContext};

/// The parsed text of several elements, measured together.
#[derive(Clone, Debug, Default)]
pub struct ParsedTextList {
    texts: Vec<ParsedText>,
}

impl ParsedTextList {
    /// Parses `elements` through `cx`, which builds one character table for all of them.
    pub fn new(
        cx: &mut TextContext,
        doc: &mut Document,
        elements: &[NodeId],
    ) -> Result<Self, Error> {
        cx.make_char_table(doc, elements);
        let texts = elements
            .iter()
            .map(|&el| cx.parsed_text(doc, el).cloned())
            .collect::<Result<_, _>>()?;
        Ok(Self { texts })
    }

    /// Wraps already parsed text.
    pub fn from_parsed(texts: Vec<ParsedText>) -> Self {
        Self { texts }
    }

    /// Computes the geometry of every chunk, and records where every character is
    /// drawn (see [`TChar::parsed_pts_ut`](super::TChar::parsed_pts_ut)).
    ///
    /// All chunks of all elements are measured in one pass over flat per-character
    /// arrays. The results fill the same caches that
    /// [`ParsedText::chunk_pts_ut`] and [`ParsedText::char_pts_ut`] fill on demand.
    ///
    /// The recorded positions are what later edits are checked against.
    pub fn precalcs(&mut self) {
        let flat = FlatChunks::collect(&self.texts);
        let geoms = flat.geometries();
        log::debug!(
            "precalcs: {} chunks, {} characters",
            flat.chunks.len(),
            flat.cwd.len()
        );
        for (chk, geom) in flat.chunks.iter().zip(geoms) {
            let pt = &mut self.texts[chk.text];
            let line = &mut pt.lns[chk.line];
            for (w, &k) in line.chks[chk.chunk].iis.iter().enumerate() {
                let ut = quad(geom.lft[w], geom.rgt[w], geom.btm[w], geom.top[w]);
                let c = &mut line.chars[k];
                c.parsed_pts_ut = Some(ut);
                c.parsed_pts_t = Some(transform_quad(chk.transform, &ut));
            }
            line.chks[chk.chunk].geom = OnceCell::from(geom);
        }
    }

    /// Links adjacent chunks of every element, see [`ParsedText::make_next_chain`].
    pub fn make_next_chain(&mut self) {
        for pt in &mut self.texts {
            pt.make_next_chain();
        }
    }

    /// The parsed text, in the order of the elements.
    pub fn texts(&self) -> &[ParsedText] {
        &self.texts
    }

    /// Mutable access to the parsed text.
    pub fn texts_mut(&mut self) -> &mut [ParsedText] {
        &mut self.texts
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Takes the parsed text out of the list.
    pub fn into_inner(self) -> Vec<ParsedText> {
        self.texts
    }
}

/// Where a chunk is, and the inputs of its geometry that are shared by its characters.
struct FlatChunk {
    text: usize,
    line: usize,
    chunk: usize,
    /// First character in the flat arrays.
    start: usize,
    len: usize,
    x: f64,
    y: f64,
    anchfrac: f64,
    unrendered: bool,
    transform: Affine,
}

impl FlatChunk {
    fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    fn last(&self) -> Option<usize> {
        self.len.checked_sub(1).map(|k| self.start + k)
    }
}

/// Every character of every chunk, one entry per character.
#[derive(Default)]
struct FlatChunks {
    chunks: Vec<FlatChunk>,
    cwd: Vec<f64>,
    dxeff: Vec<f64>,
    dadv: Vec<f64>,
    dy: Vec<f64>,
    bshft: Vec<f64>,
    caph: Vec<f64>,
}

impl FlatChunks {
    fn collect(texts: &[ParsedText]) -> Self {
        let mut flat = Self::default();
        for (ti, pt) in texts.iter().enumerate() {
            let differential = pt.settings.differential_advances;
            for (li, line) in pt.lns.iter().enumerate() {
                for ci in 0..line.chks.len() {
                    let chars: Vec<_> = line.chunk_chars(ci).collect();
                    let dxe = dxeff(&chars);
                    flat.chunks.push(FlatChunk {
                        text: ti,
                        line: li,
                        chunk: ci,
                        start: flat.cwd.len(),
                        len: chars.len(),
                        x: pt.chunk_x(li, ci),
                        y: pt.chunk_y(li, ci),
                        anchfrac: line.anchfrac(),
                        unrendered: pt.unrendered_space(li, ci),
                        transform: line.transform,
                    });
                    for (i, c) in chars.iter().enumerate() {
                        // An explicit dx overrides the pair correction.
                        let dadv = if differential && i > 0 && dxe[i] == 0. {
                            c.dadv(chars[i - 1].c, c.c)
                        } else {
                            0.
                        };
                        flat.cwd.push(c.cwd());
                        flat.dxeff.push(dxe[i]);
                        flat.dadv.push(dadv);
                        flat.dy.push(c.dy);
                        flat.bshft.push(c.bshft);
                        flat.caph.push(c.caph());
                    }
                }
            }
        }
        flat
    }

    /// Running sums of `vals` that restart at the first character of every chunk.
    fn segmented_sums(&self, vals: impl Fn(usize) -> f64) -> Vec<f64> {
        let mut out = vec![0.; self.cwd.len()];
        for chk in &self.chunks {
            let mut acc = 0.;
            for i in chk.range() {
                acc += vals(i);
                out[i] = acc;
            }
        }
        out
    }

    fn geometries(&self) -> Vec<ChunkGeometry> {
        let cstop = self.segmented_sums(|i| self.cwd[i] + self.dxeff[i] + self.dadv[i]);
        let cstrt: Vec<f64> = cstop.iter().zip(&self.cwd).map(|(s, w)| s - w).collect();
        let adyl = self.segmented_sums(|i| self.dy[i]);

        // Untransformed box of every character.
        let n = self.cwd.len();
        let (mut lft, mut rgt, mut btm, mut top) =
            (vec![0.; n], vec![0.; n], vec![0.; n], vec![0.; n]);
        for chk in &self.chunks {
            let (chkw, lastw) = match chk.last() {
                Some(last) if chk.unrendered => (cstop[last], self.cwd[last]),
                Some(last) => (cstop[last], 0.),
                None => (0., 0.),
            };
            let offx = -chk.anchfrac * (chkw - lastw);
            for i in chk.range() {
                lft[i] = chk.x + cstrt[i] + offx;
                rgt[i] = chk.x + cstop[i] + offx;
                btm[i] = chk.y + adyl[i] - self.bshft[i];
                top[i] = btm[i] - self.caph[i];
            }
        }

        self.chunks
            .iter()
            .map(|chk| {
                let range = chk.range();
                let chkw = chk.last().map_or(0., |last| cstop[last]);
                let (lx, by, ty) = if range.is_empty() {
                    (chk.x, chk.y, chk.y)
                } else {
                    let min = |v: &[f64]| v.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = |v: &[f64]| v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    (
                        min(&lft[range.clone()]) - self.dxeff[chk.start],
                        max(&btm[range.clone()]),
                        min(&top[range.clone()]),
                    )
                };
                let pts_ut = quad(lx, lx + chkw, by, ty);
                let pts_t = transform_quad(chk.transform, &pts_ut);
                ChunkGeometry {
                    lft: lft[range.clone()].to_vec(),
                    rgt: rgt[range.clone()].to_vec(),
                    btm: btm[range.clone()].to_vec(),
                    top: top[range].to_vec(),
                    bbox: quad_bbox(&pts_t),
                    pts_ut,
                    pts_t,
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ParsedTextList {
    type Item = &'a ParsedText;
    type IntoIter = core::slice::Iter<'a, ParsedText>;

    fn into_iter(self) -> Self::IntoIter {
        self.texts.iter()
    }
}

impl ParsedText {
    /// Records the current position of every character as its parsed position.
    pub fn record_parsed_positions(&mut self) {
        let pts: Vec<Vec<(Quad, Quad)>> = (0..self.lns.len())
            .map(|li| {
                (0..self.lns[li].chars.len())
                    .map(|i| (self.char_pts_ut(li, i), self.char_pts_t(li, i)))
                    .collect()
            })
            .collect();
        for (line, pts) in self.lns.iter_mut().zip(pts) {
            for (c, (ut, t)) in line.chars.iter_mut().zip(pts) {
                c.parsed_pts_ut = Some(ut);
                c.parsed_pts_t = Some(t);
            }
        }
    }
}
