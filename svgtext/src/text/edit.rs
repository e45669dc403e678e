// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edits to lines, chunks and characters that are written through to the document.
//!
//! Every edit keeps the characters it does not remove where they were drawn: deleting or
//! appending characters moves the chunk anchor to make up for the changed width, and
//! restructuring the document is followed by a pass that restores the measured
//! positions.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use kurbo::Point;
use svgtext_primitives::{Direction, FamilyName, TextAnchor};

use super::geometry::{advances, anchor_value, transform_quad};
use super::model::{CLoc, CharId, ChunkId, Quad, TChar};
use super::parse::{baseline_shift, letter_spacing};
use super::tree::BlockKind;
use super::write::{span_tag, xyset};
use super::ParsedText;
use crate::dom::{composed_font_size, initial_value, Document, NodeId, Style};
use crate::font::{CProp, FontKey, FONT_PROPERTIES};
use crate::util::{char_slice, format_short, insert_at, remove_char, POSITION_TOLERANCE};
use crate::Error;

/// Where characters appended by [`ParsedText::append_chk`] sit relative to the
/// baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScriptPosition {
    /// On the baseline, unless the characters were super- or subscripts already.
    #[default]
    Normal,
    /// Superscript.
    Super,
    /// Subscript.
    Sub,
}

/// The edge points where two chunks meet, see [`ParsedText::get_ut_pts`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkJoin {
    /// Top right of the first chunk.
    pub tr1: Point,
    /// Bottom right of the first chunk.
    pub br1: Point,
    /// Top left of the second chunk, in the first chunk's coordinates.
    pub tl2: Point,
    /// Bottom left of the second chunk, in the first chunk's coordinates.
    pub bl2: Point,
}

fn string_of(doc: &Document, loc: &CLoc) -> String {
    match loc.kind {
        BlockKind::Text => doc.text(loc.elem),
        BlockKind::Tail => doc.tail(loc.elem),
    }
    .unwrap_or_default()
    .to_owned()
}

fn set_string(doc: &mut Document, loc: &CLoc, s: String) {
    let s = (!s.is_empty()).then_some(s);
    match loc.kind {
        BlockKind::Text => doc.set_text(loc.elem, s),
        BlockKind::Tail => doc.set_tail(loc.elem, s),
    }
}

/// A position list with the entry of deleted character `i` taken out, or `None` if
/// the list does not change.
fn splice_out(vals: &[Option<f64>], i: usize, line_len: usize) -> Option<Vec<Option<f64>>> {
    if vals.len() <= 1 || i >= vals.len() {
        return None;
    }
    let mut v = vals.to_vec();
    if i + 1 < vals.len() && vals[i].is_some() && vals[i + 1].is_none() {
        // The next character takes over this one's position.
        v.remove(i + 1);
    } else if i + 1 == vals.len() && line_len > vals.len() {
        // Characters after the last entry keep using it.
    } else {
        v.remove(i);
    }
    v.truncate(line_len.saturating_sub(1));
    Some(v)
}

/// Sets the position of the run starting at `start`, keeping the list's other entries.
fn set_anchor(vals: &mut Vec<Option<f64>>, start: usize, v: f64) {
    if vals.len() <= start {
        vals.resize(start + 1, None);
    }
    vals[start] = Some(v);
}

fn shifted(vals: Vec<Option<f64>>, d: f64) -> Vec<Option<f64>> {
    vals.into_iter().map(|v| v.map(|v| v + d)).collect()
}

fn style_of(doc: &Document, changed: &HashMap<NodeId, Style>, id: NodeId) -> Style {
    changed
        .get(&id)
        .cloned()
        .unwrap_or_else(|| doc.style_attr(id))
}

fn blank(s: Option<&str>) -> bool {
    s.is_none_or(|s| s.chars().all(|c| matches!(c, ' ' | '\n' | '\t' | '\r')))
}

/// Deletes the empty elements below `el`, and `el` itself if it is empty.
///
/// An element is empty when it has no text, no tail and no children. A `text` element
/// holding only whitespace is deleted too. Returns whether anything was deleted.
pub fn delete_empty_nodes(doc: &mut Document, el: NodeId) -> bool {
    let mut any = false;
    for k in doc.element_children(el) {
        any |= delete_empty_nodes(doc, k);
    }
    let empty = |s: Option<&str>| s.is_none_or(str::is_empty);
    if empty(doc.text(el)) && empty(doc.tail(el)) && doc.children(el).is_empty() {
        doc.delete(el);
        return true;
    }
    if doc.tag(el) == "text"
        && doc
            .descendants(el)
            .iter()
            .all(|&d| blank(doc.text(d)) && blank(doc.tail(d)))
    {
        doc.delete(el);
        return true;
    }
    any
}

impl ParsedText {
    /// Moves the location of every character of a string at or after `from` by one.
    fn shift_locs(&mut self, elem: NodeId, kind: BlockKind, from: usize, grow: bool) {
        for c in self.lns.iter_mut().flat_map(|l| l.chars.iter_mut()) {
            if c.loc.elem == elem && c.loc.kind == kind && c.loc.ind >= from {
                if grow {
                    c.loc.ind += 1;
                } else {
                    c.loc.ind = c.loc.ind.saturating_sub(1);
                }
            }
        }
    }

    /// Takes a chunk out of the left-to-right chain, linking its neighbours.
    fn unlink_chunk(&mut self, li: usize, ci: usize) {
        let (prev, next) = {
            let chk = &self.lns[li].chks[ci];
            (chk.prevw, chk.nextw)
        };
        for chk in self.lns.iter_mut().flat_map(|l| l.chks.iter_mut()) {
            if Some(chk.id) == prev {
                chk.nextw = next;
            }
            if Some(chk.id) == next {
                chk.prevw = prev;
            }
        }
    }

    /// Gives a line that continues from the previous one its own `x` and `y`.
    ///
    /// A line starting in a tail is wrapped in a span first, so that there is an element
    /// to put the position on.
    pub(crate) fn make_line_explicit(&mut self, doc: &mut Document, li: usize) {
        let line = &self.lns[li];
        if !(line.continuex || line.continuey) {
            return;
        }
        let Some(first) = line.chars.first() else {
            return;
        };
        if first.loc.kind == BlockKind::Tail {
            self.add_style(doc, li, 0, &Style::parse("baseline-shift:0%"), false, false);
        }
        let x = self.line_x(li);
        let y = self.line_y(li);
        let src = self.lns[li].chars[0].loc.elem;
        xyset(doc, src, "x", &x);
        xyset(doc, src, "y", &y);
        let line = &mut self.lns[li];
        line.xsrc = src;
        line.ysrc = src;
        line.xv = x;
        line.yv = y;
        line.continuex = false;
        line.continuey = false;
        self.invalidate_line(li);
    }

    /// Moves the anchor of the chunk starting at line index `start` by `d`.
    fn shift_chunk_x(&mut self, doc: &mut Document, li: usize, start: usize, d: f64) {
        if d == 0. {
            return;
        }
        if self.lns[li].continuex {
            self.make_line_explicit(doc, li);
        }
        let mut lnx = self.line_x(li);
        let v = anchor_value(&lnx, start) + d;
        set_anchor(&mut lnx, start, v);
        self.write_xy(doc, li, Some(lnx), None);
    }

    /// Deletes character `i` of line `li` from the line and the document.
    ///
    /// The other characters stay where they were drawn. Deleting the first or last
    /// character of a chunk moves the chunk's anchor by the change in width, weighted
    /// by the anchor; deleting from the middle gives the next character a `dx` that
    /// fills the gap. Pair corrections at the seam are accounted for.
    ///
    /// Deleting the last character of a line deletes the line. With `update_delta`,
    /// changed `dx`/`dy` values are written right away.
    pub fn delc(&mut self, doc: &mut Document, li: usize, i: usize, update_delta: bool) {
        // The next line may start where this line's last chunk ends.
        if self.lns[li].chars[i].chk + 1 == self.lns[li].chks.len() && li + 1 < self.lns.len() {
            self.make_line_explicit(doc, li + 1);
        }
        let line = &self.lns[li];
        let (ci, w) = (line.chars[i].chk, line.chars[i].windex);
        let iis = line.chks[ci].iis.clone();
        let n = iis.len();
        let a = line.anchfrac();
        let line_len = line.chars.len();
        let ends_line = iis.last() == Some(&(line_len - 1));

        let (shift, newdx) = {
            let before: Vec<&TChar> = iis.iter().map(|&k| &line.chars[k]).collect();
            let adv_b = advances(&before, self.settings.differential_advances);
            let wb = self.anchored_width(li, &before, ends_line);
            let next: Option<TChar> = (w > 0 && w + 1 < n).then(|| {
                let mut c = before[w + 1].clone();
                c.dx = adv_b.cstrt[w + 1] - adv_b.cstop[w - 1] - before[w - 1].lsp;
                c
            });
            let rest: Vec<&TChar> = (0..n)
                .filter(|&k| k != w)
                .map(|k| match &next {
                    Some(c) if k == w + 1 => c,
                    _ => before[k],
                })
                .collect();
            let adv_a = advances(&rest, self.settings.differential_advances);
            let wa = self.anchored_width(li, &rest, ends_line);
            let shift = if n == 1 {
                0.
            } else if w == 0 {
                (adv_b.cstrt[1] - adv_a.cstrt[0]) - a * (wb - wa)
            } else {
                -a * (wb - wa)
            };
            (shift, next.map(|c| c.dx))
        };

        self.shift_chunk_x(doc, li, iis[0], shift);
        let newx = if self.lns[li].continuex {
            None
        } else {
            splice_out(&self.line_x(li), i, line_len)
        };
        let newy = if self.lns[li].continuey {
            None
        } else {
            splice_out(&self.line_y(li), i, line_len)
        };
        if newx.is_some() || newy.is_some() {
            self.write_xy(doc, li, newx, newy);
        }

        let c = self.lns[li].chars.remove(i);
        let s = string_of(doc, &c.loc);
        set_string(doc, &c.loc, remove_char(&s, c.loc.ind));
        self.shift_locs(c.loc.elem, c.loc.kind, c.loc.ind + 1, false);
        if let Some(dx) = newdx {
            self.lns[li].chars[i].dx = dx;
            self.dchange = true;
        }

        let line = &mut self.lns[li];
        for chk in &mut line.chks {
            chk.iis.retain(|k| *k != i);
            for k in &mut chk.iis {
                if *k > i {
                    *k -= 1;
                }
            }
        }
        if self.lns[li].chks[ci].iis.is_empty() {
            self.unlink_chunk(li, ci);
            self.lns[li].chks.remove(ci);
        }
        self.lns[li].reindex();
        self.invalidate_line(li);
        if self.writtendx || self.writtendy {
            self.dchange = true;
        }

        if self.lns[li].chars.is_empty() {
            self.dell(doc, li);
        } else if update_delta {
            self.write_dxdy(doc);
        }
    }

    /// Deletes a whole line from the model and its characters from the document.
    pub fn dell(&mut self, doc: &mut Document, li: usize) {
        let x = self.line_x(li);
        if !self.lns[li].continuex && x.len() > 1 {
            self.write_xy(doc, li, Some(x[..1].to_vec()), None);
        }
        for ci in 0..self.lns[li].chks.len() {
            self.unlink_chunk(li, ci);
        }
        let line = self.lns.remove(li);
        for c in line.chars.iter().rev() {
            let s = string_of(doc, &c.loc);
            set_string(doc, &c.loc, remove_char(&s, c.loc.ind));
            self.shift_locs(c.loc.elem, c.loc.kind, c.loc.ind + 1, false);
        }
        self.invalidate_all();
        if self.writtendx || self.writtendy {
            self.dchange = true;
        }
        self.write_dxdy(doc);
    }

    /// Deletes every character of a chunk, last to first.
    pub fn del_chk(&mut self, doc: &mut Document, li: usize, ci: usize, update_delta: bool) {
        let ids: Vec<CharId> = self.lns[li].chunk_chars(ci).map(|c| c.id).collect();
        for id in ids.into_iter().rev() {
            if let Some((l, i)) = self.locate(id) {
                self.delc(doc, l, i, update_delta);
            }
        }
    }

    /// Wraps character `i` of line `li` in a new span carrying `sty`, and returns the
    /// span.
    ///
    /// With `set_default`, properties the span would inherit and `sty` does not set are
    /// reset to their initial values. With `new_fs`, the character's font size is
    /// measured again.
    pub fn add_style(
        &mut self,
        doc: &mut Document,
        li: usize,
        i: usize,
        sty: &Style,
        set_default: bool,
        new_fs: bool,
    ) -> NodeId {
        let (loc, ch) = {
            let c = &self.lns[li].chars[i];
            (c.loc, c.c)
        };
        let tag = span_tag(doc, self.textel);
        let t = doc.create_element(tag);
        doc.set_text(t, Some(ch.to_string()));
        let s = string_of(doc, &loc);
        let after = char_slice(&s, loc.ind + 1, usize::MAX);
        set_string(doc, &loc, char_slice(&s, 0, loc.ind));
        match loc.kind {
            BlockKind::Text => doc.insert(loc.elem, 0, t),
            BlockKind::Tail => doc.add_next(loc.elem, t),
        }
        doc.set_tail(t, (!after.is_empty()).then_some(after));
        self.tree = None;

        for c in self.lns.iter_mut().flat_map(|l| l.chars.iter_mut()) {
            if c.loc.elem == loc.elem && c.loc.kind == loc.kind && c.loc.ind > loc.ind {
                c.loc = CLoc::new(t, BlockKind::Tail, c.loc.ind - loc.ind - 1, c.loc.sel);
            }
        }

        let mut styset = sty.clone();
        if set_default {
            let inherited = doc.specified_style(t);
            for (k, _) in inherited.iter() {
                if !styset.contains(k) {
                    if let Some(v) = initial_value(k) {
                        styset.set(k, v);
                    }
                }
            }
        }
        doc.set_style(t, &styset);

        let specified = doc.specified_style(t);
        let lsp = letter_spacing(&specified, self.settings.default_font_size);
        let bshft = baseline_shift(doc, &specified, t);
        let fs = new_fs.then(|| composed_font_size(doc, t));
        let c = &mut self.lns[li].chars[i];
        c.loc = CLoc::new(t, BlockKind::Text, 0, t);
        c.sty = specified;
        c.lsp = lsp;
        c.bshft = bshft;
        if let Some(fs) = fs {
            c.tfs = fs.transformed;
            c.utfs = fs.untransformed;
        }
        self.invalidate_line(li);
        if self.writtendx || self.writtendy {
            self.dchange = true;
            self.write_dxdy(doc);
        }
        t
    }

    /// Adds a character to the end of chunk `ci` of line `li`, and returns its index in
    /// the line.
    ///
    /// The character is inserted into the document after the chunk's last character,
    /// or at the start of the tail of `totail`. It copies the last character's style and
    /// size. The chunk's anchor moves so that the characters already there stay put.
    pub fn appendc(
        &mut self,
        doc: &mut Document,
        li: usize,
        ci: usize,
        ch: char,
        prop: CProp,
        dx: f64,
        dy: f64,
        totail: Option<NodeId>,
    ) -> Option<usize> {
        let lidx = *self.lns[li].chks[ci].iis.last()?;
        let line_len = self.lns[li].chars.len();
        let ends_line = lidx + 1 == line_len;
        let wb = {
            let chars: Vec<&TChar> = self.lns[li].chunk_chars(ci).collect();
            self.anchored_width(li, &chars, ends_line)
        };

        let loc = match totail {
            None => {
                let l = self.lns[li].chars[lidx].loc;
                let s = string_of(doc, &l);
                set_string(doc, &l, insert_at(&s, l.ind + 1, &ch.to_string()));
                CLoc::new(l.elem, l.kind, l.ind + 1, l.sel)
            }
            Some(t) => {
                let tail = doc.tail(t).unwrap_or_default();
                doc.set_tail(t, Some(format!("{ch}{tail}")));
                CLoc::new(t, BlockKind::Tail, 0, doc.parent(t).unwrap_or(t))
            }
        };
        self.shift_locs(loc.elem, loc.kind, loc.ind, true);

        let mut c = self.lns[li].chars[lidx].clone();
        c.id = self.new_char_id();
        c.c = ch;
        c.prop = prop;
        c.dx = dx;
        c.dy = dy;
        c.ax = None;
        c.ay = None;
        c.loc = loc;
        c.sty = doc.specified_style(loc.sel);
        c.parsed_pts_ut = None;
        c.parsed_pts_t = None;

        // The new character gets an empty slot in the position lists.
        let myi = lidx + 1;
        let open_slot = |vals: Vec<Option<f64>>| {
            (myi < vals.len()).then(|| {
                let mut v = vals;
                v.insert(myi, None);
                v.truncate(line_len + 1);
                v
            })
        };
        let newx = if self.lns[li].continuex {
            None
        } else {
            open_slot(self.line_x(li))
        };
        let newy = if self.lns[li].continuey {
            None
        } else {
            open_slot(self.line_y(li))
        };
        if newx.is_some() || newy.is_some() {
            self.write_xy(doc, li, newx, newy);
        }

        let line = &mut self.lns[li];
        line.chars.insert(myi, c);
        for chk in &mut line.chks {
            for k in &mut chk.iis {
                if *k >= myi {
                    *k += 1;
                }
            }
        }
        line.chks[ci].iis.push(myi);
        line.reindex();
        self.invalidate_line(li);

        let wa = {
            let chars: Vec<&TChar> = self.lns[li].chunk_chars(ci).collect();
            self.anchored_width(li, &chars, ends_line)
        };
        let a = self.lns[li].anchfrac();
        let start = self.lns[li].chks[ci].iis[0];
        self.shift_chunk_x(doc, li, start, a * (wa - wb));

        self.dchange = true;
        self.write_dxdy(doc);
        Some(myi)
    }

    /// The element a character appended to chunk `ci` goes after, when the chunk ends
    /// in a span nested below the one it starts in.
    fn tail_target(&self, doc: &Document, li: usize, ci: usize) -> Option<NodeId> {
        let line = &self.lns[li];
        let chk = &line.chks[ci];
        let first = &line.chars[*chk.iis.first()?];
        let last = &line.chars[*chk.iis.last()?];
        if last.loc.sel == first.loc.sel {
            return None;
        }
        let mut cel = last.loc.sel;
        loop {
            let p = doc.parent(cel)?;
            if p == first.loc.sel || p == self.textel {
                return Some(cel);
            }
            cel = p;
        }
    }

    /// Moves the characters of chunk `ci2` of line `li2` to the end of chunk `ci` of
    /// line `li`, as if they were typed there.
    ///
    /// Spaces are added in between to cover the gap the two chunks had, at most
    /// `maxspaces` of them. Characters whose style or scale differs from the chunk's get
    /// a span of their own; super- and subscripts are written as `baseline-shift`
    /// keywords with a 65% font size.
    pub fn append_chk(
        &mut self,
        doc: &mut Document,
        (li, ci): (usize, usize),
        (li2, ci2): (usize, usize),
        stype: ScriptPosition,
        maxspaces: Option<usize>,
    ) -> Result<(), Error> {
        if (li, ci) == (li2, ci2) {
            return Ok(());
        }
        let tid = self.lns[li].chks[ci].id;
        let ids: Vec<CharId> = self.lns[li2].chunk_chars(ci2).map(|c| c.id).collect();
        if ids.is_empty() {
            return Ok(());
        }
        let join = self
            .get_ut_pts((li, ci), (li2, ci2), false)
            .or_else(|| self.get_ut_pts((li, ci), (li2, ci2), true));
        let Some(join) = join else {
            return Ok(());
        };
        let (spw, lsp, tsty) = {
            let Some(lchr) = self.lns[li].chunk_chars(ci).last() else {
                return Ok(());
            };
            (lchr.spw(), lchr.lsp, lchr.tsty.clone())
        };
        let mut numsp = if spw > 0. {
            ((join.bl2.x - join.br1.x) / spw).round().max(0.) as usize
        } else {
            0
        };
        if let Some(m) = maxspaces {
            numsp = numsp.min(m);
        }
        for _ in 0..numsp {
            let prop = self.ctable.get_prop(' ', tsty.as_ref())?.clone();
            self.appendc(doc, li, ci, ' ', prop, -lsp, 0., None);
        }

        let mut prev_lsp = self.lns[li]
            .chunk_chars(ci)
            .last()
            .map_or(0., |c| c.lsp);
        for (k, id) in ids.into_iter().enumerate() {
            let Some((l2, i2)) = self.locate(id) else {
                continue;
            };
            let c = self.lns[l2].chars[i2].clone();
            // The first character takes back the letter spacing of the one before.
            let mydx = if k == 0 { -prev_lsp } else { c.dx };
            self.delc(doc, l2, i2, true);

            let ntype = match (stype, c.sty.get("baseline-shift")) {
                (ScriptPosition::Normal, Some("super")) => ScriptPosition::Super,
                (ScriptPosition::Normal, Some("sub")) => ScriptPosition::Sub,
                _ => stype,
            };
            let Some((li, ci)) = self.locate_chunk(tid) else {
                break;
            };
            let totail = self.tail_target(doc, li, ci);
            let Some(ni) = self.appendc(doc, li, ci, c.c, c.prop.clone(), mydx, c.dy, totail)
            else {
                break;
            };

            let inverse = self.lns[li].transform.inverse();
            let fs = totail.map(|t| composed_font_size(doc, doc.parent(t).unwrap_or(t)));
            let newc = &mut self.lns[li].chars[ni];
            if let Some(fs) = fs {
                newc.tfs = fs.transformed;
                newc.utfs = fs.untransformed;
            }
            newc.parsed_pts_t = c.parsed_pts_t;
            newc.parsed_pts_ut = c.parsed_pts_t.map(|q| transform_quad(inverse, &q));

            let newc = &self.lns[li].chars[ni];
            let rescaled = (c.scf() - newc.scf()).abs() > 1e-4;
            if *c.sty != *newc.sty || ntype != ScriptPosition::Normal || rescaled {
                let mut newsty = (*c.sty).clone();
                match ntype {
                    ScriptPosition::Super | ScriptPosition::Sub => {
                        let kw = if ntype == ScriptPosition::Super {
                            "super"
                        } else {
                            "sub"
                        };
                        newsty.set("baseline-shift", kw);
                        newsty.set("font-size", "65%");
                    }
                    ScriptPosition::Normal if rescaled => {
                        let nsz = (c.spw() * c.scf() / (newc.spw() * newc.scf()) * 100.).round();
                        newsty.set("font-size", format!("{}%", format_short(nsz)));
                    }
                    ScriptPosition::Normal => {}
                }
                self.add_style(doc, li, ni, &newsty, true, true);
            }
            self.invalidate_line(li);
            prev_lsp = self.lns[li].chars[ni].lsp;
        }
        Ok(())
    }

    /// The right edge of chunk `a` and the left edge of chunk `b`, both in the
    /// untransformed coordinates of `a`'s line.
    ///
    /// Uses the positions recorded when the text was parsed (see
    /// [`TChar::parsed_pts_ut`]) unless `current` is set. `None` if either chunk has no
    /// recorded positions.
    pub fn get_ut_pts(
        &self,
        (li, ci): (usize, usize),
        (li2, ci2): (usize, usize),
        current: bool,
    ) -> Option<ChunkJoin> {
        let pts = |l: usize, k: usize| -> (Option<Quad>, Option<Quad>) {
            if current {
                (Some(self.char_pts_ut(l, k)), Some(self.char_pts_t(l, k)))
            } else {
                let c = &self.lns[l].chars[k];
                (c.parsed_pts_ut, c.parsed_pts_t)
            }
        };
        let (_, t2) = self.lns[li2].chks[ci2]
            .iis
            .iter()
            .filter_map(|&k| {
                let (u, t) = pts(li2, k);
                Some((u?[0].x, t?))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))?;
        let (_, u1) = self.lns[li].chks[ci]
            .iis
            .iter()
            .filter_map(|&k| {
                let u = pts(li, k).0?;
                Some((u[3].x, u))
            })
            .max_by(|a, b| a.0.total_cmp(&b.0))?;
        let inverse = self.lns[li].transform.inverse();
        Some(ChunkJoin {
            tr1: u1[2],
            br1: u1[3],
            tl2: inverse * t2[1],
            bl2: inverse * t2[0],
        })
    }

    /// Moves a chunk that had characters merged into it so that its drawn characters
    /// keep the anchor they had when the text was parsed.
    pub fn fix_merged_position(&mut self, doc: &mut Document, li: usize, ci: usize) {
        let gcs: Vec<(usize, Quad)> = self.lns[li].chks[ci]
            .iis
            .iter()
            .filter_map(|&k| {
                let c = &self.lns[li].chars[k];
                (c.c != ' ').then_some((k, c.parsed_pts_ut?))
            })
            .collect();
        if gcs.is_empty() {
            return;
        }
        let omaxx = gcs.iter().map(|(_, p)| p[3].x).fold(f64::NEG_INFINITY, f64::max);
        let ominx = gcs.iter().map(|(_, p)| p[0].x).fold(f64::INFINITY, f64::min);
        let now: Vec<Quad> = gcs.iter().map(|&(k, _)| self.char_pts_ut(li, k)).collect();
        let nmaxx = now.iter().map(|p| p[3].x).fold(f64::NEG_INFINITY, f64::max);
        let nminx = now.iter().map(|p| p[0].x).fold(f64::INFINITY, f64::min);
        let a = self.lns[li].anchfrac();
        let moved = (nminx * (1. - a) + nmaxx * a) - (ominx * (1. - a) + omaxx * a);
        let start = self.lns[li].chks[ci].iis[0];
        self.shift_chunk_x(doc, li, start, -moved);
        self.write_dxdy(doc);
    }

    /// Changes the anchor of a line without moving its characters.
    ///
    /// The new anchor is written as `text-anchor` and `text-align` on the element of
    /// the line's first character.
    pub fn change_alignment(&mut self, doc: &mut Document, li: usize, anchor: TextAnchor) {
        if self.lns[li].anchor == anchor {
            return;
        }
        let (xsrc, ysrc) = (self.lns[li].xsrc, self.lns[li].ysrc);
        let sibs: Vec<usize> = (0..self.lns.len())
            .filter(|&l| self.lns[l].xsrc == xsrc || self.lns[l].ysrc == ysrc)
            .collect();
        for l in sibs.into_iter().rev() {
            self.disable_sodipodi(doc, l, false);
        }
        self.make_line_explicit(doc, li);

        let na = anchor.fraction();
        let newxs: Vec<(usize, f64)> = (0..self.lns[li].chks.len())
            .map(|ci| {
                let pts = self.chunk_pts_ut(li, ci);
                let minx = pts.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
                let mut maxx = pts.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
                if self.unrendered_space(li, ci) {
                    maxx -= self.lns[li].chunk_chars(ci).last().map_or(0., TChar::cwd);
                }
                (self.lns[li].chks[ci].iis[0], (1. - na) * minx + na * maxx)
            })
            .collect();
        let mut lnx = self.line_x(li);
        for (start, v) in newxs {
            set_anchor(&mut lnx, start, v);
        }
        self.write_xy(doc, li, Some(lnx), None);

        if let Some(first) = self.lns[li].chars.first() {
            let sel = first.loc.sel;
            let rtl = doc
                .specified_style(sel)
                .get("direction")
                .and_then(Direction::parse)
                == Some(Direction::Rtl);
            let written = if rtl { anchor.mirrored() } else { anchor };
            let mut s = doc.style_attr(sel);
            s.set("text-anchor", written.as_str());
            s.set("text-align", anchor.to_align().as_str());
            doc.set_style(sel, &s);
        }
        self.lns[li].anchor = anchor;
        self.lns[li].continuex = false;
        self.invalidate_line(li);
    }

    /// Splits line `li` at character `i`: characters `i..` move to a new element.
    pub fn split_line(
        &mut self,
        doc: &mut Document,
        li: usize,
        i: usize,
    ) -> Result<Option<Self>, Error> {
        if i >= self.lns[li].chars.len() {
            return Ok(None);
        }
        let ids: Vec<CharId> = self.lns[li].chars[i..].iter().map(|c| c.id).collect();
        self.split_off_characters(doc, &ids)
    }

    /// Copies the text element and returns the copy's model.
    ///
    /// The copy is inserted after the element, with fresh ids. Its lines and characters
    /// refer to the copied nodes; character and chunk ids are kept.
    pub fn duplicate(&self, doc: &mut Document) -> Self {
        let new = doc.duplicate(self.textel);
        let map: HashMap<NodeId, NodeId> = doc
            .descendants(self.textel)
            .into_iter()
            .zip(doc.descendants(new))
            .collect();
        let m = |id: NodeId| map.get(&id).copied().unwrap_or(id);
        let mut ret = self.clone();
        ret.textel = new;
        ret.tree = None;
        for line in &mut ret.lns {
            line.xsrc = m(line.xsrc);
            line.ysrc = m(line.ysrc);
            for s in &mut line.sprlabove {
                *s = m(*s);
            }
            for c in &mut line.chars {
                c.loc.elem = m(c.loc.elem);
                c.loc.sel = m(c.loc.sel);
            }
        }
        ret
    }

    /// Splits the characters of chunks into a new element, see
    /// [`ParsedText::split_off_characters`].
    pub fn split_off_chunks(
        &mut self,
        doc: &mut Document,
        chunks: &[ChunkId],
    ) -> Result<Option<Self>, Error> {
        let mut ids = Vec::new();
        for &id in chunks {
            if let Some((li, ci)) = self.locate_chunk(id) {
                ids.extend(self.lns[li].chunk_chars(ci).map(|c| c.id));
            }
        }
        self.split_off_characters(doc, &ids)
    }

    /// Moves a run of characters of one line into a new text element placed right after
    /// this one, and returns the new element's model.
    ///
    /// The element is copied, and each copy loses the characters the other keeps. Both
    /// are then checked against the positions measured before the split, and any drift
    /// is taken out with `dx`/`dy`. Returns `None` if no character was found.
    pub fn split_off_characters(
        &mut self,
        doc: &mut Document,
        ids: &[CharId],
    ) -> Result<Option<Self>, Error> {
        let Some(&fc) = ids.first() else {
            return Ok(None);
        };
        let Some((iln, _)) = self.locate(fc) else {
            return Ok(None);
        };
        let mut ciis: Vec<usize> = ids
            .iter()
            .filter_map(|&id| self.locate(id))
            .filter(|&(l, _)| l == iln)
            .map(|(_, i)| i)
            .collect();
        ciis.sort_unstable();
        ciis.dedup();

        let mut npt = self.duplicate(doc);
        let mut ps: HashMap<CharId, Point> = HashMap::new();
        let mut ds: HashMap<CharId, (f64, f64)> = HashMap::new();
        for li in 0..self.lns.len() {
            for (i, c) in self.lns[li].chars.iter().enumerate() {
                ps.insert(c.id, self.char_pts_ut(li, i)[0]);
                ds.insert(c.id, (c.dx, c.dy));
            }
        }

        let line = &self.lns[iln];
        let first = &line.chars[ciis[0]];
        let fusex = line.continuex || ciis[0] > 0 || first.dx != 0.;
        let fusey = line.continuey || ciis[0] > 0 || first.dy != 0.;
        let a = line.anchfrac();
        let last = ciis[ciis.len() - 1];
        let oldx = self.char_pts_ut(iln, ciis[0])[0].x * (1. - a)
            + self.char_pts_ut(iln, last)[3].x * a;
        let oldy = self.char_pts_ut(iln, ciis[0])[0].y + first.bshft;

        for &id in ids.iter().rev() {
            if let Some((l, i)) = self.locate(id) {
                self.delc(doc, l, i, false);
            }
        }
        for l2 in (0..npt.lns.len()).rev() {
            if l2 != iln {
                npt.dell(doc, l2);
                continue;
            }
            for j in (0..npt.lns[l2].chars.len()).rev() {
                if ciis.binary_search(&j).is_err() {
                    npt.delc(doc, l2, j, false);
                }
            }
        }
        let Some((nl, _)) = npt.locate(fc) else {
            return Ok(None);
        };

        if let Some((xs, ys)) = npt.parse_lines(doc, true)? {
            npt.lns[nl].xsrc = xs;
            npt.lns[nl].ysrc = ys;
        }
        let (x, y) = (npt.line_x(nl), npt.line_y(nl));
        npt.write_xy(doc, nl, Some(x), Some(y));
        npt.disable_sodipodi(doc, nl, true);

        if !self.lns.is_empty() {
            if let Some((xs, ys)) = self.parse_lines(doc, true)? {
                self.lns[0].xsrc = xs;
                self.lns[0].ysrc = ys;
            }
            let (x, y) = (self.line_x(0), self.line_y(0));
            self.write_xy(doc, 0, Some(x), Some(y));
        }

        if fusex {
            npt.lns[nl].continuex = false;
            npt.write_xy(doc, nl, Some(vec![Some(oldx)]), None);
            if let Some(d) = ds.get_mut(&fc) {
                d.0 = 0.;
            }
        }
        if fusey {
            npt.lns[nl].continuey = false;
            npt.write_xy(doc, nl, None, Some(vec![Some(oldy)]));
            if let Some(d) = ds.get_mut(&fc) {
                d.1 = 0.;
            }
        }
        for c in npt.lns.iter_mut().flat_map(|l| l.chars.iter_mut()) {
            if let Some(&(dx, dy)) = ds.get(&c.id) {
                c.dx = dx;
                c.dy = dy;
            }
        }
        npt.invalidate_all();
        npt.dchange = true;
        npt.write_dxdy(doc);

        self.correct_drift(doc, &ps);
        npt.correct_drift(doc, &ps);
        log::trace!(
            "split {} characters of {:?} into {:?}",
            npt.char_count(),
            self.textel,
            npt.textel
        );
        Ok(Some(npt))
    }

    /// Moves characters back to the positions in `ps` with `dx`/`dy`, chunk by chunk.
    fn correct_drift(&mut self, doc: &mut Document, ps: &HashMap<CharId, Point>) {
        for li in 0..self.lns.len() {
            for ci in 0..self.lns[li].chks.len() {
                let iis = self.lns[li].chks[ci].iis.clone();
                let deltas: Vec<(f64, f64)> = iis
                    .iter()
                    .map(|&k| match ps.get(&self.lns[li].chars[k].id) {
                        Some(p) => {
                            let now = self.char_pts_ut(li, k)[0];
                            (now.x - p.x, now.y - p.y)
                        }
                        None => (0., 0.),
                    })
                    .collect();
                if !deltas
                    .iter()
                    .any(|d| d.0.abs() > POSITION_TOLERANCE || d.1.abs() > POSITION_TOLERANCE)
                {
                    continue;
                }
                let a = self.lns[li].anchfrac();
                let (d0, dl) = (deltas[0].0, deltas[deltas.len() - 1].0);
                for (w, &k) in iis.iter().enumerate() {
                    let (ex, ey) = if w == 0 {
                        // Changing the first dx also moves the anchor of the chunk.
                        let ex = if a < 1. {
                            (d0 * (1. - a) + a * dl) / (1. - a)
                        } else {
                            0.
                        };
                        (ex, deltas[0].1)
                    } else {
                        (
                            deltas[w].0 - deltas[w - 1].0,
                            deltas[w].1 - deltas[w - 1].1,
                        )
                    };
                    let c = &mut self.lns[li].chars[k];
                    c.dx -= ex;
                    c.dy -= ey;
                }
                if a >= 1. {
                    self.shift_chunk_x(doc, li, iis[0], -dl);
                }
                self.dchange = true;
                self.invalidate_line(li);
            }
        }
        self.write_dxdy(doc);
    }

    /// Makes the text easy to edit in an editor.
    ///
    /// Sets `xml:space="preserve"`, turns a single top-level line into a
    /// `sodipodi:role="line"` line, drops `line-height` from single lines, and moves the
    /// font of every character onto the element it takes its style from.
    pub fn make_editable(&mut self, doc: &mut Document) {
        let elem = self.textel;
        doc.set(elem, "xml:space", "preserve");
        if self.lns.len() == 1 && self.lns[0].tlvlno.is_some() && !self.lns[0].sprl {
            if let Some(first) = self.lns[0].chars.first() {
                let mut cel = first.loc.elem;
                while let Some(p) = doc.parent(cel).filter(|&p| cel != elem && p != elem) {
                    cel = p;
                }
                if cel != elem {
                    let (x, y) = (self.line_x(0), self.line_y(0));
                    xyset(doc, elem, "x", &x);
                    xyset(doc, elem, "y", &y);
                    doc.set(cel, "sodipodi:role", "line");
                    if self.writtendx || self.writtendy {
                        self.dchange = true;
                    }
                }
            }
        }

        let dds = doc.descendants(elem);
        let mut changed: HashMap<NodeId, Style> = HashMap::new();
        if self.lns.len() == 1 {
            for &d in &dds {
                let mut s = style_of(doc, &changed, d);
                if s.remove("line-height").is_some() {
                    changed.insert(d, s);
                }
            }
        }

        if let Some(first) = self.chrs().next() {
            for &d in &dds {
                let mut s = style_of(doc, &changed, d);
                let mut any = false;
                for key in FONT_PROPERTIES
                    .iter()
                    .chain(&["-inkscape-font-specification"])
                {
                    any |= s.remove(key).is_some();
                }
                if any {
                    changed.insert(d, s);
                }
            }
            for c in self.chrs() {
                let mut s = style_of(doc, &changed, c.loc.sel);
                s.update(&c.fsty.to_style());
                changed.insert(c.loc.sel, s);
            }
            // The first character's font goes on top, since that is what editors show.
            let mut s = style_of(doc, &changed, elem);
            s.update(&first.fsty.to_style());
            changed.insert(elem, s);

            // Elements whose font size the characters depend on.
            let mut origins: HashSet<NodeId> = HashSet::new();
            for c in self.chrs() {
                let mut cel = c.loc.sel;
                origins.insert(cel);
                loop {
                    let s = style_of(doc, &changed, cel);
                    let fs = s
                        .get("font-size")
                        .or_else(|| doc.get(cel, "font-size"))
                        .map(str::to_owned);
                    if fs.is_some_and(|v| !v.contains('%')) || cel == elem {
                        break;
                    }
                    match doc.parent(cel) {
                        Some(p) => {
                            cel = p;
                            origins.insert(cel);
                        }
                        None => break,
                    }
                }
            }
            if !origins.contains(&elem)
                && (self.lns.len() == 1 || self.lns[1..].iter().all(|l| !l.sprl))
            {
                let maxsize = self
                    .chrs()
                    .map(|c| c.utfs)
                    .fold(f64::NEG_INFINITY, f64::max);
                let v = format!("{maxsize}");
                let mut s = style_of(doc, &changed, elem);
                if s.get("font-size") != Some(v.as_str()) {
                    s.set("font-size", v);
                    changed.insert(elem, s);
                }
            }
        }
        for (k, v) in changed {
            doc.set_style(k, &v);
        }
        self.write_dxdy(doc);
    }

    /// Moves the first character of every line and the `dx`/`dy` of the others back to
    /// recorded values, after the document was restructured and parsed again.
    ///
    /// `old` holds the untransformed bottom left corner of every character, in order.
    fn restore_positions(&mut self, doc: &mut Document, old: &[Point], odx: &[f64], ody: &[f64]) {
        if old.len() != self.char_count() {
            log::debug!(
                "{:?} has {} characters after restructuring instead of {}; not restoring positions",
                self.textel,
                self.char_count(),
                old.len()
            );
            return;
        }
        let mut flat = 0;
        for li in 0..self.lns.len() {
            let n = self.lns[li].chars.len();
            let now = self.char_pts_ut(li, 0)[0];
            let d = old[flat] - now;
            if d.x.abs() > POSITION_TOLERANCE || d.y.abs() > POSITION_TOLERANCE {
                self.make_line_explicit(doc, li);
                let x = shifted(self.line_x(li), d.x);
                let y = shifted(self.line_y(li), d.y);
                self.write_xy(doc, li, Some(x), Some(y));
            }
            for i in 1..n {
                let c = &self.lns[li].chars[i];
                if (c.dx - odx[flat + i]).abs() > POSITION_TOLERANCE
                    || (c.dy - ody[flat + i]).abs() > POSITION_TOLERANCE
                {
                    self.set_dx(li, i, odx[flat + i]);
                    self.set_dy(li, i, ody[flat + i]);
                }
            }
            flat += n;
        }
        self.write_dxdy(doc);
    }

    /// Deletes empty spans of the element (see [`delete_empty_nodes`]) without moving
    /// the characters.
    pub fn delete_empty(&mut self, doc: &mut Document) -> Result<(), Error> {
        let old_t: Vec<Point> = (0..self.lns.len())
            .flat_map(|li| (0..self.lns[li].chars.len()).map(move |i| (li, i)))
            .map(|(li, i)| self.char_pts_t(li, i)[0])
            .collect();
        let odx: Vec<f64> = self.chrs().map(|c| c.dx).collect();
        let ody: Vec<f64> = self.chrs().map(|c| c.dy).collect();
        if !delete_empty_nodes(doc, self.textel) {
            return Ok(());
        }
        if !doc.contains(self.textel) {
            self.lns.clear();
            return Ok(());
        }
        self.reparse(doc)?;
        if old_t.len() != self.char_count() {
            return Ok(());
        }
        let mut old_ut = Vec::with_capacity(old_t.len());
        let mut flat = 0;
        for line in &self.lns {
            let inverse = line.transform.inverse();
            for _ in &line.chars {
                old_ut.push(inverse * old_t[flat]);
                flat += 1;
            }
        }
        self.restore_positions(doc, &old_ut, &odx, &ody);
        Ok(())
    }

    /// Removes every `sodipodi:role="line"` marker of the element without moving the
    /// characters.
    pub fn strip_sodipodi_role_line(&mut self, doc: &mut Document) -> Result<(), Error> {
        let dds = doc.descendants(self.textel);
        if !dds
            .iter()
            .any(|&d| doc.get(d, "sodipodi:role") == Some("line"))
        {
            return Ok(());
        }
        let old: Vec<Point> = (0..self.lns.len())
            .flat_map(|li| (0..self.lns[li].chars.len()).map(move |i| (li, i)))
            .map(|(li, i)| self.char_pts_ut(li, i)[0])
            .collect();
        let odx: Vec<f64> = self.chrs().map(|c| c.dx).collect();
        let ody: Vec<f64> = self.chrs().map(|c| c.dy).collect();
        let parsed: Vec<(Option<Quad>, Option<Quad>)> = self
            .chrs()
            .map(|c| (c.parsed_pts_ut, c.parsed_pts_t))
            .collect();

        for d in dds {
            if doc.get(d, "sodipodi:role") == Some("line") {
                doc.remove(d, "sodipodi:role");
            }
        }
        delete_empty_nodes(doc, self.textel);
        if !doc.contains(self.textel) {
            self.lns.clear();
            return Ok(());
        }
        self.reparse(doc)?;
        self.restore_parsed_pts(&parsed);
        self.restore_positions(doc, &old, &odx, &ody);
        Ok(())
    }

    fn restore_parsed_pts(&mut self, parsed: &[(Option<Quad>, Option<Quad>)]) {
        if parsed.len() != self.char_count() {
            return;
        }
        let chars = self.lns.iter_mut().flat_map(|l| l.chars.iter_mut());
        for (c, &(ut, t)) in chars.zip(parsed) {
            c.parsed_pts_ut = ut;
            c.parsed_pts_t = t;
        }
    }

    /// Removes a `baseline-shift` set on the text element itself, moving the first
    /// line to make up for it.
    pub fn strip_text_baseline_shift(&mut self, doc: &mut Document) -> Result<(), Error> {
        if !doc.cascaded_style(self.textel).contains("baseline-shift") {
            return Ok(());
        }
        let Some(first) = self.lns.first().and_then(|l| l.chars.first()) else {
            return Ok(());
        };
        let bsv = first.bshft;
        let lny = self.line_y(0);
        let mut s = doc.style_attr(self.textel);
        s.remove("baseline-shift");
        doc.set_style(self.textel, &s);
        doc.remove(self.textel, "baseline-shift");
        self.reparse(doc)?;
        if !self.lns.is_empty() {
            self.write_xy(doc, 0, None, Some(shifted(lny, -bsv)));
        }
        Ok(())
    }

    /// Replaces every character's font with the font it is actually drawn with.
    ///
    /// The face name becomes the first family, followed by the true family, so that
    /// renderers that only know face names pick the same font. The most common font of
    /// each element goes on the element; characters in other fonts are wrapped in
    /// spans.
    pub fn fuse_fonts(&mut self, doc: &mut Document) {
        let fused = |csty: &FontKey| -> FontKey {
            let mut k = csty.clone();
            if let (Some(full), Some(fam)) = (self.ctable.full_name(csty), csty.primary_family()) {
                if full != fam.name() {
                    k.family = [FamilyName::Named(full.to_owned()), fam.clone()]
                        .into_iter()
                        .collect();
                }
            }
            k
        };

        let mut order: Vec<NodeId> = Vec::new();
        let mut torepl: HashMap<NodeId, Vec<(FontKey, Vec<CharId>)>> = HashMap::new();
        for c in self.chrs() {
            let key = match self.ctable.char_style(&c.fsty, c.c) {
                Some(csty) => fused(csty),
                None => c.fsty.clone(),
            };
            let groups = torepl.entry(c.loc.sel).or_insert_with(|| {
                order.push(c.loc.sel);
                Vec::new()
            });
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, ids)) => ids.push(c.id),
                None => groups.push((key, vec![c.id])),
            }
        }

        for sel in order {
            let Some(mut groups) = torepl.remove(&sel) else {
                continue;
            };
            groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
            let (key0, ids0) = &groups[0];
            let cascaded = doc.cascaded_style(sel);
            if FontKey::from_style(&cascaded) != *key0 {
                let mut s = (*cascaded).clone();
                s.update(&key0.to_style());
                s.remove("-inkscape-font-specification");
                doc.set_style(sel, &s);
                let specified = doc.specified_style(sel);
                for id in ids0 {
                    if let Some((l, i)) = self.locate(*id) {
                        self.lns[l].chars[i].sty = Arc::clone(&specified);
                    }
                }
            }
            for (key, ids) in &groups[1..] {
                let mut s = key.to_style();
                s.set("baseline-shift", "0%");
                for id in ids {
                    if let Some((l, i)) = self.locate(*id) {
                        self.add_style(doc, l, i, &s, false, false);
                    }
                }
            }
        }
    }

    /// Converts flowed text into one `text` element per line, and deletes the flowed
    /// element.
    ///
    /// Lines that did not fit into the flow region are dropped. Returns the new
    /// elements, last line first.
    pub fn flow_to_text(&mut self, doc: &mut Document) -> Result<Vec<NodeId>, Error> {
        if !self.isflow {
            return Ok(Vec::new());
        }
        let mut newtxts = Vec::new();
        for li in (0..self.lns.len()).rev() {
            let line = &self.lns[li];
            let overflowed = self.line_y(li).iter().flatten().any(|y| y.is_nan());
            let anch = line.anchor;
            let algn = anch.to_align().as_str();
            let origx = (!line.chars.is_empty()).then(|| self.char_pts_ut(li, 0)[0].x);
            let ids: Vec<CharId> = line.chars.iter().map(|c| c.id).collect();
            let Some(mut npt) = self.split_off_characters(doc, &ids)? else {
                continue;
            };
            let newtxt = npt.textel;

            if doc.tag(newtxt) == "flowRoot" {
                for d in doc.descendants(newtxt) {
                    if !doc.contains(d) {
                        continue;
                    }
                    match doc.tag(d) {
                        "flowRoot" => doc.set_tag(d, "text"),
                        "flowPara" | "flowSpan" => doc.set_tag(d, "tspan"),
                        "flowRegion" => doc.delete(d),
                        _ => {}
                    }
                }
            } else {
                let mut s = doc.style_attr(newtxt);
                s.remove("shape-inside");
                s.remove("inline-size");
                doc.set_style(newtxt, &s);
                for k in doc.element_children(newtxt) {
                    let mut s = doc.style_attr(k);
                    s.set("text-align", algn);
                    s.set("text-anchor", anch.as_str());
                    doc.set_style(k, &s);
                }
            }

            if overflowed {
                doc.delete(newtxt);
                continue;
            }
            delete_empty_nodes(doc, newtxt);
            if !doc.contains(newtxt) {
                continue;
            }
            npt.reparse(doc)?;
            if let Some(ox) = origx {
                if npt.lns.first().is_some_and(|l| !l.chars.is_empty()) {
                    let d = ox - npt.char_pts_ut(0, 0)[0].x;
                    let newx = shifted(npt.line_x(0), d);
                    npt.write_xy(doc, 0, Some(newx), None);
                }
            }
            newtxts.push(newtxt);
        }
        doc.delete(self.textel);
        self.lns.clear();
        Ok(newtxts)
    }

    /// Converts `dx`/`dy` kerning into absolute `x`/`y` positions.
    ///
    /// Every character with a `dx` or `dy` starts a new run with its own position, so
    /// that later edits cannot shift the characters after it. The positions recorded
    /// at parse time (see [`TChar::parsed_pts_ut`]) are kept across the reparse.
    pub fn differential_to_absolute_kerning(&mut self, doc: &mut Document) -> Result<(), Error> {
        if self.isflow || !self.chrs().any(|c| c.dx != 0. || c.dy != 0.) {
            return Ok(());
        }
        for li in 0..self.lns.len() {
            self.disable_sodipodi(doc, li, false);
        }
        for li in 0..self.lns.len() {
            let a = self.lns[li].anchfrac();
            for ci in 0..self.lns[li].chks.len() {
                let iis = self.lns[li].chks[ci].iis.clone();
                let pts: Vec<Quad> = iis.iter().map(|&k| self.char_pts_ut(li, k)).collect();
                let starts: Vec<bool> = iis
                    .iter()
                    .enumerate()
                    .map(|(j, &k)| {
                        let c = &self.lns[li].chars[k];
                        j == 0 || c.dx != 0. || c.dy != 0.
                    })
                    .collect();
                let nline = self.lns[li].chars.len();
                let mut vals = Vec::with_capacity(iis.len());
                for (j, &k) in iis.iter().enumerate() {
                    if !starts[j] {
                        vals.push((None, None));
                        continue;
                    }
                    let lc = (j + 1..iis.len())
                        .find(|&m| starts[m])
                        .map_or(iis.len() - 1, |m| m - 1);
                    let mut right = pts[lc][3].x;
                    let last = &self.lns[li].chars[iis[lc]];
                    if self.space_unrendered(li, lc - j + 1, iis[lc] + 1 == nline, last.c) {
                        right -= last.cwd();
                    }
                    let c = &self.lns[li].chars[k];
                    let ax = pts[j][0].x * (1. - a) + right * a;
                    let ay = pts[j][0].y + c.bshft;
                    vals.push((Some(ax), Some(ay)));
                }
                for (&k, (ax, ay)) in iis.iter().zip(vals) {
                    let c = &mut self.lns[li].chars[k];
                    c.ax = ax;
                    c.ay = ay;
                    c.dx = 0.;
                    c.dy = 0.;
                }
            }
        }
        self.dchange = true;
        self.achange = true;
        self.write_dxdy(doc);
        self.write_axay(doc);

        let parsed: Vec<(Option<Quad>, Option<Quad>)> = self
            .chrs()
            .map(|c| (c.parsed_pts_ut, c.parsed_pts_t))
            .collect();
        self.reparse(doc)?;
        self.restore_parsed_pts(&parsed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splicing_position_lists() {
        let v = [Some(1.), None, Some(3.)];
        // The next character inherits the deleted one's position.
        assert_eq!(splice_out(&v, 0, 3), Some(vec![Some(1.), Some(3.)]));
        assert_eq!(splice_out(&v, 1, 3), Some(vec![Some(1.), Some(3.)]));
        assert_eq!(splice_out(&v, 2, 5), Some(vec![Some(1.), None, Some(3.)]));
        assert_eq!(splice_out(&[Some(1.)], 0, 3), None);
    }

    #[test]
    fn whitespace_only_text_is_empty() {
        let mut doc = Document::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg">"#,
            r#"<text id="a"> <tspan id="s"/>
</text><text id="b">x<tspan id="e"></tspan></text></svg>"#
        ))
        .unwrap();
        let a = doc.element_by_id("a").unwrap();
        let b = doc.element_by_id("b").unwrap();
        let e = doc.element_by_id("e").unwrap();
        assert!(delete_empty_nodes(&mut doc, a));
        assert!(!doc.contains(a));
        assert!(delete_empty_nodes(&mut doc, b));
        assert!(doc.contains(b));
        assert!(!doc.contains(e));
        assert_eq!(doc.text(b), Some("x"));
    }
}
