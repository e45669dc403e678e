// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parsing of text elements into lines.
//!
//! Every `text` element is a group of lines. A line is the text that gets its position
//! from one source element: the position is either set directly, inherited from an
//! ancestor or descendant, or continued from the end of the previous line.

use std::sync::Arc;

use hashbrown::HashMap;
use svgtext_primitives::{Direction, TextAnchor, DEFAULT_FONT_SIZE};

use super::model::{CLoc, TChar, TChunk, TLine};
use super::tree::{BlockKind, TextTree};
use super::write::{wrap_string, xyset};
use super::ParsedText;
use crate::dom::{composed_font_size, composed_line_height, ipx, Document, NodeId, Style};
use crate::font::FontKey;
use crate::util::{char_len, unique_tol};
use crate::Error;

/// How a descendant takes part in `sodipodi:role="line"` layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineRole {
    /// Not an active line marker.
    Normal,
    /// An active marker that already follows other text, so it does not start a line.
    Preceded,
    /// An active marker that starts a new line below the previous one.
    TopLevel,
}

/// Reads an `x`, `y`, `dx` or `dy` list. A missing attribute gives `[None]`.
pub(crate) fn get_xy(doc: &Document, id: NodeId, name: &str) -> Vec<Option<f64>> {
    let ret: Vec<Option<f64>> = doc
        .get(id, name)
        .unwrap_or_default()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|v| !v.is_empty())
        .map(|v| if v == "none" { None } else { ipx(v) })
        .collect();
    if ret.is_empty() {
        vec![None]
    } else {
        ret
    }
}

/// A `dx` or `dy` list padded with zeros to `n` characters.
pub(crate) fn padded(vals: &[Option<f64>], n: usize) -> Vec<f64> {
    if vals.first().copied().flatten().is_none() {
        return vec![0.; n];
    }
    vals.iter()
        .map(|v| v.unwrap_or(0.))
        .chain(core::iter::repeat(0.))
        .take(n)
        .collect()
}

/// The anchor a style selects, with right-to-left text swapping start and end.
pub(crate) fn style_anchor(sty: &Style) -> TextAnchor {
    let anchor = sty
        .get("text-anchor")
        .and_then(TextAnchor::parse)
        .unwrap_or_default();
    match sty.get("direction").and_then(Direction::parse) {
        Some(Direction::Rtl) => anchor.mirrored(),
        _ => anchor,
    }
}

/// Letter spacing of a style, in user units. `em` values scale with the style's own
/// font size.
pub(crate) fn letter_spacing(sty: &Style, default_font_size: f64) -> f64 {
    let Some(v) = sty.get("letter-spacing").map(str::trim) else {
        return 0.;
    };
    match v.strip_suffix("em") {
        Some(em) => {
            let fs = sty
                .get("font-size")
                .and_then(ipx)
                .unwrap_or(default_font_size);
            em.trim().parse::<f64>().map_or(0., |em| em * fs)
        }
        None => ipx(v).unwrap_or(0.),
    }
}

/// Baseline shift of an element, upwards, in user units.
///
/// Shifts accumulate: each ancestor with a `baseline-shift` raises its text relative to
/// its parent's. An element that only inherits the property shifts by the sum so far.
pub(crate) fn baseline_shift(doc: &Document, sty: &Style, sel: NodeId) -> f64 {
    if !sty.contains("baseline-shift") {
        return 0.;
    }
    let mut bsancs = Vec::new();
    let mut cel = Some(sel);
    while let Some(c) = cel {
        if !doc.specified_style(c).contains("baseline-shift") {
            break;
        }
        bsancs.push(c);
        cel = doc.parent(c);
    }
    let mut relbs: Vec<f64> = Vec::with_capacity(bsancs.len());
    for &att in bsancs.iter().rev() {
        let v = match doc.cascaded_style(att).get("baseline-shift") {
            Some(v) => resolve_baseline(doc, v, doc.parent(att)),
            None => relbs.iter().sum(),
        };
        relbs.push(v);
    }
    relbs.iter().sum()
}

/// A `baseline-shift` value. Percentages are of the parent's font size.
fn resolve_baseline(doc: &Document, value: &str, parent: Option<NodeId>) -> f64 {
    let value = match value.trim() {
        "super" => "40%",
        "sub" => "-20%",
        v => v,
    };
    match value.strip_suffix('%') {
        Some(pct) => {
            let fs = parent.map_or(DEFAULT_FONT_SIZE, |p| {
                composed_font_size(doc, p).untransformed
            });
            fs * pct.trim().parse::<f64>().unwrap_or(0.) / 100.
        }
        None => ipx(value).unwrap_or(0.),
    }
}

impl ParsedText {
    /// Parses the element from scratch.
    pub(crate) fn build(&mut self, doc: &mut Document) -> Result<(), Error> {
        let sty = doc.specified_style(self.textel);
        self.isflow = doc.tag(self.textel) == "flowRoot"
            || doc.get_link(self.textel, "shape-inside").is_some()
            || sty
                .get("inline-size")
                .and_then(ipx)
                .is_some_and(|v| v != 0.);
        self.lns.clear();
        self.tree = None;
        self.dchange = false;
        self.achange = false;
        self.fparaafter = false;

        if self.settings.remove_position_overflows {
            remove_position_overflows(doc, self.textel);
        }
        if self.isflow {
            self.parse_lines_flow(doc)?;
        } else {
            self.parse_lines(doc, false)?;
        }
        self.finish_lines();

        let tlvl: Vec<&TLine> = self
            .lns
            .iter()
            .filter(|l| l.tlvlno.is_some_and(|n| n > 0))
            .collect();
        self.isinkscape = !tlvl.is_empty()
            && tlvl.iter().all(|l| l.sprl)
            && self
                .lns
                .iter()
                .all(|l| l.style.contains("-inkscape-font-specification"));
        self.ismlinkscape = self.isinkscape && self.lns.len() > 1;
        log::trace!(
            "parsed {:?} into {} lines ({} characters)",
            self.textel,
            self.lns.len(),
            self.char_count()
        );
        Ok(())
    }

    /// Parses the element again, after its document changed.
    pub fn reparse(&mut self, doc: &mut Document) -> Result<(), Error> {
        self.build(doc)
    }

    /// Splits the element into lines.
    ///
    /// With `srcs_only`, stops at the first line and returns the elements its `x` and
    /// `y` come from, leaving the current lines untouched.
    pub(crate) fn parse_lines(
        &mut self,
        doc: &mut Document,
        srcs_only: bool,
    ) -> Result<Option<(NodeId, NodeId)>, Error> {
        let tree = self.take_tree(doc);
        let ret = self.parse_lines_with(doc, &tree, srcs_only);
        self.tree = Some(tree);
        ret
    }

    fn parse_lines_with(
        &mut self,
        doc: &mut Document,
        tree: &TextTree,
        srcs_only: bool,
    ) -> Result<Option<(NodeId, NodeId)>, Error> {
        let elem = self.textel;
        let dds = tree.descendants();
        let pts = tree.preceding_tails();
        let numd = dds.len();
        let kids = doc.element_children(elem);
        let text: Vec<Option<String>> = dds
            .iter()
            .map(|&d| doc.text(d).map(str::to_owned))
            .collect();
        let has_text = |i: usize| text[i].as_deref().is_some_and(|t| !t.is_empty());

        let xvs: Vec<_> = dds.iter().map(|&d| get_xy(doc, d, "x")).collect();
        let yvs: Vec<_> = dds.iter().map(|&d| get_xy(doc, d, "y")).collect();
        let dxvs: Vec<_> = dds.iter().map(|&d| get_xy(doc, d, "dx")).collect();
        let dyvs: Vec<_> = dds.iter().map(|&d| get_xy(doc, d, "dy")).collect();
        let mut nsprl: Vec<bool> = dds
            .iter()
            .map(|&d| doc.get(d, "sodipodi:role") == Some("line"))
            .collect();

        // Markers on elements with several positions, or below the top level, do nothing.
        let mut esprl: Vec<bool> = (0..numd)
            .map(|i| nsprl[i] && xvs[i].len() == 1 && yvs[i].len() == 1 && kids.contains(&dds[i]))
            .collect();
        for i in 0..numd {
            // A marker without text of its own is disabled by a positioned descendant
            // with text.
            if esprl[i] && !has_text(i) {
                let dstop = pts
                    .iter()
                    .position(|pt| pt.contains(&dds[i]))
                    .unwrap_or(numd);
                if (i + 1..dstop.min(numd))
                    .any(|d| (xvs[d][0].is_some() || yvs[d][0].is_some()) && has_text(d))
                {
                    esprl[i] = false;
                }
            }
        }

        if self.settings.remove_position_overflows && !srcs_only {
            for (i, &d) in dds.iter().enumerate() {
                if nsprl[i] && !esprl[i] {
                    doc.remove(d, "sodipodi:role");
                    nsprl[i] = false;
                }
            }
        }

        let types: Vec<LineRole> = (0..numd)
            .map(|i| {
                let preceded = pts[i]
                    .last()
                    .is_some_and(|&t| doc.tail(t).is_some());
                if !esprl[i] {
                    LineRole::Normal
                } else if preceded || (kids.first() == Some(&dds[i]) && text[0].is_some()) {
                    LineRole::Preceded
                } else {
                    LineRole::TopLevel
                }
            })
            .collect();

        // Positions inherit up and down the tree, unless text or an active marker is in
        // between. Inheriting from an ancestor wins over a descendant.
        let inherits_from = |iin: usize| -> (usize, usize) {
            let is_child = |c: usize, p: usize| tree.parent(dds[c]) == Some(dds[p]);
            let mut jmax = iin;
            while jmax + 1 < numd && !has_text(jmax) && is_child(jmax + 1, jmax) && !esprl[jmax + 1]
            {
                jmax += 1;
            }
            if jmax + 1 < numd && !has_text(jmax) {
                jmax = iin;
            }
            let mut jmin = iin;
            while jmin > 0 && !has_text(jmin - 1) && is_child(jmin, jmin - 1) && !esprl[jmin - 1] {
                jmin -= 1;
            }
            (jmin, jmax)
        };
        let inherit_none = |iin: usize, xyt: &[Vec<Option<f64>>]| -> (Vec<Option<f64>>, NodeId) {
            if xyt[iin][0].is_none() {
                let (imin, imax) = inherits_from(iin);
                let mut vld: Vec<usize> = (imin..=imax).filter(|&i| xyt[i][0].is_some()).collect();
                if vld.iter().any(|&i| i <= iin) {
                    vld.retain(|&i| i <= iin);
                }
                if let Some(j) = vld.into_iter().min_by_key(|&i| i.abs_diff(iin)) {
                    return (xyt[j].clone(), dds[j]);
                }
            }
            (xyt[iin].clone(), dds[iin])
        };

        let (mut ixs, xsrcs): (Vec<_>, Vec<_>) = (0..numd).map(|i| inherit_none(i, &xvs)).unzip();
        let (mut iys, ysrcs): (Vec<_>, Vec<_>) = (0..numd).map(|i| inherit_none(i, &yvs)).unzip();
        if ixs[0][0].is_none() {
            ixs[0] = vec![Some(0.)];
        }
        if iys[0][0].is_none() {
            iys[0] = vec![Some(0.)];
        }

        let mut lns: Vec<TLine> = Vec::new();
        let mut sprl_inherits: Option<usize> = None;
        for block in tree.blocks(doc, None) {
            let ddi = block.index;
            let (kind, tel, sel) = (block.kind, block.src, block.sel);
            let newsprl = kind == BlockKind::Text && types[ddi] == LineRole::TopLevel;
            let nonempty = block.text.as_deref().is_some_and(|t| !t.is_empty());
            if !nonempty && !newsprl {
                continue;
            }
            let sty = doc.specified_style(sel);
            let fs = composed_font_size(doc, sel);
            let seli = tree.position(sel).unwrap_or(0);

            let makeline = lns.is_empty()
                || (kind == BlockKind::Text
                    && (newsprl
                        || (types[ddi] == LineRole::Normal
                            && (ixs[ddi][0].is_some() || iys[ddi][0].is_some()))));
            if makeline {
                let edi = match kind {
                    BlockKind::Text => ddi,
                    BlockKind::Tail => seli,
                };
                let mut xvl = ixs[edi].clone();
                let mut xsrc = xsrcs[edi];
                let mut yvl = iys[edi].clone();
                let mut ysrc = ysrcs[edi];
                let (mut continuex, mut continuey) = (false, false);
                if newsprl {
                    match sprl_inherits.map(|i| &lns[i]) {
                        None => {
                            xvl = vec![ixs[0][0]];
                            xsrc = xsrcs[0];
                            yvl = vec![iys[0][0]];
                            ysrc = ysrcs[0];
                        }
                        Some(inh) => {
                            let lht = composed_line_height(doc, sel).max(
                                doc.parent(sel)
                                    .map_or(0., |p| composed_line_height(doc, p)),
                            );
                            xvl = vec![first_parsed(&inh.xv, inh.continuex)];
                            xsrc = inh.xsrc;
                            yvl = vec![
                                first_parsed(&inh.yv, inh.continuey).map(|y| y + lht / fs.scale),
                            ];
                            ysrc = inh.ysrc;
                        }
                    }
                } else {
                    if xvl[0].is_none() {
                        match lns.last() {
                            Some(prev) => {
                                xvl = parsed_list(&prev.xv, prev.continuex);
                                xsrc = prev.xsrc;
                            }
                            None => {
                                xvl.clone_from(&ixs[0]);
                                xsrc = xsrcs[0];
                            }
                        }
                        continuex = true;
                    }
                    if yvl[0].is_none() {
                        match lns.last() {
                            Some(prev) => {
                                yvl = parsed_list(&prev.yv, prev.continuey);
                                ysrc = prev.ysrc;
                            }
                            None => {
                                yvl.clone_from(&iys[0]);
                                ysrc = ysrcs[0];
                            }
                        }
                        continuey = true;
                    }
                }

                if srcs_only {
                    return Ok(Some((xsrc, ysrc)));
                }

                let tlvlno = if ddi < numd && kids.contains(&dds[ddi]) {
                    kids.iter().position(|&k| k == dds[ddi])
                } else if edi == 0 {
                    Some(0)
                } else {
                    None
                };

                // Lines that are not markers keep the anchor of the line before.
                let anchor = match lns.last() {
                    Some(prev) if !nsprl[seli] && edi > 0 => prev.anchor,
                    _ => style_anchor(&sty),
                };

                let mut sprlabove = Vec::new();
                let mut cel = Some(dds[edi]);
                while let Some(c) = cel.filter(|&c| c != elem) {
                    if tree.position(c).is_some_and(|p| nsprl[p]) {
                        sprlabove.push(c);
                    }
                    cel = tree.parent(c);
                }

                let mut line = TLine::new(
                    xvl,
                    yvl,
                    xsrc,
                    ysrc,
                    anchor,
                    doc.composed_transform(sel),
                    Arc::clone(&sty),
                );
                line.sprl = newsprl;
                line.sprlabove = sprlabove;
                line.tlvlno = tlvlno;
                line.continuex = continuex;
                line.continuey = continuey;
                lns.push(line);
                if newsprl || lns.len() == 1 {
                    sprl_inherits = Some(lns.len() - 1);
                }
            }

            let Some(txt) = block.text.as_deref() else {
                continue;
            };
            let chars: Vec<char> = txt.chars().collect();
            let (dxv, dyv) = match kind {
                BlockKind::Text => (
                    padded(&dxvs[ddi], chars.len()),
                    padded(&dyvs[ddi], chars.len()),
                ),
                BlockKind::Tail => (vec![0.; chars.len()], vec![0.; chars.len()]),
            };
            let fsty = FontKey::from_style(&sty);
            let tsty = self.ctable.true_style(&fsty).cloned();
            let lsp = letter_spacing(&sty, self.settings.default_font_size);
            let bshft = baseline_shift(doc, &sty, sel);
            for (j, &c) in chars.iter().enumerate() {
                let csty = self.font_picker(&chars, j, &fsty, tsty.as_ref());
                let prop = self.ctable.get_prop(c, csty.as_ref())?.clone();
                let mut tc = TChar::new(
                    self.new_char_id(),
                    c,
                    fs,
                    prop,
                    Arc::clone(&sty),
                    fsty.clone(),
                    csty,
                    CLoc::new(tel, kind, j, sel),
                    dxv[j],
                    dyv[j],
                );
                tc.lsp = lsp;
                tc.bshft = bshft;
                if let Some(line) = lns.last_mut() {
                    line.chars.push(tc);
                }
            }
        }

        if !srcs_only {
            self.lns = lns;
        }
        Ok(None)
    }

    /// The font the renderer draws character `j` of `txt` with.
    ///
    /// A space between characters that fell back to another font is drawn in that
    /// font.
    pub(crate) fn font_picker(
        &self,
        txt: &[char],
        j: usize,
        fsty: &FontKey,
        tsty: Option<&FontKey>,
    ) -> Option<FontKey> {
        if txt[j] != ' ' {
            return tsty.cloned();
        }
        let lbc = txt[..j].iter().rev().find(|c| !c.is_whitespace());
        let fac = txt[j + 1..].iter().find(|c| !c.is_whitespace());
        let entry = |c: char| self.ctable.char_style_entry(fsty, c);
        let picked = match (lbc, fac) {
            (Some(&l), Some(&f)) => entry(l).filter(|&e| Some(e) == entry(f)),
            (None, Some(&f)) => entry(f),
            (Some(&l), None) => entry(l),
            (None, None) => None,
        };
        match picked {
            Some(sty) => sty.cloned(),
            None => tsty.cloned(),
        }
    }

    /// Records dx/dy state, groups every line into chunks and drops empty lines.
    pub(crate) fn finish_lines(&mut self) {
        let writtendx = self.chrs().any(|c| c.dx != 0.);
        let writtendy = self.chrs().any(|c| c.dy != 0.);
        (self.writtendx, self.writtendy) = (writtendx, writtendy);
        for li in 0..self.lns.len() {
            self.parse_chunks(li);
        }
        self.lns.retain(|l| !l.chars.is_empty());
    }

    /// Groups a line's characters into chunks. A chunk starts at the first character
    /// and at every character with its own `x` or `y`.
    pub(crate) fn parse_chunks(&mut self, li: usize) {
        let line = &self.lns[li];
        let starts_at = |vals: &[Option<f64>], cont: bool, i: usize| {
            if cont {
                i == 0
            } else {
                vals.get(i).is_some_and(Option::is_some)
            }
        };
        let starts: Vec<bool> = (0..line.chars.len())
            .map(|i| {
                i == 0
                    || starts_at(&line.xv, line.continuex, i)
                    || starts_at(&line.yv, line.continuey, i)
            })
            .collect();
        let mut chks: Vec<TChunk> = Vec::new();
        for (i, start) in starts.into_iter().enumerate() {
            match chks.last_mut() {
                Some(chk) if !start => chk.iis.push(i),
                _ => chks.push(TChunk::new(self.new_chunk_id(), i)),
            }
        }
        let line = &mut self.lns[li];
        line.chks = chks;
        line.reindex();
    }

    /// Links every chunk to its neighbours on the same baseline, left to right.
    ///
    /// Lines are grouped by their first `y`. A space chunk drawn at the same place as the
    /// chunk after it is put after that chunk.
    pub fn make_next_chain(&mut self) {
        for line in &mut self.lns {
            for chk in &mut line.chks {
                chk.nextw = None;
                chk.prevw = None;
                chk.prevsametspan = false;
            }
        }
        let tol = self.settings.same_y_tolerance;
        let yvs: Vec<f64> = (0..self.lns.len())
            .map(|li| self.line_y(li).first().copied().flatten().unwrap_or(f64::NAN))
            .collect();
        let mut links = Vec::new();
        for unqy in unique_tol(&yvs, tol) {
            let mut sws: Vec<(f64, usize, usize)> = Vec::new();
            for (li, y) in yvs.iter().enumerate() {
                if (y - unqy).abs() >= tol {
                    continue;
                }
                for ci in 0..self.lns[li].chks.len() {
                    let pts = self.chunk_pts_ut(li, ci);
                    sws.push((0.5 * (pts[0].x + pts[3].x), li, ci));
                }
            }
            sws.sort_by(|a, b| a.0.total_cmp(&b.0));
            for i in 1..sws.len() {
                let (_, pl, pc) = sws[i - 1];
                let (_, cl, cc) = sws[i];
                if self.chunk_txt(pl, pc) == " "
                    && (self.chunk_pts_ut(pl, pc)[0].x - self.chunk_pts_ut(cl, cc)[0].x).abs()
                        < 0.01 * self.chunk_spw(pl, pc).unwrap_or(0.)
                {
                    sws.swap(i - 1, i);
                }
            }
            for pair in sws.windows(2) {
                let (_, pl, pc) = pair[0];
                let (_, cl, cc) = pair[1];
                let prev_sel = self.lns[pl].chunk_chars(pc).last().map(|c| c.loc.sel);
                let next_sel = self.lns[cl].chunk_chars(cc).next().map(|c| c.loc.sel);
                links.push(((pl, pc), (cl, cc), prev_sel.is_some() && prev_sel == next_sel));
            }
        }
        for ((pl, pc), (cl, cc), same) in links {
            let pid = self.lns[pl].chks[pc].id;
            let cid = self.lns[cl].chks[cc].id;
            self.lns[pl].chks[pc].nextw = Some(cid);
            let next = &mut self.lns[cl].chks[cc];
            next.prevw = Some(pid);
            next.prevsametspan = same;
        }
    }
}

/// A line's position list as seen while parsing: a continued line reads as `[0]` until
/// the line before it has chunks.
fn parsed_list(vals: &[Option<f64>], cont: bool) -> Vec<Option<f64>> {
    if cont {
        vec![Some(0.)]
    } else {
        vals.to_vec()
    }
}

fn first_parsed(vals: &[Option<f64>], cont: bool) -> Option<f64> {
    parsed_list(vals, cont).first().copied().flatten()
}

const POSITION_ATTRIBUTES: [&str; 4] = ["x", "y", "dx", "dy"];

/// Moves position values that overflow the text of their element onto the text that
/// follows it.
///
/// Editors only write as many `x`, `y`, `dx` and `dy` values as an element has
/// characters. Longer lists are legal and apply to the descendants' text, which this
/// pass makes explicit so that every list annotates its own text.
pub(crate) fn remove_position_overflows(doc: &mut Document, el: NodeId) {
    let xyvs: HashMap<(NodeId, usize), Vec<Option<f64>>> = doc
        .descendants(el)
        .into_iter()
        .flat_map(|d| (0..4).map(move |k| (d, k)))
        .map(|(d, k)| ((d, k), get_xy(doc, d, POSITION_ATTRIBUTES[k])))
        .collect();
    let tree = TextTree::new(doc, el);
    let blocks = tree.blocks(doc, None);
    let anyoverflow = blocks
        .iter()
        .filter(|b| b.kind == BlockKind::Text)
        .any(|b| {
            (0..4).any(|k| {
                let v = &xyvs[&(b.src, k)];
                v.len() > 1 && b.text.as_deref().is_none_or(|t| v.len() > char_len(t))
            })
        });
    if !anyoverflow {
        return;
    }
    log::debug!("redistributing overflowing positions of {el:?}");

    let toplevels = doc.element_children(el);
    let mut pos: [Vec<Option<f64>>; 4] = Default::default();
    let mut topidx = 0;
    for b in &blocks {
        if b.kind == BlockKind::Text {
            for (k, patt) in POSITION_ATTRIBUTES.iter().enumerate() {
                let xyv = &xyvs[&(b.src, k)];
                if xyv[0].is_none() {
                    continue;
                }
                // Descendants override ancestors. A single x or y stays in place.
                if k >= 2 || xyv.len() > 1 {
                    doc.remove(b.src, patt);
                }
                let (mut cntd, mut cntl) = (0, 0);
                for sb in tree.blocks(doc, Some(b.src)) {
                    if sb.kind == BlockKind::Tail
                        && doc.get(sb.src, "sodipodi:role") == Some("line")
                        && toplevels.contains(&sb.src)
                    {
                        // Top-level lines start with an implicit line break.
                        cntd += 1;
                    }
                    if let Some(txt) = &sb.text {
                        let tl = char_len(txt);
                        let stpd = xyv.len().min(cntd + tl);
                        if stpd > cntd {
                            let srtl = topidx + cntl;
                            let stpl = srtl + stpd - cntd;
                            if stpl >= pos[k].len() {
                                pos[k].resize(stpl + 1, None);
                            }
                            pos[k][srtl..stpl].copy_from_slice(&xyv[cntd..stpd]);
                        }
                        cntd += tl;
                        cntl += tl;
                    }
                    if cntd >= xyv.len() {
                        break;
                    }
                }
            }
        }
        if let Some(t) = &b.text {
            topidx += char_len(t);
        }
    }

    let mut topidx = 0;
    for b in &blocks {
        let Some(txt) = &b.text else {
            continue;
        };
        let tl = char_len(txt);
        let mut src = b.src;
        let mut wrapped = false;
        for (k, patt) in POSITION_ATTRIBUTES.iter().enumerate() {
            let vals: Vec<Option<f64>> = pos[k]
                .iter()
                .skip(topidx)
                .take(tl)
                .filter(|v| v.is_some())
                .copied()
                .collect();
            if vals.is_empty() {
                continue;
            }
            if b.kind == BlockKind::Tail && !wrapped {
                src = wrap_string(doc, src, BlockKind::Tail);
                wrapped = true;
            }
            // A single x or y on a wrapped tail would turn it into a new line.
            if !(vals.len() == 1 && k < 2 && wrapped) {
                xyset(doc, src, patt, &vals);
            }
        }
        topidx += tl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_lists() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text id="t" x="1,2 none 4" dx="">a</text></svg>"#,
        )
        .unwrap();
        let t = doc.element_by_id("t").unwrap();
        assert_eq!(get_xy(&doc, t, "x"), [Some(1.), Some(2.), None, Some(4.)]);
        assert_eq!(get_xy(&doc, t, "dx"), [None]);
        assert_eq!(get_xy(&doc, t, "y"), [None]);
        assert_eq!(padded(&[Some(1.)], 3), [1., 0., 0.]);
        assert_eq!(padded(&[None], 2), [0., 0.]);
    }

    #[test]
    fn spacing_values() {
        let sty = Style::parse("letter-spacing:0.5em;font-size:10px");
        assert_eq!(letter_spacing(&sty, 12.), 5.);
        assert_eq!(letter_spacing(&Style::parse("letter-spacing:2px"), 12.), 2.);
        assert_eq!(letter_spacing(&Style::parse("letter-spacing:normal"), 12.), 0.);
        assert_eq!(
            style_anchor(&Style::parse("text-anchor:start;direction:rtl")),
            TextAnchor::End
        );
    }

    #[test]
    fn overflowing_positions_move_to_children() {
        let mut doc = Document::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg">"#,
            r#"<text id="t" x="1 2 3 4">ab<tspan id="s">cd</tspan></text></svg>"#
        ))
        .unwrap();
        let t = doc.element_by_id("t").unwrap();
        let s = doc.element_by_id("s").unwrap();
        remove_position_overflows(&mut doc, t);
        assert_eq!(doc.get(t, "x"), Some("1 2"));
        assert_eq!(doc.get(s, "x"), Some("3 4"));
    }
}
