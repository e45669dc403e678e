// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line breaking of flowed text.
//!
//! Flowed text is either a `flowRoot` with a `flowRegion`, or an SVG 2 `text` with a
//! `shape-inside` or an `inline-size`. Characters are first grouped into paragraph lines
//! (one per `flowPara`, or a single one), then broken into lines that fit the region.
//! Rectangular regions take the full width; other shapes offer the intervals where at
//! least 90% of the line height is inside the shape.

use std::sync::Arc;

use kurbo::{BezPath, Line, ParamCurve, ParamCurveDeriv, PathSeg, Point, Rect, Shape, Vec2};
use svgtext_primitives::{TextAlign, TextAnchor};

use super::model::{CLoc, TChar, TLine};
use super::parse::{baseline_shift, get_xy, letter_spacing, padded, style_anchor};
use super::tree::BlockKind;
use super::ParsedText;
use crate::dom::{
    composed_font_size, composed_line_height, ipx, is_rectangle, path_is_rectangle, shape_path,
    Document, NodeId, Style,
};
use crate::font::FontKey;
use crate::Error;

/// A character of a paragraph line: line index and character index.
type Pos = (usize, usize);

/// Position of an SVG 2 `inline-size` text.
#[derive(Clone, Copy, Debug)]
struct InlineSize {
    x: Option<f64>,
    y: Option<f64>,
}

/// Where text flows.
#[derive(Debug)]
struct Region {
    bbx: Rect,
    /// The outline, for shapes that are not rectangles.
    segs: Option<Vec<PathSeg>>,
    inline: Option<InlineSize>,
}

/// Where a horizontal or vertical line crosses the outline.
#[derive(Clone, Copy, Debug)]
struct Hit {
    pt: Point,
    seg: usize,
    t: f64,
}

impl Region {
    /// The intervals, as `(x, width)`, where a line with its top at `y` below the top of
    /// the region can be drawn.
    fn xlims(&self, y: f64, lht: f64) -> Vec<(f64, f64)> {
        let Some(segs) = &self.segs else {
            return vec![(self.bbx.x0, self.bbx.width())];
        };
        let top = self.bbx.y0 + y;
        let h10 = hits(segs, self.horizontal(top + 0.1 * lht), |p| p.x);
        let h90 = hits(segs, self.horizontal(top + 0.9 * lht), |p| p.x);
        let mut intervals = Vec::new();
        for p10 in h10.chunks_exact(2) {
            for p90 in h90.chunks_exact(2) {
                let a = p10[0].pt.x.max(p90[0].pt.x);
                let b = p10[1].pt.x.min(p90[1].pt.x);
                if b > a {
                    intervals.push((a, b));
                }
            }
        }

        // Narrow each interval to where the outline leaves 90% of the line height free,
        // following the tangents at its ends.
        let tol = lht * 1e-6;
        let at = |hs: &[Hit], x: f64| hs.iter().find(|h| h.pt.x == x).copied();
        let mut ret = Vec::new();
        for (a, b) in intervals {
            let Some((mta, bta, mba, bba)) =
                self.bounding_lines(segs, at(&h10, a), at(&h90, a), top, lht, tol)
            else {
                continue;
            };
            let Some((mtb, btb, mbb, bbb)) =
                self.bounding_lines(segs, at(&h10, b), at(&h90, b), top, lht, tol)
            else {
                continue;
            };
            let xa = if (mba * a + bba) - (mta * a + bta) < 0.9 * lht - tol {
                (mba != mta)
                    .then(|| (0.9 * lht - (bba - bta)) / (mba - mta))
                    .filter(|&x| x >= a)
            } else {
                Some(a)
            };
            let xb = if (mbb * b + bbb) - (mtb * b + btb) < 0.9 * lht - tol {
                (mbb != mtb)
                    .then(|| (0.9 * lht - (bbb - btb)) / (mbb - mtb))
                    .filter(|&x| x <= b)
            } else {
                Some(b)
            };
            if let (Some(xa), Some(xb)) = (xa, xb) {
                if xb >= xa {
                    ret.push((xa, xb - xa));
                }
            }
        }
        ret
    }

    fn horizontal(&self, y: f64) -> Line {
        Line::new((self.bbx.x0 - 1., y), (self.bbx.x1 + 1., y))
    }

    /// Slope and intercept of the outlines above and below the line, as seen from the
    /// crossing at its top (`p_top`) or, failing that, its bottom (`p_btm`).
    fn bounding_lines(
        &self,
        segs: &[PathSeg],
        p_top: Option<Hit>,
        p_btm: Option<Hit>,
        top: f64,
        lht: f64,
        tol: f64,
    ) -> Option<(f64, f64, f64, f64)> {
        if let Some(pt) = p_top {
            let (mtop, btop) = tangent(segs, pt, tol);
            let (mbtm, bbtm) = match self.across(segs, pt, true, tol) {
                Some(r) if r.pt.y <= top + lht => tangent(segs, r, tol),
                _ => (0., top + lht),
            };
            return Some((mtop, btop, mbtm, bbtm));
        }
        let pb = p_btm?;
        let (mbtm, bbtm) = tangent(segs, pb, tol);
        let (mtop, btop) = match self.across(segs, pb, false, tol) {
            Some(r) if r.pt.y >= top => tangent(segs, r, tol),
            _ => (0., top),
        };
        Some((mtop, btop, mbtm, bbtm))
    }

    /// The nearest crossing of the outline straight below (or above) a crossing.
    fn across(&self, segs: &[PathSeg], from: Hit, below: bool, tol: f64) -> Option<Hit> {
        let vertical = Line::new((from.pt.x, self.bbx.y0 - 1.), (from.pt.x, self.bbx.y1 + 1.));
        let hs = hits(segs, vertical, |p| p.y);
        if below {
            hs.into_iter().find(|h| h.pt.y > from.pt.y + tol)
        } else {
            hs.into_iter().rev().find(|h| h.pt.y < from.pt.y - tol)
        }
    }
}

/// Crossings of a line with the outline, sorted by `key`.
fn hits(segs: &[PathSeg], line: Line, key: impl Fn(Point) -> f64) -> Vec<Hit> {
    let mut ret: Vec<Hit> = segs
        .iter()
        .enumerate()
        .flat_map(|(seg, s)| {
            s.intersect_line(line).into_iter().map(move |i| Hit {
                pt: s.eval(i.segment_t),
                seg,
                t: i.segment_t,
            })
        })
        .collect();
    ret.sort_by(|a, b| key(a.pt).total_cmp(&key(b.pt)));
    ret
}

fn derivative(seg: &PathSeg, t: f64) -> Vec2 {
    match seg {
        PathSeg::Line(l) => l.p1 - l.p0,
        PathSeg::Quad(q) => q.deriv().eval(t).to_vec2(),
        PathSeg::Cubic(c) => c.deriv().eval(t).to_vec2(),
    }
}

/// Slope and intercept of the outline's tangent at a crossing. Vertical tangents get a
/// very steep slope.
fn tangent(segs: &[PathSeg], h: Hit, tol: f64) -> (f64, f64) {
    let d = derivative(&segs[h.seg], h.t);
    let slp = if d.x != 0. { d.y / d.x } else { d.y / tol };
    (slp, h.pt.y - slp * h.pt.x)
}

fn closed_segments(path: &BezPath) -> Vec<PathSeg> {
    let mut segs: Vec<PathSeg> = path.segments().collect();
    if let (Some(first), Some(last)) = (segs.first(), segs.last()) {
        let (start, end) = (first.start(), last.end());
        if start != end {
            segs.push(PathSeg::Line(Line::new(end, start)));
        }
    }
    segs
}

/// Characters `a + 1 ..= b` of a run, clamped.
fn slice(cs: &[Pos], a: isize, b: isize) -> Vec<Pos> {
    let clamp = |v: isize| usize::try_from(v.max(0)).unwrap_or(0).min(cs.len());
    let (a, b) = (clamp(a + 1), clamp(b + 1));
    if a < b {
        cs[a..b].to_vec()
    } else {
        Vec::new()
    }
}

impl ParsedText {
    /// Lays flowed text out into lines.
    pub(crate) fn parse_lines_flow(&mut self, doc: &mut Document) -> Result<(), Error> {
        let elem = self.textel;
        let sty = doc.specified_style(elem);
        let isflowroot = doc.tag(elem) == "flowRoot";
        let Some(region) = self.flow_region(doc, &sty)? else {
            // Fall back to the SVG 1.1 layout.
            log::debug!("{elem:?} has no flow region that can be laid out, parsing as text");
            self.isflow = false;
            self.parse_lines(doc, false)?;
            return Ok(());
        };

        self.lns = self.paragraph_lines(doc, &sty, isflowroot)?;
        self.finish_lines();
        // Extents of the characters of each paragraph, laid out on one line.
        let ext: Vec<Vec<(f64, f64)>> = (0..self.lns.len())
            .map(|li| {
                (0..self.lns[li].chars.len())
                    .map(|i| {
                        let q = self.char_pts_ut(li, i);
                        (q[0].x, q[3].x)
                    })
                    .collect()
            })
            .collect();
        let plines = core::mem::take(&mut self.lns);

        let mut broken = vec![false; plines.len()];
        let mut lncs: Vec<Vec<Pos>> = plines
            .iter()
            .enumerate()
            .map(|(li, l)| (0..l.chars.len()).map(|i| (li, i)).collect())
            .collect();
        let mut blns: Vec<TLine> = Vec::new();
        let mut y = 0.;
        let mut i = 0;
        while i < lncs.len() {
            if let Some(&(pl, _)) = lncs[i].first() {
                let pline = &plines[pl];
                let mut lht = pline.effabsp + pline.effbbsp;
                let mut attempt = 0;
                let (splitcs, xlims, maxabsp, maxbbsp) = loop {
                    attempt += 1;
                    let xlims = region.xlims(y, lht);
                    let breaks =
                        self.find_breaks(&lncs[i], &xlims, &ext, &plines, &mut broken, isflowroot);
                    let mut splitcs = Vec::with_capacity(breaks.len() + 1);
                    let mut prev = -1;
                    for &b in &breaks {
                        splitcs.push(slice(&lncs[i], prev, b));
                        prev = b;
                    }
                    splitcs.push(slice(&lncs[i], prev, isize::MAX - 1));
                    let allcs = splitcs.iter().flatten();
                    let (maxabsp, maxbbsp) = allcs.fold(None, |m: Option<(f64, f64)>, &(l, k)| {
                        let lhs = plines[l].chars[k].lhs;
                        Some(m.map_or(lhs, |m| (m.0.max(lhs.0), m.1.max(lhs.1))))
                    })
                    .unwrap_or((pline.effabsp, pline.effbbsp));
                    // A taller line may have less room.
                    if lht != maxabsp + maxbbsp && attempt < self.settings.flow_iteration_cap {
                        lht = maxabsp + maxbbsp;
                        continue;
                    }
                    break (splitcs, xlims, maxabsp, maxbbsp);
                };
                let mut splitcs = splitcs;
                if splitcs.len() > 1 {
                    if let Some(next) = splitcs.pop() {
                        lncs[i] = splitcs.concat();
                        lncs.insert(i + 1, next);
                    }
                }

                y += maxabsp;
                let first_new = blns.len();
                for (j, chrs) in splitcs.iter().enumerate() {
                    let mut cln = self.flowed_line(pline, broken[pl], maxabsp, maxbbsp);
                    cln.chars = chrs.iter().map(|&(l, k)| plines[l].chars[k].clone()).collect();
                    if let Some(&(xl, w)) = xlims.get(j).filter(|_| !chrs.is_empty()) {
                        let a = cln.anchfrac();
                        let mut x = xl * (1. - a) + (xl + w) * a;
                        if let Some(inl) = region.inline {
                            if let Some(iy) = inl.y.filter(|_| i == 0) {
                                y += iy - cln.effabsp;
                            }
                            if let Some(ix) = inl.x {
                                x += ix;
                            }
                        }
                        cln.xv = vec![Some(x)];
                        cln.yv = vec![Some(region.bbx.y0 + y)];
                    }
                    blns.push(cln);
                }
                y += maxbbsp;

                if region.inline.is_none() && y - 0.1 * (maxabsp + maxbbsp) > region.bbx.height() {
                    // Past the end of the region: everything left is hidden.
                    let xv = blns
                        .get(first_new)
                        .map_or_else(|| vec![Some(0.)], |l| l.xv.clone());
                    let mut rest: Vec<TChar> =
                        blns.drain(first_new..).flat_map(|l| l.chars).collect();
                    rest.extend(
                        lncs[i + 1..]
                            .iter()
                            .flatten()
                            .map(|&(l, k)| plines[l].chars[k].clone()),
                    );
                    let mut cln = self.flowed_line(pline, broken[pl], maxabsp, maxbbsp);
                    cln.xv = xv;
                    cln.yv = vec![Some(f64::NAN)];
                    cln.chars = rest;
                    blns.push(cln);
                    break;
                }
            }
            i += 1;
            if i > self.settings.flow_iteration_cap {
                log::warn!(
                    "flowed text {elem:?} did not converge after {i} lines, keeping the lines \
                     laid out so far"
                );
                break;
            }
        }

        // Whether a paragraph follows the last laid out character.
        self.fparaafter = false;
        if let Some(lchr) = blns.iter().rev().find_map(|l| l.chars.last()) {
            let dds = doc.descendants(elem);
            if let Some(j) = dds.iter().position(|&d| d == lchr.loc.elem) {
                self.fparaafter = dds[j + 1..].iter().any(|&d| doc.tag(d) == "flowPara");
            }
        }
        self.lns = blns;
        Ok(())
    }

    fn flowed_line(&self, pline: &TLine, broken: bool, absp: f64, bbsp: f64) -> TLine {
        let mut cln = TLine::new(
            vec![Some(0.)],
            vec![Some(0.)],
            self.textel,
            self.textel,
            pline.anchor,
            pline.transform,
            Arc::clone(&pline.style),
        );
        cln.broken = broken;
        cln.effabsp = absp;
        cln.effbbsp = bbsp;
        cln
    }

    /// Finds the region of flowed text, or `None` if it has none that can be laid out.
    fn flow_region(&mut self, doc: &mut Document, sty: &Style) -> Result<Option<Region>, Error> {
        let elem = self.textel;
        let padding = sty.get("shape-padding").and_then(ipx).unwrap_or(0.);
        let mut inline = None;
        let (path, isrect) = if doc.tag(elem) == "flowRoot" {
            let shape = doc
                .descendants(elem)
                .into_iter()
                .filter(|&d| doc.tag(d) == "flowRegion")
                .flat_map(|r| doc.descendants(r))
                .find_map(|d| Some((d, shape_path(doc, d)?)));
            let Some((shape, path)) = shape else {
                return Ok(None);
            };
            (path, is_rectangle(doc, shape, false))
        } else if let Some(shape) = doc.get_link(elem, "shape-inside") {
            // The shape's own transform applies, its ancestors' do not.
            let Some(path) = shape_path(doc, shape) else {
                return Ok(None);
            };
            let path = doc.transform(shape) * path;
            let isrect = path_is_rectangle(&path);
            (path, isrect)
        } else {
            let Some(isz) = sty.get("inline-size").and_then(ipx).filter(|&v| v != 0.) else {
                return Ok(None);
            };
            let ysrc = self.parse_lines(doc, true)?.map_or(elem, |(_, ysrc)| ysrc);
            let y = match get_xy(doc, elem, "y")[0] {
                Some(y) => Some(y),
                None => get_xy(doc, ysrc, "y")[0],
            };
            inline = Some(InlineSize {
                x: get_xy(doc, elem, "x")[0],
                y,
            });
            let afr = style_anchor(sty).fraction();
            let x0 = -isz * afr;
            (Rect::new(x0, 0., x0 + isz, isz).to_path(0.1), true)
        };

        if !isrect && padding != 0. {
            return Ok(None);
        }
        let mut bbx = path.bounding_box();
        if padding != 0. {
            bbx = bbx.inset(-padding);
        }
        Ok(Some(Region {
            bbx,
            segs: (!isrect).then(|| closed_segments(&path)),
            inline,
        }))
    }

    /// Space above and below the baseline of an element's lines, and its untransformed
    /// font size.
    fn height_above_below_baseline(&self, doc: &Document, el: NodeId) -> (f64, f64, f64) {
        let lht = composed_line_height(doc, el);
        let fs = composed_font_size(doc, el);
        let nominal = FontKey::from_style(&doc.specified_style(el));
        let flowy = self.ctable.flowy(self.ctable.true_style(&nominal));
        let rawfs = fs.transformed / fs.scale;
        let half = 0.5 * (lht / fs.transformed - 1.);
        ((half + flowy) * rawfs, (half + 1. - flowy) * rawfs, rawfs)
    }

    /// Groups the characters into one line per paragraph.
    fn paragraph_lines(
        &mut self,
        doc: &Document,
        sty: &Style,
        isflowroot: bool,
    ) -> Result<Vec<TLine>, Error> {
        let elem = self.textel;
        let (rabsp, rbbsp, rfs) = self.height_above_below_baseline(doc, elem);
        let rpct = sty
            .get("line-height")
            .and_then(|v| v.trim().strip_suffix('%'))
            .and_then(|v| v.trim().parse::<f64>().ok());
        let fparas: Vec<NodeId> = doc
            .element_children(elem)
            .into_iter()
            .filter(|&k| doc.tag(k) == "flowPara")
            .collect();
        let tree = self.take_tree(doc);
        let blocks = tree.blocks(doc, None);
        self.tree = Some(tree);

        let mut lns: Vec<TLine> = Vec::new();
        let mut last_lnno = None;
        for block in blocks {
            let Some(txt) = block.text.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            let (kind, tel, sel) = (block.kind, block.src, block.sel);
            let lnno = if isflowroot {
                let mut n = fparas
                    .iter()
                    .position(|&p| doc.is_ancestor_or_self(p, tel))
                    .unwrap_or(0);
                // The tail of a paragraph starts the next one.
                if kind == BlockKind::Tail && fparas.get(n) == Some(&tel) {
                    n += 1;
                }
                n
            } else {
                0
            };

            let lsty = doc.specified_style(sel);
            let fs = composed_font_size(doc, sel);
            let (absp, bbsp, mrfs) = self.height_above_below_baseline(doc, sel);
            let fsty = FontKey::from_style(&lsty);
            let tsty = self.ctable.true_style(&fsty).cloned();
            let flowy = self.ctable.flowy(tsty.as_ref());
            let mut fabsp = rabsp.max(absp);
            let mut fbbsp = rbbsp.max(bbsp);
            if let Some(pct) = rpct {
                // A percentage line height on the root that no paragraph overrides is
                // applied to the root's font size.
                let mut anc = Some(sel);
                let mut overridden = false;
                while let Some(a) = anc.filter(|&a| a != elem) {
                    overridden |= doc.cascaded_style(a).contains("line-height");
                    anc = doc.parent(a);
                }
                if !overridden {
                    if rbbsp > bbsp {
                        fbbsp += (flowy - 0.5) * (rfs - mrfs);
                    }
                    if absp > rabsp {
                        fabsp -= 0.5 * (pct / 100.) * (mrfs - rfs);
                        fbbsp -= (0.5 * (pct / 100.) - (flowy - 0.5)) * (mrfs - rfs);
                    }
                }
            }

            if last_lnno != Some(lnno) {
                let anchor = style_anchor(&lsty);
                let anchor = match lsty.text_align() {
                    Some(align) if align != TextAlign::Start && anchor == TextAnchor::Start => {
                        align.to_anchor()
                    }
                    _ => anchor,
                };
                let mut line = TLine::new(
                    vec![Some(0.)],
                    vec![Some(0.)],
                    elem,
                    elem,
                    anchor,
                    doc.composed_transform(sel),
                    Arc::clone(&lsty),
                );
                line.effabsp = fabsp;
                line.effbbsp = fbbsp;
                lns.push(line);
                last_lnno = Some(lnno);
            }

            let chars: Vec<char> = txt.chars().collect();
            let n = chars.len();
            let (dxv, dyv) = match kind {
                BlockKind::Text => (
                    padded(&get_xy(doc, tel, "dx"), n),
                    padded(&get_xy(doc, tel, "dy"), n),
                ),
                BlockKind::Tail => (vec![0.; n], vec![0.; n]),
            };
            let lsp = letter_spacing(&lsty, self.settings.default_font_size);
            let bshft = baseline_shift(doc, &lsty, sel);
            for (j, &c) in chars.iter().enumerate() {
                let csty = self.font_picker(&chars, j, &fsty, tsty.as_ref());
                let prop = self.ctable.get_prop(c, csty.as_ref())?.clone();
                let mut tc = TChar::new(
                    self.new_char_id(),
                    c,
                    fs,
                    prop,
                    Arc::clone(&lsty),
                    fsty.clone(),
                    csty,
                    CLoc::new(tel, kind, j, sel),
                    dxv[j],
                    dyv[j],
                );
                tc.lhs = (fabsp, fbbsp);
                tc.lsp = lsp;
                tc.bshft = bshft;
                if let Some(line) = lns.last_mut() {
                    line.chars.push(tc);
                }
            }
        }
        Ok(lns)
    }

    /// Break points of a run of characters, one per interval of the line.
    ///
    /// A break point is the index of the last character before the break; `-1` defers
    /// the whole run to the next line.
    fn find_breaks(
        &self,
        cs: &[Pos],
        xlims: &[(f64, f64)],
        ext: &[Vec<(f64, f64)>],
        plines: &[TLine],
        broken: &mut [bool],
        isflowroot: bool,
    ) -> Vec<isize> {
        if xlims.is_empty() {
            return vec![-1];
        }
        let chr = |(l, k): Pos| &plines[l].chars[k];
        let mut breaks: Vec<isize> = Vec::new();
        for &(_, width) in xlims {
            let strt = breaks
                .last()
                .map_or(0, |&b| usize::try_from(b + 1).unwrap_or(0));
            let csleft = cs.get(strt..).unwrap_or_default();
            let Some(&(fl, fi)) = csleft.first() else {
                break;
            };
            let run_left = ext[fl][fi].0;
            let mut found = None;
            for (j, &p) in csleft.iter().enumerate() {
                let c = chr(p);
                if isflowroot && c.c == '\n' {
                    found = Some((j as isize, true));
                    break;
                }
                if ext[p.0][p.1].1 - run_left > width {
                    let lastbrk = csleft[..j]
                        .iter()
                        .rposition(|&q| self.settings.break_chars.contains(chr(q).c));
                    let lht = plines[p.0].effabsp + plines[p.0].effbbsp;
                    let b = if c.c == ' ' {
                        j as isize
                    } else if let Some(k) = lastbrk {
                        k as isize
                    } else if width > self.settings.emergency_break_factor * lht && j > 0 {
                        // Wide regions break inside words.
                        j as isize - 1
                    } else {
                        -1
                    };
                    found = Some((b, false));
                    break;
                }
            }
            let Some((b, hard)) = found else {
                break;
            };
            broken[fl] = true;
            breaks.push(b + strt as isize);
            if hard {
                break;
            }
        }
        breaks
    }
}
