// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Character and chunk positions.

use kurbo::{Affine, Point, Rect};

use super::model::{ChunkGeometry, Quad, TChar, TLine};
use super::ParsedText;

/// Effective `dx` of each character of a run: its own `dx` plus the letter spacing of
/// the character before it. Has one more entry than `chars`, holding the spacing after
/// the last character.
pub(crate) fn dxeff(chars: &[&TChar]) -> Vec<f64> {
    let n = chars.len();
    (0..=n)
        .map(|i| {
            let dx = if i < n { chars[i].dx } else { 0. };
            let lsp = if i > 0 { chars[i - 1].lsp } else { 0. };
            dx + lsp
        })
        .collect()
}

pub(crate) fn quad(l: f64, r: f64, b: f64, t: f64) -> Quad {
    [
        Point::new(l, b),
        Point::new(l, t),
        Point::new(r, t),
        Point::new(r, b),
    ]
}

pub(crate) fn transform_quad(xform: Affine, q: &Quad) -> Quad {
    q.map(|p| xform * p)
}

pub(crate) fn quad_bbox(q: &Quad) -> Rect {
    let mut r = Rect::from_points(q[0], q[1]);
    r = r.union_pt(q[2]);
    r.union_pt(q[3])
}

/// `x` or `y` of the first character of a run, from a line's position list.
///
/// Runs past the end of the list take its last value. A missing entry takes the
/// nearest value before it.
pub(crate) fn anchor_value(vals: &[Option<f64>], i: usize) -> f64 {
    if vals.is_empty() {
        return 0.;
    }
    let end = i.min(vals.len() - 1);
    vals[..=end].iter().rev().find_map(|v| *v).unwrap_or(0.)
}

/// Inputs of the chunk geometry that do not depend on the chunk's position.
pub(crate) struct Advances {
    pub(crate) cstrt: Vec<f64>,
    pub(crate) cstop: Vec<f64>,
    pub(crate) dxeff0: f64,
}

pub(crate) fn advances(chars: &[&TChar], differential: bool) -> Advances {
    let dxeff = dxeff(chars);
    let mut cstop = Vec::with_capacity(chars.len());
    let mut cstrt = Vec::with_capacity(chars.len());
    let mut acc = 0.;
    for (i, c) in chars.iter().enumerate() {
        // An explicit dx overrides the pair correction.
        let dadv = if differential && i > 0 && dxeff[i] == 0. {
            c.dadv(chars[i - 1].c, c.c)
        } else {
            0.
        };
        acc += c.cwd() + dxeff[i] + dadv;
        cstop.push(acc);
        cstrt.push(acc - c.cwd());
    }
    Advances {
        cstrt,
        cstop,
        dxeff0: dxeff[0],
    }
}

impl ParsedText {
    /// The line's `x` list. A line that continues the previous one starts where the
    /// previous line's last chunk ends, offset by this line's anchor.
    pub fn line_x(&self, li: usize) -> Vec<Option<f64>> {
        let line = &self.lns[li];
        if !line.continuex {
            return line.xv.clone();
        }
        vec![Some(self.continued(li, |p| p.x))]
    }

    /// The line's `y` list, see [`ParsedText::line_x`].
    pub fn line_y(&self, li: usize) -> Vec<Option<f64>> {
        let line = &self.lns[li];
        if !line.continuey {
            return line.yv.clone();
        }
        vec![Some(self.continued(li, |p| p.y))]
    }

    fn continued(&self, li: usize, coord: impl Fn(Point) -> f64) -> f64 {
        let Some(prev) = li.checked_sub(1).map(|p| &self.lns[p]) else {
            return 0.;
        };
        if prev.chks.is_empty() {
            return 0.;
        }
        let a = self.lns[li].anchfrac();
        let pts = self.chunk_pts_ut(li - 1, prev.chks.len() - 1);
        (1. + a) * coord(pts[3]) - a * coord(pts[0])
    }

    /// The `x` anchor of a chunk.
    pub fn chunk_x(&self, li: usize, ci: usize) -> f64 {
        let i = self.lns[li].chks[ci].iis.first().copied().unwrap_or(0);
        anchor_value(&self.line_x(li), i)
    }

    /// The `y` anchor of a chunk.
    pub fn chunk_y(&self, li: usize, ci: usize) -> f64 {
        let i = self.lns[li].chks[ci].iis.first().copied().unwrap_or(0);
        anchor_value(&self.line_y(li), i)
    }

    /// Whether a chunk ends in a space that is not drawn.
    ///
    /// A trailing space of a line of several characters takes no room. In flowed text
    /// that holds only for the last line and for lines that were broken.
    pub fn unrendered_space(&self, li: usize, ci: usize) -> bool {
        let line = &self.lns[li];
        let chk = &line.chks[ci];
        let ends_line = chk.iis.last().copied() == line.chars.len().checked_sub(1);
        match chk.iis.last() {
            Some(&last) => self.space_unrendered(li, chk.iis.len(), ends_line, line.chars[last].c),
            None => false,
        }
    }

    /// [`ParsedText::unrendered_space`] for a run of `len` characters of line `li`
    /// ending in `last`.
    pub(crate) fn space_unrendered(
        &self,
        li: usize,
        len: usize,
        ends_line: bool,
        last: char,
    ) -> bool {
        let lastspc = len > 1 && ends_line && matches!(last, ' ' | '\u{a0}');
        if !self.isflow {
            return lastspc;
        }
        lastspc && ((li + 1 == self.lns.len() && !self.fparaafter) || self.lns[li].broken)
    }

    /// Width of a run of characters that its anchor is measured against: its advance,
    /// without a trailing space that is not drawn.
    pub(crate) fn anchored_width(&self, li: usize, chars: &[&TChar], ends_line: bool) -> f64 {
        let adv = advances(chars, self.settings.differential_advances);
        let w = adv.cstop.last().copied().unwrap_or(0.);
        match chars.last() {
            Some(last) if self.space_unrendered(li, chars.len(), ends_line, last.c) => {
                w - last.cwd()
            }
            _ => w,
        }
    }

    pub(crate) fn geometry(&self, li: usize, ci: usize) -> &ChunkGeometry {
        self.lns[li].chks[ci]
            .geom
            .get_or_init(|| self.compute_geometry(li, ci))
    }

    fn compute_geometry(&self, li: usize, ci: usize) -> ChunkGeometry {
        let line: &TLine = &self.lns[li];
        let chars: Vec<&TChar> = line.chunk_chars(ci).collect();
        let adv = advances(&chars, self.settings.differential_advances);
        let chkw = adv.cstop.last().copied().unwrap_or(0.);
        let lastw = if self.unrendered_space(li, ci) {
            chars.last().map_or(0., |c| c.cwd())
        } else {
            0.
        };
        let offx = -line.anchfrac() * (chkw - lastw);
        let x = self.chunk_x(li, ci);
        let y = self.chunk_y(li, ci);

        let lft: Vec<f64> = adv.cstrt.iter().map(|s| x + s + offx).collect();
        let rgt: Vec<f64> = adv.cstop.iter().map(|s| x + s + offx).collect();
        let mut ady = 0.;
        let mut btm = Vec::with_capacity(chars.len());
        let mut top = Vec::with_capacity(chars.len());
        for c in &chars {
            ady += c.dy;
            let b = y + ady - c.bshft;
            btm.push(b);
            top.push(b - c.caph());
        }

        let lx = lft
            .iter()
            .map(|l| l - adv.dxeff0)
            .fold(f64::INFINITY, f64::min);
        let lx = if lx.is_finite() { lx } else { x };
        let rx = lx + chkw;
        let by = btm.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let ty = top.iter().copied().fold(f64::INFINITY, f64::min);
        let (by, ty) = if chars.is_empty() { (y, y) } else { (by, ty) };
        let pts_ut = quad(lx, rx, by, ty);
        let pts_t = transform_quad(line.transform, &pts_ut);
        ChunkGeometry {
            lft,
            rgt,
            btm,
            top,
            bbox: quad_bbox(&pts_t),
            pts_ut,
            pts_t,
        }
    }

    /// The untransformed box of a chunk: its logical advance wide, from the lowest
    /// baseline to the highest cap height.
    pub fn chunk_pts_ut(&self, li: usize, ci: usize) -> Quad {
        self.geometry(li, ci).pts_ut
    }

    /// [`ParsedText::chunk_pts_ut`] with the line's transform applied.
    pub fn chunk_pts_t(&self, li: usize, ci: usize) -> Quad {
        self.geometry(li, ci).pts_t
    }

    /// The transformed bounding box of a chunk.
    pub fn chunk_bbox(&self, li: usize, ci: usize) -> Rect {
        self.geometry(li, ci).bbox
    }

    /// The untransformed box of a character: its advance wide, from its baseline to its
    /// cap height.
    pub fn char_pts_ut(&self, li: usize, i: usize) -> Quad {
        let c = &self.lns[li].chars[i];
        let g = self.geometry(li, c.chk);
        let w = c.windex;
        quad(g.lft[w], g.rgt[w], g.btm[w], g.top[w])
    }

    /// [`ParsedText::char_pts_ut`] with the line's transform applied.
    pub fn char_pts_t(&self, li: usize, i: usize) -> Quad {
        transform_quad(self.lns[li].transform, &self.char_pts_ut(li, i))
    }

    /// The untransformed ink box of a character.
    pub fn char_pts_ut_ink(&self, li: usize, i: usize) -> Quad {
        let c = &self.lns[li].chars[i];
        let put = self.char_pts_ut(li, i);
        let [ix, iy, iw, ih] = c.prop.inkbb;
        let nwd = iw * c.utfs;
        let nht = ih * c.utfs;
        let x = put[0].x + ix * c.utfs;
        let y = put[0].y + iy * c.utfs + nht;
        quad(x, x + nwd, y, y - nht)
    }

    /// The largest drawn font size of a chunk.
    pub fn chunk_tfs(&self, li: usize, ci: usize) -> Option<f64> {
        max_of(self.lns[li].chunk_chars(ci).map(|c| c.tfs))
    }

    /// The widest space of a chunk's fonts.
    pub fn chunk_spw(&self, li: usize, ci: usize) -> Option<f64> {
        max_of(self.lns[li].chunk_chars(ci).map(TChar::spw))
    }

    /// The largest cap height of a chunk.
    pub fn chunk_mch(&self, li: usize, ci: usize) -> Option<f64> {
        max_of(self.lns[li].chunk_chars(ci).map(TChar::caph))
    }

    /// The text of a chunk.
    pub fn chunk_txt(&self, li: usize, ci: usize) -> String {
        self.lns[li].chunk_chars(ci).map(|c| c.c).collect()
    }
}

fn max_of(it: impl Iterator<Item = f64>) -> Option<f64> {
    it.fold(None, |m, v| Some(m.map_or(v, |m: f64| m.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_values_fall_back() {
        let v = [Some(1.), None, Some(3.)];
        assert_eq!(anchor_value(&v, 0), 1.);
        assert_eq!(anchor_value(&v, 1), 1.);
        assert_eq!(anchor_value(&v, 7), 3.);
        assert_eq!(anchor_value(&[], 2), 0.);
    }
}
