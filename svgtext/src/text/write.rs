// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Writing positions back to the document.

use hashbrown::HashMap;

use super::model::{CLoc, TLine};
use super::tree::BlockKind;
use super::ParsedText;
use crate::dom::{Document, NodeId};
use crate::util::{char_slice, format_positions, trim_trailing};

/// Sets an `x`, `y`, `dx` or `dy` list. A list without values removes the attribute.
pub(crate) fn xyset(doc: &mut Document, id: NodeId, name: &str, vals: &[Option<f64>]) {
    if vals.iter().all(Option::is_none) {
        doc.remove(id, name);
    } else {
        doc.set(id, name, format_positions(vals));
    }
}

/// The span element that goes inside `id`: `tspan` in SVG text, `flowSpan` in flowed
/// text.
pub(crate) fn span_tag(doc: &Document, id: NodeId) -> &'static str {
    if matches!(doc.tag(id), "text" | "tspan" | "textPath") {
        "tspan"
    } else {
        "flowSpan"
    }
}

/// Moves an element's text, or its tail, into a new span and returns the span.
///
/// The span for a text becomes the element's first child; the span for a tail is
/// inserted right after the element.
pub(crate) fn wrap_string(doc: &mut Document, src: NodeId, kind: BlockKind) -> NodeId {
    let t = doc.create_element(span_tag(doc, src));
    match kind {
        BlockKind::Tail => {
            let tail = doc.tail(src).map(str::to_owned);
            doc.set_tail(src, None);
            doc.set_text(t, tail);
            doc.add_next(src, t);
        }
        BlockKind::Text => {
            let text = doc.text(src).map(str::to_owned);
            doc.set_text(src, None);
            doc.set_text(t, text);
            doc.insert(src, 0, t);
        }
    }
    t
}

impl ParsedText {
    /// Characters grouped by the string they come from, in document order.
    fn chars_by_loc(&self, doc: &Document) -> Vec<((NodeId, BlockKind), Vec<(usize, usize)>)> {
        let mut groups: HashMap<(NodeId, BlockKind), Vec<(usize, usize)>> = HashMap::new();
        for (li, line) in self.lns.iter().enumerate() {
            for (i, c) in line.chars.iter().enumerate() {
                groups
                    .entry((c.loc.elem, c.loc.kind))
                    .or_default()
                    .push((li, i));
            }
        }
        doc.descendants(self.textel)
            .into_iter()
            .flat_map(|d| [(d, BlockKind::Text), (d, BlockKind::Tail)])
            .filter_map(|key| Some((key, groups.remove(&key)?)))
            .collect()
    }

    /// Moves the characters of a wrapped tail to the span that now holds them.
    fn relocate(&mut self, cd: &[(usize, usize)], span: NodeId) {
        for (j, &(li, i)) in cd.iter().enumerate() {
            self.lns[li].chars[i].loc = CLoc::new(span, BlockKind::Text, j, span);
        }
    }

    /// Writes every character's `dx` and `dy` to the document, if any changed.
    ///
    /// A tail that gets deltas is wrapped in a span first, since only elements carry
    /// attributes.
    pub fn write_dxdy(&mut self, doc: &mut Document) {
        if !self.dchange {
            return;
        }
        for ((mut d, kind), cd) in self.chars_by_loc(doc) {
            let dx: Vec<f64> = cd.iter().map(|&(li, i)| self.lns[li].chars[i].dx).collect();
            let dy: Vec<f64> = cd.iter().map(|&(li, i)| self.lns[li].chars[i].dy).collect();
            let dxset = trim_trailing(&dx, &0.);
            let dyset = trim_trailing(&dy, &0.);
            let mut kind = kind;
            if kind == BlockKind::Tail && (dxset.is_some() || dyset.is_some()) {
                d = wrap_string(doc, d, kind);
                self.tree = None;
                kind = BlockKind::Text;
                self.relocate(&cd, d);
            }
            if kind == BlockKind::Text {
                let to_list = |v: Option<Vec<f64>>| -> Vec<Option<f64>> {
                    v.unwrap_or_default().into_iter().map(Some).collect()
                };
                xyset(doc, d, "dx", &to_list(dxset));
                xyset(doc, d, "dy", &to_list(dyset));
            }
        }
        self.invalidate_all();
        let writtendx = self.chrs().any(|c| c.dx != 0.);
        let writtendy = self.chrs().any(|c| c.dy != 0.);
        (self.writtendx, self.writtendy) = (writtendx, writtendy);
        self.dchange = false;
    }

    /// Writes every character's absolute `x` and `y` to the document, if any changed.
    ///
    /// A string whose characters have positions with gaps between them is split into
    /// spans at each character that starts a new run of positions.
    pub fn write_axay(&mut self, doc: &mut Document) {
        if !self.achange {
            return;
        }
        for ((mut d, kind), cd) in self.chars_by_loc(doc) {
            let ax: Vec<Option<f64>> = cd.iter().map(|&(li, i)| self.lns[li].chars[i].ax).collect();
            let ay: Vec<Option<f64>> = cd.iter().map(|&(li, i)| self.lns[li].chars[i].ay).collect();
            let axset = trim_trailing(&ax, &None);
            let mut ayset = trim_trailing(&ay, &None);
            if let Some(ays) = &mut ayset {
                if ays.iter().all(|v| *v == ays[0]) {
                    ays.truncate(1);
                }
            }
            let mut kind = kind;
            if kind == BlockKind::Tail && (axset.is_some() || ayset.is_some()) {
                d = wrap_string(doc, d, kind);
                self.tree = None;
                kind = BlockKind::Text;
                self.relocate(&cd, d);
            }
            if kind != BlockKind::Text {
                continue;
            }
            let axset = axset.unwrap_or_default();
            let ayset = ayset.unwrap_or_default();
            if !axset.contains(&None) && !ayset.contains(&None) {
                xyset(doc, d, "x", &axset);
                xyset(doc, d, "y", &ayset);
                continue;
            }

            // Internal gaps: split at every character that starts a new run.
            let starts = |v: &[Option<f64>]| -> Vec<usize> {
                (1..v.len())
                    .filter(|&i| v[i - 1].is_none() && v[i].is_some())
                    .collect()
            };
            let mut sidx = starts(&axset);
            sidx.extend(starts(&ayset));
            sidx.sort_unstable();
            sidx.dedup();
            let mut bounds = vec![0];
            bounds.extend(sidx);
            bounds.push(cd.len());
            let ranges: Vec<(usize, usize)> = bounds.windows(2).map(|w| (w[0], w[1])).collect();

            let txt = doc.text(d).unwrap_or_default().to_owned();
            doc.set_text(d, None);
            let tag = span_tag(doc, d);
            let part = |v: &[Option<f64>], r1: usize, r2: usize| -> Vec<Option<f64>> {
                let r2 = r2.min(v.len());
                let r1 = r1.min(r2);
                trim_trailing(&v[r1..r2], &None).unwrap_or_default()
            };
            for (k, &(r1, r2)) in ranges.iter().rev().enumerate() {
                let t = if k + 1 < ranges.len() {
                    let t = doc.create_element(tag);
                    doc.insert(d, 0, t);
                    t
                } else {
                    d
                };
                doc.set_text(t, Some(char_slice(&txt, r1, r2)));
                xyset(doc, t, "x", &part(&axset, r1, r2));
                xyset(doc, t, "y", &part(&ayset, r1, r2));
                if t != d {
                    self.relocate(&cd[r1..r2], t);
                }
            }
            self.tree = None;
        }
        self.invalidate_all();
        self.achange = false;
    }

    /// Moves a line by rewriting its `x` and/or `y` list on the elements they come from.
    ///
    /// Lines that share a source element can no longer be positioned by the same
    /// attribute, so they lose their `sodipodi:role="line"` first.
    pub fn write_xy(
        &mut self,
        doc: &mut Document,
        li: usize,
        newx: Option<Vec<Option<f64>>>,
        newy: Option<Vec<Option<f64>>>,
    ) {
        if let Some(newx) = newx {
            self.write_positions(doc, li, newx, true);
        }
        if let Some(newy) = newy {
            self.write_positions(doc, li, newy, false);
        }
        self.invalidate_line(li);
    }

    fn write_positions(
        &mut self,
        doc: &mut Document,
        li: usize,
        mut vals: Vec<Option<f64>>,
        isx: bool,
    ) {
        let source_of = |l: &TLine| if isx { l.xsrc } else { l.ysrc };
        let own = source_of(&self.lns[li]);
        let sibs: Vec<usize> = (0..self.lns.len())
            .filter(|&l| source_of(&self.lns[l]) == own)
            .collect();
        if sibs.len() > 1 {
            for &l in sibs.iter().rev() {
                self.disable_sodipodi(doc, l, false);
            }
        }
        while vals.len() > 1 && vals.last() == Some(&None) {
            vals.pop();
        }
        let oldlen = if isx {
            self.line_x(li).len()
        } else {
            self.line_y(li).len()
        };
        let line = &mut self.lns[li];
        let (name, src) = if isx {
            line.xv.clone_from(&vals);
            ("x", line.xsrc)
        } else {
            line.yv.clone_from(&vals);
            ("y", line.ysrc)
        };
        xyset(doc, src, name, &vals);
        // A single position on a marked line would turn the marker back on.
        if oldlen > 1 && vals.len() == 1 && !self.lns[li].sprlabove.is_empty() {
            self.disable_sodipodi(doc, li, false);
        }
    }

    /// Turns a `sodipodi:role="line"` line into a plain positioned line.
    ///
    /// Only lines below a marker are changed unless `force` is set. The line's position
    /// moves to the element holding its first character.
    pub fn disable_sodipodi(&mut self, doc: &mut Document, li: usize, force: bool) {
        let line = &self.lns[li];
        if line.sprlabove.is_empty() && !force {
            return;
        }
        let Some(first) = line.chars.first() else {
            return;
        };
        let newsrc = match first.loc.kind {
            BlockKind::Text => first.loc.elem,
            BlockKind::Tail => doc.parent(first.loc.elem).unwrap_or(first.loc.elem),
        };
        doc.remove(newsrc, "sodipodi:role");
        let x = self.line_x(li);
        let y = self.line_y(li);
        xyset(doc, newsrc, "x", &x);
        xyset(doc, newsrc, "y", &y);
        let line = &mut self.lns[li];
        line.sprlabove.clear();
        line.sprl = false;
        line.xsrc = newsrc;
        line.ysrc = newsrc;
        line.xv = x;
        line.yv = y;
        line.continuex = false;
        line.continuey = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_moves_strings() {
        let mut doc = Document::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg">"#,
            r#"<text id="t">ab<tspan id="s">cd</tspan>ef</text></svg>"#
        ))
        .unwrap();
        let t = doc.element_by_id("t").unwrap();
        let s = doc.element_by_id("s").unwrap();

        let tail = wrap_string(&mut doc, s, BlockKind::Tail);
        assert_eq!(doc.tag(tail), "tspan");
        assert_eq!(doc.text(tail), Some("ef"));
        assert_eq!(doc.tail(s), None);
        assert_eq!(doc.children(t), [s, tail]);

        let text = wrap_string(&mut doc, t, BlockKind::Text);
        assert_eq!(doc.text(text), Some("ab"));
        assert_eq!(doc.text(t), None);
        assert_eq!(doc.children(t), [text, s, tail]);
    }

    #[test]
    fn empty_lists_remove_attributes() {
        let mut doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text id="t" dx="1">a</text></svg>"#,
        )
        .unwrap();
        let t = doc.element_by_id("t").unwrap();
        xyset(&mut doc, t, "dx", &[None]);
        assert_eq!(doc.get(t, "dx"), None);
        xyset(&mut doc, t, "x", &[Some(1.), None, Some(2.5)]);
        assert_eq!(doc.get(t, "x"), Some("1 none 2.5"));
    }
}
