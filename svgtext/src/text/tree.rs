// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use hashbrown::HashMap;

use crate::dom::{Document, NodeId};

/// Whether a block of characters is an element's text or its tail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// The character data before the element's first child.
    Text,
    /// The character data after the element's end tag. Tails take their style from the
    /// element's parent.
    Tail,
}

/// One text or tail string of a text element, in document order.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Index of the descendant this block belongs to: the element itself for text, and
    /// the descendant the tail precedes for tails.
    pub index: usize,
    /// Text or tail.
    pub kind: BlockKind,
    /// The element holding the string.
    pub src: NodeId,
    /// The element the characters take their style from.
    pub sel: NodeId,
    /// The string, if any.
    pub text: Option<String>,
}

/// A snapshot of the descendants of a text element and the tails between them.
///
/// The snapshot records the structure only. It is stale once the document's structure
/// changes, which [`TextTree::is_current`] reports.
#[derive(Clone, Debug)]
pub struct TextTree {
    dds: Vec<NodeId>,
    ptails: Vec<Vec<NodeId>>,
    parents: HashMap<NodeId, NodeId>,
    generation: u64,
}

impl TextTree {
    /// Takes a snapshot of `elem`.
    pub fn new(doc: &Document, elem: NodeId) -> Self {
        let (dds, ptails) = doc.descendants_with_tails(elem);
        let parents = dds
            .iter()
            .filter_map(|&d| Some((d, doc.parent(d)?)))
            .collect();
        Self {
            dds,
            ptails,
            parents,
            generation: doc.structure_generation(),
        }
    }

    /// Returns `true` if the document's structure has not changed since the snapshot.
    pub fn is_current(&self, doc: &Document) -> bool {
        self.generation == doc.structure_generation()
    }

    /// The element and its element descendants, in document order.
    pub fn descendants(&self) -> &[NodeId] {
        &self.dds
    }

    /// For each descendant, the elements whose tails come right before its text,
    /// innermost first. Has one more entry than [`TextTree::descendants`].
    pub fn preceding_tails(&self) -> &[Vec<NodeId>] {
        &self.ptails
    }

    /// The parent of a descendant when the snapshot was taken.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// The position of a descendant.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.dds.iter().position(|&d| d == id)
    }

    /// The blocks of text in document order.
    ///
    /// With `subel`, only the blocks inside that descendant are returned (its text and
    /// the text and tails of its own descendants, but not its tail). Blocks with no
    /// string are included with `text` set to `None`.
    pub fn blocks(&self, doc: &Document, subel: Option<NodeId>) -> Vec<Block> {
        let (start, stop, subel) = match subel {
            None => (0, self.dds.len(), self.dds[0]),
            Some(s) => {
                let Some(start) = self.position(s) else {
                    return Vec::new();
                };
                let stop = self
                    .ptails
                    .iter()
                    .position(|pt| pt.contains(&s))
                    .unwrap_or(self.dds.len());
                (start, stop, s)
            }
        };
        let mut ret = Vec::new();
        for i in start..=stop {
            if i > start {
                for &src in &self.ptails[i] {
                    if src == subel {
                        return ret;
                    }
                    ret.push(Block {
                        index: i,
                        kind: BlockKind::Tail,
                        src,
                        sel: self.parent(src).unwrap_or(src),
                        text: doc.tail(src).map(str::to_owned),
                    });
                }
            }
            if i < stop {
                let src = self.dds[i];
                ret.push(Block {
                    index: i,
                    kind: BlockKind::Text,
                    src,
                    sel: src,
                    text: doc.text(src).map(str::to_owned),
                });
            }
        }
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(blocks: &[Block]) -> Vec<(BlockKind, String)> {
        blocks
            .iter()
            .filter_map(|b| Some((b.kind, b.text.clone()?)))
            .collect()
    }

    #[test]
    fn blocks_in_document_order() {
        let doc = Document::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg">"#,
            r#"<text id="t">A<tspan id="s">B<tspan id="u">C</tspan>D</tspan>E</text>F</svg>"#
        ))
        .unwrap();
        let t = doc.element_by_id("t").unwrap();
        let s = doc.element_by_id("s").unwrap();
        let u = doc.element_by_id("u").unwrap();
        let tree = TextTree::new(&doc, t);
        let all = tree.blocks(&doc, None);
        let joined: String = texts(&all).into_iter().map(|(_, s)| s).collect();
        assert_eq!(joined, "ABCDE", "the element's own tail is not part of it");
        let tail_d = all.iter().find(|b| b.text.as_deref() == Some("D")).unwrap();
        assert_eq!((tail_d.kind, tail_d.src, tail_d.sel), (BlockKind::Tail, u, s));

        let inner: String = texts(&tree.blocks(&doc, Some(s)))
            .into_iter()
            .map(|(_, s)| s)
            .collect();
        assert_eq!(inner, "BCD");
        assert!(tree.is_current(&doc));
    }
}
