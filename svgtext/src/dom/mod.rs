// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A mutable SVG document.
//!
//! [`Document`] is an arena of nodes addressed by [`NodeId`]. Element text is stored the
//! way SVG editors see it: an element's `text` is the character data before its first
//! child, and its `tail` is the character data after its end tag, up to the next sibling.
//! Attribute names are qualified with the conventional prefixes (`sodipodi:role`,
//! `xlink:href`, `xml:space`) regardless of the prefixes the source file declared.
//!
//! Cascaded styles, specified styles and composed transforms are cached per node and
//! invalidated by every mutation that can change them.

mod parse;
mod shape;
mod style;
mod transform;
mod units;
mod write;

use std::cell::OnceCell;
use std::sync::Arc;

use hashbrown::HashMap;
use kurbo::Affine;

use crate::Error;

pub(crate) use shape::path_is_rectangle;
pub use shape::{is_rectangle, shape_path};
pub use style::{initial_value, Property, PropertyValue, Style, PRESENTATION_ATTRIBUTES};
pub use transform::{format_transform, parse_transform};
pub use units::{composed_font_size, composed_line_height, ipx, FontSize};

/// The SVG namespace.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// The Sodipodi namespace, used by Inkscape for `sodipodi:role`.
pub const SODIPODI_NS: &str = "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd";
/// The Inkscape namespace.
pub const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";
/// The XLink namespace.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
/// The XML namespace.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespaces whose prefix is fixed, whatever the source document declared.
pub(crate) const KNOWN_NAMESPACES: [(&str, &str); 4] = [
    ("sodipodi", SODIPODI_NS),
    ("inkscape", INKSCAPE_NS),
    ("xlink", XLINK_NS),
    ("xml", XML_NS),
];

/// Identifies a node of a [`Document`].
///
/// Ids are never reused: a deleted node keeps its id, and using it afterwards is reported
/// as [`Error::UnknownNode`] by the operations that validate their input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of a document node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An element.
    Element,
    /// A comment. Its content is the node's text.
    Comment,
    /// A processing instruction. Its target is the node's tag and its content the text.
    ProcessingInstruction,
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    name: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    tail: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    alive: bool,
    cascaded: OnceCell<Arc<Style>>,
    specified: OnceCell<Arc<Style>>,
    composed: OnceCell<Affine>,
}

impl Node {
    fn new(kind: NodeKind, name: String) -> Self {
        Self {
            kind,
            name,
            attrs: Vec::new(),
            text: None,
            tail: None,
            parent: None,
            children: Vec::new(),
            alive: true,
            cascaded: OnceCell::new(),
            specified: OnceCell::new(),
            composed: OnceCell::new(),
        }
    }
}

/// An SVG document.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    prolog: Vec<NodeId>,
    ids: HashMap<String, NodeId>,
    sheet: OnceCell<Vec<(String, Style)>>,
    generation: u64,
}

impl Document {
    /// Parses a document from SVG source.
    pub fn parse(src: &str) -> Result<Self, Error> {
        parse::parse(src)
    }

    /// Serializes the document.
    pub fn write(&self) -> Result<String, Error> {
        write::write(self)
    }

    fn with_root(name: &str) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            prolog: Vec::new(),
            ids: HashMap::new(),
            sheet: OnceCell::new(),
            generation: 0,
        };
        doc.root = doc.push_node(NodeKind::Element, name);
        doc
    }

    fn push_node(&mut self, kind: NodeKind, name: &str) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(kind, name.to_owned()));
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// The root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns `true` if `id` is a live node of this document.
    ///
    /// Nodes created with [`Document::create_element`] are live before they are attached.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(|n| n.alive)
    }

    /// Returns an error unless `id` is a live node of this document.
    pub fn check(&self, id: NodeId) -> Result<(), Error> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(Error::UnknownNode(id))
        }
    }

    /// A counter bumped by every change to the tree structure.
    ///
    /// Views that only depend on which nodes exist and where (and not on attributes or
    /// text) can compare it to find out whether they are stale.
    pub fn structure_generation(&self) -> u64 {
        self.generation
    }

    /// The kind of node `id` is.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// Returns `true` if `id` is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).kind == NodeKind::Element
    }

    /// The qualified tag name of an element, such as `text` or `sodipodi:namedview`.
    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    /// Renames an element.
    pub fn set_tag(&mut self, id: NodeId, name: &str) {
        name.clone_into(&mut self.node_mut(id).name);
        self.invalidate_subtree(id);
    }

    // Attributes

    /// Gets an attribute value.
    pub fn get(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attrs
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v.as_str()))
    }

    /// Sets an attribute, keeping its position if it already exists.
    pub fn set(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if name == "id" {
            if let Some(old) = self.get(id, "id").map(str::to_owned) {
                self.forget_id(&old, id);
            }
            self.ids.insert(value.clone(), id);
        }
        let attrs = &mut self.node_mut(id).attrs;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => attrs.push((name.to_owned(), value)),
        }
        self.invalidate_subtree(id);
    }

    /// Removes an attribute, returning its old value.
    pub fn remove(&mut self, id: NodeId, name: &str) -> Option<String> {
        let attrs = &mut self.node_mut(id).attrs;
        let pos = attrs.iter().position(|(k, _)| k == name)?;
        let (_, old) = attrs.remove(pos);
        if name == "id" {
            self.forget_id(&old, id);
        }
        self.invalidate_subtree(id);
        Some(old)
    }

    /// Sets an attribute, or removes it when `value` is `None`.
    pub fn set_opt(&mut self, id: NodeId, name: &str, value: Option<impl Into<String>>) {
        match value {
            Some(v) => self.set(id, name, v),
            None => {
                self.remove(id, name);
            }
        }
    }

    /// All attributes of an element, in document order.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        &self.node(id).attrs
    }

    fn forget_id(&mut self, value: &str, id: NodeId) {
        if self.ids.get(value) == Some(&id) {
            self.ids.remove(value);
        }
    }

    // Text

    /// The character data before the first child.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).text.as_deref()
    }

    /// Sets the character data before the first child.
    pub fn set_text(&mut self, id: NodeId, text: Option<String>) {
        self.node_mut(id).text = text;
        if self.tag(id) == "style" {
            self.reset_sheet();
        }
    }

    /// The character data after the end tag.
    pub fn tail(&self, id: NodeId) -> Option<&str> {
        self.node(id).tail.as_deref()
    }

    /// Sets the character data after the end tag.
    pub fn set_tail(&mut self, id: NodeId, tail: Option<String>) {
        self.node_mut(id).tail = tail;
    }

    // Structure

    /// The parent of a node. The root and detached nodes have none.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The children of a node, including comments and processing instructions.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// The element children of a node.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|&k| self.is_element(k))
            .collect()
    }

    /// The position of a node among its parent's children.
    pub fn index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&k| k == id)
    }

    /// The next element after `id` among its parent's children.
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let kids = self.children(parent);
        let i = kids.iter().position(|&k| k == id)?;
        kids[i + 1..].iter().copied().find(|&k| self.is_element(k))
    }

    /// The ancestors of `id`, nearest first, not including `id`.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ret = Vec::new();
        let mut cel = self.parent(id);
        while let Some(c) = cel {
            ret.push(c);
            cel = self.parent(c);
        }
        ret
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cel = Some(id);
        while let Some(c) = cel {
            if c == ancestor {
                return true;
            }
            cel = self.parent(c);
        }
        false
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push_node(NodeKind::Element, name)
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&k| k != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Inserts `child` as the `index`th child of `parent`, moving it if it is attached
    /// elsewhere. Its tail moves with it.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let kids = &mut self.node_mut(parent).children;
        let index = index.min(kids.len());
        kids.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        self.structure_changed(child);
    }

    /// Appends `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let n = self.children(parent).len();
        self.insert(parent, n, child);
    }

    /// Inserts `new` directly after `sibling`.
    pub fn add_next(&mut self, sibling: NodeId, new: NodeId) {
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        self.detach(new);
        let index = self.index(sibling).map_or(0, |i| i + 1);
        self.insert(parent, index, new);
    }

    /// Removes a node and its subtree from the document. The node's tail is removed too.
    pub fn delete(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);
        for d in self.subtree(id) {
            if let Some(v) = self.get(d, "id").map(str::to_owned) {
                self.forget_id(&v, d);
            }
            let node = self.node_mut(d);
            node.alive = false;
        }
        self.generation += 1;
        self.reset_sheet();
    }

    /// Deep-copies an element and inserts the copy right after it.
    ///
    /// The tail stays with the original. Every `id` in the copy is replaced by a fresh
    /// one.
    pub fn duplicate(&mut self, id: NodeId) -> NodeId {
        let copy = self.copy_subtree(id, None);
        self.node_mut(copy).tail = None;
        for d in self.subtree(copy) {
            if let Some(old) = self.get(d, "id").map(str::to_owned) {
                let new = self.unique_id(&old);
                self.set(d, "id", new);
            }
        }
        if self.parent(id).is_some() {
            self.add_next(id, copy);
        }
        copy
    }

    fn copy_subtree(&mut self, id: NodeId, parent: Option<NodeId>) -> NodeId {
        let src = self.node(id);
        let mut node = Node::new(src.kind, src.name.clone());
        node.attrs = src.attrs.clone();
        node.text = src.text.clone();
        node.tail = src.tail.clone();
        node.parent = parent;
        let kids = src.children.clone();
        let new = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        for k in kids {
            let kc = self.copy_subtree(k, Some(new));
            self.node_mut(new).children.push(kc);
        }
        new
    }

    /// `id` and all nodes below it, in document order, including comments.
    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut ret = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            ret.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        ret
    }

    /// `id` and all elements below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.subtree(id)
            .into_iter()
            .filter(|&d| self.is_element(d))
            .collect()
    }

    /// The element descendants of `id` (including `id`), and for each position the
    /// elements whose tails come right before it.
    ///
    /// The second list has one more entry than the first: `tails[i]` lists, innermost
    /// first, the elements whose tail text precedes the text of `descendants[i]`, and the
    /// last entry holds the tails that end the subtree (the last of which is `id` itself).
    pub fn descendants_with_tails(&self, id: NodeId) -> (Vec<NodeId>, Vec<Vec<NodeId>>) {
        let mut descendants = vec![id];
        let mut tails: Vec<Vec<NodeId>> = vec![Vec::new()];
        let mut ends_at: Vec<(NodeId, Option<NodeId>)> = vec![(id, None)];
        for d in self.descendants(id).into_iter().skip(1) {
            let mut before = Vec::new();
            while let Some(&(e, end)) = ends_at.last() {
                if end != Some(d) {
                    break;
                }
                before.push(e);
                ends_at.pop();
            }
            tails.push(before);
            let end = match self.next_element_sibling(d) {
                Some(next) => Some(next),
                None => ends_at.last().and_then(|&(_, end)| end),
            };
            ends_at.push((d, end));
            descendants.push(d);
        }
        tails.push(ends_at.into_iter().rev().map(|(e, _)| e).collect());
        (descendants, tails)
    }

    // Ids

    /// Looks up an element by its `id` attribute.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied().filter(|&n| self.contains(n))
    }

    /// Returns the element's id, assigning a fresh one if it has none.
    pub fn ensure_id(&mut self, id: NodeId) -> String {
        if let Some(v) = self.get(id, "id") {
            return v.to_owned();
        }
        let base = self.tag(id).rsplit(':').next().unwrap_or("node").to_owned();
        let new = self.unique_id(&base);
        self.set(id, "id", new.clone());
        new
    }

    fn unique_id(&self, base: &str) -> String {
        let base = base.trim_end_matches(|c: char| c.is_ascii_digit() || c == '-');
        let base = if base.is_empty() { "id" } else { base };
        let mut n = self.nodes.len();
        loop {
            let candidate = format!("{base}{n}");
            if !self.ids.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Resolves a reference such as `url(#clip1)` or `#path2` to an element.
    pub fn resolve_link(&self, value: &str) -> Option<NodeId> {
        let value = value.trim();
        let inner = value
            .strip_prefix("url(")
            .and_then(|v| v.strip_suffix(')'))
            .map_or(value, |v| v.trim().trim_matches(|c| c == '"' || c == '\''));
        self.element_by_id(inner.strip_prefix('#')?)
    }

    /// Resolves a reference held in an attribute or in the cascaded style.
    ///
    /// `href` falls back to `xlink:href`.
    pub fn get_link(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let value = match self.get(id, name) {
            Some(v) => Some(v.to_owned()),
            None if name == "href" => self.get(id, "xlink:href").map(str::to_owned),
            None => self.cascaded_style(id).get(name).map(str::to_owned),
        }?;
        self.resolve_link(&value)
    }

    // Styles

    /// The `style` attribute alone.
    pub fn style_attr(&self, id: NodeId) -> Style {
        self.get(id, "style").map(Style::parse).unwrap_or_default()
    }

    /// Replaces the `style` attribute. An empty style removes it.
    pub fn set_style(&mut self, id: NodeId, style: &Style) {
        if style.is_empty() {
            self.remove(id, "style");
        } else {
            self.set(id, "style", style.to_string());
        }
    }

    /// The element's own style: presentation attributes, overridden by style sheet rules
    /// for its id, overridden by its `style` attribute.
    pub fn cascaded_style(&self, id: NodeId) -> Arc<Style> {
        self.node(id)
            .cascaded
            .get_or_init(|| Arc::new(style::cascade(self, id)))
            .clone()
    }

    /// The cascaded style merged over the parent's specified style.
    pub fn specified_style(&self, id: NodeId) -> Arc<Style> {
        self.node(id)
            .specified
            .get_or_init(|| {
                let own = self.cascaded_style(id);
                match self.parent(id) {
                    Some(parent) => {
                        let mut sty = Style::clone(&self.specified_style(parent));
                        sty.update(&own);
                        Arc::new(sty)
                    }
                    None => own,
                }
            })
            .clone()
    }

    pub(crate) fn sheet(&self) -> &[(String, Style)] {
        self.sheet.get_or_init(|| style::parse_sheets(self))
    }

    fn reset_sheet(&mut self) {
        if self.sheet.get().is_some() {
            self.sheet = OnceCell::new();
            for node in &mut self.nodes {
                node.cascaded = OnceCell::new();
                node.specified = OnceCell::new();
            }
        }
    }

    // Transforms

    /// The element's own `transform`.
    pub fn transform(&self, id: NodeId) -> Affine {
        self.get(id, "transform")
            .map(parse_transform)
            .unwrap_or(Affine::IDENTITY)
    }

    /// Sets the element's own `transform`; the identity removes the attribute.
    pub fn set_transform(&mut self, id: NodeId, xform: Affine) {
        match format_transform(xform) {
            Some(v) => self.set(id, "transform", v),
            None => {
                self.remove(id, "transform");
            }
        }
    }

    /// The product of the transforms of the element and all its ancestors.
    pub fn composed_transform(&self, id: NodeId) -> Affine {
        *self.node(id).composed.get_or_init(|| {
            let own = self.transform(id);
            match self.parent(id) {
                Some(parent) => self.composed_transform(parent) * own,
                None => own,
            }
        })
    }

    // Invalidation

    fn invalidate_subtree(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.cascaded = OnceCell::new();
        for d in self.subtree(id) {
            let node = self.node_mut(d);
            node.specified = OnceCell::new();
            node.composed = OnceCell::new();
        }
    }

    fn structure_changed(&mut self, id: NodeId) {
        self.generation += 1;
        self.invalidate_subtree(id);
        if self.subtree(id).iter().any(|&d| self.tag(d) == "style") {
            self.reset_sheet();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = concat!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd">"#,
        r#"<text id="t" style="font-size:10px">A<tspan id="s" sodipodi:role="line">B</tspan>C<tspan id="u">D<tspan id="v">E</tspan></tspan>F</text>"#,
        "</svg>"
    );

    #[test]
    fn text_and_tails_follow_lxml() {
        let doc = Document::parse(SRC).unwrap();
        let t = doc.element_by_id("t").unwrap();
        let s = doc.element_by_id("s").unwrap();
        let v = doc.element_by_id("v").unwrap();
        assert_eq!(doc.text(t), Some("A"));
        assert_eq!(doc.text(s), Some("B"));
        assert_eq!(doc.tail(s), Some("C"));
        assert_eq!(doc.text(v), Some("E"));
        assert_eq!(doc.tail(v), None);
        assert_eq!(doc.get(s, "sodipodi:role"), Some("line"));
    }

    #[test]
    fn preceding_tails() {
        let doc = Document::parse(SRC).unwrap();
        let t = doc.element_by_id("t").unwrap();
        let s = doc.element_by_id("s").unwrap();
        let u = doc.element_by_id("u").unwrap();
        let v = doc.element_by_id("v").unwrap();
        let (dds, tails) = doc.descendants_with_tails(t);
        assert_eq!(dds, vec![t, s, u, v]);
        assert_eq!(tails.len(), 5);
        assert!(tails[0].is_empty() && tails[1].is_empty());
        assert_eq!(tails[2], vec![s]);
        assert!(tails[3].is_empty());
        assert_eq!(tails[4], vec![v, u, t]);
    }

    #[test]
    fn duplicate_keeps_tail_on_original() {
        let mut doc = Document::parse(SRC).unwrap();
        let s = doc.element_by_id("s").unwrap();
        let copy = doc.duplicate(s);
        assert_eq!(doc.text(copy), Some("B"));
        assert_eq!(doc.tail(copy), None);
        assert_eq!(doc.tail(s), Some("C"));
        assert_eq!(doc.index(copy), Some(doc.index(s).unwrap() + 1));
        let new_id = doc.get(copy, "id").unwrap().to_owned();
        assert_ne!(new_id, "s");
        assert_eq!(doc.element_by_id(&new_id), Some(copy));
    }

    #[test]
    fn delete_takes_tail_and_ids() {
        let mut doc = Document::parse(SRC).unwrap();
        let u = doc.element_by_id("u").unwrap();
        let t = doc.element_by_id("t").unwrap();
        let before = doc.structure_generation();
        doc.delete(u);
        assert!(!doc.contains(u));
        assert_eq!(doc.element_by_id("v"), None);
        assert_eq!(doc.element_children(t).len(), 1);
        assert!(doc.structure_generation() > before);
        assert_eq!(doc.check(u), Err(Error::UnknownNode(u)));
    }

    #[test]
    fn specified_style_inherits_and_invalidates() {
        let mut doc = Document::parse(SRC).unwrap();
        let t = doc.element_by_id("t").unwrap();
        let v = doc.element_by_id("v").unwrap();
        assert_eq!(doc.specified_style(v).get("font-size"), Some("10px"));
        doc.set(t, "style", "font-size:20px");
        assert_eq!(doc.specified_style(v).get("font-size"), Some("20px"));
        doc.set(v, "font-size", "5");
        assert_eq!(doc.specified_style(v).get("font-size"), Some("5"));
    }

    #[test]
    fn moving_a_node_resets_its_inherited_style() {
        let mut doc = Document::parse(SRC).unwrap();
        let root = doc.root();
        let v = doc.element_by_id("v").unwrap();
        assert_eq!(doc.specified_style(v).get("font-size"), Some("10px"));
        doc.append(root, v);
        assert_eq!(doc.specified_style(v).get("font-size"), None);
        assert_eq!(doc.parent(v), Some(root));
    }

    #[test]
    fn links_resolve() {
        let doc = Document::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
            r##"<rect id="r" width="1" height="1"/><use id="u" xlink:href="#r"/>"##,
            r#"<text id="t" style="shape-inside:url(#r)"/></svg>"#
        ))
        .unwrap();
        let r = doc.element_by_id("r");
        let u = doc.element_by_id("u").unwrap();
        let t = doc.element_by_id("t").unwrap();
        assert_eq!(doc.get_link(u, "href"), r);
        assert_eq!(doc.get_link(t, "shape-inside"), r);
        assert_eq!(doc.resolve_link("url( '#r' )"), r);
        assert_eq!(doc.resolve_link("#missing"), None);
    }

    #[test]
    fn ensure_id_is_unique() {
        let mut doc = Document::parse(SRC).unwrap();
        let t = doc.element_by_id("t").unwrap();
        let fresh = doc.create_element("tspan");
        doc.append(t, fresh);
        let a = doc.ensure_id(fresh);
        assert_eq!(doc.ensure_id(fresh), a);
        assert_eq!(doc.element_by_id(&a), Some(fresh));
        assert_eq!(doc.ensure_id(t), "t");
    }
}
