// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::{Document, NodeId, NodeKind, KNOWN_NAMESPACES, SVG_NS};
use crate::Error;

pub(super) fn parse(src: &str) -> Result<Document, Error> {
    let opts = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let xml = roxmltree::Document::parse_with_options(src, opts)
        .map_err(|e| Error::Xml(e.to_string()))?;
    let root_el = xml.root_element();
    let tag = root_el.tag_name();
    let mut doc = Document::with_root(&qualify(root_el, tag.namespace(), tag.name()));
    for n in xml.root().children() {
        if n == root_el {
            break;
        }
        if let Some(id) = opaque_node(&mut doc, n) {
            doc.prolog.push(id);
        }
    }
    let root = doc.root;
    fill(&mut doc, root, root_el);
    Ok(doc)
}

fn prefix_for<'a>(node: roxmltree::Node<'a, '_>, uri: &str) -> Option<&'a str> {
    KNOWN_NAMESPACES
        .iter()
        .find_map(|&(p, u)| (u == uri).then_some(p))
        .or_else(|| node.lookup_prefix(uri))
}

fn qualify(node: roxmltree::Node<'_, '_>, ns: Option<&str>, local: &str) -> String {
    match ns {
        None | Some(SVG_NS) => local.to_owned(),
        Some(uri) => match prefix_for(node, uri) {
            Some(p) if !p.is_empty() => format!("{p}:{local}"),
            _ => local.to_owned(),
        },
    }
}

fn opaque_node(doc: &mut Document, n: roxmltree::Node<'_, '_>) -> Option<NodeId> {
    if n.is_comment() {
        let id = doc.push_node(NodeKind::Comment, "");
        doc.node_mut(id).text = n.text().map(str::to_owned);
        Some(id)
    } else if let Some(pi) = n.pi() {
        let id = doc.push_node(NodeKind::ProcessingInstruction, pi.target);
        doc.node_mut(id).text = pi.value.map(str::to_owned);
        Some(id)
    } else {
        None
    }
}

fn push_text(slot: &mut Option<String>, s: &str) {
    slot.get_or_insert_with(String::new).push_str(s);
}

fn fill(doc: &mut Document, id: NodeId, el: roxmltree::Node<'_, '_>) {
    let parent_ns: Vec<(Option<&str>, &str)> = el
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    for ns in el.namespaces() {
        if ns.name() == Some("xml") || parent_ns.contains(&(ns.name(), ns.uri())) {
            continue;
        }
        let name = match ns.name() {
            Some(p) => format!("xmlns:{p}"),
            None => "xmlns".to_owned(),
        };
        doc.node_mut(id).attrs.push((name, ns.uri().to_owned()));
    }
    for a in el.attributes() {
        let name = qualify(el, a.namespace(), a.name());
        if name == "id" {
            doc.ids.insert(a.value().to_owned(), id);
        }
        doc.node_mut(id).attrs.push((name, a.value().to_owned()));
    }

    let mut last: Option<NodeId> = None;
    for n in el.children() {
        if n.is_text() {
            let s = n.text().unwrap_or_default();
            match last {
                Some(prev) => push_text(&mut doc.node_mut(prev).tail, s),
                None => push_text(&mut doc.node_mut(id).text, s),
            }
            continue;
        }
        let kid = if n.is_element() {
            let name = qualify(n, n.tag_name().namespace(), n.tag_name().name());
            let kid = doc.push_node(NodeKind::Element, &name);
            doc.node_mut(kid).parent = Some(id);
            doc.node_mut(id).children.push(kid);
            fill(doc, kid, n);
            kid
        } else {
            let Some(kid) = opaque_node(doc, n) else {
                continue;
            };
            doc.node_mut(kid).parent = Some(id);
            doc.node_mut(id).children.push(kid);
            kid
        };
        last = Some(kid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_canonical() {
        let doc = Document::parse(concat!(
            r#"<?xml version="1.0"?><!-- made by hand -->"#,
            r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg" xmlns:sp="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd" xmlns:foo="urn:foo">"#,
            r#"<svg:text xml:space="preserve"><svg:tspan sp:role="line" foo:bar="1">x</svg:tspan></svg:text></svg:svg>"#
        ))
        .unwrap();
        let root = doc.root();
        assert_eq!(doc.tag(root), "svg");
        assert_eq!(doc.prolog.len(), 1);
        let text = doc.element_children(root)[0];
        assert_eq!(doc.tag(text), "text");
        assert_eq!(doc.get(text, "xml:space"), Some("preserve"));
        let tspan = doc.element_children(text)[0];
        assert_eq!(doc.get(tspan, "sodipodi:role"), Some("line"));
        assert_eq!(doc.get(tspan, "foo:bar"), Some("1"));
        assert_eq!(doc.get(root, "xmlns:foo"), Some("urn:foo"));
        assert_eq!(doc.get(text, "xmlns:foo"), None);
    }

    #[test]
    fn comments_own_tails() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text>a<!--c-->b<tspan/>c&amp;d</text></svg>"#,
        )
        .unwrap();
        let text = doc.element_children(doc.root())[0];
        assert_eq!(doc.text(text), Some("a"));
        let kids = doc.children(text).to_vec();
        assert_eq!(doc.kind(kids[0]), NodeKind::Comment);
        assert_eq!(doc.tail(kids[0]), Some("b"));
        assert_eq!(doc.tail(kids[1]), Some("c&d"));
    }

    #[test]
    fn bad_xml_is_an_error() {
        assert!(matches!(Document::parse("<svg><text></svg>"), Err(Error::Xml(_))));
    }
}
