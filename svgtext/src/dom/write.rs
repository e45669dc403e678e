// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{Document, NodeId, NodeKind, KNOWN_NAMESPACES, SVG_NS};
use crate::Error;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn emit(w: &mut XmlWriter, ev: Event<'_>) -> Result<(), Error> {
    w.write_event(ev).map_err(|e| Error::Write(e.to_string()))
}

pub(super) fn write(doc: &Document) -> Result<String, Error> {
    let mut w = Writer::new(Cursor::new(Vec::new()));
    emit(
        &mut w,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    emit(&mut w, Event::Text(BytesText::from_escaped("\n")))?;
    for &id in &doc.prolog {
        write_node(doc, &mut w, id, &[])?;
        emit(&mut w, Event::Text(BytesText::from_escaped("\n")))?;
    }
    let extra = missing_declarations(doc);
    write_node(doc, &mut w, doc.root, &extra)?;
    String::from_utf8(w.into_inner().into_inner()).map_err(|e| Error::Write(e.to_string()))
}

/// Namespace declarations the root needs for the prefixes in use.
fn missing_declarations(doc: &Document) -> Vec<(String, String)> {
    let root = doc.root;
    let mut extra = Vec::new();
    if doc.get(root, "xmlns").is_none() {
        extra.push(("xmlns".to_owned(), SVG_NS.to_owned()));
    }
    for (prefix, uri) in KNOWN_NAMESPACES {
        if prefix == "xml" {
            continue;
        }
        let decl = format!("xmlns:{prefix}");
        if doc.get(root, &decl).is_some() {
            continue;
        }
        let used = doc.descendants(root).into_iter().any(|d| {
            has_prefix(doc.tag(d), prefix)
                || doc.attributes(d).iter().any(|(k, _)| has_prefix(k, prefix))
        });
        if used {
            extra.push((decl, uri.to_owned()));
        }
    }
    extra
}

fn has_prefix(name: &str, prefix: &str) -> bool {
    name.split_once(':').is_some_and(|(p, _)| p == prefix)
}

fn write_node(
    doc: &Document,
    w: &mut XmlWriter,
    id: NodeId,
    extra: &[(String, String)],
) -> Result<(), Error> {
    let node = doc.node(id);
    match node.kind {
        NodeKind::Comment => {
            let body = node.text.as_deref().unwrap_or_default();
            emit(w, Event::Comment(BytesText::from_escaped(body)))?;
        }
        NodeKind::ProcessingInstruction => {
            let body = match node.text.as_deref() {
                Some(v) => format!("{} {v}", node.name),
                None => node.name.clone(),
            };
            emit(w, Event::PI(BytesPI::new(body)))?;
        }
        NodeKind::Element => {
            let mut start = BytesStart::new(node.name.as_str());
            for (k, v) in extra.iter().chain(&node.attrs) {
                start.push_attribute((k.as_str(), v.as_str()));
            }
            if node.text.is_none() && node.children.is_empty() {
                emit(w, Event::Empty(start))?;
            } else {
                emit(w, Event::Start(start))?;
                if let Some(text) = node.text.as_deref() {
                    emit(w, Event::Text(BytesText::new(text)))?;
                }
                for &k in &node.children {
                    write_node(doc, w, k, &[])?;
                }
                emit(w, Event::End(BytesEnd::new(node.name.as_str())))?;
            }
        }
    }
    if let Some(tail) = node.tail.as_deref() {
        emit(w, Event::Text(BytesText::new(tail)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_keeps_text_and_tails() {
        let src = concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><!--note-->"#,
            r#"<text id="t" x="1">a&lt;b<tspan>c</tspan> d<tspan/></text></svg>"#
        );
        let doc = Document::parse(src).unwrap();
        let out = doc.write().unwrap();
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(out.contains(r#"<text id="t" x="1">a&lt;b<tspan>c</tspan> d<tspan/></text>"#));
        assert!(out.contains("<!--note-->"));
        let again = Document::parse(&out).unwrap();
        let t = again.element_by_id("t").unwrap();
        assert_eq!(again.text(t), Some("a<b"));
    }

    #[test]
    fn declares_prefixes_in_use() {
        let mut doc =
            Document::parse(r#"<svg xmlns="http://www.w3.org/2000/svg"><text id="t"/></svg>"#)
                .unwrap();
        let t = doc.element_by_id("t").unwrap();
        doc.set(t, "sodipodi:role", "line");
        let out = doc.write().unwrap();
        assert!(out.contains(r#"xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd""#));
        let again = Document::parse(&out).unwrap();
        let t = again.element_by_id("t").unwrap();
        assert_eq!(again.get(t, "sodipodi:role"), Some("line"));
    }
}
