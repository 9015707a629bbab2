//! HTML parsing (via `scraper`) and deterministic serialization.

use scraper::Html;

use crate::document::Document;
use crate::node::{NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Parse a full HTML document. The result is still `Loading`; call
/// [`Document::finish_loading`] once the page should be considered parsed.
pub fn parse_html(source: &str) -> Document {
    let html = Html::parse_document(source);
    let mut doc = Document::new();

    let mut stack = vec![(html.tree.root(), doc.root())];
    while let Some((source_node, parent)) = stack.pop() {
        for child in source_node.children() {
            let created = match child.value() {
                scraper::Node::Element(el) => {
                    let id = doc.create_element(el.name());
                    for (name, value) in el.attrs() {
                        // Freshly created element; attribute writes cannot fail.
                        let _ = doc.set_attr(id, name, value);
                    }
                    stack.push((child, id));
                    id
                }
                scraper::Node::Text(text) => doc.create_text(&text.text),
                scraper::Node::Comment(comment) => doc.create_comment(&comment.comment),
                _ => continue,
            };
            // Parents come from this loop and are always elements or the root.
            let _ = doc.append_child(parent, created);
        }
    }

    doc.take_mutations();
    doc
}

/// Serialize the document back to HTML.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::from("<!DOCTYPE html>");
    for child in doc.children(doc.root()) {
        write_node(doc, *child, false, &mut out);
    }
    out
}

/// Serialize one element and its subtree.
pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, false, &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, raw_text: bool, out: &mut String) {
    match doc.kind(id) {
        Some(NodeKind::Element(el)) => {
            out.push('<');
            out.push_str(el.tag());
            for (name, value) in el.attrs() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape(value, true));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&el.tag()) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&el.tag());
            for child in doc.children(id) {
                write_node(doc, *child, raw, out);
            }
            out.push_str("</");
            out.push_str(el.tag());
            out.push('>');
        }
        Some(NodeKind::Text(text)) if raw_text => out.push_str(text),
        Some(NodeKind::Text(text)) => out.push_str(&escape(text, false)),
        Some(NodeKind::Comment(text)) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Some(NodeKind::Document) | None => {}
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}
