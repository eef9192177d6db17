// ABOUTME: Parses HTML with dom_query/html5ever into the owned element tree.
// ABOUTME: Attributes keep their source order; documents and body fragments are both supported.

use dom_query::{Document, NodeData, NodeRef};

use super::{Element, Node};

/// Parses a full HTML document and returns its `<html>` element.
pub fn parse_document(html: &str) -> Element {
    let doc = Document::from(html);
    doc.root()
        .children()
        .iter()
        .filter(|child| child.is_element())
        .find_map(|child| match convert(child) {
            Some(Node::Element(el)) => Some(el),
            _ => None,
        })
        .unwrap_or_else(|| Element::new("html"))
}

/// Parses a fragment as the content of `<body>`, returning
/// `<html><body>...</body></html>`.
pub fn parse_body_fragment(html: &str) -> Element {
    let doc = Document::fragment(html);
    let mut body = Element::new("body");
    collect_fragment(&doc.root(), &mut body.children);
    Element::new("html").with_child(body)
}

/// html5ever hangs fragment content off a synthetic `<html>` element.
fn collect_fragment(node: &NodeRef<'_>, out: &mut Vec<Node>) {
    for child in node.children() {
        if child.is_element() && child.node_name().as_deref() == Some("html") {
            collect_fragment(&child, out);
        } else if let Some(converted) = convert(&child) {
            out.push(converted);
        }
    }
}

fn convert(node: &NodeRef<'_>) -> Option<Node> {
    if node.is_element() {
        let name = node.node_name()?;
        let mut owned = Element::new(name.to_string());
        for attr in node.attrs() {
            owned
                .attrs
                .push((attr.name.local.to_string(), attr.value.to_string()));
        }
        for child in node.children() {
            if let Some(converted) = convert(&child) {
                owned.children.push(converted);
            }
        }
        return Some(Node::Element(owned));
    }
    node.query(|tree_node| match &tree_node.data {
        NodeData::Text { contents } => Some(Node::Text(contents.to_string())),
        NodeData::Comment { contents } => Some(Node::Comment(contents.to_string())),
        _ => None,
    })
    .flatten()
}
