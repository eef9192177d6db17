// ABOUTME: HTML serialization of the owned element tree.
// ABOUTME: Escapes text and attribute values, emits void elements without end tags.

use super::{Element, Node};

/// Serializes a node (including itself) to HTML.
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, false, &mut out);
    out
}

/// Serializes an element including its own tag.
pub fn outer_html(el: &Element) -> String {
    let mut out = String::new();
    write_element(el, &mut out);
    out
}

/// Serializes only the children of an element.
pub fn render_children(el: &Element) -> String {
    let mut out = String::new();
    let raw = is_raw_text(&el.name);
    for child in &el.children {
        write_node(child, raw, &mut out);
    }
    out
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node {
        Node::Text(t) if raw_text => out.push_str(t),
        Node::Text(t) => escape_text(t, out),
        Node::Element(el) => write_element(el, out),
        Node::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c);
            out.push_str("-->");
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    let name = el.name.as_str();
    out.push('<');
    out.push_str(name);
    for (k, v) in &el.attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        escape_attr(v, out);
        out.push('"');
    }
    out.push('>');

    if is_void_element(name) {
        return;
    }

    let raw = is_raw_text(name);
    for child in &el.children {
        write_node(child, raw, out);
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn is_raw_text(tag: &str) -> bool {
    matches!(tag.to_ascii_lowercase().as_str(), "script" | "style")
}

/// True for elements that never have an end tag.
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
