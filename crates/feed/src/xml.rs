// ABOUTME: Lenient quick-xml reader that builds the owned element tree used by the feed drivers.
// ABOUTME: Keeps qualified names, resolves character and predefined entities, and tolerates stray end tags.

use std::borrow::Cow;

use pagesift_core::dom::{Element, Node};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::FeedError;

/// Name of the synthetic element holding the top-level nodes.
pub const DOCUMENT: &str = "#document";

/// Parses `content` as XML into an element tree rooted at [`DOCUMENT`].
///
/// Element names keep their namespace prefix (`content:encoded`,
/// `media:content`); lookups on the tree ignore case. End tags that close
/// an element further up the stack close everything above it, and end tags
/// that match nothing are dropped.
pub fn parse_xml(content: &str) -> Result<Element, FeedError> {
    let mut reader = Reader::from_str(content);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;

    let mut stack = vec![Element::new(DOCUMENT)];
    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(source) => {
                return Err(FeedError::Xml {
                    position: reader.buffer_position(),
                    source,
                })
            }
        };
        match event {
            Event::Start(start) => stack.push(element(&start)),
            Event::Empty(start) => attach(&mut stack, element(&start)),
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                close(&mut stack, &name);
            }
            Event::Text(text) => {
                let decoded = text
                    .decode()
                    .unwrap_or_else(|_| Cow::Owned(String::from_utf8_lossy(&text).into_owned()));
                push_text(&mut stack, &decoded);
            }
            Event::CData(data) => push_text(&mut stack, &String::from_utf8_lossy(&data)),
            Event::GeneralRef(reference) => {
                let name = String::from_utf8_lossy(&reference).into_owned();
                push_text(&mut stack, &resolve_reference(&name));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    while stack.len() > 1 {
        if let Some(open) = stack.pop() {
            attach(&mut stack, open);
        }
    }
    Ok(stack.pop().unwrap_or_else(|| Element::new(DOCUMENT)))
}

fn element(start: &BytesStart<'_>) -> Element {
    let mut el = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value).into_owned();
        let value = match unescape(&raw) {
            Ok(value) => value.into_owned(),
            Err(_) => raw,
        };
        el.attrs.push((key, value));
    }
    el
}

fn attach(stack: &mut [Element], el: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(el));
    }
}

fn close(stack: &mut Vec<Element>, name: &str) {
    let Some(idx) = stack.iter().rposition(|el| el.name == name) else {
        tracing::debug!(name, "dropping unmatched end tag");
        return;
    };
    if idx == 0 {
        return;
    }
    while stack.len() > idx {
        if let Some(open) = stack.pop() {
            attach(stack, open);
        }
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    if text.is_empty() {
        return;
    }
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(Node::Text(last)) = parent.children.last_mut() {
        last.push_str(text);
    } else {
        parent.children.push(Node::Text(text.to_string()));
    }
}

/// Resolves `&name;` (without the delimiters). Unknown named entities are
/// kept literally so HTML payloads can resolve them later.
fn resolve_reference(name: &str) -> String {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse().ok(),
        };
        if let Some(c) = code.and_then(char::from_u32) {
            return c.to_string();
        }
    } else if let Some(resolved) = resolve_predefined_entity(name) {
        return resolved.to_string();
    }
    format!("&{};", name)
}
