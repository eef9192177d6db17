// ABOUTME: Content cleaner trait, the no-op cleaner and safelist enforcement over the owned tree.
// ABOUTME: Enforcement unwraps disallowed elements, drops unsafe subtrees, attributes and protocols.

//! Content cleaning.
//!
//! A [`ContentCleaner`] rewrites a document tree in place and then renders
//! the part of it that is stored as entry content. Cleaners mutate their
//! input; clone the tree first if the original is still needed.

pub mod amp;
pub mod content;

pub use self::amp::AmpCleaner;
pub use self::content::DefaultContentCleaner;

use tracing::debug;
use url::Url;

use crate::dom::{render_children, Element, Node};
use crate::safelist::Safelist;

pub trait ContentCleaner: Send + Sync {
    /// Rewrites `root` in place. `base_uri` is the document's own address.
    fn transform(&self, root: &mut Element, base_uri: Option<&str>);

    /// Renders the stored content of a transformed tree.
    fn to_clean_content(&self, root: &Element) -> String {
        clean_content(root)
    }
}

/// Leaves documents untouched and renders the body as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCleaner;

impl ContentCleaner for NoopCleaner {
    fn transform(&self, _root: &mut Element, _base_uri: Option<&str>) {}

    fn to_clean_content(&self, root: &Element) -> String {
        render_children(self_or_first(root, "body").unwrap_or(root))
    }
}

/// Children of `main`, else `article`, else `body`, else the root, rendered and trimmed.
pub fn clean_content(root: &Element) -> String {
    let container = self_or_first(root, "main")
        .or_else(|| self_or_first(root, "article"))
        .or_else(|| self_or_first(root, "body"))
        .unwrap_or(root);
    render_children(container).trim().to_string()
}

fn self_or_first<'a>(root: &'a Element, name: &str) -> Option<&'a Element> {
    if root.is(name) {
        Some(root)
    } else {
        root.first_named(name)
    }
}

/// Removes the body (or the root itself when there is none) from `root`.
pub(crate) fn take_body(root: &mut Element) -> Element {
    if !root.is("body") {
        if let Some(body) = root.first_named_mut("body") {
            return std::mem::take(body);
        }
    }
    std::mem::take(root)
}

/// Restricts everything below `root` to `safelist`.
///
/// Disallowed elements are replaced by their cleaned children unless they
/// belong to the safelist's remove-subtree set. URI attributes with
/// configured protocols are rewritten to their absolute form (resolved
/// against `base_uri`) and dropped when the protocol is not allowed.
pub fn enforce(safelist: &Safelist, root: &mut Element, base_uri: Option<&str>) {
    let base = base_uri.and_then(|b| Url::parse(b.trim()).ok());
    clean_children(safelist, root, base.as_ref());
}

fn clean_children(safelist: &Safelist, el: &mut Element, base: Option<&Url>) {
    let children = std::mem::take(&mut el.children);
    for child in children {
        match child {
            Node::Text(text) => el.children.push(Node::Text(text)),
            Node::Comment(_) => {}
            Node::Element(mut child) => {
                let tag = child.tag();
                if safelist.is_safe_tag(&tag) {
                    clean_attributes(safelist, &mut child, base);
                    clean_children(safelist, &mut child, base);
                    el.children.push(Node::Element(child));
                } else if safelist.is_removed_subtree(&tag) {
                    debug!(tag = %tag, "removed element with content");
                } else {
                    clean_children(safelist, &mut child, base);
                    el.children.append(&mut child.children);
                }
            }
        }
    }
}

fn clean_attributes(safelist: &Safelist, el: &mut Element, base: Option<&Url>) {
    let tag = el.tag();
    let attrs = std::mem::take(&mut el.attrs);
    for (name, value) in attrs {
        let lower = name.to_ascii_lowercase();
        if !safelist.is_safe_attribute(&tag, &lower) {
            continue;
        }
        if safelist.protocols(&tag, &lower).is_none() {
            el.attrs.push((lower, value));
            continue;
        }
        let absolute = absolute_url(&value, base).unwrap_or(value);
        if safelist.is_valid_protocol(&tag, &lower, &absolute) {
            el.attrs.push((lower, absolute));
        } else {
            debug!(tag = %tag, attribute = %lower, "removed attribute with disallowed protocol");
        }
    }
}

fn absolute_url(value: &str, base: Option<&Url>) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(value).ok(),
        None => Url::parse(value).ok(),
    };
    resolved.map(String::from)
}
