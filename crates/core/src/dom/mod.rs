// ABOUTME: Owned, mutable document tree used by the cleaners and the content splitter.
// ABOUTME: Elements keep ordered attributes and children; tag and attribute lookups ignore case.

//! Owned document tree.
//!
//! `scraper` documents are read-only, so anything that rewrites markup works
//! on this tree instead. Trees are built from `scraper::Html` (see [`html`])
//! or from any other source, and serialized with [`render`].
//!
//! Cloning a tree is the way to keep an untouched copy before handing it to
//! a cleaner: cleaners take `&mut Element` and rewrite it in place.

pub mod html;
pub mod render;

pub use self::html::{parse_body_fragment, parse_document};
pub use self::render::{render, render_children};

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => {
                if el.is("br") {
                    out.push(' ');
                }
                for child in &el.children {
                    child.collect_text(out);
                }
            }
            Node::Comment(_) => {}
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// An element with a tag name, ordered attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder-style text appender.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Case-insensitive tag name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, trimmed, or an empty string.
    pub fn attr_or_empty(&self, name: &str) -> &str {
        self.attr(name).map(str::trim).unwrap_or("")
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(idx).1)
    }

    /// True if the `class` attribute contains `class_name` as a token.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|t| t.eq_ignore_ascii_case(class_name)))
            .unwrap_or(false)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn has_child_elements(&self) -> bool {
        self.child_elements().next().is_some()
    }

    /// Text of all descendants with whitespace collapsed, like a browser's
    /// `innerText` without layout.
    pub fn text(&self) -> String {
        let mut raw = String::new();
        for child in &self.children {
            child.collect_text(&mut raw);
        }
        normalize_space(&raw)
    }

    /// Text of direct text children only, whitespace collapsed.
    pub fn own_text(&self) -> String {
        let raw: String = self
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ");
        normalize_space(&raw)
    }

    /// Pre-order descendants (not including `self`) with the given tag name.
    pub fn descendants_named<'a>(&'a self, name: &'a str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.walk(&mut |el| {
            if el.is(name) {
                out.push(el);
            }
        });
        out
    }

    /// First pre-order descendant with the given tag name.
    pub fn first_named(&self, name: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.is(name) {
                return Some(child);
            }
            if let Some(found) = child.first_named(name) {
                return Some(found);
            }
        }
        None
    }

    /// Mutable version of [`Element::first_named`].
    pub fn first_named_mut(&mut self, name: &str) -> Option<&mut Element> {
        let idx = self.children.iter().position(|n| match n {
            Node::Element(el) => el.is(name) || el.first_named(name).is_some(),
            _ => false,
        })?;
        let el = self.children[idx].as_element_mut()?;
        if el.is(name) {
            Some(el)
        } else {
            el.first_named_mut(name)
        }
    }

    /// First direct child element with the given tag name.
    pub fn child_named(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|c| c.is(name))
    }

    /// Text of the first descendant with the given tag, or an empty string.
    pub fn child_text(&self, name: &str) -> String {
        self.first_named(name).map(Element::text).unwrap_or_default()
    }

    fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Element)) {
        for child in self.child_elements() {
            f(child);
            child.walk(f);
        }
    }

    /// Mutable pre-order visit of every descendant element.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        for child in self.children.iter_mut() {
            if let Node::Element(el) = child {
                f(el);
                el.walk_mut(f);
            }
        }
    }

    /// Removes descendant elements for which `drop` returns true.
    pub fn retain_descendants(&mut self, drop: &dyn Fn(&Element) -> bool) {
        self.children.retain(|n| match n {
            Node::Element(el) => !drop(el),
            _ => true,
        });
        for child in self.children.iter_mut() {
            if let Node::Element(el) = child {
                el.retain_descendants(drop);
            }
        }
    }
}

/// Collapses whitespace runs to single spaces and trims.
pub fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
