// ABOUTME: Content splitter that flattens nested markup into an ordered list of block elements.
// ABOUTME: Text and inline elements gather into container blocks; preserved and mapped tags are handled specially.

//! Block splitting.
//!
//! The splitter walks a tree depth-first. Text and unknown elements gather
//! into a pending inline run, which is wrapped in the container tag
//! (default `p`) whenever a block boundary is reached:
//!
//! - a mapped tag is replaced by its mapping function's output, which joins
//!   the inline run without a boundary, and is not descended into;
//! - a preserved tag is cloned whole into its own block;
//! - an ignored tag is a boundary (unless it is also inline) and is
//!   descended into;
//! - anything else is cloned into the inline run as an opaque unit.
//!
//! Tag matching ignores case. The root passed to [`ContentSplitter::split`]
//! is always descended into.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::dom::{Element, Node};
use crate::safelist::{BLOCK_ELEMENT_NAMES, INLINE_ELEMENT_NAMES};

/// Maps an element to the nodes that replace it in the inline run.
pub type MapFn = Arc<dyn Fn(&Element) -> Vec<Node> + Send + Sync>;

const DEFAULT_PRESERVE: &[&str] = &[
    "img", "figure", "blockquote", "ul", "ol", "pre", "table", "video", "audio", "iframe",
];

#[derive(Clone)]
pub struct ContentSplitter {
    container: String,
    ignore: HashSet<String>,
    preserve: HashSet<String>,
    map: HashMap<String, MapFn>,
    inline: HashSet<String>,
}

impl fmt::Debug for ContentSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mapped: Vec<&String> = self.map.keys().collect();
        mapped.sort();
        f.debug_struct("ContentSplitter")
            .field("container", &self.container)
            .field("ignore", &self.ignore)
            .field("preserve", &self.preserve)
            .field("map", &mapped)
            .field("inline", &self.inline)
            .finish()
    }
}

impl Default for ContentSplitter {
    fn default() -> Self {
        Self::new("p", BLOCK_ELEMENT_NAMES, DEFAULT_PRESERVE)
    }
}

fn tag_set(tags: &[&str]) -> HashSet<String> {
    tags.iter().map(|t| t.to_ascii_lowercase()).collect()
}

impl ContentSplitter {
    /// A splitter with no mapped tags and the standard inline element names.
    pub fn new(container: &str, ignore: &[&str], preserve: &[&str]) -> Self {
        Self {
            container: container.to_ascii_lowercase(),
            ignore: tag_set(ignore),
            preserve: tag_set(preserve),
            map: HashMap::new(),
            inline: tag_set(INLINE_ELEMENT_NAMES),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn with_container(mut self, container: &str) -> Self {
        self.container = container.to_ascii_lowercase();
        self
    }

    pub fn with_ignore(mut self, ignore: &[&str]) -> Self {
        self.ignore = tag_set(ignore);
        self
    }

    pub fn with_preserve(mut self, preserve: &[&str]) -> Self {
        self.preserve = tag_set(preserve);
        self
    }

    /// Adds (or replaces) the mapping for `tag`.
    pub fn with_map(mut self, tag: &str, f: MapFn) -> Self {
        self.map.insert(tag.to_ascii_lowercase(), f);
        self
    }

    /// Replaces the set of tags that never act as block boundaries.
    pub fn with_inline(mut self, inline: &[&str]) -> Self {
        self.inline = tag_set(inline);
        self
    }

    /// Maps each of `map_tags` to an inline run ending in `<br>`.
    ///
    /// An element without child elements has its children wrapped in
    /// `tag_name`. Otherwise its content (with `tag_name` children
    /// unwrapped) is re-split by this splitter, as configured before the
    /// call but with `tag_name` as the container, and the resulting blocks
    /// are used inline.
    pub fn convert_to_inline_with_break(self, tag_name: &str, map_tags: &[&str]) -> Self {
        let tag_name = tag_name.to_ascii_lowercase();
        let f = inline_with_break(self.clone().with_container(&tag_name), tag_name);
        map_tags
            .iter()
            .fold(self, |splitter, tag| splitter.with_map(tag, f.clone()))
    }

    /// Splits the content of `root` into blocks.
    pub fn split(&self, root: &Element) -> Vec<Element> {
        let mut collector = Collector {
            splitter: self,
            blocks: Vec::new(),
            pending: Vec::new(),
        };
        collector.descend(root);
        collector.flush();
        collector.blocks
    }

    fn is_boundary(&self, tag: &str) -> bool {
        self.ignore.contains(tag) && !self.inline.contains(tag)
    }
}

fn inline_with_break(splitter: ContentSplitter, tag_name: String) -> MapFn {
    Arc::new(move |el: &Element| {
        if !el.has_child_elements() {
            let wrapper = Element {
                name: tag_name.clone(),
                attrs: Vec::new(),
                children: el.children.clone(),
            };
            return vec![Node::Element(wrapper), Node::Element(Element::new("br"))];
        }
        let mut transient = Element::new("body");
        for child in &el.children {
            match child {
                Node::Element(inner) if inner.is(&tag_name) => {
                    transient.children.extend(inner.children.iter().cloned())
                }
                other => transient.children.push(other.clone()),
            }
        }
        let mut nodes: Vec<Node> = splitter
            .split(&transient)
            .into_iter()
            .map(Node::Element)
            .collect();
        nodes.push(Node::Element(Element::new("br")));
        nodes
    })
}

struct Collector<'a> {
    splitter: &'a ContentSplitter,
    blocks: Vec<Element>,
    pending: Vec<Node>,
}

impl Collector<'_> {
    fn descend(&mut self, el: &Element) {
        for child in &el.children {
            self.visit(child);
        }
    }

    fn visit(&mut self, node: &Node) {
        let el = match node {
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    self.pending.push(node.clone());
                }
                return;
            }
            Node::Comment(_) => return,
            Node::Element(el) => el,
        };

        let tag = el.tag();
        let splitter = self.splitter;
        if tag == "body" {
            self.descend(el);
        } else if let Some(f) = splitter.map.get(&tag) {
            self.pending.extend(f(el));
        } else if splitter.preserve.contains(&tag) {
            self.flush();
            self.blocks.push(el.clone());
        } else if splitter.ignore.contains(&tag) {
            if splitter.is_boundary(&tag) {
                self.flush();
            }
            self.descend(el);
        } else {
            self.pending.push(node.clone());
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let block = Element {
            name: self.splitter.container.clone(),
            attrs: Vec::new(),
            children: std::mem::take(&mut self.pending),
        };
        self.blocks.push(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_body_fragment;
    use crate::dom::render::outer_html;
    use pretty_assertions::assert_eq;

    fn body(html: &str) -> Element {
        parse_body_fragment(html)
            .child_named("body")
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn preserved_elements_split_the_run() {
        let splitter = ContentSplitter::new("p", BLOCK_ELEMENT_NAMES, &["ul", "img", "figure"]);
        let blocks = splitter.split(&body("Leading text <img src='u'/> Trailing text"));
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].text(), "Leading text");
        assert!(blocks[0].is("p"));
        assert!(blocks[1].is("img"));
        assert_eq!(blocks[2].text(), "Trailing text");
    }

    #[test]
    fn mapped_heading_joins_the_inline_run() {
        let splitter = ContentSplitter::new("p", BLOCK_ELEMENT_NAMES, &["ul", "img", "figure"])
            .convert_to_inline_with_break("b", &["h1"]);
        let blocks = splitter.split(&body("Leading text <h1>The title</h1> Trailing text"));
        assert_eq!(blocks.len(), 1);
        let children = &blocks[0].children;
        assert_eq!(children.len(), 4);
        assert!(matches!(&children[0], Node::Text(t) if t.trim() == "Leading text"));
        let bold = children[1].as_element().unwrap();
        assert!(bold.is("b"));
        assert_eq!(bold.text(), "The title");
        assert!(children[2].as_element().unwrap().is("br"));
        assert!(matches!(&children[3], Node::Text(t) if t.trim() == "Trailing text"));
    }

    #[test]
    fn mapped_tag_in_ignore_set_is_not_a_boundary() {
        let splitter = ContentSplitter::default().convert_to_inline_with_break("b", &["h2", "div"]);
        let blocks = splitter.split(&body("a<div>b</div>c<h2>d</h2>e"));
        assert_eq!(blocks.len(), 1);
        assert_eq!(outer_html(&blocks[0]), "<p>a<b>b</b><br>c<b>d</b><br>e</p>");
    }

    #[test]
    fn mapped_heading_alone_is_one_block() {
        let splitter = ContentSplitter::default().convert_to_inline_with_break("b", &["H1"]);
        let blocks = splitter.split(&body("<h1>The title</h1>"));
        assert_eq!(blocks.len(), 1);
        assert_eq!(outer_html(&blocks[0]), "<p><b>The title</b><br></p>");
    }

    #[test]
    fn mapped_heading_with_elements_is_resplit() {
        let splitter = ContentSplitter::default().convert_to_inline_with_break("b", &["h2"]);
        let blocks = splitter.split(&body("<h2><b>Bold</b> and <i>it</i></h2>"));
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            outer_html(&blocks[0]),
            "<p><b>Bold and <i>it</i></b><br></p>"
        );
    }

    #[test]
    fn resplit_heading_keeps_preserved_blocks_apart() {
        let splitter = ContentSplitter::default().convert_to_inline_with_break("b", &["h2"]);
        let blocks = splitter.split(&body("<h2><i>One</i><img src=\"u\">Two</h2>"));
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            outer_html(&blocks[0]),
            "<p><b><i>One</i></b><img src=\"u\"><b>Two</b><br></p>"
        );
    }

    #[test]
    fn ignored_blocks_are_boundaries_not_barriers() {
        let splitter = ContentSplitter::default();
        let blocks = splitter.split(&body(
            "<div>one <span>two</span><p>three</p></div><!-- c --><ul><li>x</li></ul>",
        ));
        let html: Vec<String> = blocks.iter().map(outer_html).collect();
        assert_eq!(
            html,
            vec![
                "<p>one <span>two</span></p>".to_string(),
                "<p>three</p>".to_string(),
                "<ul><li>x</li></ul>".to_string(),
            ]
        );
    }

    #[test]
    fn inline_ignored_tags_do_not_flush() {
        let splitter = ContentSplitter::default()
            .with_preserve(&[])
            .with_ignore(&["video", "p"]);
        let blocks = splitter.split(&body("a<video>b</video><p>c</p>"));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "ab");

        let blocks = splitter
            .with_inline(&[])
            .split(&body("a<video>b</video><p>c</p>"));
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn blank_text_and_empty_input_yield_nothing() {
        assert!(ContentSplitter::default().split(&body("  \n ")).is_empty());
    }

    #[test]
    fn container_tag_is_configurable() {
        let blocks = ContentSplitter::default()
            .with_container("section")
            .split(&body("x"));
        assert!(blocks[0].is("section"));
    }
}
