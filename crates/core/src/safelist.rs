// ABOUTME: Tag, attribute and URI-protocol allow-lists used by the content cleaners.
// ABOUTME: Includes preset safelists, element classification tables and an ammonia bridge.

//! Safelists.
//!
//! A safelist maps allowed tag names to allowed attributes, and
//! (tag, attribute) pairs to allowed URI protocols. Anything not listed is
//! removed by the cleaner. Tags in the remove-subtree set are dropped with
//! their content instead of being unwrapped.
//!
//! Attribute lists may contain `data-*`, which allows every `data-` attribute.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::dom::{Element, Node};

/// Attribute entries stored under this key apply to every tag.
const ALL_TAGS: &str = ":all";
const DATA_WILDCARD: &str = "data-*";

/// Block-level element names.
pub const BLOCK_ELEMENT_NAMES: &[&str] = &[
    "address", "article", "aside", "blockquote", "canvas", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "noscript", "ol", "output", "p", "pre", "section", "table", "tfoot",
    "ul", "video",
];

/// Inline element names. `audio`, `video`, `canvas`, `noscript` and
/// `output` also appear in the block list.
pub const INLINE_ELEMENT_NAMES: &[&str] = &[
    "a", "abbr", "acronym", "audio", "b", "bdi", "bdo", "big", "br", "button", "canvas", "cite",
    "code", "data", "datalist", "del", "dfn", "em", "embed", "i", "iframe", "img", "input", "ins",
    "kbd", "label", "map", "mark", "meter", "noscript", "object", "output", "picture", "progress",
    "q", "ruby", "s", "samp", "script", "select", "slot", "small", "span", "strong", "sub", "sup",
    "svg", "template", "textarea", "time", "u", "tt", "var", "video", "wbr",
];

/// Inline elements that never carry media or scripts.
pub const SAFE_INLINE_ELEMENT_NAMES: &[&str] = &[
    "a", "abbr", "acronym", "b", "bdo", "big", "br", "button", "cite", "code", "dfn", "em", "i",
    "img", "input", "kbd", "label", "map", "q", "samp", "select", "small", "span", "strong", "sub",
    "sup", "textarea", "time", "tt", "var",
];

/// Event-handler attribute names.
pub const EVENT_ATTRIBUTE_NAMES: &[&str] = &[
    "onafterprint", "onbeforeprint", "onbeforeunload", "onerror", "onhashchange", "onload",
    "onmessage", "onoffline", "ononline", "onpagehide", "onpageshow", "onpopstate", "onresize",
    "onstorage", "onunload", "onblur", "onchange", "oncontextmenu", "onfocus", "oninput",
    "oninvalid", "onreset", "onsearch", "onselect", "onsubmit", "onkeydown", "onkeypress",
    "onkeyup", "onclick", "ondblclick", "onmousedown", "onmousemove", "onmouseout",
    "onmouseover", "onmouseup", "onmousewheel", "onwheel", "ondrag", "ondragend", "ondragenter",
    "ondragleave", "ondragover", "ondragstart", "ondrop", "onscroll", "oncopy", "oncut",
    "onpaste", "onabort", "oncanplay", "oncanplaythrough", "oncuechange", "ondurationchange",
    "onemptied", "onended", "onloadeddata", "onloadedmetadata", "onloadstart", "onpause",
    "onplay", "onplaying", "onprogress", "onratechange", "onseeked", "onseeking", "onstalled",
    "onsuspend", "ontimeupdate", "onvolumechange", "onwaiting", "onshow", "ontoggle",
];

/// Elements whose content is dropped along with them.
const DEFAULT_REMOVE_SUBTREE: &[&str] = &[
    "applet", "button", "canvas", "embed", "frame", "frameset", "head", "iframe", "input",
    "math", "noscript", "object", "option", "script", "select", "style", "svg", "template",
    "textarea", "title",
];

pub fn is_block_element(name: &str) -> bool {
    contains_ignore_case(BLOCK_ELEMENT_NAMES, name)
}

pub fn is_inline_element(name: &str) -> bool {
    contains_ignore_case(INLINE_ELEMENT_NAMES, name)
}

pub fn is_safe_inline_element(name: &str) -> bool {
    contains_ignore_case(SAFE_INLINE_ELEMENT_NAMES, name)
}

pub fn is_event_attribute(name: &str) -> bool {
    contains_ignore_case(EVENT_ATTRIBUTE_NAMES, name)
}

fn contains_ignore_case(list: &[&str], name: &str) -> bool {
    list.iter().any(|n| n.eq_ignore_ascii_case(name))
}

/// One way a tree escapes a safelist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Tag {
        tag: String,
    },
    Attribute {
        tag: String,
        attribute: String,
    },
    Protocol {
        tag: String,
        attribute: String,
        value: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Tag { tag } => write!(f, "disallowed tag <{}>", tag),
            Violation::Attribute { tag, attribute } => {
                write!(f, "disallowed attribute {} on <{}>", attribute, tag)
            }
            Violation::Protocol {
                tag,
                attribute,
                value,
            } => write!(f, "disallowed protocol in {}=\"{}\" on <{}>", attribute, value, tag),
        }
    }
}

/// Allow-list of tags, attributes and URI protocols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Safelist {
    tags: BTreeSet<String>,
    attributes: BTreeMap<String, BTreeSet<String>>,
    protocols: BTreeMap<(String, String), BTreeSet<String>>,
    remove_subtree: BTreeSet<String>,
}

impl Default for Safelist {
    fn default() -> Self {
        Self::none()
    }
}

impl Safelist {
    /// Allows nothing; only text survives.
    pub fn none() -> Self {
        Self {
            tags: BTreeSet::new(),
            attributes: BTreeMap::new(),
            protocols: BTreeMap::new(),
            remove_subtree: DEFAULT_REMOVE_SUBTREE.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Simple text formatting only.
    pub fn simple_text() -> Self {
        Self::none().add_tags(&["b", "em", "i", "strong", "u"])
    }

    /// Text-level markup, lists, quotes and links.
    pub fn basic() -> Self {
        Self::none()
            .add_tags(&[
                "a", "b", "blockquote", "br", "cite", "code", "dd", "dl", "dt", "em", "i", "li",
                "ol", "p", "pre", "q", "small", "strike", "del", "s", "strong", "sub", "sup", "u",
                "ul", "mark", "bdi",
            ])
            .add_attributes("a", &["href"])
            .add_attributes("blockquote", &["cite"])
            .add_attributes("q", &["cite", "class", "alt", "title"])
            .add_protocols("a", "href", &["http", "https", "mailto"])
            .add_protocols("blockquote", "cite", &["http", "https"])
            .add_protocols("cite", "cite", &["http", "https"])
            .add_protocols("q", "cite", &["http", "https", "mailto"])
    }

    /// `basic` plus `img` with http(s) sources.
    pub fn basic_with_images() -> Self {
        Self::basic().with_images()
    }

    /// `basic` plus headings, tables and sectioning elements.
    pub fn content() -> Self {
        Self::basic()
            .add_tags(&[
                "h1", "h2", "h3", "h4", "h5", "h6", "table", "tr", "td", "th", "tbody", "tfoot",
                "thead", "col", "colgroup", "figure", "figcaption", "header", "footer", "aside",
                "details", "section", "summary", "time", "article", "main",
            ])
            .add_attributes("time", &["datetime"])
    }

    /// `content` plus `img` with http(s) sources.
    pub fn content_with_images() -> Self {
        Self::content().with_images()
    }

    /// Block elements with `id`, `class` and `data-*` attributes.
    pub fn block_elements() -> Self {
        Self::custom(BLOCK_ELEMENT_NAMES, &["id", "class", DATA_WILDCARD])
    }

    /// Allows `tags`, and every attribute in `attrs` on all of them.
    pub fn custom(tags: &[&str], attrs: &[&str]) -> Self {
        let mut list = Self::none().add_tags(tags);
        list = list.add_attributes(ALL_TAGS, attrs);
        list
    }

    fn with_images(self) -> Self {
        self.add_tags(&["img"])
            .add_attributes("img", &["src", "title", "alt", "width", "height"])
            .add_protocols("img", "src", &["http", "https"])
    }

    pub fn add_tags(mut self, tags: &[&str]) -> Self {
        for tag in tags {
            self.tags.insert(tag.to_ascii_lowercase());
        }
        self
    }

    pub fn remove_tags(mut self, tags: &[&str]) -> Self {
        for tag in tags {
            let tag = tag.to_ascii_lowercase();
            self.tags.remove(&tag);
            self.attributes.remove(&tag);
            self.protocols.retain(|(t, _), _| *t != tag);
        }
        self
    }

    pub fn add_attributes(mut self, tag: &str, attrs: &[&str]) -> Self {
        let entry = self.attributes.entry(tag.to_ascii_lowercase()).or_default();
        for attr in attrs {
            entry.insert(attr.to_ascii_lowercase());
        }
        self
    }

    pub fn add_protocols(mut self, tag: &str, attr: &str, protocols: &[&str]) -> Self {
        let entry = self
            .protocols
            .entry((tag.to_ascii_lowercase(), attr.to_ascii_lowercase()))
            .or_default();
        for protocol in protocols {
            entry.insert(protocol.to_ascii_lowercase());
        }
        self
    }

    /// Adds tags whose content is dropped when the tag itself is not allowed.
    pub fn add_remove_subtree(mut self, tags: &[&str]) -> Self {
        for tag in tags {
            self.remove_subtree.insert(tag.to_ascii_lowercase());
        }
        self
    }

    pub fn is_safe_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_ascii_lowercase())
    }

    /// True if an element that is not allowed should be dropped with its children.
    pub fn is_removed_subtree(&self, tag: &str) -> bool {
        let tag = tag.to_ascii_lowercase();
        !self.tags.contains(&tag) && self.remove_subtree.contains(&tag)
    }

    pub fn is_safe_attribute(&self, tag: &str, attr: &str) -> bool {
        let tag = tag.to_ascii_lowercase();
        let attr = attr.to_ascii_lowercase();
        [tag.as_str(), ALL_TAGS].iter().any(|key| {
            self.attributes.get(*key).is_some_and(|allowed| {
                allowed.contains(&attr)
                    || (attr.starts_with("data-") && allowed.contains(DATA_WILDCARD))
            })
        })
    }

    /// Allowed protocols for a URI attribute, if any are configured.
    pub fn protocols(&self, tag: &str, attr: &str) -> Option<&BTreeSet<String>> {
        self.protocols
            .get(&(tag.to_ascii_lowercase(), attr.to_ascii_lowercase()))
    }

    /// True if `value` is acceptable for the attribute. Attributes without
    /// configured protocols accept any value.
    pub fn is_valid_protocol(&self, tag: &str, attr: &str, value: &str) -> bool {
        match self.protocols(tag, attr) {
            None => true,
            Some(allowed) => {
                let lower = value.trim().to_ascii_lowercase();
                allowed.iter().any(|p| {
                    lower
                        .strip_prefix(p.as_str())
                        .is_some_and(|rest| rest.starts_with(':'))
                })
            }
        }
    }

    /// Lists every element, attribute and protocol below `root` that this
    /// safelist does not allow. `root` itself is the container and is not checked.
    pub fn violations(&self, root: &Element) -> Vec<Violation> {
        let mut found = Vec::new();
        self.collect_violations(root, &mut found);
        found
    }

    fn collect_violations(&self, el: &Element, found: &mut Vec<Violation>) {
        for child in &el.children {
            let Node::Element(child) = child else {
                continue;
            };
            let tag = child.tag();
            if !self.is_safe_tag(&tag) {
                found.push(Violation::Tag { tag: tag.clone() });
            }
            for (attr, value) in &child.attrs {
                if !self.is_safe_attribute(&tag, attr) {
                    found.push(Violation::Attribute {
                        tag: tag.clone(),
                        attribute: attr.clone(),
                    });
                } else if !self.is_valid_protocol(&tag, attr, value) {
                    found.push(Violation::Protocol {
                        tag: tag.clone(),
                        attribute: attr.clone(),
                        value: value.clone(),
                    });
                }
            }
            self.collect_violations(child, found);
        }
    }

    /// An ammonia builder enforcing the same tags, attributes and protocols.
    pub fn to_ammonia(&self) -> ammonia::Builder<'_> {
        let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
        let mut generic: HashSet<&str> = HashSet::new();
        let mut prefixes: HashSet<&str> = HashSet::new();
        for (tag, attrs) in &self.attributes {
            for attr in attrs {
                if attr == DATA_WILDCARD {
                    prefixes.insert("data-");
                } else if tag == ALL_TAGS {
                    generic.insert(attr.as_str());
                } else {
                    tag_attributes
                        .entry(tag.as_str())
                        .or_default()
                        .insert(attr.as_str());
                }
            }
        }
        let schemes: HashSet<&str> = self
            .protocols
            .values()
            .flat_map(|set| set.iter().map(String::as_str))
            .collect();
        let clean_content: HashSet<&str> = self
            .remove_subtree
            .iter()
            .filter(|t| !self.tags.contains(*t))
            .map(String::as_str)
            .collect();

        let mut builder = ammonia::Builder::default();
        builder
            .tags(self.tags.iter().map(String::as_str).collect())
            .clean_content_tags(clean_content)
            .tag_attributes(tag_attributes)
            .generic_attributes(generic)
            .generic_attribute_prefixes(prefixes)
            .link_rel(None)
            .url_relative(ammonia::UrlRelative::Deny);
        if !schemes.is_empty() {
            builder.url_schemes(schemes);
        }
        builder
    }

    /// Cleans an HTML string with ammonia using this safelist.
    pub fn clean(&self, html: &str) -> String {
        self.to_ammonia().clean(html).to_string()
    }
}
