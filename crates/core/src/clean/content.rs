// ABOUTME: Default content cleaner: repairs links, marks embedded media with citations, then enforces a safelist.
// ABOUTME: Images survive only when the cleaner is configured to allow them.

use tracing::debug;

use super::{enforce, take_body, ContentCleaner};
use crate::dom::{Element, Node};
use crate::options::Options;
use crate::safelist::Safelist;

/// Sanitizes article markup.
///
/// Before the safelist is applied, protocol-relative links get the
/// document's protocol, `mailto:` anchors become `q.mailto` citations,
/// iframes and (unless images are allowed) images are preceded by a `q`
/// citing their source, and Twitter embed blockquotes are given a `cite`.
#[derive(Debug, Clone)]
pub struct DefaultContentCleaner {
    safelist: Safelist,
    allow_images: bool,
}

impl Default for DefaultContentCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultContentCleaner {
    pub fn new() -> Self {
        Self {
            safelist: Safelist::content(),
            allow_images: false,
        }
    }

    /// Keeps `img` elements with http(s) sources.
    pub fn with_images() -> Self {
        Self {
            safelist: Safelist::content_with_images(),
            allow_images: true,
        }
    }

    pub fn with_safelist(mut self, safelist: Safelist) -> Self {
        self.safelist = safelist;
        self
    }

    pub fn from_options(options: &Options) -> Self {
        let kind = if options.allow_images {
            options.safelist.with_images()
        } else {
            options.safelist
        };
        Self {
            safelist: kind.safelist(),
            allow_images: options.allow_images,
        }
    }

    pub fn safelist(&self) -> &Safelist {
        &self.safelist
    }

    pub fn allows_images(&self) -> bool {
        self.allow_images
    }

    fn mark_media(&self, el: &mut Element, protocol: &str) {
        let children = std::mem::take(&mut el.children);
        for child in children {
            let mut child = match child {
                Node::Element(child) => child,
                other => {
                    el.children.push(other);
                    continue;
                }
            };
            let is_image = child.is("img");
            if is_image || child.is("iframe") || child.is("embed") {
                let src = child.attr_or_empty("src").to_string();
                if src.is_empty() {
                    debug!(tag = %child.tag(), "removed media without source");
                    continue;
                }
                let cite = repair(&src, protocol);
                if !is_image {
                    el.children
                        .push(citation(&cite, "iframe").into());
                } else if self.allow_images {
                    child.set_attr("src", cite);
                } else {
                    let mut q = citation(&cite, "image");
                    for attr in ["alt", "title"] {
                        let value = child.attr(attr).unwrap_or("");
                        if !value.is_empty() {
                            q.set_attr(attr, value);
                        }
                    }
                    el.children.push(q.into());
                }
            } else {
                self.mark_media(&mut child, protocol);
            }
            el.children.push(Node::Element(child));
        }
    }
}

impl ContentCleaner for DefaultContentCleaner {
    fn transform(&self, root: &mut Element, base_uri: Option<&str>) {
        let protocol = document_protocol(base_uri);
        let mut body = take_body(root);
        massage_links(&mut body, protocol);
        self.mark_media(&mut body, protocol);
        mark_twitter_blockquotes(&mut body);
        enforce(&self.safelist, &mut body, base_uri);
        // Enforcement can strip a source the protocol check rejected.
        body.retain_descendants(&is_sourceless_media);
        *root = Element {
            name: "body".to_string(),
            attrs: Vec::new(),
            children: body.children,
        };
    }
}

fn is_sourceless_media(el: &Element) -> bool {
    (el.is("img") || el.is("iframe") || el.is("embed")) && el.attr_or_empty("src").trim().is_empty()
}

fn document_protocol(base_uri: Option<&str>) -> &'static str {
    if base_uri.unwrap_or("").trim().starts_with("https:") {
        "https:"
    } else {
        "http:"
    }
}

fn repair(uri: &str, protocol: &str) -> String {
    if uri.starts_with("//") {
        format!("{}{}", protocol, uri)
    } else {
        uri.to_string()
    }
}

fn citation(cite: &str, class: &str) -> Element {
    Element::new("q")
        .with_attr("cite", cite)
        .with_attr("class", class)
}

fn massage_links(body: &mut Element, protocol: &str) {
    body.walk_mut(&mut |el| {
        if el.is("a") {
            let href = el.attr_or_empty("href").to_string();
            if href.starts_with("//") {
                el.set_attr("href", repair(&href, protocol));
            } else if href.starts_with("mailto:") {
                el.name = "q".to_string();
                el.remove_attr("href");
                el.set_attr("cite", href);
                el.set_attr("class", "mailto");
            }
        } else if el.is("blockquote") || el.is("q") {
            let cite = el.attr_or_empty("cite").to_string();
            if cite.starts_with("//") {
                el.set_attr("cite", repair(&cite, protocol));
            }
        }
    });
}

fn mark_twitter_blockquotes(body: &mut Element) {
    body.walk_mut(&mut |el| {
        if !(el.is("blockquote") && el.has_class("twitter-tweet")) {
            return;
        }
        let link = el
            .descendants_named("a")
            .into_iter()
            .map(|a| a.attr_or_empty("href"))
            .find(|href| href.starts_with("https://twitter.com/") && href.contains("/status/"))
            .map(str::to_string);
        if let Some(link) = link {
            el.set_attr("cite", link);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_body_fragment;
    use pretty_assertions::assert_eq;

    fn clean(cleaner: &DefaultContentCleaner, html: &str, base: Option<&str>) -> String {
        let mut root = parse_body_fragment(html);
        cleaner.transform(&mut root, base);
        cleaner.to_clean_content(&root)
    }

    #[test]
    fn mailto_links_become_citations() {
        let out = clean(
            &DefaultContentCleaner::new(),
            r#"<p>Mail <a href="mailto:x@example.com">me</a></p>"#,
            None,
        );
        assert_eq!(
            out,
            r#"<p>Mail <q cite="mailto:x@example.com" class="mailto">me</q></p>"#
        );
    }

    #[test]
    fn protocol_relative_links_use_document_protocol() {
        let out = clean(
            &DefaultContentCleaner::new(),
            r#"<a href="//example.com/x">x</a>"#,
            Some("https://example.org/"),
        );
        assert_eq!(out, r#"<a href="https://example.com/x">x</a>"#);
    }

    #[test]
    fn images_are_marked_when_not_allowed() {
        let out = clean(
            &DefaultContentCleaner::new(),
            r#"<p><img src="//cdn.example.com/a.png" alt="A" onerror="x()"><img alt="none"></p>"#,
            Some("https://example.com/"),
        );
        assert_eq!(
            out,
            r#"<p><q cite="https://cdn.example.com/a.png" class="image" alt="A"></q></p>"#
        );
    }

    #[test]
    fn images_survive_when_allowed() {
        let out = clean(
            &DefaultContentCleaner::with_images(),
            r#"<img src="/a.png" width="10" onerror="x()">"#,
            Some("https://example.com/post"),
        );
        assert_eq!(out, r#"<img src="https://example.com/a.png" width="10">"#);
    }

    #[test]
    fn iframes_leave_a_citation() {
        let out = clean(
            &DefaultContentCleaner::new(),
            r#"<iframe src="//player.example.com/v/1"></iframe><iframe></iframe>"#,
            Some("http://example.com/"),
        );
        assert_eq!(
            out,
            r#"<q cite="http://player.example.com/v/1" class="iframe"></q>"#
        );
    }

    #[test]
    fn twitter_blockquotes_get_a_cite() {
        let out = clean(
            &DefaultContentCleaner::new(),
            r#"<blockquote class="twitter-tweet"><p>Hi</p><a href="https://twitter.com/jack/status/20">March 21</a></blockquote>"#,
            None,
        );
        assert!(out.starts_with(r#"<blockquote cite="https://twitter.com/jack/status/20"><p>Hi</p>"#));
        assert!(!out.contains("class"));
    }

    #[test]
    fn head_is_dropped_and_root_becomes_body() {
        let mut root = crate::dom::parse_document("<title>T</title><p>x</p>");
        DefaultContentCleaner::new().transform(&mut root, None);
        assert!(root.is("body"));
        assert_eq!(crate::dom::render_children(&root), "<p>x</p>");
    }

    #[test]
    fn transform_is_idempotent() {
        let cleaner = DefaultContentCleaner::new();
        let mut root = parse_body_fragment(
            r#"<div><a href="mailto:a@b.c">m</a><img src="x.png"><iframe src="//v"></iframe><p style="x">t</p></div>"#,
        );
        cleaner.transform(&mut root, Some("https://example.com/"));
        let once = root.clone();
        cleaner.transform(&mut root, Some("https://example.com/"));
        assert_eq!(root, once);
    }
}
