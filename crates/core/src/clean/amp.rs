// ABOUTME: AMP cleaner: turns amp-img into img and surfaces amp-video posters as images.
// ABOUTME: The converted tree is then sanitized by an image-allowing default cleaner.

use super::{ContentCleaner, DefaultContentCleaner};
use crate::dom::{Element, Node};

#[derive(Debug, Clone)]
pub struct AmpCleaner {
    inner: DefaultContentCleaner,
}

impl Default for AmpCleaner {
    fn default() -> Self {
        Self {
            inner: DefaultContentCleaner::with_images(),
        }
    }
}

impl AmpCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `inner` for sanitizing after the AMP conversions.
    pub fn with_cleaner(inner: DefaultContentCleaner) -> Self {
        Self { inner }
    }
}

impl ContentCleaner for AmpCleaner {
    fn transform(&self, root: &mut Element, base_uri: Option<&str>) {
        convert_amp(root);
        self.inner.transform(root, base_uri);
    }

    fn to_clean_content(&self, root: &Element) -> String {
        self.inner.to_clean_content(root)
    }
}

/// Renames `amp-img` to `img` and inserts an `img` after every `amp-video`
/// with a poster.
pub fn convert_amp(el: &mut Element) {
    let children = std::mem::take(&mut el.children);
    for child in children {
        let mut child = match child {
            Node::Element(child) => child,
            other => {
                el.children.push(other);
                continue;
            }
        };
        if child.is("amp-img") {
            child.name = "img".to_string();
        }
        convert_amp(&mut child);
        let poster = if child.is("amp-video") {
            poster_image(&child)
        } else {
            None
        };
        el.children.push(Node::Element(child));
        if let Some(image) = poster {
            el.children.push(Node::Element(image));
        }
    }
}

fn poster_image(video: &Element) -> Option<Element> {
    let poster = video.attr("poster").unwrap_or("");
    if poster.is_empty() {
        return None;
    }
    let mut image = Element::new("img").with_attr("src", poster);
    let width = video.attr("width").unwrap_or("");
    let height = video.attr("height").unwrap_or("");
    if !width.is_empty() && !height.is_empty() {
        image.set_attr("width", width);
        image.set_attr("height", height);
    }
    Some(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::render::outer_html;
    use pretty_assertions::assert_eq;

    #[test]
    fn converts_images_and_posters() {
        let mut root = Element::new("body")
            .with_child(Element::new("amp-img").with_attr("src", "https://x/a.jpg"))
            .with_child(
                Element::new("amp-video")
                    .with_attr("poster", "https://x/p.jpg")
                    .with_attr("width", "640")
                    .with_attr("height", "360"),
            )
            .with_child(Element::new("amp-video").with_attr("poster", "https://x/q.jpg").with_attr("width", "1"));
        convert_amp(&mut root);
        assert_eq!(
            outer_html(&root),
            "<body><img src=\"https://x/a.jpg\">\
             <amp-video poster=\"https://x/p.jpg\" width=\"640\" height=\"360\"></amp-video>\
             <img src=\"https://x/p.jpg\" width=\"640\" height=\"360\">\
             <amp-video poster=\"https://x/q.jpg\" width=\"1\"></amp-video>\
             <img src=\"https://x/q.jpg\"></body>"
        );
    }

    #[test]
    fn sanitizes_after_conversion() {
        let mut root = crate::dom::parse_body_fragment(
            r#"<amp-img src="https://x/a.jpg" layout="responsive"></amp-img><amp-video poster="https://x/p.jpg"></amp-video>"#,
        );
        let cleaner = AmpCleaner::new();
        cleaner.transform(&mut root, None);
        assert_eq!(
            cleaner.to_clean_content(&root),
            r#"<img src="https://x/a.jpg"><img src="https://x/p.jpg">"#
        );
    }
}
