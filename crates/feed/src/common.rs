// ABOUTME: Plumbing shared by the RSS and Atom drivers.
// ABOUTME: Wraps XML parsing failures into a ParseResult and attaches entry content and images.

use pagesift_core::clean::ContentCleaner;
use pagesift_core::dom::{parse_body_fragment, Element};
use pagesift_core::error::ParseError;
use pagesift_core::model::{Entry, Image, Resource};
use pagesift_core::parsers::apply_cleaner;
use pagesift_core::result::ParseResult;
use pagesift_core::util::http_url;

use crate::xml::parse_xml;

pub(crate) const PARSE_FAILURE: &str = "Parse Failure";

/// Parses `content` as XML and lets `fill` populate a resource for
/// `source_link`. A tokenizer failure becomes the single error of the result.
pub(crate) fn parse_feed(
    name: &'static str,
    content: &str,
    source_link: &str,
    fill: impl FnOnce(&Element, &mut Resource),
) -> ParseResult {
    let doc = match parse_xml(content) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(parser = name, source_link, error = %err, "feed parse failed");
            return ParseResult::error(name, ParseError::xml(name, PARSE_FAILURE, Some(err.into())));
        }
    };
    let mut resource = Resource::new(source_link);
    fill(&doc, &mut resource);
    tracing::debug!(parser = name, entries = resource.entries.len(), "parsed feed");
    ParseResult::ok(name, resource)
}

/// Sets original and clean content from an HTML payload. Without a cleaner
/// the payload is used as clean content unchanged.
pub(crate) fn set_content(
    entry: &mut Entry,
    content: &str,
    base_uri: &str,
    cleaner: Option<&dyn ContentCleaner>,
) {
    if content.is_empty() {
        return;
    }
    apply_cleaner(entry, parse_body_fragment(content), Some(base_uri), cleaner);
    if cleaner.is_none() {
        entry.clean_content = content.to_string();
    }
}

/// Adds an image if `url` is (or can be made) an http(s) link.
pub(crate) fn add_image_link(entry: &mut Entry, url: &str, protocol: Option<&str>) {
    if let Some(link) = http_url(url, protocol) {
        entry.add_image(Image::new(link));
    }
}
