// ABOUTME: AMP HTML driver: requires a head and a canonical link, reads schema.org JSON-LD and Twitter meta.
// ABOUTME: Content goes through the caller's cleaner, or the AMP cleaner when none is given.

use scraper::Html;
use serde_json::Value;

use super::{apply_cleaner, json_text, json_u32, ContentParser};
use crate::clean::{AmpCleaner, ContentCleaner};
use crate::date::parse_date_time;
use crate::dom::parse_document;
use crate::error::ParseError;
use crate::metadata::fields::{first_attr, first_text, meta_content, select_all};
use crate::model::{Author, Entry, Image, Resource};
use crate::result::ParseResult;
use crate::util::abs_url;

const SCHEMA_CONTEXTS: &[&str] = &[
    "http://schema.org",
    "https://schema.org",
    "http://schema.org/",
    "https://schema.org/",
];

#[derive(Debug, Clone, Default)]
pub struct AmpParser {
    cleaner: AmpCleaner,
}

impl AmpParser {
    pub const NAME: &'static str = "HTML Amp";

    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `cleaner` when callers do not supply their own.
    pub fn with_cleaner(cleaner: AmpCleaner) -> Self {
        Self { cleaner }
    }
}

impl ContentParser for AmpParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(
        &self,
        content: &str,
        source_link: &str,
        cleaner: Option<&dyn ContentCleaner>,
    ) -> ParseResult {
        match self.parse_amp(content, source_link, cleaner) {
            Ok(resource) => ParseResult::ok(Self::NAME, resource),
            Err(err) => {
                tracing::warn!(error = %err, source_link, "AMP parse failed");
                ParseResult::error(Self::NAME, err)
            }
        }
    }
}

impl AmpParser {
    fn parse_amp(
        &self,
        content: &str,
        source_link: &str,
        cleaner: Option<&dyn ContentCleaner>,
    ) -> Result<Resource, ParseError> {
        // html5ever always synthesizes a head, so look for one in the source.
        if !content.to_ascii_lowercase().contains("<head") {
            return Err(ParseError::invalid(Self::NAME, "AMP document must have a 'head'"));
        }
        let doc = Html::parse_document(content);
        if select_all(&doc, r#"head link[rel="canonical"]"#).is_empty() {
            return Err(ParseError::invalid(
                Self::NAME,
                "AMP document must have a canonical link",
            ));
        }
        let base = url::Url::parse(source_link).ok();
        let canonical = first_attr(&doc, r#"head link[rel="canonical"]"#, "href")
            .and_then(|href| abs_url(base.as_ref(), &href))
            .ok_or_else(|| {
                ParseError::invalid(Self::NAME, "AMP document must have a valid canonical link")
            })?;

        let mut entry = Entry::new().with_canonical_link(canonical.as_str());
        if let Some(ld) = schema_org_json(&doc) {
            apply_json_ld(&mut entry, &ld);
        }
        apply_twitter_meta(&mut entry, &doc);
        if entry.title.is_empty() {
            entry.title = first_text(&doc, "head title").unwrap_or_default();
        }

        let root = parse_document(content);
        match cleaner {
            Some(cleaner) => apply_cleaner(&mut entry, root, Some(&canonical), Some(cleaner)),
            None => apply_cleaner(&mut entry, root, Some(&canonical), Some(&self.cleaner)),
        }

        let mut resource = Resource::new(source_link)
            .with_canonical_link(canonical.as_str())
            .with_title(entry.title.as_str());
        resource.add_entry(entry);
        Ok(resource)
    }
}

/// The first JSON-LD object in the head with a schema.org context.
fn schema_org_json(doc: &Html) -> Option<Value> {
    select_all(doc, r#"head script[type="application/ld+json"]"#)
        .into_iter()
        .filter_map(|script| {
            let text: String = script.text().collect();
            match serde_json::from_str::<Value>(text.trim()) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unparseable JSON-LD");
                    None
                }
            }
        })
        .find(|value| SCHEMA_CONTEXTS.contains(&json_text(value.get("@context")).as_str()))
}

fn apply_json_ld(entry: &mut Entry, ld: &Value) {
    let headline = json_text(ld.get("headline"));
    if !headline.is_empty() && entry.title.is_empty() {
        entry.title = headline;
    }
    if let Some(published) = parse_date_time(&json_text(ld.get("datePublished"))) {
        entry.published = Some(published);
    }
    if let Some(updated) = parse_date_time(&json_text(ld.get("dateModified"))) {
        entry.updated = Some(updated);
    }
    let description = json_text(ld.get("description"));
    if !description.is_empty() && entry.summary.is_empty() {
        entry.summary = description;
    }

    let images: Vec<&Value> = match ld.get("image") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(image) => vec![image],
        None => Vec::new(),
    };
    for image in images {
        if let Some(image) = json_ld_image(image) {
            entry.add_image(image);
        }
    }

    if entry.authors.is_empty() {
        let author = match ld.get("author") {
            Some(Value::Array(items)) => items.first(),
            other => other,
        };
        let name = match author {
            Some(Value::Object(_)) => json_text(author.and_then(|a| a.get("name"))),
            other => json_text(other),
        };
        if !name.is_empty() {
            entry.add_author(Author::new(name));
        }
    }
}

/// An `ImageObject` (or a bare URL string). Sizes are kept only when both are known.
fn json_ld_image(value: &Value) -> Option<Image> {
    let (url, width, height) = match value {
        Value::String(url) => (url.trim().to_string(), 0, 0),
        Value::Object(_) => (
            json_text(value.get("url")),
            json_u32(value.get("width")),
            json_u32(value.get("height")),
        ),
        _ => return None,
    };
    if url.is_empty() {
        return None;
    }
    let image = Image::new(url);
    Some(if width > 0 && height > 0 {
        image.with_size(width, height)
    } else {
        image
    })
}

/// Fills whatever JSON-LD left empty from the Twitter card tags.
fn apply_twitter_meta(entry: &mut Entry, doc: &Html) {
    if entry.title.is_empty() {
        if let Some(title) = meta_content(doc, r#"head meta[name="twitter:title"]"#) {
            entry.title = title;
        }
    }
    if entry.summary.is_empty() {
        if let Some(summary) = meta_content(doc, r#"head meta[name="twitter:description"]"#) {
            entry.summary = summary;
        }
    }
    if entry.images.is_empty() {
        if let Some(image) = meta_content(doc, r#"head meta[name="twitter:image"]"#) {
            entry.add_image(Image::new(image));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::DefaultContentCleaner;
    use pretty_assertions::assert_eq;

    const AMP: &str = r#"<!doctype html><html amp><head>
        <title>Fallback Title</title>
        <link rel="canonical" href="/news/story.html">
        <meta name="twitter:title" content="Twitter Title">
        <meta name="twitter:description" content="Twitter summary">
        <meta name="twitter:image" content="https://example.com/tw.jpg">
        <script type="application/ld+json">
        {"@context":"http://schema.org","@type":"NewsArticle",
         "headline":"LD Headline",
         "datePublished":"2017-02-03T04:05:06Z",
         "dateModified":"2017-02-04T04:05:06Z",
         "image":[{"@type":"ImageObject","url":"https://example.com/ld.jpg","width":800,"height":600},
                  {"@type":"ImageObject","url":"https://example.com/ld2.jpg","width":800}],
         "author":{"@type":"Person","name":"Ann Author"}}
        </script>
        </head><body>
        <article><p>Story <amp-img src="/pic.jpg" width="10" height="10"></amp-img></p>
        <script>evil()</script></article>
        </body></html>"#;

    #[test]
    fn reads_json_ld_then_twitter_meta() {
        let result = AmpParser::new().parse(AMP, "https://example.com/amp/story", None);
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.parser_name, "HTML Amp");
        let resource = result.resource.unwrap();
        assert_eq!(resource.canonical_link, "https://example.com/news/story.html");
        let entry = &resource.entries[0];
        assert_eq!(entry.title, "LD Headline");
        assert_eq!(entry.summary, "Twitter summary");
        assert_eq!(entry.authors[0].name, "Ann Author");
        assert_eq!(entry.published.unwrap().to_rfc3339(), "2017-02-03T04:05:06+00:00");
        assert_eq!(entry.updated.unwrap().to_rfc3339(), "2017-02-04T04:05:06+00:00");
        let images: Vec<(&str, u32)> = entry.images.iter().map(|i| (i.link.as_str(), i.width)).collect();
        assert_eq!(images, vec![("https://example.com/ld.jpg", 800), ("https://example.com/ld2.jpg", 0)]);
    }

    #[test]
    fn amp_cleaner_converts_and_sanitizes_by_default() {
        let result = AmpParser::new().parse(AMP, "https://example.com/amp/story", None);
        let entry = &result.resource.unwrap().entries[0];
        assert!(entry
            .clean_content
            .contains(r#"<img src="https://example.com/pic.jpg" width="10" height="10">"#));
        assert!(!entry.clean_content.contains("evil"));
        assert!(entry.original_content.as_deref().unwrap().contains("amp-img"));
    }

    #[test]
    fn caller_cleaner_wins() {
        let cleaner = DefaultContentCleaner::new();
        let result = AmpParser::new().parse(AMP, "https://example.com/amp/story", Some(&cleaner));
        let entry = &result.resource.unwrap().entries[0];
        assert!(!entry.clean_content.contains("<img"));
        assert!(entry.clean_content.contains("Story"));
    }

    #[test]
    fn twitter_meta_and_title_fill_gaps() {
        let html = r#"<html><head><title> Plain </title>
            <link rel="canonical" href="https://example.com/a">
            <meta name="twitter:image" content="https://example.com/tw.jpg">
            </head><body></body></html>"#;
        let entry = AmpParser::new()
            .parse(html, "https://example.com/amp/a", None)
            .resource
            .unwrap()
            .entries
            .remove(0);
        assert_eq!(entry.title, "Plain");
        assert_eq!(entry.primary_image.unwrap().link, "https://example.com/tw.jpg");
    }

    #[test]
    fn structural_errors() {
        let cases = [
            ("<p>no head</p>", "AMP document must have a 'head'"),
            ("<html><head><title>t</title></head></html>", "AMP document must have a canonical link"),
            (
                r#"<html><head><link rel="canonical" href="  "></head></html>"#,
                "AMP document must have a valid canonical link",
            ),
        ];
        for (html, message) in cases {
            let result = AmpParser::new().parse(html, "https://example.com/", None);
            assert!(result.resource.is_none());
            let err = result.first_error().unwrap();
            assert!(err.is_invalid());
            assert_eq!(err.message, message);
        }
    }
}
