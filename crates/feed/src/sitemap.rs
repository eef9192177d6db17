// ABOUTME: Sitemap reader for XML urlsets and plain one-URL-per-line files.
// ABOUTME: XML entries carry lastmod (ISO-8601) and changefreq; plain files are capped and skip comments.

use pagesift_core::date::parse_iso8601;
use pagesift_core::detect::is_invisible;
use pagesift_core::model::{ChangeFrequency, SitemapLink};

use crate::error::FeedError;
use crate::xml::parse_xml;

/// Most lines read from a plain sitemap.
pub const MAX_PLAIN_LINES: usize = 500;

/// Parses a sitemap. Content containing `<urlset` is read as XML, anything
/// else as a plain list of URLs.
///
/// A `lastmod` that is present but not ISO-8601 fails the whole sitemap.
pub fn parse_sitemap(content: &str) -> Result<Vec<SitemapLink>, FeedError> {
    if !content.contains("<urlset") {
        return Ok(parse_plain(content));
    }
    let doc = parse_xml(content)?;
    let mut links = Vec::new();
    for url in doc.descendants_named("url") {
        let loc = url.child_text("loc");
        if loc.is_empty() {
            continue;
        }
        let lastmod = url.child_text("lastmod");
        let last_modified = if lastmod.is_empty() {
            None
        } else {
            Some(parse_iso8601(&lastmod)?)
        };
        let frequency = ChangeFrequency::from(url.child_text("changefreq").as_str());
        links.push(SitemapLink::new(loc, last_modified, frequency));
    }
    tracing::debug!(links = links.len(), "parsed XML sitemap");
    Ok(links)
}

/// Splits on invisible characters and keeps every token that is not a
/// `#` comment. At most [`MAX_PLAIN_LINES`] tokens are read.
pub fn parse_plain(content: &str) -> Vec<SitemapLink> {
    content
        .split(is_invisible)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .take(MAX_PLAIN_LINES)
        .filter(|token| !token.starts_with('#'))
        .map(|token| SitemapLink::new(token, None, ChangeFrequency::Never))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn xml_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc><lastmod>2024-01-02T03:04:05Z</lastmod><changefreq>Daily</changefreq></url>
  <url><loc> </loc></url>
  <url><loc>https://example.com/about</loc></url>
</urlset>"#;
        let links = parse_sitemap(xml).unwrap();
        assert_eq!(
            links,
            vec![
                SitemapLink::new(
                    "https://example.com/",
                    Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
                    ChangeFrequency::Daily
                ),
                SitemapLink::new("https://example.com/about", None, ChangeFrequency::Never),
            ]
        );
    }

    #[test]
    fn bad_lastmod_fails() {
        let xml = "<urlset><url><loc>https://example.com/</loc><lastmod>yesterday</lastmod></url></urlset>";
        assert!(matches!(parse_sitemap(xml), Err(FeedError::Date(_))));
    }

    #[test]
    fn plain_lines_skip_comments() {
        let links = parse_plain("#sitemap\nhttps://example.com/a\r\n\n  https://example.com/b\u{200b}#x\n");
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
        assert!(links.iter().all(|l| l.change_frequency == ChangeFrequency::Never));
    }

    #[test]
    fn plain_lines_are_capped() {
        let content: String = (0..600).map(|i| format!("https://example.com/{}\n", i)).collect();
        let links = parse_sitemap(&content).unwrap();
        assert_eq!(links.len(), MAX_PLAIN_LINES);
        assert_eq!(links[499].url, "https://example.com/499");
    }
}
