// ABOUTME: Metadata resolver: picks title, author, canonical link, summary, site name, publish time and media.
// ABOUTME: Each field walks an ordered candidate table (embedded JSON, meta tags, body text); first valid wins.

//! Multi-source metadata resolution.
//!
//! A page usually states the same fact several times: in JSON-LD, in Open
//! Graph and Twitter meta tags, in Dublin Core tags and in the visible byline.
//! [`resolve_metadata`] consults these sources in a fixed order per field and
//! keeps the first value that passes the field's validator. Resolution never
//! fails; a field nobody states is empty.

pub mod candidates;
pub mod compiled;
pub mod embedded;
pub mod fields;
pub mod media;

use chrono::{DateTime, Utc};
use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::date::parse_date_time;
use crate::dom::Element;
use crate::model::{Audio, Image, Video};
use crate::util::{abs_url, is_http_url};
use candidates::{first_valid, Candidate};

/// Resolved page metadata. Empty strings mean unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub canonical_link: String,
    pub summary: String,
    pub site_name: String,
    pub publish_time: Option<DateTime<Utc>>,
    pub images: Vec<Image>,
    pub videos: Vec<Video>,
    pub audios: Vec<Audio>,
}

/// Resolves every metadata field of `doc`.
///
/// `aux` is the tree built by [`embedded::collect`]. `base` resolves relative
/// links and decides host-specific rules.
pub fn resolve_metadata(doc: &Html, aux: &Element, base: Option<&Url>) -> Metadata {
    let title = best_title(doc, aux);
    let author = match base.and_then(Url::host_str) {
        Some(host) => best_author_for_host(doc, aux, host, &title),
        None => best_author(doc, aux),
    };
    let metadata = Metadata {
        author,
        canonical_link: best_canonical_link(doc, aux, base),
        summary: best_summary(doc, aux),
        site_name: best_site_name(doc, aux),
        publish_time: best_publish_time(doc, aux),
        images: media::meta_images(doc, aux, base),
        videos: media::meta_videos(doc, base),
        audios: media::meta_audios(doc, base),
        title,
    };
    tracing::trace!(
        title = %metadata.title,
        canonical = %metadata.canonical_link,
        images = metadata.images.len(),
        "resolved metadata"
    );
    metadata
}

/// Parses `html` and resolves its metadata. `url` is where the page came
/// from, if known.
pub fn resolve_html(html: &str, url: Option<&str>) -> Metadata {
    let doc = Html::parse_document(html);
    let aux = embedded::collect(&doc);
    let base = url.and_then(|u| Url::parse(u.trim()).ok());
    resolve_metadata(&doc, &aux, base.as_ref())
}

fn first_string(table: &[Candidate], doc: &Html, aux: &Element) -> String {
    first_valid(table, doc, aux, |_, value| Some(value)).unwrap_or_default()
}

pub fn best_title(doc: &Html, aux: &Element) -> String {
    first_string(candidates::TITLE, doc, aux)
}

pub fn best_summary(doc: &Html, aux: &Element) -> String {
    first_string(candidates::SUMMARY, doc, aux)
}

pub fn best_site_name(doc: &Html, aux: &Element) -> String {
    first_string(candidates::SITE_NAME, doc, aux)
}

pub fn best_author(doc: &Html, aux: &Element) -> String {
    first_valid(candidates::AUTHOR, doc, aux, |_, value| {
        is_valid_author(&value).then_some(value)
    })
    .unwrap_or_default()
}

/// Author with host-specific rules applied first.
///
/// Twitter status pages title themselves "Name on Twitter: ...", which names
/// the author more reliably than any tag on the page.
pub fn best_author_for_host(doc: &Html, aux: &Element, host: &str, title: &str) -> String {
    if host.eq_ignore_ascii_case("twitter.com") {
        if let Some(idx) = title.to_lowercase().rfind("on twitter") {
            if idx > 0 {
                if let Some(prefix) = title.get(..idx) {
                    return prefix.trim().to_string();
                }
            }
        }
    }
    best_author(doc, aux)
}

/// A plausible author name: non-empty, not a link, fewer than three spaces.
pub fn is_valid_author(author: &str) -> bool {
    let author = author.trim();
    !author.is_empty()
        && !author.starts_with("http://")
        && !author.starts_with("https://")
        && author.chars().filter(|c| c.is_whitespace()).count() < 3
}

/// Canonical link made absolute against `base`. Embedded JSON links only
/// count when they are already absolute http(s) links.
pub fn best_canonical_link(doc: &Html, aux: &Element, base: Option<&Url>) -> String {
    first_valid(candidates::CANONICAL_LINK, doc, aux, |candidate, value| {
        if candidate.is_aux() {
            is_http_url(&value).then_some(value)
        } else {
            abs_url(base, &value)
        }
    })
    .unwrap_or_default()
}

pub fn best_publish_time(doc: &Html, aux: &Element) -> Option<DateTime<Utc>> {
    first_valid(candidates::PUBLISH_TIME, doc, aux, |_, value| {
        parse_date_time(&value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn resolve(html: &str, base: &str) -> Metadata {
        let doc = Html::parse_document(html);
        let aux = embedded::collect(&doc);
        let base = Url::parse(base).unwrap();
        resolve_metadata(&doc, &aux, Some(&base))
    }

    #[test]
    fn embedded_json_outranks_meta_tags() {
        let meta = resolve(
            r#"<html><head>
            <title>Doc Title</title>
            <meta property="og:title" content="OG Title">
            <script type="application/ld+json">
              {"@context":"https://schema.org","headline":"LD Headline",
               "author":{"@type":"Person","name":"Jane Doe"},
               "datePublished":"2020-03-04T05:06:07Z"}
            </script>
            <meta name="author" content="Meta Author">
            <meta property="article:published_time" content="2019-01-01T00:00:00Z">
            </head><body></body></html>"#,
            "https://example.com/a",
        );
        assert_eq!(meta.title, "LD Headline");
        assert_eq!(meta.author, "Jane Doe");
        assert_eq!(
            meta.publish_time,
            Some(Utc.with_ymd_and_hms(2020, 3, 4, 5, 6, 7).unwrap())
        );
    }

    #[test]
    fn falls_back_through_meta_to_document_title() {
        let meta = resolve(
            "<html><head><title> Only  Title </title></head><body></body></html>",
            "https://example.com/",
        );
        assert_eq!(meta.title, "Only Title");
        assert_eq!(meta.author, "");
        assert_eq!(meta.canonical_link, "");
        assert_eq!(meta.publish_time, None);
    }

    #[test]
    fn author_validation() {
        assert!(is_valid_author("Jane Doe"));
        assert!(is_valid_author("Jean Claude van"));
        assert!(!is_valid_author(""));
        assert!(!is_valid_author("https://example.com/jane"));
        assert!(!is_valid_author("By the staff of the paper"));
    }

    #[test]
    fn invalid_authors_fall_through_to_byline() {
        let meta = resolve(
            r#"<html><head>
            <meta name="author" content="http://example.com/me">
            <meta name="twitter:creator" content="posted by the whole team">
            </head><body><a rel="author" href="/u/1">Sam  Smith</a></body></html>"#,
            "https://example.com/",
        );
        assert_eq!(meta.author, "Sam Smith");
    }

    #[test]
    fn twitter_titles_name_the_author() {
        let meta = resolve(
            r#"<html><head><title>Jack on Twitter: "just setting up"</title>
            <meta name="author" content="Someone Else"></head><body></body></html>"#,
            "https://twitter.com/jack/status/20",
        );
        assert_eq!(meta.author, "Jack");

        let other = resolve(
            r#"<html><head><title>Jack on Twitter</title>
            <meta name="author" content="Someone Else"></head><body></body></html>"#,
            "https://example.com/",
        );
        assert_eq!(other.author, "Someone Else");
    }

    #[test]
    fn canonical_links_are_absolute() {
        let meta = resolve(
            r#"<html><head><link rel="canonical" href="/story?id=1"></head><body></body></html>"#,
            "https://example.com/amp/story",
        );
        assert_eq!(meta.canonical_link, "https://example.com/story?id=1");

        let aux_only = resolve(
            r#"<html><head><meta name="parsely-page" content='{"link":"/relative"}'></head></html>"#,
            "https://example.com/",
        );
        assert_eq!(aux_only.canonical_link, "");
    }

    #[test]
    fn unparseable_dates_fall_through() {
        let meta = resolve(
            r#"<html><head>
            <meta property="article:published_time" content="last tuesday">
            <meta name="date" content="Tue, 10 Jun 2003 04:00:00 GMT">
            </head></html>"#,
            "https://example.com/",
        );
        assert_eq!(
            meta.publish_time,
            Some(Utc.with_ymd_and_hms(2003, 6, 10, 4, 0, 0).unwrap())
        );
    }

    #[test]
    fn overflowing_dates_fall_through() {
        let meta = resolve(
            r#"<html><head>
            <meta property="article:published_time" content="Wed, 02 Oct 99999999999999999 01:00:00 GMT">
            <meta name="pubDate" content="Wed, 2147483647 Dec 2147483647 23:59:59 GMT">
            <meta name="date" content="Tue, 10 Jun 2003 04:00:00 GMT">
            </head></html>"#,
            "https://example.com/",
        );
        assert_eq!(
            meta.publish_time,
            Some(Utc.with_ymd_and_hms(2003, 6, 10, 4, 0, 0).unwrap())
        );
    }

    #[test]
    fn summary_and_site_name() {
        let meta = resolve(
            r#"<html><head>
            <meta property="og:description" content="OG summary">
            <meta name="description" content="Plain summary">
            <meta property="og:site_name" content="Example News">
            </head></html>"#,
            "https://example.com/",
        );
        assert_eq!(meta.summary, "Plain summary");
        assert_eq!(meta.site_name, "Example News");
    }

    #[test]
    fn resolves_from_raw_html() {
        let meta = resolve_html(
            r#"<html><head><meta property="og:title" content="Raw"><link rel="canonical" href="/c"></head></html>"#,
            Some("https://example.com/page"),
        );
        assert_eq!(meta.title, "Raw");
        assert_eq!(meta.canonical_link, "https://example.com/c");
    }
}
