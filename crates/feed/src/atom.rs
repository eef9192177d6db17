// ABOUTME: Atom (and legacy 0.3) driver: feed title, subtitle and updated time plus entries.
// ABOUTME: Serializes xhtml text constructs, backfills published from updated and collects image enclosures.

use pagesift_core::clean::ContentCleaner;
use pagesift_core::date::{parse_date_time, try_parse_iso8601};
use pagesift_core::dom::{render_children, Element};
use pagesift_core::model::{Author, Entry, Image, Resource};
use pagesift_core::parsers::ContentParser;
use pagesift_core::result::ParseResult;
use pagesift_core::util::{abs_url, is_http_url};
use url::Url;

use crate::common::{parse_feed, set_content};

/// Enclosure types accepted as images.
const IMAGE_ENCLOSURE_TYPES: &[&str] = &["image/gif", "image/png", "image/jpeg", "image/jpe", "image/jpg"];

#[derive(Debug, Clone, Copy, Default)]
pub struct AtomParser;

impl AtomParser {
    pub const NAME: &'static str = "atom";
}

impl ContentParser for AtomParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(
        &self,
        content: &str,
        source_link: &str,
        cleaner: Option<&dyn ContentCleaner>,
    ) -> ParseResult {
        let base = Url::parse(source_link).ok();
        parse_feed(Self::NAME, content, source_link, |doc, resource| {
            for entry in doc.descendants_named("entry") {
                resource.add_entry(parse_entry(entry, source_link, base.as_ref(), cleaner));
            }
            parse_source(doc, resource);
        })
    }
}

fn parse_source(doc: &Element, resource: &mut Resource) {
    let feed = doc.first_named("feed").unwrap_or(doc);
    let own = |name: &str| feed.child_named(name).map(construct_text).unwrap_or_default();

    resource.title = own("title");
    resource.subtitle = own("subtitle");
    resource.updated = try_parse_iso8601(&own("updated"));
    resource.description = match resource.subtitle.as_str() {
        "" => own("tagline"),
        subtitle => subtitle.to_string(),
    };
}

fn parse_entry(
    el: &Element,
    source_link: &str,
    base: Option<&Url>,
    cleaner: Option<&dyn ContentCleaner>,
) -> Entry {
    let mut entry = Entry::new().with_title(child_construct(el, "title"));

    let alternate = el
        .descendants_named("link")
        .into_iter()
        .filter(|link| is_alternate(link))
        .map(|link| link.attr_or_empty("href"))
        .find(|href| !href.is_empty());
    if let Some(href) = alternate {
        entry.canonical_link = abs_url(base, href).unwrap_or_else(|| href.to_string());
    }
    let orig = el
        .descendants_named("feedburner:origLink")
        .into_iter()
        .map(Element::text)
        .find(|href| !href.is_empty());
    if let Some(orig) = orig {
        entry.canonical_link = orig;
    }

    entry.published = parse_date_time(&child_construct(el, "published"))
        .or_else(|| parse_date_time(&child_construct(el, "issued")));
    entry.updated = parse_date_time(&child_construct(el, "updated"));
    if entry.published.is_none() {
        entry.published = entry.updated;
    }

    let author = el
        .descendants_named("author")
        .into_iter()
        .find(|author| !author.child_text("name").is_empty());
    if let Some(author) = author {
        let email = author.child_text("email");
        let mut built = Author::new(author.child_text("name"));
        if !email.is_empty() {
            built = built.with_email(email);
        }
        entry.add_author(built);
    }

    entry.summary = child_construct(el, "summary");
    let content = child_construct(el, "content");
    set_content(&mut entry, &content, source_link, cleaner);

    for category in el.descendants_named("category") {
        let term = category.attr_or_empty("term");
        let name = if term.is_empty() { category.attr_or_empty("label") } else { term };
        entry.add_tag(name);
    }

    for link in el.descendants_named("link") {
        if !link.attr_or_empty("rel").eq_ignore_ascii_case("enclosure") {
            continue;
        }
        let media_type = link.attr_or_empty("type").to_ascii_lowercase();
        let href = link.attr_or_empty("href");
        if IMAGE_ENCLOSURE_TYPES.contains(&media_type.as_str()) && is_http_url(href) {
            entry.add_image(Image::new(href));
        }
    }

    entry
}

/// A link without `rel` is an alternate link.
fn is_alternate(link: &Element) -> bool {
    match link.attr("rel") {
        None => true,
        Some(rel) => rel.trim().eq_ignore_ascii_case("alternate"),
    }
}

fn child_construct(el: &Element, name: &str) -> String {
    el.first_named(name).map(construct_text).unwrap_or_default()
}

/// Text of an Atom text construct. `type="xhtml"` content is the markup
/// inside its wrapping `div`.
fn construct_text(el: &Element) -> String {
    if el.attr_or_empty("type").eq_ignore_ascii_case("xhtml") {
        el.first_named("div")
            .map(|div| render_children(div).trim().to_string())
            .unwrap_or_default()
    } else {
        el.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pagesift_core::clean::DefaultContentCleaner;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Feed</title>
  <subtitle>Things happen</subtitle>
  <updated>2003-12-13T18:30:02Z</updated>
  <link href="http://example.org/"/>
  <entry>
    <title type="html">Atom-Powered &lt;b&gt;Robots&lt;/b&gt; Run Amok</title>
    <link rel="self" href="http://example.org/self/1"/>
    <link rel="alternate" href="/2003/12/13/atom03"/>
    <link rel="enclosure" type="image/jpeg" href="http://example.org/robot.jpg"/>
    <link rel="enclosure" type="audio/mpeg" href="http://example.org/robot.mp3"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2003-12-13T18:30:02Z</updated>
    <author><uri>http://example.org/anon</uri></author>
    <author><name>John Doe</name><email>john@example.org</email></author>
    <summary>Some text.</summary>
    <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><p>Hello <b>robots</b></p><script>x()</script></div></content>
    <category term="robots"/><category label="Robots"/><category term="robots"/>
  </entry>
  <entry>
    <title>Second</title>
    <link href="http://example.org/2"/>
    <feedburner:origLink>http://origin.example.org/2</feedburner:origLink>
    <published>Sat, 13 Dec 2003 10:00:00 GMT</published>
    <updated>2003-12-14T00:00:00Z</updated>
    <content type="html">&lt;p&gt;Escaped&lt;/p&gt;</content>
  </entry>
</feed>"#;

    fn parse(cleaner: Option<&dyn ContentCleaner>) -> Resource {
        AtomParser
            .parse(FEED, "http://example.org/feed.atom", cleaner)
            .into_result()
            .unwrap()
    }

    #[test]
    fn feed_properties() {
        let resource = parse(None);
        assert_eq!(resource.title, "Example Feed");
        assert_eq!(resource.subtitle, "Things happen");
        assert_eq!(resource.description, "Things happen");
        assert_eq!(resource.updated, Some(Utc.with_ymd_and_hms(2003, 12, 13, 18, 30, 2).unwrap()));
        assert_eq!(resource.entries.len(), 2);
    }

    #[test]
    fn legacy_tagline_is_the_description() {
        let result = AtomParser.parse(
            r#"<feed version="0.3"><title>Old</title><tagline>Legacy</tagline></feed>"#,
            "http://example.org/",
            None,
        );
        let resource = result.into_result().unwrap();
        assert_eq!(resource.subtitle, "");
        assert_eq!(resource.description, "Legacy");
    }

    #[test]
    fn entry_fields() {
        let entry = parse(None).entries.remove(0);
        assert_eq!(entry.title, "Atom-Powered <b>Robots</b> Run Amok");
        assert_eq!(entry.canonical_link, "http://example.org/2003/12/13/atom03");
        assert_eq!(entry.authors.len(), 1);
        assert_eq!(entry.authors[0].name, "John Doe");
        assert_eq!(entry.authors[0].email, "john@example.org");
        assert_eq!(entry.summary, "Some text.");
        assert_eq!(entry.tags, vec!["robots".to_string(), "Robots".to_string()]);
        assert_eq!(entry.images.len(), 1);
        assert_eq!(entry.primary_image.unwrap().link, "http://example.org/robot.jpg");
    }

    #[test]
    fn published_backfills_from_updated() {
        let entry = parse(None).entries.remove(0);
        let updated = Utc.with_ymd_and_hms(2003, 12, 13, 18, 30, 2).unwrap();
        assert_eq!(entry.updated, Some(updated));
        assert_eq!(entry.published, Some(updated));
    }

    #[test]
    fn rfc822_published_and_orig_link() {
        let entry = parse(None).entries.remove(1);
        assert_eq!(entry.published, Some(Utc.with_ymd_and_hms(2003, 12, 13, 10, 0, 0).unwrap()));
        assert_eq!(entry.canonical_link, "http://origin.example.org/2");
        assert_eq!(entry.clean_content, "<p>Escaped</p>");
    }

    #[test]
    fn xhtml_content_is_serialized_and_cleaned() {
        let cleaner = DefaultContentCleaner::new();
        let entry = parse(Some(&cleaner)).entries.remove(0);
        assert!(entry.clean_content.contains("<p>Hello <b>robots</b></p>"));
        assert!(!entry.clean_content.contains("script"));
        assert!(entry.original_content.unwrap().contains("<script>"));
    }
}
