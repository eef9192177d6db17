// ABOUTME: RSS 0.9x/1.0/2.0 driver: channel properties and items with content, links, authors and media.
// ABOUTME: Prefers content:encoded over a shorter description and honours feedburner:origLink.

use pagesift_core::clean::ContentCleaner;
use pagesift_core::date::parse_feed_date;
use pagesift_core::dom::Element;
use pagesift_core::model::{Author, Entry, Image, Resource};
use pagesift_core::parsers::ContentParser;
use pagesift_core::result::ParseResult;
use pagesift_core::safelist::Safelist;
use pagesift_core::util::{http_url, protocol};

use crate::common::{add_image_link, parse_feed, set_content};

/// Enclosure types accepted as images.
const IMAGE_ENCLOSURE_TYPES: &[&str] = &["image/png", "image/jpg", "image/jpeg", "image/gif"];

#[derive(Debug, Clone, Copy, Default)]
pub struct RssParser;

impl RssParser {
    pub const NAME: &'static str = "rss";
}

impl ContentParser for RssParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(
        &self,
        content: &str,
        source_link: &str,
        cleaner: Option<&dyn ContentCleaner>,
    ) -> ParseResult {
        parse_feed(Self::NAME, content, source_link, |doc, resource| {
            for item in doc.descendants_named("item") {
                resource.add_entry(parse_item(item, source_link, cleaner));
            }
            parse_channel(doc, resource);
        })
    }
}

/// Channel properties come from the `channel` element's own children. RSS
/// 1.0 puts items beside the channel, so the document is the fallback.
fn parse_channel(doc: &Element, resource: &mut Resource) {
    let channel = doc.first_named("channel").unwrap_or(doc);
    let text = |name: &str| channel.child_named(name).map(Element::text).unwrap_or_default();
    resource.title = text("title");
    resource.description = text("description");
    resource.rights = text("copyright");
    resource.published = parse_feed_date(&text("pubDate"));
    resource.updated = parse_feed_date(&text("lastBuildDate"));
    let site_link = text("link");

    let protocol = protocol(&resource.source_link);
    let protocol = protocol.as_deref();
    if let Some(link) = http_url(&site_link, protocol) {
        resource.site_link = link;
    }

    if let Some(image) = doc.first_named("image") {
        let link = http_url(&image.child_text("link"), protocol)
            .or_else(|| http_url(&image.child_text("url"), protocol))
            .or_else(|| http_url(image.attr_or_empty("rdf:resource"), protocol));
        if let Some(link) = link {
            resource.icon = Some(Image::new(link));
        }
    }
}

fn parse_item(item: &Element, base_uri: &str, cleaner: Option<&dyn ContentCleaner>) -> Entry {
    let mut entry = Entry::new().with_title(item.child_text("title"));

    let description = item.child_text("description");
    let encoded = item.child_text("content:encoded");
    let content = if encoded.len() > description.len() {
        if !description.is_empty() {
            entry.summary = Safelist::basic().clean(&description);
        }
        encoded
    } else {
        description
    };
    set_content(&mut entry, &content, base_uri, cleaner);

    let protocol = protocol(base_uri);
    let protocol = protocol.as_deref();
    let mut link = http_url(&item.child_text("link"), protocol);
    if link.is_none() {
        if let Some(guid) = item.first_named("guid") {
            if !guid.attr_or_empty("isPermaLink").eq_ignore_ascii_case("false") {
                link = http_url(&guid.text(), protocol);
            }
        }
    }
    if let Some(link) = &link {
        entry.canonical_link = link.clone();
    }
    if let Some(orig) = http_url(&item.child_text("feedburner:origLink"), protocol) {
        entry.canonical_link = orig;
        if let Some(link) = link {
            entry.add_alt_link(link);
        }
    }

    if let Some(author) = item_author(item) {
        entry.add_author(author);
    }

    let published = item
        .first_named("pubDate")
        .or_else(|| item.first_named("dc:date"));
    if let Some(published) = published {
        entry.published = parse_feed_date(&published.text());
    }

    for category in item.descendants_named("category") {
        entry.add_tag(category.text());
    }

    add_media(item, &mut entry, protocol);
    entry
}

/// `dc:creator` wins. Otherwise `author` holds an email, optionally followed
/// by a name in parentheses, or just a name.
fn item_author(item: &Element) -> Option<Author> {
    let creator = item.child_text("dc:creator");
    if !creator.is_empty() {
        return Some(Author::new(creator));
    }
    let raw = item.child_text("author");
    if raw.is_empty() {
        return None;
    }
    let (name, email) = match raw.find('(').zip(raw.find(')')) {
        Some((open, close)) if open > 0 && close > open => (
            raw[open + 1..close].trim().to_string(),
            raw[..open].trim().to_string(),
        ),
        _ => (String::new(), raw.clone()),
    };
    match raw.find('@') {
        Some(at) if at > 0 => Some(Author::new(name).with_email(email)),
        _ if name.is_empty() => Some(Author::new(raw)),
        _ => Some(Author::new(name)),
    }
}

fn add_media(item: &Element, entry: &mut Entry, protocol: Option<&str>) {
    for media in item.descendants_named("media:content") {
        let is_image = media.attr_or_empty("type").to_ascii_lowercase().starts_with("image/")
            || media.attr_or_empty("medium").eq_ignore_ascii_case("image");
        if !is_image {
            continue;
        }
        let Some(link) = http_url(media.attr_or_empty("url"), protocol) else {
            continue;
        };
        let mut image = Image::new(link);
        let title = media.child_text("media:title");
        if !title.is_empty() {
            image.title = title;
        }
        if let Ok(width) = media.attr_or_empty("width").parse() {
            image.width = width;
        }
        if let Ok(height) = media.attr_or_empty("height").parse() {
            image.height = height;
        }
        entry.add_image(image);
    }

    for enclosure in item.descendants_named("enclosure") {
        let media_type = enclosure.attr_or_empty("type").to_ascii_lowercase();
        if IMAGE_ENCLOSURE_TYPES.contains(&media_type.as_str()) {
            add_image_link(entry, enclosure.attr_or_empty("url"), protocol);
        }
    }

    for image_link in item.descendants_named("g:image_link") {
        add_image_link(entry, &image_link.text(), protocol);
    }
}
