// ABOUTME: HTML page parser: resolved metadata plus every anchor, image, video, audio and <link> in a page.
// ABOUTME: Relative links are resolved against the canonical link, falling back to the caller's default.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};
use serde::Serialize;
use url::Url;

use crate::dom::{normalize_space, Element};
use crate::metadata::candidates::{self, Candidate};
use crate::metadata::fields::{element_text, select_all};
use crate::metadata::media::parse_dimension;
use crate::metadata::{best_canonical_link, embedded, resolve_metadata};
use crate::model::{Anchor, Audio, DataUri, Image, Link, Video};
use crate::util::{abs_url, is_http_url};

pub const RSS_TYPE: &str = "application/rss+xml";
pub const ATOM_TYPE: &str = "application/atom+xml";

/// Icon `rel` values in order of preference.
pub const ICON_RELS: &[&str] = &["apple-touch-icon-precomposed", "icon", "shortcut icon"];

/// Everything the page parser extracts from one HTML document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub canonical_link: String,
    pub self_links: Vec<Link>,
    pub site_name: String,
    pub title: String,
    pub summary: String,
    pub author: String,
    pub publish_time: Option<DateTime<Utc>>,
    pub anchors: Vec<Anchor>,
    pub meta_images: Vec<Image>,
    pub images: Vec<Image>,
    pub links: Vec<Link>,
    pub meta_videos: Vec<Video>,
    pub videos: Vec<Video>,
    pub meta_audios: Vec<Audio>,
    pub audios: Vec<Audio>,
}

impl Page {
    /// `<link>` elements with the given `rel` token and/or media type.
    pub fn links(&self, rel: Option<&str>, media_type: Option<&str>) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|link| rel.map_or(true, |rel| has_rel(link, rel)))
            .filter(|link| {
                media_type.map_or(true, |t| link.media_type.eq_ignore_ascii_case(t))
            })
            .collect()
    }

    /// RSS and Atom feeds advertised by the page.
    pub fn feed_links(&self) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|link| {
                link.media_type.eq_ignore_ascii_case(RSS_TYPE)
                    || link.media_type.eq_ignore_ascii_case(ATOM_TYPE)
            })
            .collect()
    }

    /// The AMP version of this page, if advertised.
    pub fn amp_link(&self) -> Option<&str> {
        self.links(Some("amphtml"), None)
            .first()
            .map(|link| link.href.as_str())
    }

    /// The preferred icon among [`ICON_RELS`].
    pub fn icon(&self) -> Option<&Link> {
        ICON_RELS.iter().find_map(|rel| {
            self.links
                .iter()
                .find(|link| link.rel.trim().eq_ignore_ascii_case(rel))
        })
    }
}

fn has_rel(link: &Link, rel: &str) -> bool {
    link.rel.eq_ignore_ascii_case(rel)
        || link
            .rel
            .split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case(rel))
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Parses `doc`. `default_canonical` stands in for the canonical link when the
/// page does not state one, and is always reported as a self link.
pub fn parse_page(doc: &Html, default_canonical: &str) -> Page {
    let aux = embedded::collect(doc);
    let default_url = Url::parse(default_canonical).ok();

    let mut canonical_link = best_canonical_link(doc, &aux, default_url.as_ref());
    if canonical_link.is_empty() {
        canonical_link = default_canonical.to_string();
    }
    let base = Url::parse(&canonical_link).ok().or(default_url);
    let base = base.as_ref();
    let metadata = resolve_metadata(doc, &aux, base);

    let mut page = Page {
        self_links: self_links(doc, &aux, base, &canonical_link, default_canonical),
        canonical_link,
        site_name: metadata.site_name,
        title: metadata.title,
        summary: metadata.summary,
        author: metadata.author,
        publish_time: metadata.publish_time,
        anchors: anchors(doc, base),
        links: links(doc, base),
        ..Page::default()
    };

    page.images = metadata.images.clone();
    for image in body_images(doc, base) {
        push_unique(&mut page.images, image);
    }
    page.meta_images = metadata.images;

    page.videos = metadata.videos.clone();
    for video in body_videos(doc, base) {
        push_unique(&mut page.videos, video);
    }
    page.meta_videos = metadata.videos;

    page.audios = metadata.audios.clone();
    for audio in body_audios(doc, base) {
        push_unique(&mut page.audios, audio);
    }
    page.meta_audios = metadata.audios;

    tracing::debug!(
        canonical = %page.canonical_link,
        anchors = page.anchors.len(),
        images = page.images.len(),
        links = page.links.len(),
        "parsed page"
    );
    page
}

fn attr<'a>(el: &ElementRef<'a>, name: &str) -> &'a str {
    el.value().attr(name).map(str::trim).unwrap_or_default()
}

fn own_text(el: &ElementRef<'_>) -> String {
    let raw: Vec<&str> = el
        .children()
        .filter_map(|child| child.value().as_text().map(|t| &**t))
        .collect();
    normalize_space(&raw.join(" "))
}

pub(crate) fn anchors(doc: &Html, base: Option<&Url>) -> Vec<Anchor> {
    let mut out = Vec::new();
    for a in select_all(doc, "a[href]") {
        let Some(href) = abs_url(base, attr(&a, "href")) else {
            continue;
        };
        push_unique(&mut out, Anchor::new(href, attr(&a, "title"), element_text(a)));
    }
    out
}

pub(crate) fn body_images(doc: &Html, base: Option<&Url>) -> Vec<Image> {
    let mut out = Vec::new();
    for img in select_all(doc, "img[src]") {
        let src = attr(&img, "src");
        let link = if src.starts_with("data:") {
            match DataUri::parse(src) {
                Ok(uri) if uri.is_image() && !uri.data.is_empty() => src.to_string(),
                Ok(_) => continue,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping data URI image");
                    continue;
                }
            }
        } else {
            match abs_url(base, src) {
                Some(link) => link,
                None => continue,
            }
        };
        let image = Image::new(link)
            .with_alt_text(attr(&img, "alt"))
            .with_title(attr(&img, "title"))
            .with_size(parse_dimension(attr(&img, "width")), parse_dimension(attr(&img, "height")));
        push_unique(&mut out, image);
    }
    out
}

/// `(link, type)` pairs of a media element: its own `src` and its `<source>` children.
fn media_sources(el: &ElementRef<'_>, base: Option<&Url>) -> Vec<(String, String)> {
    let mut sources = Vec::new();
    if let Some(link) = abs_url(base, attr(el, "src")) {
        sources.push((link, attr(el, "type").to_string()));
    }
    for source in el.children().filter_map(ElementRef::wrap) {
        if !source.value().name().eq_ignore_ascii_case("source") {
            continue;
        }
        if let Some(link) = abs_url(base, attr(&source, "src")) {
            sources.push((link, attr(&source, "type").to_string()));
        }
    }
    sources
}

pub(crate) fn body_videos(doc: &Html, base: Option<&Url>) -> Vec<Video> {
    let mut out = Vec::new();
    for video in select_all(doc, "video") {
        let width = parse_dimension(attr(&video, "width"));
        let height = parse_dimension(attr(&video, "height"));
        let alt = own_text(&video);
        for (link, media_type) in media_sources(&video, base) {
            let item = Video::new(link)
                .with_size(width, height)
                .with_title(attr(&video, "title"))
                .with_alt_text(alt.as_str())
                .with_media_type(media_type);
            push_unique(&mut out, item);
        }
    }
    out
}

pub(crate) fn body_audios(doc: &Html, base: Option<&Url>) -> Vec<Audio> {
    let mut out = Vec::new();
    for audio in select_all(doc, "audio") {
        let alt = own_text(&audio);
        for (link, media_type) in media_sources(&audio, base) {
            let item = Audio::new(link)
                .with_title(attr(&audio, "title"))
                .with_alt_text(alt.as_str())
                .with_media_type(media_type);
            push_unique(&mut out, item);
        }
    }
    out
}

fn links(doc: &Html, base: Option<&Url>) -> Vec<Link> {
    let mut out = Vec::new();
    for el in select_all(doc, "link[href]") {
        let Some(href) = abs_url(base, attr(&el, "href")) else {
            continue;
        };
        let link = Link::new(href)
            .with_rel(attr(&el, "rel"))
            .with_media_type(attr(&el, "type"))
            .with_title(attr(&el, "title"));
        push_unique(&mut out, link);
    }
    out
}

fn self_links(
    doc: &Html,
    aux: &Element,
    base: Option<&Url>,
    canonical_link: &str,
    default_canonical: &str,
) -> Vec<Link> {
    let mut out = Vec::new();
    let mut add = |href: &str| {
        if let Some(href) = abs_url(base, href) {
            push_unique(
                &mut out,
                Link::new(href).with_rel("self").with_media_type("text/html"),
            );
        }
    };
    add(canonical_link);
    let sources = candidates::ALT_SELF_LINKS
        .iter()
        .chain(candidates::CANONICAL_LINK.iter())
        .filter(|c| !matches!(c, Candidate::Attr(css, _) if css.contains("canonical")));
    for candidate in sources {
        if let Some(value) = candidate.value(doc, aux) {
            if candidate.is_aux() && !is_http_url(&value) {
                continue;
            }
            add(&value);
        }
    }
    add(default_canonical);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head>
        <title>A Story</title>
        <link rel="canonical" href="https://example.com/story">
        <link rel="shortlink" href="https://ex.co/s1">
        <link rel="alternate" type="application/rss+xml" title="Feed" href="/feed.xml">
        <link rel="alternate" type="application/atom+xml" href="/atom.xml">
        <link rel="amphtml" href="/story/amp">
        <link rel="icon" href="/favicon.ico">
        <link rel="apple-touch-icon-precomposed" href="/touch.png">
        <meta property="og:url" content="https://example.com/story?ref=og">
        <meta property="og:image" content="/lead.jpg">
        </head><body>
        <a href="/one" title="One">First  link</a>
        <a href="/one" title="One">First  link</a>
        <a href="https://other.com/two">Two</a>
        <img src="/lead.jpg">
        <img src="/inline.png" alt="Inline" width="300" height="x">
        <img src="data:image/png;base64,iVBORw0KGgo=" alt="dot">
        <img src="data:text/plain;base64,aGk=">
        <video width="640" height="360" title="Clip">Your browser
          <source src="/clip.mp4" type="video/mp4">
          <source src="/clip.webm" type="video/webm">
        </video>
        <audio src="/pod.mp3" title="Pod">Listen</audio>
        </body></html>"#;

    fn page() -> Page {
        parse_page(&Html::parse_document(PAGE), "https://example.com/fallback")
    }

    #[test]
    fn anchors_are_absolute_and_deduplicated() {
        let page = page();
        assert_eq!(
            page.anchors,
            vec![
                Anchor::new("https://example.com/one", "One", "First link"),
                Anchor::new("https://other.com/two", "", "Two"),
            ]
        );
    }

    #[test]
    fn meta_images_come_first() {
        let page = page();
        let links: Vec<&str> = page.images.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/lead.jpg",
                "https://example.com/inline.png",
                "data:image/png;base64,iVBORw0KGgo=",
            ]
        );
        assert_eq!(page.meta_images.len(), 1);
        assert_eq!(page.images[1].width, 300);
        assert_eq!(page.images[1].height, 0);
        assert_eq!(page.images[2].alt_text, "dot");
    }

    #[test]
    fn video_and_audio_sources() {
        let page = page();
        assert_eq!(page.videos.len(), 2);
        assert_eq!(page.videos[0].link, "https://example.com/clip.mp4");
        assert_eq!(page.videos[0].media_type, "video/mp4");
        assert_eq!(page.videos[0].width, 640);
        assert_eq!(page.videos[0].alt_text, "Your browser");
        assert_eq!(page.audios.len(), 1);
        assert_eq!(page.audios[0].title, "Pod");
        assert_eq!(page.audios[0].alt_text, "Listen");
    }

    #[test]
    fn links_feeds_icon_and_amp() {
        let page = page();
        assert_eq!(page.canonical_link, "https://example.com/story");
        let feeds: Vec<&str> = page.feed_links().iter().map(|l| l.href.as_str()).collect();
        assert_eq!(feeds, vec!["https://example.com/feed.xml", "https://example.com/atom.xml"]);
        assert_eq!(page.links(Some("alternate"), Some(RSS_TYPE)).len(), 1);
        assert_eq!(page.amp_link(), Some("https://example.com/story/amp"));
        assert_eq!(page.icon().map(|l| l.href.as_str()), Some("https://example.com/touch.png"));
    }

    #[test]
    fn self_links_include_the_default() {
        let page = page();
        let hrefs: Vec<&str> = page.self_links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec![
                "https://example.com/story",
                "https://ex.co/s1",
                "https://example.com/story?ref=og",
                "https://example.com/fallback",
            ]
        );
        assert!(page.self_links.iter().all(|l| l.rel == "self"));
    }

    #[test]
    fn default_canonical_is_used_without_one() {
        let page = parse_page(
            &Html::parse_document("<html><head><title>t</title></head><body><a href='x'>x</a></body></html>"),
            "https://example.com/dir/page",
        );
        assert_eq!(page.canonical_link, "https://example.com/dir/page");
        assert_eq!(page.anchors[0].href, "https://example.com/dir/x");
    }
}
