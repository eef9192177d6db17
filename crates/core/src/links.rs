// ABOUTME: Collects every distinct outbound link in a page: anchors, images, video, audio and quote citations.
// ABOUTME: Links are de-duplicated through a caller-supplied canonicalization function.

use std::collections::HashSet;

use scraper::Html;
use url::Url;

use crate::metadata::fields::select_all;
use crate::model::{Anchor, Audio, Image, Video};
use crate::page::{anchors, body_audios, body_images, body_videos};

type Canonicalize = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Accumulates unique links across one or more documents.
///
/// The source link and any skip links are treated as already seen, so a page
/// never reports itself. Two links are the same when their canonical forms
/// match.
pub struct LinkExtractor {
    base: Option<Url>,
    default_protocol: &'static str,
    canonicalize: Canonicalize,
    seen: HashSet<String>,
    links: Vec<String>,
    anchors: Vec<Anchor>,
    images: Vec<Image>,
    videos: Vec<Video>,
    audio: Vec<Audio>,
}

impl LinkExtractor {
    pub fn new(source_link: &str) -> Self {
        Self::with_canonicalizer(source_link, std::iter::empty::<&str>(), |link| link.to_string())
    }

    pub fn with_skip_links<I, S>(source_link: &str, skip_links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_canonicalizer(source_link, skip_links, |link| link.to_string())
    }

    pub fn with_canonicalizer<I, S, F>(source_link: &str, skip_links: I, canonicalize: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let source_link = source_link.trim();
        let mut extractor = Self {
            base: Url::parse(source_link).ok(),
            default_protocol: if source_link.starts_with("http:") { "http:" } else { "https:" },
            canonicalize: Box::new(canonicalize),
            seen: HashSet::with_capacity(32),
            links: Vec::new(),
            anchors: Vec::new(),
            images: Vec::new(),
            videos: Vec::new(),
            audio: Vec::new(),
        };
        if !source_link.is_empty() {
            extractor.ignore(source_link);
        }
        for link in skip_links {
            extractor.ignore(link.as_ref());
        }
        extractor
    }

    /// Adds every unseen link in `doc`. Relative links resolve against the
    /// source link.
    pub fn extract_links(&mut self, doc: &Html) -> &mut Self {
        let base = self.base.clone();
        let base = base.as_ref();
        for anchor in anchors(doc, base) {
            if self.mark(&anchor.href) {
                self.anchors.push(anchor);
            }
        }
        for image in body_images(doc, base) {
            if self.mark(&image.link) {
                self.images.push(image);
            }
        }
        for video in body_videos(doc, base) {
            if self.mark(&video.link) {
                self.videos.push(video);
            }
        }
        for audio in body_audios(doc, base) {
            if self.mark(&audio.link) {
                self.audio.push(audio);
            }
        }
        for quote in select_all(doc, "blockquote[cite], q[cite]") {
            if let Some(cite) = quote.value().attr("cite") {
                self.add(cite);
            }
        }
        tracing::debug!(links = self.links.len(), "extracted links");
        self
    }

    /// Adds a link found some other way.
    pub fn add(&mut self, link: &str) -> &mut Self {
        self.mark(link);
        self
    }

    /// Treats `link` as seen without reporting it.
    pub fn ignore(&mut self, link: &str) {
        let canonical = self.canonical(link);
        if !canonical.is_empty() {
            self.seen.insert(canonical);
        }
    }

    /// Records `link` if its canonical form is new. Returns whether it was.
    fn mark(&mut self, link: &str) -> bool {
        let canonical = self.canonical(link);
        if canonical.is_empty() || !self.seen.insert(canonical) {
            return false;
        }
        let link = self.add_protocol(link);
        self.links.push(link);
        true
    }

    fn canonical(&self, link: &str) -> String {
        (self.canonicalize)(&self.add_protocol(link))
    }

    /// Gives scheme-less links the source's protocol. `http`, `https` and
    /// `mailto` links are returned as is.
    fn add_protocol(&self, link: &str) -> String {
        let link = link.trim();
        if link.is_empty() {
            String::new()
        } else if ["http:", "https:", "mailto:"]
            .iter()
            .any(|scheme| link.starts_with(scheme))
        {
            link.to_string()
        } else if link.starts_with("//") {
            format!("{}{}", self.default_protocol, link)
        } else {
            format!("{}//{}", self.default_protocol, link)
        }
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn audio(&self) -> &[Audio] {
        &self.audio
    }
}

impl std::fmt::Debug for LinkExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkExtractor")
            .field("default_protocol", &self.default_protocol)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}
