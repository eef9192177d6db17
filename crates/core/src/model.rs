// ABOUTME: Normalized content model: resources, entries, authors, media, links, sitemap links and data URIs.
// ABOUTME: Plain serde structs with new() constructors and with_* copy helpers; media compare by link.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataUriError;

/// An image. Two images are equal when their links are equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub id: String,
    pub link: String,
    pub alt_text: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = alt_text.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
    }
}

impl Eq for Image {}

impl Hash for Image {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.link.hash(state);
    }
}

/// Width-to-height ratio of a video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aspect {
    pub width: u32,
    pub height: u32,
}

impl Aspect {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// A video, possibly with encoding variants. Equal when links are equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    pub id: String,
    pub link: String,
    pub alt_text: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub media_type: String,
    pub bitrate: u32,
    pub duration_millis: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect: Option<Aspect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Video>,
}

impl Video {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = alt_text.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn with_duration_millis(mut self, duration_millis: u64) -> Self {
        self.duration_millis = duration_millis;
        self
    }

    pub fn with_aspect(mut self, aspect: Aspect) -> Self {
        self.aspect = Some(aspect);
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_variants(mut self, variants: Vec<Video>) -> Self {
        self.variants = variants;
        self
    }
}

impl PartialEq for Video {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
    }
}

impl Eq for Video {}

impl Hash for Video {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.link.hash(state);
    }
}

/// An audio stream. Equal when links are equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Audio {
    pub id: String,
    pub link: String,
    pub alt_text: String,
    pub title: String,
    pub media_type: String,
}

impl Audio {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Self::default()
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = alt_text.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }
}

impl PartialEq for Audio {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
    }
}

impl Eq for Audio {}

impl Hash for Audio {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.link.hash(state);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub email: String,
    pub link: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.image = Some(image);
        self
    }
}

/// A `<link>`-style reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub media_type: String,
    pub title: String,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = rel.into();
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// An `<a>` element found in a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Anchor {
    pub href: String,
    pub title: String,
    pub anchor_text: String,
}

impl Anchor {
    pub fn new(
        href: impl Into<String>,
        title: impl Into<String>,
        anchor_text: impl Into<String>,
    ) -> Self {
        Self {
            href: href.into(),
            title: title.into(),
            anchor_text: anchor_text.into(),
        }
    }
}

/// One post, article or page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub clean_content: String,
    pub canonical_link: String,
    pub alt_links: Vec<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub authors: Vec<Author>,
    pub primary_image: Option<Image>,
    pub images: Vec<Image>,
    pub primary_video: Option<Video>,
    pub videos: Vec<Video>,
    pub primary_audio: Option<Audio>,
    pub audios: Vec<Audio>,
    pub tags: Vec<String>,
    pub rights: String,
    pub citations: Vec<Link>,
    /// Source markup before cleaning, when it was kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_clean_content(mut self, clean_content: impl Into<String>) -> Self {
        self.clean_content = clean_content.into();
        self
    }

    pub fn with_canonical_link(mut self, link: impl Into<String>) -> Self {
        self.canonical_link = link.into();
        self
    }

    pub fn with_published(mut self, published: Option<DateTime<Utc>>) -> Self {
        self.published = published;
        self
    }

    pub fn with_updated(mut self, updated: Option<DateTime<Utc>>) -> Self {
        self.updated = updated;
        self
    }

    pub fn with_rights(mut self, rights: impl Into<String>) -> Self {
        self.rights = rights.into();
        self
    }

    pub fn with_original_content(mut self, original: impl Into<String>) -> Self {
        self.original_content = Some(original.into());
        self
    }

    /// Adds an image unless one with the same link exists. The first image
    /// becomes the primary image.
    pub fn add_image(&mut self, image: Image) {
        if self.primary_image.is_none() {
            self.primary_image = Some(image.clone());
        }
        if !self.images.contains(&image) {
            self.images.push(image);
        }
    }

    pub fn add_video(&mut self, video: Video) {
        if self.primary_video.is_none() {
            self.primary_video = Some(video.clone());
        }
        if !self.videos.contains(&video) {
            self.videos.push(video);
        }
    }

    pub fn add_audio(&mut self, audio: Audio) {
        if self.primary_audio.is_none() {
            self.primary_audio = Some(audio.clone());
        }
        if !self.audios.contains(&audio) {
            self.audios.push(audio);
        }
    }

    /// Adds a tag if it is non-empty and not present yet.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !tag.is_empty() && !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn add_author(&mut self, author: Author) {
        self.authors.push(author);
    }

    pub fn add_alt_link(&mut self, link: impl Into<String>) {
        let link = link.into();
        if !link.is_empty() && !self.alt_links.contains(&link) {
            self.alt_links.push(link);
        }
    }

    pub fn add_citation(&mut self, citation: Link) {
        if !self.citations.contains(&citation) {
            self.citations.push(citation);
        }
    }
}

/// A feed, page or API response: one or more entries plus source-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub source_link: String,
    pub canonical_link: String,
    pub base_link: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub icon: Option<Image>,
    pub logo: Option<Image>,
    pub authors: Vec<Author>,
    pub tags: Vec<String>,
    pub entries: Vec<Entry>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub rights: String,
    pub site_link: String,
    pub feed_links: Vec<String>,
    pub amp_link: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl Resource {
    pub fn new(source_link: impl Into<String>) -> Self {
        Self {
            source_link: source_link.into(),
            ..Self::default()
        }
    }

    pub fn with_canonical_link(mut self, link: impl Into<String>) -> Self {
        self.canonical_link = link.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_entries(mut self, entries: Vec<Entry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }
}

/// How often a sitemap URL is expected to change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    #[default]
    Never,
}

impl ChangeFrequency {
    /// Recheck interval; `None` for `Never`.
    pub fn interval(self) -> Option<Duration> {
        let seconds = match self {
            ChangeFrequency::Always => 0,
            ChangeFrequency::Hourly => 3600,
            ChangeFrequency::Daily => 3600 * 24,
            ChangeFrequency::Weekly => 3600 * 24 * 7,
            ChangeFrequency::Monthly => 3600 * 24 * 30,
            ChangeFrequency::Yearly => 3600 * 24 * 365,
            ChangeFrequency::Never => return None,
        };
        Some(Duration::seconds(seconds))
    }

    /// True if a URL last checked at `last_check` should be checked again at `now`.
    pub fn check_now(self, last_check: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.interval() {
            None => false,
            Some(interval) => interval.is_zero() || last_check + interval < now,
        }
    }
}

impl From<&str> for ChangeFrequency {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "always" => ChangeFrequency::Always,
            "hourly" => ChangeFrequency::Hourly,
            "daily" => ChangeFrequency::Daily,
            "weekly" => ChangeFrequency::Weekly,
            "monthly" => ChangeFrequency::Monthly,
            "yearly" => ChangeFrequency::Yearly,
            _ => ChangeFrequency::Never,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapLink {
    pub url: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub change_frequency: ChangeFrequency,
}

impl SitemapLink {
    pub fn new(
        url: impl Into<String>,
        last_modified: Option<DateTime<Utc>>,
        change_frequency: ChangeFrequency,
    ) -> Self {
        Self {
            url: url.into(),
            last_modified,
            change_frequency,
        }
    }
}

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub media_type: String,
    pub data: Vec<u8>,
    pub base64_encoded: bool,
}

impl DataUri {
    pub fn parse(src: &str) -> Result<Self, DataUriError> {
        let rest = src.strip_prefix("data:").ok_or(DataUriError::NotDataUri)?;
        let (media_type, data) = rest.split_once(',').ok_or(DataUriError::MissingData)?;
        match media_type.find(";base64") {
            Some(idx) if idx > 0 => Ok(Self {
                media_type: media_type[..idx].to_string(),
                data: base64::engine::general_purpose::STANDARD.decode(data.trim())?,
                base64_encoded: true,
            }),
            _ => Ok(Self {
                media_type: media_type.to_string(),
                data: data.as_bytes().to_vec(),
                base64_encoded: false,
            }),
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}
