// ABOUTME: Meta-only media: Open Graph image/video/audio groups plus the other meta image tags.
// ABOUTME: Links are made absolute, non-http(s) links dropped and results deduplicated by link.

use std::collections::HashMap;

use scraper::{ElementRef, Html};
use url::Url;

use super::candidates::{Candidate, META_IMAGES};
use super::fields::select_all;
use crate::dom::Element;
use crate::model::{Audio, Image, Video};
use crate::util::{abs_url, http_url, is_http_url};

/// One Open Graph object: the primary link plus its structured properties
/// (`alt`, `width`, `height`, `type`) keyed by suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OgGroup {
    pub link: String,
    pub properties: HashMap<String, String>,
}

impl OgGroup {
    fn get(&self, key: &str) -> &str {
        self.properties.get(key).map(String::as_str).unwrap_or_default()
    }

    fn dimension(&self, key: &str) -> u32 {
        parse_dimension(self.get(key))
    }
}

/// Integer width or height; fractional values are truncated, junk is 0.
pub fn parse_dimension(s: &str) -> u32 {
    let s = s.trim();
    s.parse::<u32>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u32))
        .unwrap_or(0)
}

/// Absolute http(s) form of a media link, or `None`.
pub fn media_link(base: Option<&Url>, raw: &str) -> Option<String> {
    let scheme = base.map(Url::scheme);
    http_url(raw, scheme)
        .or_else(|| abs_url(base, raw))
        .filter(|link| is_http_url(link))
}

/// Collects Open Graph groups for `kind` (`image`, `video` or `audio`).
///
/// The primaries are `meta[property=og:{kind}]`, falling back to
/// `og:{kind}:url`, `og:{kind}:secure_url` and finally `meta[name=og:{kind}]`.
/// Following sibling metas keyed `og:{kind}:*` belong to the group until
/// another primary or an unrelated element shows up.
pub fn og_groups(doc: &Html, kind: &str) -> Vec<OgGroup> {
    let base_key = format!("og:{}", kind);
    let url_key = format!("og:{}:url", kind);
    let secure_key = format!("og:{}:secure_url", kind);
    let prefix = format!("og:{}:", kind);

    let attempts = [
        ("property", base_key.as_str()),
        ("property", url_key.as_str()),
        ("property", secure_key.as_str()),
        ("name", base_key.as_str()),
    ];
    let Some((key_attr, primaries)) = attempts.iter().find_map(|(attr, value)| {
        let found = select_all(doc, &format!(r#"meta[{}="{}"]"#, attr, value));
        (!found.is_empty()).then_some((*attr, found))
    }) else {
        return Vec::new();
    };

    let primary_keys = [base_key.as_str(), url_key.as_str(), secure_key.as_str()];
    primaries
        .into_iter()
        .filter_map(|primary| {
            let link = primary.value().attr("content")?.trim();
            if link.is_empty() {
                return None;
            }
            let mut group = OgGroup {
                link: link.to_string(),
                properties: HashMap::new(),
            };
            for sibling in primary.next_siblings().filter_map(ElementRef::wrap) {
                let Some(key) = sibling.value().attr(key_attr) else {
                    break;
                };
                if !sibling.value().name().eq_ignore_ascii_case("meta")
                    || !key.starts_with(&prefix)
                    || primary_keys.contains(&key)
                {
                    break;
                }
                let content = sibling.value().attr("content").unwrap_or_default().trim();
                group
                    .properties
                    .entry(key[prefix.len()..].to_string())
                    .or_insert_with(|| content.to_string());
            }
            Some(group)
        })
        .collect()
}

/// Open Graph images followed by the other meta image candidates.
pub fn meta_images(doc: &Html, aux: &Element, base: Option<&Url>) -> Vec<Image> {
    let mut images: Vec<Image> = Vec::new();
    let mut push = |image: Image| {
        if !images.contains(&image) {
            images.push(image);
        }
    };

    for group in og_groups(doc, "image") {
        let Some(link) = media_link(base, &group.link) else {
            tracing::debug!(link = %group.link, "skipping og image");
            continue;
        };
        push(
            Image::new(link)
                .with_alt_text(group.get("alt"))
                .with_size(group.dimension("width"), group.dimension("height")),
        );
    }

    for candidate in META_IMAGES {
        // Embedded JSON only contributes its first image field.
        if matches!(candidate, Candidate::AuxLink("image")) && aux.first_named("image_url").is_some() {
            continue;
        }
        if let Some(link) = candidate.value(doc, aux).and_then(|raw| media_link(base, &raw)) {
            push(Image::new(link));
        }
    }
    images
}

pub fn meta_videos(doc: &Html, base: Option<&Url>) -> Vec<Video> {
    let mut videos: Vec<Video> = Vec::new();
    for group in og_groups(doc, "video") {
        let Some(link) = media_link(base, &group.link) else {
            continue;
        };
        let video = Video::new(link)
            .with_media_type(group.get("type"))
            .with_size(group.dimension("width"), group.dimension("height"));
        if !videos.contains(&video) {
            videos.push(video);
        }
    }
    videos
}

pub fn meta_audios(doc: &Html, base: Option<&Url>) -> Vec<Audio> {
    let mut audios: Vec<Audio> = Vec::new();
    for group in og_groups(doc, "audio") {
        let Some(link) = media_link(base, &group.link) else {
            continue;
        };
        let audio = Audio::new(link).with_media_type(group.get("type"));
        if !audios.contains(&audio) {
            audios.push(audio);
        }
    }
    audios
}
