// ABOUTME: Twitter API JSON driver: statuses become entries with linked entities, media, authors and quotes.
// ABOUTME: Entity text is rewritten into anchors/images in one pass before the status is parsed as HTML.

use aho_corasick::{AhoCorasick, MatchKind};
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{json_text, json_u32, ContentParser};
use crate::clean::{ContentCleaner, NoopCleaner};
use crate::dom::{parse_body_fragment, Element};
use crate::error::ParseError;
use crate::model::{Aspect, Author, Entry, Image, Link, Resource, Video};
use crate::result::ParseResult;

/// Resource metadata key holding the largest status id seen.
pub const MAX_ID_META: &str = "maxId";

const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Clone, Copy, Default)]
pub struct TwitterParser;

impl TwitterParser {
    pub const NAME: &'static str = "twitter";
}

impl ContentParser for TwitterParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(
        &self,
        content: &str,
        source_link: &str,
        cleaner: Option<&dyn ContentCleaner>,
    ) -> ParseResult {
        let root: Value = match serde_json::from_str(content) {
            Ok(root) => root,
            Err(err) => {
                tracing::warn!(error = %err, source_link, "twitter parse failed");
                return ParseResult::error(
                    Self::NAME,
                    ParseError::json(Self::NAME, "Twitter Parser Failure", err),
                );
            }
        };
        let statuses: Vec<&Value> = match &root {
            Value::Array(items) => items.iter().collect(),
            Value::Object(_) => vec![&root],
            _ => {
                return ParseResult::error(
                    Self::NAME,
                    ParseError::invalid(Self::NAME, "expected a status object or an array of statuses"),
                )
            }
        };

        let mut resource = Resource::new(source_link);
        let mut max_id = 0u64;
        for status in statuses {
            let (entry, _) = parse_status(status, cleaner);
            resource.add_entry(entry);
            max_id = max_id.max(status_id(status));
        }
        resource.metadata.insert(MAX_ID_META.to_string(), max_id.to_string());
        ParseResult::ok(Self::NAME, resource)
    }
}

fn status_id(status: &Value) -> u64 {
    match status.get("id") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// Parses `created_at` (`Wed Nov 18 21:45:12 +0000 2009`).
pub fn parse_created_at(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value.trim(), CREATED_AT_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// `https://twitter.com/{screen}/status/{id}`, or the nameless form.
pub fn canonical_link(screen_name: &str, id: &str) -> String {
    if screen_name.is_empty() {
        format!("https://twitter.com/i/web/status/{}", id)
    } else {
        format!("https://twitter.com/{}/status/{}", screen_name, id)
    }
}

/// Literal text to markup replacements, applied together.
#[derive(Default)]
struct Replacements {
    keys: Vec<String>,
    values: Vec<String>,
}

impl Replacements {
    fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if !key.is_empty() && !self.keys.contains(&key) {
            self.keys.push(key);
            self.values.push(value.into());
        }
    }

    fn apply(&self, text: &str) -> String {
        if self.keys.is_empty() {
            return text.to_string();
        }
        match AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&self.keys)
        {
            Ok(ac) => ac.replace_all(text, &self.values),
            Err(err) => {
                tracing::debug!(error = %err, "entity replacement skipped");
                text.to_string()
            }
        }
    }
}

fn push_citation(citations: &mut Vec<String>, link: &str) {
    if !link.is_empty() && !citations.iter().any(|c| c == link) {
        citations.push(link.to_string());
    }
}

fn array<'a>(node: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    node.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Parses one status. Returns the entry and its uncleaned markup tree.
fn parse_status(node: &Value, cleaner: Option<&dyn ContentCleaner>) -> (Entry, Element) {
    let mut entry = Entry::new().with_id(json_text(node.get("id_str")));
    entry.published = node
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(parse_created_at);

    let content_node = node.get("extended_tweet").unwrap_or(node);
    let mut text = json_text(content_node.get("full_text"));
    if text.is_empty() {
        text = json_text(content_node.get("text"));
    }

    let mut replacements = Replacements::default();
    let mut citations: Vec<String> = Vec::new();
    if let Some(entities) = content_node.get("entities") {
        for hashtag in array(entities, "hashtags") {
            let tag = json_text(hashtag.get("text"));
            if tag.is_empty() {
                continue;
            }
            entry.add_tag(tag.as_str());
            let markup = format!(r#"<a href="https://twitter.com/hashtag/{0}">#{0}</a>"#, tag);
            replacements.insert(format!("#{}", tag), markup.as_str());
            replacements.insert(format!("#{}", tag.to_lowercase()), markup);
        }
        for mention in array(entities, "user_mentions") {
            let name = json_text(mention.get("screen_name"));
            if name.is_empty() {
                continue;
            }
            let markup = format!(r#"<a href="https://twitter.com/{0}">@{0}</a>"#, name);
            replacements.insert(format!("@{}", name), markup.as_str());
            replacements.insert(format!("@{}", name.to_lowercase()), markup);
        }
        for url in array(entities, "urls") {
            let short = json_text(url.get("url"));
            if short.is_empty() {
                continue;
            }
            push_citation(&mut citations, &short);
            let expanded = json_text(url.get("expanded_url"));
            let display = json_text(url.get("display_url"));
            if !expanded.is_empty() {
                push_citation(&mut citations, &expanded);
                if !display.is_empty() {
                    replacements.insert(short, format!(r#"<a href="{}">{}</a>"#, expanded, display));
                }
            }
        }
    }

    let mut images: Vec<Image> = Vec::new();
    let mut videos: Vec<Video> = Vec::new();
    let media_sources = ["entities", "extended_entities"]
        .into_iter()
        .filter_map(|key| node.get(key));
    for entities in media_sources {
        for media in array(entities, "media") {
            let url = json_text(media.get("media_url_https"));
            if url.is_empty() {
                continue;
            }
            match json_text(media.get("type")).as_str() {
                "photo" | "animated_gif" => {
                    let image = Image::new(url.as_str());
                    if !images.contains(&image) {
                        images.push(image);
                    }
                    replacements.insert(json_text(media.get("url")), format!(r#"<img src="{}"/>"#, url));
                }
                "video" => {
                    if let Some(video) = build_video(media) {
                        if !videos.contains(&video) {
                            videos.push(video);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(user) = node.get("user") {
        let screen_name = json_text(user.get("screen_name"));
        if !screen_name.is_empty() {
            let mut author = Author::new(screen_name)
                .with_display_name(json_text(user.get("name")))
                .with_link(json_text(user.get("url")))
                .with_id(json_text(user.get("id_str")))
                .with_description(json_text(user.get("description")));
            let image = json_text(user.get("profile_image_url_https"));
            if !image.is_empty() {
                author = author.with_image(Image::new(image));
            }
            entry.add_author(author);
        }
    }
    images.into_iter().for_each(|image| entry.add_image(image));
    videos.into_iter().for_each(|video| entry.add_video(video));

    let mut root = parse_body_fragment(&replacements.apply(&text));
    for anchor in root.descendants_named("a") {
        let href = anchor.attr_or_empty("href");
        if href.starts_with("https://") || href.starts_with("http://") {
            push_citation(&mut citations, href);
        }
    }

    for key in ["quoted_status", "retweeted_status"] {
        let Some(quoted_node) = node.get(key) else {
            continue;
        };
        let (quoted, quoted_root) = parse_status(quoted_node, cleaner);
        let mut blockquote = Element::new("blockquote").with_attr("cite", quoted.canonical_link.as_str());
        if let Some(quoted_body) = quoted_root.first_named("body") {
            blockquote.children = quoted_body.children.clone();
        }
        if let Some(body) = root.first_named_mut("body") {
            body.children.push(blockquote.into());
        }
        push_citation(&mut citations, &quoted.canonical_link);
    }

    let screen_name = entry
        .authors
        .first()
        .map(|a| a.name.clone())
        .unwrap_or_default();
    entry.canonical_link = canonical_link(&screen_name, &entry.id);

    entry.original_content = Some(NoopCleaner.to_clean_content(&root));
    if let Some(cleaner) = cleaner {
        let mut cleaned = root.clone();
        cleaner.transform(&mut cleaned, Some(&entry.canonical_link));
        entry.clean_content = cleaner.to_clean_content(&cleaned);
    }
    for citation in citations {
        entry.add_citation(Link::new(citation));
    }
    (entry, root)
}

/// The first variant of a video, carrying the rest as variants.
fn build_video(media: &Value) -> Option<Video> {
    let poster = Image::new(json_text(media.get("media_url_https")));
    let id = json_text(media.get("id_str"));
    let info = media.get("video_info")?;
    let aspect = match info.get("aspect_ratio").and_then(Value::as_array) {
        Some(ratio) if ratio.len() == 2 => Some(Aspect::new(json_u32(ratio.first()), json_u32(ratio.get(1)))),
        _ => None,
    };
    let duration = info.get("duration_millis").and_then(Value::as_u64).unwrap_or(0);

    let mut variants: Vec<Video> = array(info, "variants")
        .filter_map(|variant| {
            let url = json_text(variant.get("url"));
            if url.is_empty() {
                return None;
            }
            let mut video = Video::new(url)
                .with_id(id.as_str())
                .with_duration_millis(duration)
                .with_image(poster.clone())
                .with_bitrate(json_u32(variant.get("bitrate")))
                .with_media_type(json_text(variant.get("content_type")));
            if let Some(aspect) = aspect {
                video = video.with_aspect(aspect);
            }
            Some(video)
        })
        .collect();
    if variants.is_empty() {
        return None;
    }
    let rest = variants.split_off(1);
    variants.pop().map(|first| first.with_variants(rest))
}
