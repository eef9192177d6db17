// ABOUTME: oEmbed JSON driver: title, author, thumbnail, photo URL and cleaned video/rich HTML.
// ABOUTME: The thumbnail is the primary image; photo URLs follow it.

use serde_json::Value;

use super::{apply_cleaner, json_text, json_u32, ContentParser};
use crate::clean::ContentCleaner;
use crate::dom::parse_body_fragment;
use crate::error::ParseError;
use crate::model::{Author, Entry, Image, Resource};
use crate::result::ParseResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct OEmbedParser;

impl OEmbedParser {
    pub const NAME: &'static str = "oEmbed-json";
}

impl ContentParser for OEmbedParser {
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
                tracing::warn!(error = %err, source_link, "oEmbed parse failed");
                return ParseResult::error(
                    Self::NAME,
                    ParseError::json(Self::NAME, "oEmbed Parser Failure", err),
                );
            }
        };
        if !root.is_object() {
            return ParseResult::error(
                Self::NAME,
                ParseError::invalid(Self::NAME, "oEmbed response must be an object"),
            );
        }

        let mut entry = Entry::new()
            .with_canonical_link(source_link)
            .with_title(json_text(root.get("title")));

        let author_name = json_text(root.get("author_name"));
        if !author_name.is_empty() {
            let author_url = json_text(root.get("author_url"));
            let mut author = Author::new(author_name);
            if !author_url.is_empty() {
                author = author.with_link(author_url);
            }
            entry.add_author(author);
        }

        if let Some(thumbnail) = sized_image(&root, "thumbnail_url", "thumbnail_width", "thumbnail_height") {
            entry.add_image(thumbnail);
        }

        match json_text(root.get("type")).as_str() {
            "photo" => {
                if let Some(photo) = sized_image(&root, "url", "width", "height") {
                    entry.add_image(photo);
                }
            }
            "video" | "rich" => {
                let html = json_text(root.get("html"));
                if !html.is_empty() {
                    apply_cleaner(&mut entry, parse_body_fragment(&html), Some(source_link), cleaner);
                }
            }
            _ => {}
        }

        let mut resource = Resource::new(source_link);
        resource.add_entry(entry);
        ParseResult::ok(Self::NAME, resource)
    }
}

fn sized_image(root: &Value, url: &str, width: &str, height: &str) -> Option<Image> {
    let link = json_text(root.get(url));
    if link.is_empty() {
        return None;
    }
    Some(Image::new(link).with_size(json_u32(root.get(width)), json_u32(root.get(height))))
}
