// ABOUTME: HTML metadata driver: turns a page's metadata into a single-entry resource.
// ABOUTME: The resource also carries the page's AMP link, preferred icon and advertised feeds.

use scraper::Html;

use super::ContentParser;
use crate::clean::ContentCleaner;
use crate::model::{Author, Entry, Image, Resource};
use crate::page::{parse_page, Page};
use crate::result::ParseResult;

/// Resource metadata key holding the page's site name.
pub const SITE_NAME_META: &str = "siteName";

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMetadataParser;

impl HtmlMetadataParser {
    pub const NAME: &'static str = "html-metadata";
}

impl ContentParser for HtmlMetadataParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(
        &self,
        content: &str,
        source_link: &str,
        _cleaner: Option<&dyn ContentCleaner>,
    ) -> ParseResult {
        let doc = Html::parse_document(content);
        let page = parse_page(&doc, source_link);
        let mut resource = resource_from_page(&page, source_link);
        if let Some(entry) = resource.entries.first_mut() {
            entry.original_content = Some(content.to_string());
        }
        ParseResult::ok(Self::NAME, resource)
    }
}

/// Builds the resource for an already parsed page.
pub fn resource_from_page(page: &Page, source_link: &str) -> Resource {
    let mut entry = Entry::new()
        .with_title(page.title.as_str())
        .with_summary(page.summary.as_str())
        .with_canonical_link(if page.canonical_link.is_empty() {
            source_link
        } else {
            page.canonical_link.as_str()
        })
        .with_published(page.publish_time);
    if !page.author.is_empty() {
        entry.add_author(Author::new(page.author.as_str()));
    }
    for image in &page.meta_images {
        entry.add_image(image.clone());
    }
    for video in &page.meta_videos {
        entry.add_video(video.clone());
    }
    for audio in &page.meta_audios {
        entry.add_audio(audio.clone());
    }

    let mut resource = Resource::new(source_link)
        .with_canonical_link(entry.canonical_link.as_str())
        .with_title(page.title.as_str());
    if !page.site_name.is_empty() {
        resource.metadata.insert(SITE_NAME_META.to_string(), page.site_name.clone());
    }
    resource.amp_link = page.amp_link().map(str::to_string);
    resource.icon = page.icon().map(|link| Image::new(link.href.as_str()));
    resource.feed_links = page.feed_links().into_iter().map(|l| l.href.clone()).collect();
    resource.add_entry(entry);
    resource
}
