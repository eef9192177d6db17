// ABOUTME: The ContentParser contract shared by every driver plus the HTML-family drivers.
// ABOUTME: Drivers never fail outright: every failure is packaged into the returned ParseResult.

//! Format drivers.
//!
//! A driver turns raw content into a [`Resource`](crate::model::Resource).
//! All of them implement [`ContentParser`], so callers can hold any driver
//! behind `&dyn ContentParser` and pick one at runtime.

pub mod amp;
pub mod html_meta;
pub mod oembed;
pub mod twitter;

pub use self::amp::AmpParser;
pub use self::html_meta::HtmlMetadataParser;
pub use self::oembed::OEmbedParser;
pub use self::twitter::TwitterParser;

use crate::clean::{ContentCleaner, NoopCleaner};
use crate::dom::Element;
use crate::model::Entry;
use crate::result::ParseResult;

pub trait ContentParser: Send + Sync {
    /// Stable driver name, reported in every [`ParseResult`].
    fn name(&self) -> &'static str;

    /// Parses `content` fetched from `source_link`. When a cleaner is given,
    /// entry content is run through it.
    fn parse(
        &self,
        content: &str,
        source_link: &str,
        cleaner: Option<&dyn ContentCleaner>,
    ) -> ParseResult;
}

/// Stores the body of `root` as original content and, with a cleaner, the
/// cleaned rendering as clean content. Feed drivers share this too.
pub fn apply_cleaner(
    entry: &mut Entry,
    mut root: Element,
    base_uri: Option<&str>,
    cleaner: Option<&dyn ContentCleaner>,
) {
    entry.original_content = Some(NoopCleaner.to_clean_content(&root));
    if let Some(cleaner) = cleaner {
        cleaner.transform(&mut root, base_uri);
        entry.clean_content = cleaner.to_clean_content(&root);
    }
}

/// Reads a JSON value as an unsigned integer, accepting numeric strings.
pub(crate) fn json_u32(value: Option<&serde_json::Value>) -> u32 {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Reads a JSON value as text. Numbers and booleans are stringified.
pub(crate) fn json_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
