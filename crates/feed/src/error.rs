// ABOUTME: Error types for XML feed and sitemap reading.
// ABOUTME: FeedError wraps quick-xml failures with their byte position and sitemap date failures.

use pagesift_core::FormatError;
use thiserror::Error;

/// Errors raised while reading feed or sitemap XML.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The XML could not be tokenized.
    #[error("malformed XML near byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// A sitemap `lastmod` was present but not ISO-8601.
    #[error("invalid sitemap date: {0}")]
    Date(#[from] FormatError),
}

impl FeedError {
    pub fn is_xml(&self) -> bool {
        matches!(self, FeedError::Xml { .. })
    }
}
