// ABOUTME: pagesift core library: normalizes untrusted web content into a canonical resource model.
// ABOUTME: Covers format detection, date parsing, metadata resolution, sanitizing, splitting and HTML drivers.

//! # pagesift-core
//!
//! Turns heterogeneous web content (HTML pages, AMP, oEmbed and Twitter API
//! JSON) into [`Resource`]s holding [`Entry`] items.
//!
//! The building blocks are usable on their own:
//!
//! - [`detect()`] guesses the format of a response body;
//! - [`date`] parses ISO-8601 and RFC-822 timestamps;
//! - [`resolve_metadata`] picks the best title, author, canonical link,
//!   publish time and lead media from a page;
//! - [`DefaultContentCleaner`] restricts markup to a [`Safelist`];
//! - [`ContentSplitter`] flattens nested markup into a sequence of blocks;
//! - [`LinkExtractor`] gathers the distinct outbound links of a page;
//! - [`providers`] matches links to oEmbed endpoints.
//!
//! ```
//! use pagesift_core::parsers::{ContentParser, HtmlMetadataParser};
//!
//! let html = r#"<html><head><meta property="og:title" content="Hello"></head></html>"#;
//! let result = HtmlMetadataParser.parse(html, "https://example.com/hello", None);
//! assert_eq!(result.resource.unwrap().entries[0].title, "Hello");
//! ```

pub mod clean;
pub mod date;
pub mod detect;
pub mod dom;
pub mod error;
pub mod json_tree;
pub mod links;
pub mod metadata;
pub mod model;
pub mod options;
pub mod page;
pub mod parsers;
pub mod providers;
pub mod result;
pub mod safelist;
pub mod split;
pub mod util;

pub use clean::{AmpCleaner, ContentCleaner, DefaultContentCleaner, NoopCleaner};
pub use date::{parse_date_time, parse_iso8601, parse_rfc822};
pub use detect::{detect, Format};
pub use error::{DataUriError, ErrorCode, FormatError, ParseError};
pub use json_tree::NullBehavior;
pub use links::LinkExtractor;
pub use metadata::{resolve_html, resolve_metadata, Metadata};
pub use model::{
    Anchor, Aspect, Audio, Author, ChangeFrequency, DataUri, Entry, Image, Link, Resource,
    SitemapLink, Video,
};
pub use options::{Options, OptionsBuilder, SafelistKind};
pub use page::{parse_page, Page};
pub use parsers::ContentParser;
pub use providers::{Endpoint, OEmbedProvider};
pub use result::ParseResult;
pub use safelist::{Safelist, Violation};
pub use split::ContentSplitter;
