// ABOUTME: pagesift feed library: RSS and Atom drivers, sitemap reading and the auto-detecting Parser enum.
// ABOUTME: Builds on pagesift-core's model, cleaners and HTML drivers.

//! # pagesift-feed
//!
//! XML formats for pagesift. [`RssParser`] and [`AtomParser`] implement
//! [`ContentParser`](pagesift_core::ContentParser) like the HTML drivers in
//! `pagesift-core`; [`Parser`] names every driver and can pick one from the
//! content itself. [`parse_sitemap`] reads XML and plain-text sitemaps.

mod common;

pub mod atom;
pub mod error;
pub mod rss;
pub mod sitemap;
pub mod universal;
pub mod xml;

pub use atom::AtomParser;
pub use error::FeedError;
pub use rss::RssParser;
pub use sitemap::{parse_plain, parse_sitemap};
pub use universal::{ConfiguredParser, Parser, ParserBuilder, UnknownParser};
