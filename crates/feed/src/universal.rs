// ABOUTME: The Parser enum selecting a driver (or auto-detecting one) and the ParserBuilder that binds Options.
// ABOUTME: Auto-detection routes RSS, Atom, AMP and HTML; sitemaps and unknown formats are reported as errors.

use std::fmt;
use std::str::FromStr;

use pagesift_core::clean::{ContentCleaner, DefaultContentCleaner};
use pagesift_core::detect::{detect, Format};
use pagesift_core::error::ParseError;
use pagesift_core::options::Options;
use pagesift_core::parsers::{AmpParser, ContentParser, HtmlMetadataParser, OEmbedParser, TwitterParser};
use pagesift_core::result::ParseResult;

use crate::atom::AtomParser;
use crate::rss::RssParser;

pub const UNIVERSAL_NAME: &str = "universal";
pub const DETECT_FAILURE: &str = "Unable to auto-detect parser";

/// Every driver, plus auto-detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parser {
    Rss,
    Atom,
    Amp,
    HtmlMetadata,
    Twitter,
    OEmbed,
    /// Picks a driver with [`detect`]. `content_type` is the response's
    /// content type, if known.
    Universal { content_type: String },
}

impl Default for Parser {
    fn default() -> Self {
        Parser::Universal {
            content_type: String::new(),
        }
    }
}

impl Parser {
    /// The driver for a detected format. JSON formats are never detected.
    pub fn for_format(format: Format) -> Option<Parser> {
        match format {
            Format::Rss => Some(Parser::Rss),
            Format::Atom => Some(Parser::Atom),
            Format::Amp => Some(Parser::Amp),
            Format::Html => Some(Parser::HtmlMetadata),
            Format::Sitemap | Format::Unknown => None,
        }
    }
}

impl ContentParser for Parser {
    fn name(&self) -> &'static str {
        match self {
            Parser::Rss => RssParser::NAME,
            Parser::Atom => AtomParser::NAME,
            Parser::Amp => AmpParser::NAME,
            Parser::HtmlMetadata => HtmlMetadataParser::NAME,
            Parser::Twitter => TwitterParser::NAME,
            Parser::OEmbed => OEmbedParser::NAME,
            Parser::Universal { .. } => UNIVERSAL_NAME,
        }
    }

    fn parse(
        &self,
        content: &str,
        source_link: &str,
        cleaner: Option<&dyn ContentCleaner>,
    ) -> ParseResult {
        match self {
            Parser::Rss => RssParser.parse(content, source_link, cleaner),
            Parser::Atom => AtomParser.parse(content, source_link, cleaner),
            Parser::Amp => AmpParser::new().parse(content, source_link, cleaner),
            Parser::HtmlMetadata => HtmlMetadataParser.parse(content, source_link, cleaner),
            Parser::Twitter => TwitterParser.parse(content, source_link, cleaner),
            Parser::OEmbed => OEmbedParser.parse(content, source_link, cleaner),
            Parser::Universal { content_type } => {
                let format = detect(content, content_type);
                match Parser::for_format(format) {
                    Some(parser) => {
                        tracing::debug!(%format, parser = parser.name(), "detected format");
                        parser.parse(content, source_link, cleaner)
                    }
                    None => {
                        tracing::warn!(%format, source_link, "no parser for content");
                        ParseResult::error(
                            UNIVERSAL_NAME,
                            ParseError::detect(UNIVERSAL_NAME, DETECT_FAILURE),
                        )
                    }
                }
            }
        }
    }
}

impl fmt::Display for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized parser name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown parser: {0}")]
pub struct UnknownParser(pub String);

impl FromStr for Parser {
    type Err = UnknownParser;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '_'], "-").as_str() {
            "rss" => Ok(Parser::Rss),
            "atom" => Ok(Parser::Atom),
            "amp" | "html-amp" => Ok(Parser::Amp),
            "html" | "html-metadata" => Ok(Parser::HtmlMetadata),
            "twitter" => Ok(Parser::Twitter),
            "oembed" | "oembed-json" => Ok(Parser::OEmbed),
            "universal" | "auto" => Ok(Parser::default()),
            _ => Err(UnknownParser(s.to_string())),
        }
    }
}

/// Binds a [`Parser`] to [`Options`].
///
/// ```
/// use pagesift_core::Options;
/// use pagesift_feed::ParserBuilder;
///
/// let parser = ParserBuilder::new()
///     .options(Options::builder().allow_images(true).build())
///     .build();
/// let result = parser.parse("<rss><channel><title>T</title></channel></rss>", "https://example.com/rss");
/// assert_eq!(result.resource.unwrap().title, "T");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    parser: Option<Parser>,
    options: Options,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a specific driver instead of auto-detection.
    pub fn parser(mut self, parser: Parser) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> ConfiguredParser {
        let parser = self.parser.unwrap_or_else(|| Parser::Universal {
            content_type: self.options.content_type.clone().unwrap_or_default(),
        });
        ConfiguredParser {
            cleaner: self.options.cleaner(),
            parser,
        }
    }
}

/// A driver together with the cleaner its options call for.
#[derive(Debug, Clone)]
pub struct ConfiguredParser {
    parser: Parser,
    cleaner: Option<DefaultContentCleaner>,
}

impl ConfiguredParser {
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn cleaner(&self) -> Option<&DefaultContentCleaner> {
        self.cleaner.as_ref()
    }

    pub fn parse(&self, content: &str, source_link: &str) -> ParseResult {
        let cleaner = self.cleaner.as_ref().map(|c| c as &dyn ContentCleaner);
        self.parser.parse(content, source_link, cleaner)
    }
}
