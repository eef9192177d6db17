// ABOUTME: Content format detection from the raw body and an optional content-type hint.
// ABOUTME: Suffix checks ignore trailing invisible characters; AMP markers are matched anywhere.

use std::fmt;
use std::str::FromStr;

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// The formats the parsers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Rss,
    Atom,
    Html,
    Amp,
    Sitemap,
    Unknown,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Format::Rss => "rss",
            Format::Atom => "atom",
            Format::Html => "html",
            Format::Amp => "amp",
            Format::Sitemap => "sitemap",
            Format::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rss" | "rdf" => Ok(Format::Rss),
            "atom" => Ok(Format::Atom),
            "html" => Ok(Format::Html),
            "amp" => Ok(Format::Amp),
            "sitemap" => Ok(Format::Sitemap),
            "unknown" => Ok(Format::Unknown),
            other => Err(format!("unknown format: {}", other)),
        }
    }
}

static AMP_MARKERS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::new(["<html amp>", "<html ⚡>"]).expect("static AMP marker patterns")
});

/// Detects the format of `body`. Checks run in a fixed order and the first
/// hit wins, so a feed that embeds `<html amp>` text is still a feed.
pub fn detect(body: &str, content_type: &str) -> Format {
    if ends_with_ignore_invisible("</rss>", body) || ends_with_ignore_invisible("</rdf:RDF>", body)
    {
        Format::Rss
    } else if ends_with_ignore_invisible("</feed>", body) {
        Format::Atom
    } else if ends_with_ignore_invisible("</urlset>", body) {
        Format::Sitemap
    } else if AMP_MARKERS.is_match(body) {
        Format::Amp
    } else if ends_with_ignore_invisible("</html>", body)
        || content_type.trim().to_ascii_lowercase().starts_with("text/html")
    {
        Format::Html
    } else {
        Format::Unknown
    }
}

/// True for whitespace, control, format and other characters that render as
/// nothing.
pub fn is_invisible(c: char) -> bool {
    matches!(c,
        '\u{0000}'..='\u{0020}'
        | '\u{007f}'..='\u{00a0}'
        | '\u{00ad}'
        | '\u{0600}'..='\u{0605}'
        | '\u{061c}'
        | '\u{06dd}'
        | '\u{070f}'
        | '\u{08e2}'
        | '\u{1680}'
        | '\u{180e}'
        | '\u{2000}'..='\u{200f}'
        | '\u{2028}'..='\u{202f}'
        | '\u{205f}'..='\u{2064}'
        | '\u{2066}'..='\u{206f}'
        | '\u{3000}'
        | '\u{e000}'..='\u{f8ff}'
        | '\u{feff}'
        | '\u{fff9}'..='\u{fffb}')
}

/// Suffix check after trimming trailing invisible characters from `source`.
/// An empty `pattern` never matches.
pub fn ends_with_ignore_invisible(pattern: &str, source: &str) -> bool {
    !pattern.is_empty() && source.trim_end_matches(is_invisible).ends_with(pattern)
}

/// Prefix check after trimming leading invisible characters from `source`.
/// An empty `pattern` never matches.
pub fn starts_with_ignore_invisible(pattern: &str, source: &str) -> bool {
    !pattern.is_empty() && source.trim_start_matches(is_invisible).starts_with(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_rss_with_trailing_whitespace() {
        let content = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss>Test</rss>  \t \n\n ";
        assert_eq!(detect(content, ""), Format::Rss);
        assert_eq!(detect("...</rss>   \n\t", ""), Format::Rss);
    }

    #[test]
    fn detects_rdf() {
        assert_eq!(detect("\n\n<rdf:RDF>Test</rdf:RDF>  \t \n\n ", ""), Format::Rss);
    }

    #[test]
    fn detects_atom_and_sitemap() {
        assert_eq!(detect("\n\n<feed>Test</feed>  \t \n\n ", ""), Format::Atom);
        assert_eq!(detect("\n\n<urlset>Test</urlset>  \t \n\n ", ""), Format::Sitemap);
    }

    #[test]
    fn detects_amp_markers() {
        assert_eq!(detect("\n\n<html ⚡>Test</html>  \t \n\n ", ""), Format::Amp);
        assert_eq!(detect("\n\n<html amp>Test</html>  \t \n\n ", ""), Format::Amp);
        assert_eq!(detect("<html ⚡>...", ""), Format::Amp);
    }

    #[test]
    fn detects_html_by_suffix_or_content_type() {
        assert_eq!(detect("\n\n<html>Test</html>  \t \n\n ", ""), Format::Html);
        assert_eq!(detect("<p>x</p>", "text/html; charset=utf8"), Format::Html);
        assert_eq!(detect("<p>x</p>", ""), Format::Unknown);
    }

    #[test]
    fn empty_body_is_unknown() {
        assert_eq!(detect("", ""), Format::Unknown);
        assert_eq!(detect("\u{feff}\u{200b}  ", ""), Format::Unknown);
    }

    #[test]
    fn zero_width_trailers_are_ignored() {
        assert_eq!(detect("<feed></feed>\u{200b}\u{feff}\r\n", ""), Format::Atom);
    }

    #[test]
    fn invisible_helpers() {
        assert!(!ends_with_ignore_invisible("", "abc"));
        assert!(ends_with_ignore_invisible("abc", "abc \n"));
        assert!(!ends_with_ignore_invisible("abc", "ab"));
        assert!(starts_with_ignore_invisible("<?xml", "\u{feff}  <?xml version"));
        assert!(!starts_with_ignore_invisible("", "x"));
    }

    #[test]
    fn format_round_trips_through_strings() {
        assert_eq!("RSS".parse::<Format>(), Ok(Format::Rss));
        assert_eq!(Format::Sitemap.to_string(), "sitemap");
        assert!("gopher".parse::<Format>().is_err());
    }
}
