// ABOUTME: Error types for pagesift including FormatError, ErrorCode and ParseError.
// ABOUTME: ParseError carries the failing parser name and an optional anyhow source.

use std::fmt;

/// A date/time string could not be parsed.
///
/// `fragment` is the offending substring and `position` the byte offset the
/// parser had reached when it gave up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {position}")]
pub struct FormatError {
    pub message: String,
    pub fragment: String,
    pub position: usize,
}

impl FormatError {
    pub fn new(message: impl Into<String>, fragment: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            fragment: fragment.into(),
            position,
        }
    }
}

/// A `data:` URI could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DataUriError {
    #[error("Not a data URI")]
    NotDataUri,
    #[error("The data URI scheme requires the presence of a ','")]
    MissingData,
    #[error("invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Error codes representing different categories of parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Detect,
    Malformed,
    Invalid,
    Json,
    Xml,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Detect => "undetected format",
            ErrorCode::Malformed => "malformed content",
            ErrorCode::Invalid => "invalid document",
            ErrorCode::Json => "json error",
            ErrorCode::Xml => "xml error",
        };
        write!(f, "{}", s)
    }
}

/// A terminal failure of a single parse call.
#[derive(Debug, thiserror::Error)]
pub struct ParseError {
    pub code: ErrorCode,
    pub parser: String,
    pub message: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pagesift: {} ({}): {}", self.parser, self.code, self.message)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ParseError {
    fn with_code(
        code: ErrorCode,
        parser: impl Into<String>,
        message: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            parser: parser.into(),
            message: message.into(),
            source,
        }
    }

    /// The format could not be detected or has no parser.
    pub fn detect(parser: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::Detect, parser, message, None)
    }

    /// The content could not be read at all.
    pub fn malformed(
        parser: impl Into<String>,
        message: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Malformed, parser, message, source)
    }

    /// The content was read but lacks something the parser requires.
    pub fn invalid(parser: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::Invalid, parser, message, None)
    }

    /// Create a Json error from a serde_json failure.
    pub fn json(
        parser: impl Into<String>,
        message: impl Into<String>,
        err: serde_json::Error,
    ) -> Self {
        Self::with_code(ErrorCode::Json, parser, message, Some(anyhow::Error::new(err)))
    }

    /// Create an Xml error.
    pub fn xml(
        parser: impl Into<String>,
        message: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Xml, parser, message, source)
    }

    pub fn is_detect(&self) -> bool {
        self.code == ErrorCode::Detect
    }

    pub fn is_malformed(&self) -> bool {
        self.code == ErrorCode::Malformed
    }

    pub fn is_invalid(&self) -> bool {
        self.code == ErrorCode::Invalid
    }

    pub fn is_json(&self) -> bool {
        self.code == ErrorCode::Json
    }

    pub fn is_xml(&self) -> bool {
        self.code == ErrorCode::Xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_parser_and_source() {
        let err = ParseError::malformed("rss", "Parse Failure", Some(anyhow::anyhow!("eof")));
        assert_eq!(
            err.to_string(),
            "pagesift: rss (malformed content): Parse Failure: eof"
        );
        assert!(err.is_malformed());
        assert!(!err.is_detect());
    }

    #[test]
    fn format_error_reports_position() {
        let err = FormatError::new("Unable to parse day", "x1", 3);
        assert_eq!(err.to_string(), "Unable to parse day at position 3");
        assert_eq!(err.fragment, "x1");
    }
}
