// ABOUTME: ParseResult returned by every driver: parser name, optional resource and terminal errors.
// ABOUTME: Serializes errors as their display strings so results can be printed as JSON.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::ParseError;
use crate::model::Resource;

/// Outcome of one parse call. A result carries either a resource or errors.
#[derive(Debug)]
pub struct ParseResult {
    pub parser_name: String,
    pub resource: Option<Resource>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn ok(parser_name: impl Into<String>, resource: Resource) -> Self {
        Self {
            parser_name: parser_name.into(),
            resource: Some(resource),
            errors: Vec::new(),
        }
    }

    pub fn error(parser_name: impl Into<String>, error: ParseError) -> Self {
        Self {
            parser_name: parser_name.into(),
            resource: None,
            errors: vec![error],
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn first_error(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    /// True when there is a resource and no errors.
    pub fn is_ok(&self) -> bool {
        self.resource.is_some() && self.errors.is_empty()
    }

    /// Converts into a `Result`, yielding the first error on failure.
    pub fn into_result(mut self) -> Result<Resource, ParseError> {
        if !self.errors.is_empty() {
            return Err(self.errors.swap_remove(0));
        }
        let parser = self.parser_name;
        self.resource
            .ok_or_else(|| ParseError::invalid(parser, "No resource"))
    }
}

impl Serialize for ParseResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let errors: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        let mut state = serializer.serialize_struct("ParseResult", 3)?;
        state.serialize_field("parser_name", &self.parser_name)?;
        state.serialize_field("resource", &self.resource)?;
        state.serialize_field("errors", &errors)?;
        state.end()
    }
}
