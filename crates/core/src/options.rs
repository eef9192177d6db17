// ABOUTME: Parsing options (content type hint, image policy, safelist choice, JSON null handling).
// ABOUTME: OptionsBuilder provides a fluent API over Options; SafelistKind names the preset safelists.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clean::DefaultContentCleaner;
use crate::json_tree::NullBehavior;
use crate::safelist::Safelist;

/// Preset safelists selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafelistKind {
    None,
    SimpleText,
    Basic,
    BasicWithImages,
    #[default]
    Content,
    ContentWithImages,
}

impl SafelistKind {
    pub fn safelist(self) -> Safelist {
        match self {
            SafelistKind::None => Safelist::none(),
            SafelistKind::SimpleText => Safelist::simple_text(),
            SafelistKind::Basic => Safelist::basic(),
            SafelistKind::BasicWithImages => Safelist::basic_with_images(),
            SafelistKind::Content => Safelist::content(),
            SafelistKind::ContentWithImages => Safelist::content_with_images(),
        }
    }

    /// The image-allowing variant, where one exists.
    pub fn with_images(self) -> Self {
        match self {
            SafelistKind::Basic => SafelistKind::BasicWithImages,
            SafelistKind::Content => SafelistKind::ContentWithImages,
            other => other,
        }
    }
}

impl fmt::Display for SafelistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SafelistKind::None => "none",
            SafelistKind::SimpleText => "simple_text",
            SafelistKind::Basic => "basic",
            SafelistKind::BasicWithImages => "basic_with_images",
            SafelistKind::Content => "content",
            SafelistKind::ContentWithImages => "content_with_images",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for SafelistKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" => SafelistKind::None,
            "simple_text" | "text" => SafelistKind::SimpleText,
            "basic" => SafelistKind::Basic,
            "basic_with_images" => SafelistKind::BasicWithImages,
            "content_with_images" => SafelistKind::ContentWithImages,
            _ => SafelistKind::Content,
        }
    }
}

/// Options shared by the drivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Content type reported by whoever fetched the content, used for detection.
    pub content_type: Option<String>,
    pub allow_images: bool,
    /// Run entry content through a cleaner.
    pub clean_content: bool,
    pub safelist: SafelistKind,
    pub null_behavior: NullBehavior,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            content_type: None,
            allow_images: false,
            clean_content: true,
            safelist: SafelistKind::Content,
            null_behavior: NullBehavior::Empty,
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// The cleaner these options describe, or `None` when cleaning is off.
    pub fn cleaner(&self) -> Option<DefaultContentCleaner> {
        self.clean_content
            .then(|| DefaultContentCleaner::from_options(self))
    }
}

/// Builder for [`Options`].
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    opts: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.opts.content_type = Some(content_type.into());
        self
    }

    pub fn allow_images(mut self, allow: bool) -> Self {
        self.opts.allow_images = allow;
        self
    }

    pub fn clean_content(mut self, clean: bool) -> Self {
        self.opts.clean_content = clean;
        self
    }

    pub fn safelist(mut self, safelist: SafelistKind) -> Self {
        self.opts.safelist = safelist;
        self
    }

    pub fn null_behavior(mut self, nulls: NullBehavior) -> Self {
        self.opts.null_behavior = nulls;
        self
    }

    pub fn build(self) -> Options {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let opts = Options::builder()
            .content_type("text/html")
            .allow_images(true)
            .safelist(SafelistKind::Basic)
            .build();
        assert_eq!(opts.content_type.as_deref(), Some("text/html"));
        assert!(opts.clean_content);
        let cleaner = opts.cleaner().unwrap();
        assert!(cleaner.allows_images());
        assert!(cleaner.safelist().is_safe_tag("img"));
        assert!(!cleaner.safelist().is_safe_tag("h1"));
    }

    #[test]
    fn cleaning_can_be_disabled() {
        assert!(Options::builder().clean_content(false).build().cleaner().is_none());
    }

    #[test]
    fn safelist_kind_names() {
        assert_eq!(SafelistKind::from("basic-with-images"), SafelistKind::BasicWithImages);
        assert_eq!(SafelistKind::from("whatever"), SafelistKind::Content);
        assert_eq!(SafelistKind::ContentWithImages.to_string(), "content_with_images");
        assert_eq!(SafelistKind::SimpleText.with_images(), SafelistKind::SimpleText);
    }
}
