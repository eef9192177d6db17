// ABOUTME: Process-wide cache of compiled CSS selectors used by the metadata resolver and page parser.
// ABOUTME: Invalid selectors are cached as None so they are only parsed once.

//! Selector caching.
//!
//! Candidate tables are static strings that are evaluated for every
//! document, so each selector is parsed on first use and shared afterwards.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use scraper::Selector;

static CACHE: Lazy<SelectorCache> = Lazy::new(SelectorCache::default);

#[derive(Default)]
struct SelectorCache {
    compiled: RwLock<HashMap<String, Option<Selector>>>,
}

impl SelectorCache {
    fn get(&self, css: &str) -> Option<Selector> {
        if let Some(hit) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(css)
        {
            return hit.clone();
        }
        self.compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(css.to_string())
            .or_insert_with(|| {
                let parsed = Selector::parse(css).ok();
                if parsed.is_none() {
                    tracing::debug!(selector = css, "invalid selector");
                }
                parsed
            })
            .clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// The compiled form of `css`, or `None` when it does not parse.
pub fn selector(css: &str) -> Option<Selector> {
    CACHE.get(css)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_compile_once() {
        let cache = SelectorCache::default();
        assert!(cache.get(r#"meta[property="og:title"]"#).is_some());
        assert!(cache.get(r#"meta[property="og:title"]"#).is_some());
        assert!(cache.get("[[[invalid").is_none());
        assert!(cache.get("[[[invalid").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn shared_cache_answers_lookups() {
        assert!(selector("time").is_some());
        assert!(selector("a[").is_none());
    }
}
