// ABOUTME: Builds the auxiliary metadata tree from JSON embedded in a page (Parsely, Contextly, JSON-LD).
// ABOUTME: Each JSON blob is flattened under one "aux" root; unparseable blobs are skipped.

use scraper::Html;
use tracing::debug;

use super::fields::{meta_content, select_all};
use crate::dom::Element;
use crate::json_tree::{append_value_into, NullBehavior};

/// Name of the root element of the auxiliary tree.
pub const AUX_ROOT: &str = "aux";

/// Meta tags whose `content` is a JSON document.
pub const JSON_META: &[&str] = &[
    r#"meta[name="parsely-metadata"]"#,
    r#"meta[name="parsely-page"]"#,
    r#"meta[name="contextly-page"]"#,
];

/// Script tags whose text is a JSON document.
pub const JSON_SCRIPTS: &[&str] = &[
    r#"script[type="application/ld+json"]"#,
    r#"script[type="json/pageinfo"]"#,
];

/// Collects every embedded JSON blob of `doc` into one tree.
pub fn collect(doc: &Html) -> Element {
    collect_with(doc, NullBehavior::Empty)
}

pub fn collect_with(doc: &Html, nulls: NullBehavior) -> Element {
    let mut root = Element::new(AUX_ROOT);
    for css in JSON_META {
        if let Some(json) = meta_content(doc, css) {
            append_json(&mut root, &json, nulls, css);
        }
    }
    for css in JSON_SCRIPTS {
        for script in select_all(doc, css) {
            let json: String = script.text().collect();
            if !json.trim().is_empty() {
                append_json(&mut root, &json, nulls, css);
            }
        }
    }
    root
}

fn append_json(root: &mut Element, json: &str, nulls: NullBehavior, source: &str) {
    match serde_json::from_str::<serde_json::Value>(json.trim()) {
        Ok(value) => append_value_into(root, &value, nulls),
        Err(err) => debug!(source, error = %err, "skipping unparseable embedded JSON"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_meta_and_script_json() {
        let doc = Html::parse_document(
            r#"<html><head>
            <meta name="parsely-page" content='{"title":"Parsely Title","author":"Jane Doe"}'>
            <script type="application/ld+json">{"@context":"https://schema.org","headline":"LD","author":{"name":"LD Author"}}</script>
            <script type="application/ld+json">{ not json</script>
            </head><body></body></html>"#,
        );
        let aux = collect(&doc);
        assert!(aux.is(AUX_ROOT));
        assert_eq!(aux.child_text("title"), "Parsely Title");
        assert_eq!(aux.child_text("headline"), "LD");
        let authors = aux.descendants_named("author");
        assert_eq!(authors.len(), 2);
        assert!(authors[1].has_child_elements());
    }

    #[test]
    fn top_level_arrays_repeat_the_root() {
        let doc = Html::parse_document(
            r#"<script type="application/ld+json">[{"headline":"A"},{"headline":"B"}]</script>"#,
        );
        let aux = collect(&doc);
        assert_eq!(aux.descendants_named("headline").len(), 2);
    }
}
