// ABOUTME: Property tests for the content sanitizer over generated trees.
// ABOUTME: Sanitized output never escapes the safelist and sanitizing twice changes nothing.

use pagesift_core::clean::{ContentCleaner, DefaultContentCleaner};
use pagesift_core::dom::{parse_body_fragment, render_children, Element, Node};
use pagesift_core::safelist::Safelist;
use proptest::prelude::*;
use proptest::sample::{select, Index};

const TAGS: &[&str] = &[
    "p", "div", "span", "b", "i", "em", "strong", "a", "img", "ul", "li", "blockquote", "q",
    "h1", "h2", "pre", "code", "br", "script", "style", "iframe", "object", "form", "font",
    "x-widget", "article", "section", "embed", "svg", "button",
];

const ATTRS: &[(&str, &[&str])] = &[
    ("href", &["https://example.com/a", "/relative", "javascript:alert(1)", "mailto:x@example.com", "//cdn.example.com/x", "data:text/html,hi"]),
    ("src", &["https://example.com/i.png", "/i.png", "javascript:alert(1)", ""]),
    ("cite", &["https://example.com/c", "vbscript:x"]),
    ("onclick", &["alert(1)"]),
    ("onload", &["alert(1)"]),
    ("style", &["color:red"]),
    ("class", &["lead", "twitter-tweet"]),
    ("title", &["A title"]),
    ("alt", &["Alt text"]),
    ("data-id", &["7"]),
    ("width", &["100"]),
];

const TEXTS: &[&str] = &["hello", " ", "a < b & c", "\u{a0}", "pic.twitter.com/x", "<script>"];

const BASE_URI: &str = "https://example.com/post";

fn attrs() -> impl Strategy<Value = Vec<(&'static str, &'static str)>> {
    prop::collection::vec((0..ATTRS.len(), any::<Index>()), 0..4).prop_map(|picks| {
        picks
            .into_iter()
            .map(|(i, value)| {
                let (name, values) = ATTRS[i];
                (name, *value.get(values))
            })
            .collect()
    })
}

fn node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        3 => select(TEXTS).prop_map(|t| Node::Text(t.to_string())),
        1 => Just(Node::Comment("comment".to_string())),
    ];
    leaf.prop_recursive(5, 64, 5, |inner| {
        (select(TAGS), attrs(), prop::collection::vec(inner, 0..5)).prop_map(
            |(tag, attrs, children)| {
                let mut el = Element::new(tag);
                for (name, value) in attrs {
                    if !el.has_attr(name) {
                        el = el.with_attr(name, value);
                    }
                }
                el.children = children;
                Node::Element(el)
            },
        )
    })
}

fn body() -> impl Strategy<Value = Element> {
    prop::collection::vec(node(), 1..5).prop_map(|children| {
        let mut body = Element::new("body");
        body.children = children;
        body
    })
}

fn cleaners() -> Vec<(&'static str, DefaultContentCleaner)> {
    vec![
        ("content", DefaultContentCleaner::new()),
        ("content_with_images", DefaultContentCleaner::with_images()),
        ("basic", DefaultContentCleaner::new().with_safelist(Safelist::basic())),
        ("simple_text", DefaultContentCleaner::new().with_safelist(Safelist::simple_text())),
        ("none", DefaultContentCleaner::new().with_safelist(Safelist::none())),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn sanitized_trees_stay_inside_the_safelist(root in body()) {
        for (name, cleaner) in cleaners() {
            let mut tree = root.clone();
            cleaner.transform(&mut tree, Some(BASE_URI));
            let violations = cleaner.safelist().violations(&tree);
            prop_assert!(
                violations.is_empty(),
                "{} escaped: {:?}\n{}",
                name,
                violations,
                render_children(&tree)
            );
        }
    }

    #[test]
    fn rendered_output_reparses_inside_the_safelist(root in body()) {
        for (name, cleaner) in cleaners() {
            let mut tree = root.clone();
            cleaner.transform(&mut tree, Some(BASE_URI));
            let html = cleaner.to_clean_content(&tree);
            let reparsed = parse_body_fragment(&html);
            let reparsed_body = reparsed.child_named("body").cloned().unwrap_or_default();
            let violations = cleaner.safelist().violations(&reparsed_body);
            prop_assert!(violations.is_empty(), "{}: {:?}\n{}", name, violations, html);
        }
    }

    #[test]
    fn sanitizing_is_idempotent(root in body()) {
        for (name, cleaner) in cleaners() {
            let mut tree = root.clone();
            cleaner.transform(&mut tree, Some(BASE_URI));
            let once = render_children(&tree);
            cleaner.transform(&mut tree, Some(BASE_URI));
            prop_assert_eq!(once, render_children(&tree), "{}", name);
        }
    }
}

#[test]
fn dangerous_markup_never_survives() {
    let cleaner = DefaultContentCleaner::with_images();
    let mut root = parse_body_fragment(
        r#"<p onclick="x()">Hi<script>alert(1)</script>
           <a href="javascript:alert(1)">bad</a>
           <img src="x" onerror="alert(1)">
           <iframe src="https://evil.example.com"></iframe>
           <style>p{}</style></p>"#,
    );
    cleaner.transform(&mut root, Some("https://example.com/"));
    let html = cleaner.to_clean_content(&root);
    for needle in ["onclick", "onerror", "<script", "javascript:", "<style", "<iframe"] {
        assert!(!html.contains(needle), "{} survived in {}", needle, html);
    }
    assert!(html.contains("bad"));
}

#[test]
fn ammonia_rendering_agrees_on_dangerous_markup() {
    let cleaned = Safelist::content().clean(
        r#"<p onclick="x()">ok <script>alert(1)</script><a href="javascript:alert(1)">bad</a></p>"#,
    );
    assert!(!cleaned.contains("<script"));
    assert!(!cleaned.contains("onclick"));
    assert!(!cleaned.contains("javascript:"));
    assert!(cleaned.contains("ok"));
}
