// ABOUTME: Field extraction helpers over scraper documents: meta content, attributes and element text.
// ABOUTME: Every helper trims values and treats empty strings as no match.

use scraper::{ElementRef, Html};

use super::compiled::selector;
use crate::dom::normalize_space;

/// All elements matching `css`, in document order. Invalid selectors match nothing.
pub fn select_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => doc.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// First non-empty `attr` value among the elements matching `css`.
pub fn first_attr(doc: &Html, css: &str, attr: &str) -> Option<String> {
    select_all(doc, css)
        .into_iter()
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// First non-empty `content` attribute among the meta tags matching `css`.
pub fn meta_content(doc: &Html, css: &str) -> Option<String> {
    first_attr(doc, css, "content")
}

/// Text of the first element matching `css`, whitespace collapsed.
pub fn first_text(doc: &Html, css: &str) -> Option<String> {
    let el = select_all(doc, css).into_iter().next()?;
    let text = element_text(el);
    (!text.is_empty()).then_some(text)
}

/// Text of the first element matching `css` inside `<body>`.
pub fn first_body_text(doc: &Html, css: &str) -> Option<String> {
    let body = select_all(doc, "body").into_iter().next()?;
    let sel = selector(css)?;
    let el = body.select(&sel).next()?;
    let text = element_text(el);
    (!text.is_empty()).then_some(text)
}

pub fn element_text(el: ElementRef<'_>) -> String {
    normalize_space(&el.text().collect::<Vec<_>>().join(" "))
}

/// The document's `<title>` text.
pub fn document_title(doc: &Html) -> String {
    first_text(doc, "title").unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <html>
        <head>
            <title> The   Title </title>
            <meta name="author" content="  Jane Doe  ">
            <meta name="empty" content="  ">
            <meta name="empty" content="second">
            <meta property="og:image" content="https://example.com/og.jpg">
        </head>
        <body>
            <span class="byline">By   John Smith</span>
        </body>
        </html>
    "#;

    #[test]
    fn meta_content_skips_empty_values() {
        let doc = Html::parse_document(SAMPLE_HTML);
        assert_eq!(meta_content(&doc, r#"meta[name="author"]"#).as_deref(), Some("Jane Doe"));
        assert_eq!(meta_content(&doc, r#"meta[name="empty"]"#).as_deref(), Some("second"));
        assert_eq!(meta_content(&doc, r#"meta[name="missing"]"#), None);
    }

    #[test]
    fn text_is_normalized() {
        let doc = Html::parse_document(SAMPLE_HTML);
        assert_eq!(document_title(&doc), "The Title");
        assert_eq!(first_body_text(&doc, "span.byline").as_deref(), Some("By John Smith"));
        assert_eq!(first_attr(&doc, r#"meta[property="og:image"]"#, "content").as_deref(), Some("https://example.com/og.jpg"));
    }
}
