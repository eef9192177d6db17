// ABOUTME: Ordered candidate tables for every resolved metadata field, kept as data.
// ABOUTME: A Candidate names where a value comes from; tables are evaluated first-valid-wins.

use scraper::Html;

use super::fields::{first_attr, first_body_text, first_text, meta_content};
use crate::dom::Element;

/// One place a metadata value can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// Own text of the first auxiliary element with this name.
    Aux(&'static str),
    /// The nested `name` of a composite auxiliary element, else its own text.
    AuxName(&'static str),
    /// Own text of an auxiliary element, else its nested `url`.
    AuxLink(&'static str),
    /// `content` of the first matching meta tag with a value.
    Meta(&'static str),
    /// First non-empty attribute among matching elements.
    Attr(&'static str, &'static str),
    /// Text of the first matching element.
    Text(&'static str),
    /// Text of the first matching element inside `<body>`.
    BodyText(&'static str),
}

impl Candidate {
    /// The raw, trimmed value of this candidate, if present and non-empty.
    pub fn value(&self, doc: &Html, aux: &Element) -> Option<String> {
        let value = match *self {
            Candidate::Aux(name) => aux.first_named(name).map(Element::own_text),
            Candidate::AuxName(name) => aux.first_named(name).map(|el| {
                if el.has_child_elements() {
                    el.first_named("name").map(Element::own_text).unwrap_or_default()
                } else {
                    el.own_text()
                }
            }),
            Candidate::AuxLink(name) => aux.first_named(name).map(|el| {
                let own = el.own_text();
                if own.is_empty() {
                    el.first_named("url").map(Element::own_text).unwrap_or_default()
                } else {
                    own
                }
            }),
            Candidate::Meta(css) => meta_content(doc, css),
            Candidate::Attr(css, attr) => first_attr(doc, css, attr),
            Candidate::Text(css) => first_text(doc, css),
            Candidate::BodyText(css) => first_body_text(doc, css),
        }?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn is_aux(&self) -> bool {
        matches!(
            self,
            Candidate::Aux(_) | Candidate::AuxName(_) | Candidate::AuxLink(_)
        )
    }
}

/// Evaluates `candidates` in order and returns the first value `accept` keeps.
pub fn first_valid<T>(
    candidates: &[Candidate],
    doc: &Html,
    aux: &Element,
    mut accept: impl FnMut(&Candidate, String) -> Option<T>,
) -> Option<T> {
    for candidate in candidates {
        let Some(raw) = candidate.value(doc, aux) else {
            continue;
        };
        match accept(candidate, raw) {
            Some(found) => {
                tracing::trace!(?candidate, "metadata candidate hit");
                return Some(found);
            }
            None => tracing::debug!(?candidate, "metadata candidate rejected"),
        }
    }
    None
}

use Candidate::{Attr, Aux, AuxLink, AuxName, BodyText, Meta, Text};

pub const TITLE: &[Candidate] = &[
    Aux("title"),
    Aux("headline"),
    Meta(r#"meta[property="og:title"]"#),
    Meta(r#"meta[name="og:title"]"#),
    Meta(r#"meta[name="twitter:title"]"#),
    Meta(r#"meta[property="twitter:title"]"#),
    Meta(r#"meta[name="parsely-title"]"#),
    Meta(r#"meta[name="sailthru.title"]"#),
    Meta(r#"meta[name="title"]"#),
    Meta(r#"meta[name="dc:title"]"#),
    Meta(r#"meta[name="DC.title"]"#),
    Meta(r#"meta[property="dc:title"]"#),
    Text("title"),
];

pub const AUTHOR: &[Candidate] = &[
    AuxName("author"),
    Aux("creator"),
    Aux("byline"),
    Aux("author_name"),
    Aux("author_nickname"),
    Meta(r#"meta[name="Author"]"#),
    Meta(r#"meta[name="author"]"#),
    Meta(r#"meta[name="dc.creator"]"#),
    Meta(r#"meta[name="DC.creator"]"#),
    Meta(r#"meta[itemprop="name"]"#),
    Meta(r#"meta[property="author"]"#),
    Meta(r#"meta[property="article:author"]"#),
    Meta(r#"meta[name="article:author"]"#),
    Meta(r#"meta[name="article:authorName"]"#),
    Meta(r#"meta[property="article:authorName"]"#),
    Meta(r#"meta[name="parsely-author"]"#),
    Meta(r#"meta[name="sailthru.author"]"#),
    Meta(r#"meta[name="twitter:creator"]"#),
    Meta(r#"meta[property="byline"]"#),
    BodyText(r#"a[itemprop="author"]"#),
    BodyText(r#"span[itemprop="author"]"#),
    BodyText(r#"a[rel="author"]"#),
    BodyText(r#"span[property="dc:creator"]"#),
    BodyText(r#"div[property="dc:creator"]"#),
];

pub const CANONICAL_LINK: &[Candidate] = &[
    Attr(r#"link[rel="canonical"]"#, "href"),
    Meta(r#"meta[property="og:url"]"#),
    Meta(r#"meta[name="og:url"]"#),
    Meta(r#"meta[name="twitter:url"]"#),
    Meta(r#"meta[property="twitter:url"]"#),
    Meta(r#"meta[name="parsely-link"]"#),
    Aux("link"),
    Aux("url"),
];

/// Extra links that identify the page itself.
pub const ALT_SELF_LINKS: &[Candidate] = &[Attr(r#"link[rel="shortlink"]"#, "href")];

pub const SUMMARY: &[Candidate] = &[
    Meta(r#"meta[name="twitter:description"]"#),
    Meta(r#"meta[property="twitter:description"]"#),
    Meta(r#"meta[name="description"]"#),
    Meta(r#"meta[itemprop="description"]"#),
    Meta(r#"meta[property="og:description"]"#),
    Meta(r#"meta[name="og:description"]"#),
    Meta(r#"meta[name="sailthru.description"]"#),
];

pub const SITE_NAME: &[Candidate] = &[
    Meta(r#"meta[property="og:site_name"]"#),
    Meta(r#"meta[name="og:site_name"]"#),
    Meta(r#"meta[name="dc.publisher"]"#),
    Meta(r#"meta[name="DC.publisher"]"#),
    Meta(r#"meta[property="dc.publisher"]"#),
];

pub const PUBLISH_TIME: &[Candidate] = &[
    Aux("pub_date"),
    Aux("published_date"),
    Aux("dateCreated"),
    Aux("datePublished"),
    Meta(r#"meta[property="article:published_time"]"#),
    Meta(r#"meta[name="article:published_time"]"#),
    Meta(r#"meta[property="og:article:published_time"]"#),
    Meta(r#"meta[property="pubDate"]"#),
    Meta(r#"meta[name="pubDate"]"#),
    Meta(r#"meta[name="parsely-pub-date"]"#),
    Meta(r#"meta[itemprop="datePublished"]"#),
    Meta(r#"meta[property="st:published_at"]"#),
    Meta(r#"meta[name="publish-date"]"#),
    Meta(r#"meta[name="publish_date"]"#),
    Meta(r#"meta[property="og:updated_time"]"#),
    Meta(r#"meta[name="ptime"]"#),
    Meta(r#"meta[property="article:published"]"#),
    Meta(r#"meta[name="sailthru.date"]"#),
    Meta(r#"meta[name="date"]"#),
    Meta(r#"meta[name="dcterms.date"]"#),
    Meta(r#"meta[name="dc.date"]"#),
    Meta(r#"meta[name="DC.date"]"#),
    Attr(r#"time[itemprop="datePublished"]"#, "datetime"),
    Text(r#"time[itemprop="datePublished"]"#),
    Text(r#"span[itemprop="datePublished"]"#),
    Text(r#"a[itemprop="datePublished"]"#),
];

/// Image candidates consulted after the Open Graph image groups.
pub const META_IMAGES: &[Candidate] = &[
    AuxLink("image_url"),
    AuxLink("image"),
    Meta(r#"meta[name="twitter:image"]"#),
    Meta(r#"meta[property="twitter:image"]"#),
    Meta(r#"meta[name="twitter:image:src"]"#),
    Meta(r#"meta[name="parsely-image-url"]"#),
    Meta(r#"meta[name="thumbnail"]"#),
    Meta(r#"meta[name="sailthru.image.thumb"]"#),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::compiled::selector;

    #[test]
    fn every_table_selector_compiles() {
        let tables = [
            TITLE,
            AUTHOR,
            CANONICAL_LINK,
            ALT_SELF_LINKS,
            SUMMARY,
            SITE_NAME,
            PUBLISH_TIME,
            META_IMAGES,
        ];
        for candidate in tables.iter().flat_map(|t| t.iter()) {
            let css = match candidate {
                Meta(css) | Attr(css, _) | Text(css) | BodyText(css) => css,
                _ => continue,
            };
            assert!(selector(css).is_some(), "{}", css);
        }
    }

    #[test]
    fn auxiliary_candidates_precede_meta_tags() {
        for table in [TITLE, AUTHOR, PUBLISH_TIME] {
            let first_meta = table.iter().position(|c| !c.is_aux()).unwrap();
            assert!(table[first_meta..].iter().all(|c| !c.is_aux()));
        }
    }

    #[test]
    fn composite_author_uses_nested_name() {
        let doc = Html::parse_document("<p>x</p>");
        let aux = Element::new("aux").with_child(
            Element::new("author")
                .with_child(Element::new("@type").with_text("Person"))
                .with_child(Element::new("name").with_text("Jane Doe")),
        );
        assert_eq!(AuxName("author").value(&doc, &aux).as_deref(), Some("Jane Doe"));
        let flat = Element::new("aux").with_child(Element::new("author").with_text(" Flat "));
        assert_eq!(AuxName("author").value(&doc, &flat).as_deref(), Some("Flat"));
    }

    #[test]
    fn first_valid_skips_rejected_values() {
        let doc = Html::parse_document(
            r#"<meta name="author" content="http://x.com"><meta name="dc.creator" content="Jane">"#,
        );
        let aux = Element::new("aux");
        let found = first_valid(AUTHOR, &doc, &aux, |_, v| (!v.starts_with("http")).then_some(v));
        assert_eq!(found.as_deref(), Some("Jane"));
    }
}
