// ABOUTME: Small URL helpers shared by the metadata resolver, page parser and drivers.
// ABOUTME: Covers http(s) link normalization, protocols and absolute URL resolution.

use url::Url;

/// Returns `url` if it is an http(s) link. Protocol-relative links (`//host/...`)
/// get `default_protocol` (or `https`) prepended. Anything else is `None`.
pub fn http_url(url: &str, default_protocol: Option<&str>) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Some(url.to_string())
    } else if url.starts_with("//") {
        let protocol = default_protocol.filter(|p| !p.is_empty()).unwrap_or("https");
        Some(format!("{}:{}", protocol, url))
    } else {
        None
    }
}

/// Scheme of an absolute URL.
pub fn protocol(link: &str) -> Option<String> {
    Url::parse(link.trim()).ok().map(|u| u.scheme().to_string())
}

/// Resolves `href` against `base`. Absolute hrefs are returned as parsed.
pub fn abs_url(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => base.and_then(|b| b.join(href).ok()).map(String::from),
    }
}

/// True if `link` parses as an absolute http(s) URL.
pub fn is_http_url(link: &str) -> bool {
    Url::parse(link.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_url_normalizes_links() {
        assert_eq!(http_url(" https://a.com/x ", None).as_deref(), Some("https://a.com/x"));
        assert_eq!(http_url("//a.com/x", None).as_deref(), Some("https://a.com/x"));
        assert_eq!(http_url("//a.com/x", Some("http")).as_deref(), Some("http://a.com/x"));
        assert_eq!(http_url("ftp://a.com", None), None);
        assert_eq!(http_url("/relative", None), None);
        assert_eq!(http_url("", None), None);
    }

    #[test]
    fn protocols() {
        assert_eq!(protocol("https://x.com").as_deref(), Some("https"));
        assert_eq!(protocol("nope"), None);
    }

    #[test]
    fn abs_url_resolves_against_base() {
        let base = Url::parse("https://example.com/a/b").unwrap();
        assert_eq!(abs_url(Some(&base), "c").as_deref(), Some("https://example.com/a/c"));
        assert_eq!(abs_url(None, "c"), None);
        assert_eq!(
            abs_url(None, "http://x.com/y").as_deref(),
            Some("http://x.com/y")
        );
        assert!(is_http_url("http://x.com"));
        assert!(!is_http_url("mailto:x@y.z"));
    }
}
