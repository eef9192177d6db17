// ABOUTME: oEmbed provider registry: parses the providers.json format and matches links to endpoints.
// ABOUTME: Endpoint URL schemes use `*` wildcards and are matched against the whole link.

//! oEmbed providers.
//!
//! The registry published at [`DEFAULT_PROVIDERS_URL`] lists, for each
//! provider, the endpoints to query and the URL schemes each endpoint
//! serves. [`from_json`] reads that document; [`domain_map`] indexes the
//! endpoints by host so [`find_endpoint`] can pick the one for a link.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::error::ParseError;

pub const DEFAULT_PROVIDERS_URL: &str = "https://oembed.com/providers.json";

const PARSER: &str = "oEmbed-providers";

/// One endpoint of a provider and the link schemes it answers for.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    pub schemes: Vec<String>,
    patterns: Vec<Regex>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, schemes: Vec<String>) -> Self {
        let patterns = schemes.iter().filter_map(|s| scheme_pattern(s)).collect();
        Self {
            url: url.into(),
            schemes,
            patterns,
        }
    }

    /// True if `link` matches any of the endpoint's schemes.
    pub fn matches(&self, link: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(link))
    }
}

/// `http://*.flickr.com/photos/*` matches the whole link, with `*` matching anything.
fn scheme_pattern(scheme: &str) -> Option<Regex> {
    let body: Vec<String> = scheme.split('*').map(regex::escape).collect();
    match Regex::new(&format!("^{}$", body.join(".*"))) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::debug!(scheme, error = %err, "skipping oEmbed scheme");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct OEmbedProvider {
    pub name: String,
    pub url: String,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProviderRecord {
    provider_name: String,
    provider_url: String,
    endpoints: Vec<EndpointRecord>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct EndpointRecord {
    url: String,
    schemes: Vec<String>,
}

/// Reads a providers.json array, keyed by provider URL. Providers without a
/// URL and endpoints without a URL are skipped.
pub fn from_json(json: &str) -> Result<BTreeMap<String, OEmbedProvider>, ParseError> {
    let records: Vec<ProviderRecord> = serde_json::from_str(json)
        .map_err(|err| ParseError::json(PARSER, "Invalid oEmbed provider list", err))?;
    let mut providers = BTreeMap::new();
    for record in records {
        if record.provider_url.trim().is_empty() {
            continue;
        }
        let endpoints = record
            .endpoints
            .into_iter()
            .filter(|e| !e.url.trim().is_empty())
            .map(|e| Endpoint::new(e.url, e.schemes))
            .collect();
        providers.insert(
            record.provider_url.clone(),
            OEmbedProvider {
                name: record.provider_name,
                url: record.provider_url,
                endpoints,
            },
        );
    }
    tracing::debug!(providers = providers.len(), "loaded oEmbed providers");
    Ok(providers)
}

/// Endpoints indexed by the host their schemes name. A leading `*.` label is
/// dropped, so `*.flickr.com` is indexed under `flickr.com`.
pub fn domain_map<'a>(
    providers: impl IntoIterator<Item = &'a OEmbedProvider>,
) -> HashMap<String, Vec<Endpoint>> {
    let mut map: HashMap<String, Vec<Endpoint>> = HashMap::new();
    for provider in providers {
        for endpoint in &provider.endpoints {
            let mut hosts: Vec<String> =
                endpoint.schemes.iter().filter_map(|s| scheme_host(s)).collect();
            hosts.sort();
            hosts.dedup();
            for host in hosts {
                map.entry(host).or_default().push(endpoint.clone());
            }
        }
    }
    map
}

fn scheme_host(scheme: &str) -> Option<String> {
    let sample = scheme.replace('*', "x").replace("{format}", "json");
    let url = Url::parse(&sample).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let wildcard = scheme
        .split("://")
        .nth(1)
        .is_some_and(|rest| rest.starts_with("*."));
    match host.split_once('.') {
        Some((_, parent)) if wildcard => Some(parent.to_string()),
        _ => Some(host),
    }
}

/// The first endpoint whose schemes match `link`, looked up under the link's
/// host and then each parent domain.
pub fn find_endpoint<'a>(map: &'a HashMap<String, Vec<Endpoint>>, link: &str) -> Option<&'a Endpoint> {
    let url = Url::parse(link.trim()).ok()?;
    let mut host = url.host_str()?.to_ascii_lowercase();
    loop {
        if let Some(found) = map
            .get(&host)
            .and_then(|endpoints| endpoints.iter().find(|e| e.matches(link.trim())))
        {
            return Some(found);
        }
        match host.split_once('.') {
            Some((_, parent)) if parent.contains('.') => host = parent.to_string(),
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PROVIDERS: &str = r#"[
        {
            "provider_name": "Flickr",
            "provider_url": "https://www.flickr.com/",
            "endpoints": [{
                "schemes": ["http://*.flickr.com/photos/*", "http://flic.kr/p/*",
                            "https://*.flickr.com/photos/*", "https://flic.kr/p/*"],
                "url": "https://www.flickr.com/services/oembed/",
                "discovery": true
            }]
        },
        {
            "provider_name": "Spotify",
            "provider_url": "https://spotify.com/",
            "endpoints": [{
                "schemes": ["https://open.spotify.com/*", "spotify:*"],
                "url": "https://embed.spotify.com/oembed/"
            }]
        },
        {
            "provider_name": "No URL",
            "provider_url": "",
            "endpoints": [{"schemes": ["https://nourl.com/*"], "url": "https://nourl.com/oembed"}]
        },
        {
            "provider_name": "Empty Endpoint",
            "provider_url": "https://empty.com/",
            "endpoints": [{"schemes": ["https://empty.com/*"], "url": ""}]
        }
    ]"#;

    #[test]
    fn providers_are_keyed_by_url() {
        let providers = from_json(PROVIDERS).unwrap();
        assert_eq!(providers.len(), 3);
        assert_eq!(providers["https://spotify.com/"].name, "Spotify");
        assert!(providers["https://empty.com/"].endpoints.is_empty());
    }

    #[test]
    fn exact_host_scheme_matches() {
        let providers = from_json(PROVIDERS).unwrap();
        let map = domain_map(providers.values());
        let link = "https://open.spotify.com/track/298gs9ATwr2rD9tGYJKlQR";
        let endpoints = &map["open.spotify.com"];
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints[0].matches(link));
        assert_eq!(
            find_endpoint(&map, link).map(|e| e.url.as_str()),
            Some("https://embed.spotify.com/oembed/")
        );
    }

    #[test]
    fn wildcard_subdomain_scheme_matches() {
        let providers = from_json(PROVIDERS).unwrap();
        let map = domain_map(providers.values());
        let link = "https://doh.flickr.com/photos/86832534@N03/42728148584/";
        let endpoints = &map["flickr.com"];
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints[0].matches(link));
        assert_eq!(
            find_endpoint(&map, link).map(|e| e.url.as_str()),
            Some("https://www.flickr.com/services/oembed/")
        );
    }

    #[test]
    fn schemes_match_the_whole_link() {
        let endpoint = Endpoint::new("https://e/", vec!["https://a.com/p/*.html".to_string()]);
        assert!(endpoint.matches("https://a.com/p/x/y.html"));
        assert!(!endpoint.matches("https://a.com/p/x/y.htm"));
        assert!(!endpoint.matches("https://a.com/p/x.html?q"));
        assert!(!endpoint.matches("https://aXcom/p/x.html"));
    }

    #[test]
    fn unknown_links_have_no_endpoint() {
        let providers = from_json(PROVIDERS).unwrap();
        let map = domain_map(providers.values());
        assert!(find_endpoint(&map, "https://example.com/photos/1").is_none());
        assert!(find_endpoint(&map, "https://www.flickr.com/about").is_none());
        assert!(find_endpoint(&map, "not a link").is_none());
    }

    #[test]
    fn malformed_lists_are_json_errors() {
        assert!(from_json("{\"provider_name\": 1}").unwrap_err().is_json());
    }
}
