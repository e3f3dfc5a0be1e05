//! Upstream fetching for the interception proxy.

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;

use super::cache::CachedResponse;

/// How a request participates in caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// A page navigation: network-first, shell fallback when offline
    Navigation,
    /// Everything else (scripts, styles, images): cache-first
    Asset,
}

/// An intercepted outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub class: RequestClass,
}

impl Request {
    pub fn navigation(url: impl Into<String>) -> Self {
        Self { url: url.into(), class: RequestClass::Navigation }
    }

    pub fn asset(url: impl Into<String>) -> Self {
        Self { url: url.into(), class: RequestClass::Asset }
    }

    /// Whether the request travels over a standard web transport.
    ///
    /// Anything else (extension schemes, data URLs, absent schemes treated
    /// as relative paths on the app origin — those are web) is passed
    /// through untouched: never cached, never matched.
    #[must_use]
    pub fn is_web_scheme(&self) -> bool {
        match self.url.split_once("://") {
            Some((scheme, _)) => matches!(scheme, "http" | "https"),
            // Origin-relative path like "/app.js"
            None => !self.url.contains(':'),
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network unreachable: {0}")]
    Offline(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Upstream fetch, abstracted so tests can script outages.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse, FetchError>;
}

/// reqwest-backed fetcher. Same-origin is judged against the configured
/// application origin; origin-relative paths are resolved against it.
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: String,
}

impl HttpFetcher {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, url: &str) -> String {
        if url.contains("://") {
            url.to_string()
        } else {
            format!("{}{}", self.origin, url)
        }
    }

    fn is_same_origin(&self, absolute: &str) -> bool {
        // Prefix matching is not enough: "https://app.example.evil.com"
        // starts with "https://app.example". Compare parsed origins.
        match (Url::parse(&self.origin), Url::parse(absolute)) {
            (Ok(origin), Ok(url)) => {
                url.scheme() == origin.scheme()
                    && url.host() == origin.host()
                    && url.port_or_known_default() == origin.port_or_known_default()
            }
            _ => false,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse, FetchError> {
        let url = self.resolve(&request.url);
        let same_origin = self.is_same_origin(&url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    FetchError::Offline(e.to_string())
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?
            .to_vec();

        Ok(CachedResponse {
            status,
            body,
            content_type,
            opaque: false,
            same_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_scheme_detection() {
        assert!(Request::asset("https://basketi.example/app.js").is_web_scheme());
        assert!(Request::asset("http://basketi.example/").is_web_scheme());
        assert!(Request::asset("/icon.png").is_web_scheme());
        assert!(!Request::asset("chrome-extension://abc/inject.js").is_web_scheme());
        assert!(!Request::asset("data:text/plain,hi").is_web_scheme());
        assert!(!Request::asset("ftp://files.example/x").is_web_scheme());
    }

    #[test]
    fn test_resolve_relative_against_origin() {
        let fetcher = HttpFetcher::new("https://basketi.example/");
        assert_eq!(fetcher.resolve("/app.js"), "https://basketi.example/app.js");
        assert_eq!(
            fetcher.resolve("https://cdn.example/lib.js"),
            "https://cdn.example/lib.js"
        );
        assert!(!fetcher.is_same_origin("https://cdn.example/lib.js"));
        assert!(fetcher.is_same_origin("https://basketi.example/app.js"));
    }

    #[test]
    fn test_same_origin_requires_exact_host() {
        let fetcher = HttpFetcher::new("https://basketi.example");

        // A foreign host that merely extends the origin string
        assert!(!fetcher.is_same_origin("https://basketi.example.evil.com/app.js"));
        assert!(!fetcher.is_same_origin("https://basketi.example-evil.com/"));
        assert!(!fetcher.is_same_origin("http://basketi.example/app.js"), "scheme matters");
        assert!(!fetcher.is_same_origin("https://basketi.example:8443/app.js"), "port matters");

        // Explicit default port is still the same origin
        assert!(fetcher.is_same_origin("https://basketi.example:443/app.js"));
        assert!(fetcher.is_same_origin("https://basketi.example/deep/path?q=1"));
    }
}
