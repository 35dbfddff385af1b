// src/upstream/client.rs

//! HTTP client for upstream operations
//!
//! Wraps a blocking reqwest client with a mandatory timeout. Requests are
//! never retried: a failed request is a failed operation.

use crate::error::{Error, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Media type for the GitHub REST API
const GITHUB_JSON: &str = "application/vnd.github.v3+json";

/// User agent sent with every request (GitHub rejects requests without one)
const USER_AGENT: &str = concat!("overlay-sync/", env!("CARGO_PKG_VERSION"));

/// A JSON page together with the URL of the next page, if any
#[derive(Debug)]
pub struct JsonPage<T> {
    pub body: T,
    pub next: Option<String>,
}

/// Blocking HTTP client wrapper
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::build(timeout, None)
    }

    /// Create a client that authenticates with a bearer `token`
    pub fn with_token(timeout: Duration, token: Option<&str>) -> Result<Self> {
        Self::build(timeout, token)
    }

    fn build(timeout: Duration, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|e| Error::ConfigError(format!("Invalid API token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// GET `url`, failing on transport errors and non-success status
    pub fn get(&self, url: &str) -> Result<Response> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        Ok(response)
    }

    /// GET a JSON document and the `rel="next"` link of its page
    pub fn get_json_page<T: DeserializeOwned>(&self, url: &str) -> Result<JsonPage<T>> {
        let response = self.get(url)?;
        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_link);

        let body = response
            .json::<T>()
            .map_err(|e| Error::ParseError(format!("Invalid JSON from {url}: {e}")))?;

        Ok(JsonPage { body, next })
    }
}

/// Extract the `rel="next"` target of an RFC 8288 `Link` header
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}
