// src/upstream/releases.rs

//! Upstream release feed and latest-release resolution
//!
//! The feed is newest-first. For each channel the first release whose title
//! carries the channel's prefix *and* whose asset list contains the expected
//! distfile wins. Releases announced before their packages are uploaded are
//! therefore skipped in favour of an older, complete one.

use super::client::{HttpClient, JsonPage};
use crate::channel::Channel;
use crate::config::OverlayConfig;
use crate::error::{Error, Result};
use crate::version::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use url::Url;

/// One release object of the feed
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseRecord {
    /// Human title, e.g. `Beta 1.80.12`
    #[serde(rename = "name", default)]
    pub title: Option<String>,
    /// Tag with a leading `v`
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

impl ReleaseRecord {
    /// Whether an asset named `name` is attached
    pub fn has_asset(&self, name: &str) -> bool {
        self.assets.iter().any(|a| a.name == name)
    }
}

/// A downloadable asset of a release
#[derive(Debug, Clone, Deserialize)]
pub struct AssetRecord {
    pub name: String,
}

/// One page of the feed
#[derive(Debug, Clone, Default)]
pub struct ReleasePage {
    pub releases: Vec<ReleaseRecord>,
    /// Cursor for the next page; `None` on the last page
    pub next: Option<String>,
}

/// Paginated source of release records
pub trait ReleaseFeed {
    /// Fetch the first page (`cursor == None`) or the page at `cursor`
    fn fetch_page(&self, cursor: Option<&str>) -> Result<ReleasePage>;
}

/// GitHub REST releases endpoint
pub struct GithubReleaseFeed {
    client: HttpClient,
    url: String,
    per_page: u32,
}

impl GithubReleaseFeed {
    pub fn new(client: HttpClient, url: impl Into<String>, per_page: u32) -> Self {
        Self {
            client,
            url: url.into(),
            per_page,
        }
    }

    /// Feed described by `config`, authenticated if its token variable is set
    pub fn from_config(config: &OverlayConfig) -> Result<Self> {
        let token = std::env::var(&config.upstream.token_env)
            .ok()
            .filter(|t| !t.is_empty());
        if token.is_some() {
            debug!("Using API token from ${}", config.upstream.token_env);
        }
        let client = HttpClient::with_token(config.feed_timeout(), token.as_deref())?;
        Ok(Self::new(
            client,
            config.upstream.releases_url.clone(),
            config.upstream.per_page,
        ))
    }

    fn first_page_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| Error::ConfigError(format!("Invalid releases URL '{}': {e}", self.url)))?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.per_page.to_string());
        Ok(url.into())
    }
}

impl ReleaseFeed for GithubReleaseFeed {
    fn fetch_page(&self, cursor: Option<&str>) -> Result<ReleasePage> {
        let url = match cursor {
            Some(next) => next.to_string(),
            None => self.first_page_url()?,
        };
        let JsonPage { body, next } = self.client.get_json_page::<Vec<ReleaseRecord>>(&url)?;
        Ok(ReleasePage {
            releases: body,
            next,
        })
    }
}

/// Resolves the latest published release of each channel
pub struct ReleaseSource<'a> {
    feed: &'a dyn ReleaseFeed,
    config: &'a OverlayConfig,
}

impl<'a> ReleaseSource<'a> {
    pub fn new(feed: &'a dyn ReleaseFeed, config: &'a OverlayConfig) -> Self {
        Self { feed, config }
    }

    /// Latest release per channel
    ///
    /// Pages through the feed (at most `upstream.max_pages` pages) and stops
    /// as soon as every requested channel has resolved.
    pub fn latest_releases(&self, channels: &[Channel]) -> Result<BTreeMap<Channel, Version>> {
        let mut resolved = BTreeMap::new();
        let mut cursor: Option<String> = None;

        for page_no in 1..=self.config.upstream.max_pages {
            let page = self.feed.fetch_page(cursor.as_deref())?;
            debug!("Release feed page {}: {} releases", page_no, page.releases.len());

            for release in &page.releases {
                if release.draft {
                    continue;
                }
                for &channel in channels {
                    if resolved.contains_key(&channel) {
                        continue;
                    }
                    if let Some(version) = self.classify(channel, release) {
                        info!("Latest {} release: {}", channel, version);
                        resolved.insert(channel, version);
                    }
                }
                if channels.iter().all(|c| resolved.contains_key(c)) {
                    return Ok(resolved);
                }
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let missing: Vec<String> = channels
            .iter()
            .filter(|c| !resolved.contains_key(c))
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(Error::IncompleteReleaseData { missing })
        }
    }

    /// Version of `release` if it is a complete release of `channel`
    fn classify(&self, channel: Channel, release: &ReleaseRecord) -> Option<Version> {
        let title = release.title.as_deref()?;
        if !title.starts_with(self.config.title_prefix(channel)) {
            return None;
        }

        let version = match Version::from_tag(&release.tag) {
            Ok(version) => version,
            Err(e) => {
                warn!("Skipping release '{}': {}", title, e);
                return None;
            }
        };

        let distfile = self.config.distfile_name(channel, &version);
        if !release.has_asset(&distfile) {
            debug!("Skipping '{}': asset {} not published yet", title, distfile);
            return None;
        }

        Some(version)
    }
}
