// src/config.rs

//! Configuration file parsing for overlay-sync
//!
//! Supports TOML configuration files with the following sections:
//! - [overlay] - Category and base package name
//! - [upstream] - Release feed, distfile naming, download URLs, timeouts
//! - [manifest] - Digest algorithms written to new DIST lines
//! - [channels.*] - Release-title prefix per channel
//! - [divergence] - Reference packages the source ebuilds track
//!
//! Every field has a default, so a missing file yields the configuration for
//! the Brave browser overlay. The value is built once and passed explicitly
//! to each component.

use crate::channel::Channel;
use crate::hash::HashAlgorithm;
use crate::version::Version;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverlayConfig {
    /// Package identity
    #[serde(default)]
    pub overlay: OverlaySection,

    /// Upstream release feed and artifacts
    #[serde(default)]
    pub upstream: UpstreamSection,

    /// Manifest settings
    #[serde(default)]
    pub manifest: ManifestSection,

    /// Per-channel settings
    #[serde(default)]
    pub channels: ChannelsSection,

    /// Divergence check settings
    #[serde(default)]
    pub divergence: DivergenceSection,
}

/// Package identity section
#[derive(Debug, Clone, Deserialize)]
pub struct OverlaySection {
    /// Gentoo category holding the packages
    #[serde(default = "default_category")]
    pub category: String,

    /// Package name of the stable channel
    #[serde(default = "default_base_name")]
    pub base_name: String,
}

impl Default for OverlaySection {
    fn default() -> Self {
        Self {
            category: default_category(),
            base_name: default_base_name(),
        }
    }
}

fn default_category() -> String {
    "www-client".to_string()
}

fn default_base_name() -> String {
    "brave-browser".to_string()
}

/// Upstream section
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSection {
    /// GitHub releases API endpoint
    #[serde(default = "default_releases_url")]
    pub releases_url: String,

    /// Distfile name template (`{package}`, `{version}`)
    #[serde(default = "default_distfile")]
    pub distfile: String,

    /// Distfile download URL template (`{package}`, `{version}`, `{distfile}`)
    #[serde(default = "default_download_url")]
    pub download_url: String,

    /// Maximum number of feed pages to scan
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Releases requested per feed page
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Timeout for feed requests, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for distfile downloads, in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Environment variable holding an optional API token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            releases_url: default_releases_url(),
            distfile: default_distfile(),
            download_url: default_download_url(),
            max_pages: default_max_pages(),
            per_page: default_per_page(),
            timeout_secs: default_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            token_env: default_token_env(),
        }
    }
}

fn default_releases_url() -> String {
    "https://api.github.com/repos/brave/brave-browser/releases".to_string()
}

fn default_distfile() -> String {
    "{package}_{version}_amd64.deb".to_string()
}

fn default_download_url() -> String {
    "https://github.com/brave/brave-browser/releases/download/v{version}/{distfile}".to_string()
}

fn default_max_pages() -> u32 {
    10
}

fn default_per_page() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_download_timeout_secs() -> u64 {
    600
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

/// Manifest section
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestSection {
    /// Digest algorithms, in DIST line order
    #[serde(default = "default_hashes")]
    pub hashes: Vec<String>,
}

impl Default for ManifestSection {
    fn default() -> Self {
        Self {
            hashes: default_hashes(),
        }
    }
}

fn default_hashes() -> Vec<String> {
    HashAlgorithm::DEFAULT_SET
        .iter()
        .map(|a| a.manifest_name().to_string())
        .collect()
}

/// Channels section
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsSection {
    #[serde(default = "default_stable")]
    pub stable: ChannelSection,
    #[serde(default = "default_beta")]
    pub beta: ChannelSection,
    #[serde(default = "default_nightly")]
    pub nightly: ChannelSection,
}

impl Default for ChannelsSection {
    fn default() -> Self {
        Self {
            stable: default_stable(),
            beta: default_beta(),
            nightly: default_nightly(),
        }
    }
}

/// Settings for one channel
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSection {
    /// Prefix of upstream release titles belonging to this channel
    pub title_prefix: String,
}

fn default_stable() -> ChannelSection {
    ChannelSection {
        title_prefix: "Release ".to_string(),
    }
}

fn default_beta() -> ChannelSection {
    ChannelSection {
        title_prefix: "Beta ".to_string(),
    }
}

fn default_nightly() -> ChannelSection {
    ChannelSection {
        title_prefix: "Nightly ".to_string(),
    }
}

/// Divergence check section
///
/// The overlay's ebuilds are derived from another distribution's packaging
/// of a related browser. These name that packaging, per channel.
#[derive(Debug, Clone, Deserialize)]
pub struct DivergenceSection {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_reference_stable")]
    pub stable: String,
    #[serde(default = "default_reference_beta")]
    pub beta: String,
    #[serde(default = "default_reference_nightly")]
    pub nightly: String,
}

impl Default for DivergenceSection {
    fn default() -> Self {
        Self {
            category: default_category(),
            stable: default_reference_stable(),
            beta: default_reference_beta(),
            nightly: default_reference_nightly(),
        }
    }
}

fn default_reference_stable() -> String {
    "google-chrome".to_string()
}

fn default_reference_beta() -> String {
    "google-chrome-beta".to_string()
}

fn default_reference_nightly() -> String {
    "google-chrome-unstable".to_string()
}

impl OverlayConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: OverlayConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.overlay.category.is_empty() || self.overlay.base_name.is_empty() {
            anyhow::bail!("overlay.category and overlay.base_name must not be empty");
        }

        for channel in Channel::ALL {
            if self.title_prefix(channel).is_empty() {
                anyhow::bail!("channels.{}.title_prefix must not be empty", channel);
            }
            if self.reference_package(channel).is_empty() {
                anyhow::bail!("divergence.{} must not be empty", channel);
            }
        }

        if !self.upstream.distfile.contains("{version}") {
            anyhow::bail!("upstream.distfile must contain a {{version}} placeholder");
        }
        if !self.upstream.download_url.contains("{distfile}")
            && !self.upstream.download_url.contains("{version}")
        {
            anyhow::bail!("upstream.download_url must contain {{distfile}} or {{version}}");
        }

        if self.upstream.max_pages == 0 {
            anyhow::bail!("upstream.max_pages must be at least 1");
        }
        if self.upstream.timeout_secs == 0 || self.upstream.download_timeout_secs == 0 {
            anyhow::bail!("upstream timeouts must be non-zero");
        }

        self.hash_algorithms()?;
        Ok(())
    }

    /// Package name of a channel (`stable` ⇒ base name, others suffixed)
    pub fn package_name(&self, channel: Channel) -> String {
        format!("{}{}", self.overlay.base_name, channel.package_suffix())
    }

    /// `<category>/<package>` atom of a channel
    pub fn package_atom(&self, channel: Channel) -> String {
        format!("{}/{}", self.overlay.category, self.package_name(channel))
    }

    /// Reference package a channel's source ebuild tracks
    pub fn reference_package(&self, channel: Channel) -> &str {
        match channel {
            Channel::Stable => &self.divergence.stable,
            Channel::Beta => &self.divergence.beta,
            Channel::Nightly => &self.divergence.nightly,
        }
    }

    /// `<category>/<package>` directory of a channel's reference package
    pub fn reference_dir(&self, channel: Channel) -> std::path::PathBuf {
        Path::new(&self.divergence.category).join(self.reference_package(channel))
    }

    /// Release-title prefix of a channel
    pub fn title_prefix(&self, channel: Channel) -> &str {
        match channel {
            Channel::Stable => &self.channels.stable.title_prefix,
            Channel::Beta => &self.channels.beta.title_prefix,
            Channel::Nightly => &self.channels.nightly.title_prefix,
        }
    }

    /// Distfile published upstream for a channel/version
    ///
    /// Revisions are overlay-local, so `1.2.3-r1` maps to the `1.2.3` artifact.
    pub fn distfile_name(&self, channel: Channel, version: &Version) -> String {
        self.upstream
            .distfile
            .replace("{package}", &self.package_name(channel))
            .replace("{version}", &version.upstream().to_string())
    }

    /// Download URL of a channel/version distfile
    pub fn distfile_url(&self, channel: Channel, version: &Version) -> String {
        self.upstream
            .download_url
            .replace("{package}", &self.package_name(channel))
            .replace("{version}", &version.upstream().to_string())
            .replace("{distfile}", &self.distfile_name(channel, version))
    }

    /// Digest algorithms for new Manifest entries
    pub fn hash_algorithms(&self) -> Result<Vec<HashAlgorithm>> {
        if self.manifest.hashes.is_empty() {
            anyhow::bail!("manifest.hashes must list at least one algorithm");
        }
        self.manifest
            .hashes
            .iter()
            .map(|name| {
                name.parse::<HashAlgorithm>()
                    .with_context(|| format!("Invalid manifest.hashes entry '{name}'"))
            })
            .collect()
    }

    /// Timeout for release feed requests
    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    /// Timeout for distfile downloads
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.download_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OverlayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.package_name(Channel::Stable), "brave-browser");
        assert_eq!(config.package_name(Channel::Nightly), "brave-browser-nightly");
        assert_eq!(config.package_atom(Channel::Beta), "www-client/brave-browser-beta");
        assert_eq!(config.title_prefix(Channel::Beta), "Beta ");
        assert_eq!(
            config.reference_dir(Channel::Nightly),
            Path::new("www-client/google-chrome-unstable")
        );
        assert_eq!(
            config.hash_algorithms().unwrap(),
            vec![HashAlgorithm::Blake2b, HashAlgorithm::Sha512]
        );
    }

    #[test]
    fn test_distfile_naming_ignores_revision() {
        let config = OverlayConfig::default();
        let version = Version::parse("1.80.12-r2").unwrap();
        assert_eq!(
            config.distfile_name(Channel::Beta, &version),
            "brave-browser-beta_1.80.12_amd64.deb"
        );
        assert_eq!(
            config.distfile_url(Channel::Stable, &version),
            "https://github.com/brave/brave-browser/releases/download/v1.80.12/brave-browser_1.80.12_amd64.deb"
        );
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[overlay]
base_name = "vivaldi"

[upstream]
max_pages = 3

[channels.nightly]
title_prefix = "Snapshot "
"#;
        let config: OverlayConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.overlay.category, "www-client");
        assert_eq!(config.package_name(Channel::Beta), "vivaldi-beta");
        assert_eq!(config.upstream.max_pages, 3);
        assert_eq!(config.title_prefix(Channel::Nightly), "Snapshot ");
        assert_eq!(config.title_prefix(Channel::Stable), "Release ");
    }

    #[test]
    fn test_invalid_hash_algorithm() {
        let toml_str = r#"
[manifest]
hashes = ["BLAKE2B", "MD5"]
"#;
        let config: OverlayConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_templates_and_limits() {
        let config: OverlayConfig = toml::from_str("[upstream]\ndistfile = \"static.deb\"\n").unwrap();
        assert!(config.validate().is_err());

        let config: OverlayConfig = toml::from_str("[upstream]\nmax_pages = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config: OverlayConfig =
            toml::from_str("[channels.beta]\ntitle_prefix = \"\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay-sync.toml");
        std::fs::write(&path, "[overlay]\ncategory = \"net-im\"\n").unwrap();

        let config = OverlayConfig::load(&path).unwrap();
        assert_eq!(config.package_atom(Channel::Stable), "net-im/brave-browser");

        assert!(OverlayConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
