// tests/common/mod.rs

//! Shared test utilities and in-memory collaborators for integration tests.

#![allow(dead_code)]

use overlay_sync::hash::{hash_bytes, HashAlgorithm};
use overlay_sync::manifest::{DistEntry, Manifest};
use overlay_sync::upstream::{AssetRecord, ReleasePage, ReleaseRecord};
use overlay_sync::{
    Channel, DistfileFetcher, Error, OverlayConfig, RecipeStore, ReleaseFeed, Result,
    VersionControl, Version,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

/// A throwaway overlay checkout with the default configuration.
///
/// Keep the value alive for as long as the files are needed.
pub struct Overlay {
    pub temp: TempDir,
    pub config: OverlayConfig,
}

impl Overlay {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
            config: OverlayConfig::default(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn store(&self) -> RecipeStore<'_> {
        RecipeStore::new(self.root(), &self.config)
    }

    /// Write one ebuild per version; the body names the version.
    pub fn seed(&self, channel: Channel, versions: &[&str]) {
        let store = self.store();
        fs::create_dir_all(store.channel_dir(channel)).unwrap();
        for s in versions {
            fs::write(store.recipe_path(channel, &v(s)), ebuild_body(s)).unwrap();
        }
    }

    /// Write a Manifest listing correct entries for `versions` plus `extra` lines.
    pub fn seed_manifest(&self, channel: Channel, versions: &[&str], extra: &[&str]) {
        let manifest = Manifest {
            dist: versions
                .iter()
                .map(|s| self.dist_entry(channel, s))
                .collect(),
            other: extra.iter().map(|l| l.to_string()).collect(),
        };
        fs::write(self.manifest_path(channel), manifest.render()).unwrap();
    }

    pub fn dist_entry(&self, channel: Channel, version: &str) -> DistEntry {
        let name = self.config.distfile_name(channel, &v(version));
        let data = distfile_body(&name);
        let mut entry = DistEntry {
            name,
            size: data.len() as u64,
            digests: Vec::new(),
        };
        for algorithm in HashAlgorithm::DEFAULT_SET {
            let hash = hash_bytes(algorithm, &data);
            entry
                .digests
                .push((algorithm.manifest_name().to_string(), hash.value));
        }
        entry
    }

    pub fn manifest_path(&self, channel: Channel) -> PathBuf {
        self.store().channel_dir(channel).join("Manifest")
    }

    pub fn manifest_text(&self, channel: Channel) -> String {
        fs::read_to_string(self.manifest_path(channel)).unwrap_or_default()
    }

    pub fn manifest(&self, channel: Channel) -> Manifest {
        Manifest::parse(&self.manifest_text(channel)).unwrap()
    }

    /// Distfile names listed in a channel's Manifest, in file order.
    pub fn manifest_names(&self, channel: Channel) -> Vec<String> {
        self.manifest(channel)
            .dist
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    /// Versions of a channel's ebuilds, oldest first.
    pub fn versions(&self, channel: Channel) -> Vec<String> {
        self.store()
            .list(channel)
            .unwrap()
            .iter()
            .map(|r| r.version.to_string())
            .collect()
    }

    /// A fetcher serving a distfile for every given (channel, version).
    pub fn fetcher(&self, available: &[(Channel, &str)]) -> MemoryFetcher {
        let mut fetcher = MemoryFetcher::default();
        for &(channel, version) in available {
            let version = v(version);
            let name = self.config.distfile_name(channel, &version);
            fetcher.files.insert(
                self.config.distfile_url(channel, &version),
                distfile_body(&name),
            );
        }
        fetcher
    }
}

pub fn ebuild_body(version: &str) -> String {
    format!("# ebuild template from {version}\nEAPI=8\n")
}

/// Deterministic stand-in for a distfile's bytes.
pub fn distfile_body(name: &str) -> Vec<u8> {
    format!("contents of {name}\n").repeat(64).into_bytes()
}

/// Serves distfiles from memory and records every request.
#[derive(Default)]
pub struct MemoryFetcher {
    pub files: HashMap<String, Vec<u8>>,
    pub requested: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn request_count(&self) -> usize {
        self.requested.borrow().len()
    }
}

impl DistfileFetcher for MemoryFetcher {
    fn fetch(&self, url: &str, _name: &str) -> Result<Box<dyn Read + '_>> {
        self.requested.borrow_mut().push(url.to_string());
        match self.files.get(url) {
            Some(data) => Ok(Box::new(data.as_slice())),
            None => Err(Error::DownloadError(format!("HTTP 404 Not Found from {url}"))),
        }
    }
}

/// A release feed split into fixed pages.
pub struct MemoryFeed {
    pub pages: Vec<Vec<ReleaseRecord>>,
    pub fetched: RefCell<usize>,
}

impl MemoryFeed {
    pub fn new(pages: Vec<Vec<ReleaseRecord>>) -> Self {
        Self {
            pages,
            fetched: RefCell::new(0),
        }
    }

    /// A single-page feed.
    pub fn single(releases: Vec<ReleaseRecord>) -> Self {
        Self::new(vec![releases])
    }
}

impl ReleaseFeed for MemoryFeed {
    fn fetch_page(&self, cursor: Option<&str>) -> Result<ReleasePage> {
        let index = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|e| Error::ParseError(e.to_string()))?,
            None => 0,
        };
        *self.fetched.borrow_mut() += 1;
        Ok(ReleasePage {
            releases: self.pages.get(index).cloned().unwrap_or_default(),
            next: (index + 1 < self.pages.len()).then(|| (index + 1).to_string()),
        })
    }
}

pub fn release(title: &str, tag: &str, assets: &[&str]) -> ReleaseRecord {
    ReleaseRecord {
        title: Some(title.to_string()),
        tag: tag.to_string(),
        draft: false,
        assets: assets
            .iter()
            .map(|name| AssetRecord {
                name: name.to_string(),
            })
            .collect(),
    }
}

/// A complete release of `channel` at `version`, with its .deb attached.
pub fn published(config: &OverlayConfig, channel: Channel, version: &str) -> ReleaseRecord {
    let parsed = v(version);
    release(
        &format!("{}{version}", config.title_prefix(channel)),
        &format!("v{version}"),
        &[&config.distfile_name(channel, &parsed)],
    )
}

/// Records commits instead of running git.
#[derive(Default)]
pub struct RecordingVcs {
    pub commits: RefCell<Vec<(Vec<PathBuf>, String)>>,
}

impl RecordingVcs {
    pub fn messages(&self) -> Vec<String> {
        self.commits
            .borrow()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl VersionControl for RecordingVcs {
    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<()> {
        self.commits
            .borrow_mut()
            .push((paths.to_vec(), message.to_string()));
        Ok(())
    }
}
