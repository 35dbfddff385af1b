// src/manifest/reconcile.rs

//! Manifest reconciliation
//!
//! Brings a channel's Manifest into exact correspondence with its live
//! ebuilds: one `DIST` entry per distfile a live ebuild needs, nothing else.
//! Entries for distfiles still needed are kept verbatim; missing ones are
//! downloaded and hashed; the rest are dropped.
//!
//! The rewrite is all-or-nothing. Every new entry is computed before the
//! file is touched, and the new content replaces the old one by renaming a
//! temporary file from the same directory over it.

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::hash::{hash_reader, HashAlgorithm};
use crate::recipe::RecipeStore;
use crate::version::Version;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::format::{DistEntry, Manifest, MANIFEST_FILENAME};

/// Source of distfile contents
///
/// Implementations stream the artifact; the reconciler never needs the whole
/// file in memory.
pub trait DistfileFetcher {
    /// Open a stream for the distfile at `url`
    ///
    /// `name` is the distfile name, for progress display and logging.
    fn fetch(&self, url: &str, name: &str) -> Result<Box<dyn Read + '_>>;
}

/// What a reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Manifest path
    pub manifest: PathBuf,
    /// Distfiles whose entries were kept
    pub kept: Vec<String>,
    /// Distfiles downloaded and added
    pub added: Vec<String>,
    /// Distfiles whose entries were removed
    pub dropped: Vec<String>,
    /// Whether the Manifest file was rewritten
    pub written: bool,
}

/// A distfile required by the live ebuild set
#[derive(Debug, Clone)]
struct RequiredDistfile {
    version: Version,
    name: String,
    url: String,
}

/// Reconciles Manifests against a [`RecipeStore`]
pub struct ManifestReconciler<'a> {
    store: &'a RecipeStore<'a>,
    fetcher: &'a dyn DistfileFetcher,
    algorithms: Vec<HashAlgorithm>,
}

impl<'a> ManifestReconciler<'a> {
    /// Create a reconciler hashing with `algorithms`, in DIST line order
    pub fn new(
        store: &'a RecipeStore<'a>,
        fetcher: &'a dyn DistfileFetcher,
        algorithms: Vec<HashAlgorithm>,
    ) -> Self {
        Self {
            store,
            fetcher,
            algorithms,
        }
    }

    /// Manifest path of a channel
    pub fn manifest_path(&self, channel: Channel) -> PathBuf {
        self.store.channel_dir(channel).join(MANIFEST_FILENAME)
    }

    /// Distfiles needed by the channel's live ebuilds, ascending by version
    fn required(&self, channel: Channel) -> Result<Vec<RequiredDistfile>> {
        let config = self.store.config();
        let mut seen = HashSet::new();
        let mut required = Vec::new();

        for recipe in self.store.list(channel)? {
            let name = config.distfile_name(channel, &recipe.version);
            if !seen.insert(name.clone()) {
                // Revisions share their upstream distfile
                continue;
            }
            required.push(RequiredDistfile {
                url: config.distfile_url(channel, &recipe.version),
                version: recipe.version.upstream(),
                name,
            });
        }

        Ok(required)
    }

    /// Reconcile the Manifest of `channel`
    pub fn reconcile(&self, channel: Channel) -> Result<ReconcileOutcome> {
        let path = self.manifest_path(channel);
        let required = self.required(channel)?;
        let wanted: HashSet<&str> = required.iter().map(|r| r.name.as_str()).collect();

        // Entries for unneeded distfiles are dropped without being validated
        let current_text = Manifest::read_text(&path)?;
        let (current, dropped) =
            Manifest::parse_keeping(&current_text, |name| wanted.contains(name))?;

        let mut outcome = ReconcileOutcome {
            manifest: path.clone(),
            dropped,
            ..Default::default()
        };

        let mut dist = Vec::with_capacity(required.len());
        for req in &required {
            // First entry wins when the old Manifest lists a distfile twice
            match current.dist.iter().find(|e| e.name == req.name) {
                Some(entry) => {
                    outcome.kept.push(req.name.clone());
                    dist.push(entry.clone());
                }
                None => {
                    let entry = self.compute_entry(req)?;
                    outcome.added.push(req.name.clone());
                    dist.push(entry);
                }
            }
        }

        let reconciled = Manifest {
            dist,
            other: current.other,
        };
        let text = reconciled.render();

        if text != current_text {
            write_atomic(&path, &text)?;
            outcome.written = true;
            info!(
                "Updated {} (kept {}, added {}, dropped {})",
                self.store.relative_path(&path).display(),
                outcome.kept.len(),
                outcome.added.len(),
                outcome.dropped.len()
            );
        } else {
            debug!("{} already up to date", path.display());
        }

        Ok(outcome)
    }

    fn compute_entry(&self, req: &RequiredDistfile) -> Result<DistEntry> {
        info!("Fetching {} ({}) from {}", req.name, req.version, req.url);
        let mut stream = self.fetcher.fetch(&req.url, &req.name)?;
        let digests = hash_reader(&self.algorithms, &mut *stream, |_| {})
            .map_err(|e| Error::DownloadError(format!("Failed to read {}: {e}", req.url)))?;
        debug!("Hashed {} ({} bytes)", req.name, digests.size);
        Ok(DistEntry::from_digests(&req.name, digests))
    }
}

/// Replace `path` with `content` via a temporary file in the same directory
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::IoError(format!("{} has no parent directory", path.display())))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| Error::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| Error::io(temp.path(), e))?;
    temp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}
