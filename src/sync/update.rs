// src/sync/update.rs

//! Update: materialize ebuilds for new upstream releases

use super::Synchronizer;
use crate::channel::Channel;
use crate::error::Result;
use crate::upstream::ReleaseSource;
use crate::version::Version;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// An ebuild added by an update run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedRecipe {
    pub version: Version,
    /// Path relative to the overlay root
    pub ebuild_path: PathBuf,
}

/// Result of an update run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub added: BTreeMap<Channel, AddedRecipe>,
}

impl UpdateReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }

    /// Channel to added ebuild path, as published to CI
    pub fn new_ebuilds(&self) -> BTreeMap<Channel, String> {
        self.added
            .iter()
            .map(|(&channel, added)| (channel, added.ebuild_path.display().to_string()))
            .collect()
    }
}

impl<'a> Synchronizer<'a> {
    /// Latest releases the store has no ebuild for
    pub fn new_releases(
        &self,
        latest: &BTreeMap<Channel, Version>,
    ) -> Result<BTreeMap<Channel, Version>> {
        let mut new = BTreeMap::new();
        for (&channel, version) in latest {
            if !self.store.exists(channel, version)? {
                new.insert(channel, version.clone());
            }
        }
        Ok(new)
    }

    /// Add ebuilds for every channel whose latest release is missing
    ///
    /// Running it again without upstream changes is a no-op. If a Manifest
    /// cannot be reconciled, the ebuild just added for it is removed again
    /// and the error is returned.
    pub fn update(&self, source: &ReleaseSource<'_>) -> Result<UpdateReport> {
        let latest = source.latest_releases(&Channel::ALL)?;
        let new = self.new_releases(&latest)?;

        let mut report = UpdateReport::default();
        if new.is_empty() {
            info!("All channels up to date");
            return Ok(report);
        }

        for (channel, version) in new {
            let recipe = self.store.add(channel, &version)?;
            if let Err(e) = self.reconciler.reconcile(channel) {
                // Without its ebuild a rerun retries this release
                if let Err(rm) = self.store.remove(channel, &version) {
                    warn!("Failed to roll back {}: {}", recipe.path.display(), rm);
                }
                return Err(e);
            }
            self.commit_channel(channel, std::slice::from_ref(&version), &[])?;

            report.added.insert(
                channel,
                AddedRecipe {
                    ebuild_path: self.store.relative_path(&recipe.path),
                    version,
                },
            );
        }

        Ok(report)
    }
}
