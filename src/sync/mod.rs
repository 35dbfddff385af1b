// src/sync/mod.rs

//! Release-to-ebuild reconciliation
//!
//! Composes the release source, the ebuild store and the Manifest
//! reconciler into the two operations the scheduled jobs run:
//!
//! - [`Synchronizer::update`]: add ebuilds for upstream releases the overlay
//!   does not have yet
//! - [`Synchronizer::prune`]: drop every ebuild but the newest per channel,
//!   optionally only for channels whose newest ebuild passed its tests
//!
//! Both leave each touched channel's Manifest reconciled, and can record
//! each touched channel as one commit.

mod prune;
mod update;

pub use prune::{PruneGate, PruneReport};
pub use update::{AddedRecipe, UpdateReport};

use crate::channel::Channel;
use crate::error::Result;
use crate::manifest::ManifestReconciler;
use crate::recipe::RecipeStore;
use crate::vcs::VersionControl;
use crate::version::Version;

/// Orchestrates update and prune runs over one overlay
pub struct Synchronizer<'a> {
    store: &'a RecipeStore<'a>,
    reconciler: &'a ManifestReconciler<'a>,
    vcs: Option<&'a dyn VersionControl>,
}

impl<'a> Synchronizer<'a> {
    pub fn new(store: &'a RecipeStore<'a>, reconciler: &'a ManifestReconciler<'a>) -> Self {
        Self {
            store,
            reconciler,
            vcs: None,
        }
    }

    /// Commit each touched channel through `vcs`
    pub fn with_commits(mut self, vcs: &'a dyn VersionControl) -> Self {
        self.vcs = Some(vcs);
        self
    }

    /// Commit a channel's directory, if commits are enabled
    fn commit_channel(
        &self,
        channel: Channel,
        added: &[Version],
        dropped: &[Version],
    ) -> Result<()> {
        let Some(vcs) = self.vcs else {
            return Ok(());
        };
        let dir = self.store.relative_path(&self.store.channel_dir(channel));
        let message = commit_message(
            &self.store.config().package_atom(channel),
            added,
            dropped,
        );
        vcs.commit(&[dir], &message)
    }
}

/// `<category>/<package>: added: <v>, dropped: <v>, <v>`
pub fn commit_message(atom: &str, added: &[Version], dropped: &[Version]) -> String {
    let join = |versions: &[Version]| {
        versions
            .iter()
            .map(Version::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut parts = Vec::new();
    if !added.is_empty() {
        parts.push(format!("added: {}", join(added)));
    }
    if !dropped.is_empty() {
        parts.push(format!("dropped: {}", join(dropped)));
    }
    format!("{atom}: {}", parts.join(", "))
}
