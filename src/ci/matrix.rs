// src/ci/matrix.rs

//! Test matrix construction

use crate::channel::Channel;
use crate::error::Result;
use crate::recipe::RecipeStore;
use crate::version::{extract_version, Version};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One ebuild for the test workflow to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub channel: Channel,
    pub version: Version,
    /// Path relative to the overlay root
    pub ebuild_path: PathBuf,
}

/// Newest ebuild of every channel
///
/// Fails with `EmptyChannel` if a channel has no ebuild.
pub fn latest_matrix(store: &RecipeStore<'_>) -> Result<Vec<MatrixEntry>> {
    Channel::ALL
        .into_iter()
        .map(|channel| {
            let latest = store.latest(channel)?;
            Ok(MatrixEntry {
                channel,
                version: latest.version,
                ebuild_path: store.relative_path(&latest.path),
            })
        })
        .collect()
}

/// Matrix for ebuilds in `added` (paths relative to the overlay root)
///
/// Paths that are not ebuilds of a tracked channel are ignored. Entries are
/// ordered by channel directory, then by version.
pub fn new_matrix(store: &RecipeStore<'_>, added: &[PathBuf]) -> Result<Vec<MatrixEntry>> {
    let channel_dirs: Vec<(Channel, PathBuf)> = Channel::ALL
        .into_iter()
        .map(|c| (c, store.relative_path(&store.channel_dir(c))))
        .collect();

    let mut entries = Vec::new();
    for path in added {
        let is_ebuild = path
            .extension()
            .is_some_and(|ext| ext == crate::version::RECIPE_EXTENSION.trim_start_matches('.'));
        if !is_ebuild {
            continue;
        }
        let Some(channel) = channel_for(&channel_dirs, path) else {
            debug!("Ignoring {}: not in a channel directory", path.display());
            continue;
        };
        entries.push(MatrixEntry {
            channel,
            version: extract_version(path)?,
            ebuild_path: path.clone(),
        });
    }

    entries.sort_by(|a, b| {
        a.ebuild_path
            .parent()
            .cmp(&b.ebuild_path.parent())
            .then_with(|| a.version.cmp(&b.version))
    });
    Ok(entries)
}

fn channel_for(channel_dirs: &[(Channel, PathBuf)], path: &Path) -> Option<Channel> {
    let parent = path.parent()?;
    channel_dirs
        .iter()
        .find(|(_, dir)| dir == parent)
        .map(|&(channel, _)| channel)
}
