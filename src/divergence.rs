// src/divergence.rs

//! Source ebuild divergence check
//!
//! The overlay keeps a copy of the reference distribution's ebuilds (the
//! "source" ebuilds its own are adapted from). When the reference changes,
//! the copy must be refreshed and the changes ported. This compares the
//! newest source ebuild of each channel with the newest reference ebuild
//! and reports a unified diff for every channel that differs.

use crate::channel::Channel;
use crate::config::OverlayConfig;
use crate::error::{Error, Result};
use crate::recipe::{list_dir, RecipeFile};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A channel whose source ebuild differs from the reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub channel: Channel,
    /// Source ebuild, relative to the source root
    pub source: PathBuf,
    /// Reference ebuild, relative to the reference root
    pub reference: PathBuf,
    /// Unified diff from source to reference
    pub diff: String,
}

/// Compare newest source and reference ebuilds of every channel
///
/// Returns only the channels that differ, in channel order.
pub fn check_divergence(
    config: &OverlayConfig,
    source_root: &Path,
    reference_root: &Path,
) -> Result<Vec<Divergence>> {
    let mut diverged = Vec::new();

    for channel in Channel::ALL {
        let package_dir = config.reference_dir(channel);
        let source = newest(&source_root.join(&package_dir), channel)?;
        let reference = newest(&reference_root.join(&package_dir), channel)?;

        let source_text = fs::read_to_string(&source.path).map_err(|e| Error::io(&source.path, e))?;
        let reference_text =
            fs::read_to_string(&reference.path).map_err(|e| Error::io(&reference.path, e))?;

        let source_rel = relative(&source.path, source_root);
        let reference_rel = relative(&reference.path, reference_root);

        if source_text.lines().eq(reference_text.lines()) {
            debug!("{} ebuild in sync with {}", channel, reference_rel.display());
            continue;
        }

        diverged.push(Divergence {
            channel,
            diff: unified_diff(&source_text, &reference_text, &source_rel, &reference_rel),
            source: source_rel,
            reference: reference_rel,
        });
    }

    Ok(diverged)
}

fn newest(dir: &Path, channel: Channel) -> Result<RecipeFile> {
    list_dir(dir, channel)?
        .pop()
        .ok_or_else(|| Error::EmptyChannel(dir.to_path_buf()))
}

fn relative(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Unified diff with the given file names in its header
fn unified_diff(original: &str, modified: &str, from: &Path, to: &Path) -> String {
    let patch = diffy::create_patch(original, modified).to_string();
    // diffy names the sides "original" and "modified"; swap in real paths
    let hunks: Vec<&str> = patch.lines().skip_while(|l| !l.starts_with("@@")).collect();

    let mut out = format!("--- {}\n+++ {}\n", from.display(), to.display());
    for line in hunks {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Markdown job summary for a divergence check
pub fn step_summary(diverged: &[Divergence]) -> String {
    if diverged.is_empty() {
        return "### ✅ Ebuilds are in sync!\n\n".to_string();
    }

    let mut out = String::from("### ⚠️ Ebuilds have diverged:\n\n");
    for d in diverged {
        out.push_str(&format!("- **{}** ebuild has diverged:\n\n", d.channel.title()));
        out.push_str("    ```diff\n");
        for line in d.diff.lines() {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("    ```\n\n");
    }
    out
}
