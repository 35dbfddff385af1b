// src/commands/mod.rs
//! Command handlers for the overlay-sync CLI

mod ci;
mod divergence;
mod prune;
mod update;

pub use ci::{cmd_collect_results, cmd_matrix};
pub use divergence::cmd_check_divergence;
pub use prune::cmd_prune;
pub use update::cmd_update;

use anyhow::Result;
use overlay_sync::ci::{env_path, set_output};
use overlay_sync::OverlayConfig;
use std::path::PathBuf;
use tracing::debug;

/// State shared by every command
pub struct Context {
    pub config: OverlayConfig,
    pub repo: PathBuf,
    pub verbose: bool,
}

impl Context {
    pub fn new(config: OverlayConfig, repo: PathBuf, verbose: bool) -> Self {
        Self {
            config,
            repo,
            verbose,
        }
    }
}

/// Publish `value` as step output `name` when running under GitHub Actions
fn publish_output(name: &str, value: &str) -> Result<()> {
    if std::env::var_os("GITHUB_OUTPUT").is_none() {
        debug!("GITHUB_OUTPUT unset, not publishing '{}'", name);
        return Ok(());
    }
    set_output(&env_path("GITHUB_OUTPUT")?, name, value)?;
    Ok(())
}
