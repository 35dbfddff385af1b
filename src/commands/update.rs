// src/commands/update.rs
//! Update command

use super::{publish_output, Context};
use anyhow::{Context as _, Result};
use overlay_sync::{
    GitCli, GithubReleaseFeed, HttpDistfileFetcher, ManifestReconciler, RecipeStore,
    ReleaseSource, Synchronizer,
};
use std::io::IsTerminal;
use tracing::info;

/// Add ebuilds for new upstream releases
pub fn cmd_update(ctx: &Context, commit: bool, no_progress: bool) -> Result<()> {
    let config = &ctx.config;
    info!("Updating overlay at {}", ctx.repo.display());

    let store = RecipeStore::new(&ctx.repo, config);
    let fetcher = HttpDistfileFetcher::new(config.download_timeout())?
        .with_progress(!no_progress && std::io::stderr().is_terminal());
    let reconciler = ManifestReconciler::new(&store, &fetcher, config.hash_algorithms()?);
    let git = GitCli::new(&ctx.repo);

    let mut sync = Synchronizer::new(&store, &reconciler);
    if commit {
        sync = sync.with_commits(&git);
    }

    let feed = GithubReleaseFeed::from_config(config)?;
    let source = ReleaseSource::new(&feed, config);
    let report = sync.update(&source).context("Update failed")?;

    if report.is_empty() {
        println!("No new releases");
    } else {
        for (channel, added) in &report.added {
            println!("{}: added {}", channel, added.ebuild_path.display());
        }
    }

    publish_output("new_ebuilds", &serde_json::to_string(&report.new_ebuilds())?)?;
    Ok(())
}
