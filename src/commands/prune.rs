// src/commands/prune.rs
//! Prune command

use super::Context;
use anyhow::{Context as _, Result};
use overlay_sync::ci::TestResults;
use overlay_sync::{
    GitCli, HttpDistfileFetcher, ManifestReconciler, PruneGate, RecipeStore, Synchronizer,
};
use std::path::Path;
use tracing::{info, warn};

/// Drop all but the newest ebuild of each (eligible) channel
pub fn cmd_prune(
    ctx: &Context,
    commit: bool,
    prune_checked: bool,
    results: Option<&Path>,
) -> Result<()> {
    let config = &ctx.config;

    let passed = match (prune_checked, results) {
        (true, Some(path)) => {
            let results = TestResults::load(path)
                .with_context(|| format!("Failed to load test results from {}", path.display()))?;
            Some(results.passed_versions())
        }
        (true, None) => anyhow::bail!("--prune-checked requires --results"),
        (false, Some(_)) => {
            warn!("--results given without --prune-checked; pruning every channel");
            None
        }
        (false, None) => None,
    };
    let gate = match &passed {
        Some(passed) => PruneGate::Passed(passed),
        None => PruneGate::All,
    };
    info!("Pruning overlay at {}", ctx.repo.display());

    let store = RecipeStore::new(&ctx.repo, config);
    let fetcher = HttpDistfileFetcher::new(config.download_timeout())?;
    let reconciler = ManifestReconciler::new(&store, &fetcher, config.hash_algorithms()?);
    let git = GitCli::new(&ctx.repo);

    let mut sync = Synchronizer::new(&store, &reconciler);
    if commit {
        sync = sync.with_commits(&git);
    }

    let report = sync.prune(gate).context("Prune failed")?;

    for channel in &report.skipped {
        println!("{}: skipped (no passing test result for newest ebuild)", channel);
    }
    if report.is_empty() {
        println!("Nothing to prune");
    }
    for (channel, dropped) in &report.dropped {
        let versions: Vec<String> = dropped.iter().map(ToString::to_string).collect();
        println!("{}: dropped {}", channel, versions.join(", "));
    }
    Ok(())
}
