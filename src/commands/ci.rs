// src/commands/ci.rs
//! GitHub Actions commands

use super::{publish_output, Context};
use anyhow::{Context as _, Result};
use overlay_sync::ci::{self, results, TestResults};
use overlay_sync::upstream::HttpClient;
use overlay_sync::{GitCli, RecipeStore};
use std::path::Path;
use tracing::info;

const DEFAULT_API_URL: &str = "https://api.github.com";

/// Build the test matrix and publish it as `test_matrix`
pub fn cmd_matrix(ctx: &Context, new_ebuilds: Option<&[String]>) -> Result<()> {
    ci::require_actions()?;
    let store = RecipeStore::new(&ctx.repo, &ctx.config);

    let matrix = match new_ebuilds {
        Some([from, to]) => {
            let git = GitCli::new(&ctx.repo);
            let under = format!("{}/", ctx.config.overlay.category);
            let added = git.added_paths(from, to, &under)?;
            info!("{} file(s) added between {} and {}", added.len(), from, to);
            ci::new_matrix(&store, &added)?
        }
        Some(other) => anyhow::bail!("--new-ebuilds takes two commits, got {}", other.len()),
        None => ci::latest_matrix(&store)?,
    };

    publish_output("test_matrix", &serde_json::to_string(&matrix)?)?;
    if ctx.verbose {
        println!("{}", serde_json::to_string_pretty(&matrix)?);
    }
    Ok(())
}

/// Collect per-channel test results and publish them as `test_results`
pub fn cmd_collect_results(
    ctx: &Context,
    run_id: Option<u64>,
    from_event: bool,
    output: Option<&Path>,
) -> Result<()> {
    ci::require_actions()?;

    let run_id = if from_event {
        results::run_id_from_event(&ci::env_path("GITHUB_EVENT_PATH")?)?
    } else {
        match run_id {
            Some(id) => id,
            None => ci::env_var("GITHUB_RUN_ID")?
                .parse()
                .context("GITHUB_RUN_ID is not a number")?,
        }
    };
    let repository = ci::env_var("GITHUB_REPOSITORY")?;
    let token = ci::env_var(&ctx.config.upstream.token_env)?;
    let api_url = std::env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

    info!("Collecting test results of run {} in {}", run_id, repository);
    let client = HttpClient::with_token(ctx.config.feed_timeout(), Some(&token))?;
    let jobs = results::fetch_run_jobs(
        &client,
        &api_url,
        &repository,
        run_id,
        ctx.config.upstream.max_pages,
    )?;
    let test_results = TestResults::from_jobs(&jobs)?;
    let json = test_results.to_json()?;

    publish_output("test_results", &json)?;
    if let Some(path) = output {
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    if ctx.verbose {
        println!("{}", serde_json::to_string_pretty(&test_results)?);
    }
    Ok(())
}
