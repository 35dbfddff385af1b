// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use overlay_sync::OverlayConfig;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let default_level = if cli.global.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = OverlayConfig::load_or_default(cli.global.config.as_deref())?;
    let ctx = Context::new(config, cli.global.repo, cli.global.verbose);

    match cli.command {
        Commands::Update {
            commit,
            no_progress,
        } => commands::cmd_update(&ctx, commit, no_progress)?,
        Commands::Prune {
            commit,
            prune_checked,
            results,
        } => commands::cmd_prune(&ctx, commit, prune_checked, results.as_deref())?,
        Commands::Matrix { new_ebuilds } => commands::cmd_matrix(&ctx, new_ebuilds.as_deref())?,
        Commands::CollectResults {
            run_id,
            from_event,
            output,
        } => commands::cmd_collect_results(&ctx, run_id, from_event, output.as_deref())?,
        Commands::CheckDivergence {
            src,
            reference,
            step_summary,
        } => {
            if commands::cmd_check_divergence(&ctx, &src, &reference, step_summary)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
