// src/commands/divergence.rs
//! Divergence check command

use super::Context;
use anyhow::Result;
use overlay_sync::ci;
use overlay_sync::divergence::{check_divergence, step_summary};
use std::path::Path;

/// Compare source ebuilds with the reference tree
///
/// Returns `true` if any channel has diverged.
pub fn cmd_check_divergence(
    ctx: &Context,
    src: &Path,
    reference: &Path,
    write_summary: bool,
) -> Result<bool> {
    let diverged = check_divergence(&ctx.config, src, reference)?;

    if diverged.is_empty() {
        println!("✅ Ebuilds are in sync!");
    } else {
        println!("⚠️ Ebuilds have diverged:");
        for d in &diverged {
            println!();
            println!("- {} ebuild has diverged:", d.channel.title());
            if ctx.verbose {
                print!("{}", d.diff);
            } else {
                println!("  {} -> {}", d.source.display(), d.reference.display());
            }
        }
    }

    if write_summary {
        ci::require_actions()?;
        ci::append_step_summary(&ci::env_path("GITHUB_STEP_SUMMARY")?, &step_summary(&diverged))?;
    }

    Ok(!diverged.is_empty())
}
