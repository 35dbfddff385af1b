// src/cli/mod.rs
//! CLI definitions for overlay-sync
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! Sync commands:
//! - `update` - Add ebuilds for new upstream releases
//! - `prune` - Drop all but the newest ebuild per channel
//!
//! CI commands:
//! - `matrix` - Emit the test matrix
//! - `collect-results` - Gather per-channel test results of a run
//! - `check-divergence` - Compare source ebuilds with the reference tree

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "overlay-sync")]
#[command(author = "overlay-sync Contributors")]
#[command(version)]
#[command(about = "Keep a Gentoo overlay's browser ebuilds in sync with upstream releases", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args)]
pub struct GlobalArgs {
    /// Configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Overlay repository root
    #[arg(short, long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add ebuilds for new upstream releases and refresh their Manifests
    Update {
        /// Commit each updated package
        #[arg(long)]
        commit: bool,

        /// Hide download progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Remove all but the newest ebuild of each channel
    Prune {
        /// Commit each pruned package
        #[arg(long)]
        commit: bool,

        /// Only prune channels whose newest ebuild passed its tests
        #[arg(long, requires = "results")]
        prune_checked: bool,

        /// Test results file, as written by `collect-results --output`
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// Build the matrix of ebuilds to test and publish it as a step output
    Matrix {
        /// Only ebuilds added between two commits
        #[arg(long, num_args = 2, value_names = ["COMMIT1", "COMMIT2"])]
        new_ebuilds: Option<Vec<String>>,
    },

    /// Collect per-channel test results of a workflow run
    CollectResults {
        /// Workflow run id (defaults to the current run)
        #[arg(long, conflicts_with = "from_event")]
        run_id: Option<u64>,

        /// Take the run id from the triggering workflow_run event
        #[arg(long)]
        from_event: bool,

        /// Also write the results to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check source ebuilds for divergence from the reference tree
    CheckDivergence {
        /// Root of the source ebuild copy
        #[arg(long)]
        src: PathBuf,

        /// Root of the reference repository
        #[arg(long)]
        reference: PathBuf,

        /// Write a job summary
        #[arg(long)]
        step_summary: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_prune_checked_requires_results() {
        assert!(Cli::try_parse_from(["overlay-sync", "prune", "--prune-checked"]).is_err());
        let cli = Cli::try_parse_from([
            "overlay-sync",
            "prune",
            "--prune-checked",
            "--results",
            "r.json",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Prune {
                prune_checked: true,
                ..
            }
        ));
    }

    #[test]
    fn test_matrix_new_ebuilds_takes_two_commits() {
        let cli =
            Cli::try_parse_from(["overlay-sync", "matrix", "--new-ebuilds", "HEAD~1", "HEAD"])
                .unwrap();
        match cli.command {
            Commands::Matrix { new_ebuilds } => {
                assert_eq!(new_ebuilds.unwrap(), ["HEAD~1", "HEAD"]);
            }
            _ => panic!("expected matrix"),
        }
        assert!(Cli::try_parse_from(["overlay-sync", "matrix", "--new-ebuilds", "HEAD"]).is_err());
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from(["overlay-sync", "update", "--repo", "/overlay", "-v"])
            .unwrap();
        assert_eq!(cli.global.repo, PathBuf::from("/overlay"));
        assert!(cli.global.verbose);
    }
}
