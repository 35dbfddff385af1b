// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common flag: commit each touched package
fn commit_arg() -> Arg {
    Arg::new("commit")
        .long("commit")
        .action(ArgAction::SetTrue)
        .help("Commit each touched package")
}

fn build_cli() -> Command {
    Command::new("overlay-sync")
        .version(env!("CARGO_PKG_VERSION"))
        .author("overlay-sync Contributors")
        .about("Keep a Gentoo overlay's browser ebuilds in sync with upstream releases")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file (defaults are used when omitted)"),
        )
        .arg(
            Arg::new("repo")
                .short('r')
                .long("repo")
                .value_name("DIR")
                .default_value(".")
                .global(true)
                .help("Overlay repository root"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("update")
                .about("Add ebuilds for new upstream releases and refresh their Manifests")
                .arg(commit_arg())
                .arg(
                    Arg::new("no_progress")
                        .long("no-progress")
                        .action(ArgAction::SetTrue)
                        .help("Hide download progress bars"),
                ),
        )
        .subcommand(
            Command::new("prune")
                .about("Remove all but the newest ebuild of each channel")
                .arg(commit_arg())
                .arg(
                    Arg::new("prune_checked")
                        .long("prune-checked")
                        .action(ArgAction::SetTrue)
                        .requires("results")
                        .help("Only prune channels whose newest ebuild passed its tests"),
                )
                .arg(
                    Arg::new("results")
                        .long("results")
                        .value_name("FILE")
                        .help("Test results file, as written by collect-results --output"),
                ),
        )
        .subcommand(
            Command::new("matrix")
                .about("Build the matrix of ebuilds to test and publish it as a step output")
                .arg(
                    Arg::new("new_ebuilds")
                        .long("new-ebuilds")
                        .num_args(2)
                        .value_names(["COMMIT1", "COMMIT2"])
                        .help("Only ebuilds added between two commits"),
                ),
        )
        .subcommand(
            Command::new("collect-results")
                .about("Collect per-channel test results of a workflow run")
                .arg(
                    Arg::new("run_id")
                        .long("run-id")
                        .conflicts_with("from_event")
                        .help("Workflow run id (defaults to the current run)"),
                )
                .arg(
                    Arg::new("from_event")
                        .long("from-event")
                        .action(ArgAction::SetTrue)
                        .help("Take the run id from the triggering workflow_run event"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Also write the results to this file"),
                ),
        )
        .subcommand(
            Command::new("check-divergence")
                .about("Check source ebuilds for divergence from the reference tree")
                .arg(Arg::new("src").long("src").required(true).help("Root of the source ebuild copy"))
                .arg(
                    Arg::new("reference")
                        .long("reference")
                        .required(true)
                        .help("Root of the reference repository"),
                )
                .arg(
                    Arg::new("step_summary")
                        .long("step-summary")
                        .action(ArgAction::SetTrue)
                        .help("Write a job summary"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("overlay-sync.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
