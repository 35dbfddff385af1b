// src/ci/mod.rs

//! GitHub Actions integration
//!
//! - [`matrix`]: which ebuilds a test workflow should build
//! - [`results`]: per-channel test outcomes, collected from a workflow run
//! - [`output`]: step outputs and job summaries
//!
//! Everything here is plumbing around the core sync operations; nothing in
//! [`crate::sync`] depends on it.

pub mod matrix;
pub mod output;
pub mod results;

pub use matrix::{latest_matrix, new_matrix, MatrixEntry};
pub use output::{append_step_summary, set_output};
pub use results::{JobConclusion, JobRecord, TestResult, TestResults};

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Fail unless running inside a GitHub Actions workflow
pub fn require_actions() -> Result<()> {
    if std::env::var_os("GITHUB_ACTIONS").is_none() {
        return Err(Error::Ci("Not running in a GitHub Actions workflow".to_string()));
    }
    Ok(())
}

/// Value of a required, non-empty environment variable
pub fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Ci(format!("{name} environment variable unset or empty")))
}

/// Path held by a required environment variable
pub fn env_path(name: &str) -> Result<PathBuf> {
    env_var(name).map(PathBuf::from)
}
