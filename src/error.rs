// src/error.rs

//! Error types for overlay-sync
//!
//! Every failure is fatal to the operation that hit it. Nothing in the
//! library recovers from an error to continue in a degraded mode; errors
//! propagate to the command boundary which reports them and exits non-zero.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for overlay-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while syncing the overlay
#[derive(Error, Debug)]
pub enum Error {
    /// Recipe filename or version string does not contain a parseable version
    #[error("malformed version in '{0}'")]
    MalformedVersion(String),

    /// Release feed was exhausted before every channel resolved
    #[error("could not find latest release for channel(s): {}", .missing.join(", "))]
    IncompleteReleaseData { missing: Vec<String> },

    /// Channel directory holds no recipes
    #[error("no ebuilds in '{}'", .0.display())]
    EmptyChannel(PathBuf),

    /// Recipe to remove does not exist
    #[error("ebuild not found: {}", .0.display())]
    RecipeNotFound(PathBuf),

    /// Recipe to add already exists
    #[error("ebuild already exists: {}", .0.display())]
    DuplicateRecipe(PathBuf),

    /// Network or transfer failure
    #[error("download error: {0}")]
    DownloadError(String),

    /// Filesystem failure
    #[error("IO error: {0}")]
    IoError(String),

    /// Malformed external data (feed JSON, Manifest lines, result files)
    #[error("parse error: {0}")]
    ParseError(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Version-control collaborator failed
    #[error("git error: {0}")]
    Vcs(String),

    /// CI environment is missing or incomplete
    #[error("CI error: {0}")]
    Ci(String),
}

impl Error {
    /// Wrap an `std::io::Error` with the path it occurred on
    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::IoError(format!("{}: {err}", path.display()))
    }
}
