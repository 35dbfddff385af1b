// src/lib.rs

//! overlay-sync
//!
//! Keeps a Gentoo overlay's browser ebuilds and their Manifests in step with
//! upstream releases.
//!
//! # Architecture
//!
//! - One package per release channel (stable, beta, nightly)
//! - New ebuilds are cloned from the newest existing ebuild of the channel
//! - Manifests always list exactly the distfiles of the live ebuilds
//! - Old ebuilds are pruned only once a newer one exists (and, when gated,
//!   has passed its tests)

pub mod channel;
pub mod ci;
pub mod config;
pub mod divergence;
mod error;
pub mod hash;
pub mod manifest;
pub mod recipe;
pub mod sync;
pub mod upstream;
pub mod vcs;
pub mod version;

pub use channel::Channel;
pub use config::OverlayConfig;
pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm, Hasher};
pub use manifest::{DistfileFetcher, ManifestReconciler, ReconcileOutcome};
pub use recipe::{RecipeFile, RecipeStore};
pub use sync::{PruneGate, PruneReport, Synchronizer, UpdateReport};
pub use upstream::{GithubReleaseFeed, HttpDistfileFetcher, ReleaseFeed, ReleaseSource};
pub use vcs::{GitCli, VersionControl};
pub use version::{extract_version, sort_key, Version};
