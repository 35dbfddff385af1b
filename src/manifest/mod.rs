// src/manifest/mod.rs

//! Manifest (distfile checksum ledger) handling
//!
//! - [`format`]: parsing and rendering of Gentoo Manifest files
//! - [`reconcile`]: keeping a channel's Manifest in step with its ebuilds

mod format;
mod reconcile;

pub use format::{DistEntry, Manifest, MANIFEST_FILENAME};
pub use reconcile::{DistfileFetcher, ManifestReconciler, ReconcileOutcome};
