// src/recipe/mod.rs

//! Ebuild (recipe) management for the overlay
//!
//! Each channel owns one package directory holding one ebuild per version.
//! New ebuilds are never generated from scratch: they are cloned from the
//! newest existing ebuild of the channel, relying on the build logic being
//! version-agnostic.

mod store;

pub use store::{list_dir, RecipeFile, RecipeStore};
