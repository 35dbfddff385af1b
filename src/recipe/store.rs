// src/recipe/store.rs

//! Filesystem-backed ebuild store
//!
//! Layout: `<root>/<category>/<package>/<package>-<version>.ebuild`, one
//! directory per channel. Anything in a channel directory that is not an
//! ebuild (Manifest, metadata.xml, files/) is ignored.

use crate::channel::Channel;
use crate::config::OverlayConfig;
use crate::error::{Error, Result};
use crate::version::{extract_version, recipe_filename, Version, RECIPE_EXTENSION};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A single ebuild on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFile {
    pub channel: Channel,
    pub version: Version,
    pub path: PathBuf,
}

/// Ebuild store rooted at an overlay checkout
#[derive(Debug, Clone)]
pub struct RecipeStore<'a> {
    root: PathBuf,
    config: &'a OverlayConfig,
}

impl<'a> RecipeStore<'a> {
    /// Create a store for the overlay at `root`
    pub fn new(root: impl Into<PathBuf>, config: &'a OverlayConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Configuration the store was built with
    pub fn config(&self) -> &'a OverlayConfig {
        self.config
    }

    /// Directory holding a channel's ebuilds
    pub fn channel_dir(&self, channel: Channel) -> PathBuf {
        self.root
            .join(&self.config.overlay.category)
            .join(self.config.package_name(channel))
    }

    /// Path an ebuild for `version` has (or would have)
    pub fn recipe_path(&self, channel: Channel, version: &Version) -> PathBuf {
        self.channel_dir(channel)
            .join(recipe_filename(&self.config.package_name(channel), version))
    }

    /// Path relative to the overlay root, for reports and commit paths
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    /// All ebuilds of a channel, oldest first
    pub fn list(&self, channel: Channel) -> Result<Vec<RecipeFile>> {
        list_dir(&self.channel_dir(channel), channel)
    }

    /// Newest ebuild of a channel
    pub fn latest(&self, channel: Channel) -> Result<RecipeFile> {
        self.list(channel)?
            .pop()
            .ok_or_else(|| Error::EmptyChannel(self.channel_dir(channel)))
    }

    /// Whether the channel has an ebuild for `version`
    pub fn exists(&self, channel: Channel, version: &Version) -> Result<bool> {
        Ok(self.find(channel, version)?.is_some())
    }

    fn find(&self, channel: Channel, version: &Version) -> Result<Option<RecipeFile>> {
        Ok(self
            .list(channel)?
            .into_iter()
            .find(|r| &r.version == version))
    }

    /// Add an ebuild for `version`, cloned from the channel's newest ebuild
    ///
    /// Never overwrites: an existing ebuild for the version is an error.
    pub fn add(&self, channel: Channel, version: &Version) -> Result<RecipeFile> {
        let dest = self.recipe_path(channel, version);
        if self.exists(channel, version)? {
            return Err(Error::DuplicateRecipe(dest));
        }

        let template = self.latest(channel)?;

        let mut src = File::open(&template.path).map_err(|e| Error::io(&template.path, e))?;
        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&dest)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => Error::DuplicateRecipe(dest.clone()),
                _ => Error::io(&dest, e),
            })?;

        if let Err(e) = io::copy(&mut src, &mut out) {
            drop(out);
            let _ = fs::remove_file(&dest);
            return Err(Error::io(&dest, e));
        }

        info!(
            "Added {} (from {})",
            self.relative_path(&dest).display(),
            template.version
        );

        Ok(RecipeFile {
            channel,
            version: version.clone(),
            path: dest,
        })
    }

    /// Remove the ebuild for `version`
    ///
    /// The store does not protect the last ebuild of a channel; pruning
    /// policy lives in [`crate::sync`].
    pub fn remove(&self, channel: Channel, version: &Version) -> Result<RecipeFile> {
        let recipe = self
            .find(channel, version)?
            .ok_or_else(|| Error::RecipeNotFound(self.recipe_path(channel, version)))?;

        fs::remove_file(&recipe.path).map_err(|e| Error::io(&recipe.path, e))?;
        info!("Removed {}", self.relative_path(&recipe.path).display());
        Ok(recipe)
    }
}

/// All ebuilds in a package directory, oldest first
///
/// A missing directory lists as empty. An ebuild whose filename carries no
/// parseable version is an error.
pub fn list_dir(dir: &Path, channel: Channel) -> Result<Vec<RecipeFile>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Package directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(Error::io(dir, e)),
    };

    let mut recipes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let is_recipe = path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(RECIPE_EXTENSION));
        if !is_recipe {
            continue;
        }

        let version = extract_version(&path)?;
        recipes.push(RecipeFile {
            channel,
            version,
            path,
        });
    }

    recipes.sort_by_key(|r| r.version.sort_key());
    Ok(recipes)
}
