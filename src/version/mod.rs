// src/version/mod.rs

//! Version handling for ebuild filenames and upstream release tags
//!
//! Versions follow the Gentoo subset used by the overlay:
//!
//! ```text
//! version  := number ("." number)* revision?
//! revision := "-r" number
//! number   := digit+
//! ```
//!
//! Ordering compares numeric components first and the revision last.
//! Missing trailing components count as zero, so `1.2 == 1.2.0 < 1.2.1`.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::LazyLock;

/// File extension of recipe files
pub const RECIPE_EXTENSION: &str = ".ebuild";

/// Version token at the end of an ebuild stem, e.g. `-1.80.12-r1`
static VERSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d+(?:\.\d+)*(?:-r\d+)?)$").unwrap());

/// A parsed package version with optional revision
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<u64>,
    revision: u64,
}

/// Total-order key for a [`Version`]
///
/// Trailing zero components are trimmed, so comparing keys lexicographically
/// is the same as comparing zero-padded component tuples.
pub type SortKey = (Vec<u64>, u64);

impl Version {
    /// Create a version from numeric components and a revision
    pub fn new(components: Vec<u64>, revision: u64) -> Result<Self> {
        if components.is_empty() {
            return Err(Error::MalformedVersion(String::new()));
        }
        Ok(Self {
            components,
            revision,
        })
    }

    /// Parse a version string
    ///
    /// Examples:
    /// - "1.2.3" → components=[1, 2, 3], revision=0
    /// - "1.2.3-r2" → components=[1, 2, 3], revision=2
    pub fn parse(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedVersion(s.to_string());

        let (numbers, revision) = match s.split_once("-r") {
            Some((numbers, rev)) => (numbers, parse_number(rev).ok_or_else(malformed)?),
            None => (s, 0),
        };

        let components = numbers
            .split('.')
            .map(parse_number)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(malformed)?;

        Self::new(components, revision).map_err(|_| malformed())
    }

    /// Parse a release tag carrying a leading `v` marker (e.g. "v1.80.12")
    pub fn from_tag(tag: &str) -> Result<Self> {
        let rest = tag
            .strip_prefix('v')
            .ok_or_else(|| Error::MalformedVersion(tag.to_string()))?;
        Self::parse(rest).map_err(|_| Error::MalformedVersion(tag.to_string()))
    }

    /// Numeric components as written
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Revision number (0 when absent)
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The same version without its revision
    ///
    /// Revisions are local to the overlay; upstream artifacts are keyed by
    /// this part only.
    pub fn upstream(&self) -> Version {
        Version {
            components: self.components.clone(),
            revision: 0,
        }
    }

    /// Total-order key for sorting
    pub fn sort_key(&self) -> SortKey {
        sort_key(self)
    }

    fn trimmed(&self) -> &[u64] {
        let len = self
            .components
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |i| i + 1);
        &self.components[..len]
    }
}

fn parse_number(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Compute the sort key of a version
pub fn sort_key(version: &Version) -> SortKey {
    (version.trimmed().to_vec(), version.revision)
}

/// Extract the version from an ebuild filename or path
///
/// The filename must end in `.ebuild`; the version is the trailing
/// `-<version>[-r<N>]` token of the stem.
pub fn extract_version(path: impl AsRef<Path>) -> Result<Version> {
    let path = path.as_ref();
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::MalformedVersion(path.display().to_string()))?;

    let stem = filename
        .strip_suffix(RECIPE_EXTENSION)
        .ok_or_else(|| Error::MalformedVersion(filename.to_string()))?;

    let token = VERSION_TOKEN
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| Error::MalformedVersion(filename.to_string()))?;

    Version::parse(token.as_str()).map_err(|_| Error::MalformedVersion(filename.to_string()))
}

/// Canonical ebuild filename for a package version
pub fn recipe_filename(package: &str, version: &Version) -> String {
    format!("{package}-{version}{RECIPE_EXTENSION}")
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        if self.revision > 0 {
            write!(f, "-r{}", self.revision)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trimmed().hash(state);
        self.revision.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Serialized as the canonical string form in reports, matrices and results
impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}
