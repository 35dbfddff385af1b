// src/manifest/format.rs

//! Gentoo Manifest file format
//!
//! Line-oriented UTF-8 text. Only `DIST` lines are interpreted:
//!
//! ```text
//! DIST <filename> <size> <ALGO1> <digest1> <ALGO2> <digest2> ...
//! ```
//!
//! Every other non-empty line is carried through untouched.

use crate::error::{Error, Result};
use crate::hash::{Digests, Hash, HashAlgorithm};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

/// Name of the Manifest file in a package directory
pub const MANIFEST_FILENAME: &str = "Manifest";

/// One `DIST` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistEntry {
    /// Distfile name
    pub name: String,
    /// Distfile size in bytes
    pub size: u64,
    /// `(ALGO, digest)` pairs in file order
    pub digests: Vec<(String, String)>,
}

impl DistEntry {
    /// Build an entry from freshly computed digests
    pub fn from_digests(name: impl Into<String>, digests: Digests) -> Self {
        Self {
            name: name.into(),
            size: digests.size,
            digests: digests
                .hashes
                .into_iter()
                .map(|h| (h.algorithm.manifest_name().to_string(), h.value))
                .collect(),
        }
    }

    /// Parse the fields following the `DIST` keyword
    fn parse_fields(line: &str, fields: &[&str]) -> Result<Self> {
        let malformed = |why: &str| Error::ParseError(format!("{why} in Manifest line '{line}'"));

        let [name, size, rest @ ..] = fields else {
            return Err(malformed("missing filename or size"));
        };
        let size = size.parse::<u64>().map_err(|_| malformed("invalid size"))?;
        if rest.len() % 2 != 0 {
            return Err(malformed("unpaired digest"));
        }

        let mut digests = Vec::with_capacity(rest.len() / 2);
        for pair in rest.chunks(2) {
            let (algo, digest) = (pair[0], pair[1]);
            // Digests of algorithms we know are validated; others pass through.
            if let Ok(algorithm) = algo.parse::<HashAlgorithm>() {
                Hash::new(algorithm, digest).map_err(|e| malformed(&e.to_string()))?;
            }
            digests.push((algo.to_string(), digest.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            size,
            digests,
        })
    }

    /// Digest recorded for `algorithm`, if any
    pub fn digest(&self, algorithm: HashAlgorithm) -> Option<&str> {
        self.digests
            .iter()
            .find(|(algo, _)| algo.parse::<HashAlgorithm>().ok() == Some(algorithm))
            .map(|(_, digest)| digest.as_str())
    }

    /// Render as a Manifest line (without newline)
    pub fn to_line(&self) -> String {
        let mut line = format!("DIST {} {}", self.name, self.size);
        for (algo, digest) in &self.digests {
            line.push(' ');
            line.push_str(algo);
            line.push(' ');
            line.push_str(digest);
        }
        line
    }
}

/// A parsed Manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// `DIST` entries in file order
    pub dist: Vec<DistEntry>,
    /// Non-`DIST` lines in file order
    pub other: Vec<String>,
}

impl Manifest {
    /// Parse Manifest text
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_keeping(text, |_| true).map(|(manifest, _)| manifest)
    }

    /// Parse Manifest text, keeping only `DIST` lines whose distfile `keep` accepts
    ///
    /// Rejected lines are dropped unparsed, so a malformed entry only fails
    /// the parse when it is kept. Returns the names of dropped distfiles, in
    /// file order and without repeats.
    pub fn parse_keeping(
        text: &str,
        keep: impl Fn(&str) -> bool,
    ) -> Result<(Self, Vec<String>)> {
        let mut manifest = Manifest::default();
        let mut dropped: Vec<String> = Vec::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if fields[0] != "DIST" {
                manifest.other.push(line.to_string());
                continue;
            }
            match fields.get(1).copied() {
                Some(name) if keep(name) => manifest
                    .dist
                    .push(DistEntry::parse_fields(trimmed, &fields[1..])?),
                Some(name) => {
                    if !dropped.iter().any(|d| d == name) {
                        dropped.push(name.to_string());
                    }
                }
                None => warn!("Dropping Manifest line without a filename: '{}'", trimmed),
            }
        }
        Ok((manifest, dropped))
    }

    /// Raw text of a Manifest file; a missing file reads as empty
    pub fn read_text(path: &Path) -> Result<String> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    /// Read a Manifest file, returning its raw text and parsed form
    ///
    /// A missing file reads as empty.
    pub fn read(path: &Path) -> Result<(String, Self)> {
        let text = Self::read_text(path)?;
        let manifest = Self::parse(&text)?;
        Ok((text, manifest))
    }

    /// Render as file text: other lines first, then `DIST` lines
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.other {
            out.push_str(line);
            out.push('\n');
        }
        for entry in &self.dist {
            out.push_str(&entry.to_line());
            out.push('\n');
        }
        out
    }

    /// Whether a `DIST` entry exists for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.dist.iter().any(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;

    fn sample_entry(name: &str, data: &[u8]) -> DistEntry {
        DistEntry::from_digests(
            name,
            Digests {
                size: data.len() as u64,
                hashes: HashAlgorithm::DEFAULT_SET
                    .iter()
                    .map(|&a| hash_bytes(a, data))
                    .collect(),
            },
        )
    }

    #[test]
    fn test_dist_line_format() {
        let entry = sample_entry("brave-browser_1.0.0_amd64.deb", b"deb");
        let line = entry.to_line();
        let fields: Vec<&str> = line.split(' ').collect();

        assert_eq!(fields[0], "DIST");
        assert_eq!(fields[1], "brave-browser_1.0.0_amd64.deb");
        assert_eq!(fields[2], "3");
        assert_eq!(fields[3], "BLAKE2B");
        assert_eq!(fields[5], "SHA512");
        assert_eq!(fields.len(), 7);
    }

    #[test]
    fn test_parse_keeps_other_lines() {
        let entry = sample_entry("a.deb", b"a");
        let text = format!("AUX foo.patch 12 SHA512 abc\n\n{}\n", entry.to_line());
        let manifest = Manifest::parse(&text).unwrap();

        assert_eq!(manifest.other, vec!["AUX foo.patch 12 SHA512 abc".to_string()]);
        assert_eq!(manifest.dist, vec![entry.clone()]);
        assert_eq!(manifest.dist[0].digests.len(), 2);
        assert!(manifest.contains("a.deb"));
    }

    #[test]
    fn test_parse_rejects_malformed_dist() {
        assert!(Manifest::parse("DIST onlyname\n").is_err());
        assert!(Manifest::parse("DIST a.deb big BLAKE2B 00\n").is_err());
        assert!(Manifest::parse("DIST a.deb 1 BLAKE2B\n").is_err());
        assert!(Manifest::parse("DIST a.deb 1 SHA512 nothex\n").is_err());
    }

    #[test]
    fn test_parse_keeping_skips_rejected_lines() {
        let good = sample_entry("b.deb", b"b");
        let text = format!(
            "DIST a.deb 10 SHA512 abc\nDIST\n{}\nDIST a.deb huge\nAUX x 1 SHA512 00\n",
            good.to_line()
        );

        let (manifest, dropped) = Manifest::parse_keeping(&text, |name| name == "b.deb").unwrap();
        assert_eq!(manifest.dist, vec![good]);
        assert_eq!(manifest.other, ["AUX x 1 SHA512 00"]);
        assert_eq!(dropped, ["a.deb"]);

        // The same lines fail when kept
        assert!(Manifest::parse_keeping(&text, |_| true).is_err());
    }

    #[test]
    fn test_unknown_algorithms_pass_through() {
        let text = "DIST a.deb 10 SHA256 deadbeef\n";
        let manifest = Manifest::parse(text).unwrap();
        assert_eq!(manifest.render(), text);
        assert_eq!(manifest.dist[0].digest(HashAlgorithm::Sha512), None);
    }

    #[test]
    fn test_digest_lookup() {
        let entry = sample_entry("a.deb", b"a");
        assert_eq!(
            entry.digest(HashAlgorithm::Sha512),
            Some(hash_bytes(HashAlgorithm::Sha512, b"a").value.as_str())
        );
    }

    #[test]
    fn test_read_missing_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let (text, manifest) = Manifest::read(&temp.path().join(MANIFEST_FILENAME)).unwrap();
        assert!(text.is_empty());
        assert_eq!(manifest, Manifest::default());
    }
}
