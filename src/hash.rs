// src/hash.rs

//! Distfile hashing for Manifest entries
//!
//! Gentoo Manifests record several digests per distfile. This module provides
//! the supported algorithms and a [`MultiHasher`] that feeds a single stream
//! through all of them at once, so large artifacts are read exactly once and
//! never buffered in memory.
//!
//! | Algorithm | Manifest name | Output |
//! |-----------|---------------|--------|
//! | BLAKE2b-512 | `BLAKE2B` | 64 bytes |
//! | SHA-512 | `SHA512` | 64 bytes |

use blake2::Blake2b512;
use sha2::{Digest, Sha512};
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

/// Buffer size for streaming reads (64 KB)
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgorithm {
    /// BLAKE2b with 512-bit output
    Blake2b,
    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// Algorithms written to new Manifest entries, in Manifest order
    pub const DEFAULT_SET: [HashAlgorithm; 2] = [HashAlgorithm::Blake2b, HashAlgorithm::Sha512];

    /// Get the hash output length in bytes
    #[inline]
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Blake2b => 64,
            Self::Sha512 => 64,
        }
    }

    /// Get the hash output length as a hex string
    #[inline]
    pub const fn hex_len(&self) -> usize {
        self.output_len() * 2
    }

    /// Name used in Manifest DIST lines
    #[inline]
    pub const fn manifest_name(&self) -> &'static str {
        match self {
            Self::Blake2b => "BLAKE2B",
            Self::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.manifest_name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BLAKE2B" | "BLAKE2B512" => Ok(Self::Blake2b),
            "SHA512" | "SHA-512" => Ok(Self::Sha512),
            _ => Err(HashError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Hash computation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Unknown hash algorithm name
    UnknownAlgorithm(String),
    /// Hash string has wrong length for algorithm
    InvalidLength { expected: usize, got: usize },
    /// Hash string contains invalid hex characters
    InvalidHex(String),
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAlgorithm(name) => write!(f, "unknown hash algorithm: {}", name),
            Self::InvalidLength { expected, got } => {
                write!(f, "invalid hash length: expected {}, got {}", expected, got)
            }
            Self::InvalidHex(s) => write!(f, "invalid hex in hash: {}", s),
        }
    }
}

impl std::error::Error for HashError {}

/// A hash value with its algorithm
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    /// The algorithm used
    pub algorithm: HashAlgorithm,
    /// The hash value as a lowercase hex string
    pub value: String,
}

impl Hash {
    /// Create a new hash value, validating length and hex digits
    pub fn new(algorithm: HashAlgorithm, value: impl Into<String>) -> Result<Self, HashError> {
        let value = value.into();
        let expected_len = algorithm.hex_len();

        if value.len() != expected_len {
            return Err(HashError::InvalidLength {
                expected: expected_len,
                got: value.len(),
            });
        }

        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HashError::InvalidHex(value));
        }

        Ok(Self {
            algorithm,
            value: value.to_lowercase(),
        })
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Hasher for a single algorithm
pub struct Hasher {
    algorithm: HashAlgorithm,
    state: HasherState,
}

enum HasherState {
    Blake2b(Blake2b512),
    Sha512(Sha512),
}

impl Hasher {
    /// Create a new hasher with the specified algorithm
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Blake2b => HasherState::Blake2b(Blake2b512::new()),
            HashAlgorithm::Sha512 => HasherState::Sha512(Sha512::new()),
        };
        Self { algorithm, state }
    }

    /// Update the hasher with more data
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HasherState::Blake2b(hasher) => hasher.update(data),
            HasherState::Sha512(hasher) => hasher.update(data),
        }
    }

    /// Finalize and return the hash
    pub fn finalize(self) -> Hash {
        let value = match self.state {
            HasherState::Blake2b(hasher) => hex::encode(hasher.finalize()),
            HasherState::Sha512(hasher) => hex::encode(hasher.finalize()),
        };
        Hash {
            algorithm: self.algorithm,
            value,
        }
    }
}

/// Feeds one stream through several hashers and counts its bytes
pub struct MultiHasher {
    hashers: Vec<Hasher>,
    size: u64,
}

/// Result of hashing a stream under several algorithms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digests {
    /// Total bytes consumed
    pub size: u64,
    /// One hash per requested algorithm, in request order
    pub hashes: Vec<Hash>,
}

impl MultiHasher {
    /// Create a hasher for each algorithm, preserving order
    pub fn new(algorithms: &[HashAlgorithm]) -> Self {
        Self {
            hashers: algorithms.iter().copied().map(Hasher::new).collect(),
            size: 0,
        }
    }

    /// Update every hasher with more data
    pub fn update(&mut self, data: &[u8]) {
        for hasher in &mut self.hashers {
            hasher.update(data);
        }
        self.size += data.len() as u64;
    }

    /// Finalize all hashers
    pub fn finalize(self) -> Digests {
        Digests {
            size: self.size,
            hashes: self.hashers.into_iter().map(Hasher::finalize).collect(),
        }
    }
}

/// Compute hash of a byte slice
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> Hash {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize()
}

/// Stream a reader through every algorithm
///
/// `on_chunk` is called with the number of bytes read after each chunk, for
/// progress reporting.
pub fn hash_reader<R: Read + ?Sized>(
    algorithms: &[HashAlgorithm],
    reader: &mut R,
    mut on_chunk: impl FnMut(u64),
) -> io::Result<Digests> {
    let mut hasher = MultiHasher::new(algorithms);
    let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
        on_chunk(n as u64);
    }

    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA512: &str = "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e";
    const EMPTY_BLAKE2B: &str = "786a02f742015903c6c6fd852552d272912f4740e15847618a86e217f71f5419d25e1031afee585313896444934eb04b903a685b1448b755d56f701afe9be2ce";

    #[test]
    fn test_known_empty_digests() {
        assert_eq!(hash_bytes(HashAlgorithm::Sha512, b"").value, EMPTY_SHA512);
        assert_eq!(hash_bytes(HashAlgorithm::Blake2b, b"").value, EMPTY_BLAKE2B);
    }

    #[test]
    fn test_hasher_incremental() {
        let data = b"Hello, World!";
        for algorithm in HashAlgorithm::DEFAULT_SET {
            let full = hash_bytes(algorithm, data);

            let mut hasher = Hasher::new(algorithm);
            hasher.update(b"Hello, ");
            hasher.update(b"World!");
            assert_eq!(hasher.finalize(), full);
        }
    }

    #[test]
    fn test_hash_reader_matches_bytes() {
        let data = vec![7u8; STREAM_BUFFER_SIZE * 3 + 17];
        let mut cursor = std::io::Cursor::new(&data);
        let mut seen = 0;

        let digests =
            hash_reader(&HashAlgorithm::DEFAULT_SET, &mut cursor, |n| seen += n).unwrap();

        assert_eq!(digests.size, data.len() as u64);
        assert_eq!(seen, data.len() as u64);
        assert_eq!(digests.hashes.len(), 2);
        assert_eq!(digests.hashes[0], hash_bytes(HashAlgorithm::Blake2b, &data));
        assert_eq!(digests.hashes[1], hash_bytes(HashAlgorithm::Sha512, &data));
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("BLAKE2B".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake2b);
        assert_eq!("blake2b".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake2b);
        assert_eq!("SHA512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert!(matches!(
            "SHA256".parse::<HashAlgorithm>(),
            Err(HashError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_hash_validation() {
        assert!(Hash::new(HashAlgorithm::Sha512, EMPTY_SHA512).is_ok());
        assert!(matches!(
            Hash::new(HashAlgorithm::Sha512, "abc123"),
            Err(HashError::InvalidLength { .. })
        ));
        let bad = format!("zz{}", &EMPTY_SHA512[2..]);
        assert!(matches!(
            Hash::new(HashAlgorithm::Sha512, bad),
            Err(HashError::InvalidHex(_))
        ));
        let upper = Hash::new(HashAlgorithm::Sha512, EMPTY_SHA512.to_uppercase()).unwrap();
        assert_eq!(upper.value, EMPTY_SHA512);
    }
}
