//! Checksum-addressed storage for embedded object payloads.
//!
//! The codec hands image and attachment bytes to a [`BlobStore`] and keeps
//! only the returned [`Checksum`] in the content model. How bytes are hashed
//! and where they live is the store's business.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::{self, Write as _};

/// Identity key of a stored payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Lowercase hex SHA-256 of `bytes`.
    pub fn sha256(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut hex = String::with_capacity(digest.len() * 2);
        for b in digest {
            let _ = write!(hex, "{:02x}", b);
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque payload storage keyed by checksum.
pub trait BlobStore {
    /// Store `bytes`, returning their identity key.
    fn put(&mut self, bytes: Bytes) -> Checksum;

    /// Fetch the bytes stored under `checksum`.
    fn get(&self, checksum: &Checksum) -> Option<Bytes>;

    fn contains(&self, checksum: &Checksum) -> bool {
        self.get(checksum).is_some()
    }
}

/// In-memory store using SHA-256 checksums.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<Checksum, Bytes>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&mut self, bytes: Bytes) -> Checksum {
        let checksum = Checksum::sha256(&bytes);
        self.blobs.entry(checksum.clone()).or_insert(bytes);
        checksum
    }

    fn get(&self, checksum: &Checksum) -> Option<Bytes> {
        self.blobs.get(checksum).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            Checksum::sha256(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_memory_store_dedups() {
        let mut store = MemoryBlobStore::new();
        let a = store.put(Bytes::from_static(b"png bytes"));
        let b = store.put(Bytes::from_static(b"png bytes"));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&a).unwrap().as_ref(), b"png bytes");
        assert!(!store.contains(&Checksum::new("missing")));
    }
}
