//! Content hashes

use crate::error::{ChainError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An immutable digest. Equality and hashing are byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashDigest(Box<[u8]>);

impl HashDigest {
    /// Copies `bytes` into a new digest.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        HashDigest(bytes.into().into_boxed_slice())
    }

    /// The zero-length digest used as the genesis block's previous hash.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| ChainError::Parse(format!("Invalid hex hash '{}': {}", hex_str, e)))?;
        Ok(Self::new(bytes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn byte_at(&self, index: usize) -> Result<u8> {
        self.0
            .get(index)
            .copied()
            .ok_or(ChainError::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns an owned copy; changing it never touches the digest.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Two uppercase hex digits per byte, no separators.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl From<[u8; 32]> for HashDigest {
    fn from(bytes: [u8; 32]) -> Self {
        HashDigest(Box::new(bytes))
    }
}

impl AsRef<[u8]> for HashDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for HashDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HashDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        HashDigest::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}
