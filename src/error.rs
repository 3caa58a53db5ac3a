//! Error types for hashledger

use crate::hash::HashDigest;
use std::fmt;

/// The first audit violation found while replaying a chain.
///
/// Every variant carries the index of the offending block so a report can
/// point at it directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityViolation {
    #[error("block {index} moves a negative amount ({amount})")]
    NegativeAmount { index: u32, amount: i32 },

    #[error("block {index} debits '{user}', who has no balance yet")]
    UnknownSource { index: u32, user: String },

    #[error("block {index} leaves '{user}' with a negative balance ({balance})")]
    NegativeBalance {
        index: u32,
        user: String,
        balance: i64,
    },

    #[error("block {index} links to {found}, but the previous block hashes to {expected}")]
    BrokenLink {
        index: u32,
        expected: HashDigest,
        found: HashDigest,
    },

    #[error("block {index} stores hash {stored}, but its contents hash to {computed}")]
    HashMismatch {
        index: u32,
        stored: HashDigest,
        computed: HashDigest,
    },

    #[error("block {index} hash {hash} is rejected by the validator")]
    RejectedHash { index: u32, hash: HashDigest },

    #[error("genesis block is not the empty block: {reason}")]
    InvalidGenesis { reason: String },

    #[error("block numbered {index} sits at position {position}")]
    MisplacedBlock { index: u32, position: u32 },
}

impl IntegrityViolation {
    /// Position in the chain of the block the violation was found at.
    pub fn index(&self) -> u32 {
        match self {
            IntegrityViolation::NegativeAmount { index, .. }
            | IntegrityViolation::UnknownSource { index, .. }
            | IntegrityViolation::NegativeBalance { index, .. }
            | IntegrityViolation::BrokenLink { index, .. }
            | IntegrityViolation::HashMismatch { index, .. }
            | IntegrityViolation::RejectedHash { index, .. } => *index,
            IntegrityViolation::InvalidGenesis { .. } => 0,
            IntegrityViolation::MisplacedBlock { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    InvalidBlock(String),
    ChainIntegrity(IntegrityViolation),
    MiningAborted { attempts: u64 },
    IndexOutOfRange { index: usize, len: usize },
    Parse(String),
    Config(String),
    Io(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::InvalidBlock(msg) => write!(f, "Invalid block: {}", msg),
            ChainError::ChainIntegrity(violation) => {
                write!(f, "Chain integrity error: {}", violation)
            }
            ChainError::MiningAborted { attempts } => {
                write!(f, "Mining aborted after {} attempts", attempts)
            }
            ChainError::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range for hash of length {}", index, len)
            }
            ChainError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ChainError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ChainError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChainError::ChainIntegrity(violation) => Some(violation),
            _ => None,
        }
    }
}

impl From<IntegrityViolation> for ChainError {
    fn from(violation: IntegrityViolation) -> Self {
        ChainError::ChainIntegrity(violation)
    }
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
