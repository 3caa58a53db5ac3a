//! hashledger - an append-only ledger of transactions chained by content
//! hashes and gated by a pluggable proof-of-work predicate
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - The chain, its derived balances, and validation
//! - [`block`] - Block structure and hashing
//! - [`transaction`] - Transfers and deposits
//! - [`hash`] - Content hashes
//!
//! ## Proof of Work
//! - [`validator`] - Difficulty predicates
//! - [`miner`] - Cancellable nonce search
//!
//! ## Integration
//! - [`shared`] - Lock-guarded handle for multi-threaded callers
//! - [`cli`] - Interactive command shell
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod block;
pub mod blockchain;
pub mod hash;
pub mod transaction;

// ============================================================================
// Proof of Work
// ============================================================================
pub mod miner;
pub mod validator;

// ============================================================================
// Integration
// ============================================================================
pub mod cli;
pub mod shared;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use block::Block;
pub use blockchain::{Balance, Ledger};
pub use error::{ChainError, IntegrityViolation, Result};
pub use hash::HashDigest;
pub use miner::{CancelToken, MiningControl};
pub use shared::SharedLedger;
pub use transaction::Transaction;
pub use validator::{HashValidator, LeadingZeroBits, LeadingZeroBytes};
