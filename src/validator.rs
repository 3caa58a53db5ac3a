//! Proof-of-work predicates
//!
//! A validator decides which hashes are "valid enough" to enter the chain.
//! The ledger never builds one itself; it is handed one at construction and
//! uses it for mining, appending and auditing alike.

use crate::hash::HashDigest;
use std::fmt;

/// A pure predicate over a block hash.
pub trait HashValidator: Send + Sync {
    fn is_valid(&self, hash: &HashDigest) -> bool;
}

impl<F> HashValidator for F
where
    F: Fn(&HashDigest) -> bool + Send + Sync,
{
    fn is_valid(&self, hash: &HashDigest) -> bool {
        self(hash)
    }
}

/// Accepts a hash whose first `n` bytes are all zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadingZeroBytes(pub usize);

impl HashValidator for LeadingZeroBytes {
    fn is_valid(&self, hash: &HashDigest) -> bool {
        hash.len() >= self.0 && hash.as_bytes()[..self.0].iter().all(|b| *b == 0)
    }
}

impl fmt::Display for LeadingZeroBytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} leading zero bytes", self.0)
    }
}

/// Accepts a hash with at least `n` leading zero bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadingZeroBits(pub u32);

impl LeadingZeroBits {
    pub fn count(hash: &HashDigest) -> u32 {
        let mut total = 0u32;
        for b in hash.as_bytes() {
            if *b == 0 {
                total += 8;
            } else {
                total += b.leading_zeros();
                break;
            }
        }
        total
    }
}

impl HashValidator for LeadingZeroBits {
    fn is_valid(&self, hash: &HashDigest) -> bool {
        Self::count(hash) >= self.0
    }
}

impl fmt::Display for LeadingZeroBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} leading zero bits", self.0)
    }
}
