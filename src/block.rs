use crate::error::Result;
use crate::hash::HashDigest;
use crate::miner::{search_nonce, MiningControl};
use crate::transaction::Transaction;
use crate::validator::HashValidator;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A single ledger entry.
///
/// Fields are private: a block built through [`Block::mine`] or
/// [`Block::accept`] always carries the hash of its own contents. Blocks that
/// arrive from outside (deserialised, or via [`Block::from_raw_parts`]) are
/// taken as-is and only trusted once the ledger has checked them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u32,
    transaction: Transaction,
    previous_hash: HashDigest,
    nonce: u64,
    hash: HashDigest,
}

impl Block {
    /// SHA-256 over the block fields in their canonical byte layout.
    pub fn digest(
        index: u32,
        transaction: &Transaction,
        previous_hash: &HashDigest,
        nonce: u64,
    ) -> HashDigest {
        let mut hasher = Sha256::new();
        hasher.update(index.to_be_bytes());
        hasher.update(transaction.source().as_bytes());
        hasher.update(transaction.target().as_bytes());
        hasher.update(transaction.amount().to_be_bytes());
        hasher.update(previous_hash.as_bytes());
        hasher.update(nonce.to_be_bytes());
        let out: [u8; 32] = hasher.finalize().into();
        HashDigest::from(out)
    }

    /// Mines with no limit other than running out of nonces.
    pub fn mine(
        index: u32,
        transaction: Transaction,
        previous_hash: HashDigest,
        validator: &dyn HashValidator,
    ) -> Result<Self> {
        Self::mine_with(
            index,
            transaction,
            previous_hash,
            validator,
            &MiningControl::unbounded(),
        )
    }

    pub fn mine_with(
        index: u32,
        transaction: Transaction,
        previous_hash: HashDigest,
        validator: &dyn HashValidator,
        control: &MiningControl,
    ) -> Result<Self> {
        let (nonce, hash) = search_nonce(
            |nonce| Self::digest(index, &transaction, &previous_hash, nonce),
            validator,
            control,
        )?;

        Ok(Block {
            index,
            transaction,
            previous_hash,
            nonce,
            hash,
        })
    }

    /// Rebuilds a block from a nonce found elsewhere.
    pub fn accept(
        index: u32,
        transaction: Transaction,
        previous_hash: HashDigest,
        nonce: u64,
    ) -> Self {
        let hash = Self::digest(index, &transaction, &previous_hash, nonce);
        Block {
            index,
            transaction,
            previous_hash,
            nonce,
            hash,
        }
    }

    /// Takes every field verbatim, including `hash`. Nothing is recomputed.
    pub fn from_raw_parts(
        index: u32,
        transaction: Transaction,
        previous_hash: HashDigest,
        nonce: u64,
        hash: HashDigest,
    ) -> Self {
        Block {
            index,
            transaction,
            previous_hash,
            nonce,
            hash,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn previous_hash(&self) -> &HashDigest {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &HashDigest {
        &self.hash
    }

    pub fn compute_hash(&self) -> HashDigest {
        Self::digest(self.index, &self.transaction, &self.previous_hash, self.nonce)
    }

    pub fn hash_matches_contents(&self) -> bool {
        self.compute_hash() == self.hash
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Block {} (Transaction: {}, Nonce: {}, prevHash: {}, hash: {})",
            self.index, self.transaction, self.nonce, self.previous_hash, self.hash
        )
    }
}
