//! Lock-guarded handle for sharing one ledger between threads
//!
//! `append` and `remove_last` hold the write lock for their whole
//! validate-then-mutate step. `mine_with` only reads the tail under the lock
//! and searches without it; if the tail moves before the block comes back,
//! `append` refuses it through the previous-hash check.

use crate::blockchain::{Balance, Ledger};
use crate::block::Block;
use crate::error::ChainError;
use crate::hash::HashDigest;
use crate::miner::MiningControl;
use crate::transaction::Transaction;
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        SharedLedger {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Read access for anything not wrapped here. Hold it briefly: writers
    /// wait on it.
    pub fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read()
    }

    pub fn mine_with(
        &self,
        transaction: Transaction,
        control: &MiningControl,
    ) -> Result<Block, ChainError> {
        let (index, previous_hash, validator) = {
            let ledger = self.inner.read();
            (
                ledger.next_index()?,
                ledger.tail_hash().clone(),
                ledger.validator().clone(),
            )
        };
        Block::mine_with(index, transaction, previous_hash, validator.as_ref(), control)
    }

    pub fn append(&self, block: Block) -> Result<(), ChainError> {
        self.inner.write().append(block)
    }

    pub fn remove_last(&self) -> bool {
        self.inner.write().remove_last()
    }

    pub fn check(&self) -> Result<(), ChainError> {
        self.inner.read().check()
    }

    pub fn is_correct(&self) -> bool {
        self.inner.read().is_correct()
    }

    pub fn balance(&self, user: &str) -> Balance {
        self.inner.read().balance(user)
    }

    pub fn users(&self) -> Vec<String> {
        self.inner.read().users().to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn tail_hash(&self) -> HashDigest {
        self.inner.read().tail_hash().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::LeadingZeroBits;
    use std::thread;

    fn shared() -> SharedLedger {
        SharedLedger::new(Ledger::new(Arc::new(LeadingZeroBits(4))).unwrap())
    }

    #[test]
    fn test_stale_mined_block_is_rejected() {
        let ledger = shared();
        let control = MiningControl::unbounded();
        let first = ledger.mine_with(Transaction::mint("alice", 5), &control).unwrap();
        let second = ledger.mine_with(Transaction::mint("bob", 5), &control).unwrap();

        ledger.append(first).unwrap();
        let err = ledger.append(second).unwrap_err();
        assert!(matches!(err, ChainError::InvalidBlock(_)));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.users(), vec!["alice".to_string()]);
    }

    #[test]
    fn test_concurrent_miners_each_land_one_block() {
        let ledger = shared();
        let handles: Vec<_> = ["alice", "bob", "carol"]
            .into_iter()
            .map(|user| {
                let ledger = ledger.clone();
                thread::spawn(move || loop {
                    let block = ledger
                        .mine_with(Transaction::mint(user, 1), &MiningControl::unbounded())
                        .unwrap();
                    if ledger.append(block).is_ok() {
                        break;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.len(), 4);
        assert!(ledger.is_correct());
        for user in ["alice", "bob", "carol"] {
            assert_eq!(ledger.balance(user), 1);
        }
    }
}
