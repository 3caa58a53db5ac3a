use crate::block::Block;
use crate::error::ChainError;
use crate::hash::HashDigest;
use crate::miner::MiningControl;
use crate::transaction::Transaction;
use crate::validator::HashValidator;
use std::fmt;
use std::iter;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::state::{Balance, BalanceState};
use super::validation::{audit, validate_candidate};

/// An append-only chain of blocks, starting from a genesis block that is
/// never removed, together with the balances its transactions imply.
#[derive(Clone)]
pub struct Ledger {
    genesis: Block,
    blocks: Vec<Block>,
    validator: Arc<dyn HashValidator>,
    state: BalanceState,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("len", &self.len())
            .field("tail_hash", &self.tail_hash().to_hex())
            .field("users", &self.users())
            .finish()
    }
}

impl Ledger {
    /// Create a new `Ledger`, mining its genesis block without limits.
    pub fn new(validator: Arc<dyn HashValidator>) -> Result<Self, ChainError> {
        Self::with_control(validator, &MiningControl::unbounded())
    }

    /// Create a new `Ledger`, mining its genesis block under `control`.
    pub fn with_control(
        validator: Arc<dyn HashValidator>,
        control: &MiningControl,
    ) -> Result<Self, ChainError> {
        let genesis = Block::mine_with(
            0,
            Transaction::empty(),
            HashDigest::empty(),
            validator.as_ref(),
            control,
        )?;
        info!(hash = %genesis.hash(), nonce = genesis.nonce(), "genesis block mined");

        Ok(Ledger {
            genesis,
            blocks: Vec::new(),
            validator,
            state: BalanceState::new(),
        })
    }

    /// Rebuild a ledger from blocks produced elsewhere, without verifying
    /// them. The first block is taken as genesis. Run [`check`](Self::check)
    /// before trusting the result.
    pub fn from_blocks_unchecked(
        validator: Arc<dyn HashValidator>,
        blocks: Vec<Block>,
    ) -> Result<Self, ChainError> {
        let mut blocks = blocks.into_iter();
        let genesis = blocks.next().ok_or_else(|| {
            ChainError::InvalidBlock("Cannot rebuild a ledger from an empty block list.".to_string())
        })?;

        let mut ledger = Ledger {
            genesis,
            blocks: Vec::new(),
            validator,
            state: BalanceState::new(),
        };
        for block in blocks {
            ledger.state.apply_transaction(block.transaction());
            ledger.blocks.push(block);
        }
        debug!(len = ledger.len(), "ledger rebuilt without verification");
        Ok(ledger)
    }

    pub fn validator(&self) -> &Arc<dyn HashValidator> {
        &self.validator
    }

    /// Number of blocks, genesis included. Never zero.
    pub fn len(&self) -> usize {
        self.blocks.len() + 1
    }

    pub fn genesis(&self) -> &Block {
        &self.genesis
    }

    pub fn tail(&self) -> &Block {
        self.blocks.last().unwrap_or(&self.genesis)
    }

    pub fn tail_hash(&self) -> &HashDigest {
        self.tail().hash()
    }

    /// Index the next appended block is expected to carry.
    pub fn next_index(&self) -> Result<u32, ChainError> {
        u32::try_from(self.len())
            .map_err(|_| ChainError::InvalidBlock("Chain has run out of block numbers.".to_string()))
    }

    /// Mine a candidate block on top of the current tail.
    ///
    /// Neither the ledger nor the source balance is consulted beyond the tail
    /// hash; an overdraft is reported later by [`check`](Self::check).
    pub fn mine(&self, transaction: Transaction) -> Result<Block, ChainError> {
        self.mine_with(transaction, &MiningControl::unbounded())
    }

    pub fn mine_with(
        &self,
        transaction: Transaction,
        control: &MiningControl,
    ) -> Result<Block, ChainError> {
        Block::mine_with(
            self.next_index()?,
            transaction,
            self.tail_hash().clone(),
            self.validator.as_ref(),
            control,
        )
    }

    /// Link `block` as the new tail. On error the ledger is unchanged.
    pub fn append(&mut self, block: Block) -> Result<(), ChainError> {
        if let Err(e) = validate_candidate(&block, self.tail_hash(), self.validator.as_ref()) {
            warn!(index = block.index(), "rejected block: {}", e);
            return Err(e);
        }

        self.state.apply_transaction(block.transaction());
        info!(
            index = block.index(),
            hash = %block.hash(),
            transaction = %block.transaction(),
            "block appended"
        );
        self.blocks.push(block);
        Ok(())
    }

    /// Drop the tail block and undo its balance effect. Returns `false` when
    /// only genesis is left.
    pub fn remove_last(&mut self) -> bool {
        let Some(block) = self.blocks.pop() else {
            return false;
        };
        self.state.revert_transaction(block.transaction());
        info!(index = block.index(), hash = %block.hash(), "block removed");
        true
    }

    /// Audit the whole chain, failing with the first violation found.
    pub fn check(&self) -> Result<(), ChainError> {
        audit(self.blocks(), self.validator.as_ref()).map_err(|violation| {
            warn!(index = violation.index(), "chain audit failed: {}", violation);
            ChainError::from(violation)
        })
    }

    pub fn is_correct(&self) -> bool {
        audit(self.blocks(), self.validator.as_ref()).is_ok()
    }

    /// Balance of `user`, recomputed from every transaction in the chain.
    /// Users that never appeared have a balance of zero.
    pub fn balance(&self, user: &str) -> Balance {
        if !self.state.users().contains(user) {
            return 0;
        }
        self.transactions().fold(0, |total, tx| {
            let amount = Balance::from(tx.amount());
            let mut total = total;
            if !tx.is_mint() && tx.source() == user {
                total -= amount;
            }
            if tx.target() == user {
                total += amount;
            }
            total
        })
    }

    /// Running balance kept alongside the chain, or `None` if `user` never
    /// appeared.
    pub fn tracked_balance(&self, user: &str) -> Option<Balance> {
        self.state.get(user)
    }

    /// Users in the order they first appeared.
    pub fn users(&self) -> &[String] {
        self.state.users().as_slice()
    }

    pub fn blocks(&self) -> impl DoubleEndedIterator<Item = &Block> + '_ {
        iter::once(&self.genesis).chain(self.blocks.iter())
    }

    /// Transactions from genesis to tail; the first is genesis's empty one.
    pub fn transactions(&self) -> impl DoubleEndedIterator<Item = &Transaction> + '_ {
        self.blocks().map(Block::transaction)
    }

    pub fn to_blocks(&self) -> Vec<Block> {
        self.blocks().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntegrityViolation;
    use crate::validator::LeadingZeroBits;

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(LeadingZeroBits(4))).unwrap()
    }

    fn mine_and_append(ledger: &mut Ledger, tx: Transaction) {
        let block = ledger.mine(tx).unwrap();
        ledger.append(block).unwrap();
    }

    #[test]
    fn test_fresh_ledger() {
        let ledger = ledger();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.is_correct());
        assert_eq!(ledger.balance("anyone"), 0);
        assert!(ledger.users().is_empty());

        let genesis = ledger.genesis();
        assert_eq!(genesis.index(), 0);
        assert_eq!(genesis.transaction(), &Transaction::empty());
        assert!(genesis.previous_hash().is_empty());
        assert_eq!(ledger.tail_hash(), genesis.hash());
    }

    #[test]
    fn test_mine_does_not_mutate() {
        let ledger = ledger();
        let block = ledger.mine(Transaction::mint("alice", 5)).unwrap();
        assert_eq!(block.index(), 1);
        assert_eq!(block.previous_hash(), ledger.tail_hash());
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.balance("alice"), 0);
    }

    #[test]
    fn test_mine_allows_overdraft() {
        let mut ledger = ledger();
        mine_and_append(&mut ledger, Transaction::new("alice", "bob", 10));
        assert_eq!(ledger.balance("alice"), -10);
        assert!(matches!(
            ledger.check(),
            Err(ChainError::ChainIntegrity(IntegrityViolation::UnknownSource { index: 1, .. }))
        ));
    }

    #[test]
    fn test_append_rejects_stale_block() {
        let mut ledger = ledger();
        let stale = ledger.mine(Transaction::mint("alice", 1)).unwrap();
        mine_and_append(&mut ledger, Transaction::mint("bob", 2));

        let tail_before = ledger.tail_hash().clone();
        let err = ledger.append(stale).unwrap_err();
        assert!(matches!(err, ChainError::InvalidBlock(_)));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.tail_hash(), &tail_before);
        assert_eq!(ledger.users(), &["bob".to_string()]);
    }

    #[test]
    fn test_tracked_balance_follows_append_and_remove() {
        let mut ledger = ledger();
        mine_and_append(&mut ledger, Transaction::mint("alice", 100));
        mine_and_append(&mut ledger, Transaction::new("alice", "bob", 40));
        assert_eq!(ledger.tracked_balance("alice"), Some(60));
        assert!(ledger.remove_last());
        assert_eq!(ledger.tracked_balance("alice"), Some(100));
        assert_eq!(ledger.tracked_balance("bob"), Some(0));
        assert_eq!(ledger.tracked_balance("carol"), None);
    }

    #[test]
    fn test_transactions_start_with_genesis() {
        let mut ledger = ledger();
        mine_and_append(&mut ledger, Transaction::mint("alice", 3));
        let txs: Vec<_> = ledger.transactions().cloned().collect();
        assert_eq!(txs, vec![Transaction::empty(), Transaction::mint("alice", 3)]);

        let newest_first: Vec<u32> = ledger.blocks().rev().map(Block::index).collect();
        assert_eq!(newest_first, vec![1, 0]);
    }

    #[test]
    fn test_from_blocks_unchecked() {
        let mut source = ledger();
        mine_and_append(&mut source, Transaction::mint("alice", 7));
        let rebuilt =
            Ledger::from_blocks_unchecked(source.validator().clone(), source.to_blocks()).unwrap();
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt.tail_hash(), source.tail_hash());
        assert_eq!(rebuilt.balance("alice"), 7);
        assert!(rebuilt.is_correct());

        let err = Ledger::from_blocks_unchecked(source.validator().clone(), Vec::new()).unwrap_err();
        assert!(matches!(err, ChainError::InvalidBlock(_)));
    }

    #[test]
    fn test_genesis_mining_can_be_capped() {
        let never: Arc<dyn HashValidator> = Arc::new(|_: &HashDigest| false);
        let control = MiningControl::unbounded().with_max_attempts(3);
        let err = Ledger::with_control(never, &control).unwrap_err();
        assert_eq!(err, ChainError::MiningAborted { attempts: 3 });
    }
}
