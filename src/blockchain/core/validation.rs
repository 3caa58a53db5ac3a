use crate::block::Block;
use crate::error::{ChainError, IntegrityViolation};
use crate::hash::HashDigest;
use crate::transaction::Transaction;
use crate::validator::HashValidator;

use super::state::BalanceState;

/// Checks a candidate block against the current tail before it is linked.
pub fn validate_candidate(
    block: &Block,
    tail_hash: &HashDigest,
    validator: &dyn HashValidator,
) -> Result<(), ChainError> {
    let computed = block.compute_hash();

    if !validator.is_valid(block.hash()) {
        return Err(ChainError::InvalidBlock(format!(
            "Hash {} does not satisfy the proof-of-work validator.",
            block.hash()
        )));
    }

    if block.hash() != &computed {
        return Err(ChainError::InvalidBlock(format!(
            "Hash mismatch. Contents hash to {}, but the block claims {}.",
            computed,
            block.hash()
        )));
    }

    if block.previous_hash() != tail_hash {
        return Err(ChainError::InvalidBlock(format!(
            "Invalid previous block hash. Expected {}, but got {}.",
            tail_hash,
            block.previous_hash()
        )));
    }

    Ok(())
}

/// Replays `blocks` from genesis and reports the first violation.
///
/// Genesis must be the canonical empty block at index 0 with a valid hash of
/// its own. Balances are rebuilt as the scan goes, so a source that dips below
/// zero is caught at the block where it happens even if a later deposit covers
/// it.
pub fn audit<'a, I>(blocks: I, validator: &dyn HashValidator) -> Result<(), IntegrityViolation>
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut blocks = blocks.into_iter();
    let Some(mut previous) = blocks.next() else {
        return Ok(());
    };
    check_genesis(previous, validator)?;
    let mut balances = BalanceState::new();

    for (position, block) in (1u32..).zip(blocks) {
        let index = block.index();
        let tx = block.transaction();

        if tx.amount() < 0 {
            return Err(IntegrityViolation::NegativeAmount {
                index,
                amount: tx.amount(),
            });
        }

        if !tx.is_mint() && balances.get(tx.source()).is_none() {
            return Err(IntegrityViolation::UnknownSource {
                index,
                user: tx.source().to_string(),
            });
        }
        balances.apply_transaction(tx);
        if !tx.is_mint() {
            if let Some(balance) = balances.get(tx.source()).filter(|b| *b < 0) {
                return Err(IntegrityViolation::NegativeBalance {
                    index,
                    user: tx.source().to_string(),
                    balance,
                });
            }
        }

        if block.previous_hash() != previous.hash() {
            return Err(IntegrityViolation::BrokenLink {
                index,
                expected: previous.hash().clone(),
                found: block.previous_hash().clone(),
            });
        }

        let computed = block.compute_hash();
        if block.hash() != &computed {
            return Err(IntegrityViolation::HashMismatch {
                index,
                stored: block.hash().clone(),
                computed,
            });
        }

        if !validator.is_valid(block.hash()) {
            return Err(IntegrityViolation::RejectedHash {
                index,
                hash: block.hash().clone(),
            });
        }

        if index != position {
            return Err(IntegrityViolation::MisplacedBlock { index, position });
        }

        previous = block;
    }

    Ok(())
}

fn check_genesis(genesis: &Block, validator: &dyn HashValidator) -> Result<(), IntegrityViolation> {
    let reason = if genesis.index() != 0 {
        Some(format!("index is {}", genesis.index()))
    } else if genesis.transaction() != &Transaction::empty() {
        Some(format!("carries transaction {}", genesis.transaction()))
    } else if !genesis.previous_hash().is_empty() {
        Some(format!("links to {}", genesis.previous_hash()))
    } else {
        None
    };
    if let Some(reason) = reason {
        return Err(IntegrityViolation::InvalidGenesis { reason });
    }

    let computed = genesis.compute_hash();
    if genesis.hash() != &computed {
        return Err(IntegrityViolation::HashMismatch {
            index: 0,
            stored: genesis.hash().clone(),
            computed,
        });
    }

    if !validator.is_valid(genesis.hash()) {
        return Err(IntegrityViolation::RejectedHash {
            index: 0,
            hash: genesis.hash().clone(),
        });
    }

    Ok(())
}
