//! Transaction types for hashledger

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value moved from `source` to `target`.
///
/// An empty `source` marks a deposit (mint): value enters the ledger and no
/// account is debited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    source: String,
    target: String,
    amount: i32,
}

impl Transaction {
    pub fn new(source: impl Into<String>, target: impl Into<String>, amount: i32) -> Self {
        Transaction {
            source: source.into(),
            target: target.into(),
            amount,
        }
    }

    /// A deposit of `amount` into `target`.
    pub fn mint(target: impl Into<String>, amount: i32) -> Self {
        Self::new(String::new(), target, amount)
    }

    /// The transaction carried by the genesis block.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn amount(&self) -> i32 {
        self.amount
    }

    pub fn is_mint(&self) -> bool {
        self.source.is_empty()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_mint() {
            write!(f, "[Deposit, Target: {}, Amount: {}]", self.target, self.amount)
        } else {
            write!(
                f,
                "[Source: {}, Target: {}, Amount: {}]",
                self.source, self.target, self.amount
            )
        }
    }
}
