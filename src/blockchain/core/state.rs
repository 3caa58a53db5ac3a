use crate::transaction::Transaction;
use std::collections::{HashMap, HashSet};

pub type Balance = i64;

/// Every user ever seen, in first-occurrence order.
///
/// Append-only: removing the block that introduced a user does not forget
/// them.
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `user` was not registered before.
    pub fn register(&mut self, user: &str) -> bool {
        if self.seen.contains(user) {
            return false;
        }
        self.seen.insert(user.to_string());
        self.order.push(user.to_string());
        true
    }

    pub fn contains(&self, user: &str) -> bool {
        self.seen.contains(user)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }
}

/// Running balances derived from the chain, plus the user registry.
#[derive(Debug, Clone, Default)]
pub struct BalanceState {
    balances: HashMap<String, Balance>,
    users: UserRegistry,
}

impl BalanceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the user has no entry yet.
    pub fn get(&self, user: &str) -> Option<Balance> {
        self.balances.get(user).copied()
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn apply_transaction(&mut self, tx: &Transaction) {
        let amount = Balance::from(tx.amount());
        if !tx.is_mint() {
            self.adjust(tx.source(), -amount);
        }
        self.adjust(tx.target(), amount);
    }

    /// Undoes [`apply_transaction`](Self::apply_transaction). Registry entries stay.
    pub fn revert_transaction(&mut self, tx: &Transaction) {
        let amount = Balance::from(tx.amount());
        if !tx.is_mint() {
            self.adjust(tx.source(), amount);
        }
        self.adjust(tx.target(), -amount);
    }

    fn adjust(&mut self, user: &str, delta: Balance) {
        match self.balances.get_mut(user) {
            Some(balance) => *balance += delta,
            None => {
                self.balances.insert(user.to_string(), delta);
            }
        }
        self.users.register(user);
    }
}
