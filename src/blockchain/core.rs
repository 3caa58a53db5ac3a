// core.rs splits the ledger into its chain, derived state and validation rules.
pub mod chain;
pub mod state;
pub mod validation;

pub use chain::*;
pub use state::*;
pub use validation::*;
