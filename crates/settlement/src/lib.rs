//! Settlement Optimizer: turns a balance table into "who pays whom".
//!
//! Pure domain logic only: no IO, no persistence concerns.

pub mod optimizer;
pub mod plan;
pub mod transaction;

pub use optimizer::{MatchingStrategy, optimize, optimize_nets, optimize_with};
pub use plan::{residual_balances, verify_plan};
pub use transaction::SettlementTransaction;
