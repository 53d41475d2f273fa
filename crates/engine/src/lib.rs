//! `settleup-engine`: runs the split, aggregate and settle stages in order.
//!
//! Every call is independent: the engine holds only its configuration, so
//! hosts may run groups concurrently without coordination.

pub mod config;
pub mod engine;

pub use config::EngineConfig;
pub use engine::{BalanceLine, EngineError, SettlementEngine, SettlementReport};

pub use settleup_balances::{Balance, BalanceTable};
pub use settleup_core::{Currency, Money, Participant, SettleError};
pub use settleup_settlement::{MatchingStrategy, SettlementTransaction};
pub use settleup_splitting::{Expense, SplitPolicy, SplitResult, compute_split};
