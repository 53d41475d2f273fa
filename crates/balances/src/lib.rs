//! Balance Aggregator: per-member paid/owed totals over a list of expenses.
//!
//! Pure domain logic only: no IO, no persistence concerns.

pub mod aggregator;
pub mod balance;

pub use aggregator::{AggregationError, BalanceAccumulator, aggregate};
pub use balance::{Balance, BalanceTable};
