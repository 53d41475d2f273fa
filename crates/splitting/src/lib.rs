//! Split Calculator: turns one expense into a per-member breakdown.
//!
//! Pure domain logic only: no IO, no persistence concerns.

pub mod calculator;
pub mod expense;

pub use calculator::{PERCENTAGE_TOLERANCE, SplitResult, compute_split};
pub use expense::{Expense, SplitPolicy};
