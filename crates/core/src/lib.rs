//! `settleup-core`: money, member identity and the error taxonomy shared by
//! every settlement stage.
//!
//! This crate is pure: no IO, no global state.

pub mod currency;
pub mod error;
pub mod money;
pub mod participant;

pub use currency::Currency;
pub use error::{SettleError, SettleResult};
pub use money::Money;
pub use participant::Participant;
