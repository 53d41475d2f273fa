//! Settlement error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::Money;
use crate::participant::Participant;

/// Result type used across the settlement pipeline.
pub type SettleResult<T> = Result<T, SettleError>;

/// Pipeline-level error.
///
/// Every variant is returned to the caller as-is: amounts are never silently
/// corrected. `InvariantViolation` is the only variant that signals a defect
/// in an upstream stage rather than bad input (see [`SettleError::is_fatal`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettleError {
    /// An amount was negative, zero where a positive value is required, or
    /// would produce a negative share.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// An expense had an empty participant set.
    #[error("expense has no participants")]
    NoParticipants,

    /// Percentages did not sum to 100 within tolerance (or one was negative).
    #[error("percentages must sum to 100 (got {total})")]
    InvalidPercentages { total: Decimal },

    /// Exact amounts did not add up to the expense total.
    #[error("exact split sums to {actual}, expected {expected}")]
    SplitMismatch { expected: Money, actual: Money },

    /// A ratio with a zero denominator was requested.
    #[error("division by zero")]
    DivisionByZero,

    /// A result did not fit in the minor-unit integer range.
    #[error("arithmetic overflow")]
    Overflow,

    /// A policy named someone outside the expense's participant set.
    #[error("participant {0} is not part of the expense")]
    UnknownParticipant(Participant),

    /// A value failed validation (malformed identifier, currency or literal).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An internal consistency check failed.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl SettleError {
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// True when the error is a bug report rather than a recoverable input error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}
