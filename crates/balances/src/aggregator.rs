//! Balance Aggregator: folds split expenses into one balance per member.
//!
//! Expenses are processed in input order and the first failing expense stops
//! the run. The resulting nets always sum to zero; a table that does not is
//! reported as an invariant violation.

use thiserror::Error;
use tracing::debug;

use settleup_core::{Currency, SettleError, SettleResult};
use settleup_splitting::{Expense, compute_split};

use crate::balance::BalanceTable;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// The expense at `index` (0-based, input order) could not be applied.
    #[error("expense #{index} rejected: {source}")]
    Expense {
        index: usize,
        #[source]
        source: SettleError,
    },

    /// The aggregated nets did not sum to zero.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl AggregationError {
    /// Position of the offending expense, if the failure is tied to one.
    pub fn index(&self) -> Option<usize> {
        match self {
            AggregationError::Expense { index, .. } => Some(*index),
            AggregationError::InvariantViolation(_) => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        match self {
            AggregationError::Expense { source, .. } => source.is_fatal(),
            AggregationError::InvariantViolation(_) => true,
        }
    }
}

/// Running per-member totals.
///
/// `apply` either applies a whole expense or returns an error; after an
/// overflow error the accumulator should be discarded.
#[derive(Debug, Clone, Default)]
pub struct BalanceAccumulator {
    currency: Option<Currency>,
    table: BalanceTable,
}

impl BalanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split one expense and credit/debit its members.
    pub fn apply(&mut self, expense: &Expense) -> SettleResult<()> {
        let currency = expense.amount.currency();
        match self.currency {
            Some(group) if group != currency => {
                return Err(SettleError::validation(format!(
                    "expense is in {currency}, earlier expenses are in {group}"
                )));
            }
            _ => {}
        }

        let split = compute_split(expense)?;
        self.currency = Some(currency);

        let payer = self
            .table
            .entry(&expense.payer, currency)
            .with_paid(expense.amount)?;
        self.table.put(payer);

        for (participant, share) in split.iter() {
            let balance = self.table.entry(participant, currency).with_owed(share)?;
            self.table.put(balance);
        }
        Ok(())
    }

    pub fn finish(self) -> BalanceTable {
        self.table
    }
}

/// Aggregate expenses into a balance table, failing on the first bad expense.
pub fn aggregate(expenses: &[Expense]) -> Result<BalanceTable, AggregationError> {
    let mut accumulator = BalanceAccumulator::new();
    for (index, expense) in expenses.iter().enumerate() {
        accumulator
            .apply(expense)
            .map_err(|source| AggregationError::Expense { index, source })?;
        debug!(index, payer = %expense.payer, amount = %expense.amount, "expense applied");
    }

    let table = accumulator.finish();
    let balanced = table
        .is_balanced()
        .map_err(|e| AggregationError::InvariantViolation(e.to_string()))?;
    if !balanced {
        return Err(AggregationError::InvariantViolation(
            "aggregated nets do not sum to zero".to_string(),
        ));
    }

    debug!(
        expenses = expenses.len(),
        participants = table.len(),
        "balances aggregated"
    );
    Ok(table)
}
