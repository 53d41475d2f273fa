//! The settlement pipeline: expenses -> balances -> payments.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, info_span};

use settleup_balances::{AggregationError, BalanceTable, aggregate};
use settleup_core::{Currency, Money, Participant, SettleError};
use settleup_settlement::{SettlementTransaction, optimize_with, verify_plan};
use settleup_splitting::Expense;

use crate::config::EngineConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An expense is not in the configured currency.
    #[error("expense #{index} is in {found}, engine is configured for {expected}")]
    CurrencyMismatch {
        index: usize,
        expected: Currency,
        found: Currency,
    },

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("settlement failed: {0}")]
    Settlement(#[from] SettleError),
}

impl EngineError {
    /// True when the failure points at a defect rather than bad input.
    pub fn is_fatal(&self) -> bool {
        match self {
            EngineError::CurrencyMismatch { .. } => false,
            EngineError::Aggregation(e) => e.is_fatal(),
            EngineError::Settlement(e) => e.is_fatal(),
        }
    }
}

/// Row of the balance summary: one member's totals with the derived net.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLine {
    pub participant: Participant,
    pub paid: Money,
    pub owed: Money,
    pub net: Money,
}

/// Everything one run produces for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub currency: Currency,
    pub balances: Vec<BalanceLine>,
    pub transactions: Vec<SettlementTransaction>,
}

/// Stateless pipeline runner; one instance can serve any number of groups.
#[derive(Debug, Clone, Default)]
pub struct SettlementEngine {
    config: EngineConfig,
}

impl SettlementEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Aggregate expenses after checking they are all in the engine currency.
    pub fn balances(&self, expenses: &[Expense]) -> Result<BalanceTable, EngineError> {
        let expected = self.config.currency;
        if let Some((index, found)) = expenses
            .iter()
            .map(|e| e.amount.currency())
            .enumerate()
            .find(|(_, c)| *c != expected)
        {
            return Err(EngineError::CurrencyMismatch {
                index,
                expected,
                found,
            });
        }
        Ok(aggregate(expenses)?)
    }

    /// Build the payment plan for a balance table and check it zeroes every net.
    pub fn settle(&self, balances: &BalanceTable) -> Result<Vec<SettlementTransaction>, EngineError> {
        let transactions = optimize_with(balances, self.config.matching)?;
        verify_plan(&balances.nets()?, &transactions)?;
        Ok(transactions)
    }

    /// Run the whole pipeline.
    pub fn run(&self, expenses: &[Expense]) -> Result<SettlementReport, EngineError> {
        let span = info_span!(
            "settle",
            currency = %self.config.currency,
            matching = %self.config.matching,
            expenses = expenses.len()
        );
        let _guard = span.enter();

        let result = self.run_inner(expenses);
        match &result {
            Ok(report) => info!(
                participants = report.balances.len(),
                transactions = report.transactions.len(),
                "settlement computed"
            ),
            Err(e) if e.is_fatal() => error!(error = %e, "settlement aborted on internal fault"),
            Err(e) => info!(error = %e, "settlement rejected input"),
        }
        result
    }

    fn run_inner(&self, expenses: &[Expense]) -> Result<SettlementReport, EngineError> {
        let table = self.balances(expenses)?;
        let transactions = self.settle(&table)?;
        let balances = table
            .iter()
            .map(|b| {
                Ok(BalanceLine {
                    participant: b.participant().clone(),
                    paid: b.paid(),
                    owed: b.owed(),
                    net: b.net()?,
                })
            })
            .collect::<Result<Vec<_>, SettleError>>()?;

        Ok(SettlementReport {
            currency: self.config.currency,
            balances,
            transactions,
        })
    }
}
