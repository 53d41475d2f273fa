//! Settlement Optimizer: greedy largest-debtor to largest-creditor matching.
//!
//! Members with a positive net are creditors, members with a negative net are
//! debtors (held as the positive amount they owe), and members at zero are
//! dropped. Both sides are ordered by amount descending, ties by participant
//! id ascending, so identical inputs always give identical plans. Each step
//! pays `min(creditor, debtor)` from the front debtor to the front creditor.
//!
//! The result is a heuristic: it typically needs `n - 1` payments for `n`
//! non-zero members, but it is not guaranteed to be the minimum number of
//! payments (finding that is NP-hard in general) and no attempt is made to
//! search for it.
//!
//! Given balanced input both sides drain together. Anything left over means an
//! upstream stage produced nets that do not sum to zero, reported as
//! [`SettleError::InvariantViolation`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use settleup_balances::BalanceTable;
use settleup_core::{Currency, Money, Participant, SettleError, SettleResult};

use crate::transaction::SettlementTransaction;

/// How a partially settled party is ordered for the next match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingStrategy {
    /// Sort once; the front creditor/debtor stays in front until it reaches
    /// zero.
    #[default]
    Sequential,
    /// Re-insert a partially settled party by its remaining amount before
    /// every match.
    Resorting,
}

impl core::str::FromStr for MatchingStrategy {
    type Err = SettleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "resorting" => Ok(Self::Resorting),
            other => Err(SettleError::validation(format!(
                "unknown matching strategy {other:?}"
            ))),
        }
    }
}

impl core::fmt::Display for MatchingStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            MatchingStrategy::Sequential => "sequential",
            MatchingStrategy::Resorting => "resorting",
        })
    }
}

/// One side of an open position, in minor units (always positive).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Position {
    participant: Participant,
    remaining: i64,
}

/// Larger remaining first, then smaller id first. `BinaryHeap` pops the
/// greatest element, so this order makes the heap top the next party to match.
impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.remaining
            .cmp(&other.remaining)
            .then_with(|| other.participant.cmp(&self.participant))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Settle a balance table with the default [`MatchingStrategy`].
pub fn optimize(balances: &BalanceTable) -> SettleResult<Vec<SettlementTransaction>> {
    optimize_with(balances, MatchingStrategy::default())
}

pub fn optimize_with(
    balances: &BalanceTable,
    strategy: MatchingStrategy,
) -> SettleResult<Vec<SettlementTransaction>> {
    optimize_nets(&balances.nets()?, strategy)
}

/// Settle raw net positions (positive = owed money, negative = owes money).
pub fn optimize_nets(
    nets: &BTreeMap<Participant, Money>,
    strategy: MatchingStrategy,
) -> SettleResult<Vec<SettlementTransaction>> {
    let Some(currency) = nets.values().next().map(Money::currency) else {
        return Ok(Vec::new());
    };
    let (creditors, debtors) = partition(nets, currency)?;

    let mut matcher = Matcher::new(currency);
    let (credit_left, debit_left) = match strategy {
        MatchingStrategy::Sequential => matcher.run_sequential(creditors, debtors)?,
        MatchingStrategy::Resorting => matcher.run_resorting(creditors, debtors)?,
    };

    if credit_left != 0 || debit_left != 0 {
        error!(
            credit_left = %credit_left,
            debit_left = %debit_left,
            emitted = matcher.transactions.len(),
            "settlement did not drain both sides"
        );
        return Err(SettleError::invariant(format!(
            "settlement left {credit_left} minor units of credit and {debit_left} of debt unmatched"
        )));
    }

    debug!(
        %strategy,
        transactions = matcher.transactions.len(),
        "settlement plan built"
    );
    Ok(matcher.transactions)
}

/// Split nets into sorted creditors and debtors, dropping zero positions.
fn partition(
    nets: &BTreeMap<Participant, Money>,
    currency: Currency,
) -> SettleResult<(Vec<Position>, Vec<Position>)> {
    let mut creditors = Vec::new();
    let mut debtors = Vec::new();
    for (participant, net) in nets {
        if net.currency() != currency {
            return Err(SettleError::validation(format!(
                "net for {participant} is in {}, expected {currency}",
                net.currency()
            )));
        }
        let position = Position {
            participant: participant.clone(),
            remaining: net.abs()?.minor(),
        };
        if net.is_positive() {
            creditors.push(position);
        } else if net.is_negative() {
            debtors.push(position);
        }
    }
    // Descending by amount, ascending by id.
    creditors.sort_by(|a, b| b.cmp(a));
    debtors.sort_by(|a, b| b.cmp(a));
    Ok((creditors, debtors))
}

struct Matcher {
    currency: Currency,
    transactions: Vec<SettlementTransaction>,
}

impl Matcher {
    fn new(currency: Currency) -> Self {
        Self {
            currency,
            transactions: Vec::new(),
        }
    }

    /// Pay the smaller of the two open amounts from debtor to creditor.
    fn settle(&mut self, creditor: &mut Position, debtor: &mut Position) -> SettleResult<()> {
        let settled = creditor.remaining.min(debtor.remaining);
        creditor.remaining -= settled;
        debtor.remaining -= settled;

        let tx = SettlementTransaction::new(
            debtor.participant.clone(),
            creditor.participant.clone(),
            Money::new(settled, self.currency),
        )
        .map_err(|e| SettleError::invariant(format!("emitted an invalid payment: {e}")))?;
        debug!(from = %tx.from(), to = %tx.to(), amount = %tx.amount(), "payment matched");
        self.transactions.push(tx);
        Ok(())
    }

    fn run_sequential(
        &mut self,
        mut creditors: Vec<Position>,
        mut debtors: Vec<Position>,
    ) -> SettleResult<(i128, i128)> {
        let (mut ci, mut di) = (0, 0);
        while ci < creditors.len() && di < debtors.len() {
            self.settle(&mut creditors[ci], &mut debtors[di])?;
            if creditors[ci].remaining == 0 {
                ci += 1;
            }
            if debtors[di].remaining == 0 {
                di += 1;
            }
        }
        Ok((open_total(&creditors[ci..]), open_total(&debtors[di..])))
    }

    fn run_resorting(
        &mut self,
        creditors: Vec<Position>,
        debtors: Vec<Position>,
    ) -> SettleResult<(i128, i128)> {
        let mut creditors = BinaryHeap::from(creditors);
        let mut debtors = BinaryHeap::from(debtors);
        while let Some(mut creditor) = creditors.pop() {
            let Some(mut debtor) = debtors.pop() else {
                creditors.push(creditor);
                break;
            };
            self.settle(&mut creditor, &mut debtor)?;
            if creditor.remaining > 0 {
                creditors.push(creditor);
            }
            if debtor.remaining > 0 {
                debtors.push(debtor);
            }
        }
        Ok((
            open_total(&creditors.into_vec()),
            open_total(&debtors.into_vec()),
        ))
    }
}

fn open_total(positions: &[Position]) -> i128 {
    positions.iter().map(|p| i128::from(p.remaining)).sum()
}
