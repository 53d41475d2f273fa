use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use settleup_core::{Money, Participant};

/// How an expense's amount is divided among its participants.
///
/// For the map-carrying policies, participants of the expense that are absent
/// from the map owe nothing; naming someone outside the participant set is an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "split", rename_all = "lowercase")]
pub enum SplitPolicy {
    /// Everyone owes the same amount (remainder spread in id order).
    Equal,
    /// Percent of the total per participant; must sum to 100 within tolerance.
    /// Each value may carry at most six decimal places.
    Percentage(BTreeMap<Participant, Decimal>),
    /// Positive integer weights, normalized by their sum.
    Shares(BTreeMap<Participant, u32>),
    /// Exact amounts that must add up to the total.
    Exact(BTreeMap<Participant, Money>),
}

impl SplitPolicy {
    /// Short name, as used on the wire and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SplitPolicy::Equal => "equal",
            SplitPolicy::Percentage(_) => "percentage",
            SplitPolicy::Shares(_) => "shares",
            SplitPolicy::Exact(_) => "exact",
        }
    }
}

/// One recorded expense, supplied by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub amount: Money,
    pub payer: Participant,
    pub policy: SplitPolicy,
    pub participants: BTreeSet<Participant>,
}

impl Expense {
    pub fn new(
        amount: Money,
        payer: Participant,
        policy: SplitPolicy,
        participants: impl IntoIterator<Item = Participant>,
    ) -> Self {
        Self {
            amount,
            payer,
            policy,
            participants: participants.into_iter().collect(),
        }
    }

    /// Shorthand for an equally split expense.
    pub fn equal(
        amount: Money,
        payer: Participant,
        participants: impl IntoIterator<Item = Participant>,
    ) -> Self {
        Self::new(amount, payer, SplitPolicy::Equal, participants)
    }
}
