//! Split Calculator: one expense in, one exact per-member breakdown out.
//!
//! Every policy ends in the same post-condition: the shares add up to the
//! expense amount to the minor unit. Rounding residue left by integer or
//! ratio division is spread one minor unit at a time over the eligible
//! participants in ascending id order.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::debug;

use settleup_core::{Money, Participant, SettleError, SettleResult};

use crate::expense::{Expense, SplitPolicy};

/// Allowed distance of a percentage total from 100 (percentage points).
pub const PERCENTAGE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Most fractional digits a percentage may carry.
pub const PERCENTAGE_DECIMALS: u32 = 6;

/// Fixed-point scale used to turn percentages into integer ratios.
const PERCENT_SCALE: i64 = 10_i64.pow(PERCENTAGE_DECIMALS);

/// Per-participant amounts owed for one expense.
///
/// Invariant: the shares sum exactly to `total` and none is negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitResult {
    total: Money,
    shares: BTreeMap<Participant, Money>,
}

impl SplitResult {
    fn new(total: Money, shares: BTreeMap<Participant, Money>) -> SettleResult<Self> {
        if let Some((who, share)) = shares.iter().find(|(_, m)| m.is_negative()) {
            return Err(SettleError::invalid_amount(format!(
                "share for {who} would be negative ({share})"
            )));
        }
        let sum = Money::sum(total.currency(), shares.values().copied())?;
        if sum != total {
            return Err(SettleError::invariant(format!(
                "split shares sum to {sum}, expected {total}"
            )));
        }
        Ok(Self { total, shares })
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn get(&self, participant: &Participant) -> Option<Money> {
        self.shares.get(participant).copied()
    }

    /// Shares in ascending participant order.
    pub fn iter(&self) -> impl Iterator<Item = (&Participant, Money)> + '_ {
        self.shares.iter().map(|(p, m)| (p, *m))
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn into_shares(self) -> BTreeMap<Participant, Money> {
        self.shares
    }
}

/// Split one expense according to its policy.
pub fn compute_split(expense: &Expense) -> SettleResult<SplitResult> {
    if expense.participants.is_empty() {
        return Err(SettleError::NoParticipants);
    }
    if !expense.amount.is_positive() {
        return Err(SettleError::invalid_amount(format!(
            "expense amount must be positive, got {}",
            expense.amount
        )));
    }

    let shares = match &expense.policy {
        SplitPolicy::Equal => split_equal(expense.amount, &expense.participants)?,
        SplitPolicy::Percentage(percentages) => {
            split_percentage(expense.amount, &expense.participants, percentages)?
        }
        SplitPolicy::Shares(weights) => {
            split_shares(expense.amount, &expense.participants, weights)?
        }
        SplitPolicy::Exact(amounts) => split_exact(expense.amount, &expense.participants, amounts)?,
    };

    let result = SplitResult::new(expense.amount, shares)?;
    debug!(
        payer = %expense.payer,
        policy = expense.policy.kind(),
        amount = %expense.amount,
        participants = result.len(),
        "expense split"
    );
    Ok(result)
}

fn split_equal(
    amount: Money,
    participants: &BTreeSet<Participant>,
) -> SettleResult<BTreeMap<Participant, Money>> {
    let count = i64::try_from(participants.len()).map_err(|_| SettleError::Overflow)?;
    let base = Money::new(amount.minor() / count, amount.currency());
    let mut shares: BTreeMap<Participant, Money> =
        participants.iter().map(|p| (p.clone(), base)).collect();
    let eligible: Vec<Participant> = participants.iter().cloned().collect();
    absorb_residue(amount, &mut shares, &eligible)?;
    Ok(shares)
}

fn split_percentage(
    amount: Money,
    participants: &BTreeSet<Participant>,
    percentages: &BTreeMap<Participant, Decimal>,
) -> SettleResult<BTreeMap<Participant, Money>> {
    ensure_known(participants, percentages.keys())?;

    let total = percentages
        .values()
        .try_fold(Decimal::ZERO, |acc, pct| acc.checked_add(*pct));
    let negative = percentages
        .values()
        .any(|pct| pct.is_sign_negative() && !pct.is_zero());
    let total = match total {
        Some(total) if !negative => total,
        // An overflowing sum is reported at the largest representable total.
        total => {
            return Err(SettleError::InvalidPercentages {
                total: total.unwrap_or(Decimal::MAX),
            });
        }
    };
    if (total - Decimal::ONE_HUNDRED).abs() > PERCENTAGE_TOLERANCE {
        return Err(SettleError::InvalidPercentages { total });
    }

    let scale = Decimal::from(PERCENT_SCALE);
    let mut weights = BTreeMap::new();
    for (participant, pct) in percentages {
        if pct.normalize().scale() > PERCENTAGE_DECIMALS {
            return Err(SettleError::validation(format!(
                "percentage {pct} for {participant} has more than {PERCENTAGE_DECIMALS} decimal places"
            )));
        }
        let scaled = pct
            .checked_mul(scale)
            .and_then(|d| d.to_i64())
            .ok_or(SettleError::Overflow)?;
        weights.insert(participant.clone(), scaled);
    }
    split_by_weight(amount, participants, &weights, 100 * PERCENT_SCALE)
}

fn split_shares(
    amount: Money,
    participants: &BTreeSet<Participant>,
    weights: &BTreeMap<Participant, u32>,
) -> SettleResult<BTreeMap<Participant, Money>> {
    ensure_known(participants, weights.keys())?;

    if let Some((who, _)) = weights.iter().find(|(_, w)| **w == 0) {
        return Err(SettleError::invalid_amount(format!(
            "share weight for {who} must be positive"
        )));
    }
    let total_weight: i64 = weights.values().map(|w| i64::from(*w)).sum();
    if total_weight == 0 {
        return Err(SettleError::DivisionByZero);
    }

    let weights = weights
        .iter()
        .map(|(p, w)| (p.clone(), i64::from(*w)))
        .collect();
    split_by_weight(amount, participants, &weights, total_weight)
}

fn split_exact(
    amount: Money,
    participants: &BTreeSet<Participant>,
    amounts: &BTreeMap<Participant, Money>,
) -> SettleResult<BTreeMap<Participant, Money>> {
    ensure_known(participants, amounts.keys())?;

    for (who, share) in amounts {
        if share.currency() != amount.currency() {
            return Err(SettleError::validation(format!(
                "exact share for {who} is in {}, expense is in {}",
                share.currency(),
                amount.currency()
            )));
        }
        if share.is_negative() {
            return Err(SettleError::invalid_amount(format!(
                "exact share for {who} is negative ({share})"
            )));
        }
    }

    let actual = Money::sum(amount.currency(), amounts.values().copied())?;
    if actual != amount {
        return Err(SettleError::SplitMismatch {
            expected: amount,
            actual,
        });
    }

    Ok(participants
        .iter()
        .map(|p| {
            let share = amounts
                .get(p)
                .copied()
                .unwrap_or_else(|| Money::zero(amount.currency()));
            (p.clone(), share)
        })
        .collect())
}

/// Ratio split shared by the percentage and shares policies. Participants
/// with a zero weight get zero and never receive residue.
fn split_by_weight(
    amount: Money,
    participants: &BTreeSet<Participant>,
    weights: &BTreeMap<Participant, i64>,
    denominator: i64,
) -> SettleResult<BTreeMap<Participant, Money>> {
    let mut shares = BTreeMap::new();
    let mut eligible = Vec::new();
    for participant in participants {
        let weight = weights.get(participant).copied().unwrap_or(0);
        let share = amount.multiply_by_ratio(weight, denominator)?;
        if weight > 0 {
            eligible.push(participant.clone());
        }
        shares.insert(participant.clone(), share);
    }
    absorb_residue(amount, &mut shares, &eligible)?;
    Ok(shares)
}

/// Spread `amount - sum(shares)` over `eligible`, one minor unit per
/// participant per pass in the given order. A negative residue is taken back
/// the same way without pushing any share below zero.
fn absorb_residue(
    amount: Money,
    shares: &mut BTreeMap<Participant, Money>,
    eligible: &[Participant],
) -> SettleResult<()> {
    let allocated = Money::sum(amount.currency(), shares.values().copied())?;
    let mut residue = amount.subtract(allocated)?.minor();
    if residue == 0 {
        return Ok(());
    }

    while residue != 0 {
        let holders: Vec<&Participant> = eligible
            .iter()
            .filter(|p| residue > 0 || shares.get(*p).is_some_and(Money::is_positive))
            .collect();
        if holders.is_empty() {
            return Err(SettleError::invariant(format!(
                "no participant can absorb a residue of {residue} minor units"
            )));
        }

        let count = i64::try_from(holders.len()).map_err(|_| SettleError::Overflow)?;
        let magnitude = residue.abs();
        let (each, extra) = (magnitude / count, magnitude % count);
        for (i, participant) in (0i64..).zip(holders) {
            let Some(share) = shares.get_mut(participant) else {
                continue;
            };
            let wanted = each + i64::from(i < extra);
            let step = if residue > 0 {
                wanted
            } else {
                -wanted.min(share.minor())
            };
            *share = share.add(Money::new(step, amount.currency()))?;
            residue -= step;
        }
    }
    Ok(())
}

fn ensure_known<'a>(
    participants: &BTreeSet<Participant>,
    named: impl IntoIterator<Item = &'a Participant>,
) -> SettleResult<()> {
    match named.into_iter().find(|p| !participants.contains(*p)) {
        Some(stranger) => Err(SettleError::UnknownParticipant(stranger.clone())),
        None => Ok(()),
    }
}
