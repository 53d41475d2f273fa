//! Applying a settlement plan back onto net balances.

use std::collections::BTreeMap;

use settleup_core::{Money, Participant, SettleError, SettleResult};

use crate::transaction::SettlementTransaction;

/// Nets left after every payment in `transactions` is made.
///
/// A payment raises the payer's net by its amount and lowers the payee's by
/// the same amount. Members that only appear in the plan start from zero.
pub fn residual_balances(
    nets: &BTreeMap<Participant, Money>,
    transactions: &[SettlementTransaction],
) -> SettleResult<BTreeMap<Participant, Money>> {
    let mut residual = nets.clone();
    for tx in transactions {
        let zero = Money::zero(tx.amount().currency());
        let payer = residual.entry(tx.from().clone()).or_insert(zero);
        *payer = payer.add(tx.amount())?;
        let payee = residual.entry(tx.to().clone()).or_insert(zero);
        *payee = payee.subtract(tx.amount())?;
    }
    Ok(residual)
}

/// Check that a plan brings every net to exactly zero.
pub fn verify_plan(
    nets: &BTreeMap<Participant, Money>,
    transactions: &[SettlementTransaction],
) -> SettleResult<()> {
    let residual = residual_balances(nets, transactions)?;
    match residual.iter().find(|(_, net)| !net.is_zero()) {
        Some((who, net)) => Err(SettleError::invariant(format!(
            "plan leaves {who} at {net}"
        ))),
        None => Ok(()),
    }
}
