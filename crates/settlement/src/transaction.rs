use serde::{Deserialize, Serialize};

use settleup_core::{Money, Participant, SettleError, SettleResult};

/// One suggested payment: `from` pays `to` the given amount.
///
/// Invariant: `amount > 0` and `from != to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TransactionRecord")]
pub struct SettlementTransaction {
    from: Participant,
    to: Participant,
    amount: Money,
}

impl SettlementTransaction {
    pub fn new(from: Participant, to: Participant, amount: Money) -> SettleResult<Self> {
        if !amount.is_positive() {
            return Err(SettleError::invalid_amount(format!(
                "settlement amount must be positive, got {amount}"
            )));
        }
        if from == to {
            return Err(SettleError::validation(format!(
                "{from} cannot settle with themselves"
            )));
        }
        Ok(Self { from, to, amount })
    }

    pub fn from(&self) -> &Participant {
        &self.from
    }

    pub fn to(&self) -> &Participant {
        &self.to
    }

    pub fn amount(&self) -> Money {
        self.amount
    }
}

#[derive(Deserialize)]
struct TransactionRecord {
    from: Participant,
    to: Participant,
    amount: Money,
}

impl TryFrom<TransactionRecord> for SettlementTransaction {
    type Error = SettleError;

    fn try_from(record: TransactionRecord) -> SettleResult<Self> {
        Self::new(record.from, record.to, record.amount)
    }
}

impl core::fmt::Display for SettlementTransaction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} pays {} {}", self.from, self.to, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settleup_core::Currency;

    fn p(id: &str) -> Participant {
        Participant::new(id).unwrap()
    }

    #[test]
    fn rejects_degenerate_payments() {
        let zero = Money::zero(Currency::PHP);
        assert!(matches!(
            SettlementTransaction::new(p("a"), p("b"), zero),
            Err(SettleError::InvalidAmount(_))
        ));
        let ten = Money::new(1_000, Currency::PHP);
        assert!(matches!(
            SettlementTransaction::new(p("a"), p("a"), ten),
            Err(SettleError::Validation(_))
        ));
    }

    #[test]
    fn deserialization_enforces_the_invariant() {
        let self_payment = r#"{"from":"a","to":"a","amount":{"minor":500,"currency":"PHP"}}"#;
        assert!(serde_json::from_str::<SettlementTransaction>(self_payment).is_err());

        let negative = r#"{"from":"a","to":"b","amount":{"minor":-5,"currency":"PHP"}}"#;
        let err = serde_json::from_str::<SettlementTransaction>(negative).unwrap_err();
        assert!(err.to_string().contains("must be positive"));

        let valid = r#"{"from":"a","to":"b","amount":{"minor":500,"currency":"PHP"}}"#;
        let tx: SettlementTransaction = serde_json::from_str(valid).unwrap();
        assert_eq!(tx.to_string(), "a pays b 5.00 PHP");
    }

    #[test]
    fn displays_as_sentence() {
        let tx = SettlementTransaction::new(p("B"), p("A"), Money::new(10_000, Currency::PHP)).unwrap();
        assert_eq!(tx.to_string(), "B pays A 100.00 PHP");
    }
}
