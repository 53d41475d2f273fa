use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use settleup_core::{Currency, Money, Participant, SettleError, SettleResult};

/// What one member has paid and owes across a set of expenses.
///
/// The net position is always derived from `paid - owed`, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BalanceRecord")]
pub struct Balance {
    participant: Participant,
    paid: Money,
    owed: Money,
}

impl Balance {
    /// # Panics
    ///
    /// Panics if `paid` and `owed` are in different currencies.
    pub fn new(participant: Participant, paid: Money, owed: Money) -> Self {
        assert!(
            paid.currency() == owed.currency(),
            "balance for {participant} mixes {} and {}",
            paid.currency(),
            owed.currency()
        );
        Self {
            participant,
            paid,
            owed,
        }
    }

    /// Like [`Balance::new`], but reports mixed currencies as
    /// [`SettleError::Validation`].
    pub fn try_new(participant: Participant, paid: Money, owed: Money) -> SettleResult<Self> {
        if paid.currency() != owed.currency() {
            return Err(SettleError::validation(format!(
                "balance for {participant} mixes {} and {}",
                paid.currency(),
                owed.currency()
            )));
        }
        Ok(Self {
            participant,
            paid,
            owed,
        })
    }

    /// Zero paid, zero owed.
    pub fn empty(participant: Participant, currency: Currency) -> Self {
        Self::new(participant, Money::zero(currency), Money::zero(currency))
    }

    /// A balance whose only content is a net position (positive means owed
    /// money, negative means owing).
    pub fn from_net(participant: Participant, net: Money) -> SettleResult<Self> {
        let zero = Money::zero(net.currency());
        if net.is_negative() {
            Ok(Self::new(participant, zero, net.negate()?))
        } else {
            Ok(Self::new(participant, net, zero))
        }
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn paid(&self) -> Money {
        self.paid
    }

    pub fn owed(&self) -> Money {
        self.owed
    }

    pub fn currency(&self) -> Currency {
        self.paid.currency()
    }

    /// `paid - owed`: positive when the group owes this member.
    pub fn net(&self) -> SettleResult<Money> {
        self.paid.subtract(self.owed)
    }

    pub(crate) fn with_paid(self, amount: Money) -> SettleResult<Self> {
        Ok(Self {
            paid: self.paid.add(amount)?,
            ..self
        })
    }

    pub(crate) fn with_owed(self, amount: Money) -> SettleResult<Self> {
        Ok(Self {
            owed: self.owed.add(amount)?,
            ..self
        })
    }
}

/// Wire shape of a [`Balance`], checked on the way in.
#[derive(Deserialize)]
struct BalanceRecord {
    participant: Participant,
    paid: Money,
    owed: Money,
}

impl TryFrom<BalanceRecord> for Balance {
    type Error = SettleError;

    fn try_from(record: BalanceRecord) -> SettleResult<Self> {
        Self::try_new(record.participant, record.paid, record.owed)
    }
}

/// Balances keyed by participant, iterated in ascending id order.
///
/// Invariant: every balance is filed under its own participant and all
/// balances share one currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BalanceTable {
    balances: BTreeMap<Participant, Balance>,
}

impl BalanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, participant: &Participant) -> Option<&Balance> {
        self.balances.get(participant)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Balance> + '_ {
        self.balances.values()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Currency of the table, `None` while it is empty.
    pub fn currency(&self) -> Option<Currency> {
        self.balances.values().next().map(Balance::currency)
    }

    /// Net position per participant.
    pub fn nets(&self) -> SettleResult<BTreeMap<Participant, Money>> {
        self.balances
            .iter()
            .map(|(p, b)| Ok((p.clone(), b.net()?)))
            .collect()
    }

    /// True when the nets sum to exactly zero (an empty table is balanced).
    pub fn is_balanced(&self) -> SettleResult<bool> {
        let Some(currency) = self.currency() else {
            return Ok(true);
        };
        let total = Money::sum(currency, self.nets()?.into_values())?;
        Ok(total.is_zero())
    }

    pub(crate) fn entry(&self, participant: &Participant, currency: Currency) -> Balance {
        self.balances
            .get(participant)
            .cloned()
            .unwrap_or_else(|| Balance::empty(participant.clone(), currency))
    }

    pub(crate) fn put(&mut self, balance: Balance) {
        self.balances.insert(balance.participant.clone(), balance);
    }
}

impl TryFrom<BTreeMap<Participant, Balance>> for BalanceTable {
    type Error = SettleError;

    fn try_from(balances: BTreeMap<Participant, Balance>) -> SettleResult<Self> {
        let Some(currency) = balances.values().next().map(Balance::currency) else {
            return Ok(Self { balances });
        };
        for (key, balance) in &balances {
            if key != balance.participant() {
                return Err(SettleError::validation(format!(
                    "balance for {} is filed under {key}",
                    balance.participant()
                )));
            }
            if balance.currency() != currency {
                return Err(SettleError::validation(format!(
                    "balance for {key} is in {}, table is in {currency}",
                    balance.currency()
                )));
            }
        }
        Ok(Self { balances })
    }
}

impl<'de> Deserialize<'de> for BalanceTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let balances = BTreeMap::<Participant, Balance>::deserialize(deserializer)?;
        Self::try_from(balances).map_err(serde::de::Error::custom)
    }
}

impl FromIterator<Balance> for BalanceTable {
    fn from_iter<I: IntoIterator<Item = Balance>>(iter: I) -> Self {
        let mut table = Self::new();
        for balance in iter {
            table.put(balance);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: &str) -> Participant {
        Participant::new(id).unwrap()
    }

    fn php(minor: i64) -> Money {
        Money::new(minor, Currency::PHP)
    }

    #[test]
    fn net_is_paid_minus_owed() {
        let b = Balance::new(p("a"), php(30_000), php(10_000));
        assert_eq!(b.net().unwrap(), php(20_000));
    }

    #[test]
    fn from_net_splits_sign_into_sides() {
        let debtor = Balance::from_net(p("c"), php(-12_000)).unwrap();
        assert_eq!(debtor.paid(), php(0));
        assert_eq!(debtor.owed(), php(12_000));
        assert_eq!(debtor.net().unwrap(), php(-12_000));

        let creditor = Balance::from_net(p("a"), php(15_000)).unwrap();
        assert_eq!(creditor.paid(), php(15_000));
    }

    #[test]
    #[should_panic(expected = "mixes")]
    fn mixed_currency_balance_panics() {
        let _ = Balance::new(p("a"), php(1), Money::new(1, Currency::USD));
    }

    #[test]
    fn try_new_reports_mixed_currencies() {
        assert!(matches!(
            Balance::try_new(p("a"), php(1), Money::new(1, Currency::USD)),
            Err(SettleError::Validation(_))
        ));
        assert_eq!(
            Balance::try_new(p("a"), php(3), php(1)).unwrap(),
            Balance::new(p("a"), php(3), php(1))
        );
    }

    #[test]
    fn deserialized_balance_must_be_single_currency() {
        let json = r#"{
            "a": {
                "participant": "a",
                "paid": { "minor": 500, "currency": "PHP" },
                "owed": { "minor": 100, "currency": "USD" }
            }
        }"#;
        let err = serde_json::from_str::<BalanceTable>(json).unwrap_err();
        assert!(err.to_string().contains("mixes PHP and USD"));
    }

    #[test]
    fn deserialized_table_keys_must_match_participants() {
        let json = r#"{
            "a": {
                "participant": "b",
                "paid": { "minor": 0, "currency": "PHP" },
                "owed": { "minor": 0, "currency": "PHP" }
            }
        }"#;
        let err = serde_json::from_str::<BalanceTable>(json).unwrap_err();
        assert!(err.to_string().contains("filed under a"));
    }

    #[test]
    fn deserialized_table_must_share_one_currency() {
        let json = r#"{
            "a": {
                "participant": "a",
                "paid": { "minor": 100, "currency": "PHP" },
                "owed": { "minor": 0, "currency": "PHP" }
            },
            "b": {
                "participant": "b",
                "paid": { "minor": 0, "currency": "USD" },
                "owed": { "minor": 100, "currency": "USD" }
            }
        }"#;
        assert!(serde_json::from_str::<BalanceTable>(json).is_err());
    }

    #[test]
    fn table_survives_a_json_round_trip() {
        let table: BalanceTable = [
            Balance::new(p("a"), php(30_000), php(10_000)),
            Balance::new(p("b"), php(0), php(20_000)),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(serde_json::from_str::<BalanceTable>(&json).unwrap(), table);
    }

    #[test]
    fn table_balance_check() {
        let table: BalanceTable = [
            Balance::from_net(p("a"), php(100)).unwrap(),
            Balance::from_net(p("b"), php(-100)).unwrap(),
        ]
        .into_iter()
        .collect();
        assert!(table.is_balanced().unwrap());
        assert_eq!(table.currency(), Some(Currency::PHP));

        let lopsided: BalanceTable = [Balance::from_net(p("a"), php(5)).unwrap()]
            .into_iter()
            .collect();
        assert!(!lopsided.is_balanced().unwrap());
        assert!(BalanceTable::new().is_balanced().unwrap());
    }
}
