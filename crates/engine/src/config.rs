//! Engine configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

use settleup_core::Currency;
use settleup_settlement::MatchingStrategy;

/// Environment variable naming the group currency (ISO code).
pub const CURRENCY_ENV: &str = "SETTLEUP_CURRENCY";
/// Environment variable selecting the matching strategy.
pub const MATCHING_ENV: &str = "SETTLEUP_MATCHING";

/// Settings for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Currency every expense of a run must be in.
    pub currency: Currency,
    /// How partially settled parties are re-ordered.
    pub matching: MatchingStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: Currency::PHP,
            matching: MatchingStrategy::Sequential,
        }
    }
}

impl EngineConfig {
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_matching(mut self, matching: MatchingStrategy) -> Self {
        self.matching = matching;
        self
    }

    /// Read settings from the process environment, keeping defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(CURRENCY_ENV) {
            match raw.parse::<Currency>() {
                Ok(currency) => config.currency = currency,
                Err(e) => warn!(
                    value = %raw,
                    error = %e,
                    "{CURRENCY_ENV} is invalid; using {}",
                    config.currency
                ),
            }
        }

        if let Some(raw) = lookup(MATCHING_ENV) {
            match raw.parse::<MatchingStrategy>() {
                Ok(matching) => config.matching = matching,
                Err(e) => warn!(
                    value = %raw,
                    error = %e,
                    "{MATCHING_ENV} is invalid; using {}",
                    config.matching
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(EngineConfig::from_lookup(|_| None), EngineConfig::default());
    }

    #[test]
    fn reads_currency_and_strategy() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (CURRENCY_ENV, "usd"),
            (MATCHING_ENV, "resorting"),
        ]));
        assert_eq!(config.currency, Currency::USD);
        assert_eq!(config.matching, MatchingStrategy::Resorting);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (CURRENCY_ENV, "pesos"),
            (MATCHING_ENV, "optimal"),
        ]));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::default()
            .with_currency(Currency::JPY)
            .with_matching(MatchingStrategy::Resorting);
        assert_eq!(config.currency, Currency::JPY);
        assert_eq!(config.matching, MatchingStrategy::Resorting);
    }
}
