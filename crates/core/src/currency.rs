//! Currency codes and minor-unit precision.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{SettleError, SettleResult};

/// Largest supported number of minor-unit digits (keeps `10^exponent` in `i64`).
pub const MAX_EXPONENT: u8 = 9;

/// Three-letter currency code plus the number of minor-unit digits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency {
    code: [u8; 3],
    exponent: u8,
}

/// Codes whose minor unit is the major unit.
const ZERO_DECIMAL_CODES: &[&str] = &["JPY", "KRW", "VND", "CLP", "ISK", "UGX"];

impl Currency {
    pub const PHP: Currency = Currency { code: *b"PHP", exponent: 2 };
    pub const USD: Currency = Currency { code: *b"USD", exponent: 2 };
    pub const EUR: Currency = Currency { code: *b"EUR", exponent: 2 };
    pub const JPY: Currency = Currency { code: *b"JPY", exponent: 0 };

    /// Build a currency with an explicit minor-unit exponent.
    pub fn new(code: &str, exponent: u8) -> SettleResult<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(SettleError::validation(format!(
                "currency code must be three uppercase letters, got {code:?}"
            )));
        }
        if exponent > MAX_EXPONENT {
            return Err(SettleError::validation(format!(
                "currency exponent {exponent} exceeds {MAX_EXPONENT}"
            )));
        }
        Ok(Self {
            code: [bytes[0], bytes[1], bytes[2]],
            exponent,
        })
    }

    /// Resolve a code using the usual minor-unit digits (2 unless the code is
    /// a known zero-decimal currency).
    pub fn from_code(code: &str) -> SettleResult<Self> {
        let normalized = code.trim().to_ascii_uppercase();
        let exponent = if ZERO_DECIMAL_CODES.contains(&normalized.as_str()) {
            0
        } else {
            2
        };
        Self::new(&normalized, exponent)
    }

    pub fn code(&self) -> &str {
        // Only ASCII letters are ever stored.
        core::str::from_utf8(&self.code).unwrap_or("???")
    }

    pub fn exponent(&self) -> u8 {
        self.exponent
    }

    /// Minor units per major unit (`10^exponent`).
    pub fn minor_per_major(&self) -> i64 {
        10i64.pow(u32::from(self.exponent))
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = SettleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = SettleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_code(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}
