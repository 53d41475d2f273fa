//! Group member identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{SettleError, SettleResult};

/// Opaque identifier of a group member.
///
/// Identity is the identifier string alone; ordering is lexicographic on it,
/// which is what every deterministic tie-break in the pipeline relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Participant(String);

impl Participant {
    /// Create a participant id. Empty ids and ids with leading or trailing
    /// whitespace are rejected, never rewritten.
    pub fn new(id: impl Into<String>) -> SettleResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SettleError::validation("participant id must not be empty"));
        }
        if id.trim() != id {
            return Err(SettleError::validation(format!(
                "participant id {id:?} has surrounding whitespace"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Participant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Participant {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Participant {
    type Err = SettleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Participant {
    type Error = SettleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Participant> for String {
    fn from(value: Participant) -> Self {
        value.0
    }
}
