use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Callsigns offered to a trainee on the start screen.
pub const SUGGESTED_CALLSIGNS: [&str; 10] = [
    "Haukka", "Karhu", "Susi", "Ilves", "Salama", "Myrsky", "Kallio", "Varjo", "Kaiku", "Halla",
];

const MAX_CALLSIGN_CHARS: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CallsignError {
    #[error("callsign cannot be empty")]
    Empty,

    #[error("callsign is too long ({len} chars, max {MAX_CALLSIGN_CHARS})")]
    TooLong { len: usize },
}

/// Radio codename a trainee uses instead of their real name.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Callsign(String);

impl Callsign {
    /// # Errors
    ///
    /// Returns `CallsignError` if the trimmed value is blank or too long.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CallsignError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CallsignError::Empty);
        }
        let len = trimmed.chars().count();
        if len > MAX_CALLSIGN_CHARS {
            return Err(CallsignError::TooLong { len });
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The built-in suggestions as validated callsigns.
    #[must_use]
    pub fn suggestions() -> Vec<Callsign> {
        SUGGESTED_CALLSIGNS
            .iter()
            .map(|s| Callsign((*s).to_owned()))
            .collect()
    }
}

impl TryFrom<String> for Callsign {
    type Error = CallsignError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Callsign> for String {
    fn from(value: Callsign) -> Self {
        value.0
    }
}

impl fmt::Debug for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callsign({})", self.0)
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
