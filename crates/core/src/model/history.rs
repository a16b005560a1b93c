use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::callsign::Callsign;

/// Minimum score ratio, in percent, for a session to count as passed.
pub const PASS_THRESHOLD_PERCENT: u32 = 70;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("history record user cannot be empty")]
    EmptyUser,

    #[error("passed flag ({passed}) contradicts score {score}/{total}")]
    PassedMismatch { score: u32, total: u32, passed: bool },
}

/// True when `score / total >= 0.70`.
///
/// Integer arithmetic keeps the boundary exact (7/10 passes). An empty session
/// never passes.
#[must_use]
pub fn is_passing(score: u32, total: u32) -> bool {
    if total == 0 {
        return false;
    }
    u64::from(score) * 100 >= u64::from(total) * u64::from(PASS_THRESHOLD_PERCENT)
}

/// Rounded score percentage; 0 for an empty session.
#[must_use]
pub fn score_percent(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = (u64::from(score) * 100 + u64::from(total) / 2) / u64::from(total);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Immutable record of one completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHistoryRecord {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub callsign: String,
    pub score: u32,
    pub total: u32,
    pub passed: bool,
}

impl GameHistoryRecord {
    /// Build the record for a session that just finished.
    ///
    /// `passed` is derived from the session's actual total.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the score exceeds the total or the user is blank.
    pub fn completed(
        user: impl Into<String>,
        callsign: &Callsign,
        score: u32,
        total: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, HistoryError> {
        let record = Self {
            id: Uuid::new_v4().to_string(),
            timestamp: completed_at,
            user: user.into(),
            callsign: callsign.as_str().to_owned(),
            score,
            total,
            passed: is_passing(score, total),
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the invariants of a persisted or imported record.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the record is inconsistent.
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.user.trim().is_empty() {
            return Err(HistoryError::EmptyUser);
        }
        if self.score > self.total {
            return Err(HistoryError::ScoreExceedsTotal {
                score: self.score,
                total: self.total,
            });
        }
        if self.passed != is_passing(self.score, self.total) {
            return Err(HistoryError::PassedMismatch {
                score: self.score,
                total: self.total,
                passed: self.passed,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn percent(&self) -> u32 {
        score_percent(self.score, self.total)
    }
}
