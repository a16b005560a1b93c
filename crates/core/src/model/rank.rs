use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::RankId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RankLadderError {
    #[error("rank ladder cannot be empty")]
    Empty,

    #[error("lowest rank {id} must require 0 passed sessions, found {min_passed}")]
    LowestNotZero { id: RankId, min_passed: u32 },

    #[error("rank {id} must require more passed sessions than the rank before it")]
    NotIncreasing { id: RankId },

    #[error("duplicate rank id: {0}")]
    DuplicateId(RankId),
}

//
// ─── RANK ──────────────────────────────────────────────────────────────────────
//

/// A progression tier unlocked by a minimum number of passed sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rank {
    pub id: RankId,
    pub title: String,
    pub min_passed: u32,
    #[serde(rename = "icon", default)]
    pub icon_ref: String,
}

impl Rank {
    #[must_use]
    pub fn new(id: impl Into<RankId>, title: impl Into<String>, min_passed: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            min_passed,
            icon_ref: String::new(),
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon_ref: impl Into<String>) -> Self {
        self.icon_ref = icon_ref.into();
        self
    }
}

//
// ─── LADDER ────────────────────────────────────────────────────────────────────
//

/// Ordered, validated list of ranks.
///
/// Invariants: non-empty, the first rank requires 0 passes, `min_passed` is
/// strictly increasing and ids are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankLadder {
    ranks: Vec<Rank>,
}

impl RankLadder {
    /// Validate and build a ladder from ranks in progression order.
    ///
    /// # Errors
    ///
    /// Returns `RankLadderError` if any ladder invariant is violated.
    pub fn new(ranks: Vec<Rank>) -> Result<Self, RankLadderError> {
        let first = ranks.first().ok_or(RankLadderError::Empty)?;
        if first.min_passed != 0 {
            return Err(RankLadderError::LowestNotZero {
                id: first.id.clone(),
                min_passed: first.min_passed,
            });
        }

        let mut seen = HashSet::new();
        for rank in &ranks {
            if !seen.insert(rank.id.clone()) {
                return Err(RankLadderError::DuplicateId(rank.id.clone()));
            }
        }

        for pair in ranks.windows(2) {
            if pair[1].min_passed <= pair[0].min_passed {
                return Err(RankLadderError::NotIncreasing {
                    id: pair[1].id.clone(),
                });
            }
        }

        Ok(Self { ranks })
    }

    /// The four-tier ladder the trainer ships with.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            ranks: vec![
                Rank::new("R0", "KOKELAS", 0).with_icon("User"),
                Rank::new("R1", "VIESTITTÄJÄ", 1).with_icon("Radio"),
                Rank::new("R2", "TARKKAILIJA", 2).with_icon("Bird"),
                Rank::new("R3", "OPERAATTORI", 3).with_icon("Zap"),
            ],
        }
    }

    #[must_use]
    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    #[must_use]
    pub fn lowest(&self) -> &Rank {
        &self.ranks[0]
    }

    #[must_use]
    pub fn get(&self, id: &RankId) -> Option<&Rank> {
        self.ranks.iter().find(|r| &r.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &RankId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn position(&self, id: &RankId) -> Option<usize> {
        self.ranks.iter().position(|r| &r.id == id)
    }

    /// Highest rank whose threshold is met by `passed`.
    #[must_use]
    pub fn current_for(&self, passed: u32) -> &Rank {
        self.ranks
            .iter()
            .rev()
            .find(|r| r.min_passed <= passed)
            .unwrap_or_else(|| self.lowest())
    }

    /// Rank immediately after `id`, if any.
    #[must_use]
    pub fn next_after(&self, id: &RankId) -> Option<&Rank> {
        self.position(id).and_then(|i| self.ranks.get(i + 1))
    }
}

impl Default for RankLadder {
    fn default() -> Self {
        Self::standard()
    }
}
