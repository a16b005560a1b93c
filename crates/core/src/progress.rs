//! Rank and progress derived from a trainee's session history.
//!
//! Rank is never stored: it is recomputed from history every time a session
//! starts, so it can only move up as passed sessions accumulate.

use crate::model::{GameHistoryRecord, Rank, RankId, RankLadder};

/// Derived progression state for one trainee.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub passed_count: u32,
    pub current_rank: Rank,
    pub next_rank: Option<Rank>,
    /// Progress from the current rank towards the next one, in `[0, 100]`.
    pub progress_percent: f64,
}

impl Progress {
    /// Skipping the manual is offered once the trainee has passed any session.
    #[must_use]
    pub fn can_skip_manual(&self) -> bool {
        self.passed_count > 0
    }

    #[must_use]
    pub fn is_max_rank(&self) -> bool {
        self.next_rank.is_none()
    }

    /// Whether `rank` has been reached, making it available for review.
    #[must_use]
    pub fn has_unlocked(&self, rank: &Rank) -> bool {
        rank.min_passed <= self.passed_count
    }

    /// Passed sessions still needed for the next rank.
    #[must_use]
    pub fn remaining_to_next(&self) -> Option<u32> {
        self.next_rank
            .as_ref()
            .map(|next| next.min_passed.saturating_sub(self.passed_count))
    }

    #[must_use]
    pub fn current_rank_id(&self) -> &RankId {
        &self.current_rank.id
    }
}

/// Compute progress from `history`.
///
/// Pure: the same ladder and history always yield the same result. Pass counts
/// beyond the top rank's threshold report the top rank at 100%.
#[must_use]
pub fn compute_progress(ranks: &RankLadder, history: &[GameHistoryRecord]) -> Progress {
    let passed = history.iter().filter(|h| h.passed).count();
    let passed_count = u32::try_from(passed).unwrap_or(u32::MAX);

    let current = ranks.current_for(passed_count);
    let next = ranks.next_after(&current.id);

    let progress_percent = match next {
        Some(next) => {
            let span = next.min_passed.saturating_sub(current.min_passed);
            if span == 0 {
                100.0
            } else {
                let gained = passed_count.saturating_sub(current.min_passed);
                (f64::from(gained) / f64::from(span) * 100.0).clamp(0.0, 100.0)
            }
        }
        None => 100.0,
    };

    Progress {
        passed_count,
        current_rank: current.clone(),
        next_rank: next.cloned(),
        progress_percent,
    }
}
