use std::sync::Arc;

use radio_core::model::{Callsign, ContentBank, GameHistoryRecord, RankId, RankLadder};
use radio_core::{Clock, Progress, compute_progress};
use storage::repository::{ContentRepository, HistoryRepository};

use super::controller::{SessionSettings, TrainingSession};
use super::selector::ContentSelector;
use crate::error::SessionError;

/// Which rank a new session trains.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RankSelection {
    /// The trainee's current rank, derived from history.
    #[default]
    Progression,
    /// Any rank the trainee has already reached.
    Review(RankId),
}

/// Starts sessions from persisted content and records their results.
#[derive(Clone)]
pub struct TrainingService {
    clock: Clock,
    ranks: RankLadder,
    content: Arc<dyn ContentRepository>,
    history: Arc<dyn HistoryRepository>,
    seed: Option<u64>,
}

impl TrainingService {
    #[must_use]
    pub fn new(
        clock: Clock,
        content: Arc<dyn ContentRepository>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            clock,
            ranks: RankLadder::standard(),
            content,
            history,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_ranks(mut self, ranks: RankLadder) -> Self {
        self.ranks = ranks;
        self
    }

    /// Fix the question sampling seed for every session started here.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn ranks(&self) -> &RankLadder {
        &self.ranks
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Load and validate the stored question bank and manual.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` on storage failures or broken content.
    pub async fn load_bank(&self) -> Result<Arc<ContentBank>, SessionError> {
        let categories = self.content.get_question_bank().await?;
        let pages = self.content.get_manual_pages().await?;
        let bank = ContentBank::new(self.ranks.clone(), pages, categories)?;
        Ok(Arc::new(bank))
    }

    /// Progress of `user`, recomputed from their history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyUser` for a blank name, or a storage error.
    pub async fn progress_for(&self, user: &str) -> Result<Progress, SessionError> {
        if user.trim().is_empty() {
            return Err(SessionError::EmptyUser);
        }
        let history = self.history.get_user_history(user).await?;
        Ok(compute_progress(&self.ranks, &history))
    }

    /// Start a session for `user`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::RankLocked` when reviewing a rank not yet
    /// reached, `SessionError::UnknownRank` for a rank not on the ladder, or
    /// storage and content errors.
    pub async fn start_session(
        &self,
        user: &str,
        callsign: Callsign,
        selection: RankSelection,
    ) -> Result<TrainingSession, SessionError> {
        let progress = self.progress_for(user).await?;
        let rank = match &selection {
            RankSelection::Progression => progress.current_rank.clone(),
            RankSelection::Review(id) => self
                .ranks
                .get(id)
                .cloned()
                .ok_or_else(|| SessionError::UnknownRank(id.clone()))?,
        };
        if !progress.has_unlocked(&rank) {
            return Err(SessionError::RankLocked(rank.id));
        }

        let bank = self.load_bank().await?;
        let mut settings =
            SessionSettings::new(callsign).with_skip(progress.can_skip_manual());
        settings.seed = self.seed;

        tracing::info!(
            user,
            rank = %rank.id,
            passed = progress.passed_count,
            review = matches!(selection, RankSelection::Review(_)),
            "starting session"
        );
        TrainingSession::start(ContentSelector::new(bank), &rank.id, settings)
    }

    /// Persist the result of a completed session, once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` if the session has not finished,
    /// `SessionError::AlreadyRecorded` on a second call, or history and
    /// storage errors. A failed write leaves the session recordable.
    pub async fn record_result(
        &self,
        user: &str,
        session: &mut TrainingSession,
    ) -> Result<GameHistoryRecord, SessionError> {
        let result = session.result().ok_or(SessionError::Incomplete)?;
        if session.is_recorded() {
            return Err(SessionError::AlreadyRecorded);
        }
        let record = GameHistoryRecord::completed(
            user,
            session.callsign(),
            result.score,
            result.total,
            self.clock.now(),
        )?;
        self.history.append_game_result(&record).await?;
        session.mark_recorded();
        tracing::info!(
            user,
            score = record.score,
            total = record.total,
            passed = record.passed,
            "session recorded"
        );
        Ok(record)
    }
}
