use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;

use radio_core::model::{
    Callsign, ManualPage, OptionId, QuestionType, Rank, RankId, SessionQuestion, render_text,
};
use radio_core::ptt::GestureOutcome;
use radio_core::scorer::{DismissOutcome, Feedback, QuizResult, QuizScorer};

use super::selector::ContentSelector;
use crate::error::SessionError;

pub const MANUAL_TITLE: &str = "TRAINING MANUAL";
pub const QUIZ_TITLE: &str = "FIELD EXAM";
pub const NO_QUESTIONS: &str = "NO QUESTIONS";
pub const COMPLETE_SUBTITLE: &str = "COMPLETE";

//
// ─── READ MODELS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Manual,
    Quiz,
    Complete,
}

/// Header projection for the host UI. Never used for control decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub phase_title: String,
    pub phase_subtitle: String,
    pub progress_label: String,
    pub is_at_last_manual_page: bool,
    pub can_go_back: bool,
}

/// What a trigger did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Not legal in the current state; nothing changed.
    Ignored,
    PageChanged { index: usize },
    /// Back was pressed on the first manual page; the host should leave.
    ExitRequested,
    QuizStarted { total: u32 },
    /// Answer locked; `feedback.message` has the callsign filled in.
    Answered(Feedback),
    Retry,
    NextQuestion { index: usize },
    Completed(QuizResult),
}

/// Result of every trigger: the event plus the refreshed status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub event: SessionEvent,
    pub status: SessionStatus,
}

/// The current question with every text rendered for the trainee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPrompt {
    pub index: usize,
    pub total: usize,
    pub category_title: String,
    pub kind: QuestionType,
    pub scenario: String,
    pub ptt_instruction: Option<String>,
    pub options: Vec<(OptionId, String)>,
}

/// Per-session settings resolved by the caller before start.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub callsign: Callsign,
    /// Offer the skip-to-quiz shortcut (trainee has passed before).
    pub can_skip_manual: bool,
    /// Fixed seed for question sampling; fresh entropy when `None`.
    pub seed: Option<u64>,
}

impl SessionSettings {
    #[must_use]
    pub fn new(callsign: Callsign) -> Self {
        Self {
            callsign,
            can_skip_manual: false,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_skip(mut self, can_skip_manual: bool) -> Self {
        self.can_skip_manual = can_skip_manual;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

type CompletionCallback = Box<dyn FnMut(QuizResult) + Send>;

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// One manual-then-quiz training session at a fixed rank.
///
/// Every trigger is synchronous and returns a [`SessionUpdate`]; illegal
/// triggers come back as [`SessionEvent::Ignored`] rather than errors.
pub struct TrainingSession {
    selector: ContentSelector,
    rank: Rank,
    settings: SessionSettings,
    rng: StdRng,
    phase: SessionPhase,
    pages: Vec<ManualPage>,
    page_index: usize,
    scorer: QuizScorer,
    feedback: Option<Feedback>,
    result: Option<QuizResult>,
    recorded: bool,
    on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for TrainingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingSession")
            .field("rank", &self.rank.id)
            .field("phase", &self.phase)
            .field("page_index", &self.page_index)
            .field("question", &self.scorer.current_index())
            .field("score", &self.scorer.score())
            .finish_non_exhaustive()
    }
}

impl TrainingSession {
    /// Start a session at `target_rank_id`.
    ///
    /// Opens on the first manual page, or directly in the quiz when the
    /// manual is empty.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownRank` if the rank is not on the ladder.
    pub fn start(
        selector: ContentSelector,
        target_rank_id: &RankId,
        settings: SessionSettings,
    ) -> Result<Self, SessionError> {
        let rank = selector
            .bank()
            .ranks()
            .get(target_rank_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownRank(target_rank_id.clone()))?;
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let pages = selector.select_manual_pages(&rank.id);

        let mut session = Self {
            selector,
            rank,
            settings,
            rng,
            phase: SessionPhase::Manual,
            pages,
            page_index: 0,
            scorer: QuizScorer::new(Vec::new()),
            feedback: None,
            result: None,
            recorded: false,
            on_complete: None,
        };
        tracing::info!(rank = %session.rank.id, pages = session.pages.len(), "session started");
        if session.pages.is_empty() {
            session.begin_quiz();
        }
        Ok(session)
    }

    /// Register the callback fired once with the final result.
    #[must_use]
    pub fn on_complete(mut self, callback: impl FnMut(QuizResult) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn rank(&self) -> &Rank {
        &self.rank
    }

    #[must_use]
    pub fn callsign(&self) -> &Callsign {
        &self.settings.callsign
    }

    #[must_use]
    pub fn can_skip_manual(&self) -> bool {
        self.phase == SessionPhase::Manual && self.settings.can_skip_manual
    }

    #[must_use]
    pub fn pages(&self) -> &[ManualPage] {
        &self.pages
    }

    #[must_use]
    pub fn current_page(&self) -> Option<&ManualPage> {
        if self.phase != SessionPhase::Manual {
            return None;
        }
        self.pages.get(self.page_index)
    }

    /// Feedback of the locked question, if any.
    #[must_use]
    pub fn pending_feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        self.result
    }

    /// True once the result has been written to history.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        self.recorded
    }

    pub(crate) fn mark_recorded(&mut self) {
        self.recorded = true;
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.scorer.score()
    }

    /// Unrendered current question, including which option is correct.
    #[must_use]
    pub fn current_question(&self) -> Option<&SessionQuestion> {
        if self.phase != SessionPhase::Quiz {
            return None;
        }
        self.scorer.current_question()
    }

    #[must_use]
    pub fn current_prompt(&self) -> Option<QuestionPrompt> {
        if self.phase != SessionPhase::Quiz {
            return None;
        }
        let question = self.scorer.current_question()?;
        let callsign = &self.settings.callsign;
        Some(QuestionPrompt {
            index: self.scorer.current_index(),
            total: self.scorer.questions().len(),
            category_title: question.category_title.clone(),
            kind: question.kind(),
            scenario: question.render_scenario(callsign),
            ptt_instruction: question.variant.ptt_instruction.clone(),
            options: question.render_options(callsign),
        })
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match self.phase {
            SessionPhase::Manual => SessionStatus {
                phase_title: MANUAL_TITLE.to_owned(),
                phase_subtitle: self
                    .pages
                    .get(self.page_index)
                    .map(|p| p.title.clone())
                    .unwrap_or_default(),
                progress_label: format!("{} / {}", self.page_index + 1, self.pages.len()),
                is_at_last_manual_page: self.page_index + 1 >= self.pages.len(),
                can_go_back: self.page_index > 0,
            },
            SessionPhase::Quiz => {
                let total = self.scorer.questions().len();
                let (subtitle, position) = match self.scorer.current_question() {
                    Some(q) => (q.category_title.clone(), self.scorer.current_index() + 1),
                    None => (NO_QUESTIONS.to_owned(), 0),
                };
                SessionStatus {
                    phase_title: QUIZ_TITLE.to_owned(),
                    phase_subtitle: subtitle,
                    progress_label: format!("{position} / {total}"),
                    is_at_last_manual_page: false,
                    can_go_back: false,
                }
            }
            SessionPhase::Complete => {
                let total = self.scorer.questions().len();
                SessionStatus {
                    phase_title: QUIZ_TITLE.to_owned(),
                    phase_subtitle: COMPLETE_SUBTITLE.to_owned(),
                    progress_label: format!("{total} / {total}"),
                    is_at_last_manual_page: false,
                    can_go_back: false,
                }
            }
        }
    }

    fn update(&self, event: SessionEvent) -> SessionUpdate {
        SessionUpdate {
            event,
            status: self.status(),
        }
    }

    fn begin_quiz(&mut self) -> SessionEvent {
        let questions = self
            .selector
            .select_question_session(&self.rank.id, &mut self.rng);
        self.scorer = QuizScorer::new(questions);
        self.phase = SessionPhase::Quiz;
        let total = self.scorer.total();
        if total == 0 {
            tracing::warn!(rank = %self.rank.id, "quiz has no questions");
        }
        tracing::info!(rank = %self.rank.id, total, "quiz started");
        SessionEvent::QuizStarted { total }
    }

    /// Next page, quiz start from the last page, or feedback dismissal in the quiz.
    pub fn advance(&mut self) -> SessionUpdate {
        match self.phase {
            SessionPhase::Manual => {
                if self.page_index + 1 < self.pages.len() {
                    self.page_index += 1;
                    let event = SessionEvent::PageChanged {
                        index: self.page_index,
                    };
                    self.update(event)
                } else {
                    let event = self.begin_quiz();
                    self.update(event)
                }
            }
            SessionPhase::Quiz => self.dismiss_feedback(),
            SessionPhase::Complete => self.update(SessionEvent::Ignored),
        }
    }

    /// Previous manual page; on the first page asks the host to exit.
    pub fn retreat(&mut self) -> SessionUpdate {
        match self.phase {
            SessionPhase::Manual if self.page_index > 0 => {
                self.page_index -= 1;
                let event = SessionEvent::PageChanged {
                    index: self.page_index,
                };
                self.update(event)
            }
            SessionPhase::Manual => self.update(SessionEvent::ExitRequested),
            SessionPhase::Quiz | SessionPhase::Complete => self.update(SessionEvent::Ignored),
        }
    }

    /// Jump from any manual page to the quiz, if the trainee has passed before.
    pub fn skip_to_quiz(&mut self) -> SessionUpdate {
        if !self.can_skip_manual() {
            return self.update(SessionEvent::Ignored);
        }
        tracing::debug!(page = self.page_index, "manual skipped");
        let event = self.begin_quiz();
        self.update(event)
    }

    pub fn submit_answer(&mut self, option_id: &OptionId) -> SessionUpdate {
        if self.phase != SessionPhase::Quiz {
            return self.update(SessionEvent::Ignored);
        }
        let feedback = self.scorer.submit_option(option_id);
        self.on_feedback(feedback)
    }

    pub fn submit_timed_gesture(&mut self, outcome: GestureOutcome) -> SessionUpdate {
        if self.phase != SessionPhase::Quiz {
            return self.update(SessionEvent::Ignored);
        }
        let feedback = self.scorer.submit_gesture(outcome);
        self.on_feedback(feedback)
    }

    fn on_feedback(&mut self, feedback: Option<Feedback>) -> SessionUpdate {
        let Some(mut feedback) = feedback else {
            return self.update(SessionEvent::Ignored);
        };
        feedback.message = render_text(&feedback.message, &self.settings.callsign);
        tracing::debug!(
            question = self.scorer.current_index(),
            positive = feedback.is_positive(),
            "answer locked"
        );
        self.feedback = Some(feedback.clone());
        self.update(SessionEvent::Answered(feedback))
    }

    pub fn dismiss_feedback(&mut self) -> SessionUpdate {
        if self.phase != SessionPhase::Quiz {
            return self.update(SessionEvent::Ignored);
        }
        let event = match self.scorer.dismiss() {
            DismissOutcome::Ignored => SessionEvent::Ignored,
            DismissOutcome::Retry => SessionEvent::Retry,
            DismissOutcome::NextQuestion { index } => SessionEvent::NextQuestion { index },
            DismissOutcome::Complete(result) => {
                self.complete(result);
                SessionEvent::Completed(result)
            }
        };
        if event != SessionEvent::Ignored {
            self.feedback = None;
        }
        self.update(event)
    }

    fn complete(&mut self, result: QuizResult) {
        self.phase = SessionPhase::Complete;
        self.result = Some(result);
        tracing::info!(
            rank = %self.rank.id,
            score = result.score,
            total = result.total,
            passed = result.passed(),
            "session complete"
        );
        if let Some(mut callback) = self.on_complete.take() {
            callback(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radio_core::model::{
        AnswerOption, CategoryId, ContentBank, PageId, QuestionCategory, QuestionVariant,
        RankLadder, VariantId,
    };
    use radio_core::ptt::SPOKE_TOO_SOON;
    use std::sync::{Arc, Mutex};

    fn page(id: u64, rank: &str) -> ManualPage {
        ManualPage {
            id: PageId::new(id),
            title: format!("PAGE {id}"),
            icon_ref: "Radio".into(),
            content: "text".into(),
            required_rank_id: RankId::new(rank),
        }
    }

    fn mc_category(id: &str, rank: &str) -> QuestionCategory {
        QuestionCategory {
            id: CategoryId::new(id),
            title: format!("CAT {id}"),
            required_rank_id: RankId::new(rank),
            variants: vec![QuestionVariant {
                id: VariantId::new(format!("{id}_v")),
                scenario: "Call Base, {CALLSIGN}.".into(),
                kind: QuestionType::MultipleChoice,
                options: vec![
                    AnswerOption {
                        id: OptionId::new("ok"),
                        text: "Base, this is {CALLSIGN}.".into(),
                        is_correct: true,
                        feedback: "Good, {CALLSIGN}.".into(),
                    },
                    AnswerOption {
                        id: OptionId::new("bad"),
                        text: "Hello?".into(),
                        is_correct: false,
                        feedback: "No.".into(),
                    },
                ],
                ptt_instruction: None,
            }],
        }
    }

    fn ptt_category(id: &str, rank: &str) -> QuestionCategory {
        QuestionCategory {
            id: CategoryId::new(id),
            title: format!("CAT {id}"),
            required_rank_id: RankId::new(rank),
            variants: vec![QuestionVariant {
                id: VariantId::new("ptt"),
                scenario: "Transmit.".into(),
                kind: QuestionType::PttTiming,
                options: vec![AnswerOption {
                    id: OptionId::new("a"),
                    text: "Base, this is {CALLSIGN}.".into(),
                    is_correct: true,
                    feedback: "Clean.".into(),
                }],
                ptt_instruction: Some("Wait for the light.".into()),
            }],
        }
    }

    fn selector(pages: Vec<ManualPage>, categories: Vec<QuestionCategory>) -> ContentSelector {
        ContentSelector::new(Arc::new(
            ContentBank::new(RankLadder::standard(), pages, categories).unwrap(),
        ))
    }

    fn settings() -> SessionSettings {
        SessionSettings::new(Callsign::new("Haukka").unwrap()).with_seed(11)
    }

    fn standard_session(can_skip: bool) -> TrainingSession {
        let sel = selector(
            vec![page(1, "R0"), page(2, "R0"), page(3, "R0")],
            (1..=5).map(|i| mc_category(&format!("c{i}"), "R0")).collect(),
        );
        TrainingSession::start(sel, &RankId::new("R0"), settings().with_skip(can_skip)).unwrap()
    }

    fn ok() -> OptionId {
        OptionId::new("ok")
    }

    fn bad() -> OptionId {
        OptionId::new("bad")
    }

    #[test]
    fn manual_status_tracks_cursor() {
        let mut s = standard_session(false);
        let status = s.status();
        assert_eq!(status.phase_title, MANUAL_TITLE);
        assert_eq!(status.phase_subtitle, "PAGE 1");
        assert_eq!(status.progress_label, "1 / 3");
        assert!(!status.can_go_back);
        assert!(!status.is_at_last_manual_page);

        s.advance();
        let update = s.advance();
        assert_eq!(update.event, SessionEvent::PageChanged { index: 2 });
        assert!(update.status.is_at_last_manual_page);
        assert!(update.status.can_go_back);
        assert_eq!(update.status.progress_label, "3 / 3");
    }

    #[test]
    fn retreat_on_first_page_requests_exit() {
        let mut s = standard_session(false);
        assert_eq!(s.retreat().event, SessionEvent::ExitRequested);
        assert_eq!(s.phase(), SessionPhase::Manual);

        s.advance();
        assert_eq!(s.retreat().event, SessionEvent::PageChanged { index: 0 });
    }

    #[test]
    fn advance_past_last_page_starts_quiz() {
        let mut s = standard_session(false);
        s.advance();
        s.advance();
        let update = s.advance();
        assert_eq!(update.event, SessionEvent::QuizStarted { total: 5 });
        assert_eq!(s.phase(), SessionPhase::Quiz);
        assert_eq!(update.status.phase_title, QUIZ_TITLE);
        assert_eq!(update.status.progress_label, "1 / 5");
        assert!(update.status.phase_subtitle.starts_with("CAT c"));
        assert!(!update.status.can_go_back);
    }

    #[test]
    fn skip_requires_prior_pass() {
        let mut s = standard_session(false);
        assert_eq!(s.skip_to_quiz().event, SessionEvent::Ignored);
        assert_eq!(s.phase(), SessionPhase::Manual);

        let mut s = standard_session(true);
        s.advance();
        assert_eq!(s.skip_to_quiz().event, SessionEvent::QuizStarted { total: 5 });
        assert_eq!(s.skip_to_quiz().event, SessionEvent::Ignored);
    }

    #[test]
    fn quiz_ignores_manual_navigation() {
        let mut s = standard_session(true);
        s.skip_to_quiz();
        assert_eq!(s.retreat().event, SessionEvent::Ignored);
        assert!(s.current_page().is_none());
    }

    #[test]
    fn answers_in_manual_are_ignored() {
        let mut s = standard_session(false);
        assert_eq!(s.submit_answer(&ok()).event, SessionEvent::Ignored);
        assert_eq!(
            s.submit_timed_gesture(GestureOutcome::Success).event,
            SessionEvent::Ignored
        );
        assert_eq!(s.dismiss_feedback().event, SessionEvent::Ignored);
    }

    #[test]
    fn full_session_reports_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let mut s = standard_session(true).on_complete(move |r| sink.lock().unwrap().push(r));
        s.skip_to_quiz();

        let mut last = None;
        for i in 0..5 {
            if i == 2 {
                let update = s.submit_answer(&bad());
                assert!(matches!(update.event, SessionEvent::Answered(ref f) if !f.is_positive()));
                assert_eq!(s.dismiss_feedback().event, SessionEvent::Retry);
            }
            s.submit_answer(&ok());
            last = Some(s.advance());
        }

        let expected = QuizResult { score: 4, total: 5 };
        assert_eq!(last.unwrap().event, SessionEvent::Completed(expected));
        assert_eq!(s.phase(), SessionPhase::Complete);
        assert_eq!(s.result(), Some(expected));
        assert!(expected.passed());
        assert_eq!(s.status().phase_subtitle, COMPLETE_SUBTITLE);

        assert_eq!(s.advance().event, SessionEvent::Ignored);
        assert_eq!(s.dismiss_feedback().event, SessionEvent::Ignored);
        assert_eq!(*calls.lock().unwrap(), vec![expected]);
    }

    #[test]
    fn feedback_and_prompt_render_callsign() {
        let mut s = standard_session(true);
        s.skip_to_quiz();
        let prompt = s.current_prompt().unwrap();
        assert_eq!(prompt.scenario, "Call Base, Haukka.");
        assert!(prompt.options.contains(&(ok(), "Base, this is Haukka.".to_string())));

        let update = s.submit_answer(&ok());
        let SessionEvent::Answered(feedback) = update.event else {
            panic!("expected feedback");
        };
        assert_eq!(feedback.message, "Good, Haukka.");
        assert_eq!(s.pending_feedback(), Some(&feedback));
        s.dismiss_feedback();
        assert!(s.pending_feedback().is_none());
    }

    #[test]
    fn double_submit_while_locked_is_ignored() {
        let mut s = standard_session(true);
        s.skip_to_quiz();
        s.submit_answer(&ok());
        assert_eq!(s.submit_answer(&ok()).event, SessionEvent::Ignored);
        assert_eq!(s.score(), 1);
    }

    #[test]
    fn timed_gesture_drives_ptt_question() {
        let sel = selector(Vec::new(), vec![ptt_category("ptt", "R0")]);
        let mut s = TrainingSession::start(sel, &RankId::new("R0"), settings()).unwrap();
        assert_eq!(s.phase(), SessionPhase::Quiz);
        let prompt = s.current_prompt().unwrap();
        assert_eq!(prompt.kind, QuestionType::PttTiming);
        assert_eq!(prompt.ptt_instruction.as_deref(), Some("Wait for the light."));

        let update = s.submit_timed_gesture(GestureOutcome::failure(SPOKE_TOO_SOON));
        assert!(
            matches!(update.event, SessionEvent::Answered(ref f) if f.message == SPOKE_TOO_SOON)
        );
        s.dismiss_feedback();
        s.submit_timed_gesture(GestureOutcome::Success);
        assert_eq!(
            s.dismiss_feedback().event,
            SessionEvent::Completed(QuizResult { score: 0, total: 1 })
        );
    }

    #[test]
    fn empty_manual_opens_in_quiz() {
        let sel = selector(Vec::new(), vec![mc_category("c", "R0")]);
        let s = TrainingSession::start(sel, &RankId::new("R0"), settings()).unwrap();
        assert_eq!(s.phase(), SessionPhase::Quiz);
        assert_eq!(s.status().progress_label, "1 / 1");
    }

    #[test]
    fn empty_quiz_never_completes() {
        let sel = selector(vec![page(1, "R0")], Vec::new());
        let mut s = TrainingSession::start(sel, &RankId::new("R0"), settings()).unwrap();
        assert_eq!(s.advance().event, SessionEvent::QuizStarted { total: 0 });
        let status = s.status();
        assert_eq!(status.phase_subtitle, NO_QUESTIONS);
        assert_eq!(status.progress_label, "0 / 0");
        assert_eq!(s.submit_answer(&ok()).event, SessionEvent::Ignored);
        assert_eq!(s.advance().event, SessionEvent::Ignored);
        assert_eq!(s.phase(), SessionPhase::Quiz);
        assert!(s.result().is_none());
    }

    #[test]
    fn unknown_rank_is_rejected() {
        let sel = selector(Vec::new(), Vec::new());
        let err = TrainingSession::start(sel, &RankId::new("R9"), settings()).unwrap_err();
        assert!(matches!(err, SessionError::UnknownRank(id) if id.as_str() == "R9"));
    }

    #[test]
    fn target_rank_content_only() {
        let sel = selector(
            vec![page(1, "R0"), page(2, "R2")],
            vec![mc_category("low", "R0"), mc_category("high", "R2")],
        );
        let mut s = TrainingSession::start(sel, &RankId::new("R2"), settings()).unwrap();
        assert_eq!(s.pages().len(), 1);
        assert_eq!(s.rank().id.as_str(), "R2");
        s.advance();
        assert_eq!(s.current_prompt().unwrap().category_title, "CAT high");
    }
}
