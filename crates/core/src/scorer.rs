//! Per-question answer evaluation.
//!
//! A question is worth one point only if it is answered correctly before any
//! wrong attempt. Wrong answers lock the question until the feedback is
//! dismissed, after which the trainee retries the same question.

use crate::model::{OptionId, QuestionType, SessionQuestion, is_passing, score_percent};
use crate::ptt::GestureOutcome;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerState {
    AwaitingAnswer,
    LockedCorrect,
    LockedWrong,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Positive,
    Corrective,
}

/// Feedback emitted when an answer locks the question.
///
/// `message` is the authored text; callsign substitution is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

impl Feedback {
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.kind == FeedbackKind::Positive
    }
}

/// Final tally of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
}

impl QuizResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        is_passing(self.score, self.total)
    }

    #[must_use]
    pub fn percent(&self) -> u32 {
        score_percent(self.score, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissOutcome {
    /// Nothing to dismiss.
    Ignored,
    /// Wrong answer acknowledged; same question again.
    Retry,
    /// Moved on to the question at `index`.
    NextQuestion { index: usize },
    /// Last question done.
    Complete(QuizResult),
}

//
// ─── SCORER ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
pub struct QuizScorer {
    questions: Vec<SessionQuestion>,
    current: usize,
    state: ScorerState,
    has_made_mistake: bool,
    score: u32,
}

impl QuizScorer {
    #[must_use]
    pub fn new(questions: Vec<SessionQuestion>) -> Self {
        Self {
            questions,
            current: 0,
            state: ScorerState::AwaitingAnswer,
            has_made_mistake: false,
            score: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> ScorerState {
        self.state
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn questions(&self) -> &[SessionQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn has_made_mistake(&self) -> bool {
        self.has_made_mistake
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == ScorerState::Complete
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(
            self.state,
            ScorerState::LockedCorrect | ScorerState::LockedWrong
        )
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&SessionQuestion> {
        if self.is_complete() {
            return None;
        }
        self.questions.get(self.current)
    }

    /// Answer the current multiple-choice question.
    ///
    /// Returns `None` (no transition) when locked, complete, the question is
    /// a timing question, or `option_id` is not one of its options.
    pub fn submit_option(&mut self, option_id: &OptionId) -> Option<Feedback> {
        if self.state != ScorerState::AwaitingAnswer {
            return None;
        }
        let question = self.questions.get(self.current)?;
        if question.kind() != QuestionType::MultipleChoice {
            return None;
        }
        let option = question.variant.option(option_id)?;
        let (correct, message) = (option.is_correct, option.feedback.clone());
        Some(self.lock(correct, message))
    }

    /// Resolve the current timing question from a push-to-talk gesture.
    ///
    /// Success counts as choosing the variant's correct option; failure as a
    /// wrong answer whose feedback is the gesture's reason.
    pub fn submit_gesture(&mut self, outcome: GestureOutcome) -> Option<Feedback> {
        if self.state != ScorerState::AwaitingAnswer {
            return None;
        }
        let question = self.questions.get(self.current)?;
        if question.kind() != QuestionType::PttTiming {
            return None;
        }
        match outcome {
            GestureOutcome::Success => {
                let message = question.variant.correct_option()?.feedback.clone();
                Some(self.lock(true, message))
            }
            GestureOutcome::Failure { reason } => Some(self.lock(false, reason)),
        }
    }

    fn lock(&mut self, correct: bool, message: String) -> Feedback {
        if correct {
            self.state = ScorerState::LockedCorrect;
            if !self.has_made_mistake {
                self.score += 1;
            }
            Feedback {
                kind: FeedbackKind::Positive,
                message,
            }
        } else {
            self.state = ScorerState::LockedWrong;
            self.has_made_mistake = true;
            Feedback {
                kind: FeedbackKind::Corrective,
                message,
            }
        }
    }

    /// Acknowledge the feedback for the locked question.
    pub fn dismiss(&mut self) -> DismissOutcome {
        match self.state {
            ScorerState::AwaitingAnswer | ScorerState::Complete => DismissOutcome::Ignored,
            ScorerState::LockedWrong => {
                self.state = ScorerState::AwaitingAnswer;
                DismissOutcome::Retry
            }
            ScorerState::LockedCorrect => {
                if self.current + 1 < self.questions.len() {
                    self.current += 1;
                    self.has_made_mistake = false;
                    self.state = ScorerState::AwaitingAnswer;
                    DismissOutcome::NextQuestion {
                        index: self.current,
                    }
                } else {
                    // The score already includes this question.
                    self.state = ScorerState::Complete;
                    DismissOutcome::Complete(QuizResult {
                        score: self.score,
                        total: self.total(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AnswerOption, CategoryId, QuestionCategory, QuestionVariant, RankId, VariantId,
    };

    fn option(id: &str, correct: bool) -> AnswerOption {
        AnswerOption {
            id: OptionId::new(id),
            text: id.to_uppercase(),
            is_correct: correct,
            feedback: format!("fb-{id}"),
        }
    }

    fn question(n: usize, kind: QuestionType) -> SessionQuestion {
        let options = match kind {
            QuestionType::MultipleChoice => vec![option("a", false), option("b", true)],
            QuestionType::PttTiming => vec![option("a", true)],
        };
        let variant = QuestionVariant {
            id: VariantId::new(format!("v{n}")),
            scenario: "scenario".into(),
            kind,
            options,
            ptt_instruction: None,
        };
        let category = QuestionCategory {
            id: CategoryId::new(format!("c{n}")),
            title: format!("CATEGORY {n}"),
            required_rank_id: RankId::new("R0"),
            variants: vec![variant.clone()],
        };
        SessionQuestion::new(&category, variant)
    }

    fn mc_quiz(n: usize) -> QuizScorer {
        QuizScorer::new((0..n).map(|i| question(i, QuestionType::MultipleChoice)).collect())
    }

    fn right() -> OptionId {
        OptionId::new("b")
    }

    fn wrong() -> OptionId {
        OptionId::new("a")
    }

    #[test]
    fn correct_first_try_scores_one() {
        let mut quiz = mc_quiz(2);
        let fb = quiz.submit_option(&right()).unwrap();
        assert!(fb.is_positive());
        assert_eq!(fb.message, "fb-b");
        assert_eq!(quiz.state(), ScorerState::LockedCorrect);
        assert_eq!(quiz.score(), 1);
    }

    #[test]
    fn wrong_then_right_scores_zero() {
        let mut quiz = mc_quiz(2);
        let fb = quiz.submit_option(&wrong()).unwrap();
        assert_eq!(fb.kind, FeedbackKind::Corrective);
        assert_eq!(quiz.state(), ScorerState::LockedWrong);
        assert_eq!(quiz.dismiss(), DismissOutcome::Retry);
        assert_eq!(quiz.current_index(), 0);

        quiz.submit_option(&right()).unwrap();
        assert_eq!(quiz.score(), 0);
        assert_eq!(quiz.dismiss(), DismissOutcome::NextQuestion { index: 1 });
        assert!(!quiz.has_made_mistake());
    }

    #[test]
    fn locked_question_ignores_double_submit() {
        let mut quiz = mc_quiz(1);
        quiz.submit_option(&right()).unwrap();
        assert!(quiz.submit_option(&right()).is_none());
        assert!(quiz.submit_option(&wrong()).is_none());
        assert!(quiz.submit_gesture(GestureOutcome::Success).is_none());
        assert_eq!(quiz.score(), 1);

        let mut quiz = mc_quiz(1);
        quiz.submit_option(&wrong()).unwrap();
        assert!(quiz.submit_option(&right()).is_none());
        assert_eq!(quiz.state(), ScorerState::LockedWrong);
    }

    #[test]
    fn dismiss_without_lock_is_ignored() {
        let mut quiz = mc_quiz(1);
        assert_eq!(quiz.dismiss(), DismissOutcome::Ignored);
    }

    #[test]
    fn unknown_option_is_ignored() {
        let mut quiz = mc_quiz(1);
        assert!(quiz.submit_option(&OptionId::new("zz")).is_none());
        assert_eq!(quiz.state(), ScorerState::AwaitingAnswer);
    }

    #[test]
    fn five_questions_one_mistake() {
        let mut quiz = mc_quiz(5);
        let mut result = None;
        for i in 0..5 {
            if i == 2 {
                quiz.submit_option(&wrong()).unwrap();
                assert_eq!(quiz.dismiss(), DismissOutcome::Retry);
            }
            quiz.submit_option(&right()).unwrap();
            if let DismissOutcome::Complete(r) = quiz.dismiss() {
                result = Some(r);
            }
        }
        let result = result.unwrap();
        assert_eq!(result, QuizResult { score: 4, total: 5 });
        assert!(result.passed());
        assert!(quiz.is_complete());
        assert!(quiz.current_question().is_none());
    }

    #[test]
    fn final_question_is_not_double_counted() {
        let mut quiz = mc_quiz(3);
        for _ in 0..2 {
            quiz.submit_option(&right()).unwrap();
            quiz.dismiss();
        }
        quiz.submit_option(&right()).unwrap();
        assert_eq!(quiz.score(), 3);
        assert_eq!(
            quiz.dismiss(),
            DismissOutcome::Complete(QuizResult { score: 3, total: 3 })
        );
    }

    #[test]
    fn final_question_after_mistake_adds_nothing() {
        let mut quiz = mc_quiz(1);
        quiz.submit_option(&wrong()).unwrap();
        quiz.dismiss();
        quiz.submit_option(&right()).unwrap();
        assert_eq!(
            quiz.dismiss(),
            DismissOutcome::Complete(QuizResult { score: 0, total: 1 })
        );
    }

    #[test]
    fn completed_quiz_ignores_everything() {
        let mut quiz = mc_quiz(1);
        quiz.submit_option(&right()).unwrap();
        quiz.dismiss();
        assert!(quiz.submit_option(&right()).is_none());
        assert_eq!(quiz.dismiss(), DismissOutcome::Ignored);
        assert_eq!(quiz.score(), 1);
    }

    #[test]
    fn gesture_success_uses_correct_option_feedback() {
        let mut quiz = QuizScorer::new(vec![question(0, QuestionType::PttTiming)]);
        let fb = quiz.submit_gesture(GestureOutcome::Success).unwrap();
        assert!(fb.is_positive());
        assert_eq!(fb.message, "fb-a");
        assert_eq!(quiz.score(), 1);
    }

    #[test]
    fn gesture_failure_is_a_mistake_with_reason() {
        let mut quiz = QuizScorer::new(vec![question(0, QuestionType::PttTiming)]);
        let fb = quiz
            .submit_gesture(GestureOutcome::failure("spoke too soon"))
            .unwrap();
        assert_eq!(fb.kind, FeedbackKind::Corrective);
        assert_eq!(fb.message, "spoke too soon");
        quiz.dismiss();
        quiz.submit_gesture(GestureOutcome::Success).unwrap();
        assert_eq!(
            quiz.dismiss(),
            DismissOutcome::Complete(QuizResult { score: 0, total: 1 })
        );
    }

    #[test]
    fn answer_kind_must_match_question_kind() {
        let mut quiz = QuizScorer::new(vec![
            question(0, QuestionType::PttTiming),
            question(1, QuestionType::MultipleChoice),
        ]);
        assert!(quiz.submit_option(&OptionId::new("a")).is_none());
        quiz.submit_gesture(GestureOutcome::Success).unwrap();
        quiz.dismiss();
        assert!(quiz.submit_gesture(GestureOutcome::Success).is_none());
    }

    #[test]
    fn empty_quiz_never_completes() {
        let mut quiz = QuizScorer::new(Vec::new());
        assert!(quiz.is_empty());
        assert!(quiz.submit_option(&right()).is_none());
        assert_eq!(quiz.dismiss(), DismissOutcome::Ignored);
        assert!(!quiz.is_complete());
        assert_eq!(quiz.total(), 0);
    }

    #[test]
    fn score_never_exceeds_total() {
        for mistakes_at in 0..4 {
            let mut quiz = mc_quiz(4);
            let mut result = None;
            for i in 0..4 {
                if i >= mistakes_at {
                    quiz.submit_option(&wrong()).unwrap();
                    quiz.dismiss();
                }
                quiz.submit_option(&right()).unwrap();
                if let DismissOutcome::Complete(r) = quiz.dismiss() {
                    result = Some(r);
                }
            }
            let r = result.unwrap();
            assert!(r.score <= r.total);
            assert_eq!(r.score, u32::try_from(mistakes_at).unwrap());
        }
    }
}
