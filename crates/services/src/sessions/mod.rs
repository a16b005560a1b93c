mod controller;
mod selector;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{
    COMPLETE_SUBTITLE, MANUAL_TITLE, NO_QUESTIONS, QUIZ_TITLE, QuestionPrompt, SessionEvent,
    SessionPhase, SessionSettings, SessionStatus, SessionUpdate, TrainingSession,
};
pub use selector::ContentSelector;
pub use workflow::{RankSelection, TrainingService};
