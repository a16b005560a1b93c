mod bank;
mod callsign;
mod content;
mod history;
mod ids;
mod rank;

pub use bank::{ContentBank, ContentError, validate_categories, validate_pages};
pub use callsign::{Callsign, CallsignError, SUGGESTED_CALLSIGNS};
pub use content::{
    AnswerOption, CALLSIGN_PLACEHOLDER, ManualPage, QuestionCategory, QuestionType,
    QuestionVariant, SessionQuestion, render_text,
};
pub use history::{
    GameHistoryRecord, HistoryError, PASS_THRESHOLD_PERCENT, is_passing, score_percent,
};
pub use ids::{CategoryId, OptionId, PageId, ParseIdError, RankId, VariantId};
pub use rank::{Rank, RankLadder, RankLadderError};
