#![forbid(unsafe_code)]

pub mod admin;
pub mod app_services;
pub mod error;
pub mod sessions;
pub mod users;

pub use radio_core::Clock;

pub use admin::{ADMIN_PASSPHRASE, AdminGate, AdminService, ImportSummary, UserStats};
pub use app_services::AppServices;
pub use error::{AdminError, AppServicesError, SessionError};
pub use sessions::{
    ContentSelector, QuestionPrompt, RankSelection, SessionEvent, SessionPhase, SessionSettings,
    SessionStatus, SessionUpdate, TrainingService, TrainingSession,
};
pub use users::UserService;
