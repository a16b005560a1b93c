//! Shared error types for the services crate.

use thiserror::Error;

use radio_core::model::{ContentError, HistoryError, RankId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("unknown rank: {0}")]
    UnknownRank(RankId),
    #[error("rank {0} is not unlocked yet")]
    RankLocked(RankId),
    #[error("trainee name cannot be empty")]
    EmptyUser,
    #[error("session is not complete")]
    Incomplete,
    #[error("session result was already recorded")]
    AlreadyRecorded,
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AdminService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdminError {
    #[error("invalid import: {0}")]
    InvalidImport(String),
    #[error("failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
