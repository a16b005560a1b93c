use async_trait::async_trait;
use radio_core::model::{GameHistoryRecord, ManualPage, QuestionCategory};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── KEY-VALUE MEDIUM ──────────────────────────────────────────────────────────
//

/// Raw string store every adapter provides.
///
/// Values are JSON documents; the typed repositories below are implemented
/// once on top of this trait.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Write every entry or none of them.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the batch cannot be committed; the store is
    /// then left as it was.
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;
}

//
// ─── TYPED REPOSITORIES ────────────────────────────────────────────────────────
//

/// Manual pages and the editable question bank.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Load the question bank, writing the bundled default first if none is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read or decoded.
    async fn get_question_bank(&self) -> Result<Vec<QuestionCategory>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be stored.
    async fn save_question_bank(&self, categories: &[QuestionCategory])
    -> Result<(), StorageError>;

    /// Stored manual override, or the bundled manual.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if stored pages cannot be decoded.
    async fn get_manual_pages(&self) -> Result<Vec<ManualPage>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the pages cannot be stored.
    async fn save_manual_pages(&self, pages: &[ManualPage]) -> Result<(), StorageError>;
}

/// Append-only log of completed sessions.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the log cannot be read or decoded.
    async fn get_history(&self) -> Result<Vec<GameHistoryRecord>, StorageError>;

    /// Records whose `user` matches exactly, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the log cannot be read or decoded.
    async fn get_user_history(&self, user: &str) -> Result<Vec<GameHistoryRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be appended.
    async fn append_game_result(&self, record: &GameHistoryRecord) -> Result<(), StorageError>;
}

/// Known trainees and their avatars.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be read or decoded.
    async fn list_users(&self) -> Result<Vec<String>, StorageError>;

    /// Register `name` unless a case-insensitive match exists. Returns whether
    /// it was added.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be updated.
    async fn add_user(&self, name: &str) -> Result<bool, StorageError>;

    /// Replace the whole user list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be stored.
    async fn save_users(&self, names: &[String]) -> Result<(), StorageError>;

    /// Avatar id for `user`, `"default"` if none was chosen.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the avatar map cannot be read.
    async fn get_user_avatar(&self, user: &str) -> Result<String, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the avatar map cannot be updated.
    async fn save_user_avatar(&self, user: &str, avatar: &str) -> Result<(), StorageError>;
}

/// Whole-store export and import.
#[async_trait]
pub trait BackupRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if any section cannot be read.
    async fn export_all(&self) -> Result<DataBlob, StorageError>;

    /// Overwrite the sections present in `blob` in one atomic write.
    ///
    /// The blob must already be validated; absent sections stay untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails, leaving the store unmodified.
    async fn import_all(&self, blob: &DataBlob) -> Result<(), StorageError>;
}

/// Backup document exchanged by export and import.
///
/// Every section is optional on import so partial backups only replace what
/// they carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBlob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<GameHistoryRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<QuestionCategory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatars: Option<BTreeMap<String, String>>,
}

impl DataBlob {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_none()
            && self.history.is_none()
            && self.questions.is_none()
            && self.avatars.is_none()
    }
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for (key, value) in entries {
            guard.insert((*key).to_owned(), value.clone());
        }
        Ok(())
    }
}

/// Aggregates the typed repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub content: Arc<dyn ContentRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub users: Arc<dyn UserRepository>,
    pub backup: Arc<dyn BackupRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryRepository::new())
    }

    /// Wire every repository to one shared key-value medium.
    #[must_use]
    pub fn from_store<S>(store: S) -> Self
    where
        S: KeyValueStore + Clone + 'static,
    {
        let content: Arc<dyn ContentRepository> = Arc::new(store.clone());
        let history: Arc<dyn HistoryRepository> = Arc::new(store.clone());
        let users: Arc<dyn UserRepository> = Arc::new(store.clone());
        let backup: Arc<dyn BackupRepository> = Arc::new(store);
        Self {
            content,
            history,
            users,
            backup,
        }
    }
}
