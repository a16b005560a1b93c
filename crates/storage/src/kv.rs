//! Typed repositories over any [`KeyValueStore`].
//!
//! Each section lives under its own key as a JSON document, matching the
//! layout of the browser-era `radiopartio_*` keys so exported data stays portable.

use async_trait::async_trait;
use radio_core::model::{GameHistoryRecord, ManualPage, QuestionCategory};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::debug;

use crate::defaults;
use crate::repository::{
    BackupRepository, ContentRepository, DataBlob, HistoryRepository, KeyValueStore,
    StorageError, UserRepository,
};

pub const USERS_KEY: &str = "radiopartio_users";
pub const HISTORY_KEY: &str = "radiopartio_history";
pub const QUESTIONS_KEY: &str = "radiopartio_questions_v5";
pub const AVATARS_KEY: &str = "radiopartio_avatars";
pub const MANUAL_KEY: &str = "radiopartio_manual";

pub const DEFAULT_AVATAR: &str = "default";

pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(format!("{key}: {e}")))
}

async fn load<S, T>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => decode(key, &raw).map(Some),
        None => Ok(None),
    }
}

async fn save<S, T>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized + Sync,
{
    let raw = encode(value)?;
    store.set(key, &raw).await?;
    debug!(key, bytes = raw.len(), "stored section");
    Ok(())
}

#[async_trait]
impl<S: KeyValueStore> ContentRepository for S {
    async fn get_question_bank(&self) -> Result<Vec<QuestionCategory>, StorageError> {
        if let Some(bank) = load(self, QUESTIONS_KEY).await? {
            return Ok(bank);
        }
        let bank = defaults::question_bank()?;
        save(self, QUESTIONS_KEY, &bank).await?;
        debug!(categories = bank.len(), "initialized default question bank");
        Ok(bank)
    }

    async fn save_question_bank(
        &self,
        categories: &[QuestionCategory],
    ) -> Result<(), StorageError> {
        save(self, QUESTIONS_KEY, categories).await
    }

    async fn get_manual_pages(&self) -> Result<Vec<ManualPage>, StorageError> {
        match load(self, MANUAL_KEY).await? {
            Some(pages) => Ok(pages),
            None => defaults::manual_pages(),
        }
    }

    async fn save_manual_pages(&self, pages: &[ManualPage]) -> Result<(), StorageError> {
        save(self, MANUAL_KEY, pages).await
    }
}

#[async_trait]
impl<S: KeyValueStore> HistoryRepository for S {
    async fn get_history(&self) -> Result<Vec<GameHistoryRecord>, StorageError> {
        Ok(load(self, HISTORY_KEY).await?.unwrap_or_default())
    }

    async fn get_user_history(&self, user: &str) -> Result<Vec<GameHistoryRecord>, StorageError> {
        let mut history = self.get_history().await?;
        history.retain(|h| h.user == user);
        Ok(history)
    }

    async fn append_game_result(&self, record: &GameHistoryRecord) -> Result<(), StorageError> {
        let mut history = self.get_history().await?;
        history.push(record.clone());
        save(self, HISTORY_KEY, &history).await
    }
}

#[async_trait]
impl<S: KeyValueStore> UserRepository for S {
    async fn list_users(&self) -> Result<Vec<String>, StorageError> {
        Ok(load(self, USERS_KEY).await?.unwrap_or_default())
    }

    async fn add_user(&self, name: &str) -> Result<bool, StorageError> {
        let mut users = self.list_users().await?;
        let lowered = name.to_lowercase();
        if users.iter().any(|u| u.to_lowercase() == lowered) {
            return Ok(false);
        }
        users.push(name.to_owned());
        save(self, USERS_KEY, &users).await?;
        Ok(true)
    }

    async fn save_users(&self, names: &[String]) -> Result<(), StorageError> {
        save(self, USERS_KEY, names).await
    }

    async fn get_user_avatar(&self, user: &str) -> Result<String, StorageError> {
        let avatars: BTreeMap<String, String> = load(self, AVATARS_KEY).await?.unwrap_or_default();
        Ok(avatars
            .get(user)
            .cloned()
            .unwrap_or_else(|| DEFAULT_AVATAR.to_owned()))
    }

    async fn save_user_avatar(&self, user: &str, avatar: &str) -> Result<(), StorageError> {
        let mut avatars: BTreeMap<String, String> =
            load(self, AVATARS_KEY).await?.unwrap_or_default();
        avatars.insert(user.to_owned(), avatar.to_owned());
        save(self, AVATARS_KEY, &avatars).await
    }
}

#[async_trait]
impl<S: KeyValueStore> BackupRepository for S {
    async fn export_all(&self) -> Result<DataBlob, StorageError> {
        Ok(DataBlob {
            users: Some(self.list_users().await?),
            history: Some(self.get_history().await?),
            questions: Some(self.get_question_bank().await?),
            avatars: Some(load(self, AVATARS_KEY).await?.unwrap_or_default()),
        })
    }

    async fn import_all(&self, blob: &DataBlob) -> Result<(), StorageError> {
        let mut entries = Vec::new();
        if let Some(users) = &blob.users {
            entries.push((USERS_KEY, encode(users)?));
        }
        if let Some(history) = &blob.history {
            entries.push((HISTORY_KEY, encode(history)?));
        }
        if let Some(questions) = &blob.questions {
            entries.push((QUESTIONS_KEY, encode(questions)?));
        }
        if let Some(avatars) = &blob.avatars {
            entries.push((AVATARS_KEY, encode(avatars)?));
        }
        if entries.is_empty() {
            return Ok(());
        }
        self.set_many(&entries).await?;
        debug!(sections = entries.len(), "imported backup");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use radio_core::model::Callsign;
    use radio_core::time::fixed_now;

    fn record(user: &str, score: u32) -> GameHistoryRecord {
        let callsign = Callsign::new("Haukka").unwrap();
        GameHistoryRecord::completed(user, &callsign, score, 5, fixed_now()).unwrap()
    }

    #[tokio::test]
    async fn question_bank_defaults_are_written_on_first_read() {
        let repo = InMemoryRepository::new();
        assert!(repo.get(QUESTIONS_KEY).await.unwrap().is_none());

        let bank = repo.get_question_bank().await.unwrap();
        assert!(!bank.is_empty());
        assert!(repo.get(QUESTIONS_KEY).await.unwrap().is_some());
        assert_eq!(repo.get_question_bank().await.unwrap(), bank);
    }

    #[tokio::test]
    async fn manual_defaults_are_not_persisted() {
        let repo = InMemoryRepository::new();
        let pages = repo.get_manual_pages().await.unwrap();
        assert!(!pages.is_empty());
        assert!(repo.get(MANUAL_KEY).await.unwrap().is_none());

        repo.save_manual_pages(&pages[..1]).await.unwrap();
        assert_eq!(repo.get_manual_pages().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn history_appends_and_filters_by_user() {
        let repo = InMemoryRepository::new();
        repo.append_game_result(&record("Aino", 4)).await.unwrap();
        repo.append_game_result(&record("Eero", 2)).await.unwrap();
        repo.append_game_result(&record("Aino", 5)).await.unwrap();

        assert_eq!(repo.get_history().await.unwrap().len(), 3);
        let aino = repo.get_user_history("Aino").await.unwrap();
        assert_eq!(aino.iter().map(|h| h.score).collect::<Vec<_>>(), vec![4, 5]);
        assert!(repo.get_user_history("aino").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_user_ignores_case_duplicates() {
        let repo = InMemoryRepository::new();
        assert!(repo.add_user("Aino").await.unwrap());
        assert!(!repo.add_user("AINO").await.unwrap());
        assert!(repo.add_user("Eero").await.unwrap());
        assert_eq!(repo.list_users().await.unwrap(), vec!["Aino", "Eero"]);
    }

    #[tokio::test]
    async fn avatar_defaults_until_saved() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get_user_avatar("Aino").await.unwrap(), DEFAULT_AVATAR);
        repo.save_user_avatar("Aino", "bird").await.unwrap();
        assert_eq!(repo.get_user_avatar("Aino").await.unwrap(), "bird");
        assert_eq!(repo.get_user_avatar("Eero").await.unwrap(), DEFAULT_AVATAR);
    }

    #[tokio::test]
    async fn import_replaces_only_present_sections() {
        let repo = InMemoryRepository::new();
        repo.add_user("Aino").await.unwrap();
        repo.append_game_result(&record("Aino", 4)).await.unwrap();

        let blob = DataBlob {
            users: Some(vec!["Eero".into()]),
            ..DataBlob::default()
        };
        repo.import_all(&blob).await.unwrap();

        assert_eq!(repo.list_users().await.unwrap(), vec!["Eero"]);
        assert_eq!(repo.get_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn export_then_import_into_fresh_store() {
        let source = InMemoryRepository::new();
        source.add_user("Aino").await.unwrap();
        source.save_user_avatar("Aino", "cat").await.unwrap();
        source.append_game_result(&record("Aino", 5)).await.unwrap();
        let blob = source.export_all().await.unwrap();

        let target = InMemoryRepository::new();
        target.import_all(&blob).await.unwrap();
        assert_eq!(target.export_all().await.unwrap(), blob);
        assert_eq!(target.get_user_avatar("Aino").await.unwrap(), "cat");
    }

    #[tokio::test]
    async fn corrupt_section_is_a_serialization_error() {
        let repo = InMemoryRepository::new();
        repo.set(HISTORY_KEY, "{not json").await.unwrap();
        let err = repo.get_history().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(msg) if msg.starts_with(HISTORY_KEY)));
    }
}
