//! Admin terminal: trainee statistics and raw database access.
//!
//! Everything written through here is validated in full before the first
//! byte reaches storage, so a rejected import leaves the store untouched.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use radio_core::model::{GameHistoryRecord, QuestionCategory, RankLadder, validate_categories};
use storage::Storage;
use storage::repository::{
    BackupRepository, ContentRepository, DataBlob, HistoryRepository, UserRepository,
};

use crate::error::AdminError;

/// Shared passphrase that opens the admin terminal from the login screen.
pub const ADMIN_PASSPHRASE: &str = "crimescene";

/// Environment override for [`ADMIN_PASSPHRASE`].
pub const ADMIN_PASSPHRASE_ENV: &str = "RADIO_ADMIN_PASSPHRASE";

/// Recognizes the admin passphrase when typed as a user name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminGate {
    passphrase: String,
}

impl Default for AdminGate {
    fn default() -> Self {
        Self::new(ADMIN_PASSPHRASE)
    }
}

impl AdminGate {
    #[must_use]
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into().trim().to_lowercase(),
        }
    }

    /// Built-in passphrase unless `RADIO_ADMIN_PASSPHRASE` is set and non-blank.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(ADMIN_PASSPHRASE_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(Self::default, Self::new)
    }

    /// Case-insensitive match.
    #[must_use]
    pub fn is_admin(&self, name: &str) -> bool {
        name.trim().to_lowercase() == self.passphrase
    }
}

//
// ─── STATISTICS ────────────────────────────────────────────────────────────────
//

/// Dashboard row for one trainee.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub name: String,
    pub total_games: u32,
    pub passed_games: u32,
    /// Mean raw score per session; 0 when nothing was played.
    pub avg_score: f64,
    pub last_played: Option<DateTime<Utc>>,
    /// Most used callsign; first to reach the top count wins ties.
    pub favorite_callsign: Option<String>,
}

fn stats_for(name: &str, history: &[GameHistoryRecord]) -> UserStats {
    let games: Vec<&GameHistoryRecord> = history.iter().filter(|h| h.user == name).collect();
    let total_games = u32::try_from(games.len()).unwrap_or(u32::MAX);
    let passed_games = u32::try_from(games.iter().filter(|g| g.passed).count()).unwrap_or(u32::MAX);

    let avg_score = if games.is_empty() {
        0.0
    } else {
        let sum: u64 = games.iter().map(|g| u64::from(g.score)).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg = sum as f64 / games.len() as f64;
        avg
    };

    // Insertion-ordered tally.
    let mut counts: Vec<(&str, u32)> = Vec::new();
    for game in &games {
        if game.callsign.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(sign, _)| *sign == game.callsign) {
            Some((_, count)) => *count += 1,
            None => counts.push((game.callsign.as_str(), 1)),
        }
    }
    let mut favorite: Option<(&str, u32)> = None;
    for (sign, count) in counts {
        if favorite.is_none_or(|(_, best)| count > best) {
            favorite = Some((sign, count));
        }
    }

    UserStats {
        name: name.to_owned(),
        total_games,
        passed_games,
        avg_score,
        last_played: games.iter().map(|g| g.timestamp).max(),
        favorite_callsign: favorite.map(|(sign, _)| sign.to_owned()),
    }
}

/// Statistics for every visible trainee, most recently active first.
///
/// Trainees who never played sort last, in registry order.
#[must_use]
pub fn compute_user_stats(
    gate: &AdminGate,
    users: &[String],
    history: &[GameHistoryRecord],
) -> Vec<UserStats> {
    let mut stats: Vec<UserStats> = users
        .iter()
        .filter(|name| !gate.is_admin(name))
        .map(|name| stats_for(name, history))
        .collect();
    stats.sort_by(|a, b| b.last_played.cmp(&a.last_played));
    stats
}

/// Section counts of an accepted import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub users: Option<usize>,
    pub history: Option<usize>,
    pub questions: Option<usize>,
    pub avatars: Option<usize>,
}

//
// ─── PARSING ───────────────────────────────────────────────────────────────────
//

fn invalid(reason: impl Into<String>) -> AdminError {
    AdminError::InvalidImport(reason.into())
}

fn parse_json(raw: &str) -> Result<Value, AdminError> {
    serde_json::from_str(raw).map_err(|e| invalid(format!("malformed JSON: {e}")))
}

fn parse_array<T: DeserializeOwned>(section: &str, value: Value) -> Result<Vec<T>, AdminError> {
    if !value.is_array() {
        return Err(invalid(format!("{section} must be an array")));
    }
    serde_json::from_value(value).map_err(|e| invalid(format!("{section}: {e}")))
}

fn check_user_names(names: &[String]) -> Result<(), AdminError> {
    if names.iter().any(|name| name.trim().is_empty()) {
        return Err(invalid("users must not contain blank names"));
    }
    Ok(())
}

fn parse_blob(raw: &str, ranks: &RankLadder) -> Result<DataBlob, AdminError> {
    let Value::Object(mut sections) = parse_json(raw)? else {
        return Err(invalid("backup must be a JSON object"));
    };

    let mut blob = DataBlob::default();
    if let Some(value) = sections.remove("users").filter(|v| !v.is_null()) {
        let users: Vec<String> = parse_array("users", value)?;
        check_user_names(&users)?;
        blob.users = Some(users);
    }
    if let Some(value) = sections.remove("history").filter(|v| !v.is_null()) {
        let history: Vec<GameHistoryRecord> = parse_array("history", value)?;
        for record in &history {
            record.validate()?;
        }
        blob.history = Some(history);
    }
    if let Some(value) = sections.remove("questions").filter(|v| !v.is_null()) {
        let questions: Vec<QuestionCategory> = parse_array("questions", value)?;
        validate_categories(ranks, &questions)?;
        blob.questions = Some(questions);
    }
    if let Some(value) = sections.remove("avatars").filter(|v| !v.is_null()) {
        if !value.is_object() {
            return Err(invalid("avatars must be an object"));
        }
        let avatars = serde_json::from_value(value).map_err(|e| invalid(format!("avatars: {e}")))?;
        blob.avatars = Some(avatars);
    }
    Ok(blob)
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

#[derive(Clone)]
pub struct AdminService {
    gate: AdminGate,
    ranks: RankLadder,
    content: Arc<dyn ContentRepository>,
    history: Arc<dyn HistoryRepository>,
    users: Arc<dyn UserRepository>,
    backup: Arc<dyn BackupRepository>,
}

impl AdminService {
    #[must_use]
    pub fn new(gate: AdminGate, storage: &Storage) -> Self {
        Self {
            gate,
            ranks: RankLadder::standard(),
            content: Arc::clone(&storage.content),
            history: Arc::clone(&storage.history),
            users: Arc::clone(&storage.users),
            backup: Arc::clone(&storage.backup),
        }
    }

    #[must_use]
    pub fn with_ranks(mut self, ranks: RankLadder) -> Self {
        self.ranks = ranks;
        self
    }

    #[must_use]
    pub fn gate(&self) -> &AdminGate {
        &self.gate
    }

    /// Dashboard rows, see [`compute_user_stats`].
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if users or history cannot be read.
    pub async fn user_stats(&self) -> Result<Vec<UserStats>, AdminError> {
        let users = self.users.list_users().await?;
        let history = self.history.get_history().await?;
        Ok(compute_user_stats(&self.gate, &users, &history))
    }

    /// Full backup as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `AdminError` on storage or encoding failures.
    pub async fn export_json(&self) -> Result<String, AdminError> {
        let blob = self.backup.export_all().await?;
        let json = serde_json::to_string_pretty(&blob)?;
        tracing::info!(bytes = json.len(), "backup exported");
        Ok(json)
    }

    /// Restore a backup produced by [`AdminService::export_json`].
    ///
    /// Sections missing from the document are left as they are; present ones
    /// replace the stored value. All sections are committed together.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidImport` for malformed documents,
    /// `AdminError::Content` or `AdminError::History` for entries that fail
    /// validation, and `AdminError::Storage` if the commit fails.
    pub async fn import_json(&self, raw: &str) -> Result<ImportSummary, AdminError> {
        let blob = match parse_blob(raw, &self.ranks) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!(error = %err, "backup rejected");
                return Err(err);
            }
        };
        let summary = ImportSummary {
            users: blob.users.as_ref().map(Vec::len),
            history: blob.history.as_ref().map(Vec::len),
            questions: blob.questions.as_ref().map(Vec::len),
            avatars: blob.avatars.as_ref().map(|a| a.len()),
        };
        self.backup.import_all(&blob).await?;
        tracing::info!(?summary, "backup imported");
        Ok(summary)
    }

    /// # Errors
    ///
    /// Returns `AdminError` on storage or encoding failures.
    pub async fn question_bank_json(&self) -> Result<String, AdminError> {
        let bank = self.content.get_question_bank().await?;
        Ok(serde_json::to_string_pretty(&bank)?)
    }

    /// Replace the question bank with a JSON array of categories.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidImport` unless `raw` is an array of
    /// categories, or `AdminError::Content` if the bank is inconsistent.
    pub async fn save_question_bank_json(&self, raw: &str) -> Result<usize, AdminError> {
        let categories: Vec<QuestionCategory> = parse_array("questions", parse_json(raw)?)?;
        validate_categories(&self.ranks, &categories)?;
        self.content.save_question_bank(&categories).await?;
        tracing::info!(categories = categories.len(), "question bank replaced");
        Ok(categories.len())
    }

    /// # Errors
    ///
    /// Returns `AdminError` on storage or encoding failures.
    pub async fn users_json(&self) -> Result<String, AdminError> {
        let users = self.users.list_users().await?;
        Ok(serde_json::to_string_pretty(&users)?)
    }

    /// Replace the user registry with a JSON array of names.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidImport` unless `raw` is an array of
    /// non-blank strings.
    pub async fn save_users_json(&self, raw: &str) -> Result<usize, AdminError> {
        let users: Vec<String> = parse_array("users", parse_json(raw)?)?;
        check_user_names(&users)?;
        self.users.save_users(&users).await?;
        tracing::info!(users = users.len(), "user list replaced");
        Ok(users.len())
    }
}
