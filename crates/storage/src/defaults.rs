//! Content bundled with the binary and used until an admin replaces it.

use radio_core::model::{ManualPage, QuestionCategory};

use crate::repository::StorageError;

const QUESTIONS_JSON: &str = include_str!("../assets/questions.json");
const MANUAL_JSON: &str = include_str!("../assets/manual.json");
const FACTS_JSON: &str = include_str!("../assets/facts.json");

/// Default question bank.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the bundled asset is malformed.
pub fn question_bank() -> Result<Vec<QuestionCategory>, StorageError> {
    serde_json::from_str(QUESTIONS_JSON)
        .map_err(|e| StorageError::Serialization(format!("bundled questions: {e}")))
}

/// Default manual pages.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the bundled asset is malformed.
pub fn manual_pages() -> Result<Vec<ManualPage>, StorageError> {
    serde_json::from_str(MANUAL_JSON)
        .map_err(|e| StorageError::Serialization(format!("bundled manual: {e}")))
}

/// Trivia shown beside the manual.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the bundled asset is malformed.
pub fn radio_facts() -> Result<Vec<String>, StorageError> {
    serde_json::from_str(FACTS_JSON)
        .map_err(|e| StorageError::Serialization(format!("bundled facts: {e}")))
}
