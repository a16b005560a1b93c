use serde::{Deserialize, Serialize};

use crate::model::callsign::Callsign;
use crate::model::ids::{CategoryId, OptionId, PageId, RankId, VariantId};

/// Placeholder replaced with the trainee's callsign in scenario, option and
/// feedback texts.
pub const CALLSIGN_PLACEHOLDER: &str = "{CALLSIGN}";

/// Replace every `{CALLSIGN}` occurrence in `text`.
#[must_use]
pub fn render_text(text: &str, callsign: &Callsign) -> String {
    text.replace(CALLSIGN_PLACEHOLDER, callsign.as_str())
}

//
// ─── MANUAL ────────────────────────────────────────────────────────────────────
//

/// One lesson page of the training manual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualPage {
    pub id: PageId,
    pub title: String,
    #[serde(rename = "icon")]
    pub icon_ref: String,
    pub content: String,
    pub required_rank_id: RankId,
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    /// Pick one of several options; exactly one is correct.
    MultipleChoice,
    /// Hold-then-release push-to-talk gesture; the single option is the
    /// feedback for a well-timed transmission.
    PttTiming,
}

/// A selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
    pub is_correct: bool,
    pub feedback: String,
}

/// One interchangeable phrasing of a category's learning objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionVariant {
    pub id: VariantId,
    pub scenario: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub options: Vec<AnswerOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ptt_instruction: Option<String>,
}

impl QuestionVariant {
    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|o| &o.id == id)
    }

    #[must_use]
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.is_correct)
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.is_correct).count()
    }
}

/// A learning objective grouping interchangeable variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCategory {
    pub id: CategoryId,
    pub title: String,
    pub required_rank_id: RankId,
    pub variants: Vec<QuestionVariant>,
}

//
// ─── SESSION PROJECTION ────────────────────────────────────────────────────────
//

/// Variant sampled for one session, tagged with its category.
///
/// Runtime only; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuestion {
    pub category_id: CategoryId,
    pub category_title: String,
    pub variant: QuestionVariant,
}

impl SessionQuestion {
    #[must_use]
    pub fn new(category: &QuestionCategory, variant: QuestionVariant) -> Self {
        Self {
            category_id: category.id.clone(),
            category_title: category.title.clone(),
            variant,
        }
    }

    #[must_use]
    pub fn kind(&self) -> QuestionType {
        self.variant.kind
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.variant.options
    }

    /// Scenario text with the callsign filled in.
    #[must_use]
    pub fn render_scenario(&self, callsign: &Callsign) -> String {
        render_text(&self.variant.scenario, callsign)
    }

    /// Option texts with the callsign filled in, in authored order.
    #[must_use]
    pub fn render_options(&self, callsign: &Callsign) -> Vec<(OptionId, String)> {
        self.variant
            .options
            .iter()
            .map(|o| (o.id.clone(), render_text(&o.text, callsign)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARIANT_JSON: &str = r#"{
        "id": "ptt_basic",
        "scenario": "You want to talk, {CALLSIGN}.",
        "type": "PTT_TIMING",
        "pttInstruction": "Press, wait for the light, then speak.",
        "options": [
            { "id": "a", "text": "Base, this is {CALLSIGN}.", "isCorrect": true, "feedback": "Nice." }
        ]
    }"#;

    #[test]
    fn variant_reads_camel_case_wire_shape() {
        let variant: QuestionVariant = serde_json::from_str(VARIANT_JSON).unwrap();
        assert_eq!(variant.kind, QuestionType::PttTiming);
        assert_eq!(variant.correct_count(), 1);
        assert_eq!(
            variant.ptt_instruction.as_deref(),
            Some("Press, wait for the light, then speak.")
        );
    }

    #[test]
    fn question_type_uses_screaming_case() {
        let json = serde_json::to_string(&QuestionType::MultipleChoice).unwrap();
        assert_eq!(json, "\"MULTIPLE_CHOICE\"");
    }

    #[test]
    fn render_replaces_every_placeholder() {
        let callsign = Callsign::new("Haukka").unwrap();
        assert_eq!(
            render_text("{CALLSIGN}, {CALLSIGN} here", &callsign),
            "Haukka, Haukka here"
        );
    }

    #[test]
    fn session_question_renders_options() {
        let variant: QuestionVariant = serde_json::from_str(VARIANT_JSON).unwrap();
        let category = QuestionCategory {
            id: CategoryId::new("PROTO"),
            title: "PROTOCOL".into(),
            required_rank_id: RankId::new("R0"),
            variants: vec![variant.clone()],
        };
        let question = SessionQuestion::new(&category, variant);
        let callsign = Callsign::new("Susi").unwrap();

        assert_eq!(question.category_title, "PROTOCOL");
        assert_eq!(question.render_scenario(&callsign), "You want to talk, Susi.");
        assert_eq!(
            question.render_options(&callsign),
            vec![(OptionId::new("a"), "Base, this is Susi.".to_string())]
        );
    }
}
