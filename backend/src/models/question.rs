// src/models/question.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Answer widget a question is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Single line answer.
    Text,
    /// Multi-line free text.
    Longtext,
    /// Multi-line answer rendered in a monospace editor.
    Code,
    /// Multiple choice; the answer is one of `options`.
    Mcq,
}

/// One entry of the question bank file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub text: String,

    /// Mapped from the JSON key `type` since `type` is a reserved keyword in Rust.
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Choices for `mcq` questions; absent for every other type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Overlay restricting which bank entries are eligible for sampling.
///
/// An empty set means the whole bank is eligible. Ids that no longer exist
/// in the bank are ignored when the effective pool is computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSet {
    #[serde(default)]
    pub active_ids: BTreeSet<i64>,
}

impl ActiveSet {
    pub fn is_empty(&self) -> bool {
        self.active_ids.is_empty()
    }

    /// Returns the subset of `bank` this overlay selects, in bank order.
    pub fn filter<'a>(&self, bank: &'a [Question]) -> Vec<&'a Question> {
        if self.is_empty() {
            return bank.iter().collect();
        }
        bank.iter()
            .filter(|q| self.active_ids.contains(&q.id))
            .collect()
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(custom(function = validate_options))]
    pub options: Option<Vec<String>>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// DTO for replacing the active-set overlay.
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active_ids: BTreeSet<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuestionsQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64) -> Question {
        Question {
            id,
            text: format!("Question {}", id),
            question_type: QuestionType::Text,
            options: None,
            category: None,
        }
    }

    #[test]
    fn empty_active_set_selects_whole_bank() {
        let bank = vec![question(1), question(2)];
        let pool = ActiveSet::default().filter(&bank);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn stale_active_ids_are_excluded() {
        let bank = vec![question(1), question(2), question(3)];
        let active = ActiveSet {
            active_ids: [2, 3, 99].into_iter().collect(),
        };
        let ids: Vec<i64> = active.filter(&bank).iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn bank_entry_round_trips_type_key() {
        let raw = r#"{"id": 4, "text": "Pick one", "type": "mcq", "options": ["a", "b"]}"#;
        let q: Question = serde_json::from_str(raw).unwrap();
        assert_eq!(q.question_type, QuestionType::Mcq);
        assert_eq!(q.options.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));

        let encoded = serde_json::to_value(&q).unwrap();
        assert_eq!(encoded["type"], "mcq");
        assert!(encoded.get("category").is_none());
    }

    #[test]
    fn create_request_rejects_blank_option() {
        let req = CreateQuestionRequest {
            text: "Pick one".to_string(),
            question_type: QuestionType::Mcq,
            options: Some(vec!["a".to_string(), "  ".to_string()]),
            category: None,
        };
        assert!(req.validate().is_err());
    }
}
