// src/models/response.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One finalized answer, written once and never updated.
///
/// `question_text` is a snapshot taken at submission time so the record
/// stays meaningful after the question is edited or removed from the bank.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub candidate_name: String,
    pub candidate_email: String,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub question_id: i64,
    pub question_text: String,
    pub answer_text: String,
}

/// A row of the 'responses' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredResponse {
    pub id: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: ResponseRecord,
}

/// Aggregated view of one submission event.
/// Represents rows of `responses` grouped by candidate email and submission time.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubmissionSummary {
    pub candidate_name: String,
    pub candidate_email: String,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub question_count: i64,
    pub answered_count: i64,
}

/// Filter for the raw response listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseQuery {
    pub email: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentSubmissionsQuery {
    pub limit: Option<i64>,
}

/// Body pushed to the external sink for each answer.
#[derive(Debug, Serialize)]
pub struct SinkPayload<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub question_id: i64,
    pub question_text: &'a str,
    pub answer: &'a str,
}

impl<'a> From<&'a ResponseRecord> for SinkPayload<'a> {
    fn from(record: &'a ResponseRecord) -> Self {
        Self {
            name: &record.candidate_name,
            email: &record.candidate_email,
            question_id: record.question_id,
            question_text: &record.question_text,
            answer: &record.answer_text,
        }
    }
}
