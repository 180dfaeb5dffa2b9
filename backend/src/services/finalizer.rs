// src/services/finalizer.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{response::ResponseRecord, session::Session},
    services::sink::{self, ResponseSink},
    store::ResponseStore,
};

/// One record per selected question, in selection order, all stamped with
/// the same `submitted_at`. Unanswered questions get an empty answer.
pub fn build_records(session: &Session, submitted_at: DateTime<Utc>) -> Vec<ResponseRecord> {
    let candidate = session.candidate();
    session
        .selected_questions()
        .iter()
        .map(|q| ResponseRecord {
            candidate_name: candidate.name.clone(),
            candidate_email: candidate.email.clone(),
            started_at: session.started_at(),
            submitted_at,
            question_id: q.id,
            question_text: q.text.clone(),
            answer_text: session.answer_for(q.id).to_string(),
        })
        .collect()
}

/// Turns submitted sessions into durable response records.
///
/// Not deduplicating: calling `finalize` twice for one session writes the
/// batch twice. Callers drop the session after the first success.
#[derive(Clone)]
pub struct Finalizer {
    responses: ResponseStore,
    sink: Option<Arc<dyn ResponseSink>>,
}

impl Finalizer {
    pub fn new(responses: ResponseStore, sink: Option<Arc<dyn ResponseSink>>) -> Self {
        Self { responses, sink }
    }

    pub fn responses(&self) -> &ResponseStore {
        &self.responses
    }

    /// Appends the session's records, then hands a copy to the sink in the
    /// background.
    ///
    /// Fails with `Storage` if the append does not commit; nothing is
    /// written in that case, so the call can be retried.
    pub async fn finalize(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<ResponseRecord>, AppError> {
        if !session.is_submitted() {
            return Err(AppError::InternalServerError(format!(
                "Session {} finalized before submission",
                session.id()
            )));
        }

        let records = build_records(session, now);
        self.responses.append(&records).await?;

        tracing::info!(
            "Session {} finalized for {}: {} responses stored",
            session.id(),
            session.candidate().email,
            records.len()
        );

        if let Some(target) = &self.sink {
            let target = Arc::clone(target);
            let batch = records.clone();
            tokio::spawn(async move {
                let delivered = sink::deliver(target.as_ref(), &batch).await;
                if delivered < batch.len() {
                    tracing::warn!(
                        "Sink accepted {} of {} responses",
                        delivered,
                        batch.len()
                    );
                }
            });
        }

        Ok(records)
    }
}
