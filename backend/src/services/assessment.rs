// src/services/assessment.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    config::{DEFAULT_DURATION_MINUTES, DEFAULT_QUESTION_COUNT},
    error::AppError,
    models::session::{
        Candidate, Direction, PoolInfo, Session, SessionOutcome, SessionView, SubmissionReceipt,
    },
    services::finalizer::Finalizer,
    store::{QuestionStore, SessionStore, session_store::SessionSlot},
};

/// Drives candidate attempts from start to stored responses.
///
/// Every interaction polls the deadline first; a session whose time ran out
/// is submitted, the requested change is dropped, and the session is
/// finalized in the same call.
#[derive(Clone)]
pub struct AssessmentService {
    questions: QuestionStore,
    sessions: SessionStore,
    finalizer: Finalizer,
}

impl AssessmentService {
    pub fn new(questions: QuestionStore, sessions: SessionStore, finalizer: Finalizer) -> Self {
        Self {
            questions,
            sessions,
            finalizer,
        }
    }

    pub fn questions(&self) -> &QuestionStore {
        &self.questions
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn finalizer(&self) -> &Finalizer {
        &self.finalizer
    }

    pub async fn pool_info(&self) -> PoolInfo {
        PoolInfo {
            pool_size: self.questions.effective_pool().await.len(),
            default_question_count: DEFAULT_QUESTION_COUNT,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    /// Samples questions from the effective pool and registers the session.
    pub async fn start(
        &self,
        candidate: Candidate,
        question_count: Option<usize>,
        duration_minutes: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<SessionView, AppError> {
        let pool = self.questions.effective_pool().await;
        let session = Session::start(
            candidate,
            pool,
            question_count.unwrap_or(DEFAULT_QUESTION_COUNT),
            duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            now,
        )?;

        tracing::info!(
            "Session {} started for {} with {} questions",
            session.id(),
            session.candidate().email,
            session.selected_questions().len()
        );

        let view = session.view(now);
        self.sessions.insert(session).await;
        Ok(view)
    }

    /// Current state of the attempt; also the polling tick for the deadline.
    pub async fn view(&self, token: Uuid, now: DateTime<Utc>) -> Result<SessionOutcome, AppError> {
        self.interact(token, now, |_| Ok(())).await
    }

    pub async fn record_answer(
        &self,
        token: Uuid,
        question_id: i64,
        answer: String,
        now: DateTime<Utc>,
    ) -> Result<SessionOutcome, AppError> {
        self.interact(token, now, |session| {
            session.record_answer(question_id, answer, now)
        })
        .await
    }

    pub async fn navigate(
        &self,
        token: Uuid,
        direction: Direction,
        now: DateTime<Utc>,
    ) -> Result<SessionOutcome, AppError> {
        self.interact(token, now, |session| session.navigate(direction, now).map(|_| ()))
            .await
    }

    /// Marks or unmarks a question for review.
    pub async fn flag(
        &self,
        token: Uuid,
        question_id: i64,
        flagged: bool,
        now: DateTime<Utc>,
    ) -> Result<SessionOutcome, AppError> {
        self.interact(token, now, |session| {
            session.set_flag(question_id, flagged, now)
        })
        .await
    }

    pub async fn submit(&self, token: Uuid, now: DateTime<Utc>) -> Result<SessionOutcome, AppError> {
        self.interact(token, now, |session| {
            session.request_submit();
            Ok(())
        })
        .await
    }

    /// Force-submits and finalizes every expired session nobody is polling.
    ///
    /// Sessions busy with a request are skipped; that request settles them.
    /// Returns how many sessions were finalized.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut finalized = 0;
        for (token, slot) in self.sessions.all().await {
            let Ok(mut guard) = slot.try_lock() else {
                continue;
            };
            let Some(session) = guard.as_mut() else {
                continue;
            };
            session.poll_deadline(now);
            if !session.is_submitted() {
                continue;
            }
            match self.settle(token, &mut guard, now).await {
                Ok(_) => finalized += 1,
                Err(e) => tracing::error!("Failed to finalize expired session {}: {}", token, e),
            }
        }
        finalized
    }

    async fn interact<F>(&self, token: Uuid, now: DateTime<Utc>, op: F) -> Result<SessionOutcome, AppError>
    where
        F: FnOnce(&mut Session) -> Result<(), AppError>,
    {
        let slot: SessionSlot = self
            .sessions
            .get(token)
            .await
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        let mut guard = slot.lock().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        session.poll_deadline(now);
        if !session.is_submitted() {
            op(session)?;
        }

        if session.is_submitted() {
            let receipt = self.settle(token, &mut guard, now).await?;
            return Ok(SessionOutcome::Submitted(receipt));
        }

        Ok(SessionOutcome::InProgress(session.view(now)))
    }

    /// Finalizes the submitted session held in `slot` and clears it.
    ///
    /// On failure the session stays registered and submitted, so the next
    /// interaction (or sweep) retries.
    async fn settle(
        &self,
        token: Uuid,
        slot: &mut Option<Session>,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, AppError> {
        let Some(session) = slot.as_ref() else {
            return Err(AppError::NotFound("Session not found".to_string()));
        };

        let records = self.finalizer.finalize(session, now).await?;
        let forced = session.forced_by_deadline();

        slot.take();
        self.sessions.remove(token).await;

        Ok(SubmissionReceipt {
            token,
            submitted_at: now,
            record_count: records.len(),
            forced_by_deadline: forced,
            message: if forced {
                "Time is up. Your answers were submitted automatically.".to_string()
            } else {
                "Test submitted. Thank you!".to_string()
            },
        })
    }
}
