// src/models/session.rs

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::Question,
    utils::timer,
};

/// Lifecycle of a candidate attempt.
///
/// A session that has not been started yet has no value at all: `start`
/// is the only constructor and yields `InProgress`. `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    fn delta(self) -> isize {
        match self {
            Direction::Previous => -1,
            Direction::Next => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub email: String,
}

/// One candidate attempt.
///
/// The selected questions are cloned out of the bank at start, so later
/// edits to the bank or the active set never reach a running session.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    candidate: Candidate,
    selected_questions: Vec<Question>,
    current_index: usize,
    answers: HashMap<i64, String>,
    flagged: BTreeSet<i64>,
    started_at: DateTime<Utc>,
    duration_minutes: u32,
    status: SessionStatus,
    forced_by_deadline: bool,
}

impl Session {
    /// Starts an attempt by sampling `requested_count` questions from `pool`.
    pub fn start(
        candidate: Candidate,
        pool: Vec<Question>,
        requested_count: usize,
        duration_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        Self::start_with_rng(
            candidate,
            pool,
            requested_count,
            duration_minutes,
            now,
            &mut rand::rng(),
        )
    }

    /// Same as [`Session::start`] with an explicit randomness source.
    ///
    /// The count is clamped to `[1, pool.len()]` and the sample is a uniform
    /// draw without replacement, in random order.
    pub fn start_with_rng<R: Rng + ?Sized>(
        candidate: Candidate,
        mut pool: Vec<Question>,
        requested_count: usize,
        duration_minutes: u32,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Self, AppError> {
        let name = candidate.name.trim();
        let email = candidate.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(AppError::Validation(
                "Please enter name and email before starting.".to_string(),
            ));
        }
        if duration_minutes == 0 {
            return Err(AppError::Validation(
                "Duration must be at least one minute".to_string(),
            ));
        }
        if pool.is_empty() {
            return Err(AppError::EmptyPool);
        }

        let count = requested_count.clamp(1, pool.len());
        let (picked, _) = pool.partial_shuffle(rng, count);
        let selected_questions = picked.to_vec();

        Ok(Self {
            id: Uuid::new_v4(),
            candidate: Candidate {
                name: name.to_string(),
                email: email.to_string(),
            },
            selected_questions,
            current_index: 0,
            answers: HashMap::new(),
            flagged: BTreeSet::new(),
            started_at: now,
            duration_minutes,
            status: SessionStatus::InProgress,
            forced_by_deadline: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn selected_questions(&self) -> &[Question] {
        &self.selected_questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.selected_questions[self.current_index]
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn duration(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.duration_minutes))
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_submitted(&self) -> bool {
        self.status == SessionStatus::Submitted
    }

    /// True when the deadline, not the candidate, ended the attempt.
    pub fn forced_by_deadline(&self) -> bool {
        self.forced_by_deadline
    }

    /// Stored answer for `question_id`; unanswered reads as "".
    pub fn answer_for(&self, question_id: i64) -> &str {
        self.answers.get(&question_id).map(String::as_str).unwrap_or("")
    }

    /// Questions the candidate marked for review. Never persisted.
    pub fn flagged(&self) -> &BTreeSet<i64> {
        &self.flagged
    }

    /// Time left at `now`. Pure; never changes the session.
    pub fn check_deadline(&self, now: DateTime<Utc>) -> TimeDelta {
        timer::remaining(self.started_at, self.duration(), now)
    }

    /// Forces submission once the deadline has passed.
    ///
    /// Returns true only for the call that performed the transition.
    pub fn poll_deadline(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != SessionStatus::InProgress {
            return false;
        }
        if !timer::is_expired(self.check_deadline(now)) {
            return false;
        }
        tracing::warn!(
            "Session {} ran out of time, submitting automatically",
            self.id
        );
        self.forced_by_deadline = true;
        self.request_submit()
    }

    pub fn record_answer(
        &mut self,
        question_id: i64,
        text: String,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.ensure_open(now)?;
        self.ensure_selected(question_id)?;
        self.answers.insert(question_id, text);
        Ok(())
    }

    /// Marks or unmarks a selected question for review.
    pub fn set_flag(
        &mut self,
        question_id: i64,
        flagged: bool,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.ensure_open(now)?;
        self.ensure_selected(question_id)?;
        if flagged {
            self.flagged.insert(question_id);
        } else {
            self.flagged.remove(&question_id);
        }
        Ok(())
    }

    /// Moves one question back or forth; stepping past either end is a no-op.
    pub fn navigate(&mut self, direction: Direction, now: DateTime<Utc>) -> Result<usize, AppError> {
        self.ensure_open(now)?;
        let last = self.selected_questions.len() - 1;
        self.current_index = self
            .current_index
            .saturating_add_signed(direction.delta())
            .min(last);
        Ok(self.current_index)
    }

    /// Returns true if this call moved the session to `Submitted`.
    pub fn request_submit(&mut self) -> bool {
        if self.status == SessionStatus::Submitted {
            return false;
        }
        self.status = SessionStatus::Submitted;
        true
    }

    fn ensure_open(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.status == SessionStatus::Submitted {
            return Err(AppError::SessionClosed(
                "This test has already been submitted".to_string(),
            ));
        }
        if timer::is_expired(self.check_deadline(now)) {
            return Err(AppError::SessionClosed("Time is up".to_string()));
        }
        Ok(())
    }

    fn ensure_selected(&self, question_id: i64) -> Result<(), AppError> {
        if self.selected_questions.iter().any(|q| q.id == question_id) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Question {} is not part of this test",
                question_id
            )))
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> SessionView {
        let question = self.current_question().clone();
        let left = self.check_deadline(now);
        SessionView {
            token: self.id,
            candidate_name: self.candidate.name.clone(),
            candidate_email: self.candidate.email.clone(),
            index: self.current_index,
            total: self.selected_questions.len(),
            answer: self.answer_for(question.id).to_string(),
            flagged: self.flagged.contains(&question.id),
            flagged_ids: self.flagged.clone(),
            question,
            started_at: self.started_at,
            duration_minutes: self.duration_minutes,
            remaining_seconds: timer::remaining_seconds(left),
            remaining: timer::format_countdown(left),
        }
    }
}

/// What the candidate sees while the attempt is running.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub token: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub index: usize,
    pub total: usize,
    pub question: Question,
    pub answer: String,
    /// Whether the current question is marked for review.
    pub flagged: bool,
    pub flagged_ids: BTreeSet<i64>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub remaining_seconds: i64,
    pub remaining: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub token: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub record_count: usize,
    pub forced_by_deadline: bool,
    pub message: String,
}

/// Result of any candidate interaction.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionOutcome {
    InProgress(SessionView),
    Submitted(SubmissionReceipt),
}

/// DTO for the start form.
#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(length(min = 1, max = 200, message = "Please enter your full name."))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email."))]
    pub email: String,
    pub question_count: Option<usize>,
    #[validate(range(min = 1, max = 240))]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RecordAnswerRequest {
    pub question_id: i64,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub question_id: i64,
    #[serde(default = "default_flag")]
    pub flagged: bool,
}

fn default_flag() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub token: Uuid,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct PoolInfo {
    pub pool_size: usize,
    pub default_question_count: usize,
    pub default_duration_minutes: u32,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::models::question::QuestionType;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn bank(n: i64) -> Vec<Question> {
        (1..=n)
            .map(|id| Question {
                id,
                text: format!("Question {}", id),
                question_type: QuestionType::Text,
                options: None,
                category: None,
            })
            .collect()
    }

    fn candidate() -> Candidate {
        Candidate {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
        }
    }

    fn started(pool: i64, count: usize) -> Session {
        Session::start(candidate(), bank(pool), count, 10, t0()).unwrap()
    }

    #[test]
    fn start_samples_distinct_questions_from_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        for requested in 1..=12 {
            let session =
                Session::start_with_rng(candidate(), bank(8), requested, 10, t0(), &mut rng).unwrap();
            let ids: HashSet<i64> = session.selected_questions().iter().map(|q| q.id).collect();
            assert_eq!(session.selected_questions().len(), requested.clamp(1, 8));
            assert_eq!(ids.len(), session.selected_questions().len());
            assert!(ids.iter().all(|id| (1..=8).contains(id)));
            assert_eq!(session.status(), SessionStatus::InProgress);
            assert_eq!(session.started_at(), t0());
        }
    }

    #[test]
    fn start_clamps_oversized_request() {
        let session = started(3, 5);
        assert_eq!(session.selected_questions().len(), 3);
    }

    #[test]
    fn start_clamps_zero_request_to_one() {
        let session = started(3, 0);
        assert_eq!(session.selected_questions().len(), 1);
    }

    #[test]
    fn start_with_empty_pool_fails() {
        let err = Session::start(candidate(), Vec::new(), 5, 10, t0()).unwrap_err();
        assert!(matches!(err, AppError::EmptyPool));
    }

    #[test]
    fn start_requires_name_and_email() {
        let blank = Candidate {
            name: "  ".to_string(),
            email: "a@x.com".to_string(),
        };
        let err = Session::start(blank, bank(3), 2, 10, t0()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let no_email = Candidate {
            name: "A".to_string(),
            email: String::new(),
        };
        let err = Session::start(no_email, bank(3), 2, 10, t0()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn sampling_is_not_fixed_across_starts() {
        let orders: HashSet<Vec<i64>> = (0..30)
            .map(|_| {
                started(20, 5)
                    .selected_questions()
                    .iter()
                    .map(|q| q.id)
                    .collect()
            })
            .collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn navigation_is_clamped_at_both_ends() {
        let mut session = started(3, 3);
        assert_eq!(session.navigate(Direction::Previous, t0()).unwrap(), 0);
        assert_eq!(session.navigate(Direction::Next, t0()).unwrap(), 1);
        assert_eq!(session.navigate(Direction::Next, t0()).unwrap(), 2);
        assert_eq!(session.navigate(Direction::Next, t0()).unwrap(), 2);
        assert_eq!(session.navigate(Direction::Previous, t0()).unwrap(), 1);
    }

    #[test]
    fn navigation_never_reorders_selection() {
        let mut session = started(10, 6);
        let before: Vec<i64> = session.selected_questions().iter().map(|q| q.id).collect();
        for direction in [Direction::Next, Direction::Next, Direction::Previous, Direction::Next] {
            session.navigate(direction, t0()).unwrap();
            let _ = session.view(t0());
        }
        let after: Vec<i64> = session.selected_questions().iter().map(|q| q.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn answer_survives_navigating_away_and_back() {
        let mut session = started(3, 3);
        let first = session.current_question().id;
        session
            .record_answer(first, "  exact text\n".to_string(), t0())
            .unwrap();
        session.navigate(Direction::Next, t0()).unwrap();
        session.navigate(Direction::Previous, t0()).unwrap();
        assert_eq!(session.view(t0()).answer, "  exact text\n");
    }

    #[test]
    fn record_answer_upserts_and_accepts_empty() {
        let mut session = started(3, 3);
        let id = session.current_question().id;
        session.record_answer(id, "first".to_string(), t0()).unwrap();
        session.record_answer(id, String::new(), t0()).unwrap();
        assert_eq!(session.answer_for(id), "");
    }

    #[test]
    fn record_answer_rejects_foreign_question() {
        let mut session = started(3, 1);
        let foreign = (1..=3)
            .find(|id| session.selected_questions()[0].id != *id)
            .unwrap();
        let err = session
            .record_answer(foreign, "x".to_string(), t0())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn flags_follow_the_question_and_can_be_cleared() {
        let mut session = started(3, 3);
        let first = session.current_question().id;
        session.set_flag(first, true, t0()).unwrap();
        assert!(session.view(t0()).flagged);

        session.navigate(Direction::Next, t0()).unwrap();
        let view = session.view(t0());
        assert!(!view.flagged);
        assert_eq!(view.flagged_ids, BTreeSet::from([first]));

        session.set_flag(first, false, t0()).unwrap();
        assert!(session.flagged().is_empty());
    }

    #[test]
    fn flagging_a_foreign_or_closed_question_is_rejected() {
        let mut session = started(3, 1);
        let foreign = (1..=3)
            .find(|id| session.selected_questions()[0].id != *id)
            .unwrap();
        assert!(matches!(
            session.set_flag(foreign, true, t0()),
            Err(AppError::Validation(_))
        ));

        let id = session.current_question().id;
        session.request_submit();
        assert!(matches!(
            session.set_flag(id, true, t0()),
            Err(AppError::SessionClosed(_))
        ));
    }

    #[test]
    fn request_submit_transitions_once() {
        let mut session = started(3, 2);
        assert!(session.request_submit());
        assert!(!session.request_submit());
        assert!(session.is_submitted());
        assert!(!session.forced_by_deadline());
    }

    #[test]
    fn operations_are_rejected_after_submit() {
        let mut session = started(3, 2);
        session.request_submit();
        let id = session.current_question().id;
        assert!(matches!(
            session.record_answer(id, "late".to_string(), t0()),
            Err(AppError::SessionClosed(_))
        ));
        assert!(matches!(
            session.navigate(Direction::Next, t0()),
            Err(AppError::SessionClosed(_))
        ));
    }

    #[test]
    fn deadline_forces_a_single_submit_and_keeps_answers() {
        let mut session = started(3, 2);
        let id = session.current_question().id;
        session.record_answer(id, "before".to_string(), t0()).unwrap();

        let before_deadline = t0() + TimeDelta::minutes(9);
        assert!(!session.poll_deadline(before_deadline));

        let after_deadline = t0() + TimeDelta::minutes(10);
        assert!(matches!(
            session.record_answer(id, "after".to_string(), after_deadline),
            Err(AppError::SessionClosed(_))
        ));
        assert!(session.poll_deadline(after_deadline));
        assert!(!session.poll_deadline(after_deadline + TimeDelta::seconds(5)));
        assert!(session.forced_by_deadline());
        assert_eq!(session.answer_for(id), "before");
    }

    #[test]
    fn view_reports_countdown() {
        let session = started(3, 2);
        let view = session.view(t0() + TimeDelta::seconds(30));
        assert_eq!(view.total, 2);
        assert_eq!(view.index, 0);
        assert_eq!(view.remaining_seconds, 570);
        assert_eq!(view.remaining, "00:09:30");
    }
}
