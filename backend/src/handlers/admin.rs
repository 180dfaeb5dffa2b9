// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::RECENT_SUBMISSIONS_LIMIT,
    error::AppError,
    models::{
        question::{CreateQuestionRequest, ListQuestionsQuery, SetActiveRequest},
        response::{RecentSubmissionsQuery, ResponseQuery},
    },
    services::AssessmentService,
    store::ResponseStore,
};

/// Lists the question bank, optionally only the active subset.
/// Admin only.
pub async fn list_questions(
    State(service): State<AssessmentService>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.questions().list(query.active_only).await))
}

/// Creates a new question.
/// Admin only.
pub async fn create_question(
    State(service): State<AssessmentService>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let question = service
        .questions()
        .add(
            &payload.text,
            payload.question_type,
            payload.options,
            payload.category,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Replaces the active subset. Unknown ids are accepted and ignored when
/// sampling.
/// Admin only.
pub async fn set_active_questions(
    State(service): State<AssessmentService>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.questions().set_active(payload.active_ids).await?))
}

/// Most recent submissions, one row per candidate submission.
/// Admin only.
pub async fn recent_submissions(
    State(responses): State<ResponseStore>,
    Query(query): Query<RecentSubmissionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.unwrap_or(RECENT_SUBMISSIONS_LIMIT);
    Ok(Json(responses.recent_submissions(limit).await?))
}

/// Raw response records, optionally for a single candidate email.
/// Admin only.
pub async fn list_responses(
    State(responses): State<ResponseStore>,
    Query(query): Query<ResponseQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(responses.query(&query).await?))
}
