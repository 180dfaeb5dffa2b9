// src/handlers/session.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::session::{
        Candidate, FlagRequest, NavigateRequest, RecordAnswerRequest, StartSessionRequest, StartSessionResponse,
    },
    services::AssessmentService,
};

/// Size of the eligible pool and the start form defaults.
pub async fn pool_info(State(service): State<AssessmentService>) -> impl IntoResponse {
    Json(service.pool_info().await)
}

/// Starts a test.
///
/// * Validates the candidate details.
/// * Samples the requested number of questions (clamped to the pool).
/// * Returns the session token the candidate uses for every later call.
pub async fn start_session(
    State(service): State<AssessmentService>,
    Json(req): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let candidate = Candidate {
        name: req.name,
        email: req.email,
    };
    let session = service
        .start(candidate, req.question_count, req.duration_minutes, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            token: session.token,
            session,
        }),
    ))
}

/// Renders the current question; also the client's countdown poll.
pub async fn get_session(
    State(service): State<AssessmentService>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.view(token, Utc::now()).await?))
}

pub async fn record_answer(
    State(service): State<AssessmentService>,
    Path(token): Path<Uuid>,
    Json(req): Json<RecordAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = service
        .record_answer(token, req.question_id, req.answer, Utc::now())
        .await?;
    Ok(Json(outcome))
}

pub async fn navigate(
    State(service): State<AssessmentService>,
    Path(token): Path<Uuid>,
    Json(req): Json<NavigateRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.navigate(token, req.direction, Utc::now()).await?))
}

pub async fn flag_question(
    State(service): State<AssessmentService>,
    Path(token): Path<Uuid>,
    Json(req): Json<FlagRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = service
        .flag(token, req.question_id, req.flagged, Utc::now())
        .await?;
    Ok(Json(outcome))
}

pub async fn submit(
    State(service): State<AssessmentService>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(service.submit(token, Utc::now()).await?))
}
