use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::interview_dto::{
    EndInterviewRequest, EndInterviewResponse, QuestionResponse, ReportResponse,
    SessionStatusResponse, StartInterviewRequest, StartInterviewResponse, SubmitAnswerRequest,
    SubmitAnswerResponse,
};
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn start_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartInterviewRequest>,
) -> crate::error::Result<Response> {
    let session = state
        .interview_service
        .start_session(claims.user_id()?, payload.resume_id, payload.jd_id)
        .await?;
    Ok((StatusCode::CREATED, Json(StartInterviewResponse::from(session))).into_response())
}

#[axum::debug_handler]
pub async fn next_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> crate::error::Result<Json<QuestionResponse>> {
    let question = state
        .interview_service
        .next_question(claims.user_id()?, session_id)
        .await?;
    Ok(Json(question))
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> crate::error::Result<Json<SubmitAnswerResponse>> {
    payload.validate()?;
    let outcome = state
        .interview_service
        .submit_answer(
            claims.user_id()?,
            payload.question_id,
            payload.response_text,
            payload.time_taken,
        )
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn get_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> crate::error::Result<Json<SessionStatusResponse>> {
    let status = state
        .interview_service
        .get_status(claims.user_id()?, session_id)
        .await?;
    Ok(Json(status))
}

/// The body is optional; an empty request ends the session with the default reason.
#[axum::debug_handler]
pub async fn end_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
    payload: Option<Json<EndInterviewRequest>>,
) -> crate::error::Result<Json<EndInterviewResponse>> {
    let Json(payload) = payload.unwrap_or_default();
    payload.validate()?;
    let ended = state
        .interview_service
        .end_session(claims.user_id()?, session_id, payload.reason)
        .await?;
    Ok(Json(ended))
}

#[axum::debug_handler]
pub async fn get_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> crate::error::Result<Json<ReportResponse>> {
    let report = state
        .interview_service
        .get_report(claims.user_id()?, session_id)
        .await?;
    Ok(Json(report))
}
