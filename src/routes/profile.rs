use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use validator::Validate;

use crate::dto::profile_dto::{
    FitScoreRequest, FitScoreResponse, RegisterUserRequest, RegisterUserResponse,
    UploadJobDescriptionRequest, UploadJobDescriptionResponse, UploadResumeRequest,
    UploadResumeResponse,
};
use crate::middleware::auth::Claims;
use crate::utils::token::issue_token;
use crate::AppState;

#[axum::debug_handler]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> crate::error::Result<Json<RegisterUserResponse>> {
    payload.validate()?;
    let user = state
        .profile_service
        .register_user(&payload.email, payload.name.as_deref())
        .await?;
    let config = crate::config::get_config();
    let token = issue_token(&config.jwt_secret, user.id, &user.email, config.token_ttl_hours)?;
    Ok(Json(RegisterUserResponse { user, token }))
}

#[axum::debug_handler]
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UploadResumeRequest>,
) -> crate::error::Result<Response> {
    payload.validate()?;
    let resume = state
        .profile_service
        .upload_resume(claims.user_id()?, &payload.file_name, &payload.resume_text)
        .await?;
    let body = UploadResumeResponse {
        resume_id: resume.id,
        parsed: resume.parsed(),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

#[axum::debug_handler]
pub async fn upload_job_description(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UploadJobDescriptionRequest>,
) -> crate::error::Result<Response> {
    payload.validate()?;
    let jd = state
        .profile_service
        .upload_job_description(claims.user_id()?, &payload.title, &payload.jd_text)
        .await?;
    let body = UploadJobDescriptionResponse {
        jd_id: jd.id,
        parsed: jd.parsed(),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

#[axum::debug_handler]
pub async fn fit_score(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<FitScoreRequest>,
) -> crate::error::Result<Json<FitScoreResponse>> {
    let fit_score = state
        .profile_service
        .compute_fit_score(claims.user_id()?, payload.resume_id, payload.jd_id)
        .await?;
    Ok(Json(FitScoreResponse {
        resume_id: payload.resume_id,
        jd_id: payload.jd_id,
        fit_score,
    }))
}
