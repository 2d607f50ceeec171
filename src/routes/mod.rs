pub mod health;
pub mod interview;
pub mod profile;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};

use crate::middleware::auth::require_bearer_auth;
use crate::AppState;

/// Every route the service exposes. Everything except `/health` and user
/// registration requires a bearer token.
pub fn router(state: AppState) -> Router {
    let open = Router::new()
        .route("/health", get(health::health))
        .route("/api/users", post(profile::register_user));

    let protected = Router::new()
        .route("/api/resumes", post(profile::upload_resume))
        .route("/api/job-descriptions", post(profile::upload_job_description))
        .route("/api/fit-score", post(profile::fit_score))
        .route("/api/interviews", post(interview::start_interview))
        .route("/api/interviews/:id/questions", post(interview::next_question))
        .route("/api/interviews/:id/status", get(interview::get_status))
        .route("/api/interviews/:id/end", post(interview::end_interview))
        .route("/api/interviews/:id/report", get(interview::get_report))
        .route("/api/answers", post(interview::submit_answer))
        .layer(from_fn(require_bearer_auth));

    open.merge(protected).with_state(state)
}
