use std::env;
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use interview_backend::error::Result;
use interview_backend::models::job_description::{ExperienceLevel, ParsedJobDescription};
use interview_backend::models::resume::ParsedResume;
use interview_backend::services::llm_service::{
    EvaluationContext, InterviewLlm, QuestionContext, RubricEvaluation,
};
use interview_backend::services::notification_service::NoopEventSink;
use interview_backend::store::MemoryStore;
use interview_backend::{routes, AppState};

static INIT: Once = Once::new();

fn init_config() {
    INIT.call_once(|| {
        env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
        env::set_var("DATABASE_URL", "postgres://unused@localhost/unused");
        env::set_var("JWT_SECRET", "test_secret_key");
        env::set_var("OPENAI_API_KEY", "sk-test");
        interview_backend::config::init_config().expect("init config");
    });
}

struct CannedLlm;

#[async_trait]
impl InterviewLlm for CannedLlm {
    async fn generate_question_text(&self, ctx: &QuestionContext) -> Result<String> {
        Ok(format!("Tell me about {} in {}", ctx.category.as_str(), ctx.candidate_skills.join(", ")))
    }

    async fn evaluate_answer(&self, _ctx: &EvaluationContext) -> Result<RubricEvaluation> {
        Ok(RubricEvaluation {
            accuracy: 90.0,
            clarity: 80.0,
            depth: 70.0,
            relevance: 90.0,
            feedback: "Solid grasp of ownership".to_string(),
            strengths: vec!["Precise".to_string()],
            improvements: vec!["Mention lifetimes".to_string()],
        })
    }

    async fn parse_resume(&self, _resume_text: &str) -> Result<ParsedResume> {
        Ok(ParsedResume {
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            ..Default::default()
        })
    }

    async fn parse_job_description(&self, _jd_text: &str) -> Result<ParsedJobDescription> {
        Ok(ParsedJobDescription {
            title: "Backend Engineer".to_string(),
            skills_required: vec!["Rust".to_string()],
            experience_level: ExperienceLevel::Senior,
            ..Default::default()
        })
    }

    async fn estimate_fit(&self, _r: &ParsedResume, _j: &ParsedJobDescription) -> Result<f64> {
        Ok(81.6)
    }
}

fn app() -> Router {
    init_config();
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(CannedLlm),
        Arc::new(NoopEventSink),
        Duration::from_secs(5),
    );
    routes::router(state)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, json)
}

const RESUME_TEXT: &str = "Backend engineer with six years of Rust, Tokio and PostgreSQL experience building payment systems.";
const JD_TEXT: &str = "We are hiring a senior backend engineer to own our Rust services, async runtimes and database layer.";

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "email": email, "name": "Robin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn prepare_profile(app: &Router, token: &str) -> (String, String) {
    let (status, resume) = call(
        app,
        Method::POST,
        "/api/resumes",
        Some(token),
        Some(json!({ "file_name": "cv.txt", "resume_text": RESUME_TEXT })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{resume}");

    let (status, jd) = call(
        app,
        Method::POST,
        "/api/job-descriptions",
        Some(token),
        Some(json!({ "title": "", "jd_text": JD_TEXT })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{jd}");

    (
        resume["resume_id"].as_str().unwrap().to_string(),
        jd["jd_id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_is_open() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/resumes",
        None,
        Some(json!({ "file_name": "cv.txt", "resume_text": RESUME_TEXT })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["retryable"], false);

    let (status, _) = call(&app, Method::GET, "/api/interviews/00000000-0000-0000-0000-000000000000/status", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_validates_email_and_is_idempotent() {
    let app = app();
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, first) = call(&app, Method::POST, "/api/users", None, Some(json!({ "email": "Sam@Example.com" }))).await;
    let (_, second) = call(&app, Method::POST, "/api/users", None, Some(json!({ "email": "sam@example.com" }))).await;
    assert_eq!(first["user"]["id"], second["user"]["id"]);
    assert_eq!(second["user"]["email"], "sam@example.com");
}

#[tokio::test]
async fn short_uploads_are_rejected() {
    let app = app();
    let token = register(&app, "short@example.com").await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/resumes",
        Some(&token),
        Some(json!({ "file_name": "cv.txt", "resume_text": "Too short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/job-descriptions",
        Some(&token),
        Some(json!({ "title": "Eng", "jd_text": "Also short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn uploads_parse_and_fit_score_is_rounded() {
    let app = app();
    let token = register(&app, "fit@example.com").await;
    let (resume_id, jd_id) = prepare_profile(&app, &token).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/fit-score",
        Some(&token),
        Some(json!({ "resume_id": resume_id, "jd_id": jd_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["fit_score"], 82);
}

#[tokio::test]
async fn interview_round_trip_over_http() {
    let app = app();
    let token = register(&app, "flow@example.com").await;
    let (resume_id, jd_id) = prepare_profile(&app, &token).await;

    let (status, started) = call(
        &app,
        Method::POST,
        "/api/interviews",
        Some(&token),
        Some(json!({ "resume_id": resume_id, "jd_id": jd_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{started}");
    assert_eq!(started["status"], "InProgress");
    assert_eq!(started["current_difficulty"], "Medium");
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let (status, report) = call(&app, Method::GET, &format!("/api/interviews/{session_id}/report"), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "{report}");

    let (status, question) = call(&app, Method::POST, &format!("/api/interviews/{session_id}/questions"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{question}");
    assert_eq!(question["question_number"], 1);
    assert_eq!(question["category"], "Technical");
    assert_eq!(question["time_limit"], 180);

    let (status, pending) = call(&app, Method::POST, &format!("/api/interviews/{session_id}/questions"), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "{pending}");

    let answer = json!({
        "question_id": question["question_id"],
        "response_text": "Ownership moves values; borrowing lends them out.",
        "time_taken": 95,
    });
    let (status, evaluated) = call(&app, Method::POST, "/api/answers", Some(&token), Some(answer.clone())).await;
    assert_eq!(status, StatusCode::OK, "{evaluated}");
    // 27 + 16 + 17.5 + 13.5 + 10
    assert_eq!(evaluated["score"], 84.0);
    assert_eq!(evaluated["interview_complete"], false);
    assert_eq!(evaluated["next_difficulty"], "Medium");

    let (status, _) = call(&app, Method::POST, "/api/answers", Some(&token), Some(answer)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, snapshot) = call(&app, Method::GET, &format!("/api/interviews/{session_id}/status"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["questions_answered"], 1);
    let technical = snapshot["metrics"]["skill_breakdown"]["technical"].as_f64().unwrap();
    assert!((technical - 84.0).abs() < 1e-9);

    let (status, ended) = call(&app, Method::POST, &format!("/api/interviews/{session_id}/end"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{ended}");
    assert_eq!(ended["status"], "Terminated");
    assert_eq!(ended["early_termination_reason"], "Candidate requested termination");
    assert_eq!(ended["report"]["question_count"], 1);

    let (status, report) = call(&app, Method::GET, &format!("/api/interviews/{session_id}/report"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["report"]["skills"]["technical"], 84.0);
    assert_eq!(report["report"]["weaknesses"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn sessions_are_private_to_their_owner() {
    let app = app();
    let owner = register(&app, "owner@example.com").await;
    let intruder = register(&app, "intruder@example.com").await;
    let (resume_id, jd_id) = prepare_profile(&app, &owner).await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/interviews",
        Some(&intruder),
        Some(json!({ "resume_id": resume_id, "jd_id": jd_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, started) = call(
        &app,
        Method::POST,
        "/api/interviews",
        Some(&owner),
        Some(json!({ "resume_id": resume_id, "jd_id": jd_id })),
    )
    .await;
    let session_id = started["session_id"].as_str().unwrap();
    let (status, _) = call(&app, Method::GET, &format!("/api/interviews/{session_id}/status"), Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ending_without_answers_leaves_no_report() {
    let app = app();
    let token = register(&app, "quitter@example.com").await;
    let (resume_id, jd_id) = prepare_profile(&app, &token).await;
    let (_, started) = call(
        &app,
        Method::POST,
        "/api/interviews",
        Some(&token),
        Some(json!({ "resume_id": resume_id, "jd_id": jd_id })),
    )
    .await;
    let session_id = started["session_id"].as_str().unwrap();

    let (status, ended) = call(
        &app,
        Method::POST,
        &format!("/api/interviews/{session_id}/end"),
        Some(&token),
        Some(json!({ "reason": "Changed my mind" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(ended["report"].is_null());
    assert_eq!(ended["early_termination_reason"], "Changed my mind");

    let (status, body) = call(&app, Method::GET, &format!("/api/interviews/{session_id}/report"), Some(&token), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["retryable"], false);
}
