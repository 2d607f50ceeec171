use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::engine::metrics::PerformanceSnapshot;
use crate::models::answer::RubricBreakdown;
use crate::models::question::{Difficulty, Question, QuestionCategory};
use crate::models::report::FinalReport;
use crate::models::session::{InterviewSession, SessionStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartInterviewRequest {
    pub resume_id: Uuid,
    pub jd_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartInterviewResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub current_difficulty: Difficulty,
    pub current_question_number: i32,
    pub start_time: DateTime<Utc>,
}

impl From<InterviewSession> for StartInterviewResponse {
    fn from(session: InterviewSession) -> Self {
        Self {
            session_id: session.id,
            status: session.status,
            current_difficulty: session.current_difficulty,
            current_question_number: session.current_question_number,
            start_time: session.start_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question_id: Uuid,
    pub session_id: Uuid,
    pub question_number: i32,
    pub text: String,
    pub category: QuestionCategory,
    pub difficulty: Difficulty,
    /// Seconds.
    pub time_limit: i32,
    pub asked_at: DateTime<Utc>,
}

impl From<Question> for QuestionResponse {
    fn from(q: Question) -> Self {
        Self {
            question_id: q.id,
            session_id: q.session_id,
            question_number: q.sequence,
            text: q.text,
            category: q.category,
            difficulty: q.difficulty,
            time_limit: q.time_limit,
            asked_at: q.asked_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    #[validate(length(min = 1, max = 20000, message = "response_text must not be empty"))]
    pub response_text: String,
    #[validate(range(min = 0, max = 86400, message = "time_taken must be between 0 and 86400 seconds"))]
    pub time_taken: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub answer_id: Uuid,
    pub question_id: Uuid,
    pub score: f64,
    pub breakdown: RubricBreakdown,
    pub time_penalty: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub next_difficulty: Difficulty,
    pub interview_complete: bool,
    pub termination_reason: Option<String>,
    pub should_auto_submit: bool,
    /// Present when this answer ended the interview.
    pub report: Option<FinalReport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EndInterviewRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndInterviewResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub end_time: Option<DateTime<Utc>>,
    pub total_duration: Option<i32>,
    pub early_termination_reason: Option<String>,
    /// `None` when the session ended before any answer was recorded.
    pub report: Option<FinalReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub current_question_number: i32,
    pub questions_answered: usize,
    pub current_difficulty: Difficulty,
    pub start_time: DateTime<Utc>,
    pub average_score: f64,
    pub metrics: PerformanceSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_duration: Option<i32>,
    pub early_termination_reason: Option<String>,
    pub report: FinalReport,
}
