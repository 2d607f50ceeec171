use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The five rubric components, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RubricBreakdown {
    pub accuracy: f64,
    pub clarity: f64,
    pub depth: f64,
    pub relevance: f64,
    pub time_efficiency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub response_text: String,
    pub time_taken: i32,
    /// Final weighted score with the time penalty applied, 0-100.
    pub score: f64,
    #[sqlx(flatten)]
    pub breakdown: RubricBreakdown,
    pub time_penalty: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub question_id: Uuid,
    pub response_text: String,
    pub time_taken: i32,
    pub score: f64,
    pub breakdown: RubricBreakdown,
    pub time_penalty: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}
