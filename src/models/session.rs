use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::answer::Answer;
use crate::models::question::{AnsweredQuestion, Difficulty, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_status")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
    Terminated,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Terminated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "NotStarted",
            SessionStatus::InProgress => "InProgress",
            SessionStatus::Completed => "Completed",
            SessionStatus::Terminated => "Terminated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_id: Uuid,
    pub jd_id: Uuid,
    pub status: SessionStatus,
    pub current_difficulty: Difficulty,
    /// Count of questions created for this session.
    pub current_question_number: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds between start and end.
    pub total_duration: Option<i32>,
    pub early_termination_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: Uuid,
    pub resume_id: Uuid,
    pub jd_id: Uuid,
    pub start_time: DateTime<Utc>,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    pub current_difficulty: Option<Difficulty>,
    pub current_question_number: Option<i32>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_duration: Option<i32>,
    pub early_termination_reason: Option<String>,
}

/// A session with its questions (ordered by sequence) and their answers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionHistory {
    pub session: InterviewSession,
    pub questions: Vec<AnsweredQuestion>,
}

impl SessionHistory {
    /// Answered questions in the order they were asked.
    pub fn answered(&self) -> impl Iterator<Item = (&Question, &Answer)> {
        self.questions
            .iter()
            .filter_map(|q| q.answer.as_ref().map(|a| (&q.question, a)))
    }

    pub fn scores(&self) -> Vec<f64> {
        self.answered().map(|(_, a)| a.score).collect()
    }

    pub fn pending_question(&self) -> Option<&Question> {
        self.questions
            .iter()
            .find(|q| q.answer.is_none())
            .map(|q| &q.question)
    }
}
