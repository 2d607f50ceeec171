use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::answer::Answer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "difficulty")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Seconds a candidate gets to answer a question at this level.
    pub fn time_limit_seconds(self) -> i32 {
        match self {
            Difficulty::Easy => 120,
            Difficulty::Medium => 180,
            Difficulty::Hard => 240,
        }
    }

    pub fn harder(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Hard => Difficulty::Hard,
        }
    }

    pub fn easier(self) -> Self {
        match self {
            Difficulty::Hard => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Easy => Difficulty::Easy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_category")]
pub enum QuestionCategory {
    Technical,
    Conceptual,
    Behavioral,
    Scenario,
}

impl QuestionCategory {
    /// Declared order; also the tie-break order for allocation.
    pub const ALL: [QuestionCategory; 4] = [
        QuestionCategory::Technical,
        QuestionCategory::Conceptual,
        QuestionCategory::Behavioral,
        QuestionCategory::Scenario,
    ];

    /// Target share of the interview. The four weights sum to 1.0.
    pub fn weight(self) -> f64 {
        match self {
            QuestionCategory::Technical => 0.40,
            QuestionCategory::Conceptual => 0.25,
            QuestionCategory::Behavioral => 0.20,
            QuestionCategory::Scenario => 0.15,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionCategory::Technical => "Technical",
            QuestionCategory::Conceptual => "Conceptual",
            QuestionCategory::Behavioral => "Behavioral",
            QuestionCategory::Scenario => "Scenario",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub session_id: Uuid,
    /// 1-based position of the question within its session.
    pub sequence: i32,
    pub text: String,
    pub category: QuestionCategory,
    pub difficulty: Difficulty,
    pub time_limit: i32,
    pub asked_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub session_id: Uuid,
    pub sequence: i32,
    pub text: String,
    pub category: QuestionCategory,
    pub difficulty: Difficulty,
}

/// A question together with its answer, if one has been recorded.
#[derive(Debug, Clone, Serialize)]
pub struct AnsweredQuestion {
    pub question: Question,
    pub answer: Option<Answer>,
}
