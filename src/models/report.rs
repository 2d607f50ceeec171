use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "performance_trend")]
pub enum PerformanceTrend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recommendation")]
pub enum Recommendation {
    Ready,
    #[serde(rename = "Needs Practice")]
    #[sqlx(rename = "Needs Practice")]
    NeedsPractice,
    #[serde(rename = "Not Ready")]
    #[sqlx(rename = "Not Ready")]
    NotReady,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Ready => "Ready",
            Recommendation::NeedsPractice => "Needs Practice",
            Recommendation::NotReady => "Not Ready",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SkillBreakdown {
    pub technical: f64,
    pub behavioral: f64,
    pub conceptual: f64,
    pub communication: f64,
    pub time_management: f64,
}

impl SkillBreakdown {
    pub const TECHNICAL: &'static str = "technical";
    pub const BEHAVIORAL: &'static str = "behavioral";
    pub const CONCEPTUAL: &'static str = "conceptual";
    pub const COMMUNICATION: &'static str = "communication";
    pub const TIME_MANAGEMENT: &'static str = "time_management";

    /// Named skills in their canonical order.
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            (Self::TECHNICAL, self.technical),
            (Self::BEHAVIORAL, self.behavioral),
            (Self::CONCEPTUAL, self.conceptual),
            (Self::COMMUNICATION, self.communication),
            (Self::TIME_MANAGEMENT, self.time_management),
        ]
    }

    pub fn values(&self) -> [f64; 5] {
        self.entries().map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weakness {
    pub skill: String,
    pub feedback: String,
    pub improvement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FinalReport {
    pub id: Uuid,
    pub session_id: Uuid,
    pub overall_score: f64,
    #[sqlx(flatten)]
    pub skills: SkillBreakdown,
    pub performance_trend: PerformanceTrend,
    pub strengths: Vec<String>,
    pub weaknesses: Json<Vec<Weakness>>,
    pub recommendation: Recommendation,
    pub recommendation_confidence: f64,
    pub question_count: i32,
    pub average_time_per_question: i32,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub session_id: Uuid,
    pub overall_score: f64,
    pub skills: SkillBreakdown,
    pub performance_trend: PerformanceTrend,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<Weakness>,
    pub recommendation: Recommendation,
    pub recommendation_confidence: f64,
    pub question_count: i32,
    pub average_time_per_question: i32,
}
