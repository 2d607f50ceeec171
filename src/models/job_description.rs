use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::llm_json::{lenient_or_default, lenient_string, lenient_string_list};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_level")]
pub enum ExperienceLevel {
    #[serde(alias = "entry")]
    Entry,
    #[serde(alias = "senior")]
    Senior,
    #[serde(alias = "lead")]
    Lead,
    /// Also the landing spot for any level the model invents.
    #[default]
    #[serde(other)]
    Mid,
}

impl ExperienceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Lead => "Lead",
        }
    }
}

/// Structured job description content as extracted by the LLM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedJobDescription {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string_list")]
    pub requirements: Vec<String>,
    #[serde(alias = "skillsRequired", deserialize_with = "lenient_string_list")]
    pub skills_required: Vec<String>,
    #[serde(alias = "experienceLevel", deserialize_with = "lenient_or_default")]
    pub experience_level: ExperienceLevel,
    #[serde(deserialize_with = "lenient_string_list")]
    pub responsibilities: Vec<String>,
    #[serde(alias = "keyCompetencies", deserialize_with = "lenient_string_list")]
    pub key_competencies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobDescription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub requirements: Vec<String>,
    pub skills_required: Vec<String>,
    pub experience_level: ExperienceLevel,
    pub responsibilities: Vec<String>,
    pub key_competencies: Vec<String>,
    pub initial_fit_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl JobDescription {
    pub fn parsed(&self) -> ParsedJobDescription {
        ParsedJobDescription {
            title: self.title.clone(),
            requirements: self.requirements.clone(),
            skills_required: self.skills_required.clone(),
            experience_level: self.experience_level,
            responsibilities: self.responsibilities.clone(),
            key_competencies: self.key_competencies.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewJobDescription {
    pub user_id: Uuid,
    /// Title supplied by the user; the parsed title is only a fallback.
    pub title: String,
    pub parsed: ParsedJobDescription,
}
