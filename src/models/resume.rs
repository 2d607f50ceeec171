use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::llm_json::{lenient_list, lenient_string, lenient_string_list};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(deserialize_with = "lenient_string_list")]
    pub description: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string_list")]
    pub technologies: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub institution: String,
    #[serde(deserialize_with = "lenient_string")]
    pub degree: String,
    #[serde(deserialize_with = "lenient_string")]
    pub field: String,
    /// Models often send this as a bare number.
    #[serde(deserialize_with = "lenient_string")]
    pub year: String,
}

/// Structured resume content as extracted by the LLM. Mistyped fields fall
/// back to their defaults so one bad value does not discard the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedResume {
    #[serde(deserialize_with = "lenient_string_list")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(deserialize_with = "lenient_list")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "lenient_list")]
    pub education: Vec<EducationEntry>,
    #[serde(deserialize_with = "lenient_string_list")]
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub skills: Vec<String>,
    pub experience: Json<Vec<ExperienceEntry>>,
    pub projects: Json<Vec<Project>>,
    pub education: Json<Vec<EducationEntry>>,
    pub certifications: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Resume {
    pub fn parsed(&self) -> ParsedResume {
        ParsedResume {
            skills: self.skills.clone(),
            experience: self.experience.0.clone(),
            projects: self.projects.0.clone(),
            education: self.education.0.clone(),
            certifications: self.certifications.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub user_id: Uuid,
    pub file_name: String,
    pub parsed: ParsedResume,
}
