use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::job_description::{ExperienceLevel, ParsedJobDescription};
use crate::models::question::{Difficulty, QuestionCategory};
use crate::models::resume::ParsedResume;
use crate::services::llm_prompts::{self, Prompt};
use crate::utils::llm_json::{
    lenient_string, lenient_string_list, number_from_value, parse_llm_json, parse_llm_number,
    strip_json_fences,
};

const MAX_RETRIES: u32 = 3;
/// Rubric value used for any component the model leaves out.
pub const NEUTRAL_RUBRIC_SCORE: f64 = 50.0;

/// Everything the model sees when asked for the next question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionContext {
    pub candidate_skills: Vec<String>,
    /// "role at company" lines.
    pub candidate_experience: Vec<String>,
    pub jd_requirements: Vec<String>,
    pub jd_skills_required: Vec<String>,
    pub jd_experience_level: ExperienceLevel,
    pub category: QuestionCategory,
    pub difficulty: Difficulty,
    pub previous_questions: Vec<String>,
    pub average_previous_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    pub question_text: String,
    pub category: QuestionCategory,
    pub difficulty: Difficulty,
    pub answer_text: String,
    pub time_taken: i32,
    pub time_limit: i32,
    pub candidate_skills: Vec<String>,
    pub jd_skills_required: Vec<String>,
}

fn neutral_score() -> f64 {
    NEUTRAL_RUBRIC_SCORE
}

/// A rubric value as a number or numeric string; anything else is neutral.
fn rubric_score<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    Ok(number_from_value(&value).unwrap_or(NEUTRAL_RUBRIC_SCORE))
}

/// The four model-scored rubric components plus narrative feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricEvaluation {
    #[serde(default = "neutral_score", deserialize_with = "rubric_score")]
    pub accuracy: f64,
    #[serde(default = "neutral_score", deserialize_with = "rubric_score")]
    pub clarity: f64,
    #[serde(default = "neutral_score", deserialize_with = "rubric_score")]
    pub depth: f64,
    #[serde(default = "neutral_score", deserialize_with = "rubric_score")]
    pub relevance: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub feedback: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub improvements: Vec<String>,
}

impl RubricEvaluation {
    /// Substitute used when the model's evaluation cannot be obtained or read.
    pub fn neutral(feedback: impl Into<String>) -> Self {
        Self {
            accuracy: NEUTRAL_RUBRIC_SCORE,
            clarity: NEUTRAL_RUBRIC_SCORE,
            depth: NEUTRAL_RUBRIC_SCORE,
            relevance: NEUTRAL_RUBRIC_SCORE,
            feedback: feedback.into(),
            strengths: Vec::new(),
            improvements: Vec::new(),
        }
    }
}

/// The language-model collaborator used by the interview and profile services.
///
/// Transport failures come back as `Error::Upstream`. `parse_resume` and
/// `parse_job_description` degrade unreadable output to an empty parse;
/// the other calls report it as `Error::Upstream` and leave the fallback
/// to the caller.
#[async_trait]
pub trait InterviewLlm: Send + Sync {
    async fn generate_question_text(&self, ctx: &QuestionContext) -> Result<String>;
    async fn evaluate_answer(&self, ctx: &EvaluationContext) -> Result<RubricEvaluation>;
    async fn parse_resume(&self, resume_text: &str) -> Result<ParsedResume>;
    async fn parse_job_description(&self, jd_text: &str) -> Result<ParsedJobDescription>;
    /// Raw 0-100 estimate; callers clamp and round.
    async fn estimate_fit(&self, resume: &ParsedResume, jd: &ParsedJobDescription) -> Result<f64>;
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct OpenAiLlm {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiLlm {
    pub fn new(api_key: String, base_url: String, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    /// Sends one chat completion and returns the message content.
    /// Retries transport errors, 429 and 5xx with 1s/2s backoff.
    async fn chat(&self, prompt: &Prompt, json_mode: bool, temperature: f32) -> Result<String> {
        let mut payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": temperature
        });
        if json_mode {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = String::new();

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(attempt, delay_ms = delay.as_millis() as u64, error = %last_error, "Retrying LLM call");
                tokio::time::sleep(delay).await;
            }

            let res = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&payload)
                .send()
                .await
            {
                Ok(res) => res,
                Err(e) => {
                    last_error = e.to_string();
                    continue;
                }
            };

            let status = res.status();
            if status.as_u16() == 429 || status.is_server_error() {
                last_error = format!("LLM API {}: {}", status, res.text().await.unwrap_or_default());
                continue;
            }
            if !status.is_success() {
                let text = res.text().await.unwrap_or_default();
                return Err(Error::Upstream(format!("LLM API {}: {}", status, text)));
            }

            let body: JsonValue = res
                .json()
                .await
                .map_err(|e| Error::Upstream(format!("Unreadable LLM response: {}", e)))?;
            if let Some(usage) = body.get("usage") {
                debug!(usage = %usage, "LLM call succeeded");
            }

            return body
                .get("choices")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("message"))
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| Error::Upstream("LLM returned empty content".to_string()));
        }

        Err(Error::Upstream(format!(
            "LLM call failed after {} attempts: {}",
            MAX_RETRIES, last_error
        )))
    }
}

#[async_trait]
impl InterviewLlm for OpenAiLlm {
    async fn generate_question_text(&self, ctx: &QuestionContext) -> Result<String> {
        let prompt = llm_prompts::question_prompt(ctx);
        let text = self.chat(&prompt, false, 0.8).await?;
        let text = strip_json_fences(&text).trim_matches('"').trim().to_string();
        if text.is_empty() {
            return Err(Error::Upstream("LLM returned an empty question".to_string()));
        }
        Ok(text)
    }

    async fn evaluate_answer(&self, ctx: &EvaluationContext) -> Result<RubricEvaluation> {
        let prompt = llm_prompts::evaluation_prompt(ctx);
        let text = self.chat(&prompt, true, 0.2).await?;
        parse_llm_json::<RubricEvaluation>(&text)
            .ok_or_else(|| Error::Upstream("Malformed evaluation from LLM".to_string()))
    }

    async fn parse_resume(&self, resume_text: &str) -> Result<ParsedResume> {
        let prompt = llm_prompts::resume_prompt(resume_text);
        let text = self.chat(&prompt, true, 0.0).await?;
        Ok(parse_llm_json(&text).unwrap_or_else(|| {
            warn!("Resume parse returned malformed JSON; using an empty profile");
            ParsedResume::default()
        }))
    }

    async fn parse_job_description(&self, jd_text: &str) -> Result<ParsedJobDescription> {
        let prompt = llm_prompts::job_description_prompt(jd_text);
        let text = self.chat(&prompt, true, 0.0).await?;
        Ok(parse_llm_json(&text).unwrap_or_else(|| {
            warn!("Job description parse returned malformed JSON; using an empty description");
            ParsedJobDescription::default()
        }))
    }

    async fn estimate_fit(&self, resume: &ParsedResume, jd: &ParsedJobDescription) -> Result<f64> {
        let prompt = llm_prompts::fit_prompt(resume, jd);
        let text = self.chat(&prompt, false, 0.0).await?;
        parse_llm_number(&text)
            .ok_or_else(|| Error::Upstream(format!("Fit estimate is not a number: {}", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rubric_fields_default_to_neutral() {
        let parsed: RubricEvaluation =
            serde_json::from_str(r#"{"accuracy": 90, "feedback": "Solid"}"#).unwrap();
        assert_eq!(parsed.accuracy, 90.0);
        assert_eq!(parsed.clarity, NEUTRAL_RUBRIC_SCORE);
        assert_eq!(parsed.depth, NEUTRAL_RUBRIC_SCORE);
        assert_eq!(parsed.relevance, NEUTRAL_RUBRIC_SCORE);
        assert!(parsed.strengths.is_empty());
    }

    #[test]
    fn job_description_accepts_camel_case_keys() {
        let parsed: ParsedJobDescription = parse_llm_json(
            r#"```json
{"title": "SRE", "skillsRequired": ["Linux"], "experienceLevel": "Senior"}
```"#,
        )
        .unwrap();
        assert_eq!(parsed.skills_required, vec!["Linux"]);
        assert_eq!(parsed.experience_level, ExperienceLevel::Senior);
    }

    #[test]
    fn unknown_experience_level_falls_back_to_mid() {
        let parsed: ParsedJobDescription =
            serde_json::from_str(r#"{"experience_level": "Principal"}"#).unwrap();
        assert_eq!(parsed.experience_level, ExperienceLevel::Mid);

        let numeric: ParsedJobDescription =
            serde_json::from_str(r#"{"skills_required": ["Go"], "experience_level": 3}"#).unwrap();
        assert_eq!(numeric.experience_level, ExperienceLevel::Mid);
        assert_eq!(numeric.skills_required, vec!["Go"]);
    }

    #[test]
    fn quoted_rubric_scores_keep_the_evaluation() {
        let parsed: RubricEvaluation = parse_llm_json(
            r#"{"accuracy": "85", "clarity": 80, "depth": "n/a", "relevance": [1],
                "feedback": "Clear walk-through", "strengths": "Concise", "improvements": ["Add tests"]}"#,
        )
        .unwrap();
        assert_eq!(parsed.accuracy, 85.0);
        assert_eq!(parsed.clarity, 80.0);
        assert_eq!(parsed.depth, NEUTRAL_RUBRIC_SCORE);
        assert_eq!(parsed.relevance, NEUTRAL_RUBRIC_SCORE);
        assert_eq!(parsed.feedback, "Clear walk-through");
        assert_eq!(parsed.strengths, vec!["Concise"]);
        assert_eq!(parsed.improvements, vec!["Add tests"]);
    }

    #[test]
    fn numeric_education_year_keeps_the_resume() {
        let parsed: ParsedResume = parse_llm_json(
            r#"{"skills": ["Rust", "Postgres"],
                "education": [{"institution": "MIT", "degree": "BSc", "field": "CS", "year": 2020}],
                "experience": [{"company": "Acme", "role": "SRE", "duration": 3}, 42],
                "certifications": null}"#,
        )
        .unwrap();
        assert_eq!(parsed.skills, vec!["Rust", "Postgres"]);
        assert_eq!(parsed.education[0].year, "2020");
        assert_eq!(parsed.experience.len(), 1);
        assert_eq!(parsed.experience[0].duration, "3");
        assert!(parsed.certifications.is_empty());
    }
}
