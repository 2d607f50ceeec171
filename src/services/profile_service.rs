use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::score_math::normalize_score;
use crate::error::{Error, Result};
use crate::models::job_description::{JobDescription, NewJobDescription};
use crate::models::resume::{NewResume, Resume};
use crate::models::user::User;
use crate::services::llm_service::InterviewLlm;
use crate::store::InterviewStore;

/// Used when the model's fit estimate is missing or unreadable.
pub const FALLBACK_FIT_SCORE: i32 = 50;

/// Users, uploaded resumes and job descriptions, and the initial fit estimate.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn InterviewStore>,
    llm: Arc<dyn InterviewLlm>,
    llm_timeout: Duration,
}

impl ProfileService {
    pub fn new(store: Arc<dyn InterviewStore>, llm: Arc<dyn InterviewLlm>, llm_timeout: Duration) -> Self {
        Self {
            store,
            llm,
            llm_timeout,
        }
    }

    pub async fn register_user(&self, email: &str, name: Option<&str>) -> Result<User> {
        let email = email.trim().to_lowercase();
        let user = self.store.upsert_user(&email, name).await?;
        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn upload_resume(&self, user_id: Uuid, file_name: &str, resume_text: &str) -> Result<Resume> {
        self.store.get_user(user_id).await?;
        let parsed = tokio::time::timeout(self.llm_timeout, self.llm.parse_resume(resume_text))
            .await
            .map_err(|_| Error::Upstream("Resume parsing timed out".to_string()))??;

        let resume = self
            .store
            .create_resume(NewResume {
                user_id,
                file_name: file_name.to_string(),
                parsed,
            })
            .await?;
        info!(resume_id = %resume.id, %user_id, skills = resume.skills.len(), "Resume stored");
        Ok(resume)
    }

    pub async fn upload_job_description(&self, user_id: Uuid, title: &str, jd_text: &str) -> Result<JobDescription> {
        self.store.get_user(user_id).await?;
        let parsed = tokio::time::timeout(self.llm_timeout, self.llm.parse_job_description(jd_text))
            .await
            .map_err(|_| Error::Upstream("Job description parsing timed out".to_string()))??;

        let title = match title.trim() {
            "" => parsed.title.clone(),
            given => given.to_string(),
        };
        let jd = self
            .store
            .create_job_description(NewJobDescription {
                user_id,
                title,
                parsed,
            })
            .await?;
        info!(jd_id = %jd.id, %user_id, level = jd.experience_level.as_str(), "Job description stored");
        Ok(jd)
    }

    /// Estimates resume-to-JD fit (0-100) and stores it on the job description.
    pub async fn compute_fit_score(&self, user_id: Uuid, resume_id: Uuid, jd_id: Uuid) -> Result<i32> {
        let resume = self.store.get_resume(resume_id).await?;
        let jd = self.store.get_job_description(jd_id).await?;
        if resume.user_id != user_id || jd.user_id != user_id {
            return Err(Error::NotFound("Resume or job description not found".to_string()));
        }

        let (parsed_resume, parsed_jd) = (resume.parsed(), jd.parsed());
        let estimate = tokio::time::timeout(
            self.llm_timeout,
            self.llm.estimate_fit(&parsed_resume, &parsed_jd),
        )
        .await;

        let score = match estimate {
            Ok(Ok(value)) if value.is_finite() => normalize_score(value).round() as i32,
            Ok(Ok(_)) => FALLBACK_FIT_SCORE,
            Ok(Err(e)) => {
                warn!(%resume_id, %jd_id, error = ?e, "Fit estimate failed; using fallback");
                FALLBACK_FIT_SCORE
            }
            Err(_) => {
                warn!(%resume_id, %jd_id, "Fit estimate timed out; using fallback");
                FALLBACK_FIT_SCORE
            }
        };

        self.store.set_initial_fit_score(jd_id, score).await?;
        Ok(score)
    }
}
