use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::answer::{Answer, NewAnswer};
use crate::models::job_description::{JobDescription, NewJobDescription};
use crate::models::question::{AnsweredQuestion, Difficulty, NewQuestion, Question};
use crate::models::report::{FinalReport, NewReport};
use crate::models::resume::{NewResume, Resume};
use crate::models::session::{
    InterviewSession, NewSession, SessionHistory, SessionPatch, SessionStatus,
};
use crate::models::user::User;
use crate::store::InterviewStore;
use crate::utils::time::now;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    resumes: HashMap<Uuid, Resume>,
    job_descriptions: HashMap<Uuid, JobDescription>,
    sessions: HashMap<Uuid, InterviewSession>,
    questions: HashMap<Uuid, Question>,
    /// Keyed by question id.
    answers: HashMap<Uuid, Answer>,
    /// Keyed by session id.
    reports: HashMap<Uuid, FinalReport>,
}

/// In-process store used by tests and local runs without Postgres.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str, id: Uuid) -> Error {
    Error::NotFound(format!("{} {} not found", what, id))
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn upsert_user(&self, email: &str, name: Option<&str>) -> Result<User> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables
            .users
            .values_mut()
            .find(|u| u.email.eq_ignore_ascii_case(email))
        {
            if let Some(name) = name {
                user.name = Some(name.to_string());
                user.updated_at = now();
            }
            return Ok(user.clone());
        }
        let timestamp = now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.map(str::to_string),
            created_at: timestamp,
            updated_at: timestamp,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<User> {
        let tables = self.tables.read().await;
        tables.users.get(&id).cloned().ok_or_else(|| not_found("User", id))
    }

    async fn create_resume(&self, resume: NewResume) -> Result<Resume> {
        let NewResume {
            user_id,
            file_name,
            parsed,
        } = resume;
        let row = Resume {
            id: Uuid::new_v4(),
            user_id,
            file_name,
            skills: parsed.skills,
            experience: Json(parsed.experience),
            projects: Json(parsed.projects),
            education: Json(parsed.education),
            certifications: parsed.certifications,
            created_at: now(),
        };
        self.tables.write().await.resumes.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_resume(&self, id: Uuid) -> Result<Resume> {
        let tables = self.tables.read().await;
        tables
            .resumes
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Resume", id))
    }

    async fn create_job_description(&self, jd: NewJobDescription) -> Result<JobDescription> {
        let NewJobDescription {
            user_id,
            title,
            parsed,
        } = jd;
        let row = JobDescription {
            id: Uuid::new_v4(),
            user_id,
            title,
            requirements: parsed.requirements,
            skills_required: parsed.skills_required,
            experience_level: parsed.experience_level,
            responsibilities: parsed.responsibilities,
            key_competencies: parsed.key_competencies,
            initial_fit_score: None,
            created_at: now(),
        };
        self.tables
            .write()
            .await
            .job_descriptions
            .insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_job_description(&self, id: Uuid) -> Result<JobDescription> {
        let tables = self.tables.read().await;
        tables
            .job_descriptions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Job description", id))
    }

    async fn set_initial_fit_score(&self, jd_id: Uuid, score: i32) -> Result<()> {
        let mut tables = self.tables.write().await;
        let jd = tables
            .job_descriptions
            .get_mut(&jd_id)
            .ok_or_else(|| not_found("Job description", jd_id))?;
        jd.initial_fit_score = Some(score);
        Ok(())
    }

    async fn create_session(&self, session: NewSession) -> Result<InterviewSession> {
        let row = InterviewSession {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            resume_id: session.resume_id,
            jd_id: session.jd_id,
            status: SessionStatus::InProgress,
            current_difficulty: Difficulty::Medium,
            current_question_number: 0,
            start_time: session.start_time,
            end_time: None,
            total_duration: None,
            early_termination_reason: None,
        };
        self.tables.write().await.sessions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_session(&self, id: Uuid) -> Result<InterviewSession> {
        let tables = self.tables.read().await;
        tables
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Session", id))
    }

    async fn get_session_history(&self, id: Uuid) -> Result<SessionHistory> {
        let tables = self.tables.read().await;
        let session = tables
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Session", id))?;

        let mut questions: Vec<AnsweredQuestion> = tables
            .questions
            .values()
            .filter(|q| q.session_id == id)
            .map(|q| AnsweredQuestion {
                question: q.clone(),
                answer: tables.answers.get(&q.id).cloned(),
            })
            .collect();
        questions.sort_by_key(|q| q.question.sequence);

        Ok(SessionHistory { session, questions })
    }

    async fn update_session(&self, id: Uuid, patch: SessionPatch) -> Result<InterviewSession> {
        let mut tables = self.tables.write().await;
        let session = tables
            .sessions
            .get_mut(&id)
            .ok_or_else(|| not_found("Session", id))?;
        if let Some(status) = patch.status {
            session.status = status;
        }
        if let Some(difficulty) = patch.current_difficulty {
            session.current_difficulty = difficulty;
        }
        if let Some(number) = patch.current_question_number {
            session.current_question_number = number;
        }
        if let Some(end_time) = patch.end_time {
            session.end_time = Some(end_time);
        }
        if let Some(duration) = patch.total_duration {
            session.total_duration = Some(duration);
        }
        if let Some(reason) = patch.early_termination_reason {
            session.early_termination_reason = Some(reason);
        }
        Ok(session.clone())
    }

    async fn create_question(&self, question: NewQuestion) -> Result<Question> {
        let mut tables = self.tables.write().await;
        let session = tables
            .sessions
            .get_mut(&question.session_id)
            .ok_or_else(|| not_found("Session", question.session_id))?;
        session.current_question_number = question.sequence;
        let row = Question {
            id: Uuid::new_v4(),
            session_id: question.session_id,
            sequence: question.sequence,
            text: question.text,
            category: question.category,
            difficulty: question.difficulty,
            time_limit: question.difficulty.time_limit_seconds(),
            asked_at: now(),
        };
        tables.questions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_question(&self, id: Uuid) -> Result<AnsweredQuestion> {
        let tables = self.tables.read().await;
        let question = tables
            .questions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Question", id))?;
        Ok(AnsweredQuestion {
            answer: tables.answers.get(&id).cloned(),
            question,
        })
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer> {
        let mut tables = self.tables.write().await;
        if !tables.questions.contains_key(&answer.question_id) {
            return Err(not_found("Question", answer.question_id));
        }
        if tables.answers.contains_key(&answer.question_id) {
            return Err(Error::InvalidState(format!(
                "Question {} has already been answered",
                answer.question_id
            )));
        }
        let row = Answer {
            id: Uuid::new_v4(),
            question_id: answer.question_id,
            response_text: answer.response_text,
            time_taken: answer.time_taken,
            score: answer.score,
            breakdown: answer.breakdown,
            time_penalty: answer.time_penalty,
            feedback: answer.feedback,
            strengths: answer.strengths,
            improvements: answer.improvements,
            created_at: now(),
        };
        tables.answers.insert(row.question_id, row.clone());
        Ok(row)
    }

    async fn create_report(&self, report: NewReport) -> Result<FinalReport> {
        let mut tables = self.tables.write().await;
        if tables.reports.contains_key(&report.session_id) {
            return Err(Error::InvalidState(format!(
                "Session {} already has a report",
                report.session_id
            )));
        }
        let row = FinalReport {
            id: Uuid::new_v4(),
            session_id: report.session_id,
            overall_score: report.overall_score,
            skills: report.skills,
            performance_trend: report.performance_trend,
            strengths: report.strengths,
            weaknesses: Json(report.weaknesses),
            recommendation: report.recommendation,
            recommendation_confidence: report.recommendation_confidence,
            question_count: report.question_count,
            average_time_per_question: report.average_time_per_question,
            generated_at: now(),
        };
        tables.reports.insert(row.session_id, row.clone());
        Ok(row)
    }

    async fn get_report(&self, session_id: Uuid) -> Result<Option<FinalReport>> {
        Ok(self.tables.read().await.reports.get(&session_id).cloned())
    }
}
