use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::answer::{Answer, NewAnswer};
use crate::models::job_description::{JobDescription, NewJobDescription};
use crate::models::question::{AnsweredQuestion, NewQuestion, Question};
use crate::models::report::{FinalReport, NewReport};
use crate::models::resume::{NewResume, Resume};
use crate::models::session::{InterviewSession, NewSession, SessionHistory, SessionPatch};
use crate::models::user::User;
use crate::store::InterviewStore;

const SESSION_COLUMNS: &str = r#"
    id, user_id, resume_id, jd_id, status, current_difficulty, current_question_number,
    start_time, end_time, total_duration, early_termination_reason
"#;

const QUESTION_COLUMNS: &str =
    "id, session_id, sequence, text, category, difficulty, time_limit, asked_at";

const ANSWER_COLUMNS: &str = r#"
    id, question_id, response_text, time_taken, score, accuracy, clarity, depth, relevance,
    time_efficiency, time_penalty, feedback, strengths, improvements, created_at
"#;

const REPORT_COLUMNS: &str = r#"
    id, session_id, overall_score, technical, behavioral, conceptual, communication,
    time_management, performance_trend, strengths, weaknesses, recommendation,
    recommendation_confidence, question_count, average_time_per_question, generated_at
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique-constraint violation to `InvalidState`, everything else as usual.
fn conflict_as_invalid_state(err: sqlx::Error, message: String) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::InvalidState(message),
        _ => err.into(),
    }
}

#[async_trait]
impl InterviewStore for PgStore {
    async fn upsert_user(&self, email: &str, name: Option<&str>) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE
            SET name = COALESCE(EXCLUDED.name, users.name), updated_at = NOW()
            RETURNING id, email, name, created_at, updated_at
            "#,
        )
        .bind(email.to_lowercase())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_resume(&self, resume: NewResume) -> Result<Resume> {
        let parsed = resume.parsed;
        let row = sqlx::query_as::<_, Resume>(
            r#"
            INSERT INTO resumes
                (user_id, file_name, skills, experience, projects, education, certifications)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, file_name, skills, experience, projects, education,
                      certifications, created_at
            "#,
        )
        .bind(resume.user_id)
        .bind(&resume.file_name)
        .bind(&parsed.skills)
        .bind(Json(&parsed.experience))
        .bind(Json(&parsed.projects))
        .bind(Json(&parsed.education))
        .bind(&parsed.certifications)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_resume(&self, id: Uuid) -> Result<Resume> {
        let row = sqlx::query_as::<_, Resume>(
            r#"
            SELECT id, user_id, file_name, skills, experience, projects, education,
                   certifications, created_at
            FROM resumes WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_job_description(&self, jd: NewJobDescription) -> Result<JobDescription> {
        let parsed = jd.parsed;
        let row = sqlx::query_as::<_, JobDescription>(
            r#"
            INSERT INTO job_descriptions
                (user_id, title, requirements, skills_required, experience_level,
                 responsibilities, key_competencies)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, title, requirements, skills_required, experience_level,
                      responsibilities, key_competencies, initial_fit_score, created_at
            "#,
        )
        .bind(jd.user_id)
        .bind(&jd.title)
        .bind(&parsed.requirements)
        .bind(&parsed.skills_required)
        .bind(parsed.experience_level)
        .bind(&parsed.responsibilities)
        .bind(&parsed.key_competencies)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_job_description(&self, id: Uuid) -> Result<JobDescription> {
        let row = sqlx::query_as::<_, JobDescription>(
            r#"
            SELECT id, user_id, title, requirements, skills_required, experience_level,
                   responsibilities, key_competencies, initial_fit_score, created_at
            FROM job_descriptions WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_initial_fit_score(&self, jd_id: Uuid, score: i32) -> Result<()> {
        let result = sqlx::query("UPDATE job_descriptions SET initial_fit_score = $2 WHERE id = $1")
            .bind(jd_id)
            .bind(score)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Job description {} not found", jd_id)));
        }
        Ok(())
    }

    async fn create_session(&self, session: NewSession) -> Result<InterviewSession> {
        let sql = format!(
            r#"
            INSERT INTO interview_sessions (user_id, resume_id, jd_id, status, current_difficulty,
                                            current_question_number, start_time)
            VALUES ($1, $2, $3, 'InProgress', 'Medium', 0, $4)
            RETURNING {SESSION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, InterviewSession>(&sql)
            .bind(session.user_id)
            .bind(session.resume_id)
            .bind(session.jd_id)
            .bind(session.start_time)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_session(&self, id: Uuid) -> Result<InterviewSession> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM interview_sessions WHERE id = $1");
        let row = sqlx::query_as::<_, InterviewSession>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_session_history(&self, id: Uuid) -> Result<SessionHistory> {
        let session = self.get_session(id).await?;

        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE session_id = $1 ORDER BY sequence ASC"
        );
        let questions = sqlx::query_as::<_, Question>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {ANSWER_COLUMNS} FROM answers
            WHERE question_id IN (SELECT id FROM questions WHERE session_id = $1)
            "#
        );
        let mut answers = sqlx::query_as::<_, Answer>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let questions = questions
            .into_iter()
            .map(|question| {
                let answer = answers
                    .iter()
                    .position(|a| a.question_id == question.id)
                    .map(|idx| answers.swap_remove(idx));
                AnsweredQuestion { question, answer }
            })
            .collect();

        Ok(SessionHistory { session, questions })
    }

    async fn update_session(&self, id: Uuid, patch: SessionPatch) -> Result<InterviewSession> {
        let sql = format!(
            r#"
            UPDATE interview_sessions SET
                status = COALESCE($2, status),
                current_difficulty = COALESCE($3, current_difficulty),
                current_question_number = COALESCE($4, current_question_number),
                end_time = COALESCE($5, end_time),
                total_duration = COALESCE($6, total_duration),
                early_termination_reason = COALESCE($7, early_termination_reason)
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, InterviewSession>(&sql)
            .bind(id)
            .bind(patch.status)
            .bind(patch.current_difficulty)
            .bind(patch.current_question_number)
            .bind(patch.end_time)
            .bind(patch.total_duration)
            .bind(patch.early_termination_reason)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_question(&self, question: NewQuestion) -> Result<Question> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO questions (session_id, sequence, text, category, difficulty, time_limit)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {QUESTION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Question>(&sql)
            .bind(question.session_id)
            .bind(question.sequence)
            .bind(&question.text)
            .bind(question.category)
            .bind(question.difficulty)
            .bind(question.difficulty.time_limit_seconds())
            .fetch_one(&mut *tx)
            .await?;

        let advanced = sqlx::query(
            "UPDATE interview_sessions SET current_question_number = $2 WHERE id = $1",
        )
        .bind(question.session_id)
        .bind(question.sequence)
        .execute(&mut *tx)
        .await?;
        if advanced.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "Session {} not found",
                question.session_id
            )));
        }

        tx.commit().await?;
        Ok(row)
    }

    async fn get_question(&self, id: Uuid) -> Result<AnsweredQuestion> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
        let question = sqlx::query_as::<_, Question>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE question_id = $1");
        let answer = sqlx::query_as::<_, Answer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(AnsweredQuestion { question, answer })
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer> {
        let sql = format!(
            r#"
            INSERT INTO answers
                (question_id, response_text, time_taken, score, accuracy, clarity, depth,
                 relevance, time_efficiency, time_penalty, feedback, strengths, improvements)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {ANSWER_COLUMNS}
            "#
        );
        let question_id = answer.question_id;
        sqlx::query_as::<_, Answer>(&sql)
            .bind(answer.question_id)
            .bind(&answer.response_text)
            .bind(answer.time_taken)
            .bind(answer.score)
            .bind(answer.breakdown.accuracy)
            .bind(answer.breakdown.clarity)
            .bind(answer.breakdown.depth)
            .bind(answer.breakdown.relevance)
            .bind(answer.breakdown.time_efficiency)
            .bind(answer.time_penalty)
            .bind(&answer.feedback)
            .bind(&answer.strengths)
            .bind(&answer.improvements)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                conflict_as_invalid_state(
                    e,
                    format!("Question {} has already been answered", question_id),
                )
            })
    }

    async fn create_report(&self, report: NewReport) -> Result<FinalReport> {
        let sql = format!(
            r#"
            INSERT INTO final_reports
                (session_id, overall_score, technical, behavioral, conceptual, communication,
                 time_management, performance_trend, strengths, weaknesses, recommendation,
                 recommendation_confidence, question_count, average_time_per_question)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {REPORT_COLUMNS}
            "#
        );
        let session_id = report.session_id;
        sqlx::query_as::<_, FinalReport>(&sql)
            .bind(report.session_id)
            .bind(report.overall_score)
            .bind(report.skills.technical)
            .bind(report.skills.behavioral)
            .bind(report.skills.conceptual)
            .bind(report.skills.communication)
            .bind(report.skills.time_management)
            .bind(report.performance_trend)
            .bind(&report.strengths)
            .bind(Json(&report.weaknesses))
            .bind(report.recommendation)
            .bind(report.recommendation_confidence)
            .bind(report.question_count)
            .bind(report.average_time_per_question)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                conflict_as_invalid_state(e, format!("Session {} already has a report", session_id))
            })
    }

    async fn get_report(&self, session_id: Uuid) -> Result<Option<FinalReport>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM final_reports WHERE session_id = $1");
        let row = sqlx::query_as::<_, FinalReport>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
