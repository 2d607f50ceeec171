//! Persistence for interview data. Implementations are plain CRUD; every
//! rule lives in the services and the engine.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::answer::{Answer, NewAnswer};
use crate::models::job_description::{JobDescription, NewJobDescription};
use crate::models::question::{AnsweredQuestion, NewQuestion, Question};
use crate::models::report::{FinalReport, NewReport};
use crate::models::resume::{NewResume, Resume};
use crate::models::session::{InterviewSession, NewSession, SessionHistory, SessionPatch};
use crate::models::user::User;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Returns the user with `email`, creating it when absent.
    async fn upsert_user(&self, email: &str, name: Option<&str>) -> Result<User>;
    async fn get_user(&self, id: Uuid) -> Result<User>;

    async fn create_resume(&self, resume: NewResume) -> Result<Resume>;
    async fn get_resume(&self, id: Uuid) -> Result<Resume>;

    async fn create_job_description(&self, jd: NewJobDescription) -> Result<JobDescription>;
    async fn get_job_description(&self, id: Uuid) -> Result<JobDescription>;
    async fn set_initial_fit_score(&self, jd_id: Uuid, score: i32) -> Result<()>;

    /// New sessions start `InProgress` at `Medium` with no questions.
    async fn create_session(&self, session: NewSession) -> Result<InterviewSession>;
    async fn get_session(&self, id: Uuid) -> Result<InterviewSession>;
    /// The session with its questions in sequence order and their answers.
    async fn get_session_history(&self, id: Uuid) -> Result<SessionHistory>;
    async fn update_session(&self, id: Uuid, patch: SessionPatch) -> Result<InterviewSession>;

    /// Stores the question and sets the session's `current_question_number`
    /// to its sequence as one atomic write.
    async fn create_question(&self, question: NewQuestion) -> Result<Question>;
    async fn get_question(&self, id: Uuid) -> Result<AnsweredQuestion>;

    /// Fails with `InvalidState` when the question already has an answer.
    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer>;

    /// Fails with `InvalidState` when the session already has a report.
    async fn create_report(&self, report: NewReport) -> Result<FinalReport>;
    async fn get_report(&self, session_id: Uuid) -> Result<Option<FinalReport>>;
}
