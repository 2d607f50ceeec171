use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dto::interview_dto::{
    EndInterviewResponse, QuestionResponse, ReportResponse, SessionStatusResponse,
    SubmitAnswerResponse,
};
use crate::engine::category::next_category;
use crate::engine::difficulty::next_difficulty;
use crate::engine::metrics::performance_snapshot;
use crate::engine::report::{synthesize_report, AnswerRecord};
use crate::engine::score_math::{
    mean, normalize_score, round_score, should_auto_submit, time_efficiency_score, time_penalty,
    weighted_answer_score,
};
use crate::engine::termination::{check_termination, should_continue, MAX_QUESTIONS};
use crate::error::{Error, Result};
use crate::models::answer::{NewAnswer, RubricBreakdown};
use crate::models::question::{NewQuestion, QuestionCategory};
use crate::models::report::{FinalReport, NewReport};
use crate::models::session::{
    InterviewSession, NewSession, SessionHistory, SessionPatch, SessionStatus,
};
use crate::services::llm_service::{
    EvaluationContext, InterviewLlm, QuestionContext, RubricEvaluation, NEUTRAL_RUBRIC_SCORE,
};
use crate::services::notification_service::{EventSink, SessionEvent, SessionEventKind};
use crate::services::session_locks::SessionLocks;
use crate::store::InterviewStore;
use crate::utils::time::{now, whole_seconds};

pub const MAX_QUESTIONS_REASON: &str = "Maximum questions reached";
const DEGRADED_FEEDBACK: &str =
    "Automatic evaluation was unavailable for this answer; a neutral score was recorded.";

/// Runs the interview lifecycle on top of the store, the LLM and the event sink.
#[derive(Clone)]
pub struct InterviewService {
    store: Arc<dyn InterviewStore>,
    llm: Arc<dyn InterviewLlm>,
    events: Arc<dyn EventSink>,
    locks: SessionLocks,
    llm_timeout: Duration,
}

fn finite_or_neutral(value: f64) -> f64 {
    if value.is_finite() {
        normalize_score(value)
    } else {
        NEUTRAL_RUBRIC_SCORE
    }
}

fn ensure_owner(session: &InterviewSession, user_id: Uuid) -> Result<()> {
    if session.user_id != user_id {
        return Err(Error::NotFound(format!("Session {} not found", session.id)));
    }
    Ok(())
}

fn ensure_in_progress(session: &InterviewSession) -> Result<()> {
    if session.status != SessionStatus::InProgress {
        return Err(Error::InvalidState(format!(
            "Session {} is {}, not InProgress",
            session.id,
            session.status.as_str()
        )));
    }
    Ok(())
}

impl InterviewService {
    pub fn new(
        store: Arc<dyn InterviewStore>,
        llm: Arc<dyn InterviewLlm>,
        events: Arc<dyn EventSink>,
        llm_timeout: Duration,
    ) -> Self {
        Self {
            store,
            llm,
            events,
            locks: SessionLocks::new(),
            llm_timeout,
        }
    }

    async fn with_llm_timeout<T>(
        &self,
        what: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.llm_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Upstream(format!(
                "LLM {} timed out after {}s",
                what,
                self.llm_timeout.as_secs()
            ))),
        }
    }

    async fn publish(&self, session_id: Uuid, kind: SessionEventKind, payload: serde_json::Value) {
        let event = SessionEvent {
            session_id,
            kind,
            payload,
        };
        if let Err(e) = self.events.publish(event).await {
            warn!(%session_id, event = kind.as_str(), error = ?e, "Failed to publish session event");
        }
    }

    pub async fn start_session(
        &self,
        user_id: Uuid,
        resume_id: Uuid,
        jd_id: Uuid,
    ) -> Result<InterviewSession> {
        let resume = self.store.get_resume(resume_id).await?;
        let jd = self.store.get_job_description(jd_id).await?;
        if resume.user_id != user_id {
            return Err(Error::NotFound(format!("Resume {} not found", resume_id)));
        }
        if jd.user_id != user_id {
            return Err(Error::NotFound(format!("Job description {} not found", jd_id)));
        }

        let session = self
            .store
            .create_session(NewSession {
                user_id,
                resume_id,
                jd_id,
                start_time: now(),
            })
            .await?;

        info!(session_id = %session.id, %user_id, "Interview session started");
        self.publish(
            session.id,
            SessionEventKind::StatusChanged,
            json!({ "status": session.status }),
        )
        .await;
        Ok(session)
    }

    pub async fn next_question(&self, user_id: Uuid, session_id: Uuid) -> Result<QuestionResponse> {
        let _guard = self.locks.acquire(session_id).await;
        let history = self.store.get_session_history(session_id).await?;
        let session = &history.session;
        ensure_owner(session, user_id)?;
        ensure_in_progress(session)?;

        if session.current_question_number >= MAX_QUESTIONS {
            self.end_locked(history, SessionStatus::Completed, MAX_QUESTIONS_REASON.to_string())
                .await?;
            return Err(Error::InvalidState(format!(
                "Session {} reached {} questions and has ended",
                session_id, MAX_QUESTIONS
            )));
        }
        if let Some(pending) = history.pending_question() {
            return Err(Error::InvalidState(format!(
                "Question {} must be answered before the next one",
                pending.id
            )));
        }

        let question_number = session.current_question_number + 1;
        let asked: Vec<QuestionCategory> =
            history.questions.iter().map(|q| q.question.category).collect();
        let category = next_category(&asked, question_number as u32);
        let difficulty = session.current_difficulty;

        let resume = self.store.get_resume(session.resume_id).await?;
        let jd = self.store.get_job_description(session.jd_id).await?;
        let ctx = QuestionContext {
            candidate_skills: resume.skills.clone(),
            candidate_experience: resume
                .experience
                .0
                .iter()
                .map(|e| format!("{} at {}", e.role, e.company))
                .collect(),
            jd_requirements: jd.requirements.clone(),
            jd_skills_required: jd.skills_required.clone(),
            jd_experience_level: jd.experience_level,
            category,
            difficulty,
            previous_questions: history
                .questions
                .iter()
                .map(|q| q.question.text.clone())
                .collect(),
            average_previous_score: mean(&history.scores()),
        };

        let text = self
            .with_llm_timeout("question generation", self.llm.generate_question_text(&ctx))
            .await
            .map_err(|e| {
                error!(%session_id, question_number, error = ?e, "Question generation failed");
                match e {
                    Error::Upstream(_) => e,
                    other => Error::Upstream(other.to_string()),
                }
            })?;

        let question = self
            .store
            .create_question(NewQuestion {
                session_id,
                sequence: question_number,
                text,
                category,
                difficulty,
            })
            .await?;

        info!(
            %session_id,
            question_id = %question.id,
            question_number,
            category = category.as_str(),
            difficulty = difficulty.as_str(),
            "Question issued"
        );
        self.publish(
            session_id,
            SessionEventKind::QuestionReady,
            json!({
                "question_id": question.id,
                "question_number": question_number,
                "category": category,
                "difficulty": difficulty,
                "time_limit": question.time_limit,
            }),
        )
        .await;

        Ok(question.into())
    }

    pub async fn submit_answer(
        &self,
        user_id: Uuid,
        question_id: Uuid,
        response_text: String,
        time_taken: i32,
    ) -> Result<SubmitAnswerResponse> {
        if time_taken < 0 {
            return Err(Error::BadRequest("time_taken must not be negative".to_string()));
        }
        let lookup = self.store.get_question(question_id).await?;
        let session_id = lookup.question.session_id;

        let _guard = self.locks.acquire(session_id).await;
        let history = self.store.get_session_history(session_id).await?;
        let session = &history.session;
        ensure_owner(session, user_id)?;
        ensure_in_progress(session)?;

        let entry = history
            .questions
            .iter()
            .find(|q| q.question.id == question_id)
            .ok_or_else(|| Error::NotFound(format!("Question {} not found", question_id)))?;
        if entry.answer.is_some() {
            return Err(Error::InvalidState(format!(
                "Question {} has already been answered",
                question_id
            )));
        }
        let question = entry.question.clone();

        let resume = self.store.get_resume(session.resume_id).await?;
        let jd = self.store.get_job_description(session.jd_id).await?;
        let ctx = EvaluationContext {
            question_text: question.text.clone(),
            category: question.category,
            difficulty: question.difficulty,
            answer_text: response_text.clone(),
            time_taken,
            time_limit: question.time_limit,
            candidate_skills: resume.skills.clone(),
            jd_skills_required: jd.skills_required.clone(),
        };

        let evaluation = match self
            .with_llm_timeout("evaluation", self.llm.evaluate_answer(&ctx))
            .await
        {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!(%session_id, %question_id, error = ?e, "Evaluation degraded to neutral rubric");
                RubricEvaluation::neutral(DEGRADED_FEEDBACK)
            }
        };

        let breakdown = RubricBreakdown {
            accuracy: finite_or_neutral(evaluation.accuracy),
            clarity: finite_or_neutral(evaluation.clarity),
            depth: finite_or_neutral(evaluation.depth),
            relevance: finite_or_neutral(evaluation.relevance),
            time_efficiency: time_efficiency_score(time_taken, question.time_limit),
        };
        let penalty = time_penalty(time_taken, question.time_limit);
        let score = weighted_answer_score(&breakdown, penalty);

        let answer = self
            .store
            .create_answer(NewAnswer {
                question_id,
                response_text,
                time_taken,
                score,
                breakdown,
                time_penalty: penalty,
                feedback: evaluation.feedback,
                strengths: evaluation.strengths,
                improvements: evaluation.improvements,
            })
            .await?;

        let mut scores = history.scores();
        scores.push(score);
        let difficulty = next_difficulty(session.current_difficulty, score, question.sequence);
        if difficulty != session.current_difficulty {
            self.store
                .update_session(
                    session_id,
                    SessionPatch {
                        current_difficulty: Some(difficulty),
                        ..Default::default()
                    },
                )
                .await?;
        }

        info!(
            %session_id,
            %question_id,
            score = round_score(score, 1),
            next_difficulty = difficulty.as_str(),
            "Answer evaluated"
        );
        self.publish(
            session_id,
            SessionEventKind::AnswerEvaluated,
            json!({
                "question_id": question_id,
                "score": round_score(score, 1),
                "next_difficulty": difficulty,
            }),
        )
        .await;

        let end = now();
        let mut termination_reason = None;
        let mut report = None;
        if !should_continue(session.current_question_number, &scores, session.start_time, end) {
            let (status, reason) =
                match check_termination(&scores, session.start_time, end, false) {
                    Some(t) if session.current_question_number < MAX_QUESTIONS => {
                        (SessionStatus::Terminated, t.reason)
                    }
                    _ => (SessionStatus::Completed, MAX_QUESTIONS_REASON.to_string()),
                };
            // The stored history predates this answer.
            let history = self.store.get_session_history(session_id).await?;
            let (_, final_report) = self.end_locked(history, status, reason.clone()).await?;
            termination_reason = Some(reason);
            report = final_report;
        }

        Ok(SubmitAnswerResponse {
            answer_id: answer.id,
            question_id,
            score: round_score(answer.score, 1),
            breakdown: RubricBreakdown {
                accuracy: round_score(answer.breakdown.accuracy, 1),
                clarity: round_score(answer.breakdown.clarity, 1),
                depth: round_score(answer.breakdown.depth, 1),
                relevance: round_score(answer.breakdown.relevance, 1),
                time_efficiency: round_score(answer.breakdown.time_efficiency, 1),
            },
            time_penalty: answer.time_penalty,
            feedback: answer.feedback,
            strengths: answer.strengths,
            improvements: answer.improvements,
            next_difficulty: difficulty,
            interview_complete: termination_reason.is_some(),
            termination_reason,
            should_auto_submit: should_auto_submit(time_taken, question.time_limit),
            report,
        })
    }

    /// Ends the session on the candidate's request.
    pub async fn end_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        reason: Option<String>,
    ) -> Result<EndInterviewResponse> {
        let _guard = self.locks.acquire(session_id).await;
        let history = self.store.get_session_history(session_id).await?;
        ensure_owner(&history.session, user_id)?;
        ensure_in_progress(&history.session)?;

        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .or_else(|| {
                check_termination(&[], history.session.start_time, now(), true).map(|t| t.reason)
            })
            .unwrap_or_default();

        let (session, report) = self
            .end_locked(history, SessionStatus::Terminated, reason)
            .await?;
        Ok(EndInterviewResponse {
            session_id: session.id,
            status: session.status,
            end_time: session.end_time,
            total_duration: session.total_duration,
            early_termination_reason: session.early_termination_reason,
            report,
        })
    }

    /// Writes the report (when there is anything to report on) and closes the
    /// session. Callers hold the session lock.
    async fn end_locked(
        &self,
        history: SessionHistory,
        status: SessionStatus,
        reason: String,
    ) -> Result<(InterviewSession, Option<FinalReport>)> {
        let session_id = history.session.id;
        let end_time = now();
        let total_duration = whole_seconds(history.session.start_time, end_time).max(0);

        let records: Vec<AnswerRecord> = history
            .answered()
            .map(|(q, a)| AnswerRecord {
                category: q.category,
                score: a.score,
                time_efficiency: a.breakdown.time_efficiency,
                feedback: a.feedback.clone(),
            })
            .collect();

        let report = if records.is_empty() {
            info!(%session_id, "Session ended without answers; no report generated");
            None
        } else {
            let synthesized =
                synthesize_report(&records, history.questions.len() as i32, total_duration)?;
            let report = self
                .store
                .create_report(NewReport {
                    session_id,
                    overall_score: synthesized.overall_score,
                    skills: synthesized.skills,
                    performance_trend: synthesized.performance_trend,
                    strengths: synthesized.strengths,
                    weaknesses: synthesized.weaknesses,
                    recommendation: synthesized.recommendation,
                    recommendation_confidence: synthesized.recommendation_confidence,
                    question_count: synthesized.question_count,
                    average_time_per_question: synthesized.average_time_per_question,
                })
                .await?;
            Some(report)
        };

        let session = self
            .store
            .update_session(
                session_id,
                SessionPatch {
                    status: Some(status),
                    end_time: Some(end_time),
                    total_duration: Some(total_duration),
                    early_termination_reason: Some(reason.clone()),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            %session_id,
            status = status.as_str(),
            reason = %reason,
            overall_score = ?report.as_ref().map(|r| r.overall_score),
            "Interview session ended"
        );
        self.publish(
            session_id,
            SessionEventKind::StatusChanged,
            json!({
                "status": status,
                "reason": reason,
                "overall_score": report.as_ref().map(|r| r.overall_score),
            }),
        )
        .await;

        Ok((session, report))
    }

    pub async fn get_status(&self, user_id: Uuid, session_id: Uuid) -> Result<SessionStatusResponse> {
        let history = self.store.get_session_history(session_id).await?;
        let session = &history.session;
        ensure_owner(session, user_id)?;

        let observations: Vec<(QuestionCategory, f64)> = history
            .answered()
            .map(|(q, a)| (q.category, a.score))
            .collect();
        let as_of = session.end_time.unwrap_or_else(now);
        let metrics = performance_snapshot(&observations, session.start_time, as_of);

        Ok(SessionStatusResponse {
            session_id,
            status: session.status,
            current_question_number: session.current_question_number,
            questions_answered: metrics.questions_answered,
            current_difficulty: session.current_difficulty,
            start_time: session.start_time,
            average_score: round_score(metrics.average_score, 1),
            metrics,
        })
    }

    pub async fn get_report(&self, user_id: Uuid, session_id: Uuid) -> Result<ReportResponse> {
        let session = self.store.get_session(session_id).await?;
        ensure_owner(&session, user_id)?;

        match self.store.get_report(session_id).await? {
            Some(report) => Ok(ReportResponse {
                session_id,
                status: session.status,
                start_time: session.start_time,
                end_time: session.end_time,
                total_duration: session.total_duration,
                early_termination_reason: session.early_termination_reason,
                report,
            }),
            None if session.status.is_terminal() => Err(Error::InsufficientData(format!(
                "Session {} ended without any answers; no report available",
                session_id
            ))),
            None => Err(Error::InvalidState(format!(
                "Report for session {} has not been generated yet",
                session_id
            ))),
        }
    }
}
