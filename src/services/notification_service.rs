use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::utils::signature::{sign_payload, SIGNATURE_HEADER};

/// First retry waits this long; each later one doubles it.
pub const BASE_RETRY_SECS: i64 = 30;
pub const MAX_DELIVERY_ATTEMPTS: i32 = 3;
/// A `delivering` row untouched for this long is treated as abandoned by a
/// crashed worker and becomes claimable again.
pub const DELIVERY_LEASE_SECS: i64 = 300;

const CLAIM_DUE_EVENT: &str = r#"
    UPDATE session_events SET status = 'delivering', updated_at = NOW()
    WHERE id = (
        SELECT id FROM session_events
        WHERE (status = 'pending' AND (next_retry_at IS NULL OR next_retry_at <= NOW()))
           OR (status = 'delivering' AND updated_at < NOW() - make_interval(secs => $1))
        ORDER BY created_at ASC
        FOR UPDATE SKIP LOCKED
        LIMIT 1
    )
    RETURNING id, session_id, event_type, payload, attempts, max_attempts, created_at
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionEventKind {
    QuestionReady,
    AnswerEvaluated,
    StatusChanged,
}

impl SessionEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionEventKind::QuestionReady => "question-ready",
            SessionEventKind::AnswerEvaluated => "answer-evaluated",
            SessionEventKind::StatusChanged => "status-changed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    pub session_id: Uuid,
    pub kind: SessionEventKind,
    pub payload: JsonValue,
}

/// Where the interview service reports session events. Delivery is best
/// effort; callers log a failed publish and carry on.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: SessionEvent) -> Result<()>;
}

/// Used when no webhook target is configured.
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(&self, event: SessionEvent) -> Result<()> {
        tracing::debug!(session_id = %event.session_id, event = event.kind.as_str(), "Notifications disabled; dropping event");
        Ok(())
    }
}

/// Seconds to wait before retrying after `attempts` failed deliveries.
pub fn retry_delay_secs(attempts: i32) -> i64 {
    let exponent = (attempts - 1).clamp(0, 16) as u32;
    BASE_RETRY_SECS * 2_i64.pow(exponent)
}

#[derive(Debug, FromRow)]
struct ClaimedEvent {
    id: Uuid,
    session_id: Uuid,
    event_type: String,
    payload: JsonValue,
    attempts: i32,
    max_attempts: i32,
    created_at: DateTime<Utc>,
}

/// Postgres outbox for session events plus the worker that delivers them.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    client: Client,
    target_url: String,
    secret: String,
}

impl NotificationService {
    pub fn new(pool: PgPool, client: Client, target_url: String, secret: String) -> Self {
        Self {
            pool,
            client,
            target_url,
            secret,
        }
    }

    pub async fn enqueue(&self, event: &SessionEvent) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO session_events (session_id, event_type, payload, max_attempts)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(event.session_id)
        .bind(event.kind.as_str())
        .bind(&event.payload)
        .bind(MAX_DELIVERY_ATTEMPTS)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Claims and delivers one due event, including one whose delivery lease
    /// has lapsed. Returns `false` when nothing is due.
    pub async fn run_once(&self) -> Result<bool> {
        let claimed = sqlx::query_as::<_, ClaimedEvent>(CLAIM_DUE_EVENT)
            .bind(DELIVERY_LEASE_SECS as f64)
            .fetch_optional(&self.pool)
            .await?;

        let Some(event) = claimed else {
            return Ok(false);
        };

        let body = serde_json::to_vec(&json!({
            "event": event.event_type,
            "session_id": event.session_id,
            "payload": event.payload,
            "created_at": event.created_at,
        }))?;
        let signature = sign_payload(&self.secret, &body)?;

        let outcome = self
            .client
            .post(&self.target_url)
            .header(SIGNATURE_HEADER, signature)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await;

        let (http_status, response_body, delivered) = match outcome {
            Ok(resp) => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                (Some(status.as_u16() as i32), text, status.is_success())
            }
            Err(e) => (None, e.to_string(), false),
        };

        let attempts = event.attempts + 1;
        if delivered {
            sqlx::query(
                r#"UPDATE session_events
                   SET status = 'delivered', attempts = $2, http_status = $3, response_body = $4,
                       updated_at = NOW()
                   WHERE id = $1"#,
            )
            .bind(event.id)
            .bind(attempts)
            .bind(http_status)
            .bind(&response_body)
            .execute(&self.pool)
            .await?;
            return Ok(true);
        }

        let exhausted = attempts >= event.max_attempts;
        tracing::warn!(
            event_id = %event.id,
            session_id = %event.session_id,
            attempts,
            exhausted,
            "Session event delivery failed"
        );
        sqlx::query(
            r#"UPDATE session_events
               SET status = $2, attempts = $3, http_status = $4, response_body = $5,
                   next_retry_at = NOW() + make_interval(secs => $6), updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(event.id)
        .bind(if exhausted { "failed" } else { "pending" })
        .bind(attempts)
        .bind(http_status)
        .bind(&response_body)
        .bind(retry_delay_secs(attempts) as f64)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }
}

#[async_trait]
impl EventSink for NotificationService {
    async fn publish(&self, event: SessionEvent) -> Result<()> {
        self.enqueue(&event).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_thirty_seconds() {
        assert_eq!(retry_delay_secs(1), 30);
        assert_eq!(retry_delay_secs(2), 60);
        assert_eq!(retry_delay_secs(3), 120);
        assert_eq!(retry_delay_secs(0), 30);
    }

    #[test]
    fn event_kinds_use_kebab_case() {
        assert_eq!(SessionEventKind::QuestionReady.as_str(), "question-ready");
        assert_eq!(
            serde_json::to_value(SessionEventKind::AnswerEvaluated).unwrap(),
            json!("answer-evaluated")
        );
    }

    #[test]
    fn claim_reclaims_lapsed_deliveries() {
        assert!(CLAIM_DUE_EVENT.contains("status = 'delivering' AND updated_at < NOW()"));
        assert!(CLAIM_DUE_EVENT.contains("FOR UPDATE SKIP LOCKED"));
        assert!(DELIVERY_LEASE_SECS > retry_delay_secs(MAX_DELIVERY_ATTEMPTS));
    }
}
