pub mod config;
pub mod database;
pub mod dto;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::PgPool;

use crate::services::{
    interview_service::InterviewService,
    llm_service::{InterviewLlm, OpenAiLlm},
    notification_service::{EventSink, NoopEventSink, NotificationService},
    profile_service::ProfileService,
};
use crate::store::{InterviewStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub interview_service: InterviewService,
    pub profile_service: ProfileService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn InterviewStore>,
        llm: Arc<dyn InterviewLlm>,
        events: Arc<dyn EventSink>,
        llm_timeout: Duration,
    ) -> Self {
        let interview_service =
            InterviewService::new(store.clone(), llm.clone(), events, llm_timeout);
        let profile_service = ProfileService::new(store, llm, llm_timeout);
        Self {
            interview_service,
            profile_service,
        }
    }

    /// Production wiring: Postgres store, OpenAI-compatible LLM and, when a
    /// webhook target is configured, the Postgres notification outbox.
    pub fn from_config(pool: PgPool) -> error::Result<Self> {
        let config = config::get_config();
        let llm_timeout = Duration::from_secs(config.llm_timeout_secs);
        let http_client = Client::builder().timeout(llm_timeout).build()?;

        let store: Arc<dyn InterviewStore> = Arc::new(PgStore::new(pool.clone()));
        let llm: Arc<dyn InterviewLlm> = Arc::new(OpenAiLlm::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
            http_client.clone(),
        ));
        let events: Arc<dyn EventSink> = match &config.notify_webhook_url {
            Some(url) => Arc::new(NotificationService::new(
                pool,
                http_client,
                url.clone(),
                config.webhook_secret.clone(),
            )),
            None => Arc::new(NoopEventSink),
        };

        Ok(Self::new(store, llm, events, llm_timeout))
    }
}
