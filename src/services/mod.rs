pub mod interview_service;
pub mod llm_prompts;
pub mod llm_service;
pub mod notification_service;
pub mod profile_service;
pub mod session_locks;
