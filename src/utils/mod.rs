pub mod llm_json;
pub mod signature;
pub mod time;
pub mod token;
