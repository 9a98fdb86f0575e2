pub mod config;
pub mod llm_client;
pub mod loader;
