pub mod app_config;
pub mod error;
pub mod pipeline_config;
pub mod recommender_config;
pub mod table;
