pub mod chart_config;
pub mod chart_recommender;
pub mod data_cleaner;
pub mod structure_inference;
pub mod table_pipeline;
pub mod value_parsing;
