pub mod use_cases;

pub use use_cases::chart_config::{ChartConfigGenerator, ChartOptions};
pub use use_cases::chart_recommender::{ChartRecommender, ModelRecommender, RuleBasedRecommender};
pub use use_cases::data_cleaner::DataCleaner;
pub use use_cases::structure_inference::StructureInferenceEngine;
pub use use_cases::table_pipeline::{ProcessedTable, TableMetadata, TablePipeline};
