pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use application::use_cases::table_pipeline::{ProcessedTable, TableMetadata, TablePipeline};
pub use domain::error::{AppError, PipelineError, PipelineStage, Result};
pub use domain::pipeline_config::PipelineConfig;
pub use domain::table::{
    CellValue, CleanedDataset, ColumnInfo, ColumnType, HeaderAnalysis, RawGrid,
};
pub use infrastructure::loader::FileLoader;
