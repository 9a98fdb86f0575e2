// ============================================================
// TABLE PIPELINE
// ============================================================
// Upload validation followed by Loader -> Inference -> Cleaner

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::data_cleaner::DataCleaner;
use super::structure_inference::StructureInferenceEngine;
use crate::domain::error::{AppError, PipelineError, PipelineStage, Result};
use crate::domain::pipeline_config::PipelineConfig;
use crate::domain::table::{CleanedDataset, HeaderAnalysis};
use crate::infrastructure::loader::{FileFormat, FileLoader};

/// Facts about the processed upload, reported next to the data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMetadata {
    pub original_filename: String,
    pub file_size: usize,
    pub sha256: String,
    pub rows_count: usize,
    pub columns_count: usize,
    pub issues_found: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

/// Everything one pipeline run produces
#[derive(Debug, Clone)]
pub struct ProcessedTable {
    pub analysis: HeaderAnalysis,
    pub dataset: CleanedDataset,
    pub metadata: TableMetadata,
}

pub struct TablePipeline {
    config: Arc<PipelineConfig>,
    loader: FileLoader,
    engine: StructureInferenceEngine,
    cleaner: DataCleaner,
}

impl TablePipeline {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self {
            loader: FileLoader::new(config.clone()),
            engine: StructureInferenceEngine::new(config.clone()),
            cleaner: DataCleaner::new(config.clone()),
            config,
        }
    }

    /// Replace the inference engine, e.g. to register extra header heuristics
    pub fn with_engine(mut self, engine: StructureInferenceEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Check the extension allow-list and the size ceiling before any decoding
    pub fn validate_upload(&self, filename: &str, size: usize) -> Result<FileFormat> {
        let ext = FileFormat::extension_of(filename);
        if !self.config.is_supported_extension(&ext) {
            return Err(AppError::UnsupportedFormat(ext));
        }
        if size > self.config.max_file_size_bytes {
            return Err(AppError::FileTooLarge {
                size,
                limit: self.config.max_file_size_bytes,
            });
        }
        if size == 0 {
            return Err(AppError::ValidationError("uploaded file is empty".to_string()));
        }
        FileFormat::from_filename(filename)
    }

    pub fn process(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> std::result::Result<ProcessedTable, PipelineError> {
        info!(file = filename, size = bytes.len(), "Received file");

        let fail = |stage: PipelineStage| {
            move |error: AppError| {
                warn!(file = filename, %stage, %error, "Pipeline stage failed");
                PipelineError::new(stage, filename, error)
            }
        };

        self.validate_upload(filename, bytes.len())
            .map_err(fail(PipelineStage::Validation))?;

        let grid = self
            .loader
            .load(bytes, filename)
            .map_err(fail(PipelineStage::Loading))?;

        let analysis = self
            .engine
            .analyze(&grid)
            .map_err(fail(PipelineStage::StructureInference))?;

        let dataset = self
            .cleaner
            .clean(&grid, &analysis)
            .map_err(fail(PipelineStage::Cleaning))?;

        let metadata = TableMetadata {
            original_filename: filename.to_string(),
            file_size: bytes.len(),
            sha256: hex::encode(Sha256::digest(bytes)),
            rows_count: dataset.row_count(),
            columns_count: dataset.column_count(),
            issues_found: analysis.issues.clone(),
            processed_at: Utc::now(),
        };

        info!(
            file = filename,
            rows = metadata.rows_count,
            columns = metadata.columns_count,
            issues = metadata.issues_found.len(),
            "File processed"
        );

        Ok(ProcessedTable {
            analysis,
            dataset,
            metadata,
        })
    }
}
