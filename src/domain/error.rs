use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppError {
    UnsupportedFormat(String),
    FileTooLarge { size: usize, limit: usize },
    Decode(String),
    StructureInference(String),
    Cleaning(String),
    ValidationError(String),
    LlmError(String),
    IoError(String),
    Internal(String),
}

impl AppError {
    /// Errors caused by the uploaded file itself rather than by a fault in the pipeline.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::UnsupportedFormat(_)
                | AppError::FileTooLarge { .. }
                | AppError::Decode(_)
                | AppError::ValidationError(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::UnsupportedFormat(ext) => {
                write!(f, "Unsupported file format: '.{}'", ext)
            }
            AppError::FileTooLarge { size, limit } => write!(
                f,
                "File too large: {} bytes exceeds the {} byte limit",
                size, limit
            ),
            AppError::Decode(msg) => write!(
                f,
                "Decode error: {} (try re-saving the file as UTF-8)",
                msg
            ),
            AppError::StructureInference(msg) => write!(f, "Structure inference error: {}", msg),
            AppError::Cleaning(msg) => write!(f, "Cleaning error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::LlmError(msg) => write!(f, "LLM error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validation,
    Loading,
    StructureInference,
    Cleaning,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Validation => write!(f, "validation"),
            PipelineStage::Loading => write!(f, "loading"),
            PipelineStage::StructureInference => write!(f, "structure_inference"),
            PipelineStage::Cleaning => write!(f, "cleaning"),
        }
    }
}

/// An [`AppError`] tagged with the stage and the file it happened on.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub file: String,
    pub error: AppError,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, file: impl Into<String>, error: AppError) -> Self {
        Self {
            stage,
            file: file.into(),
            error,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.file, self.error)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
