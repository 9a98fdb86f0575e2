// ============================================================
// COLUMN INFO
// ============================================================
// Per-column result of structure inference

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type inferred for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Date,
    Number,
    String,
    Boolean,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Date => write!(f, "date"),
            ColumnType::Number => write!(f, "number"),
            ColumnType::String => write!(f, "string"),
            ColumnType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Descriptor of one column of the source grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Position of the column in the source grid
    pub index: usize,

    /// Display name, unique within one analysis
    pub name: String,

    /// Inferred semantic type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Up to a few rendered example values from the data region
    #[serde(default)]
    pub sample: Vec<String>,

    /// Unit parsed from the header text, if any
    #[serde(default)]
    pub unit: Option<String>,
}

impl ColumnInfo {
    pub fn new(index: usize, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            index,
            name: name.into(),
            column_type,
            sample: Vec::new(),
            unit: None,
        }
    }
}
