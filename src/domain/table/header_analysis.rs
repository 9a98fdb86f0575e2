// ============================================================
// HEADER ANALYSIS
// ============================================================
// Result of structure inference over a raw grid

use super::ColumnInfo;
use serde::{Deserialize, Serialize};

/// Evidence that the leading rows contain merged spreadsheet cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCellSignal {
    /// Row in which the duplicates were found
    pub row: usize,

    /// How many non-null values repeat an earlier value of the same row
    pub duplicate_count: usize,

    /// duplicate_count / non-null values in that row (0.0 - 1.0)
    pub confidence: f64,
}

/// Header boundary, column descriptors and advisory issues of one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderAnalysis {
    /// Row indices holding header material, ascending
    pub header_rows: Vec<usize>,

    /// Labels of each header row when the header spans several rows
    pub header_tree: Vec<Vec<String>>,

    /// First row of the data region
    pub data_start_row: usize,

    pub columns: Vec<ColumnInfo>,

    /// Human-readable diagnostics, never errors
    pub issues: Vec<String>,

    #[serde(default)]
    pub merged_cells: Option<MergedCellSignal>,
}

impl HeaderAnalysis {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_multi_row_header(&self) -> bool {
        self.header_rows.len() > 1
    }
}
