// ============================================================
// STRUCTURE & TYPE INFERENCE
// ============================================================
// Detect the header boundary and infer one semantic type per column

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::use_cases::value_parsing::{extract_unit, is_date_cell, is_numeric_cell};
use crate::domain::error::{AppError, Result};
use crate::domain::pipeline_config::PipelineConfig;
use crate::domain::table::{ColumnInfo, ColumnType, HeaderAnalysis, MergedCellSignal, RawGrid};

/// Issue recorded when the header heuristic fires
pub const MERGED_CELLS_ISSUE: &str = "detected merged cells";

/// A replaceable heuristic that looks for irregular (merged) header rows
pub trait HeaderHeuristic: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, grid: &RawGrid) -> Option<MergedCellSignal>;
}

/// Flags the first leading row in which a non-null value repeats.
///
/// Spreadsheet cell merging leaves the merged label copied across the spanned
/// cells. Legitimately repeated category labels produce false positives.
#[derive(Debug, Clone)]
pub struct DuplicateValueHeuristic {
    scan_rows: usize,
}

impl DuplicateValueHeuristic {
    pub fn new(scan_rows: usize) -> Self {
        Self { scan_rows }
    }
}

impl HeaderHeuristic for DuplicateValueHeuristic {
    fn name(&self) -> &'static str {
        "duplicate_values"
    }

    fn detect(&self, grid: &RawGrid) -> Option<MergedCellSignal> {
        (0..self.scan_rows.min(grid.row_count())).find_map(|row| {
            let values: Vec<String> = grid
                .row(row)?
                .iter()
                .filter_map(|cell| cell.render())
                .collect();
            let distinct: HashSet<&str> = values.iter().map(|v| v.as_str()).collect();
            let duplicate_count = values.len() - distinct.len();

            (duplicate_count > 0).then(|| MergedCellSignal {
                row,
                duplicate_count,
                confidence: duplicate_count as f64 / values.len() as f64,
            })
        })
    }
}

/// Infers a [`HeaderAnalysis`] from a raw grid
pub struct StructureInferenceEngine {
    config: Arc<PipelineConfig>,
    heuristic: Box<dyn HeaderHeuristic>,
}

impl StructureInferenceEngine {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        let heuristic = Box::new(DuplicateValueHeuristic::new(config.header_scan_rows));
        Self { config, heuristic }
    }

    /// Replace the merged-cell heuristic
    pub fn with_heuristic(mut self, heuristic: Box<dyn HeaderHeuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Analyze the grid. Heuristic misses become issues; only a grid without
    /// rows or columns is an error.
    pub fn analyze(&self, grid: &RawGrid) -> Result<HeaderAnalysis> {
        if grid.is_empty() {
            return Err(AppError::StructureInference(format!(
                "grid has no content ({} rows, {} columns)",
                grid.row_count(),
                grid.column_count()
            )));
        }

        let mut issues = Vec::new();
        let mut header_rows = vec![0];
        let mut data_start_row = 1;

        let merged_cells = if self.config.detect_merged_cells {
            self.heuristic.detect(grid)
        } else {
            None
        };
        if let Some(signal) = &merged_cells {
            warn!(
                heuristic = self.heuristic.name(),
                row = signal.row,
                confidence = signal.confidence,
                "Header looks merged, widening header to two rows"
            );
            header_rows = (0..2).filter(|r| *r < grid.row_count()).collect();
            data_start_row = 2.min(grid.row_count());
            issues.push(MERGED_CELLS_ISSUE.to_string());
        }

        let empty_rows: Vec<usize> = (0..grid.row_count())
            .filter(|r| grid.is_row_empty(*r))
            .collect();
        if !empty_rows.is_empty() {
            issues.push(format!("found empty rows: {:?}", empty_rows));
        }

        let mut columns: Vec<ColumnInfo> = (0..grid.column_count())
            .map(|c| self.infer_column(grid, c, data_start_row))
            .collect();
        issues.extend(dedupe_column_names(&mut columns));

        let mut analysis = HeaderAnalysis {
            header_rows,
            header_tree: Vec::new(),
            data_start_row,
            columns,
            issues,
            merged_cells,
        };
        if analysis.has_multi_row_header() {
            analysis.header_tree = analysis
                .header_rows
                .iter()
                .filter_map(|r| grid.row(*r))
                .map(|row| row.iter().map(|c| c.render().unwrap_or_default()).collect())
                .collect();
        }

        Ok(analysis)
    }

    fn infer_column(&self, grid: &RawGrid, column: usize, data_start_row: usize) -> ColumnInfo {
        let name = grid
            .cell(0, column)
            .render()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("{} {}", self.config.placeholder_prefix, column + 1));

        let column_type = self.infer_type(grid, column, data_start_row);
        let sample = grid
            .column_values(column, data_start_row)
            .take(self.config.sample_size)
            .filter_map(|c| c.render())
            .collect();
        let unit = extract_unit(&name, &self.config.unit_tokens);

        debug!(column, name = %name, column_type = %column_type, unit = ?unit, "Inferred column");

        ColumnInfo {
            index: column,
            name,
            column_type,
            sample,
            unit,
        }
    }

    /// number, then date, then boolean, else string; first match wins
    fn infer_type(&self, grid: &RawGrid, column: usize, data_start_row: usize) -> ColumnType {
        let values: Vec<_> = grid.column_values(column, data_start_row).collect();
        if values.is_empty() {
            return ColumnType::String;
        }

        if values.iter().all(|c| is_numeric_cell(c)) {
            return ColumnType::Number;
        }
        if values.iter().all(|c| is_date_cell(c)) {
            return ColumnType::Date;
        }

        let vocab = &self.config.boolean_tokens;
        let all_boolean = values
            .iter()
            .filter_map(|c| c.render())
            .all(|v| vocab.contains(&v));
        if all_boolean {
            return ColumnType::Boolean;
        }

        ColumnType::String
    }
}

/// Rename repeated column names to `<name>_<n>`; returns one issue per rename
fn dedupe_column_names(columns: &mut [ColumnInfo]) -> Vec<String> {
    let mut taken: HashSet<String> = columns.iter().map(|c| c.name.clone()).collect();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut issues = Vec::new();

    for column in columns.iter_mut() {
        let count = seen.entry(column.name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            continue;
        }

        let mut suffix = *count;
        let mut candidate = format!("{}_{}", column.name, suffix);
        while taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}_{}", column.name, suffix);
        }
        issues.push(format!(
            "renamed duplicate column '{}' to '{}'",
            column.name, candidate
        ));
        taken.insert(candidate.clone());
        column.name = candidate;
    }

    issues
}
