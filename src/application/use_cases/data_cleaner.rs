// ============================================================
// DATA CLEANER
// ============================================================
// Slice the data region, drop empty rows/columns, coerce cells to column types

use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::use_cases::value_parsing::{parse_datetime, parse_number_lenient};
use crate::domain::error::{AppError, Result};
use crate::domain::pipeline_config::{BooleanVocabulary, PipelineConfig};
use crate::domain::table::{
    CellValue, CleanedDataset, CleanedRow, ColumnType, HeaderAnalysis, RawCell, RawGrid,
};

/// Turns a raw grid plus its header analysis into a typed dataset
pub struct DataCleaner {
    config: Arc<PipelineConfig>,
}

impl DataCleaner {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }

    /// Clean the grid. Only structural faults fail; cells that cannot be coerced
    /// become [`CellValue::Missing`] and are counted per column.
    pub fn clean(&self, grid: &RawGrid, analysis: &HeaderAnalysis) -> Result<CleanedDataset> {
        if analysis.data_start_row > grid.row_count() {
            return Err(AppError::Cleaning(format!(
                "data_start_row {} is beyond the grid ({} rows)",
                analysis.data_start_row,
                grid.row_count()
            )));
        }
        let width = analysis.columns.len();
        if width > grid.column_count() {
            return Err(AppError::Cleaning(format!(
                "analysis describes {} columns but the grid has {}",
                width,
                grid.column_count()
            )));
        }

        // Data region restricted to the analysed columns, fully-null rows dropped
        let rows: Vec<&[RawCell]> = grid.rows()[analysis.data_start_row..]
            .iter()
            .map(|r| &r[..width])
            .filter(|r| r.iter().any(|c| !c.is_null()))
            .collect();

        let kept: Vec<usize> = (0..width)
            .filter(|&c| rows.iter().any(|r| !r[c].is_null()))
            .collect();
        for (idx, column) in analysis.columns.iter().enumerate() {
            if !kept.contains(&idx) {
                debug!(column = %column.name, "Dropping fully empty column");
            }
        }

        let mut coercion_failures = vec![0usize; kept.len()];
        let cleaned_rows: Vec<CleanedRow> = rows
            .iter()
            .map(|row| {
                let values = kept
                    .iter()
                    .enumerate()
                    .map(|(slot, &c)| {
                        let cell = &row[c];
                        let value = coerce_cell(
                            cell,
                            analysis.columns[c].column_type,
                            &self.config.boolean_tokens,
                        );
                        if value.is_missing() && !cell.is_null() {
                            coercion_failures[slot] += 1;
                        }
                        value
                    })
                    .collect();
                CleanedRow::new(values)
            })
            .collect();

        let columns: Vec<_> = kept.iter().map(|&c| analysis.columns[c].clone()).collect();
        for (column, failures) in columns.iter().zip(coercion_failures.iter()) {
            if *failures > 0 {
                warn!(
                    column = %column.name,
                    column_type = %column.column_type,
                    failures,
                    "Cells could not be coerced and were marked missing"
                );
            }
        }

        Ok(CleanedDataset::new(columns, cleaned_rows, coercion_failures))
    }
}

/// Coerce one cell to `column_type`; never fails, unparseable cells become missing
pub fn coerce_cell(
    cell: &RawCell,
    column_type: ColumnType,
    vocabulary: &BooleanVocabulary,
) -> CellValue {
    let coerced = match (column_type, cell) {
        (_, RawCell::Null) => None,
        (ColumnType::Number, RawCell::Number(n)) => Some(CellValue::Number(*n)),
        (ColumnType::Number, RawCell::Bool(_)) => None,
        (ColumnType::Number, other) => other
            .render()
            .and_then(|s| parse_number_lenient(&s))
            .map(CellValue::Number),
        (ColumnType::Date, RawCell::DateTime(dt)) => Some(CellValue::Date(*dt)),
        (ColumnType::Date, RawCell::Text(s)) => parse_datetime(s).map(CellValue::Date),
        (ColumnType::Date, _) => None,
        (ColumnType::Boolean, RawCell::Bool(b)) => Some(CellValue::Boolean(*b)),
        (ColumnType::Boolean, other) => other
            .render()
            .and_then(|s| vocabulary.lookup(&s))
            .map(CellValue::Boolean),
        (ColumnType::String, other) => other.render().map(CellValue::Text),
    };
    coerced.unwrap_or(CellValue::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::structure_inference::StructureInferenceEngine;
    use crate::domain::table::ColumnInfo;
    use chrono::NaiveDate;

    fn grid(rows: &[&[&str]]) -> RawGrid {
        RawGrid::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|v| RawCell::from_text(*v)).collect())
                .collect(),
        )
    }

    fn config() -> Arc<PipelineConfig> {
        Arc::new(PipelineConfig::default())
    }

    fn run(g: &RawGrid) -> (HeaderAnalysis, CleanedDataset) {
        let analysis = StructureInferenceEngine::new(config()).analyze(g).unwrap();
        let dataset = DataCleaner::new(config()).clean(g, &analysis).unwrap();
        (analysis, dataset)
    }

    fn analysis_with(columns: Vec<ColumnInfo>, data_start_row: usize) -> HeaderAnalysis {
        HeaderAnalysis {
            header_rows: vec![0],
            header_tree: Vec::new(),
            data_start_row,
            columns,
            issues: Vec::new(),
            merged_cells: None,
        }
    }

    #[test]
    fn test_numeric_cleaning_counts_failures() {
        let g = grid(&[&["Amount"], &["¥1,234.56"], &["abc"], &["7"]]);
        let analysis = analysis_with(vec![ColumnInfo::new(0, "Amount", ColumnType::Number)], 1);
        let dataset = DataCleaner::new(config()).clean(&g, &analysis).unwrap();

        assert_eq!(dataset.value(0, "Amount"), Some(&CellValue::Number(1234.56)));
        assert_eq!(dataset.value(1, "Amount"), Some(&CellValue::Missing));
        assert_eq!(dataset.value(2, "Amount"), Some(&CellValue::Number(7.0)));
        assert_eq!(dataset.missing_count("Amount"), Some(1));
        assert_eq!(dataset.coercion_failures("Amount"), Some(1));
    }

    #[test]
    fn test_end_to_end_mixed_score_stays_string() {
        let g = grid(&[&["Name", "Score"], &["Alice", "90"], &["Bob", "n/a"]]);
        let (analysis, dataset) = run(&g);

        assert_eq!(analysis.header_rows, vec![0]);
        assert_eq!(analysis.data_start_row, 1);
        assert_eq!(analysis.columns[1].column_type, ColumnType::String);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.value(0, "Score"), Some(&CellValue::Text("90".into())));
        assert_eq!(dataset.value(1, "Score"), Some(&CellValue::Text("n/a".into())));
        assert_eq!(dataset.total_coercion_failures(), 0);
    }

    #[test]
    fn test_empty_rows_and_columns_are_dropped() {
        let g = grid(&[
            &["Name", "Blank", "Score"],
            &["Alice", "", "90"],
            &["", "", ""],
            &["Bob", "", "85"],
        ]);
        let (analysis, dataset) = run(&g);

        assert_eq!(analysis.columns.len(), 3);
        assert_eq!(dataset.row_count(), 2);
        let names: Vec<_> = dataset.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Score"]);
        assert!(dataset.row_count() <= g.row_count() - analysis.header_rows.len());
        assert!(dataset.rows().iter().all(|r| r.values().len() == 2));
    }

    #[test]
    fn test_date_and_boolean_columns() {
        let (_, dataset) = run(&grid(&[
            &["Day", "Active"],
            &["2023-01-01", "是"],
            &["2023-02-01", "否"],
        ]));

        let jan = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(dataset.value(0, "Day"), Some(&CellValue::Date(jan)));
        assert_eq!(dataset.value(0, "Active"), Some(&CellValue::Boolean(true)));
        assert_eq!(dataset.value(1, "Active"), Some(&CellValue::Boolean(false)));
    }

    #[test]
    fn test_unmapped_boolean_becomes_missing() {
        let vocab = BooleanVocabulary::default();

        assert_eq!(
            coerce_cell(&RawCell::from_text("maybe"), ColumnType::Boolean, &vocab),
            CellValue::Missing
        );
        assert_eq!(
            coerce_cell(&RawCell::Number(1.0), ColumnType::Boolean, &vocab),
            CellValue::Boolean(true)
        );
        assert_eq!(
            coerce_cell(&RawCell::from_text("YES"), ColumnType::Boolean, &vocab),
            CellValue::Boolean(true)
        );
    }

    #[test]
    fn test_unparseable_date_becomes_missing() {
        let g = grid(&[&["When"], &["2023-01-01"], &["soon"], &[""]]);
        let analysis = analysis_with(vec![ColumnInfo::new(0, "When", ColumnType::Date)], 1);
        let dataset = DataCleaner::new(config()).clean(&g, &analysis).unwrap();

        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.missing_count("When"), Some(1));
        assert_eq!(dataset.coercion_failures("When"), Some(1));
    }

    #[test]
    fn test_extra_grid_columns_are_ignored() {
        let g = grid(&[&["a", "b", "c"], &["1", "2", "3"]]);
        let analysis = analysis_with(vec![ColumnInfo::new(0, "a", ColumnType::Number)], 1);
        let dataset = DataCleaner::new(config()).clean(&g, &analysis).unwrap();

        assert_eq!(dataset.column_count(), 1);
        assert_eq!(dataset.value(0, "a"), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_row_order_is_stable() {
        let (_, dataset) = run(&grid(&[&["n"], &["c"], &[""], &["a"], &["b"]]));
        let values: Vec<_> = dataset
            .column_values("n")
            .unwrap()
            .into_iter()
            .filter_map(|v| v.as_str())
            .collect();

        assert_eq!(values, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_header_only_grid_yields_empty_dataset() {
        let (_, dataset) = run(&grid(&[&["a", "b"]]));

        assert!(dataset.is_empty());
        assert_eq!(dataset.column_count(), 0);
    }

    #[test]
    fn test_structural_faults() {
        let g = grid(&[&["a"], &["1"]]);
        let cleaner = DataCleaner::new(config());

        let beyond = analysis_with(vec![ColumnInfo::new(0, "a", ColumnType::Number)], 5);
        assert!(matches!(cleaner.clean(&g, &beyond), Err(AppError::Cleaning(_))));

        let too_wide = analysis_with(
            vec![
                ColumnInfo::new(0, "a", ColumnType::Number),
                ColumnInfo::new(1, "b", ColumnType::Number),
            ],
            1,
        );
        assert!(matches!(cleaner.clean(&g, &too_wide), Err(AppError::Cleaning(_))));
    }
}
