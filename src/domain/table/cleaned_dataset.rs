// ============================================================
// CLEANED DATASET
// ============================================================
// Typed table produced by the cleaner and handed to chart collaborators

use super::{ColumnInfo, ColumnType};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

/// A typed cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Source cell was blank or could not be coerced to the column type
    Missing,
    Number(f64),
    Date(NaiveDateTime),
    Boolean(bool),
    Text(String),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            CellValue::Date(dt) => Some(dt),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            CellValue::Missing => Value::Null,
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Date(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            CellValue::Boolean(b) => Value::Bool(*b),
            CellValue::Text(s) => Value::String(s.clone()),
        }
    }
}

/// One row; values are positionally aligned with the dataset's columns
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CleanedRow {
    values: Vec<CellValue>,
}

impl CleanedRow {
    pub fn new(values: Vec<CellValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }
}

/// Result of cleaning: retained columns plus typed rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedDataset {
    columns: Vec<ColumnInfo>,
    rows: Vec<CleanedRow>,

    /// Non-null source cells that became missing, per retained column
    coercion_failures: Vec<usize>,
}

impl CleanedDataset {
    pub fn new(
        columns: Vec<ColumnInfo>,
        rows: Vec<CleanedRow>,
        coercion_failures: Vec<usize>,
    ) -> Self {
        debug_assert!(rows.iter().all(|r| r.values.len() == columns.len()));
        debug_assert_eq!(coercion_failures.len(), columns.len());
        Self {
            columns,
            rows,
            coercion_failures,
        }
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn rows(&self) -> &[CleanedRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Typed value of `column` in row `row`
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.values.get(idx))
    }

    /// Row as (column name, value) pairs in column order
    pub fn row_map(&self, row: usize) -> Option<Vec<(&str, &CellValue)>> {
        let row = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .zip(row.values.iter())
                .map(|(c, v)| (c.name.as_str(), v))
                .collect(),
        )
    }

    /// Every value of one column, top to bottom
    pub fn column_values(&self, column: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|r| &r.values[idx]).collect())
    }

    pub fn missing_count(&self, column: &str) -> Option<usize> {
        self.column_values(column)
            .map(|values| values.iter().filter(|v| v.is_missing()).count())
    }

    pub fn coercion_failures(&self, column: &str) -> Option<usize> {
        self.column_index(column).map(|idx| self.coercion_failures[idx])
    }

    pub fn total_coercion_failures(&self) -> usize {
        self.coercion_failures.iter().sum()
    }

    pub fn columns_of_type(&self, column_type: ColumnType) -> Vec<&ColumnInfo> {
        self.columns
            .iter()
            .filter(|c| c.column_type == column_type)
            .collect()
    }

    /// Rows as JSON objects keyed by column name (the shape chart collaborators consume)
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.values.iter())
                    .map(|(c, v)| (c.name.clone(), v.to_json()))
                    .collect()
            })
            .collect()
    }
}
