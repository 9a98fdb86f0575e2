// ============================================================
// RAW CELL
// ============================================================
// Untyped scalar as read from the source file

use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;

/// A single untyped cell of a [`super::RawGrid`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawCell {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl RawCell {
    /// Build a text cell, treating blank text as null
    pub fn from_text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            RawCell::Null
        } else {
            RawCell::Text(value)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawCell::Null)
    }

    /// Canonical string rendering; `None` for null cells
    pub fn render(&self) -> Option<String> {
        match self {
            RawCell::Null => None,
            RawCell::Text(s) => Some(s.clone()),
            RawCell::Number(n) => Some(render_number(*n)),
            RawCell::Bool(b) => Some(b.to_string()),
            RawCell::DateTime(dt) => Some(render_datetime(dt)),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::from_text(value)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

/// Integral values render without a fractional part ("90", not "90.0")
fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn render_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
