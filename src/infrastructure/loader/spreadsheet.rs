// ============================================================
// SPREADSHEET READER
// ============================================================
// First worksheet of an xlsx / xls / ods workbook via calamine

use std::io::Cursor;

use calamine::{Data, DataType, Ods, Range, Reader, Xls, Xlsx};
use tracing::{debug, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::table::{RawCell, RawGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    Xlsx,
    Xls,
    Ods,
}

pub struct SpreadsheetReader {
    kind: SpreadsheetKind,
}

impl SpreadsheetReader {
    pub fn new(kind: SpreadsheetKind) -> Self {
        Self { kind }
    }

    /// Read the first worksheet. A workbook without sheets yields an empty grid.
    pub fn read(&self, bytes: &[u8]) -> Result<RawGrid> {
        let cursor = Cursor::new(bytes);
        let range = match self.kind {
            SpreadsheetKind::Xlsx => {
                let mut workbook = Xlsx::new(cursor).map_err(open_error)?;
                workbook.worksheet_range_at(0).map(|r| r.map_err(read_error))
            }
            SpreadsheetKind::Xls => {
                let mut workbook = Xls::new(cursor).map_err(open_error)?;
                workbook.worksheet_range_at(0).map(|r| r.map_err(read_error))
            }
            SpreadsheetKind::Ods => {
                let mut workbook = Ods::new(cursor).map_err(open_error)?;
                workbook.worksheet_range_at(0).map(|r| r.map_err(read_error))
            }
        };

        match range {
            Some(range) => Ok(grid_from_range(&range?)),
            None => {
                warn!(kind = ?self.kind, "Workbook has no worksheets");
                Ok(RawGrid::default())
            }
        }
    }
}

fn open_error(e: impl std::fmt::Display) -> AppError {
    AppError::Decode(format!("Failed to open workbook: {}", e))
}

fn read_error(e: impl std::fmt::Display) -> AppError {
    AppError::Decode(format!("Failed to read worksheet: {}", e))
}

/// Convert a used range into a grid anchored at A1, so leading blank rows
/// and columns keep their sheet positions.
fn grid_from_range(range: &Range<Data>) -> RawGrid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    debug!(row_offset, col_offset, "Worksheet used range");

    let mut rows: Vec<Vec<RawCell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![RawCell::Null; col_offset];
        cells.extend(row.iter().map(cell_from_calamine));
        rows.push(cells);
    }

    RawGrid::from_rows(rows)
}

/// Map one calamine cell onto a [`RawCell`]. Error cells read as null.
pub fn cell_from_calamine(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Null,
        Data::String(s) => RawCell::from_text(s),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) => RawCell::DateTime(dt),
            None => cell.as_f64().map(RawCell::Number).unwrap_or(RawCell::Null),
        },
        Data::DateTimeIso(s) => match cell.as_datetime() {
            Some(dt) => RawCell::DateTime(dt),
            None => RawCell::from_text(s),
        },
        Data::DurationIso(s) => RawCell::from_text(s),
    }
}
