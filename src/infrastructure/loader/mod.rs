// ============================================================
// FILE LOADER
// ============================================================
// Decode uploaded bytes into an untyped grid, dispatching on the file extension

mod delimited;
pub(crate) mod spreadsheet;

pub use delimited::DelimitedReader;
pub use spreadsheet::{cell_from_calamine, SpreadsheetKind, SpreadsheetReader};

use std::sync::Arc;

use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::pipeline_config::PipelineConfig;
use crate::domain::table::RawGrid;

/// Source format selected from a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Spreadsheet(SpreadsheetKind),
    Delimited { delimiter: u8 },
}

impl FileFormat {
    /// Lower-cased extension of `filename`, without the dot; empty when there is none
    pub fn extension_of(filename: &str) -> String {
        match filename.rsplit_once('.') {
            Some((_, ext)) => ext.trim().to_lowercase(),
            None => String::new(),
        }
    }

    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Self::extension_of(filename);
        match ext.as_str() {
            "xlsx" => Ok(FileFormat::Spreadsheet(SpreadsheetKind::Xlsx)),
            "xls" => Ok(FileFormat::Spreadsheet(SpreadsheetKind::Xls)),
            "ods" => Ok(FileFormat::Spreadsheet(SpreadsheetKind::Ods)),
            "csv" => Ok(FileFormat::Delimited { delimiter: b',' }),
            "tsv" => Ok(FileFormat::Delimited { delimiter: b'\t' }),
            _ => Err(AppError::UnsupportedFormat(ext)),
        }
    }
}

/// Reads any supported format into a [`RawGrid`]. Pure: bytes in, grid out.
pub struct FileLoader {
    config: Arc<PipelineConfig>,
}

impl FileLoader {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }

    pub fn load(&self, bytes: &[u8], filename: &str) -> Result<RawGrid> {
        let format = FileFormat::from_filename(filename)?;

        let grid = match format {
            FileFormat::Delimited { delimiter } => {
                DelimitedReader::new(&self.config.csv_encodings)?
                    .with_delimiter(delimiter)
                    .read(bytes)?
            }
            FileFormat::Spreadsheet(kind) => SpreadsheetReader::new(kind).read(bytes)?,
        };

        info!(
            file = filename,
            rows = grid.row_count(),
            columns = grid.column_count(),
            "Loaded raw grid"
        );
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::RawCell;

    fn loader() -> FileLoader {
        FileLoader::new(Arc::new(PipelineConfig::default()))
    }

    #[test]
    fn test_format_dispatch() {
        assert_eq!(
            FileFormat::from_filename("data.CSV").unwrap(),
            FileFormat::Delimited { delimiter: b',' }
        );
        assert_eq!(
            FileFormat::from_filename("data.tsv").unwrap(),
            FileFormat::Delimited { delimiter: b'\t' }
        );
        assert_eq!(
            FileFormat::from_filename("book.final.xlsx").unwrap(),
            FileFormat::Spreadsheet(SpreadsheetKind::Xlsx)
        );
        assert_eq!(
            FileFormat::from_filename("sheet.ods").unwrap(),
            FileFormat::Spreadsheet(SpreadsheetKind::Ods)
        );
    }

    #[test]
    fn test_unsupported_extension_is_named() {
        assert_eq!(
            FileFormat::from_filename("notes.docx").unwrap_err(),
            AppError::UnsupportedFormat("docx".to_string())
        );
        assert_eq!(
            FileFormat::from_filename("README").unwrap_err(),
            AppError::UnsupportedFormat(String::new())
        );
    }

    #[test]
    fn test_load_csv_counts() {
        let grid = loader()
            .load(b"Name,Score\nAlice,90\nBob,n/a\n", "scores.csv")
            .unwrap();

        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.cell(0, 0), &RawCell::Text("Name".to_string()));
        assert_eq!(grid.cell(2, 1), &RawCell::Text("n/a".to_string()));
    }

    #[test]
    fn test_load_tsv_counts() {
        let grid = loader()
            .load("a\tb\tc\n1\t2\t3\n".as_bytes(), "t.tsv")
            .unwrap();

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 3);
    }

    #[test]
    fn test_corrupt_workbook_is_a_decode_error() {
        let err = loader().load(b"definitely not a zip", "book.xlsx").unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }
}
