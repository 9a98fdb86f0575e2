// ============================================================
// DELIMITED READER
// ============================================================
// CSV / TSV with an ordered encoding fallback

use csv::ReaderBuilder;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::table::{RawCell, RawGrid};

/// Reader for delimiter-separated text
pub struct DelimitedReader {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Encodings tried in order until one decodes without error
    encodings: Vec<&'static Encoding>,
}

impl DelimitedReader {
    /// Resolve encoding labels; unknown labels are a configuration error
    pub fn new(labels: &[String]) -> Result<Self> {
        let encodings = labels
            .iter()
            .map(|label| {
                Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
                    AppError::ValidationError(format!("unknown encoding label '{}'", label))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            delimiter: b',',
            encodings,
        })
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn read(&self, bytes: &[u8]) -> Result<RawGrid> {
        let content = self.decode(bytes)?;
        self.parse_content(&content)
    }

    /// Decode with the first encoding that accepts the bytes without replacement
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        for encoding in &self.encodings {
            let input = if *encoding == UTF_8 {
                bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
            } else {
                bytes
            };
            if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(input)
            {
                debug!(encoding = encoding.name(), "Decoded delimited file");
                return Ok(text.into_owned());
            }
        }

        let tried: Vec<&str> = self.encodings.iter().map(|e| e.name()).collect();
        Err(AppError::Decode(format!(
            "none of the encodings [{}] could decode the file",
            tried.join(", ")
        )))
    }

    /// Parse decoded text; no header row is assumed
    pub fn parse_content(&self, content: &str) -> Result<RawGrid> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::Decode(format!("Failed to parse row {}: {}", index + 1, e))
            })?;
            rows.push(record.iter().map(RawCell::from_text).collect());
        }

        Ok(RawGrid::from_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_reader() -> DelimitedReader {
        let labels = crate::domain::pipeline_config::PipelineConfig::default().csv_encodings;
        DelimitedReader::new(&labels).unwrap()
    }

    #[test]
    fn test_utf8_with_bom() {
        let grid = default_reader()
            .read("\u{feff}名称,数量\n苹果,3\n".as_bytes())
            .unwrap();

        assert_eq!(grid.cell(0, 0), &RawCell::Text("名称".to_string()));
        assert_eq!(grid.row_count(), 2);
    }

    #[test]
    fn test_gbk_fallback() {
        let (bytes, _, had_errors) = encoding_rs::GBK.encode("名称,数量\n苹果,3\n");
        assert!(!had_errors);

        let grid = default_reader().read(&bytes).unwrap();
        assert_eq!(grid.cell(1, 0), &RawCell::Text("苹果".to_string()));
    }

    #[test]
    fn test_all_encodings_fail() {
        let reader = DelimitedReader::new(&["utf-8".to_string()]).unwrap();
        let err = reader.read(&[0x66, 0xff, 0xfe, 0x0a]).unwrap_err();

        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn test_latin1_fallback_never_fails() {
        let reader =
            DelimitedReader::new(&["utf-8".to_string(), "latin1".to_string()]).unwrap();
        let grid = reader.read(&[b'c', b'a', b'f', 0xe9, b'\n']).unwrap();

        assert_eq!(grid.cell(0, 0), &RawCell::Text("café".to_string()));
    }

    #[test]
    fn test_ragged_rows_and_blank_cells() {
        let grid = default_reader().read(b"a,b,c\n1,,3\n4\n").unwrap();

        assert_eq!(grid.column_count(), 3);
        assert!(grid.cell(1, 1).is_null());
        assert!(grid.cell(2, 2).is_null());
    }

    #[test]
    fn test_quoted_fields() {
        let grid = default_reader()
            .read(b"name,amount\n\"Smith, J\",\"1,234\"\n")
            .unwrap();

        assert_eq!(grid.cell(1, 0), &RawCell::Text("Smith, J".to_string()));
        assert_eq!(grid.cell(1, 1), &RawCell::Text("1,234".to_string()));
    }

    #[test]
    fn test_unknown_label() {
        assert!(DelimitedReader::new(&["ebcdic-xyz".to_string()]).is_err());
    }
}
