// ============================================================
// PIPELINE CONFIGURATION
// ============================================================
// Immutable vocabulary and limits shared by every pipeline stage

use serde::{Deserialize, Serialize};

/// Tokens recognized as boolean values (matched case-insensitively)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanVocabulary {
    pub truthy: Vec<String>,
    pub falsy: Vec<String>,
}

impl Default for BooleanVocabulary {
    fn default() -> Self {
        Self {
            truthy: to_strings(&["true", "是", "yes", "1"]),
            falsy: to_strings(&["false", "否", "no", "0"]),
        }
    }
}

impl BooleanVocabulary {
    /// Map a token to its boolean value; unknown tokens map to `None`
    pub fn lookup(&self, token: &str) -> Option<bool> {
        let token = token.trim().to_lowercase();
        if self.truthy.iter().any(|t| t.to_lowercase() == token) {
            Some(true)
        } else if self.falsy.iter().any(|t| t.to_lowercase() == token) {
            Some(false)
        } else {
            None
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }
}

/// Configuration for structure inference and cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Accepted file extensions, lower-case, without the dot
    pub supported_extensions: Vec<String>,

    /// Upload size ceiling in bytes (default: 20 MiB)
    pub max_file_size_bytes: usize,

    /// Encodings tried in order for delimiter-separated files (WHATWG labels).
    /// `gbk` and `gb18030` share one decoder, so listing both adds nothing.
    pub csv_encodings: Vec<String>,

    pub boolean_tokens: BooleanVocabulary,

    /// Unit tokens searched in header text, first match wins
    pub unit_tokens: Vec<String>,

    /// Leading rows inspected by the merged-cell heuristic (default: 3)
    pub header_scan_rows: usize,

    /// Example values kept per column (default: 3)
    pub sample_size: usize,

    /// Prefix of synthesized names for blank header cells ("Column 3")
    pub placeholder_prefix: String,

    /// Run the merged-cell heuristic at all
    pub detect_merged_cells: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            supported_extensions: to_strings(&["xlsx", "xls", "csv", "tsv", "ods"]),
            max_file_size_bytes: 20 * 1024 * 1024,
            csv_encodings: to_strings(&["utf-8", "gb18030", "windows-1252"]),
            boolean_tokens: BooleanVocabulary::default(),
            unit_tokens: to_strings(&[
                "万元", "亿元", "元", "%", "个", "人", "次", "天", "月", "年", "kg", "cm", "g",
                "m",
            ]),
            header_scan_rows: 3,
            sample_size: 3,
            placeholder_prefix: "Column".to_string(),
            detect_merged_cells: true,
        }
    }
}

impl PipelineConfig {
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.supported_extensions.iter().any(|e| *e == ext)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.supported_extensions.is_empty() {
            return Err("supported_extensions must not be empty".to_string());
        }
        if self.max_file_size_bytes == 0 {
            return Err("max_file_size_bytes must be > 0".to_string());
        }
        if self.csv_encodings.is_empty() {
            return Err("csv_encodings must not be empty".to_string());
        }
        if let Some(label) = self
            .csv_encodings
            .iter()
            .find(|l| encoding_rs::Encoding::for_label(l.as_bytes()).is_none())
        {
            return Err(format!("unknown encoding label '{}'", label));
        }
        if self.boolean_tokens.truthy.is_empty() || self.boolean_tokens.falsy.is_empty() {
            return Err("boolean_tokens needs at least one truthy and one falsy token".to_string());
        }
        if let Some(token) = self.boolean_tokens.truthy.iter().find(|t| {
            self.boolean_tokens
                .falsy
                .iter()
                .any(|f| f.to_lowercase() == t.to_lowercase())
        }) {
            return Err(format!("boolean token '{}' is both truthy and falsy", token));
        }
        if self.unit_tokens.iter().any(|t| t.is_empty()) {
            return Err("unit_tokens must not contain empty tokens".to_string());
        }
        if self.sample_size == 0 {
            return Err("sample_size must be > 0".to_string());
        }
        if self.placeholder_prefix.trim().is_empty() {
            return Err("placeholder_prefix must not be blank".to_string());
        }
        Ok(())
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
