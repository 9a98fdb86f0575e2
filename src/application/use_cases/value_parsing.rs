// ============================================================
// VALUE PARSING
// ============================================================
// Numeric, date and unit recognition shared by inference and cleaning

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::table::RawCell;

static YEAR_FIRST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}\s*[-/.年]").expect("valid regex"));
static COMPACT_DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{8}$").expect("valid regex"));
static DAY_MONTH_FIRST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}[/.-]\d{1,2}[/.-]\d{4}").expect("valid regex"));
static DOTTED_YEAR_MONTH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}\.\d{2}$").expect("valid regex"));
static PARENTHESIZED_UNIT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[(（]([^)）]+)[)）]").expect("valid regex"));

const YEAR_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y年%m月%d日 %H:%M:%S",
    "%Y年%m月%d日 %H:%M",
];

const YEAR_FIRST_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日"];

/// Year-month shapes, completed to the first day of the month.
/// The dotted shape needs a two-digit month so decimals like `2023.5` stay numbers.
const YEAR_MONTH_FORMATS: &[(&str, &str)] = &[
    ("%Y-%m-%d", "-01"),
    ("%Y/%m/%d", "/01"),
    ("%Y.%m.%d", ".01"),
    ("%Y年%m月%d日", "01日"),
];

/// Month-first wins over day-first when both would parse
const DAY_MONTH_FIRST_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
];

const MONTH_NAME_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%d %B %Y", "%b %d %Y"];

/// Parse trimmed text as a finite number, with no cleanup
pub fn parse_number_strict(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse text after dropping everything except ASCII digits, '.' and '-'
pub fn parse_number_lenient(text: &str) -> Option<f64> {
    if let Some(n) = parse_number_strict(text) {
        return Some(n);
    }
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    parse_number_strict(&stripped)
}

/// Permissive multi-format date/time parser
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    if YEAR_FIRST_PATTERN.is_match(text) {
        if let Some(dt) = YEAR_FIRST_DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        {
            return Some(dt);
        }
        if let Some(date) = YEAR_FIRST_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        {
            return Some(date.and_time(NaiveTime::MIN));
        }
        return YEAR_MONTH_FORMATS.iter().find_map(|(fmt, suffix)| {
            if *suffix == ".01" && !DOTTED_YEAR_MONTH_PATTERN.is_match(text) {
                return None;
            }
            NaiveDate::parse_from_str(&format!("{}{}", text, suffix), fmt)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        });
    }

    if COMPACT_DATE_PATTERN.is_match(text) {
        return NaiveDate::parse_from_str(text, "%Y%m%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN));
    }

    if DAY_MONTH_FIRST_PATTERN.is_match(text) {
        if let Some(dt) = DAY_MONTH_FIRST_FORMATS[..2]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        {
            return Some(dt);
        }
        return DAY_MONTH_FIRST_FORMATS[2..]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .map(|d| d.and_time(NaiveTime::MIN));
    }

    MONTH_NAME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Whether a raw cell reads as a number; booleans never do
pub fn is_numeric_cell(cell: &RawCell) -> bool {
    match cell {
        RawCell::Number(n) => n.is_finite(),
        RawCell::Text(s) => parse_number_strict(s).is_some(),
        RawCell::Null | RawCell::Bool(_) | RawCell::DateTime(_) => false,
    }
}

/// Whether a raw cell reads as a date/time
pub fn is_date_cell(cell: &RawCell) -> bool {
    match cell {
        RawCell::DateTime(_) => true,
        RawCell::Text(s) => parse_datetime(s).is_some(),
        RawCell::Null | RawCell::Number(_) | RawCell::Bool(_) => false,
    }
}

/// Extract a unit annotation from header text.
///
/// A parenthesized part wins; otherwise the first token of `unit_tokens` contained in the
/// name. Tokens made only of ASCII letters must not touch other ASCII letters.
pub fn extract_unit(name: &str, unit_tokens: &[String]) -> Option<String> {
    if let Some(caps) = PARENTHESIZED_UNIT_PATTERN.captures(name) {
        let unit = caps[1].trim();
        if !unit.is_empty() {
            return Some(unit.to_string());
        }
    }

    unit_tokens
        .iter()
        .find(|token| contains_unit_token(name, token))
        .cloned()
}

fn contains_unit_token(name: &str, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    if !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return name.contains(token);
    }

    name.match_indices(token).any(|(start, matched)| {
        let before = name[..start].chars().next_back();
        let after = name[start + matched.len()..].chars().next();
        !before.map_or(false, |c| c.is_ascii_alphabetic())
            && !after.map_or(false, |c| c.is_ascii_alphabetic())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units() -> Vec<String> {
        crate::domain::pipeline_config::PipelineConfig::default().unit_tokens
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_strict_number_parsing() {
        assert_eq!(parse_number_strict(" 3.5 "), Some(3.5));
        assert_eq!(parse_number_strict("-2"), Some(-2.0));
        assert_eq!(parse_number_strict("1e3"), Some(1000.0));
        assert_eq!(parse_number_strict("1,234"), None);
        assert_eq!(parse_number_strict("inf"), None);
        assert_eq!(parse_number_strict("NaN"), None);
        assert_eq!(parse_number_strict(""), None);
    }

    #[test]
    fn test_lenient_number_parsing() {
        assert_eq!(parse_number_lenient("¥1,234.56"), Some(1234.56));
        assert_eq!(parse_number_lenient("$ -12"), Some(-12.0));
        assert_eq!(parse_number_lenient("45%"), Some(45.0));
        assert_eq!(parse_number_lenient("1e3"), Some(1000.0));
        assert_eq!(parse_number_lenient("abc"), None);
        assert_eq!(parse_number_lenient("1.2.3"), None);
        assert_eq!(parse_number_lenient("-"), None);
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(parse_datetime("2023-01-01"), Some(ymd(2023, 1, 1)));
        assert_eq!(parse_datetime("2023/2/1"), Some(ymd(2023, 2, 1)));
        assert_eq!(
            parse_datetime("2023-01-01 08:30:00"),
            Some(
                NaiveDate::from_ymd_opt(2023, 1, 1)
                    .unwrap()
                    .and_hms_opt(8, 30, 0)
                    .unwrap()
            )
        );
        assert_eq!(
            parse_datetime("2024-01-01T08:30:00Z"),
            Some(
                NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(8, 30, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_offset_timestamp_keeps_written_wall_clock() {
        assert_eq!(
            parse_datetime("2023-01-01T00:00:00+08:00"),
            Some(ymd(2023, 1, 1))
        );
        assert_eq!(
            parse_datetime("2023-06-30T23:30:00-05:00"),
            Some(
                NaiveDate::from_ymd_opt(2023, 6, 30)
                    .unwrap()
                    .and_hms_opt(23, 30, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_dotted_year_month_needs_two_digit_month() {
        assert_eq!(parse_datetime("2023.05"), Some(ymd(2023, 5, 1)));
        assert_eq!(parse_datetime("2023.5"), None);
        assert_eq!(parse_datetime("2023.125"), None);
        assert_eq!(parse_datetime("2023.5.1"), Some(ymd(2023, 5, 1)));
    }

    #[test]
    fn test_regional_dates() {
        assert_eq!(parse_datetime("2023年3月5日"), Some(ymd(2023, 3, 5)));
        assert_eq!(parse_datetime("2023年3月"), Some(ymd(2023, 3, 1)));
        assert_eq!(parse_datetime("2023-07"), Some(ymd(2023, 7, 1)));
        assert_eq!(parse_datetime("03/04/2023"), Some(ymd(2023, 3, 4)));
        assert_eq!(parse_datetime("25/12/2023"), Some(ymd(2023, 12, 25)));
        assert_eq!(parse_datetime("25.12.2023"), Some(ymd(2023, 12, 25)));
        assert_eq!(parse_datetime("20230115"), Some(ymd(2023, 1, 15)));
        assert_eq!(parse_datetime("Jan 5, 2023"), Some(ymd(2023, 1, 5)));
        assert_eq!(parse_datetime("5 March 2023"), Some(ymd(2023, 3, 5)));
    }

    #[test]
    fn test_non_dates() {
        assert_eq!(parse_datetime("hello"), None);
        assert_eq!(parse_datetime("1-2"), None);
        assert_eq!(parse_datetime("2023-13-01"), None);
        assert_eq!(parse_datetime("n/a"), None);
        assert_eq!(parse_datetime("是"), None);
    }

    #[test]
    fn test_cell_predicates() {
        assert!(is_numeric_cell(&RawCell::Number(1.0)));
        assert!(is_numeric_cell(&RawCell::from_text("3.5")));
        assert!(!is_numeric_cell(&RawCell::Bool(true)));
        assert!(is_date_cell(&RawCell::from_text("2023-02-01")));
        assert!(!is_date_cell(&RawCell::Number(45000.0)));
    }

    #[test]
    fn test_unit_from_parentheses() {
        assert_eq!(extract_unit("销售额(万元)", &units()), Some("万元".to_string()));
        assert_eq!(extract_unit("Weight (kg)", &units()), Some("kg".to_string()));
        assert_eq!(extract_unit("利润（亿元）", &units()), Some("亿元".to_string()));
    }

    #[test]
    fn test_unit_from_tokens() {
        assert_eq!(extract_unit("销售额万元", &units()), Some("万元".to_string()));
        assert_eq!(extract_unit("增长率%", &units()), Some("%".to_string()));
        assert_eq!(extract_unit("Weight kg", &units()), Some("kg".to_string()));
        assert_eq!(extract_unit("身高cm", &units()), Some("cm".to_string()));
    }

    #[test]
    fn test_no_unit() {
        assert_eq!(extract_unit("Revenue", &units()), None);
        assert_eq!(extract_unit("Name", &units()), None);
        assert_eq!(extract_unit("Amount", &units()), None);
    }
}
