// ============================================================
// CHART RECOMMENDER
// ============================================================
// Summarize a cleaned dataset and rank chart types for it.
// The language-model backed recommender lives outside this crate and plugs in
// through the ChartRecommender trait; RuleBasedRecommender is the local fallback.

use async_trait::async_trait;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::table::{CleanedDataset, ColumnInfo, ColumnType};
use crate::infrastructure::llm_client::LlmClient;

/// Number of recommendations returned to callers
pub const RECOMMENDATION_COUNT: usize = 3;

const SAMPLE_RECORDS: usize = 5;

/// Chart types a recommendation may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Column,
    Line,
    Pie,
    Scatter,
    Area,
    Radar,
    BoxPlot,
    Histogram,
    Heatmap,
    Waterfall,
    Funnel,
    Treemap,
    Bubble,
    Sankey,
    Rose,
    StackedBar,
    StackedArea,
    DualAxis,
}

impl ChartKind {
    pub const ALL: [ChartKind; 19] = [
        ChartKind::Bar,
        ChartKind::Column,
        ChartKind::Line,
        ChartKind::Pie,
        ChartKind::Scatter,
        ChartKind::Area,
        ChartKind::Radar,
        ChartKind::BoxPlot,
        ChartKind::Histogram,
        ChartKind::Heatmap,
        ChartKind::Waterfall,
        ChartKind::Funnel,
        ChartKind::Treemap,
        ChartKind::Bubble,
        ChartKind::Sankey,
        ChartKind::Rose,
        ChartKind::StackedBar,
        ChartKind::StackedArea,
        ChartKind::DualAxis,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar chart",
            ChartKind::Column => "Column chart",
            ChartKind::Line => "Line chart",
            ChartKind::Pie => "Pie chart",
            ChartKind::Scatter => "Scatter plot",
            ChartKind::Area => "Area chart",
            ChartKind::Radar => "Radar chart",
            ChartKind::BoxPlot => "Box plot",
            ChartKind::Histogram => "Histogram",
            ChartKind::Heatmap => "Heatmap",
            ChartKind::Waterfall => "Waterfall chart",
            ChartKind::Funnel => "Funnel chart",
            ChartKind::Treemap => "Treemap",
            ChartKind::Bubble => "Bubble chart",
            ChartKind::Sankey => "Sankey diagram",
            ChartKind::Rose => "Rose chart",
            ChartKind::StackedBar => "Stacked bar chart",
            ChartKind::StackedArea => "Stacked area chart",
            ChartKind::DualAxis => "Dual axis chart",
        }
    }

    /// Chinese label, as commonly returned by the recommendation model
    pub fn label_zh(&self) -> &'static str {
        match self {
            ChartKind::Bar => "条形图",
            ChartKind::Column => "柱状图",
            ChartKind::Line => "折线图",
            ChartKind::Pie => "饼图",
            ChartKind::Scatter => "散点图",
            ChartKind::Area => "面积图",
            ChartKind::Radar => "雷达图",
            ChartKind::BoxPlot => "箱线图",
            ChartKind::Histogram => "直方图",
            ChartKind::Heatmap => "热力图",
            ChartKind::Waterfall => "瀑布图",
            ChartKind::Funnel => "漏斗图",
            ChartKind::Treemap => "树形图",
            ChartKind::Bubble => "泡泡图",
            ChartKind::Sankey => "桑基图",
            ChartKind::Rose => "玫瑰图",
            ChartKind::StackedBar => "堆积条形图",
            ChartKind::StackedArea => "堆积面积图",
            ChartKind::DualAxis => "双轴图",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChartKind::Bar => "Horizontal bars comparing values across categories",
            ChartKind::Column => "Vertical bars comparing values across categories",
            ChartKind::Line => "Points joined by lines, showing change over time",
            ChartKind::Pie => "Share of each part in the whole",
            ChartKind::Scatter => "Relationship or correlation between two variables",
            ChartKind::Area => "Line chart with filled area, showing volume and trend",
            ChartKind::Radar => "Several indicators compared on radial axes",
            ChartKind::BoxPlot => "Distribution, quartiles and outliers",
            ChartKind::Histogram => "Frequency of values in bins",
            ChartKind::Heatmap => "Colour intensity encoding values in a matrix",
            ChartKind::Waterfall => "Cumulative effect of sequential increases and decreases",
            ChartKind::Funnel => "Volume remaining at each stage of a process",
            ChartKind::Treemap => "Nested rectangles sized by share of a hierarchy",
            ChartKind::Bubble => "Scatter plot whose point size encodes a third variable",
            ChartKind::Sankey => "Flows and their quantities between nodes",
            ChartKind::Rose => "Polar bar chart of category sizes",
            ChartKind::StackedBar => "Bars split into sub-category segments",
            ChartKind::StackedArea => "Several area series stacked on each other",
            ChartKind::DualAxis => "Two related series with different scales",
        }
    }

    /// Distinctive part of each label, without the generic "chart" / "图" suffix
    fn label_stems(&self) -> [String; 2] {
        let en = self.label().to_lowercase();
        let en = ["chart", "plot", "diagram"]
            .iter()
            .find_map(|suffix| en.strip_suffix(*suffix))
            .unwrap_or(en.as_str())
            .trim()
            .to_string();
        let zh = self.label_zh().trim_end_matches('图').to_string();
        [en, zh]
    }

    /// Exact label match first, then the longest label stem found in `name`.
    /// Generic text such as "chart" or "图" matches nothing.
    pub fn match_label(name: &str) -> Option<ChartKind> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let lower = name.to_lowercase();

        let exact = Self::ALL.iter().find(|k| {
            k.label_zh() == name
                || k.label().to_lowercase() == lower
                || serde_json::to_value(k).ok().and_then(|v| v.as_str().map(str::to_string))
                    == Some(lower.clone())
        });
        if let Some(kind) = exact {
            return Some(*kind);
        }

        Self::ALL
            .iter()
            .flat_map(|k| k.label_stems().map(|stem| (*k, stem)))
            .filter(|(_, stem)| !stem.is_empty() && lower.contains(stem.as_str()))
            .max_by_key(|(_, stem)| stem.chars().count())
            .map(|(kind, _)| kind)
    }
}

/// One ranked chart suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRecommendation {
    pub chart: ChartKind,
    pub reason: String,
    pub score: f64,
}

impl ChartRecommendation {
    fn new(chart: ChartKind, reason: &str, score: f64) -> Self {
        Self {
            chart,
            reason: reason.to_string(),
            score,
        }
    }
}

/// Column names grouped by inferred type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnsByType {
    pub numeric_columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub string_columns: Vec<String>,
    pub boolean_columns: Vec<String>,
}

/// What a recommender gets to see about a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub data_sample: Vec<Map<String, Value>>,
    pub data_types: ColumnsByType,
}

impl DataSummary {
    pub fn from_dataset(dataset: &CleanedDataset) -> Self {
        let names = |t: ColumnType| -> Vec<String> {
            dataset
                .columns_of_type(t)
                .into_iter()
                .map(|c| c.name.clone())
                .collect()
        };

        Self {
            row_count: dataset.row_count(),
            column_count: dataset.column_count(),
            columns: dataset.columns().to_vec(),
            data_sample: dataset.to_records().into_iter().take(SAMPLE_RECORDS).collect(),
            data_types: ColumnsByType {
                numeric_columns: names(ColumnType::Number),
                date_columns: names(ColumnType::Date),
                string_columns: names(ColumnType::String),
                boolean_columns: names(ColumnType::Boolean),
            },
        }
    }
}

/// Seam for chart recommendation backends
#[async_trait]
pub trait ChartRecommender: Send + Sync {
    async fn recommend(&self, summary: &DataSummary) -> Result<Vec<ChartRecommendation>>;
}

/// Deterministic recommendations from the column-type mix
#[derive(Debug, Clone, Default)]
pub struct RuleBasedRecommender;

impl RuleBasedRecommender {
    pub fn new() -> Self {
        Self
    }

    pub fn recommend_for(&self, summary: &DataSummary) -> Vec<ChartRecommendation> {
        let types = &summary.data_types;
        let mut recommendations = Vec::new();

        if !types.date_columns.is_empty() && !types.numeric_columns.is_empty() {
            recommendations.push(ChartRecommendation::new(
                ChartKind::Line,
                "Has a time axis and numeric values, suited to showing trends",
                0.9,
            ));
        }
        if !types.string_columns.is_empty() && !types.numeric_columns.is_empty() {
            recommendations.push(ChartRecommendation::new(
                ChartKind::Column,
                "Has categories and numeric values, suited to comparison",
                0.85,
            ));
        }
        if types.numeric_columns.len() >= 2 {
            recommendations.push(ChartRecommendation::new(
                ChartKind::Scatter,
                "Has several numeric variables, suited to correlation analysis",
                0.8,
            ));
        }

        let fillers = [
            (ChartKind::Pie, "General share breakdown", 0.7),
            (ChartKind::Area, "Trend visualization", 0.65),
            (ChartKind::Radar, "Multi-dimensional comparison", 0.6),
        ];
        for (chart, reason, score) in fillers {
            if recommendations.len() >= RECOMMENDATION_COUNT {
                break;
            }
            if !recommendations.iter().any(|r| r.chart == chart) {
                recommendations.push(ChartRecommendation::new(chart, reason, score));
            }
        }

        recommendations.truncate(RECOMMENDATION_COUNT);
        recommendations
    }
}

#[async_trait]
impl ChartRecommender for RuleBasedRecommender {
    async fn recommend(&self, summary: &DataSummary) -> Result<Vec<ChartRecommendation>> {
        let recommendations = self.recommend_for(summary);
        info!(count = recommendations.len(), "Rule-based chart recommendations ready");
        Ok(recommendations)
    }
}

/// Recommendation as returned by an external model, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecommendation {
    pub chart: Option<String>,
    pub reason: Option<String>,
    pub score: Option<f64>,
}

/// Extract the JSON array embedded in a model response
pub fn parse_recommendations(text: &str) -> Result<Vec<RawRecommendation>> {
    let start = text.find('[');
    let end = text.rfind(']');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => {
            return Err(AppError::ValidationError(
                "response contains no JSON array".to_string(),
            ))
        }
    };

    serde_json::from_str(json).map_err(|e| {
        warn!("Failed to parse recommendation JSON: {}", e);
        AppError::ValidationError(format!("invalid recommendation JSON: {}", e))
    })
}

/// Validate raw recommendations: drop incomplete or unknown entries, clamp scores,
/// pad with defaults and keep the best three
pub fn normalize_recommendations(raw: Vec<RawRecommendation>) -> Vec<ChartRecommendation> {
    let mut validated: Vec<ChartRecommendation> = Vec::new();

    for rec in raw {
        let (Some(chart), Some(reason), Some(score)) = (rec.chart, rec.reason, rec.score) else {
            continue;
        };
        let Some(kind) = ChartKind::match_label(&chart) else {
            warn!(chart = %chart, "Dropping recommendation for unknown chart type");
            continue;
        };
        if validated.iter().any(|r| r.chart == kind) {
            continue;
        }
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        validated.push(ChartRecommendation {
            chart: kind,
            reason,
            score,
        });
    }

    for chart in [ChartKind::Column, ChartKind::Line, ChartKind::Pie] {
        if validated.len() >= RECOMMENDATION_COUNT {
            break;
        }
        if !validated.iter().any(|r| r.chart == chart) {
            validated.push(ChartRecommendation::new(chart, "Default recommendation", 0.6));
        }
    }

    validated.sort_by(|a, b| b.score.total_cmp(&a.score));
    validated.truncate(RECOMMENDATION_COUNT);
    validated
}

pub const SYSTEM_PROMPT: &str = "You are a data visualization expert. You choose the charts \
that best present a dataset and answer with valid JSON only.";

/// User prompt describing the dataset and the chart catalogue
pub fn build_prompt(summary: &DataSummary) -> String {
    let list = |names: &[String]| {
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    };
    let columns = serde_json::to_string_pretty(&summary.columns).unwrap_or_default();
    let sample = serde_json::to_string_pretty(&summary.data_sample).unwrap_or_default();
    let catalogue = ChartKind::ALL
        .iter()
        .map(|k| format!("- {} ({}): {}", k.label(), k.label_zh(), k.description()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Recommend the {count} most suitable chart types for this dataset.\n\n\
         Rows: {rows}\n\
         Columns: {cols}\n\
         Numeric columns: {numeric}\n\
         Date columns: {dates}\n\
         Text columns: {strings}\n\
         Boolean columns: {booleans}\n\n\
         Column details:\n{columns}\n\n\
         Sample rows:\n{sample}\n\n\
         Available chart types:\n{catalogue}\n\n\
         Answer with a JSON array of exactly {count} objects, best first, scores between 0 and 1:\n\
         [{{\"chart\": \"<chart type>\", \"reason\": \"<why it fits>\", \"score\": 0.9}}]",
        count = RECOMMENDATION_COUNT,
        rows = summary.row_count,
        cols = summary.column_count,
        numeric = list(&summary.data_types.numeric_columns),
        dates = list(&summary.data_types.date_columns),
        strings = list(&summary.data_types.string_columns),
        booleans = list(&summary.data_types.boolean_columns),
        columns = columns,
        sample = sample,
        catalogue = catalogue,
    )
}

/// Recommender backed by a chat-completion model
pub struct ModelRecommender {
    client: Arc<dyn LlmClient>,
}

impl ModelRecommender {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChartRecommender for ModelRecommender {
    async fn recommend(&self, summary: &DataSummary) -> Result<Vec<ChartRecommendation>> {
        let prompt = build_prompt(summary);
        let text = self.client.generate(SYSTEM_PROMPT, &prompt).await?;
        let recommendations = normalize_recommendations(parse_recommendations(&text)?);
        info!(count = recommendations.len(), "Model chart recommendations ready");
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::{CellValue, CleanedRow};

    fn dataset(types: &[(&str, ColumnType)]) -> CleanedDataset {
        let columns = types
            .iter()
            .enumerate()
            .map(|(i, (name, t))| ColumnInfo::new(i, *name, *t))
            .collect::<Vec<_>>();
        let rows = (0..7)
            .map(|i| CleanedRow::new(types.iter().map(|_| CellValue::Number(i as f64)).collect()))
            .collect();
        CleanedDataset::new(columns, rows, vec![0; types.len()])
    }

    #[test]
    fn test_summary_groups_columns() {
        let ds = dataset(&[
            ("Month", ColumnType::Date),
            ("Sales", ColumnType::Number),
            ("Region", ColumnType::String),
        ]);
        let summary = DataSummary::from_dataset(&ds);

        assert_eq!(summary.row_count, 7);
        assert_eq!(summary.data_sample.len(), 5);
        assert_eq!(summary.data_types.date_columns, vec!["Month"]);
        assert_eq!(summary.data_types.numeric_columns, vec!["Sales"]);
        assert_eq!(summary.data_types.string_columns, vec!["Region"]);
    }

    #[tokio::test]
    async fn test_rule_based_time_series() {
        let ds = dataset(&[
            ("Month", ColumnType::Date),
            ("Sales", ColumnType::Number),
            ("Region", ColumnType::String),
        ]);
        let recs = RuleBasedRecommender::new()
            .recommend(&DataSummary::from_dataset(&ds))
            .await
            .unwrap();

        let charts: Vec<_> = recs.iter().map(|r| r.chart).collect();
        assert_eq!(charts, vec![ChartKind::Line, ChartKind::Column, ChartKind::Pie]);
    }

    #[test]
    fn test_rule_based_fills_defaults() {
        let ds = dataset(&[("Flag", ColumnType::Boolean)]);
        let recs = RuleBasedRecommender::new().recommend_for(&DataSummary::from_dataset(&ds));

        let charts: Vec<_> = recs.iter().map(|r| r.chart).collect();
        assert_eq!(charts, vec![ChartKind::Pie, ChartKind::Area, ChartKind::Radar]);
    }

    #[test]
    fn test_generic_chart_words_match_nothing() {
        assert_eq!(ChartKind::match_label("chart"), None);
        assert_eq!(ChartKind::match_label("图"), None);
        assert_eq!(ChartKind::match_label("a nice plot"), None);
        assert_eq!(ChartKind::match_label("图表"), None);
    }

    #[test]
    fn test_match_label() {
        assert_eq!(ChartKind::match_label("折线图"), Some(ChartKind::Line));
        assert_eq!(ChartKind::match_label("Pie chart"), Some(ChartKind::Pie));
        assert_eq!(ChartKind::match_label("stacked_area"), Some(ChartKind::StackedArea));
        assert_eq!(ChartKind::match_label("堆积条形图"), Some(ChartKind::StackedBar));
        assert_eq!(ChartKind::match_label("3D 饼图"), Some(ChartKind::Pie));
        assert_eq!(ChartKind::match_label("gauge"), None);
        assert_eq!(
            ChartKind::match_label("Stacked area chart (percent)"),
            Some(ChartKind::StackedArea)
        );
        assert_eq!(ChartKind::match_label("基础柱状图"), Some(ChartKind::Column));
    }

    #[test]
    fn test_parse_and_normalize_model_output() {
        let text = r#"Here you go:
[
  {"chart":"柱状图","reason":"compare regions","score":0.95},
  {"chart":"gauge","reason":"unknown","score":0.9},
  {"chart":"折线图","reason":"trend","score":1.7},
  {"chart":"饼图","reason":"missing score"}
]
Thanks"#;
        let recs = normalize_recommendations(parse_recommendations(text).unwrap());

        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].chart, ChartKind::Line);
        assert_eq!(recs[0].score, 1.0);
        assert_eq!(recs[1].chart, ChartKind::Column);
        assert_eq!(recs[2].chart, ChartKind::Pie);
        assert_eq!(recs[2].reason, "Default recommendation");
    }

    #[test]
    fn test_parse_rejects_text_without_array() {
        assert!(parse_recommendations("no json here").is_err());
    }

    struct CannedClient {
        answer: Result<String>,
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn generate(&self, system: &str, user: &str) -> Result<String> {
            assert_eq!(system, SYSTEM_PROMPT);
            assert!(user.contains("Numeric columns: Sales"));
            self.answer.clone()
        }
    }

    fn sales_summary() -> DataSummary {
        DataSummary::from_dataset(&dataset(&[
            ("Month", ColumnType::Date),
            ("Sales", ColumnType::Number),
        ]))
    }

    #[test]
    fn test_build_prompt_lists_types_and_catalogue() {
        let prompt = build_prompt(&sales_summary());

        assert!(prompt.contains("Rows: 7"));
        assert!(prompt.contains("Date columns: Month"));
        assert!(prompt.contains("Text columns: none"));
        assert!(prompt.contains("- Stacked area chart (堆积面积图)"));
        assert!(prompt.contains("\"type\": \"number\""));
        assert!(prompt.contains("exactly 3 objects"));
    }

    #[tokio::test]
    async fn test_model_recommender_normalizes_answer() {
        let client = CannedClient {
            answer: Ok(r#"```json
[{"chart":"折线图","reason":"monthly trend","score":0.92}]
```"#
                .to_string()),
        };
        let recs = ModelRecommender::new(Arc::new(client))
            .recommend(&sales_summary())
            .await
            .unwrap();

        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].chart, ChartKind::Line);
        assert_eq!(recs[0].reason, "monthly trend");
        assert_eq!(recs[1].chart, ChartKind::Column);
    }

    #[tokio::test]
    async fn test_model_recommender_propagates_client_error() {
        let client = CannedClient {
            answer: Err(AppError::LlmError("timeout".to_string())),
        };
        let err = ModelRecommender::new(Arc::new(client))
            .recommend(&sales_summary())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::LlmError(_)));
    }
}
