// ============================================================
// CHART CONFIG
// ============================================================
// Build an ECharts option object for a chart kind from cleaned records.
// Axes are picked by column type; kinds without a dedicated builder fall
// back to a column chart.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::chart_recommender::ChartKind;
use crate::domain::table::{ColumnInfo, ColumnType};

type Record = Map<String, Value>;

const COLOR_THEMES: [[&str; 10]; 6] = [
    [
        "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
        "#bcbd22", "#17becf",
    ],
    [
        "#2ca02c", "#98df8a", "#d62728", "#ff9896", "#9467bd", "#c5b0d5", "#8c564b", "#c49c94",
        "#e377c2", "#f7b6d3",
    ],
    [
        "#d62728", "#ff9896", "#2ca02c", "#98df8a", "#9467bd", "#c5b0d5", "#8c564b", "#c49c94",
        "#e377c2", "#f7b6d3",
    ],
    [
        "#9467bd", "#c5b0d5", "#1f77b4", "#aec7e8", "#ff7f0e", "#ffbb78", "#2ca02c", "#98df8a",
        "#d62728", "#ff9896",
    ],
    [
        "#ff7f0e", "#ffbb78", "#d62728", "#ff9896", "#2ca02c", "#98df8a", "#9467bd", "#c5b0d5",
        "#8c564b", "#c49c94",
    ],
    [
        "#17becf", "#9edae5", "#1f77b4", "#aec7e8", "#2ca02c", "#98df8a", "#ff7f0e", "#ffbb78",
        "#d62728", "#ff9896",
    ],
];

/// Rows shown in a radar chart
const RADAR_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
    None,
}

impl LegendPosition {
    /// (left, top) placement
    fn placement(&self) -> (&'static str, &'static str) {
        match self {
            LegendPosition::Bottom => ("center", "bottom"),
            LegendPosition::Left => ("left", "middle"),
            LegendPosition::Right => ("right", "middle"),
            LegendPosition::Top | LegendPosition::None => ("center", "top"),
        }
    }
}

/// Presentation options supplied by the client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartOptions {
    pub title: String,
    /// Index into the built-in colour themes; out-of-range values use the first
    pub color_theme: usize,
    pub legend_position: LegendPosition,
    pub show_grid: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            color_theme: 0,
            legend_position: LegendPosition::Top,
            show_grid: true,
        }
    }
}

/// Stateless generator of chart option objects
#[derive(Debug, Clone, Default)]
pub struct ChartConfigGenerator;

impl ChartConfigGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        kind: ChartKind,
        records: &[Record],
        columns: &[ColumnInfo],
        options: &ChartOptions,
    ) -> Value {
        let base = base_config(options);
        let config = match kind {
            ChartKind::Bar => bar_chart(records, columns, base, true),
            ChartKind::Column => bar_chart(records, columns, base, false),
            ChartKind::Line => line_chart(records, columns, base),
            ChartKind::Pie => pie_chart(records, columns, base),
            ChartKind::Scatter => scatter_chart(records, columns, base),
            ChartKind::Area => area_chart(records, columns, base),
            ChartKind::Radar => radar_chart(records, columns, base),
            ChartKind::Heatmap => heatmap_chart(records, columns, base),
            ChartKind::Funnel => funnel_chart(records, columns, base),
            ChartKind::StackedBar => stacked_bar_chart(records, columns, base),
            ChartKind::StackedArea => stacked_area_chart(records, columns, base),
            other => {
                debug!(chart = ?other, "No dedicated builder, using a column chart");
                bar_chart(records, columns, base, false)
            }
        };

        info!(chart = ?kind, rows = records.len(), "Chart config generated");
        Value::Object(config)
    }
}

fn base_config(options: &ChartOptions) -> Record {
    let colors = COLOR_THEMES
        .get(options.color_theme)
        .unwrap_or(&COLOR_THEMES[0]);
    let (legend_left, legend_top) = options.legend_position.placement();
    let orient = match options.legend_position {
        LegendPosition::Left | LegendPosition::Right => "vertical",
        _ => "horizontal",
    };
    let show_legend = options.legend_position != LegendPosition::None;

    let base = json!({
        "backgroundColor": "transparent",
        "color": colors,
        "title": {
            "text": options.title,
            "left": "center",
            "textStyle": { "fontSize": 16, "fontWeight": "bold" }
        },
        "tooltip": {
            "trigger": "axis",
            "axisPointer": { "type": "shadow" }
        },
        "legend": {
            "show": show_legend,
            "orient": orient,
            "left": legend_left,
            "top": legend_top
        },
        "grid": {
            "show": options.show_grid,
            "left": "3%",
            "right": "4%",
            "bottom": "3%",
            "containLabel": true
        }
    });
    match base {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// First column of `column_type`, else the first column
fn find_column(columns: &[ColumnInfo], column_type: ColumnType) -> Option<&ColumnInfo> {
    columns
        .iter()
        .find(|c| c.column_type == column_type)
        .or_else(|| columns.first())
}

fn columns_of(columns: &[ColumnInfo], column_type: ColumnType) -> Vec<&ColumnInfo> {
    columns
        .iter()
        .filter(|c| c.column_type == column_type)
        .collect()
}

fn column_name(column: Option<&ColumnInfo>) -> &str {
    column.map(|c| c.name.as_str()).unwrap_or("default")
}

/// Value of `column` in `record`, or `default` when the column is absent
fn cell(record: &Record, column: &str, default: Value) -> Value {
    record.get(column).cloned().unwrap_or(default)
}

fn column_cells(records: &[Record], column: &str, default: Value) -> Vec<Value> {
    records
        .iter()
        .map(|r| cell(r, column, default.clone()))
        .collect()
}

/// Distinct values of a column in first-seen order
fn distinct_cells(records: &[Record], column: &str) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::new();
    for value in column_cells(records, column, json!("")) {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Drop keys that do not apply to non-cartesian charts
fn without_axes(mut config: Record) -> Record {
    config.remove("xAxis");
    config.remove("yAxis");
    config.remove("grid");
    config
}

fn bar_chart(records: &[Record], columns: &[ColumnInfo], mut config: Record, horizontal: bool) -> Record {
    let category = column_name(find_column(columns, ColumnType::String));
    let value = column_name(find_column(columns, ColumnType::Number));
    let categories = column_cells(records, category, json!(""));
    let values = column_cells(records, value, json!(0));

    let (x_type, x_data, y_type, y_data) = if horizontal {
        ("value", Value::Null, "category", json!(categories))
    } else {
        ("category", json!(categories), "value", Value::Null)
    };
    config.insert(
        "xAxis".into(),
        json!({ "type": x_type, "data": x_data, "axisTick": { "alignWithLabel": true } }),
    );
    config.insert("yAxis".into(), json!({ "type": y_type, "data": y_data }));
    config.insert(
        "series".into(),
        json!([{
            "name": value,
            "type": "bar",
            "data": values,
            "emphasis": { "focus": "series" }
        }]),
    );
    config
}

fn line_chart(records: &[Record], columns: &[ColumnInfo], mut config: Record) -> Record {
    let x = columns
        .iter()
        .find(|c| c.column_type == ColumnType::Date)
        .or_else(|| find_column(columns, ColumnType::String));
    let x = column_name(x);
    let y = column_name(find_column(columns, ColumnType::Number));

    config.insert(
        "xAxis".into(),
        json!({
            "type": "category",
            "data": column_cells(records, x, json!("")),
            "boundaryGap": false
        }),
    );
    config.insert("yAxis".into(), json!({ "type": "value" }));
    config.insert(
        "series".into(),
        json!([{
            "name": y,
            "type": "line",
            "data": column_cells(records, y, json!(0)),
            "smooth": true,
            "emphasis": { "focus": "series" }
        }]),
    );
    config
}

fn name_value_pairs(records: &[Record], name: &str, value: &str) -> Vec<Value> {
    records
        .iter()
        .map(|r| json!({ "name": cell(r, name, json!("")), "value": cell(r, value, json!(0)) }))
        .collect()
}

fn pie_chart(records: &[Record], columns: &[ColumnInfo], mut config: Record) -> Record {
    let name = column_name(find_column(columns, ColumnType::String));
    let value = column_name(find_column(columns, ColumnType::Number));

    config.insert(
        "tooltip".into(),
        json!({ "trigger": "item", "formatter": "{a} <br/>{b}: {c} ({d}%)" }),
    );
    config.insert(
        "series".into(),
        json!([{
            "name": name,
            "type": "pie",
            "radius": "50%",
            "data": name_value_pairs(records, name, value),
            "emphasis": {
                "itemStyle": {
                    "shadowBlur": 10,
                    "shadowOffsetX": 0,
                    "shadowColor": "rgba(0, 0, 0, 0.5)"
                }
            }
        }]),
    );
    without_axes(config)
}

fn scatter_chart(records: &[Record], columns: &[ColumnInfo], mut config: Record) -> Record {
    let numeric = columns_of(columns, ColumnType::Number);
    let (x, y) = match numeric.as_slice() {
        [x, y, ..] => (x.name.as_str(), y.name.as_str()),
        _ => return bar_chart(records, columns, config, false),
    };

    let points: Vec<Value> = records
        .iter()
        .map(|r| json!([cell(r, x, json!(0)), cell(r, y, json!(0))]))
        .collect();

    config.insert(
        "xAxis".into(),
        json!({ "type": "value", "name": x, "nameLocation": "middle", "nameGap": 30 }),
    );
    config.insert(
        "yAxis".into(),
        json!({ "type": "value", "name": y, "nameLocation": "middle", "nameGap": 50 }),
    );
    config.insert(
        "series".into(),
        json!([{
            "name": format!("{} vs {}", x, y),
            "type": "scatter",
            "data": points,
            "symbolSize": 8,
            "emphasis": { "focus": "series" }
        }]),
    );
    config
}

fn area_chart(records: &[Record], columns: &[ColumnInfo], config: Record) -> Record {
    let mut config = line_chart(records, columns, config);
    if let Some(series) = config
        .get_mut("series")
        .and_then(|s| s.get_mut(0))
        .and_then(Value::as_object_mut)
    {
        series.insert("areaStyle".into(), json!({ "opacity": 0.6 }));
    }
    config
}

fn radar_chart(records: &[Record], columns: &[ColumnInfo], mut config: Record) -> Record {
    let numeric = columns_of(columns, ColumnType::Number);
    if numeric.len() < 3 {
        return bar_chart(records, columns, config, false);
    }

    let indicators: Vec<Value> = numeric
        .iter()
        .map(|c| {
            let max = records
                .iter()
                .filter_map(|r| r.get(&c.name).and_then(Value::as_f64))
                .reduce(f64::max)
                .unwrap_or(100.0);
            json!({ "name": c.name, "max": max * 1.2 })
        })
        .collect();

    let data: Vec<Value> = records
        .iter()
        .take(RADAR_ROWS)
        .enumerate()
        .map(|(i, r)| {
            let values: Vec<Value> = numeric.iter().map(|c| cell(r, &c.name, json!(0))).collect();
            json!({ "value": values, "name": format!("Row {}", i + 1) })
        })
        .collect();

    config.insert("radar".into(), json!({ "indicator": indicators }));
    config.insert(
        "series".into(),
        json!([{ "name": "Radar", "type": "radar", "data": data }]),
    );
    without_axes(config)
}

fn heatmap_chart(records: &[Record], columns: &[ColumnInfo], mut config: Record) -> Record {
    let (x, y) = match columns {
        [x, y, _, ..] => (x.name.as_str(), y.name.as_str()),
        _ => return bar_chart(records, columns, config, false),
    };
    let value = column_name(find_column(columns, ColumnType::Number));

    let x_values = distinct_cells(records, x);
    let y_values = distinct_cells(records, y);

    let mut cells = Vec::with_capacity(x_values.len() * y_values.len());
    for (i, xv) in x_values.iter().enumerate() {
        for (j, yv) in y_values.iter().enumerate() {
            let v = records
                .iter()
                .find(|r| r.get(x) == Some(xv) && r.get(y) == Some(yv))
                .map(|r| cell(r, value, json!(0)))
                .unwrap_or(json!(0));
            cells.push((i, j, v));
        }
    }

    let numbers: Vec<f64> = cells.iter().filter_map(|(_, _, v)| v.as_f64()).collect();
    let min = numbers.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = numbers.iter().copied().reduce(f64::max).unwrap_or(100.0);
    let data: Vec<Value> = cells.into_iter().map(|(i, j, v)| json!([i, j, v])).collect();

    config.insert("xAxis".into(), json!({ "type": "category", "data": x_values }));
    config.insert("yAxis".into(), json!({ "type": "category", "data": y_values }));
    config.insert(
        "visualMap".into(),
        json!({
            "min": min,
            "max": max,
            "calculable": true,
            "orient": "horizontal",
            "left": "center",
            "bottom": "15%"
        }),
    );
    config.insert(
        "series".into(),
        json!([{
            "name": value,
            "type": "heatmap",
            "data": data,
            "label": { "show": true },
            "emphasis": {
                "itemStyle": { "shadowBlur": 10, "shadowColor": "rgba(0, 0, 0, 0.5)" }
            }
        }]),
    );
    config
}

fn funnel_chart(records: &[Record], columns: &[ColumnInfo], mut config: Record) -> Record {
    let name = column_name(find_column(columns, ColumnType::String));
    let value = column_name(find_column(columns, ColumnType::Number));

    let mut data = name_value_pairs(records, name, value);
    let sort_key = |v: &Value| v["value"].as_f64().unwrap_or(0.0);
    data.sort_by(|a, b| sort_key(b).total_cmp(&sort_key(a)));

    config.insert(
        "tooltip".into(),
        json!({ "trigger": "item", "formatter": "{a} <br/>{b}: {c} ({d}%)" }),
    );
    config.insert(
        "series".into(),
        json!([{
            "name": name,
            "type": "funnel",
            "left": "10%",
            "top": 60,
            "bottom": 60,
            "width": "80%",
            "data": data
        }]),
    );
    without_axes(config)
}

fn stacked_bar_chart(records: &[Record], columns: &[ColumnInfo], mut config: Record) -> Record {
    let numeric = columns_of(columns, ColumnType::Number);
    if numeric.len() < 2 {
        return bar_chart(records, columns, config, false);
    }
    let category = column_name(find_column(columns, ColumnType::String));
    let categories = distinct_cells(records, category);

    let series: Vec<Value> = numeric
        .iter()
        .map(|c| {
            let data: Vec<Value> = categories
                .iter()
                .map(|cat| {
                    records
                        .iter()
                        .find(|r| r.get(category) == Some(cat))
                        .map(|r| cell(r, &c.name, json!(0)))
                        .unwrap_or(json!(0))
                })
                .collect();
            json!({ "name": c.name, "type": "bar", "stack": "total", "data": data })
        })
        .collect();

    config.insert("xAxis".into(), json!({ "type": "category", "data": categories }));
    config.insert("yAxis".into(), json!({ "type": "value" }));
    config.insert("series".into(), Value::Array(series));
    config
}

fn stacked_area_chart(records: &[Record], columns: &[ColumnInfo], config: Record) -> Record {
    let mut config = stacked_bar_chart(records, columns, config);
    if let Some(series) = config.get_mut("series").and_then(Value::as_array_mut) {
        for item in series.iter_mut().filter_map(Value::as_object_mut) {
            item.insert("type".into(), json!("line"));
            item.insert("areaStyle".into(), json!({}));
        }
    }
    if let Some(x_axis) = config.get_mut("xAxis").and_then(Value::as_object_mut) {
        x_axis.insert("boundaryGap".into(), json!(false));
    }
    config
}
