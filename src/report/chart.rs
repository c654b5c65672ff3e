//! Plotly-compatible chart of history and projection.

use crate::core::{ForecastSeries, TimeSeries};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const CHART_TITLE: &str = "Previsão de Receita/Despesa";
pub const HISTORY_TRACE: &str = "Histórico";
pub const FORECAST_TRACE: &str = "Previsão";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<&'static str>,
}

/// One scatter trace drawn as a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub name: &'static str,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: &'static str,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub template: &'static str,
}

/// Figure with the `data`/`layout` shape Plotly expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFigure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

fn day_label(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Build the figure for a history series and its projection.
///
/// An empty projection still yields a forecast trace with no points.
pub fn forecast_chart(history: &TimeSeries, forecast: &ForecastSeries) -> ChartFigure {
    let history_trace = Trace {
        kind: "scatter",
        mode: "lines",
        name: HISTORY_TRACE,
        x: history.timestamps().iter().map(day_label).collect(),
        y: history.values().to_vec(),
        line: Line {
            color: "blue",
            dash: None,
        },
    };

    let forecast_trace = Trace {
        kind: "scatter",
        mode: "lines",
        name: FORECAST_TRACE,
        x: forecast.points().iter().map(|p| day_label(&p.date)).collect(),
        y: forecast.values(),
        line: Line {
            color: "orange",
            dash: Some("dash"),
        },
    };

    ChartFigure {
        data: vec![history_trace, forecast_trace],
        layout: Layout {
            title: CHART_TITLE,
            xaxis: Axis { title: "Data" },
            yaxis: Axis { title: "Valor" },
            template: "plotly_white",
        },
    }
}

/// [`forecast_chart`] rendered as a JSON value.
pub fn forecast_chart_json(history: &TimeSeries, forecast: &ForecastSeries) -> serde_json::Value {
    serde_json::to_value(forecast_chart(history, forecast)).unwrap_or(serde_json::Value::Null)
}
