//! Presentation of forecasts: chart JSON and text recommendations.

pub mod chart;
pub mod recommendation;

pub use chart::{forecast_chart, forecast_chart_json, ChartFigure};
pub use recommendation::{build_prompt, extract_text, prompt_from_source, GeminiClient};
