//! # cashflow-forecast
//!
//! Daily revenue and expense forecasting for small businesses.
//!
//! Transactions are aggregated into a daily series, an ARIMA(1,1,1) trend
//! model and a weekly SARIMA(1,1,1)(1,1,1)\[7\] model are scored on a
//! holdout window, and the winner is re-fitted and projected forward.
//! The [`server`] module exposes the results as chart JSON and
//! model-generated business recommendations.

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod storage;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{ForecastSeries, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{Forecaster, ModelVariant};
    pub use crate::pipeline::{project, ForecastService, ModelSelector, SeriesLoader};
    pub use crate::storage::{Category, SqliteStore, TransactionSource};
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
