//! Utility functions for forecasting models.

pub mod metrics;
pub mod optimization;

pub use metrics::{calculate_metrics, rmse, AccuracyMetrics};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
