//! Forecasting models.
//!
//! - [`arima`]: ARIMA and weekly SARIMA, fitted by conditional least squares
//! - [`variant`]: the closed `{Trend, Seasonal}` pair the pipeline compares

pub mod arima;
mod traits;
pub mod variant;

pub use traits::Forecaster;
pub use variant::{ForecastModel, ModelVariant, OrderSelection};
