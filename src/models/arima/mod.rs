//! ARIMA and SARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - ARIMA models with (p, d, q) specifications
//! - SARIMA models with seasonal components (P, D, Q)\[s\]
//! - A bounded order search for both

mod auto;
mod diff;
mod model;
mod sarima;

pub use auto::{AutoOrderConfig, AutoOrderSearch, ModelOrder};
pub use diff::{difference, integrate, seasonal_difference, seasonal_integrate};
pub use model::{ARIMASpec, ARIMA};
pub use sarima::{SARIMASpec, SARIMA, WEEKLY_PERIOD};
