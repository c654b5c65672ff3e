//! Core data structures for daily transaction forecasting.

mod forecast;
mod time_series;

pub use forecast::{ForecastPoint, ForecastSeries};
pub use time_series::{midnight, today_midnight, TimeSeries};
