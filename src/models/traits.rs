//! Forecaster trait defining the common interface for the ARIMA family.

use crate::core::TimeSeries;
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Common interface for forecasting models.
///
/// This trait is object-safe and can be used with `&dyn Forecaster`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Point predictions for the next `horizon` steps, in input units.
    fn predict(&self, horizon: usize) -> Result<Vec<f64>>;

    /// Get the fitted values (in-sample predictions on the modelled scale).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Last timestamp of the data the model was fitted on.
    ///
    /// Models that do not track their training index return `None`.
    fn training_end(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}
