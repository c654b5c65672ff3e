//! Date-aligned forward projection.

use crate::core::{today_midnight, ForecastSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use chrono::{DateTime, Utc};

/// Forecast `horizon` days ahead of the model's training data.
///
/// The anchor is the model's last training timestamp, or today's midnight
/// for models that do not expose one.
pub fn project(model: &dyn Forecaster, horizon: usize) -> Result<ForecastSeries> {
    project_with_fallback(model, horizon, today_midnight())
}

/// [`project`] with an explicit fallback anchor.
pub fn project_with_fallback(
    model: &dyn Forecaster,
    horizon: usize,
    fallback_anchor: DateTime<Utc>,
) -> Result<ForecastSeries> {
    let values = model
        .predict(horizon)
        .map_err(|err| ForecastError::ProjectionFailure(format!("{}: {}", model.name(), err)))?;

    if values.len() != horizon {
        return Err(ForecastError::ProjectionFailure(format!(
            "{} returned {} values for a horizon of {}",
            model.name(),
            values.len(),
            horizon
        )));
    }

    let anchor = model.training_end().unwrap_or(fallback_anchor);
    Ok(ForecastSeries::after_anchor(anchor, &values))
}

/// [`project`], converting a failure into an empty forecast.
pub fn project_or_empty(model: &dyn Forecaster, horizon: usize) -> ForecastSeries {
    match project(model, horizon) {
        Ok(forecast) => forecast,
        Err(err) => {
            tracing::warn!(%err, "projection failed, returning an empty forecast");
            ForecastSeries::new()
        }
    }
}
