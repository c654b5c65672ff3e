//! The two competing model families behind one closed type.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::{AutoOrderConfig, AutoOrderSearch, ARIMA, SARIMA};
use crate::models::Forecaster;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candidate model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    /// Non-seasonal ARIMA with one differencing step.
    Trend,
    /// ARIMA plus a weekly (period 7) seasonal component.
    Seasonal,
}

impl ModelVariant {
    /// Both variants, simpler first.
    pub const ALL: [ModelVariant; 2] = [ModelVariant::Trend, ModelVariant::Seasonal];

    /// Conventional model name reported to callers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Trend => "ARIMA",
            ModelVariant::Seasonal => "SARIMA",
        }
    }

    /// An unfitted model of this variant with the fixed default orders.
    pub fn unfitted(self) -> ForecastModel {
        match self {
            ModelVariant::Trend => ForecastModel::Trend(ARIMA::arima_111()),
            ModelVariant::Seasonal => ForecastModel::Seasonal(SARIMA::weekly()),
        }
    }

    /// Fit this variant on `series`.
    ///
    /// Every numerical problem, including a series too short for the
    /// orders, is reported as [`ForecastError::ModelFitFailure`] or
    /// [`ForecastError::InsufficientData`]; nothing panics.
    pub fn fit(self, series: &TimeSeries, orders: &OrderSelection) -> Result<ForecastModel> {
        let fitted = match orders {
            OrderSelection::Fixed => {
                let mut model = self.unfitted();
                model.fit(series)?;
                model
            }
            OrderSelection::Auto(config) => {
                let mut search = AutoOrderSearch::new(config.clone());
                match self {
                    ModelVariant::Trend => ForecastModel::Trend(search.fit_trend(series)?),
                    ModelVariant::Seasonal => ForecastModel::Seasonal(search.fit_seasonal(series)?),
                }
            }
        };
        Ok(fitted)
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arima" | "trend" => Ok(ModelVariant::Trend),
            "sarima" | "seasonal" => Ok(ModelVariant::Seasonal),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown model variant '{}'",
                other
            ))),
        }
    }
}

/// How model orders are chosen.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OrderSelection {
    /// (1,1,1) for Trend, (1,1,1)(1,1,1)\[7\] for Seasonal.
    #[default]
    Fixed,
    /// Lowest information criterion over a capped grid.
    Auto(AutoOrderConfig),
}

impl FromStr for OrderSelection {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(OrderSelection::Fixed),
            "auto" => Ok(OrderSelection::Auto(AutoOrderConfig::default())),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown order selection '{}', expected 'fixed' or 'auto'",
                other
            ))),
        }
    }
}

/// A model of one of the two variants, fitted or not.
#[derive(Debug, Clone)]
pub enum ForecastModel {
    Trend(ARIMA),
    Seasonal(SARIMA),
}

impl ForecastModel {
    /// Which family this model belongs to.
    pub fn variant(&self) -> ModelVariant {
        match self {
            ForecastModel::Trend(_) => ModelVariant::Trend,
            ForecastModel::Seasonal(_) => ModelVariant::Seasonal,
        }
    }

    /// Point forecasts for `horizon` steps.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        self.predict(horizon)
    }

    /// Information criterion of the fitted model, if any.
    pub fn aic(&self) -> Option<f64> {
        match self {
            ForecastModel::Trend(m) => m.aic(),
            ForecastModel::Seasonal(m) => m.aic(),
        }
    }

    fn inner(&self) -> &dyn Forecaster {
        match self {
            ForecastModel::Trend(m) => m,
            ForecastModel::Seasonal(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Forecaster {
        match self {
            ForecastModel::Trend(m) => m,
            ForecastModel::Seasonal(m) => m,
        }
    }
}

impl Forecaster for ForecastModel {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.inner_mut().fit(series).map_err(|err| match err {
            ForecastError::InsufficientData { .. } | ForecastError::ModelFitFailure(_) => err,
            other => ForecastError::ModelFitFailure(other.to_string()),
        })
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        self.inner().predict(horizon)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.inner().fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.inner().residuals()
    }

    fn name(&self) -> &str {
        self.variant().as_str()
    }

    fn training_end(&self) -> Option<DateTime<Utc>> {
        self.inner().training_end()
    }
}
