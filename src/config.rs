//! Runtime settings read from the environment.

use crate::error::{ForecastError, Result};
use crate::models::OrderSelection;
use crate::pipeline::{DEFAULT_HOLDOUT, MIN_HOLDOUT};
use crate::report::recommendation::DEFAULT_MODEL;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Service settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// SQLite database file.
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// Trailing days held out when scoring candidates.
    pub holdout: usize,
    /// Days projected for the chart endpoint.
    pub chart_horizon: usize,
    /// Days projected for the recommendation prompt.
    pub recommendation_horizon: usize,
    pub orders: OrderSelection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("transacoes.db"),
            host: "0.0.0.0".to_string(),
            port: 8001,
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            holdout: DEFAULT_HOLDOUT,
            chart_horizon: 30,
            recommendation_horizon: 7,
            orders: OrderSelection::Fixed,
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ForecastError::Configuration(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

impl Settings {
    /// Load settings from the process environment, after reading a `.env`
    /// file if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let settings = Self {
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT", defaults.port)?,
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            holdout: parsed(&lookup, "FORECAST_HOLDOUT", defaults.holdout)?,
            chart_horizon: parsed(&lookup, "FORECAST_CHART_HORIZON", defaults.chart_horizon)?,
            recommendation_horizon: parsed(
                &lookup,
                "FORECAST_RECOMMENDATION_HORIZON",
                defaults.recommendation_horizon,
            )?,
            orders: parsed(&lookup, "FORECAST_ORDER_SELECTION", defaults.orders)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.holdout < MIN_HOLDOUT {
            return Err(ForecastError::Configuration(format!(
                "FORECAST_HOLDOUT must be at least {}",
                MIN_HOLDOUT
            )));
        }
        if self.chart_horizon == 0 || self.recommendation_horizon == 0 {
            return Err(ForecastError::Configuration(
                "forecast horizons must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ForecastError::Configuration(format!("Invalid HOST:PORT: {}", e)))
    }
}
