//! Error types for the cashflow-forecast crate.

use thiserror::Error;

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading, fitting, selecting or projecting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// The data source was queried successfully but returned no rows.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// The data source could not be read (driver, schema or I/O failure).
    #[error("storage error: {0}")]
    Storage(String),

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Parameter estimation or forecasting did not produce a usable model.
    #[error("model fit failure: {0}")]
    ModelFitFailure(String),

    /// A selected model could not produce a forward projection.
    #[error("projection failure: {0}")]
    ProjectionFailure(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error (malformed or out-of-order dates).
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// The recommendation generator could not be reached or answered badly.
    #[error("recommendation error: {0}")]
    Recommendation(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The HTTP listener could not be bound or stopped with an error.
    #[error("server error: {0}")]
    Server(String),

    /// A background task panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for ForecastError {
    fn from(err: rusqlite::Error) -> Self {
        ForecastError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        ForecastError::Recommendation(err.to_string())
    }
}

impl ForecastError {
    /// Whether this error belongs to the numerical failures that model
    /// selection absorbs as an unbounded score.
    pub fn is_absorbable(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData { .. }
                | ForecastError::ModelFitFailure(_)
                | ForecastError::FitRequired
        )
    }
}
