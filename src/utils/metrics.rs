//! Accuracy metrics for holdout scoring.

use crate::error::{ForecastError, Result};

/// Accuracy metrics comparing a forecast against held-out observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// Both slices must be non-empty and of equal length.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::InsufficientData {
            needed: 1,
            got: actual.len().min(predicted.len()),
        });
    }

    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let n = actual.len() as f64;
    let (abs_sum, sq_sum) = actual
        .iter()
        .zip(predicted)
        .fold((0.0, 0.0), |(abs_sum, sq_sum), (a, p)| {
            let err = a - p;
            (abs_sum + err.abs(), sq_sum + err * err)
        });

    let mse = sq_sum / n;
    Ok(AccuracyMetrics {
        mae: abs_sum / n,
        mse,
        rmse: mse.sqrt(),
    })
}

/// Root mean squared error between actual and predicted values.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    calculate_metrics(actual, predicted).map(|m| m.rmse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_forecast_has_zero_error() {
        let actual = [1.0, 2.0, 3.0];
        let metrics = calculate_metrics(&actual, &actual).unwrap();
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.rmse, 0.0);
    }

    #[test]
    fn rmse_matches_hand_computation() {
        // errors: 1, -2, 2 -> squared mean = 9 / 3 = 3
        let value = rmse(&[10.0, 20.0, 30.0], &[9.0, 22.0, 28.0]).unwrap();
        assert_relative_eq!(value, 3.0_f64.sqrt(), epsilon = 1e-12);

        let metrics = calculate_metrics(&[10.0, 20.0, 30.0], &[9.0, 22.0, 28.0]).unwrap();
        assert_relative_eq!(metrics.mae, 5.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.mse, 3.0, epsilon = 1e-12);
        assert!(metrics.rmse >= metrics.mae);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert_eq!(
            rmse(&[1.0, 2.0], &[1.0]).unwrap_err(),
            ForecastError::DimensionMismatch { expected: 2, got: 1 }
        );
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(rmse(&[], &[]).is_err());
    }
}
