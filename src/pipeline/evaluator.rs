//! Single chronological holdout scoring.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::{ModelVariant, OrderSelection};
use crate::utils::rmse;

/// Default number of trailing days held out for scoring.
pub const DEFAULT_HOLDOUT: usize = 15;

/// Shortest holdout for which every series longer than the holdout can
/// still re-fit the trend model on its full length.
pub const MIN_HOLDOUT: usize = 3;

/// Score of one candidate on the holdout window.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub variant: ModelVariant,
    /// Holdout RMSE, or `f64::INFINITY` when the candidate failed.
    pub rmse: f64,
    /// Why the candidate failed, if it did.
    pub failure: Option<ForecastError>,
}

impl EvaluationResult {
    pub fn scored(variant: ModelVariant, rmse: f64) -> Self {
        Self {
            variant,
            rmse,
            failure: None,
        }
    }

    /// Unbounded error for a candidate that could not be scored.
    pub fn unbounded(variant: ModelVariant, failure: ForecastError) -> Self {
        Self {
            variant,
            rmse: f64::INFINITY,
            failure: Some(failure),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        !self.rmse.is_finite()
    }
}

/// Scores a model variant on a series.
pub trait Evaluate {
    /// Score `variant` on `series`. Never fails: a candidate that cannot be
    /// scored gets an unbounded error.
    fn evaluate(&self, variant: ModelVariant, series: &TimeSeries) -> EvaluationResult;
}

/// Fits on everything but the last `holdout` observations and scores the
/// forecast of those observations.
#[derive(Debug, Clone)]
pub struct HoldoutEvaluator {
    holdout: usize,
    orders: OrderSelection,
}

impl Default for HoldoutEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_HOLDOUT)
    }
}

impl HoldoutEvaluator {
    /// Evaluator holding out the last `holdout` observations. Holdouts below
    /// [`MIN_HOLDOUT`] are accepted here but rejected by the service settings.
    pub fn new(holdout: usize) -> Self {
        Self {
            holdout,
            orders: OrderSelection::Fixed,
        }
    }

    pub fn with_orders(mut self, orders: OrderSelection) -> Self {
        self.orders = orders;
        self
    }

    pub fn holdout(&self) -> usize {
        self.holdout
    }

    pub fn orders(&self) -> &OrderSelection {
        &self.orders
    }

    /// Holdout RMSE of `variant` on `series`.
    ///
    /// Fails with [`ForecastError::InsufficientData`] when the series is not
    /// longer than the holdout, and with the fitting error when the
    /// candidate cannot be fitted or forecast.
    pub fn try_evaluate(&self, variant: ModelVariant, series: &TimeSeries) -> Result<f64> {
        if self.holdout == 0 {
            return Err(ForecastError::InvalidParameter(
                "holdout must be at least 1".to_string(),
            ));
        }

        let (train, test) = series.split_tail(self.holdout)?;
        let model = variant.fit(&train, &self.orders)?;
        let predictions = model.forecast(self.holdout)?;
        let score = rmse(test.values(), &predictions)?;

        if !score.is_finite() {
            return Err(ForecastError::ModelFitFailure(format!(
                "{} produced a non-finite holdout error",
                variant
            )));
        }
        Ok(score)
    }
}

impl Evaluate for HoldoutEvaluator {
    fn evaluate(&self, variant: ModelVariant, series: &TimeSeries) -> EvaluationResult {
        match self.try_evaluate(variant, series) {
            Ok(score) => {
                tracing::debug!(%variant, rmse = score, holdout = self.holdout, "candidate scored");
                EvaluationResult::scored(variant, score)
            }
            Err(err) => {
                if err.is_absorbable() {
                    tracing::warn!(%variant, %err, "candidate could not be scored");
                } else {
                    tracing::error!(%variant, %err, "candidate could not be scored");
                }
                EvaluationResult::unbounded(variant, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_ts(values: Vec<f64>) -> TimeSeries {
        TimeSeries::from_start(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), values)
    }

    fn wobble(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 50.0 + [0.0, 1.0, -1.0][i % 3] + (i as f64 * 0.37).sin() * 2.0)
            .collect()
    }

    #[test]
    fn both_variants_score_finite_on_reasonable_series() {
        let ts = make_ts(wobble(100));
        let evaluator = HoldoutEvaluator::default();
        for variant in ModelVariant::ALL {
            let score = evaluator.try_evaluate(variant, &ts).unwrap();
            assert!(score.is_finite());
            assert!(score >= 0.0);
        }
    }

    #[test]
    fn series_not_longer_than_holdout_is_insufficient() {
        let ts = make_ts(wobble(15));
        let evaluator = HoldoutEvaluator::new(15);
        assert_eq!(
            evaluator.try_evaluate(ModelVariant::Trend, &ts).unwrap_err(),
            ForecastError::InsufficientData { needed: 16, got: 15 }
        );

        let result = evaluator.evaluate(ModelVariant::Trend, &ts);
        assert!(result.is_unbounded());
        assert_eq!(result.rmse, f64::INFINITY);
    }

    #[test]
    fn minimal_training_window_does_not_panic() {
        let ts = make_ts(wobble(16));
        let evaluator = HoldoutEvaluator::new(15);
        for variant in ModelVariant::ALL {
            let result = evaluator.evaluate(variant, &ts);
            assert!(result.is_unbounded());
            assert!(result.failure.is_some());
        }
    }

    #[test]
    fn empty_series_is_unbounded() {
        let evaluator = HoldoutEvaluator::default();
        let result = evaluator.evaluate(ModelVariant::Seasonal, &TimeSeries::empty());
        assert!(result.is_unbounded());
        assert!(matches!(
            result.failure,
            Some(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn zero_holdout_is_rejected() {
        let evaluator = HoldoutEvaluator::new(0);
        assert!(matches!(
            evaluator.try_evaluate(ModelVariant::Trend, &make_ts(wobble(30))),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn perfectly_linear_series_scores_near_zero_for_trend() {
        let ts = make_ts((0..60).map(|i| 10.0 + 3.0 * i as f64).collect());
        let score = HoldoutEvaluator::default()
            .try_evaluate(ModelVariant::Trend, &ts)
            .unwrap();
        assert!(score < 1e-2);
    }
}
