//! Choosing between the trend and seasonal candidates.

use crate::core::TimeSeries;
use crate::error::ForecastError;
use crate::models::{ForecastModel, ModelVariant, OrderSelection};
use crate::pipeline::evaluator::{EvaluationResult, Evaluate, HoldoutEvaluator};

/// Outcome of model selection.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Winning variant.
    pub variant: ModelVariant,
    /// Winner re-fitted on the whole series; unfitted when that re-fit failed.
    pub model: ForecastModel,
    /// Holdout scores of the trend and seasonal candidates, in that order.
    pub scores: [EvaluationResult; 2],
    /// Why the final re-fit failed, if it did.
    pub refit_failure: Option<ForecastError>,
}

impl Selection {
    /// Conventional name of the winning variant.
    pub fn variant_name(&self) -> &'static str {
        self.variant.as_str()
    }

    pub fn score_of(&self, variant: ModelVariant) -> f64 {
        match variant {
            ModelVariant::Trend => self.scores[0].rmse,
            ModelVariant::Seasonal => self.scores[1].rmse,
        }
    }
}

/// The trend model wins unless the seasonal model is strictly better.
pub fn pick_winner(trend: &EvaluationResult, seasonal: &EvaluationResult) -> ModelVariant {
    if trend.rmse <= seasonal.rmse {
        ModelVariant::Trend
    } else if seasonal.rmse < trend.rmse {
        ModelVariant::Seasonal
    } else {
        // NaN compares false both ways
        ModelVariant::Trend
    }
}

/// Scores both candidates with one evaluator and re-fits the winner.
#[derive(Debug, Clone)]
pub struct ModelSelector<E = HoldoutEvaluator> {
    evaluator: E,
    orders: OrderSelection,
}

impl Default for ModelSelector<HoldoutEvaluator> {
    fn default() -> Self {
        Self::new(HoldoutEvaluator::default())
    }
}

impl ModelSelector<HoldoutEvaluator> {
    /// Holdout selector whose final fit uses the same order policy as the
    /// evaluation fits.
    ///
    /// With `holdout >= MIN_HOLDOUT` and fixed orders, any series longer
    /// than the holdout yields a fitted model.
    pub fn holdout(holdout: usize, orders: OrderSelection) -> Self {
        Self {
            evaluator: HoldoutEvaluator::new(holdout).with_orders(orders.clone()),
            orders,
        }
    }
}

impl<E: Evaluate> ModelSelector<E> {
    /// Selector with a custom evaluator and fixed final orders.
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            orders: OrderSelection::Fixed,
        }
    }

    /// Order policy for the final fit on the whole series.
    pub fn with_orders(mut self, orders: OrderSelection) -> Self {
        self.orders = orders;
        self
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Evaluate both variants on `series`, pick the winner and re-fit it on
    /// the entire series.
    ///
    /// Never fails. When both candidates are unbounded the trend variant is
    /// returned; when the final re-fit fails the returned model is unfitted
    /// and projecting it reports the failure.
    pub fn select(&self, series: &TimeSeries) -> Selection {
        let trend = self.evaluator.evaluate(ModelVariant::Trend, series);
        let seasonal = self.evaluator.evaluate(ModelVariant::Seasonal, series);
        let variant = pick_winner(&trend, &seasonal);

        tracing::info!(
            winner = %variant,
            trend_rmse = trend.rmse,
            seasonal_rmse = seasonal.rmse,
            observations = series.len(),
            "model selected"
        );

        let (model, refit_failure) = match variant.fit(series, &self.orders) {
            Ok(model) => (model, None),
            Err(err) => {
                tracing::warn!(%variant, %err, "re-fit on the full series failed");
                (variant.unfitted(), Some(err))
            }
        };

        Selection {
            variant,
            model,
            scores: [trend, seasonal],
            refit_failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::ARIMA;
    use crate::models::Forecaster;
    use crate::pipeline::{project, MIN_HOLDOUT};
    use chrono::NaiveDate;

    /// Evaluator returning fixed scores per variant.
    struct FixedScores {
        trend: f64,
        seasonal: f64,
    }

    impl Evaluate for FixedScores {
        fn evaluate(&self, variant: ModelVariant, _series: &TimeSeries) -> EvaluationResult {
            let score = match variant {
                ModelVariant::Trend => self.trend,
                ModelVariant::Seasonal => self.seasonal,
            };
            EvaluationResult::scored(variant, score)
        }
    }

    fn make_ts(n: usize) -> TimeSeries {
        let values = (0..n)
            .map(|i| 40.0 + (i % 7) as f64 * 5.0 + (i as f64 * 0.5).cos())
            .collect();
        TimeSeries::from_start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values)
    }

    #[test]
    fn equal_scores_prefer_trend() {
        let selector = ModelSelector::new(FixedScores {
            trend: 4.2,
            seasonal: 4.2,
        });
        assert_eq!(selector.select(&make_ts(60)).variant, ModelVariant::Trend);
    }

    #[test]
    fn strictly_better_seasonal_wins() {
        let selector = ModelSelector::new(FixedScores {
            trend: 4.2,
            seasonal: 4.1,
        });
        let selection = selector.select(&make_ts(60));
        assert_eq!(selection.variant, ModelVariant::Seasonal);
        assert_eq!(selection.variant_name(), "SARIMA");
        assert_eq!(selection.model.variant(), ModelVariant::Seasonal);
    }

    #[test]
    fn both_unbounded_prefers_trend() {
        let selector = ModelSelector::new(FixedScores {
            trend: f64::INFINITY,
            seasonal: f64::INFINITY,
        });
        assert_eq!(selector.select(&make_ts(60)).variant, ModelVariant::Trend);
    }

    #[test]
    fn nan_scores_fall_back_to_trend() {
        let nan = EvaluationResult::scored(ModelVariant::Trend, f64::NAN);
        let seasonal = EvaluationResult::scored(ModelVariant::Seasonal, f64::NAN);
        assert_eq!(pick_winner(&nan, &seasonal), ModelVariant::Trend);
    }

    #[test]
    fn winner_is_refit_on_full_series() {
        let ts = make_ts(60);
        let selection = ModelSelector::default().select(&ts);
        assert!(selection.refit_failure.is_none());
        assert!(selection.model.is_fitted());
        assert_eq!(selection.model.training_end(), ts.last_timestamp());
    }

    #[test]
    fn empty_series_still_returns_a_selection() {
        let selection = ModelSelector::default().select(&TimeSeries::empty());
        assert_eq!(selection.variant, ModelVariant::Trend);
        assert!(selection.scores.iter().all(|s| s.is_unbounded()));
        assert!(selection.refit_failure.is_some());
        assert!(!selection.model.is_fitted());
    }

    #[test]
    fn scores_are_reported_per_variant() {
        let selector = ModelSelector::new(FixedScores {
            trend: 1.0,
            seasonal: 2.0,
        });
        let selection = selector.select(&make_ts(40));
        assert_eq!(selection.score_of(ModelVariant::Trend), 1.0);
        assert_eq!(selection.score_of(ModelVariant::Seasonal), 2.0);
    }

    #[test]
    fn shortest_series_above_min_holdout_is_refit() {
        assert_eq!(ARIMA::arima_111().min_observations(), MIN_HOLDOUT + 1);

        let ts = TimeSeries::from_start(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            vec![10.0, 12.0, 11.0, 13.0],
        );
        let selection = ModelSelector::holdout(MIN_HOLDOUT, OrderSelection::Fixed).select(&ts);

        assert_eq!(selection.variant, ModelVariant::Trend);
        assert!(selection.refit_failure.is_none());
        assert!(selection.model.is_fitted());
        assert_eq!(project(&selection.model, 5).unwrap().horizon(), 5);
    }
}
