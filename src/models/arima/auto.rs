//! Bounded automatic order selection for the trend and seasonal families.
//!
//! Differencing is fixed (d = 1, and D = 1 at period 7 for the seasonal
//! family); only the AR/MA orders are searched. Candidates are visited in
//! a fixed order and ties keep the earlier candidate, so the result is
//! deterministic for a given series. `max_fits` caps the number of fits.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::model::ARIMA;
use crate::models::arima::sarima::{SARIMA, WEEKLY_PERIOD};
use crate::models::Forecaster;

/// Non-seasonal (p, q) pairs, simplest first.
const NONSEASONAL: [(usize, usize); 9] = [
    (0, 0),
    (1, 0),
    (0, 1),
    (1, 1),
    (2, 0),
    (0, 2),
    (2, 1),
    (1, 2),
    (2, 2),
];

/// Seasonal (P, Q) pairs tried with every non-seasonal pair.
const SEASONAL: [(usize, usize); 4] = [(0, 1), (1, 0), (1, 1), (0, 0)];

/// Configuration for the order search.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoOrderConfig {
    /// Maximum non-seasonal AR order.
    pub max_p: usize,
    /// Maximum non-seasonal MA order.
    pub max_q: usize,
    /// Maximum seasonal AR order.
    pub max_cap_p: usize,
    /// Maximum seasonal MA order.
    pub max_cap_q: usize,
    /// Hard cap on the number of candidate fits per search.
    pub max_fits: usize,
    /// Rank by AIC (true) or BIC (false).
    pub use_aic: bool,
}

impl Default for AutoOrderConfig {
    fn default() -> Self {
        Self {
            max_p: 2,
            max_q: 2,
            max_cap_p: 1,
            max_cap_q: 1,
            max_fits: 24,
            use_aic: true,
        }
    }
}

impl AutoOrderConfig {
    /// Set maximum non-seasonal orders.
    pub fn with_max_orders(mut self, max_p: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_q = max_q;
        self
    }

    /// Set maximum seasonal orders.
    pub fn with_seasonal_orders(mut self, max_cap_p: usize, max_cap_q: usize) -> Self {
        self.max_cap_p = max_cap_p;
        self.max_cap_q = max_cap_q;
        self
    }

    /// Set the cap on candidate fits.
    pub fn with_max_fits(mut self, max_fits: usize) -> Self {
        self.max_fits = max_fits;
        self
    }
}

/// Full order (p, d, q)(P, D, Q)\[s\] of a searched candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub cap_p: usize,
    pub cap_d: usize,
    pub cap_q: usize,
    pub s: usize,
}

/// Order search over a small fixed grid.
#[derive(Debug, Clone, Default)]
pub struct AutoOrderSearch {
    config: AutoOrderConfig,
    scores: Vec<(ModelOrder, f64)>,
}

impl AutoOrderSearch {
    pub fn new(config: AutoOrderConfig) -> Self {
        Self {
            config,
            scores: Vec::new(),
        }
    }

    pub fn config(&self) -> &AutoOrderConfig {
        &self.config
    }

    /// Scores of every candidate that fitted in the last search.
    pub fn scores(&self) -> &[(ModelOrder, f64)] {
        &self.scores
    }

    /// Candidate orders for the trend family, capped by `max_fits`.
    pub fn trend_candidates(&self) -> Vec<ModelOrder> {
        NONSEASONAL
            .iter()
            .filter(|(p, q)| *p <= self.config.max_p && *q <= self.config.max_q)
            .map(|&(p, q)| ModelOrder {
                p,
                d: 1,
                q,
                cap_p: 0,
                cap_d: 0,
                cap_q: 0,
                s: 0,
            })
            .take(self.config.max_fits)
            .collect()
    }

    /// Candidate orders for the seasonal family, capped by `max_fits`.
    pub fn seasonal_candidates(&self) -> Vec<ModelOrder> {
        let cfg = &self.config;
        NONSEASONAL
            .iter()
            .filter(|(p, q)| *p <= cfg.max_p && *q <= cfg.max_q)
            .flat_map(|&(p, q)| {
                SEASONAL
                    .iter()
                    .filter(|(cp, cq)| *cp <= cfg.max_cap_p && *cq <= cfg.max_cap_q)
                    .map(move |&(cap_p, cap_q)| ModelOrder {
                        p,
                        d: 1,
                        q,
                        cap_p,
                        cap_d: 1,
                        cap_q,
                        s: WEEKLY_PERIOD,
                    })
            })
            .take(cfg.max_fits)
            .collect()
    }

    /// Fit the best trend candidate.
    pub fn fit_trend(&mut self, series: &TimeSeries) -> Result<ARIMA> {
        let use_aic = self.config.use_aic;
        let candidates = self.trend_candidates();
        self.best_of(candidates, |order| {
            let mut model = ARIMA::new(order.p, order.d, order.q);
            model.fit(series)?;
            let score = if use_aic { model.aic() } else { model.bic() };
            Ok((model, score))
        })
    }

    /// Fit the best seasonal candidate.
    pub fn fit_seasonal(&mut self, series: &TimeSeries) -> Result<SARIMA> {
        let use_aic = self.config.use_aic;
        let candidates = self.seasonal_candidates();
        self.best_of(candidates, |order| {
            let mut model = SARIMA::new(
                order.p, order.d, order.q, order.cap_p, order.cap_d, order.cap_q, order.s,
            );
            model.fit(series)?;
            let score = if use_aic { model.aic() } else { model.bic() };
            Ok((model, score))
        })
    }

    fn best_of<M, F>(&mut self, candidates: Vec<ModelOrder>, fit: F) -> Result<M>
    where
        F: Fn(ModelOrder) -> Result<(M, Option<f64>)>,
    {
        self.scores.clear();
        let mut best: Option<(M, f64)> = None;
        let mut last_error = None;

        for order in candidates {
            match fit(order) {
                Ok((model, Some(score))) if score.is_finite() => {
                    tracing::debug!(?order, score, "candidate order fitted");
                    self.scores.push((order, score));
                    if best.as_ref().map_or(true, |(_, b)| score < *b) {
                        best = Some((model, score));
                    }
                }
                Ok(_) => {
                    tracing::debug!(?order, "candidate order has no finite score");
                }
                Err(err) => {
                    tracing::debug!(?order, %err, "candidate order failed");
                    last_error = Some(err);
                }
            }
        }

        best.map(|(model, _)| model).ok_or_else(|| match last_error {
            Some(err @ ForecastError::InsufficientData { .. }) => err,
            Some(err) => ForecastError::ModelFitFailure(format!("no candidate order fitted: {}", err)),
            None => ForecastError::ModelFitFailure("no candidate order fitted".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_ts(values: Vec<f64>) -> TimeSeries {
        TimeSeries::from_start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values)
    }

    fn noisy_weekly(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 50.0 + 0.3 * i as f64 + [0.0, 3.0, 5.0, 2.0, 8.0, 12.0, -4.0][i % 7] + (i as f64 * 2.3).sin())
            .collect()
    }

    #[test]
    fn candidates_respect_limits() {
        let search = AutoOrderSearch::new(AutoOrderConfig::default().with_max_orders(1, 1));
        let trend = search.trend_candidates();
        assert_eq!(trend.len(), 4);
        assert!(trend.iter().all(|o| o.p <= 1 && o.q <= 1 && o.d == 1));
    }

    #[test]
    fn max_fits_caps_candidates() {
        let search = AutoOrderSearch::new(AutoOrderConfig::default().with_max_fits(5));
        assert_eq!(search.trend_candidates().len(), 5);
        assert_eq!(search.seasonal_candidates().len(), 5);
        assert!(search
            .seasonal_candidates()
            .iter()
            .all(|o| o.s == WEEKLY_PERIOD && o.cap_d == 1));
    }

    #[test]
    fn trend_search_is_deterministic() {
        let ts = make_ts(noisy_weekly(80));
        let mut first = AutoOrderSearch::default();
        let mut second = AutoOrderSearch::default();

        let a = first.fit_trend(&ts).unwrap();
        let b = second.fit_trend(&ts).unwrap();
        assert_eq!(a.spec(), b.spec());
        assert_eq!(first.scores(), second.scores());
    }

    #[test]
    fn seasonal_search_picks_lowest_score() {
        let ts = make_ts(noisy_weekly(90));
        let mut search = AutoOrderSearch::new(AutoOrderConfig::default().with_max_fits(8));
        let model = search.fit_seasonal(&ts).unwrap();

        let best = search
            .scores()
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(model.aic(), Some(best));
    }

    #[test]
    fn search_on_tiny_series_reports_insufficient_data() {
        let mut search = AutoOrderSearch::default();
        assert!(matches!(
            search.fit_seasonal(&make_ts(vec![1.0, 2.0, 3.0])),
            Err(ForecastError::InsufficientData { .. })
        ));
    }
}
