//! Seasonal ARIMA, SARIMA(p, d, q)(P, D, Q)\[s\].
//!
//! The multiplicative seasonal model
//!
//! ```text
//! (1 - phi(B)) (1 - Phi(B^s)) w_t = c + (1 + theta(B)) (1 + Theta(B^s)) e_t
//! ```
//!
//! is expanded into one sparse AR and one sparse MA polynomial, so fitting
//! and forecasting reuse the conditional-sum-of-squares recursion of the
//! non-seasonal model. `w` is the series after `d` regular and `D`
//! seasonal differences.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate, seasonal_difference, seasonal_integrate};
use crate::models::arima::model::{
    conditional_residuals, conditional_sum_of_squares, ensure_finite, estimate_bounded,
    information_criteria, recursive_forecast,
};
use crate::models::Forecaster;
use chrono::{DateTime, Utc};

/// Days in the weekly cycle.
pub const WEEKLY_PERIOD: usize = 7;

/// SARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SARIMASpec {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    /// Seasonal AR order (P)
    pub cap_p: usize,
    /// Seasonal differencing order (D)
    pub cap_d: usize,
    /// Seasonal MA order (Q)
    pub cap_q: usize,
    /// Seasonal period (s)
    pub s: usize,
}

impl SARIMASpec {
    pub fn new(p: usize, d: usize, q: usize, cap_p: usize, cap_d: usize, cap_q: usize, s: usize) -> Self {
        Self {
            p,
            d,
            q,
            cap_p,
            cap_d,
            cap_q,
            s,
        }
    }

    /// (1,1,1)(1,1,1)\[7\].
    pub fn weekly() -> Self {
        Self::new(1, 1, 1, 1, 1, 1, WEEKLY_PERIOD)
    }

    /// Free parameters: intercept plus the four coefficient groups.
    pub fn num_params(&self) -> usize {
        1 + self.p + self.q + self.cap_p + self.cap_q
    }

    /// Highest lag of the expanded AR polynomial.
    pub fn ar_lags(&self) -> usize {
        self.p + self.s * self.cap_p
    }

    /// Highest lag of the expanded MA polynomial.
    pub fn ma_lags(&self) -> usize {
        self.q + self.s * self.cap_q
    }
}

impl Default for SARIMASpec {
    fn default() -> Self {
        Self::weekly()
    }
}

/// Coefficients of `(1 - sum phi_i B^i)(1 - sum Phi_j B^{sj})` written as
/// `1 - sum a_k B^k`; `a[k - 1]` is the lag-`k` term.
pub(crate) fn expand_ar(phi: &[f64], seasonal: &[f64], s: usize) -> Vec<f64> {
    let mut a = vec![0.0; phi.len() + s * seasonal.len()];
    for (i, x) in phi.iter().enumerate() {
        a[i] += x;
    }
    for (j, big) in seasonal.iter().enumerate() {
        let lag = s * (j + 1);
        a[lag - 1] += big;
        for (i, x) in phi.iter().enumerate() {
            a[lag + i] -= x * big;
        }
    }
    a
}

/// Coefficients of `(1 + sum theta_i B^i)(1 + sum Theta_j B^{sj})` written
/// as `1 + sum m_k B^k`; `m[k - 1]` is the lag-`k` term.
pub(crate) fn expand_ma(theta: &[f64], seasonal: &[f64], s: usize) -> Vec<f64> {
    let mut m = vec![0.0; theta.len() + s * seasonal.len()];
    for (i, x) in theta.iter().enumerate() {
        m[i] += x;
    }
    for (j, big) in seasonal.iter().enumerate() {
        let lag = s * (j + 1);
        m[lag - 1] += big;
        for (i, x) in theta.iter().enumerate() {
            m[lag + i] += x * big;
        }
    }
    m
}

/// Seasonal ARIMA model, the weekly "seasonal" family.
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: SARIMASpec,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    seasonal_ar_coefficients: Vec<f64>,
    seasonal_ma_coefficients: Vec<f64>,
    intercept: f64,
    /// Expanded polynomials used by the recursion.
    ar_expanded: Vec<f64>,
    ma_expanded: Vec<f64>,
    original: Option<Vec<f64>>,
    /// Series after regular differencing only.
    regular_diff: Option<Vec<f64>>,
    /// Series after regular and seasonal differencing.
    differenced: Option<Vec<f64>>,
    fitted_diff: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl SARIMA {
    /// Create a new, unfitted SARIMA model.
    pub fn new(p: usize, d: usize, q: usize, cap_p: usize, cap_d: usize, cap_q: usize, s: usize) -> Self {
        Self::from_spec(SARIMASpec::new(p, d, q, cap_p, cap_d, cap_q, s))
    }

    /// Create a new, unfitted SARIMA model from a specification.
    pub fn from_spec(spec: SARIMASpec) -> Self {
        Self {
            spec,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            seasonal_ar_coefficients: vec![],
            seasonal_ma_coefficients: vec![],
            intercept: 0.0,
            ar_expanded: vec![],
            ma_expanded: vec![],
            original: None,
            regular_diff: None,
            differenced: None,
            fitted_diff: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            bic: None,
            last_timestamp: None,
        }
    }

    /// Create a SARIMA(1,1,1)(1,1,1)\[7\] model.
    pub fn weekly() -> Self {
        Self::from_spec(SARIMASpec::weekly())
    }

    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.seasonal_ar_coefficients
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.seasonal_ma_coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Minimum number of observations needed to fit this specification.
    pub fn min_observations(&self) -> usize {
        let spec = self.spec;
        spec.d + spec.cap_d * spec.s + spec.ar_lags().max(spec.ma_lags()) + 2
    }

    fn split_params(&self, coeffs: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let SARIMASpec {
            p, q, cap_p, s, ..
        } = self.spec;
        let (phi, rest) = coeffs.split_at(p);
        let (theta, rest) = rest.split_at(q);
        let (big_phi, big_theta) = rest.split_at(cap_p);
        (expand_ar(phi, big_phi, s), expand_ma(theta, big_theta, s))
    }

    fn estimate_parameters(&mut self, w: &[f64]) -> Result<()> {
        let spec = self.spec;
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let n_coeffs = spec.p + spec.q + spec.cap_p + spec.cap_q;

        let params = if n_coeffs == 0 {
            vec![mean]
        } else {
            estimate_bounded(mean, n_coeffs, |intercept, coeffs| {
                let (ar, ma) = self.split_params(coeffs);
                conditional_sum_of_squares(w, intercept, &ar, &ma)
            })?
        };

        let coeffs = &params[1..];
        let (phi, rest) = coeffs.split_at(spec.p);
        let (theta, rest) = rest.split_at(spec.q);
        let (big_phi, big_theta) = rest.split_at(spec.cap_p);

        self.intercept = params[0];
        self.ar_coefficients = phi.to_vec();
        self.ma_coefficients = theta.to_vec();
        self.seasonal_ar_coefficients = big_phi.to_vec();
        self.seasonal_ma_coefficients = big_theta.to_vec();
        let (ar, ma) = self.split_params(coeffs);
        self.ar_expanded = ar;
        self.ma_expanded = ma;
        Ok(())
    }

    fn calculate_fitted(&mut self, w: &[f64]) {
        let start = self.ar_expanded.len().max(self.ma_expanded.len());
        let residuals = conditional_residuals(w, self.intercept, &self.ar_expanded, &self.ma_expanded);

        let fitted: Vec<f64> = w
            .iter()
            .zip(&residuals)
            .enumerate()
            .map(|(t, (obs, e))| if t < start { f64::NAN } else { obs - e })
            .collect();

        let scored = &residuals[start.min(residuals.len())..];
        if !scored.is_empty() {
            let variance = scored.iter().map(|r| r * r).sum::<f64>() / scored.len() as f64;
            let (aic, bic) = information_criteria(variance, scored.len(), self.spec.num_params());
            self.residual_variance = Some(variance);
            self.aic = Some(aic);
            self.bic = Some(bic);
        }

        self.fitted_diff = Some(fitted);
        self.residuals = Some(residuals);
    }
}

impl Default for SARIMA {
    fn default() -> Self {
        Self::weekly()
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if self.spec.s < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal period must be at least 2, got {}",
                self.spec.s
            )));
        }

        let values = series.values();
        let min_len = self.min_observations();
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }
        ensure_finite(values)?;

        let u = difference(values, self.spec.d);
        let w = seasonal_difference(&u, self.spec.cap_d, self.spec.s);

        self.estimate_parameters(&w)?;
        self.calculate_fitted(&w);

        self.original = Some(values.to_vec());
        self.regular_diff = Some(u);
        self.differenced = Some(w);
        self.last_timestamp = series.last_timestamp();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let u = self.regular_diff.as_ref().ok_or(ForecastError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(vec![]);
        }

        let future_w = recursive_forecast(
            w,
            residuals,
            horizon,
            self.intercept,
            &self.ar_expanded,
            &self.ma_expanded,
        );
        let future_u = seasonal_integrate(&future_w, u, self.spec.cap_d, self.spec.s);
        let predictions = integrate(&future_u, original, self.spec.d);

        if predictions.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFitFailure(
                "SARIMA forecast diverged".to_string(),
            ));
        }
        Ok(predictions)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted_diff.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SARIMA"
    }

    fn training_end(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    const WEEK: [f64; 7] = [12.0, 15.0, 14.0, 13.0, 25.0, 40.0, 5.0];

    fn make_ts(values: Vec<f64>) -> TimeSeries {
        TimeSeries::from_start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values)
    }

    fn weekly_with_trend(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + 0.5 * i as f64 + WEEK[i % 7]).collect()
    }

    #[test]
    fn expanded_ar_has_cross_term() {
        // (1 - 0.5B)(1 - 0.4B^7) = 1 - 0.5B - 0.4B^7 + 0.2B^8
        let a = expand_ar(&[0.5], &[0.4], 7);
        assert_eq!(a.len(), 8);
        assert_abs_diff_eq!(a[0], 0.5);
        assert_abs_diff_eq!(a[6], 0.4);
        assert_abs_diff_eq!(a[7], -0.2);
        assert!(a[1..6].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn expanded_ma_has_cross_term() {
        // (1 + 0.3B)(1 + 0.5B^7) = 1 + 0.3B + 0.5B^7 + 0.15B^8
        let m = expand_ma(&[0.3], &[0.5], 7);
        assert_abs_diff_eq!(m[0], 0.3);
        assert_abs_diff_eq!(m[6], 0.5);
        assert_abs_diff_eq!(m[7], 0.15, epsilon = 1e-12);
    }

    #[test]
    fn weekly_spec_requirements() {
        let model = SARIMA::weekly();
        assert_eq!(model.spec().ar_lags(), 8);
        assert_eq!(model.spec().ma_lags(), 8);
        assert_eq!(model.min_observations(), 1 + 7 + 8 + 2);
        assert_eq!(model.spec().num_params(), 5);
        assert_eq!(model.name(), "SARIMA");
    }

    #[test]
    fn reproduces_exact_weekly_pattern() {
        let values = weekly_with_trend(70);
        let truth = weekly_with_trend(84);
        let mut model = SARIMA::weekly();
        model.fit(&make_ts(values)).unwrap();

        let preds = model.predict(14).unwrap();
        for (p, t) in preds.iter().zip(&truth[70..]) {
            assert_abs_diff_eq!(p, t, epsilon = 1e-3);
        }
    }

    #[test]
    fn noisy_weekly_fit_is_finite() {
        let values: Vec<f64> = weekly_with_trend(90)
            .into_iter()
            .enumerate()
            .map(|(i, v)| v + (i as f64 * 1.7).sin() * 3.0)
            .collect();
        let mut model = SARIMA::weekly();
        model.fit(&make_ts(values)).unwrap();

        assert!(model.aic().unwrap().is_finite());
        assert_eq!(model.seasonal_ar_coefficients().len(), 1);
        assert_eq!(model.seasonal_ma_coefficients().len(), 1);
        let preds = model.predict(30).unwrap();
        assert_eq!(preds.len(), 30);
        assert!(preds.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn short_series_is_insufficient() {
        let mut model = SARIMA::weekly();
        assert_eq!(
            model.fit(&make_ts(weekly_with_trend(17))).unwrap_err(),
            ForecastError::InsufficientData { needed: 18, got: 17 }
        );
    }

    #[test]
    fn period_below_two_is_invalid() {
        let mut model = SARIMA::new(1, 1, 1, 1, 1, 1, 1);
        assert!(matches!(
            model.fit(&make_ts(weekly_with_trend(40))),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn requires_fit() {
        assert_eq!(SARIMA::weekly().predict(3).unwrap_err(), ForecastError::FitRequired);
    }

    #[test]
    fn records_training_end() {
        let ts = make_ts(weekly_with_trend(40));
        let mut model = SARIMA::weekly();
        model.fit(&ts).unwrap();
        assert_eq!(model.training_end(), ts.last_timestamp());
    }
}
