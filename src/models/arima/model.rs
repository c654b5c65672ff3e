//! ARIMA (Autoregressive Integrated Moving Average) model.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use chrono::{DateTime, Utc};

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    /// Create a new ARIMA specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Total number of parameters.
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1 // AR + MA + intercept
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Coefficient bound keeping AR terms stationary and MA terms invertible.
pub(crate) const COEFFICIENT_BOUND: f64 = 0.99;

/// Residuals of the recursion `w_t = c + sum ar_k (w_{t-k} - c) + sum ma_k e_{t-k} + e_t`.
///
/// `ar[k - 1]` and `ma[k - 1]` hold the coefficient for lag `k`; zeros are
/// allowed so sparse seasonal polynomials share this routine. Residuals
/// before the longest lag are zero.
pub(crate) fn conditional_residuals(w: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let start = ar.len().max(ma.len());
    let mut residuals = vec![0.0; w.len()];

    for t in start..w.len() {
        let pred = one_step(w, &residuals, t, intercept, ar, ma);
        residuals[t] = w[t] - pred;
    }

    residuals
}

/// Conditional sum of squares, `f64::MAX` when there is nothing to score.
pub(crate) fn conditional_sum_of_squares(w: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> f64 {
    let start = ar.len().max(ma.len());
    if w.len() <= start {
        return f64::MAX;
    }
    conditional_residuals(w, intercept, ar, ma)[start..]
        .iter()
        .map(|e| e * e)
        .sum()
}

/// Prediction for index `t` from everything strictly before it.
fn one_step(w: &[f64], residuals: &[f64], t: usize, intercept: f64, ar: &[f64], ma: &[f64]) -> f64 {
    let mut pred = intercept;
    for (k, phi) in ar.iter().enumerate() {
        if *phi != 0.0 && t > k {
            pred += phi * (w[t - 1 - k] - intercept);
        }
    }
    for (k, theta) in ma.iter().enumerate() {
        if *theta != 0.0 && t > k {
            pred += theta * residuals[t - 1 - k];
        }
    }
    pred
}

/// Extend `w` by `horizon` steps with future shocks set to zero.
pub(crate) fn recursive_forecast(
    w: &[f64],
    residuals: &[f64],
    horizon: usize,
    intercept: f64,
    ar: &[f64],
    ma: &[f64],
) -> Vec<f64> {
    let mut extended = w.to_vec();
    let mut shocks = residuals.to_vec();

    for _ in 0..horizon {
        let t = extended.len();
        let pred = one_step(&extended, &shocks, t, intercept, ar, ma);
        extended.push(pred);
        shocks.push(0.0);
    }

    extended.split_off(w.len())
}

/// Gaussian AIC and BIC from residual variance, effective sample size and
/// number of parameters.
pub(crate) fn information_criteria(variance: f64, n_eff: usize, k: usize) -> (f64, f64) {
    let n = n_eff as f64;
    let k = k as f64;
    let variance = variance.max(f64::MIN_POSITIVE);
    let ll = -0.5 * n * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());
    (-2.0 * ll + 2.0 * k, -2.0 * ll + k * n.ln())
}

/// Estimate intercept plus `n_coeffs` bounded coefficients by minimising
/// `objective(intercept, coeffs)`.
pub(crate) fn estimate_bounded<F>(mean: f64, n_coeffs: usize, objective: F) -> Result<Vec<f64>>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let mut initial = vec![mean];
    initial.extend((0..n_coeffs).map(|i| 0.1 / (i + 1) as f64));

    let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
    bounds.extend(std::iter::repeat((-COEFFICIENT_BOUND, COEFFICIENT_BOUND)).take(n_coeffs));

    let config = NelderMeadConfig {
        max_iter: 1000,
        tolerance: 1e-8,
        ..Default::default()
    };

    let result = nelder_mead(
        |params| objective(params[0], &params[1..]),
        &initial,
        Some(&bounds),
        config,
    );

    if result.optimal_point.iter().any(|v| !v.is_finite()) || !result.optimal_value.is_finite() {
        return Err(ForecastError::ModelFitFailure(
            "parameter estimation did not reach a finite optimum".to_string(),
        ));
    }

    Ok(result.optimal_point)
}

/// Reject inputs the recursion cannot handle.
pub(crate) fn ensure_finite(values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ForecastError::ModelFitFailure(format!(
            "non-finite observation at index {}",
            i
        ))),
        None => Ok(()),
    }
}

/// ARIMA forecasting model, the non-seasonal "trend" family.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing
/// - MA(q): Moving average component
///
/// Parameters are estimated by conditional least squares.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Mean of the differenced series.
    intercept: f64,
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    fitted_diff: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl ARIMA {
    /// Create a new, unfitted ARIMA model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_spec(ARIMASpec::new(p, d, q))
    }

    /// Create a new, unfitted ARIMA model from a specification.
    pub fn from_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            original: None,
            differenced: None,
            fitted_diff: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            bic: None,
            last_timestamp: None,
        }
    }

    /// Create an ARIMA(1,1,1) model.
    pub fn arima_111() -> Self {
        Self::new(1, 1, 1)
    }

    /// Get the model specification.
    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    /// Get AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Get MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Get the intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Get residual variance.
    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Minimum number of observations needed to fit this specification.
    pub fn min_observations(&self) -> usize {
        self.spec.d + self.spec.p.max(self.spec.q) + 2
    }

    fn estimate_parameters(&mut self, w: &[f64]) -> Result<()> {
        let (p, q) = (self.spec.p, self.spec.q);
        let mean = w.iter().sum::<f64>() / w.len() as f64;

        if p == 0 && q == 0 {
            self.intercept = mean;
            self.ar_coefficients.clear();
            self.ma_coefficients.clear();
            return Ok(());
        }

        let params = estimate_bounded(mean, p + q, |intercept, coeffs| {
            conditional_sum_of_squares(w, intercept, &coeffs[..p], &coeffs[p..])
        })?;

        self.intercept = params[0];
        self.ar_coefficients = params[1..1 + p].to_vec();
        self.ma_coefficients = params[1 + p..].to_vec();
        Ok(())
    }

    fn calculate_fitted(&mut self, w: &[f64]) {
        let start = self.spec.p.max(self.spec.q);
        let residuals =
            conditional_residuals(w, self.intercept, &self.ar_coefficients, &self.ma_coefficients);

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

impl Default for ARIMA {
    fn default() -> Self {
        Self::arima_111()
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let min_len = self.min_observations();

        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }
        ensure_finite(values)?;

        let w = difference(values, self.spec.d);
        self.estimate_parameters(&w)?;
        self.calculate_fitted(&w);

        self.original = Some(values.to_vec());
        self.differenced = Some(w);
        self.last_timestamp = series.last_timestamp();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(vec![]);
        }

        let future = recursive_forecast(
            w,
            residuals,
            horizon,
            self.intercept,
            &self.ar_coefficients,
            &self.ma_coefficients,
        );
        let predictions = integrate(&future, original, self.spec.d);

        if predictions.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFitFailure(
                "ARIMA forecast diverged".to_string(),
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
        "ARIMA"
    }

    fn training_end(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
    }
}
