//! Date-aligned forecast output.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A single projected day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Midnight of the projected day.
    pub date: DateTime<Utc>,
    /// Predicted amount, unrounded.
    pub value: f64,
}

/// Forward projection: consecutive days starting the day after an anchor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastSeries {
    points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair `values` with the days following `anchor`, in order.
    pub fn after_anchor(anchor: DateTime<Utc>, values: &[f64]) -> Self {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &value)| ForecastPoint {
                date: anchor + Duration::days(i as i64 + 1),
                value,
            })
            .collect();
        Self { points }
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Projected points in date order.
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Projected dates in order.
    pub fn dates(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Projected values in order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Sum of all projected values.
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }
}
