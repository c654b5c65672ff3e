//! Daily time series of transaction totals.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::BTreeMap;

/// Midnight (UTC) of the given calendar day.
pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Today's date normalized to midnight (UTC).
pub fn today_midnight() -> DateTime<Utc> {
    midnight(Utc::now().date_naive())
}

/// A univariate time series on a complete daily calendar.
///
/// Timestamps are midnight UTC, strictly increasing by exactly one day.
/// There are no gaps: days without transactions carry a value of 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// An empty series, the marker for "no data for this filter".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a daily series of `values` starting at `start`.
    pub fn from_start(start: NaiveDate, values: Vec<f64>) -> Self {
        let origin = midnight(start);
        let timestamps = (0..values.len())
            .map(|i| origin + Duration::days(i as i64))
            .collect();
        Self { timestamps, values }
    }

    /// Reindex per-day totals onto the full calendar between the first and
    /// last observed day, filling missing days with 0.
    pub fn from_daily_totals(totals: &BTreeMap<NaiveDate, f64>) -> Self {
        let (first, last) = match (totals.keys().next(), totals.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Self::empty(),
        };

        let values = first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|day| totals.get(&day).copied().unwrap_or(0.0))
            .collect();

        Self::from_start(first, values)
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First observed timestamp.
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    /// Last observed timestamp (the anchor for projections).
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Iterate over (timestamp, value) pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// Extract the observations in `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end || end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "invalid slice {}..{} of series with {} observations",
                start,
                end,
                self.len()
            )));
        }

        Ok(Self {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Chronological split holding out the last `holdout` observations.
    ///
    /// Requires `len() > holdout` so the training part is never empty.
    pub fn split_tail(&self, holdout: usize) -> Result<(TimeSeries, TimeSeries)> {
        if self.len() <= holdout {
            return Err(ForecastError::InsufficientData {
                needed: holdout + 1,
                got: self.len(),
            });
        }

        let cut = self.len() - holdout;
        Ok((self.slice(0, cut)?, self.slice(cut, self.len())?))
    }
}
