//! Loading transaction rows into a daily series.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::storage::{Category, TransactionRow, TransactionSource};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Builds daily series from a [`TransactionSource`].
#[derive(Debug, Clone)]
pub struct SeriesLoader<S> {
    source: S,
}

impl<S: TransactionSource> SeriesLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Daily totals for `category` (or every category when `None`) on a
    /// complete calendar from the first to the last observed day, with
    /// days without transactions filled with 0.
    ///
    /// Fails with [`ForecastError::DataUnavailable`] when the query returns
    /// no rows. Unreadable storage ([`ForecastError::Storage`]) and malformed
    /// rows surface as their own error kinds.
    pub fn load(&self, category: Option<Category>) -> Result<TimeSeries> {
        let rows = self.source.transactions(category)?;
        if rows.is_empty() {
            return Err(ForecastError::DataUnavailable(format!(
                "no transactions for {}",
                category.map_or("any category", |c| c.as_str())
            )));
        }

        let series = TimeSeries::from_daily_totals(&daily_totals(&rows));
        tracing::debug!(
            category = category.map(|c| c.as_str()),
            rows = rows.len(),
            days = series.len(),
            "loaded daily series"
        );
        Ok(series)
    }

    /// Like [`load`](Self::load) but an absent series becomes the empty
    /// series marker instead of an error. Every other failure propagates.
    pub fn load_or_empty(&self, category: Option<Category>) -> Result<TimeSeries> {
        match self.load(category) {
            Ok(series) => Ok(series),
            Err(ForecastError::DataUnavailable(reason)) => {
                tracing::warn!(%reason, "no data for series, continuing with an empty one");
                Ok(TimeSeries::empty())
            }
            Err(err) => Err(err),
        }
    }
}

/// Sum amounts per calendar day. Non-finite amounts count as zero.
pub fn daily_totals(rows: &[TransactionRow]) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();
    for row in rows {
        let amount = if row.amount.is_finite() { row.amount } else { 0.0 };
        *totals.entry(row.date).or_insert(0.0) += amount;
    }
    totals
}
