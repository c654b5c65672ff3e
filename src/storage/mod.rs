//! Data access for transaction rows and business figures.
//!
//! The forecasting core only sees the [`TransactionSource`] trait; the
//! handle is passed in explicitly and owns its own connection handling.

mod memory;
mod sqlite;

pub use memory::InMemorySource;
pub use sqlite::SqliteStore;

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Transaction category filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Revenue.
    Receita,
    /// Expense.
    Despesa,
}

impl Category {
    /// Value stored in the `tipo` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Receita => "receita",
            Category::Despesa => "despesa",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "receita" => Ok(Category::Receita),
            "despesa" => Ok(Category::Despesa),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown category '{}', expected 'receita' or 'despesa'",
                other
            ))),
        }
    }
}

/// One transaction as read from storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionRow {
    pub date: NaiveDate,
    pub amount: f64,
}

impl TransactionRow {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Figures used to ground the recommendation prompt.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BusinessSnapshot {
    /// Product with the largest quantity sold.
    pub top_product: Option<String>,
    /// Product with the smallest unit margin among those with a sale price.
    pub lowest_margin_product: Option<String>,
    /// Average revenue transaction amount.
    pub average_revenue: f64,
    /// Average expense transaction amount.
    pub average_expense: f64,
}

/// Read-only access to the transaction store.
pub trait TransactionSource {
    /// All transactions, optionally restricted to one category.
    fn transactions(&self, category: Option<Category>) -> Result<Vec<TransactionRow>>;

    /// Aggregate business figures.
    fn business_snapshot(&self) -> Result<BusinessSnapshot>;
}

impl<T: TransactionSource + ?Sized> TransactionSource for &T {
    fn transactions(&self, category: Option<Category>) -> Result<Vec<TransactionRow>> {
        (**self).transactions(category)
    }

    fn business_snapshot(&self) -> Result<BusinessSnapshot> {
        (**self).business_snapshot()
    }
}

impl<T: TransactionSource + ?Sized> TransactionSource for Arc<T> {
    fn transactions(&self, category: Option<Category>) -> Result<Vec<TransactionRow>> {
        (**self).transactions(category)
    }

    fn business_snapshot(&self) -> Result<BusinessSnapshot> {
        (**self).business_snapshot()
    }
}

/// Parse the date part of a stored `data` value (`YYYY-MM-DD`, optionally
/// followed by a time).
pub(crate) fn parse_stored_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| ForecastError::TimestampError(format!("invalid date '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_text() {
        for category in [Category::Receita, Category::Despesa] {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!(" Despesa ".parse::<Category>().unwrap(), Category::Despesa);
        assert!("lucro".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Category::Receita).unwrap(), "\"receita\"");
    }

    #[test]
    fn stored_dates_accept_datetime_suffix() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(parse_stored_date("2024-05-17").unwrap(), expected);
        assert_eq!(parse_stored_date("2024-05-17 13:45:00").unwrap(), expected);
        assert_eq!(parse_stored_date("2024-05-17T08:00:00Z").unwrap(), expected);
    }

    #[test]
    fn malformed_dates_are_timestamp_errors() {
        assert!(matches!(
            parse_stored_date("17/05/2024"),
            Err(ForecastError::TimestampError(_))
        ));
        assert!(parse_stored_date("").is_err());
    }
}
