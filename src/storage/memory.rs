//! In-memory transaction source for tests and demos.

use super::{BusinessSnapshot, Category, TransactionRow, TransactionSource};
use crate::error::Result;
use chrono::NaiveDate;

/// A fixed set of categorized transactions.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    rows: Vec<(TransactionRow, Category)>,
    snapshot: BusinessSnapshot,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one transaction.
    pub fn with(mut self, date: NaiveDate, amount: f64, category: Category) -> Self {
        self.rows.push((TransactionRow::new(date, amount), category));
        self
    }

    /// Add one transaction per value on consecutive days from `start`.
    pub fn with_daily(mut self, start: NaiveDate, values: &[f64], category: Category) -> Self {
        for (day, value) in start.iter_days().zip(values) {
            self.rows.push((TransactionRow::new(day, *value), category));
        }
        self
    }

    pub fn with_snapshot(mut self, snapshot: BusinessSnapshot) -> Self {
        self.snapshot = snapshot;
        self
    }
}

impl TransactionSource for InMemorySource {
    fn transactions(&self, category: Option<Category>) -> Result<Vec<TransactionRow>> {
        Ok(self
            .rows
            .iter()
            .filter(|(_, c)| category.map_or(true, |wanted| *c == wanted))
            .map(|(row, _)| *row)
            .collect())
    }

    fn business_snapshot(&self) -> Result<BusinessSnapshot> {
        Ok(self.snapshot.clone())
    }
}
