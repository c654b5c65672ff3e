//! Load, select and project in one call.

use crate::core::{ForecastSeries, TimeSeries};
use crate::error::Result;
use crate::models::{ModelVariant, OrderSelection};
use crate::pipeline::loader::SeriesLoader;
use crate::pipeline::projector::project_or_empty;
use crate::pipeline::selector::ModelSelector;
use crate::storage::{Category, TransactionSource};
use serde::Serialize;

/// Result of a full forecasting run.
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub variant: ModelVariant,
    /// Series the winner was fitted on.
    pub history: TimeSeries,
    /// Empty when projection failed.
    pub forecast: ForecastSeries,
}

impl ForecastOutcome {
    pub fn variant_name(&self) -> &'static str {
        self.variant.as_str()
    }
}

/// Projected total for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub category: Category,
    pub horizon: usize,
    pub total: f64,
}

impl ForecastSummary {
    pub fn label(&self) -> &'static str {
        self.category.as_str()
    }
}

/// Forecasting pipeline over a transaction source.
#[derive(Debug, Clone)]
pub struct ForecastService<S> {
    loader: SeriesLoader<S>,
    selector: ModelSelector,
}

impl<S: TransactionSource> ForecastService<S> {
    pub fn new(source: S) -> Self {
        Self {
            loader: SeriesLoader::new(source),
            selector: ModelSelector::default(),
        }
    }

    /// Service with a custom holdout length and order policy.
    pub fn with_selection(source: S, holdout: usize, orders: OrderSelection) -> Self {
        Self {
            loader: SeriesLoader::new(source),
            selector: ModelSelector::holdout(holdout, orders),
        }
    }

    pub fn source(&self) -> &S {
        self.loader.source()
    }

    /// Forecast `horizon` days of `category`.
    ///
    /// A category without transactions runs on the empty series and yields
    /// an empty forecast. Storage failures and malformed rows propagate.
    pub fn run(&self, category: Category, horizon: usize) -> Result<ForecastOutcome> {
        let history = self.loader.load_or_empty(Some(category))?;
        let selection = self.selector.select(&history);
        let forecast = project_or_empty(&selection.model, horizon);

        tracing::info!(
            %category,
            variant = selection.variant_name(),
            history = history.len(),
            horizon = forecast.horizon(),
            "forecast complete"
        );

        Ok(ForecastOutcome {
            variant: selection.variant,
            history,
            forecast,
        })
    }

    /// Projected total of `category` over the next `horizon` days.
    pub fn summary(&self, category: Category, horizon: usize) -> Result<ForecastSummary> {
        let outcome = self.run(category, horizon)?;
        Ok(ForecastSummary {
            category,
            horizon,
            total: outcome.forecast.total(),
        })
    }
}
