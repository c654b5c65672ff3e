//! Forecasting pipeline: load a daily series, score both model variants on
//! a holdout window, re-fit the winner and project it forward.

pub mod evaluator;
pub mod loader;
pub mod projector;
pub mod selector;
pub mod service;

pub use evaluator::{Evaluate, EvaluationResult, HoldoutEvaluator, DEFAULT_HOLDOUT, MIN_HOLDOUT};
pub use loader::{daily_totals, SeriesLoader};
pub use projector::{project, project_or_empty, project_with_fallback};
pub use selector::{pick_winner, ModelSelector, Selection};
pub use service::{ForecastOutcome, ForecastService, ForecastSummary};
