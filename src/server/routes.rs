//! Analytics route handlers.
//!
//! Every handler answers 200; failures are reported as `{"erro": message}`.

use super::AppState;
use crate::error::{ForecastError, Result};
use crate::report::{forecast_chart_json, prompt_from_source};
use crate::storage::Category;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub tipo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub id_usuario: i64,
}

fn error_body(err: &ForecastError) -> Json<Value> {
    Json(json!({ "erro": err.to_string() }))
}

/// Run blocking pipeline work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ForecastError::Internal(format!("forecast task failed: {}", e)))?
}

/// `GET /analytics/grafico-json?tipo=receita|despesa`
pub async fn grafico_json(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Json<Value> {
    let category = match query.tipo.as_deref().map(str::parse::<Category>) {
        None => Category::Receita,
        Some(Ok(category)) => category,
        Some(Err(err)) => return error_body(&err),
    };

    let service = state.service.clone();
    let horizon = state.settings.chart_horizon;
    let result = blocking(move || {
        let outcome = service.run(category, horizon)?;
        Ok(forecast_chart_json(&outcome.history, &outcome.forecast))
    })
    .await;

    match result {
        Ok(chart) => Json(chart),
        Err(err) => {
            tracing::error!(%category, %err, "chart request failed");
            error_body(&err)
        }
    }
}

/// `GET /analytics/recomendacoes?id_usuario=<id>`
pub async fn recomendacoes(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> Json<Value> {
    tracing::info!(id_usuario = query.id_usuario, "recommendations requested");

    let service = state.service.clone();
    let horizon = state.settings.recommendation_horizon;
    let prompt = blocking(move || {
        let summary = service.summary(Category::Receita, horizon)?;
        Ok(prompt_from_source(service.source(), &summary))
    })
    .await;

    let prompt = match prompt {
        Ok(prompt) => prompt,
        Err(err) => {
            tracing::error!(%err, "could not summarize the forecast");
            return error_body(&err);
        }
    };

    match state.gemini.generate(&prompt).await {
        Ok(text) => Json(json!({ "recomendacoes": text })),
        Err(err) => {
            tracing::error!(%err, "recommendation generation failed");
            error_body(&err)
        }
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
