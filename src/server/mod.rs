//! HTTP interface.

pub mod routes;

use crate::config::Settings;
use crate::error::{ForecastError, Result};
use crate::pipeline::ForecastService;
use crate::report::GeminiClient;
use crate::storage::SqliteStore;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ForecastService<Arc<SqliteStore>>>,
    pub settings: Arc<Settings>,
    pub gemini: GeminiClient,
}

impl AppState {
    pub fn new(store: Arc<SqliteStore>, settings: Settings, gemini: GeminiClient) -> Self {
        let service = ForecastService::with_selection(store, settings.holdout, settings.orders.clone());
        Self {
            service: Arc::new(service),
            settings: Arc::new(settings),
            gemini,
        }
    }

    /// Open the configured database and build the recommendation client.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let store = SqliteStore::open(&settings.database_path)?;
        let gemini = GeminiClient::new(settings.gemini_api_key.clone(), settings.gemini_model.clone())?;
        Ok(Self::new(Arc::new(store), settings, gemini))
    }
}

/// Router with the analytics routes, health check, CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let analytics = Router::new()
        .route("/grafico-json", get(routes::grafico_json))
        .route("/recomendacoes", get(routes::recomendacoes));

    Router::new()
        .route("/health", get(routes::health))
        .nest("/analytics", analytics)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind to the configured address and serve until the process stops.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.settings.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ForecastError::Server(format!("cannot bind {}: {}", addr, e)))?;

    tracing::info!("cashflow-server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    axum::serve(listener, router(state))
        .await
        .map_err(|e| ForecastError::Server(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn occupied_port_is_a_server_error() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let settings = Settings {
            host: "127.0.0.1".to_string(),
            port: taken.local_addr().unwrap().port(),
            ..Settings::default()
        };
        let store = SqliteStore::open_in_memory().unwrap();
        let gemini = GeminiClient::new(None, "gemini-pro").unwrap();
        let state = AppState::new(Arc::new(store), settings, gemini);

        assert!(matches!(serve(state).await, Err(ForecastError::Server(_))));
    }

    #[tokio::test]
    async fn invalid_host_is_a_configuration_error() {
        let settings = Settings {
            host: "not a host".to_string(),
            ..Settings::default()
        };
        let store = SqliteStore::open_in_memory().unwrap();
        let gemini = GeminiClient::new(None, "gemini-pro").unwrap();
        let state = AppState::new(Arc::new(store), settings, gemini);

        assert!(matches!(serve(state).await, Err(ForecastError::Configuration(_))));
    }
}
