//! # cashflow-server
//!
//! HTTP server for revenue/expense forecasts and recommendations.

use cashflow_forecast::config::Settings;
use cashflow_forecast::server::{self, AppState};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn run() -> cashflow_forecast::Result<()> {
    let settings = Settings::from_env()?;
    tracing::info!(
        database = %settings.database_path.display(),
        holdout = settings.holdout,
        recommendations = settings.gemini_api_key.is_some(),
        "configuration loaded"
    );
    let state = AppState::from_settings(settings)?;
    server::serve(state).await
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cashflow_forecast=info,tower_http=info".into()),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "server stopped");
            ExitCode::FAILURE
        }
    }
}
