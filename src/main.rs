use anyhow::Context;
use std::sync::Arc;

use fare_predictor::config::ServiceConfig;
use fare_predictor::model::PredictionService;
use fare_predictor::server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = ServiceConfig::from_env()?;

    // No model, no service.
    let svc = PredictionService::load(&cfg.model_path)
        .with_context(|| format!("cannot start without model {}", cfg.model_path.display()))?;

    let state = AppState {
        svc: Arc::new(svc),
        log_pred: cfg.log_pred,
    };

    let app = router(state);

    let addr = cfg.socket_addr();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
