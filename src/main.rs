use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use sentimeter::config::Config;
use sentimeter::deberta_engine::{DebertaConfig, DebertaSentimentEngine};
use sentimeter::server::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sentimeter=debug".into()),
        )
        .init();

    let config = Config::parse();
    tracing::info!("Starting sentiment server with config: {:?}", config);

    // Validate that either model_id or model_path is provided
    if config.model_id.is_none() && config.model_path.is_none() {
        anyhow::bail!("Either --model-id or --model-path must be provided");
    }

    let engine_config = DebertaConfig {
        model_id: config.model_id.clone(),
        model_path: config.model_path.clone(),
        revision: config.model_revision.clone(),
        use_pth: config.use_pth,
        cpu: config.cpu_only,
        max_sequence_length: config.max_sequence_length,
        id2label: config.parse_id2label(),
    };

    tracing::info!("Loading sentiment model...");
    let engine = DebertaSentimentEngine::new(engine_config).await?;
    tracing::info!("Model loaded successfully");

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = router(AppState::new(Arc::new(engine)))
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.server_address()).await?;
    tracing::info!("Server running on http://{}", config.server_address());

    axum::serve(listener, app).await?;
    Ok(())
}
