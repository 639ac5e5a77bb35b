use erp_incident_triage::{
    api::{build_router, AppState},
    config::Config,
    enrichment::EnrichmentService,
    state::create_store,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "erp_incident_triage={},tower_http=info",
            config.observability.log_level
        )
        .into()
    });

    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        service = %config.observability.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting ERP incident triage service"
    );

    // Initialize storage backend
    tracing::info!(backend = ?config.state.backend, "Storage backend");
    let store = create_store(&config.state)?;

    // Initialize enrichment (falls back to keyword rules when no API
    // key is configured)
    let enrichment = Arc::new(EnrichmentService::from_config(&config.enrichment));

    let app_state = AppState::new(store, enrichment);
    let app = build_router(
        app_state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("HTTP API server listening on http://{}", addr);
    tracing::info!("   Health check: http://{}/", addr);
    tracing::info!("   REST API: http://{}/incidents", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    } else {
        tracing::info!("Shutdown signal received");
    }
}
