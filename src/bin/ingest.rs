use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use reco_engine::error::{RecoError, RecoResult};
use reco_engine::observability::init_logging;
use reco_engine::{ingest, server, Config, IngestService, ItemStore};

#[tokio::main]
async fn main() -> RecoResult<()> {
    let config = Arc::new(Config::from_env()?);
    init_logging(&config.observability)?;

    info!("Starting event ingest service");

    let items = Arc::new(ItemStore::new(config.postgres.clone()).await?);
    let service = Arc::new(IngestService::new(&config, items)?);

    let app = ingest::router(service, config.observability.metrics_enabled);

    let addr = config.server.ingest.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| RecoError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("HTTP server listening on {}", addr);

    server::serve_with_shutdown(listener, app).await
}
