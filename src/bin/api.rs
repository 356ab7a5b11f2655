use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use reco_engine::error::{RecoError, RecoResult};
use reco_engine::observability::init_logging;
use reco_engine::server::{self, AppState};
use reco_engine::{Config, FeatureStore, ItemStore, RecommendService};

#[tokio::main]
async fn main() -> RecoResult<()> {
    let config = Arc::new(Config::from_env()?);
    init_logging(&config.observability)?;

    info!("Starting recommendation API service");

    let features = Arc::new(FeatureStore::new(config.redis.clone()).await?);
    let items = Arc::new(ItemStore::new(config.postgres.clone()).await?);
    let recommend = Arc::new(RecommendService::new(
        config.clone(),
        features,
        items,
    ));

    let state = Arc::new(AppState {
        recommend,
        config: config.clone(),
    });
    let app = server::router(state);

    let addr = config.server.api.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| RecoError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("HTTP server listening on {}", addr);

    server::serve_with_shutdown(listener, app).await
}
