use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use reco_engine::error::{RecoError, RecoResult};
use reco_engine::observability::init_logging;
use reco_engine::server::shutdown_signal;
use reco_engine::{Config, FeatureStore, StreamProcessor};

#[tokio::main]
async fn main() -> RecoResult<()> {
    let config = Arc::new(Config::from_env()?);
    init_logging(&config.observability)?;

    info!("Starting stream processor service");

    let features = Arc::new(FeatureStore::new(config.redis.clone()).await?);
    let mut processor = StreamProcessor::new(config, features)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handle = tokio::spawn(async move { processor.run(shutdown_rx).await });

    let result = tokio::select! {
        _ = shutdown_signal() => {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
            handle.await
        }
        result = &mut handle => result,
    };

    match result {
        Ok(Ok(())) => {
            info!("Processor exited");
            Ok(())
        }
        Ok(Err(e)) => {
            error!("Processor error: {}", e);
            Err(e)
        }
        Err(e) => Err(RecoError::Internal(format!("Processor task failed: {}", e))),
    }
}
