/// Ingest module
///
/// Front-door for user interaction events: validate, stamp, publish to the
/// event log keyed by user, and keep a best-effort audit copy in the system
/// of record.
#[cfg(test)]
mod tests;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::config::Config;
use crate::database::ItemStore;
use crate::error::RecoResult;
use crate::observability::metrics;
use crate::stream::EventProducer;
use crate::types::{ErrorResponse, Event};

/// Deadline for the fire-and-forget audit insert
const PERSIST_BUDGET: Duration = Duration::from_secs(5);

/// Event ingestion service
pub struct IngestService {
    producer: EventProducer,
    items: Arc<ItemStore>,
}

impl IngestService {
    /// Create an ingest service with its own event-log producer
    pub fn new(config: &Config, items: Arc<ItemStore>) -> RecoResult<Self> {
        let producer = EventProducer::new(&config.kafka, &config.processing)?;
        Ok(IngestService { producer, items })
    }

    /// Validate and publish one event.
    ///
    /// A validation failure never reaches the log. The audit copy in the
    /// system of record is written from a detached task with its own
    /// deadline; its failure does not affect the response.
    pub async fn ingest(&self, mut event: Event) -> RecoResult<()> {
        event.validate()?;

        if event.timestamp.is_none() {
            event.timestamp = Some(Utc::now());
        }

        let m = metrics::global();
        if let Err(e) = self.producer.publish(&event).await {
            m.kafka_publish_errors
                .with_label_values(&[self.producer.topic()])
                .inc();
            return Err(e);
        }

        m.events_ingested
            .with_label_values(&[event.event_type.as_str()])
            .inc();
        m.kafka_messages_published
            .with_label_values(&[self.producer.topic()])
            .inc();

        debug!(
            "Event ingested (user_id: {}, item_id: {}, type: {}, session: {})",
            event.user_id,
            event.item_id,
            event.event_type.as_str(),
            event.session_id
        );

        let items = self.items.clone();
        tokio::spawn(async move {
            match timeout(PERSIST_BUDGET, items.insert_event(&event)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!("Failed to store event in Postgres: {}", e),
                Err(_) => error!("Event persistence timed out"),
            }
        });

        Ok(())
    }
}

/// Build the ingest HTTP router
pub fn router(service: Arc<IngestService>, metrics_enabled: bool) -> Router {
    let mut router = Router::new()
        .route("/events", post(ingest_event_handler))
        .route("/health", get(health_handler));

    if metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router.with_state(service)
}

/// Handler for POST /events
async fn ingest_event_handler(
    State(service): State<Arc<IngestService>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    let event: Event = match serde_json::from_value(body) {
        Ok(event) => event,
        Err(e) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("invalid event: {}", e),
                }),
            ));
        }
    };

    match service.ingest(event).await {
        Ok(()) => Ok(Json(json!({"status": "ok"}))),
        Err(e) if e.is_validation_error() => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e) => {
            error!("Failed to ingest event: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to ingest event".to_string(),
                }),
            ))
        }
    }
}

/// Handler for GET /health
async fn health_handler() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

/// Handler for GET /metrics
async fn metrics_handler() -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    metrics::global().gather().map_err(|e| {
        error!("Failed to gather metrics: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "failed to gather metrics".to_string(),
            }),
        )
    })
}
