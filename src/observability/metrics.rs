use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::{RecoError, RecoResult};

/// Process-wide metrics registry. Initialised on first access; servers and
/// the stream processor all share this instance, so collectors are
/// registered exactly once no matter how many components are linked in.
static METRICS: Lazy<Metrics> =
    Lazy::new(|| Metrics::new().expect("metrics registration failed"));

/// Get the process-global metrics
pub fn global() -> &'static Metrics {
    &METRICS
}

/// All application metrics
pub struct Metrics {
    registry: Registry,

    // Event metrics
    pub events_ingested: IntCounterVec,
    pub events_processed: IntCounterVec,
    pub event_processing_errors: IntCounter,

    // Recommendation metrics
    pub recommendation_requests: IntCounter,
    pub recommendation_latency: HistogramVec,
    pub recommendation_cache_hits: IntCounter,
    pub recommendation_cache_misses: IntCounter,

    // Kafka metrics
    pub kafka_messages_published: IntCounterVec,
    pub kafka_messages_consumed: IntCounterVec,
    pub kafka_publish_errors: IntCounterVec,
}

impl Metrics {
    fn new() -> RecoResult<Self> {
        let registry = Registry::new();

        let events_ingested = IntCounterVec::new(
            Opts::new("events_ingested_total", "Total number of events ingested"),
            &["event_type"],
        )
        .map_err(|e| RecoError::Internal(format!("Failed to create events_ingested_total: {}", e)))?;

        let events_processed = IntCounterVec::new(
            Opts::new(
                "events_processed_total",
                "Total number of events processed",
            ),
            &["event_type"],
        )
        .map_err(|e| {
            RecoError::Internal(format!("Failed to create events_processed_total: {}", e))
        })?;

        let event_processing_errors = IntCounter::new(
            "event_processing_errors_total",
            "Total number of event processing errors",
        )
        .map_err(|e| {
            RecoError::Internal(format!(
                "Failed to create event_processing_errors_total: {}",
                e
            ))
        })?;

        let recommendation_requests = IntCounter::new(
            "recommendation_requests_total",
            "Total number of recommendation requests",
        )
        .map_err(|e| {
            RecoError::Internal(format!(
                "Failed to create recommendation_requests_total: {}",
                e
            ))
        })?;

        let recommendation_latency = HistogramVec::new(
            HistogramOpts::new(
                "recommendation_latency_seconds",
                "Latency of recommendation requests",
            ),
            &["endpoint"],
        )
        .map_err(|e| {
            RecoError::Internal(format!(
                "Failed to create recommendation_latency_seconds: {}",
                e
            ))
        })?;

        let recommendation_cache_hits = IntCounter::new(
            "recommendation_cache_hits_total",
            "Total number of cache hits for recommendations",
        )
        .map_err(|e| {
            RecoError::Internal(format!(
                "Failed to create recommendation_cache_hits_total: {}",
                e
            ))
        })?;

        let recommendation_cache_misses = IntCounter::new(
            "recommendation_cache_misses_total",
            "Total number of cache misses for recommendations",
        )
        .map_err(|e| {
            RecoError::Internal(format!(
                "Failed to create recommendation_cache_misses_total: {}",
                e
            ))
        })?;

        let kafka_messages_published = IntCounterVec::new(
            Opts::new(
                "kafka_messages_published_total",
                "Total number of messages published to Kafka",
            ),
            &["topic"],
        )
        .map_err(|e| {
            RecoError::Internal(format!(
                "Failed to create kafka_messages_published_total: {}",
                e
            ))
        })?;

        let kafka_messages_consumed = IntCounterVec::new(
            Opts::new(
                "kafka_messages_consumed_total",
                "Total number of messages consumed from Kafka",
            ),
            &["topic"],
        )
        .map_err(|e| {
            RecoError::Internal(format!(
                "Failed to create kafka_messages_consumed_total: {}",
                e
            ))
        })?;

        let kafka_publish_errors = IntCounterVec::new(
            Opts::new(
                "kafka_publish_errors_total",
                "Total number of Kafka publish errors",
            ),
            &["topic"],
        )
        .map_err(|e| {
            RecoError::Internal(format!("Failed to create kafka_publish_errors_total: {}", e))
        })?;

        for collector in [
            Box::new(events_ingested.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(events_processed.clone()),
            Box::new(event_processing_errors.clone()),
            Box::new(recommendation_requests.clone()),
            Box::new(recommendation_latency.clone()),
            Box::new(recommendation_cache_hits.clone()),
            Box::new(recommendation_cache_misses.clone()),
            Box::new(kafka_messages_published.clone()),
            Box::new(kafka_messages_consumed.clone()),
            Box::new(kafka_publish_errors.clone()),
        ] {
            registry
                .register(collector)
                .map_err(|e| RecoError::Internal(format!("Failed to register metric: {}", e)))?;
        }

        Ok(Self {
            registry,
            events_ingested,
            events_processed,
            event_processing_errors,
            recommendation_requests,
            recommendation_latency,
            recommendation_cache_hits,
            recommendation_cache_misses,
            kafka_messages_published,
            kafka_messages_consumed,
            kafka_publish_errors,
        })
    }

    /// Render the registry in Prometheus text exposition format
    pub fn gather(&self) -> RecoResult<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| RecoError::Internal(format!("Failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer)
            .map_err(|e| RecoError::Internal(format!("Failed to convert metrics to string: {}", e)))
    }
}
