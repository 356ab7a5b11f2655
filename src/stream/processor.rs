use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{RecoError, RecoResult};
use crate::features::FeatureStore;
use crate::observability::metrics;
use crate::types::Event;

/// Consecutive fetch failures tolerated before the consumer is declared broken
const MAX_CONSECUTIVE_FETCH_ERRORS: u32 = 10;
/// Pause between failed fetch attempts
const FETCH_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Lifecycle state of one consumer loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Init,
    Running,
    Draining,
    Stopped,
    Failed,
}

/// Stream processor: consumes the event log and projects each event onto the
/// feature store.
///
/// Offsets are stored only after a message is handled, and the consumer
/// flushes stored offsets once per second, so at most one second of handled
/// messages is replayed after a crash. Updates are additive counters and a
/// bounded prepend, so replay inflates counts without violating invariants.
pub struct StreamProcessor {
    consumer: StreamConsumer,
    features: Arc<FeatureStore>,
    config: Arc<Config>,
    state: ProcessorState,
}

impl StreamProcessor {
    /// Create a consumer in the configured group, subscribed to nothing yet
    pub fn new(config: Arc<Config>, features: Arc<FeatureStore>) -> RecoResult<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.kafka.brokers.join(","))
            .set("group.id", &config.kafka.consumer_group)
            .set("enable.auto.commit", "true")
            .set("auto.commit.interval.ms", "1000")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "latest")
            .create()
            .map_err(|e| RecoError::Kafka(format!("Failed to create consumer: {}", e)))?;

        Ok(StreamProcessor {
            consumer,
            features,
            config,
            state: ProcessorState::Init,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// Consume until the shutdown signal fires, then stop after the in-flight
    /// message.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> RecoResult<()> {
        let topic = self.config.kafka.topic.clone();
        if let Err(e) = self.consumer.subscribe(&[topic.as_str()]) {
            self.state = ProcessorState::Failed;
            return Err(RecoError::Kafka(format!(
                "Failed to subscribe to '{}': {}",
                topic, e
            )));
        }

        self.state = ProcessorState::Running;
        info!(
            "Event processor started (topic: '{}', group: '{}')",
            topic, self.config.kafka.consumer_group
        );

        let mut consecutive_errors: u32 = 0;
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    self.state = ProcessorState::Draining;
                    info!("Stopping event processor");
                    break;
                }
                result = self.consumer.recv() => {
                    match result {
                        Ok(message) => {
                            consecutive_errors = 0;
                            self.handle_message(&message).await;
                        }
                        Err(e) => {
                            consecutive_errors += 1;
                            error!("Failed to fetch message: {}", e);
                            if consecutive_errors >= MAX_CONSECUTIVE_FETCH_ERRORS {
                                self.state = ProcessorState::Failed;
                                return Err(RecoError::Kafka(format!(
                                    "Consumer broken after {} consecutive fetch errors: {}",
                                    consecutive_errors, e
                                )));
                            }
                            tokio::time::sleep(FETCH_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }

        self.state = ProcessorState::Stopped;
        info!("Event processor stopped");
        Ok(())
    }

    /// Decode and apply one message. The offset is stored on success and on
    /// undecodable (poison) messages; an apply failure leaves it unstored so
    /// the message is redelivered.
    async fn handle_message(&self, message: &BorrowedMessage<'_>) {
        let m = metrics::global();
        m.kafka_messages_consumed
            .with_label_values(&[&self.config.kafka.topic])
            .inc();

        let payload = message.payload().unwrap_or_default();
        let event: Event = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    "Discarding undecodable message at offset {}: {}",
                    message.offset(),
                    e
                );
                m.event_processing_errors.inc();
                self.store_offset(message);
                return;
            }
        };

        match self.apply_event(&event).await {
            Ok(()) => {
                m.events_processed
                    .with_label_values(&[event.event_type.as_str()])
                    .inc();
                debug!(
                    "Event processed (user_id: {}, item_id: {}, type: {})",
                    event.user_id,
                    event.item_id,
                    event.event_type.as_str()
                );
                self.store_offset(message);
            }
            Err(e) => {
                error!(
                    "Failed to process event for user {}: {}",
                    event.user_id, e
                );
                m.event_processing_errors.inc();
            }
        }
    }

    /// Apply one event to the feature store. Sub-steps do not abort each
    /// other; the first failure is reported after all have run so the message
    /// is retried while the surviving updates already made progress.
    async fn apply_event(&self, event: &Event) -> RecoResult<()> {
        let mut first_failure: Option<RecoError> = None;

        if let Err(e) = self
            .features
            .add_recent(
                event.user_id,
                event.item_id,
                self.config.processing.recent_items_limit,
            )
            .await
        {
            error!("Failed to add recent item: {}", e);
            first_failure.get_or_insert(e);
        }

        let weight = self.config.event_weights.weight_for(event.event_type);
        if let Err(e) = self.features.incr_popularity(event.item_id, weight).await {
            error!("Failed to increment popularity: {}", e);
            first_failure.get_or_insert(e);
        }

        if let Err(e) = self.update_coview(event).await {
            error!("Failed to update co-view: {}", e);
            first_failure.get_or_insert(e);
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Pair the event's item with everything in the user's co-view window.
    /// Each pair is two independent increments; a crash between them leaves
    /// the counts skewed by at most one.
    async fn update_coview(&self, event: &Event) -> RecoResult<()> {
        let recents = self
            .features
            .get_recent(event.user_id, self.config.processing.coview_window)
            .await?;

        for prev in recents {
            if prev == event.item_id {
                continue;
            }

            if let Err(e) = self.features.incr_coview(event.item_id, prev).await {
                error!("Failed to increment co-view: {}", e);
            }
            if let Err(e) = self.features.incr_coview(prev, event.item_id).await {
                error!("Failed to increment co-view: {}", e);
            }
        }

        Ok(())
    }

    fn store_offset(&self, message: &BorrowedMessage<'_>) {
        if let Err(e) = self.consumer.store_offset_from_message(message) {
            error!(
                "Failed to store offset {} on partition {}: {}",
                message.offset(),
                message.partition(),
                e
            );
        }
    }
}
