use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracing::info;

use crate::config::{KafkaConfig, ProcessingConfig};
use crate::error::{RecoError, RecoResult};
use crate::types::Event;

/// How long a publish may sit in the local queue before it fails
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Producer for the user-event topic.
///
/// Messages are keyed by the decimal user id so a user's events land on one
/// partition and are consumed in order. Writes are batched asynchronously
/// with a 10ms linger and require one broker acknowledgement.
pub struct EventProducer {
    producer: FutureProducer,
    topic: String,
}

impl EventProducer {
    /// Create a new producer for the configured topic
    pub fn new(kafka: &KafkaConfig, processing: &ProcessingConfig) -> RecoResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", kafka.brokers.join(","))
            .set("queue.buffering.max.ms", "10")
            .set("batch.num.messages", processing.batch_size.to_string())
            .set("acks", "1")
            .set(
                "message.timeout.ms",
                PUBLISH_TIMEOUT.as_millis().to_string(),
            )
            .create()
            .map_err(|e| RecoError::Kafka(format!("Failed to create producer: {}", e)))?;

        info!(
            "Kafka producer created for topic '{}' on {}",
            kafka.topic,
            kafka.brokers.join(",")
        );

        Ok(EventProducer {
            producer,
            topic: kafka.topic.clone(),
        })
    }

    /// Serialize and publish an event, keyed by its user id
    pub async fn publish(&self, event: &Event) -> RecoResult<()> {
        let payload = serde_json::to_string(event)?;
        let key = event.user_id.to_string();

        let mut record = FutureRecord::to(&self.topic).key(&key).payload(&payload);
        if let Some(ts) = event.timestamp {
            record = record.timestamp(ts.timestamp_millis());
        }

        self.producer
            .send(record, PUBLISH_TIMEOUT)
            .await
            .map_err(|(e, _)| RecoError::Kafka(format!("Failed to publish event: {}", e)))?;

        Ok(())
    }

    /// Topic this producer writes to
    pub fn topic(&self) -> &str {
        &self.topic
    }
}
