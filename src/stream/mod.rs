/// Event log module
///
/// Kafka producer for the ingest front-door and the stream-processing
/// consumer loop that keeps the feature store current.
mod processor;
mod producer;

#[cfg(test)]
mod tests;

pub use processor::{ProcessorState, StreamProcessor};
pub use producer::EventProducer;
