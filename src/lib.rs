pub mod config;
pub mod database;
pub mod error;
pub mod features;
pub mod ingest;
pub mod observability;
pub mod recommend;
pub mod server;
pub mod stream;
pub mod types;

pub use config::Config;
pub use database::ItemStore;
pub use error::{RecoError, RecoResult};
pub use features::FeatureStore;
pub use ingest::IngestService;
pub use recommend::RecommendService;
pub use stream::{EventProducer, StreamProcessor};
pub use types::*;
