use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RecoError, RecoResult};
use crate::types::EventType;

/// Application configuration loaded from `RECO_`-prefixed environment
/// variables, with `.env` file support.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub kafka: KafkaConfig,
    pub redis: RedisConfig,
    pub postgres: PostgresConfig,
    pub processing: ProcessingConfig,
    pub recommendation: RecommendationConfig,
    pub event_weights: EventWeightsConfig,
    pub observability: ObservabilityConfig,
}

/// Bind addresses for the two HTTP surfaces
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub ingest: ListenConfig,
    pub api: ListenConfig,
}

#[derive(Debug, Clone)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl ListenConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Event log configuration
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Broker addresses
    pub brokers: Vec<String>,
    /// Topic carrying user interaction events
    pub topic: String,
    /// Consumer group for the stream processor
    pub consumer_group: String,
}

/// Feature store configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL (`redis://` or `rediss://`, may carry auth and DB index)
    pub url: String,
    /// Connection pool size
    pub pool_size: u32,
    /// Reconnect attempts before the connection is considered broken
    pub max_retries: u32,
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// Per-command deadline in seconds
    pub command_timeout_secs: u64,
}

/// System-of-record configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

/// Stream processing knobs
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Producer batch size
    pub batch_size: usize,
    /// Producer flush interval in milliseconds
    pub flush_interval_ms: u64,
    /// Bound on each user's recent-items list
    pub recent_items_limit: usize,
    /// How far back in the recent list co-view pairs are formed
    pub coview_window: usize,
}

/// Request-time recommendation knobs
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    pub default_count: usize,
    pub max_count: usize,
    /// Per-user response cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// Reserved for a future time-decayed popularity sweep
    pub popularity_decay: f64,
    pub weights: BlendWeights,
}

impl RecommendationConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Linear blend weights for the final candidate score
#[derive(Debug, Clone)]
pub struct BlendWeights {
    pub coview: f64,
    pub embedding: f64,
    pub popularity: f64,
    pub recency: f64,
}

/// Popularity increment per event type
#[derive(Debug, Clone)]
pub struct EventWeightsConfig {
    pub view: f64,
    pub click: f64,
    pub cart: f64,
    pub purchase: f64,
}

impl EventWeightsConfig {
    pub fn weight_for(&self, event_type: EventType) -> f64 {
        match event_type {
            EventType::View => self.view,
            EventType::Click => self.click,
            EventType::Cart => self.cart,
            EventType::Purchase => self.purchase,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
    pub tracing_enabled: bool,
    /// Log level filter, e.g. "info" or "reco_engine=debug"
    pub log_level: String,
    /// "json" or "text"
    pub log_format: String,
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> RecoResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| RecoError::Config(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> RecoResult<Self> {
        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        let config = Config {
            server: ServerConfig {
                ingest: ListenConfig {
                    host: env_string("RECO_INGEST_HOST", "0.0.0.0"),
                    port: env_parse("RECO_INGEST_PORT", 8081)?,
                },
                api: ListenConfig {
                    host: env_string("RECO_API_HOST", "0.0.0.0"),
                    port: env_parse("RECO_API_PORT", 8080)?,
                },
            },
            kafka: KafkaConfig {
                brokers: env_string("RECO_KAFKA_BROKERS", "localhost:9092")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                topic: env_string("RECO_KAFKA_TOPIC", "user-events"),
                consumer_group: env_string("RECO_KAFKA_CONSUMER_GROUP", "reco-processor"),
            },
            redis: RedisConfig {
                url: env_string("RECO_REDIS_URL", "redis://localhost:6379"),
                pool_size: env_parse("RECO_REDIS_POOL_SIZE", 10)?,
                max_retries: env_parse("RECO_REDIS_MAX_RETRIES", 3)?,
                connection_timeout_secs: env_parse("RECO_REDIS_CONNECTION_TIMEOUT_SECS", 5)?,
                command_timeout_secs: env_parse("RECO_REDIS_COMMAND_TIMEOUT_SECS", 3)?,
            },
            postgres: PostgresConfig {
                host: env_string("RECO_PG_HOST", "localhost"),
                port: env_parse("RECO_PG_PORT", 5432)?,
                user: env_string("RECO_PG_USER", "reco"),
                password: env_string("RECO_PG_PASSWORD", ""),
                database: env_string("RECO_PG_DATABASE", "reco"),
                max_connections: env_parse("RECO_PG_MAX_CONNS", 10)?,
                connection_timeout_secs: env_parse("RECO_PG_CONNECTION_TIMEOUT_SECS", 10)?,
            },
            processing: ProcessingConfig {
                batch_size: env_parse("RECO_BATCH_SIZE", 100)?,
                flush_interval_ms: env_parse("RECO_FLUSH_INTERVAL_MS", 1000)?,
                recent_items_limit: env_parse("RECO_RECENT_ITEMS_LIMIT", 50)?,
                coview_window: env_parse("RECO_COVIEW_WINDOW", 10)?,
            },
            recommendation: RecommendationConfig {
                default_count: env_parse("RECO_DEFAULT_COUNT", 10)?,
                max_count: env_parse("RECO_MAX_COUNT", 100)?,
                cache_ttl_secs: env_parse("RECO_CACHE_TTL_SECS", 300)?,
                popularity_decay: env_parse("RECO_POPULARITY_DECAY", 0.95)?,
                weights: BlendWeights {
                    coview: env_parse("RECO_WEIGHT_COVIEW", 1.0)?,
                    embedding: env_parse("RECO_WEIGHT_EMBEDDING", 0.8)?,
                    popularity: env_parse("RECO_WEIGHT_POPULARITY", 0.3)?,
                    recency: env_parse("RECO_WEIGHT_RECENCY", 0.5)?,
                },
            },
            event_weights: EventWeightsConfig {
                view: env_parse("RECO_EVENT_WEIGHT_VIEW", 1.0)?,
                click: env_parse("RECO_EVENT_WEIGHT_CLICK", 2.0)?,
                cart: env_parse("RECO_EVENT_WEIGHT_CART", 4.0)?,
                purchase: env_parse("RECO_EVENT_WEIGHT_PURCHASE", 10.0)?,
            },
            observability: ObservabilityConfig {
                metrics_enabled: env_parse("RECO_METRICS_ENABLED", true)?,
                tracing_enabled: env_parse("RECO_TRACING_ENABLED", false)?,
                log_level: env_string("RECO_LOG_LEVEL", "info"),
                log_format: env_string("RECO_LOG_FORMAT", "json"),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> RecoResult<()> {
        if self.server.ingest.port == 0 || self.server.api.port == 0 {
            return Err(RecoError::Config("Server port cannot be 0".to_string()));
        }

        if self.kafka.brokers.is_empty() {
            return Err(RecoError::Config(
                "RECO_KAFKA_BROKERS must list at least one broker".to_string(),
            ));
        }
        if self.kafka.topic.is_empty() {
            return Err(RecoError::Config("Kafka topic cannot be empty".to_string()));
        }
        if self.kafka.consumer_group.is_empty() {
            return Err(RecoError::Config(
                "Kafka consumer group cannot be empty".to_string(),
            ));
        }

        if !self.redis.url.starts_with("redis://") && !self.redis.url.starts_with("rediss://") {
            return Err(RecoError::Config(
                "RECO_REDIS_URL must start with redis:// or rediss://".to_string(),
            ));
        }
        if self.redis.pool_size == 0 {
            return Err(RecoError::Config(
                "Redis pool size must be greater than 0".to_string(),
            ));
        }

        if self.postgres.database.is_empty() || self.postgres.user.is_empty() {
            return Err(RecoError::Config(
                "Postgres user and database are required".to_string(),
            ));
        }

        if self.processing.recent_items_limit == 0 {
            return Err(RecoError::Config(
                "recent_items_limit must be greater than 0".to_string(),
            ));
        }
        if self.processing.coview_window > self.processing.recent_items_limit {
            return Err(RecoError::Config(
                "coview_window cannot exceed recent_items_limit".to_string(),
            ));
        }

        if self.recommendation.default_count == 0
            || self.recommendation.max_count < self.recommendation.default_count
        {
            return Err(RecoError::Config(
                "Recommendation counts must satisfy 0 < default_count <= max_count".to_string(),
            ));
        }

        let w = &self.recommendation.weights;
        if w.coview < 0.0 || w.embedding < 0.0 || w.popularity < 0.0 || w.recency < 0.0 {
            return Err(RecoError::Config(
                "Blend weights must be non-negative".to_string(),
            ));
        }

        let e = &self.event_weights;
        if e.view < 0.0 || e.click < 0.0 || e.cart < 0.0 || e.purchase < 0.0 {
            return Err(RecoError::Config(
                "Event weights must be non-negative".to_string(),
            ));
        }
        if self.recommendation.popularity_decay < 0.0 {
            return Err(RecoError::Config(
                "popularity_decay must be non-negative".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                ingest: ListenConfig {
                    host: "0.0.0.0".to_string(),
                    port: 8081,
                },
                api: ListenConfig {
                    host: "0.0.0.0".to_string(),
                    port: 8080,
                },
            },
            kafka: KafkaConfig {
                brokers: vec!["localhost:9092".to_string()],
                topic: "user-events".to_string(),
                consumer_group: "reco-processor".to_string(),
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                pool_size: 10,
                max_retries: 3,
                connection_timeout_secs: 5,
                command_timeout_secs: 3,
            },
            postgres: PostgresConfig {
                host: "localhost".to_string(),
                port: 5432,
                user: "reco".to_string(),
                password: "".to_string(),
                database: "reco".to_string(),
                max_connections: 10,
                connection_timeout_secs: 10,
            },
            processing: ProcessingConfig {
                batch_size: 100,
                flush_interval_ms: 1000,
                recent_items_limit: 50,
                coview_window: 10,
            },
            recommendation: RecommendationConfig {
                default_count: 10,
                max_count: 100,
                cache_ttl_secs: 300,
                popularity_decay: 0.95,
                weights: BlendWeights {
                    coview: 1.0,
                    embedding: 0.8,
                    popularity: 0.3,
                    recency: 0.5,
                },
            },
            event_weights: EventWeightsConfig {
                view: 1.0,
                click: 2.0,
                cart: 4.0,
                purchase: 10.0,
            },
            observability: ObservabilityConfig {
                metrics_enabled: true,
                tracing_enabled: false,
                log_level: "info".to_string(),
                log_format: "json".to_string(),
            },
        }
    }
}
