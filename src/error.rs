use thiserror::Error;

/// Main error type for the recommendation engine
#[derive(Debug, Error)]
pub enum RecoError {
    /// Invalid request parameters (query string, counts)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Event failed ingest validation
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Feature store (Redis) connection or operation error
    #[error("Redis error: {0}")]
    Redis(String),

    /// System-of-record (Postgres) connection or query error
    #[error("Database error: {0}")]
    Database(String),

    /// Event log (Kafka) producer or consumer error
    #[error("Kafka error: {0}")]
    Kafka(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecoError {
    /// Check if error is a client-side validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            RecoError::InvalidRequest(_) | RecoError::InvalidEvent(_)
        )
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            RecoError::InvalidRequest(_) => 400,
            RecoError::InvalidEvent(_) => 400,
            RecoError::Redis(_) => 500,
            RecoError::Database(_) => 500,
            RecoError::Kafka(_) => 500,
            RecoError::Config(_) => 500,
            RecoError::Serialization(_) => 500,
            RecoError::Io(_) => 500,
            RecoError::Internal(_) => 500,
        }
    }
}

/// Result type alias for recommendation engine operations
pub type RecoResult<T> = Result<T, RecoError>;
