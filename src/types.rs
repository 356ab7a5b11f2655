use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{RecoError, RecoResult};

/// Type of a user interaction event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    View,
    Click,
    Cart,
    Purchase,
}

impl EventType {
    /// Wire/metric-label form of the event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::View => "VIEW",
            EventType::Click => "CLICK",
            EventType::Cart => "CART",
            EventType::Purchase => "PURCHASE",
        }
    }
}

/// A user's interaction with an item at an instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Database-assigned id, absent until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// User identifier (positive)
    pub user_id: i64,
    /// Item identifier (positive)
    pub item_id: i64,
    /// Interaction type
    pub event_type: EventType,
    /// Client session identifier
    #[serde(default)]
    pub session_id: String,
    /// Open string->value mapping carried through to the system of record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    /// Assigned at ingest when the producer omits it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Event {
    /// Validate identifier constraints. The event type is already constrained
    /// by deserialization.
    pub fn validate(&self) -> RecoResult<()> {
        if self.user_id <= 0 {
            return Err(RecoError::InvalidEvent(
                "user_id must be a positive integer".to_string(),
            ));
        }
        if self.item_id <= 0 {
            return Err(RecoError::InvalidEvent(
                "item_id must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Catalog item in the system of record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub sku: String,
    pub title: String,
    pub category: String,
    pub price: i64,
    pub stock: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata describing one offline-trained model version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub model_name: String,
    pub version: String,
    pub model_type: String,
    pub metrics: serde_json::Value,
    pub config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Why an item was recommended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoReason {
    CoView,
    Embedding,
    Popular,
}

/// A single ranked recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: i64,
    pub score: f64,
    pub reason: RecoReason,
}

/// Response body for personalized recommendations; also the exact payload
/// written to the per-user recommendation cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: i64,
    pub recommendations: Vec<Recommendation>,
}

/// Response body for the popular-items query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularResponse {
    pub category: String,
    pub recommendations: Vec<Recommendation>,
}

/// Error response body shared by both HTTP surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Partial scores accumulated per candidate item during generation.
/// `recency` has no producer yet; it participates in the blend so the
/// configured weight applies as soon as one exists.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CandidateScores {
    pub coview: f64,
    pub embedding: f64,
    pub popularity: f64,
    pub recency: f64,
}
