/// API server module
///
/// HTTP surface for the recommender: personalized recommendations, popular
/// items, health, and metrics. Query parameters are parsed by hand so
/// validation failures answer with the documented `{"error": ...}` shape.
use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::{RecoError, RecoResult};
use crate::observability::metrics;
use crate::recommend::RecommendService;
use crate::types::{ErrorResponse, PopularResponse, RecommendationResponse};

/// How long in-flight requests may drain after the shutdown signal
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(10);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommend: Arc<RecommendService>,
    pub config: Arc<Config>,
}

/// Build the API HTTP router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    let mut router = Router::new()
        .route("/recommendations", get(recommendations_handler))
        .route("/popular", get(popular_handler))
        .route("/health", get(health_handler));

    if state.config.observability.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router.layer(cors).with_state(state)
}

#[derive(Debug, Deserialize)]
struct RecommendationsParams {
    user_id: Option<String>,
    count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PopularParams {
    category: Option<String>,
    count: Option<String>,
}

/// Parse and bound-check the `user_id` query parameter
fn parse_user_id(raw: Option<&str>) -> Result<i64, String> {
    let raw = raw.ok_or_else(|| "user_id is required".to_string())?;
    let user_id: i64 = raw.parse().map_err(|_| "invalid user_id".to_string())?;
    if user_id <= 0 {
        return Err("invalid user_id".to_string());
    }
    Ok(user_id)
}

/// Parse the `count` query parameter, defaulting and clamping to the
/// configured bounds
fn parse_count(raw: Option<&str>, default: usize, max: usize) -> Result<usize, String> {
    let count = match raw {
        Some(raw) => match raw.parse::<i64>() {
            Ok(count) if count > 0 => count as usize,
            _ => return Err("invalid count".to_string()),
        },
        None => default,
    };
    Ok(count.min(max))
}

fn bad_request(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

/// Handler for GET /recommendations
async fn recommendations_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecommendationsParams>,
) -> Result<Json<RecommendationResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = parse_user_id(params.user_id.as_deref()).map_err(bad_request)?;
    let count = parse_count(
        params.count.as_deref(),
        state.config.recommendation.default_count,
        state.config.recommendation.max_count,
    )
    .map_err(bad_request)?;

    match state.recommend.recommend(user_id, count).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Recommendation request failed for user {}: {}", user_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to generate recommendations".to_string(),
                }),
            ))
        }
    }
}

/// Handler for GET /popular
async fn popular_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PopularParams>,
) -> Result<Json<PopularResponse>, (StatusCode, Json<ErrorResponse>)> {
    let count = parse_count(
        params.count.as_deref(),
        20,
        state.config.recommendation.max_count,
    )
    .map_err(bad_request)?;

    let category = params.category.unwrap_or_default();
    let filter = if category.is_empty() {
        None
    } else {
        Some(category.as_str())
    };

    match state.recommend.popular(filter, count).await {
        Ok(recommendations) => Ok(Json(PopularResponse {
            category,
            recommendations,
        })),
        Err(e) => {
            error!("Popular-items request failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to get popular items".to_string(),
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

/// Resolve when SIGINT or SIGTERM arrives
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Serve until a shutdown signal, then drain in-flight requests for at most
/// ten seconds before giving up on them.
pub async fn serve_with_shutdown(listener: TcpListener, app: Router) -> RecoResult<()> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    info!("Shutting down server...");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(SHUTDOWN_DRAIN, server).await {
        Ok(Ok(Ok(()))) => info!("Server exited"),
        Ok(Ok(Err(e))) => return Err(RecoError::Internal(format!("Server error: {}", e))),
        Ok(Err(e)) => return Err(RecoError::Internal(format!("Server task failed: {}", e))),
        Err(_) => warn!("Server forced to shutdown after drain timeout"),
    }

    Ok(())
}
