use anyhow::Context;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

use crate::cache::TimedCache;
use crate::error::{ApiError, PublicError};
use crate::http_client::StravaClient;
use crate::middleware;

/// Application version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cache key for the aggregate stats query
pub const STATS_CACHE_KEY: &str = "strava-stats";

/// Activities returned when `limit` is absent or unusable
pub const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

/// Largest page Strava will serve
pub const MAX_ACTIVITY_LIMIT: u32 = 200;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub strava: Arc<StravaClient>,
    pub cache: TimedCache,
    pub cache_ttl_minutes: u64,
}

/// Cache key for one page size of recent activities
pub fn activities_cache_key(limit: u32) -> String {
    format!("strava-activities-{}", limit)
}

/// Parse the `limit` query value, falling back to the default
pub fn parse_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|&n| n > 0)
        .map(|n| n.min(MAX_ACTIVITY_LIMIT))
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
}

/// Complete router: health, Strava endpoints, CORS and request tracing
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(strava_routes(state))
        .layer(middleware::cors_layer())
        .layer(middleware::trace_layer())
}

/// Health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
}

/// Strava data routes
pub fn strava_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/strava/activities", get(activities_handler))
        .route("/api/strava/stats", get(stats_handler))
        .with_state(state)
}

/// GET / - Simple health check
async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Strava stats gateway is running",
        "version": VERSION
    }))
}

/// GET /health - Detailed health check
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": VERSION
    }))
}

/// Return the cached value for `key`, or fetch, cache and return it.
///
/// Nothing is written when `fetch` fails.
async fn cached_or_fetch<T, F, Fut>(state: &AppState, key: &str, fetch: F) -> Result<Value, ApiError>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    if let Some(value) = state.cache.get(key) {
        tracing::debug!("Cache hit: {}", key);
        return Ok(value);
    }

    tracing::info!("Cache miss: {}, fetching from Strava", key);
    let fresh = fetch().await?;
    let value = serde_json::to_value(&fresh)
        .with_context(|| format!("Failed to serialize response for {}", key))?;

    state
        .cache
        .set(key, value.clone(), state.cache_ttl_minutes);
    Ok(value)
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivitiesQuery {
    pub limit: Option<String>,
}

/// GET /api/strava/activities?limit=N - Recent activities, newest first
async fn activities_handler(
    State(state): State<AppState>,
    Query(query): Query<ActivitiesQuery>,
) -> Result<Json<Value>, PublicError> {
    let limit = parse_limit(query.limit.as_deref());
    tracing::info!("Request to /api/strava/activities: limit={}", limit);

    let key = activities_cache_key(limit);
    cached_or_fetch(&state, &key, || state.strava.get_recent_activities(limit))
        .await
        .map(Json)
        .map_err(|e| e.into_public("Failed to fetch Strava activities"))
}

/// GET /api/strava/stats - Recent, year-to-date and all-time running totals
async fn stats_handler(State(state): State<AppState>) -> Result<Json<Value>, PublicError> {
    tracing::info!("Request to /api/strava/stats");

    cached_or_fetch(&state, STATS_CACHE_KEY, || state.strava.get_athlete_stats(None))
        .await
        .map(Json)
        .map_err(|e| e.into_public("Failed to fetch Strava stats"))
}
