// Integration tests for the Strava stats gateway
//
// These drive the full router against a mock Strava server: token refresh,
// data calls, caching and error shaping.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use strava_stats_gateway::{
    auth::{Credentials, TokenManager},
    cache::TimedCache,
    http_client::{build_http_client, StravaClient},
    routes::{self, activities_cache_key, AppState, STATS_CACHE_KEY},
};

// ==================================================================================================
// Test Helpers
// ==================================================================================================

/// Application state pointed at the mock server
fn create_test_app_state(server: &ServerGuard) -> AppState {
    let http = build_http_client(5, 10).expect("Failed to create HTTP client");
    let tokens = Arc::new(TokenManager::new(
        Credentials::new("client-123", "secret-456", "refresh-789")
            .expect("Failed to build credentials"),
        format!("{}/oauth/token", server.url()),
        http.clone(),
    ));

    AppState {
        strava: Arc::new(StravaClient::new(http, tokens, server.url())),
        cache: TimedCache::new(),
        cache_ttl_minutes: 10,
    }
}

async fn mock_token(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/oauth/token")
        .match_body(Matcher::UrlEncoded(
            "grant_type".into(),
            "refresh_token".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "token_type": "Bearer",
                "access_token": "access-abc",
                "refresh_token": "refresh-789",
                "expires_at": (Utc::now() + Duration::hours(6)).timestamp()
            })
            .to_string(),
        )
        .expect(hits)
        .create_async()
        .await
}

fn activity(id: u64, day: u32) -> Value {
    json!({
        "id": id,
        "name": format!("Run {}", id),
        "distance": 5000.0 + id as f64,
        "moving_time": 1500,
        "elapsed_time": 1560,
        "total_elevation_gain": 25.5,
        "type": "Run",
        "start_date": format!("2024-06-{:02}T07:00:00Z", day),
        "average_speed": 3.3
    })
}

fn totals(count: u64) -> Value {
    json!({
        "count": count,
        "distance": 5000.0 * count as f64,
        "moving_time": 1500 * count,
        "elapsed_time": 1600 * count,
        "elevation_gain": 20.0 * count as f64
    })
}

/// Send a GET and return status plus parsed JSON body
async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ==================================================================================================
// Health Check Tests
// ==================================================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let server = mockito::Server::new_async().await;
    let app = routes::build_app(create_test_app_state(&server));

    let (status, body) = get_json(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

// ==================================================================================================
// Activities
// ==================================================================================================

#[tokio::test]
async fn test_activities_pass_limit_through_and_cache() {
    let mut server = mockito::Server::new_async().await;
    let token = mock_token(&mut server, 1).await;
    let activities = server
        .mock("GET", "/athlete/activities")
        .match_query(Matcher::UrlEncoded("per_page".into(), "3".into()))
        .match_header("authorization", "Bearer access-abc")
        .with_status(200)
        .with_body(json!([activity(3, 3), activity(2, 2), activity(1, 1)]).to_string())
        .expect(1)
        .create_async()
        .await;

    let state = create_test_app_state(&server);
    let cache = state.cache.clone();
    let app = routes::build_app(state);

    let (status, body) = get_json(app.clone(), "/api/strava/activities?limit=3").await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0]["id"], 3);
    assert_eq!(list[0]["type"], "Run");
    assert_eq!(list[2]["start_date"], "2024-06-01T07:00:00Z");

    assert_eq!(cache.get(&activities_cache_key(3)), Some(body.clone()));

    // Second request is served from the cache
    let (status, again) = get_json(app, "/api/strava/activities?limit=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, body);

    token.assert_async().await;
    activities.assert_async().await;
}

#[tokio::test]
async fn test_activities_are_not_truncated_locally() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _activities = server
        .mock("GET", "/athlete/activities")
        .match_query(Matcher::UrlEncoded("per_page".into(), "3".into()))
        .with_status(200)
        .with_body(
            json!([
                activity(5, 5),
                activity(4, 4),
                activity(3, 3),
                activity(2, 2),
                activity(1, 1)
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let app = routes::build_app(create_test_app_state(&server));
    let (status, body) = get_json(app, "/api/strava/activities?limit=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_activities_default_limit() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let activities = server
        .mock("GET", "/athlete/activities")
        .match_query(Matcher::UrlEncoded("per_page".into(), "10".into()))
        .with_status(200)
        .with_body("[]")
        .expect(2)
        .create_async()
        .await;

    let state = create_test_app_state(&server);
    let cache = state.cache.clone();

    let (status, body) = get_json(
        routes::build_app(state.clone()),
        "/api/strava/activities",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    // An invalid limit maps to the same key, so it hits the cache
    let (status, _) = get_json(
        routes::build_app(state.clone()),
        "/api/strava/activities?limit=banana",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.len(), 1);

    // Clearing forces one more upstream call
    cache.clear();
    let (status, _) = get_json(routes::build_app(state), "/api/strava/activities?limit=0").await;
    assert_eq!(status, StatusCode::OK);

    activities.assert_async().await;
}

#[tokio::test]
async fn test_activity_limits_use_separate_cache_entries() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let five = server
        .mock("GET", "/athlete/activities")
        .match_query(Matcher::UrlEncoded("per_page".into(), "5".into()))
        .with_status(200)
        .with_body(json!([activity(1, 1)]).to_string())
        .expect(1)
        .create_async()
        .await;
    let ten = server
        .mock("GET", "/athlete/activities")
        .match_query(Matcher::UrlEncoded("per_page".into(), "10".into()))
        .with_status(200)
        .with_body(json!([activity(1, 1), activity(2, 2)]).to_string())
        .expect(1)
        .create_async()
        .await;

    let state = create_test_app_state(&server);
    let cache = state.cache.clone();
    let app = routes::build_app(state);

    let (_, small) = get_json(app.clone(), "/api/strava/activities?limit=5").await;
    let (_, large) = get_json(app, "/api/strava/activities?limit=10").await;

    assert_eq!(small.as_array().unwrap().len(), 1);
    assert_eq!(large.as_array().unwrap().len(), 2);
    assert_eq!(cache.get("strava-activities-5"), Some(small));
    assert_eq!(cache.get("strava-activities-10"), Some(large));

    five.assert_async().await;
    ten.assert_async().await;
}

// ==================================================================================================
// Stats
// ==================================================================================================

#[tokio::test]
async fn test_stats_two_hop_and_cache() {
    let mut server = mockito::Server::new_async().await;
    let token = mock_token(&mut server, 1).await;
    let athlete = server
        .mock("GET", "/athlete")
        .match_header("authorization", "Bearer access-abc")
        .with_status(200)
        .with_body(json!({"id": 1234, "username": "runner"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let stats = server
        .mock("GET", "/athletes/1234/stats")
        .match_header("authorization", "Bearer access-abc")
        .with_status(200)
        .with_body(
            json!({
                "biggest_ride_distance": 0.0,
                "recent_run_totals": totals(4),
                "ytd_run_totals": totals(52),
                "all_run_totals": totals(640)
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let state = create_test_app_state(&server);
    let cache = state.cache.clone();
    let app = routes::build_app(state);

    let (status, body) = get_json(app.clone(), "/api/strava/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recent_run_totals"]["count"], 4);
    assert_eq!(body["ytd_run_totals"]["count"], 52);
    assert_eq!(body["all_run_totals"]["moving_time"], 1500 * 640);
    assert!(body.get("biggest_ride_distance").is_none());
    assert_eq!(cache.get(STATS_CACHE_KEY), Some(body.clone()));

    let (_, again) = get_json(app, "/api/strava/stats").await;
    assert_eq!(again, body);

    token.assert_async().await;
    athlete.assert_async().await;
    stats.assert_async().await;
}

#[tokio::test]
async fn test_stats_upstream_failure_is_generic_and_not_cached() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _athlete = server
        .mock("GET", "/athlete")
        .with_status(200)
        .with_body(json!({"id": 1234}).to_string())
        .create_async()
        .await;
    let _stats = server
        .mock("GET", "/athletes/1234/stats")
        .with_status(503)
        .with_body("upstream maintenance window, request id 9f8e7d")
        .create_async()
        .await;

    let state = create_test_app_state(&server);
    let cache = state.cache.clone();
    let (status, body) = get_json(routes::build_app(state), "/api/strava/stats").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch Strava stats" }));
    assert!(!body.to_string().contains("9f8e7d"));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_token_shared_between_endpoints() {
    let mut server = mockito::Server::new_async().await;
    let token = mock_token(&mut server, 1).await;
    let _activities = server
        .mock("GET", "/athlete/activities")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let _athlete = server
        .mock("GET", "/athlete")
        .with_status(200)
        .with_body(json!({"id": 9}).to_string())
        .create_async()
        .await;
    let _stats = server
        .mock("GET", "/athletes/9/stats")
        .with_status(200)
        .with_body(
            json!({
                "recent_run_totals": totals(1),
                "ytd_run_totals": totals(1),
                "all_run_totals": totals(1)
            })
            .to_string(),
        )
        .create_async()
        .await;

    let app = routes::build_app(create_test_app_state(&server));
    let (a, _) = get_json(app.clone(), "/api/strava/activities?limit=2").await;
    let (b, _) = get_json(app, "/api/strava/stats").await;

    assert_eq!(a, StatusCode::OK);
    assert_eq!(b, StatusCode::OK);
    token.assert_async().await;
}
