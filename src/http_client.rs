use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenManager;
use crate::error::ApiError;
use crate::models::{ActivitySummary, Athlete, AthleteStats};

/// Build the shared reqwest client used for both token and data calls
pub fn build_http_client(connect_timeout: u64, request_timeout: u64) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout))
        .timeout(Duration::from_secs(request_timeout))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Authenticated client for the Strava v3 API
///
/// Every call asks the token manager for a valid token first. Failures are
/// returned as-is; there is no retry or backoff here.
pub struct StravaClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Token manager
    tokens: Arc<TokenManager>,

    /// API root without trailing slash, e.g. https://www.strava.com/api/v3
    base_url: String,
}

impl StravaClient {
    pub fn new(client: Client, tokens: Arc<TokenManager>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            tokens,
            base_url,
        }
    }

    /// GET `path_and_query` with bearer auth and parse the body into `T`
    pub async fn request<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, ApiError> {
        let token = self.tokens.get_valid_token().await?;
        let url = format!("{}{}", self.base_url, path_and_query);

        tracing::debug!(url = %url, "Sending Strava API request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                url = %url,
                response_body = %body,
                "Strava API request failed"
            );
            return Err(ApiError::UpstreamRequest {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(url = %url, error = %e, "Unexpected Strava response shape");
            ApiError::UpstreamRequest {
                status: status.as_u16(),
                message: format!("Unexpected response shape: {}", e),
            }
        })
    }

    /// Most recent activities, newest first, at most `limit` of them
    pub async fn get_recent_activities(&self, limit: u32) -> Result<Vec<ActivitySummary>, ApiError> {
        self.request(&format!("/athlete/activities?per_page={}", limit))
            .await
    }

    /// The athlete the refresh token belongs to
    pub async fn get_authenticated_athlete(&self) -> Result<Athlete, ApiError> {
        self.request("/athlete").await
    }

    /// Running totals for `athlete_id`, or for the authenticated athlete when `None`
    pub async fn get_athlete_stats(&self, athlete_id: Option<u64>) -> Result<AthleteStats, ApiError> {
        let athlete_id = match athlete_id {
            Some(id) => id,
            None => self.get_authenticated_athlete().await?.id,
        };
        self.request(&format!("/athletes/{}/stats", athlete_id)).await
    }
}
