// Token refresh logic

use anyhow::Context;
use chrono::{TimeZone, Utc};
use reqwest::Client;

use super::types::{Credentials, StravaTokenResponse, TokenData, TokenState};
use crate::error::ApiError;

/// Exchange the refresh token for a new access token
///
/// Strava expects a form-urlencoded body and answers with the new token and
/// its absolute expiry in epoch seconds.
pub async fn refresh_access_token(
    client: &Client,
    token_url: &str,
    creds: &Credentials,
) -> Result<TokenData, ApiError> {
    tracing::info!("Refreshing Strava access token...");

    let form = [
        ("client_id", creds.client_id.as_str()),
        ("client_secret", creds.client_secret.as_str()),
        ("refresh_token", creds.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];

    let response = client
        .post(token_url)
        .form(&form)
        .send()
        .await
        .context("Failed to send Strava token refresh request")?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(
            "Strava token refresh failed: status={}, body={}",
            status,
            error_text
        );
        return Err(ApiError::TokenRefresh {
            status: status.as_u16(),
            message: error_text,
        });
    }

    let body = response
        .text()
        .await
        .context("Failed to read Strava token refresh response")?;

    let data: StravaTokenResponse =
        serde_json::from_str(&body).map_err(|e| ApiError::TokenRefresh {
            status: status.as_u16(),
            message: format!("Unexpected token response: {}", e),
        })?;

    if data.access_token.is_empty() {
        return Err(ApiError::TokenRefresh {
            status: status.as_u16(),
            message: "Token response does not contain access_token".to_string(),
        });
    }

    let expires_at = Utc
        .timestamp_opt(data.expires_at, 0)
        .single()
        .ok_or_else(|| ApiError::TokenRefresh {
            status: status.as_u16(),
            message: format!("Token response has invalid expires_at: {}", data.expires_at),
        })?;

    tracing::info!(
        "Strava token refreshed, expires: {}",
        expires_at.to_rfc3339()
    );

    Ok(TokenData {
        state: TokenState {
            access_token: data.access_token,
            expires_at,
        },
        refresh_token: data.refresh_token,
    })
}
