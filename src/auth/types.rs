// Authentication types

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

use crate::error::ApiError;

/// Strava application credentials, loaded once at startup
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl Credentials {
    /// Build credentials, rejecting any blank field
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let creds = Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        };

        for (name, value) in [
            ("STRAVA_CLIENT_ID", &creds.client_id),
            ("STRAVA_CLIENT_SECRET", &creds.client_secret),
            ("STRAVA_REFRESH_TOKEN", &creds.refresh_token),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::ConfigError(format!("{} is required", name)));
            }
        }

        Ok(creds)
    }
}

// Secrets stay out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// A held access token and the instant it stops being valid
#[derive(Clone)]
pub struct TokenState {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token data from a successful refresh
#[derive(Debug, Clone)]
pub struct TokenData {
    pub state: TokenState,
    pub refresh_token: Option<String>,
}

/// Strava `/oauth/token` response
#[derive(Deserialize)]
pub struct StravaTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Epoch seconds
    pub expires_at: i64,
}
