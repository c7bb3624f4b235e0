use chrono::Utc;
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};

use super::refresh;
use super::types::{Credentials, TokenState};
use crate::error::ApiError;

/// Token manager
/// Hands out a valid Strava access token, refreshing lazily when it has expired
pub struct TokenManager {
    /// Application credentials; the refresh token may rotate
    credentials: RwLock<Credentials>,

    /// `None` until the first refresh succeeds
    state: RwLock<Option<TokenState>>,

    /// Held for the duration of a refresh so concurrent callers share one exchange
    refresh_lock: Mutex<()>,

    /// HTTP client for refresh requests
    client: Client,

    /// Token endpoint, e.g. https://www.strava.com/oauth/token
    token_url: String,
}

impl TokenManager {
    /// Create a manager with no token held yet
    pub fn new(credentials: Credentials, token_url: impl Into<String>, client: Client) -> Self {
        Self {
            credentials: RwLock::new(credentials),
            state: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            client,
            token_url: token_url.into(),
        }
    }

    /// Current token if one is held and not yet expired
    async fn current_token(&self) -> Option<String> {
        let state = self.state.read().await;
        state
            .as_ref()
            .filter(|s| s.is_valid_at(Utc::now()))
            .map(|s| s.access_token.clone())
    }

    /// Run the refresh-token exchange and store the result
    async fn refresh_token(&self) -> Result<String, ApiError> {
        let creds = self.credentials.read().await.clone();
        let token_data = refresh::refresh_access_token(&self.client, &self.token_url, &creds).await?;

        let access_token = token_data.state.access_token.clone();
        {
            let mut state = self.state.write().await;
            *state = Some(token_data.state);
        }

        if let Some(new_refresh_token) = token_data.refresh_token {
            if new_refresh_token != creds.refresh_token {
                tracing::debug!("Strava rotated the refresh token");
                self.credentials.write().await.refresh_token = new_refresh_token;
            }
        }

        Ok(access_token)
    }

    /// Get a valid access token, refreshing if necessary
    ///
    /// At most one refresh is in flight; callers that arrive during a refresh
    /// wait for it and reuse its token.
    pub async fn get_valid_token(&self) -> Result<String, ApiError> {
        if let Some(token) = self.current_token().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have finished a refresh while we waited
        if let Some(token) = self.current_token().await {
            tracing::debug!("Reusing token refreshed by a concurrent request");
            return Ok(token);
        }

        self.refresh_token().await
    }
}
