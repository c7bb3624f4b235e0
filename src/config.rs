use anyhow::Result;
use clap::Parser;

use crate::auth::Credentials;
use crate::error::ApiError;

pub const DEFAULT_API_BASE_URL: &str = "https://www.strava.com/api/v3";
pub const DEFAULT_TOKEN_URL: &str = "https://www.strava.com/oauth/token";

/// Strava stats gateway
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "3000")]
    pub port: u16,

    /// Strava application client id
    #[arg(long, env = "STRAVA_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// Strava application client secret
    #[arg(long, env = "STRAVA_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Long-lived refresh token for the athlete
    #[arg(long, env = "STRAVA_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Strava API root
    #[arg(long, env = "STRAVA_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Strava OAuth token endpoint
    #[arg(long, env = "STRAVA_TOKEN_URL", default_value = DEFAULT_TOKEN_URL)]
    pub token_url: String,

    /// Minutes a Strava response stays cached
    #[arg(long, env = "CACHE_TTL_MINUTES", default_value = "10")]
    pub cache_ttl_minutes: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10")]
    pub http_connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Strava
    pub credentials: Credentials,
    pub api_base_url: String,
    pub token_url: String,

    // Cache
    pub cache_ttl_minutes: u64,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        Ok(Self::from_args(args)?)
    }

    /// Build configuration from parsed arguments; missing credentials are fatal
    pub fn from_args(args: CliArgs) -> Result<Self, ApiError> {
        let credentials = Credentials::new(
            required(args.client_id, "STRAVA_CLIENT_ID", "--client-id")?,
            required(args.client_secret, "STRAVA_CLIENT_SECRET", "--client-secret")?,
            required(args.refresh_token, "STRAVA_REFRESH_TOKEN", "--refresh-token")?,
        )?;

        Ok(Config {
            server_host: args.host,
            server_port: args.port,
            credentials,
            api_base_url: args.api_base_url,
            token_url: args.token_url,
            cache_ttl_minutes: args.cache_ttl_minutes,
            http_connect_timeout: args.http_connect_timeout,
            http_request_timeout: args.http_timeout,
            log_level: args.log_level,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.cache_ttl_minutes == 0 {
            return Err(ApiError::ConfigError(
                "CACHE_TTL_MINUTES must be greater than zero".to_string(),
            ));
        }

        for (name, url) in [
            ("STRAVA_API_BASE_URL", &self.api_base_url),
            ("STRAVA_TOKEN_URL", &self.token_url),
        ] {
            reqwest::Url::parse(url)
                .map_err(|e| ApiError::ConfigError(format!("{} is not a valid URL: {}", name, e)))?;
        }

        Ok(())
    }
}

fn required(value: Option<String>, env_name: &str, flag: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            ApiError::ConfigError(format!(
                "{} is required (use {} or set {} env var)",
                env_name, flag, env_name
            ))
        })
}
