// src/common/config.rs
//! Process-wide configuration, loaded once at startup and handed to every
//! component by value.

use std::env;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 60 * 60 * 24 * 7;
pub const MAX_SESSION_TTL_SECONDS: i64 = 60 * 60 * 24 * 365;
pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
pub const DEFAULT_CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:8787"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub reset_db: bool,
    pub port: u16,
    pub jwt_secret: String,
    pub session_ttl_seconds: i64,
    pub google_client_id: String,
    pub google_tokeninfo_url: String,
    pub cloudflare_account_id: String,
    pub cloudflare_api_base: String,
    pub stream_api_token: Option<String>,
    pub r2_access_key_id: Option<String>,
    pub r2_secret_access_key: Option<String>,
    pub r2_bucket_name: String,
    pub r2_public_url: Option<String>,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let google_client_id =
            non_empty("GOOGLE_CLIENT_ID").ok_or(ConfigError::Missing("GOOGLE_CLIENT_ID"))?;

        let session_ttl_seconds = parse_session_ttl(non_empty("SESSION_TTL_SECONDS"))?;

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            None => 8787,
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://streamhub.db".to_string()),
            reset_db: non_empty("RESET_DB")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            port,
            jwt_secret,
            session_ttl_seconds,
            google_client_id,
            google_tokeninfo_url: non_empty("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|| DEFAULT_TOKENINFO_URL.to_string()),
            cloudflare_account_id: env::var("CLOUDFLARE_ACCOUNT_ID").unwrap_or_default(),
            cloudflare_api_base: non_empty("CLOUDFLARE_API_BASE")
                .unwrap_or_else(|| DEFAULT_CLOUDFLARE_API_BASE.to_string()),
            stream_api_token: non_empty("CLOUDFLARE_STREAM_API_TOKEN"),
            r2_access_key_id: non_empty("R2_ACCESS_KEY_ID"),
            r2_secret_access_key: non_empty("R2_SECRET_ACCESS_KEY"),
            r2_bucket_name: non_empty("R2_BUCKET_NAME")
                .unwrap_or_else(|| "video-uploads".to_string()),
            r2_public_url: non_empty("R2_PUBLIC_URL"),
            cors_origins: parse_cors_origins(env::var("CORS_ORIGINS").ok().as_deref()),
        })
    }

    /// Configuration suitable for tests: fixed secrets, no external providers.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            reset_db: false,
            port: 0,
            jwt_secret: "test_secret_key".to_string(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            google_tokeninfo_url: "http://127.0.0.1:9/tokeninfo".to_string(),
            cloudflare_account_id: "acct123".to_string(),
            cloudflare_api_base: "http://127.0.0.1:9/client/v4".to_string(),
            stream_api_token: None,
            r2_access_key_id: None,
            r2_secret_access_key: None,
            r2_bucket_name: "video-uploads".to_string(),
            r2_public_url: Some("https://media.example.com/".to_string()),
            cors_origins: parse_cors_origins(None),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("reset_db", &self.reset_db)
            .field("port", &self.port)
            .field("jwt_secret", &"***")
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("google_client_id", &self.google_client_id)
            .field("google_tokeninfo_url", &self.google_tokeninfo_url)
            .field("cloudflare_account_id", &self.cloudflare_account_id)
            .field("cloudflare_api_base", &self.cloudflare_api_base)
            .field("stream_api_token", &self.stream_api_token.as_ref().map(|_| "***"))
            .field("r2_access_key_id", &self.r2_access_key_id)
            .field(
                "r2_secret_access_key",
                &self.r2_secret_access_key.as_ref().map(|_| "***"),
            )
            .field("r2_bucket_name", &self.r2_bucket_name)
            .field("r2_public_url", &self.r2_public_url)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Session lifetime in seconds: positive and at most one year.
pub fn parse_session_ttl(raw: Option<String>) -> Result<i64, ConfigError> {
    match raw {
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|ttl| (1..=MAX_SESSION_TTL_SECONDS).contains(ttl))
            .ok_or(ConfigError::Invalid("SESSION_TTL_SECONDS", raw)),
        None => Ok(DEFAULT_SESSION_TTL_SECONDS),
    }
}

/// Splits a comma-separated origin list, falling back to the local dev
/// origins when nothing usable is configured.
pub fn parse_cors_origins(raw: Option<&str>) -> Vec<String> {
    let configured: Vec<String> = raw
        .unwrap_or("")
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();

    if configured.is_empty() {
        DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect()
    } else {
        configured
    }
}
