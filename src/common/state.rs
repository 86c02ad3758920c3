// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::config::AppConfig;
use crate::auth::SessionCodec;
use crate::services::{GoogleIdentityVerifier, LiveVideoService, StorageService, UserDirectory};
use crate::streams::StreamLifecycle;

/// Application state containing database pool, services, and configuration.
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub sessions: SessionCodec,
    pub identity: GoogleIdentityVerifier,
    pub users: UserDirectory,
    pub storage: StorageService,
    pub live_video: LiveVideoService,
    pub streams: StreamLifecycle,
}

impl AppState {
    pub fn new(config: AppConfig, db: SqlitePool, http: Client) -> Self {
        let sessions = SessionCodec::new(&config.jwt_secret, config.session_ttl_seconds);
        let identity = GoogleIdentityVerifier::new(http.clone(), config.google_tokeninfo_url.clone());
        let users = UserDirectory::new(db.clone());
        let storage = StorageService::new(
            config.cloudflare_account_id.clone(),
            config.r2_bucket_name.clone(),
            config.r2_access_key_id.clone(),
            config.r2_secret_access_key.clone(),
            config.r2_public_url.clone(),
        );
        let live_video = LiveVideoService::new(
            http,
            config.cloudflare_api_base.clone(),
            config.cloudflare_account_id.clone(),
            config.stream_api_token.clone(),
        );
        let streams = StreamLifecycle::new(db.clone(), live_video.clone());

        Self {
            db,
            config: Arc::new(config),
            sessions,
            identity,
            users,
            storage,
            live_video,
            streams,
        }
    }
}

/// In-memory database with the full schema. One connection, since every
/// `sqlite::memory:` connection is its own database.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    super::migrations::run_migrations(&pool, false).await.unwrap();
    pool
}

#[cfg(test)]
pub async fn test_state(config: AppConfig) -> Arc<AppState> {
    let http = Client::builder().no_proxy().build().unwrap();
    Arc::new(AppState::new(config, test_pool().await, http))
}
