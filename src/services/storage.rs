// src/services/storage.rs
//! Object storage (Cloudflare R2 through the S3 API): presigned upload URLs
//! and public playback links.

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

const PRESIGNED_EXPIRY_SECONDS: u64 = 3600;
pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("R2 API credentials not configured")]
    NotConfigured,

    #[error("Presigning failed: {0}")]
    PresignFailed(String),
}

#[derive(Clone)]
pub struct StorageService {
    account_id: String,
    bucket_name: String,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    public_url: Option<String>,
}

impl StorageService {
    pub fn new(
        account_id: impl Into<String>,
        bucket_name: impl Into<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        public_url: Option<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            bucket_name: bucket_name.into(),
            access_key_id,
            secret_access_key,
            public_url,
        }
    }

    fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }

    async fn get_s3_client(&self) -> Result<S3Client, StorageError> {
        let (access_key_id, secret_access_key) =
            match (&self.access_key_id, &self.secret_access_key) {
                (Some(key), Some(secret)) => (key, secret),
                _ => return Err(StorageError::NotConfigured),
            };

        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "r2");

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(self.endpoint())
            .credentials_provider(credentials)
            .load()
            .await;

        Ok(S3Client::new(&aws_config))
    }

    /// Presigned PUT URL for `key`, valid for one hour.
    pub async fn presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let client = self.get_s3_client().await?;

        let presigning = PresigningConfig::expires_in(Duration::from_secs(PRESIGNED_EXPIRY_SECONDS))
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let request = client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| {
                error!(error = %e, key = %key, "Failed to presign upload URL");
                StorageError::PresignFailed(e.to_string())
            })?;

        info!(key = %key, bucket = %self.bucket_name, "Presigned upload URL issued");
        Ok(request.uri().to_string())
    }

    /// Public URL of a stored object, when a public base URL is configured.
    pub fn public_url(&self, key: &str) -> Option<String> {
        self.public_url
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), key))
    }
}

/// Keeps only characters that are safe in an object key.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

/// Object key for a new upload: a random UUID followed by the sanitized
/// client file name.
pub fn build_video_key(file_name: &str) -> String {
    let base = file_name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(file_name);
    let cleaned = sanitize_filename(base.trim());
    let cleaned = if cleaned.is_empty() { "upload".to_string() } else { cleaned };
    format!("{}-{}", Uuid::new_v4(), cleaned)
}
