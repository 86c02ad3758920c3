// src/streams/lifecycle.rs
//! Broadcast status transitions.
//!
//! A transition is committed with a single guarded UPDATE that only matches
//! while the row still holds the status we validated against, so racing
//! start/end calls cannot move a stream backwards. The recording lookup that
//! follows `end` runs after the commit and can only ever fill in an optional
//! field.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use super::models::{EndedStream, StartedStream, Stream, StreamStatus};
use crate::access::can_mutate;
use crate::common::ApiError;
use crate::services::live_video::{LiveVideoError, LiveVideoService};

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Missing stream, or a stream the caller does not own
    #[error("Stream not found")]
    NotFound,

    #[error("cannot move stream from {from} to {to}")]
    InvalidTransition {
        from: StreamStatus,
        to: StreamStatus,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<LifecycleError> for ApiError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::NotFound => ApiError::NotFound("Stream not found".to_string()),
            LifecycleError::InvalidTransition { from, to } => {
                ApiError::Conflict(format!("cannot move stream from {} to {}", from, to))
            }
            LifecycleError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

#[derive(Clone)]
pub struct StreamLifecycle {
    db: SqlitePool,
    live_video: LiveVideoService,
}

impl StreamLifecycle {
    pub fn new(db: SqlitePool, live_video: LiveVideoService) -> Self {
        Self { db, live_video }
    }

    pub async fn find(&self, stream_id: &str) -> Result<Option<Stream>, sqlx::Error> {
        sqlx::query_as::<_, Stream>("SELECT * FROM streams WHERE id = ?")
            .bind(stream_id)
            .fetch_optional(&self.db)
            .await
    }

    /// Loads a stream for mutation. Non-owners get the same answer as for a
    /// stream that does not exist.
    async fn load_owned(&self, stream_id: &str, caller: &str) -> Result<Stream, LifecycleError> {
        match self.find(stream_id).await? {
            Some(stream) if can_mutate(&stream, Some(caller)) => Ok(stream),
            Some(_) => {
                warn!(stream_id = %stream_id, user_id = %caller, "Stream mutation by non-owner");
                Err(LifecycleError::NotFound)
            }
            None => Err(LifecycleError::NotFound),
        }
    }

    pub(super) async fn transition(
        &self,
        stream: &Stream,
        to: StreamStatus,
        timestamp_column: &'static str,
    ) -> Result<String, LifecycleError> {
        if !stream.status.can_transition_to(to) {
            return Err(LifecycleError::InvalidTransition {
                from: stream.status,
                to,
            });
        }

        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "UPDATE streams SET status = ?, {} = ? WHERE id = ? AND user_id = ? AND status = ?",
            timestamp_column
        );

        let result = sqlx::query(&sql)
            .bind(to)
            .bind(&now)
            .bind(&stream.id)
            .bind(&stream.user_id)
            .bind(stream.status)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            // Lost a race with another transition
            return match self.find(&stream.id).await? {
                Some(current) => Err(LifecycleError::InvalidTransition {
                    from: current.status,
                    to,
                }),
                None => Err(LifecycleError::NotFound),
            };
        }

        info!(stream_id = %stream.id, from = %stream.status, to = %to, "Stream status changed");
        Ok(now)
    }

    /// idle -> live
    pub async fn start(&self, stream_id: &str, caller: &str) -> Result<StartedStream, LifecycleError> {
        let stream = self.load_owned(stream_id, caller).await?;
        let started_at = self
            .transition(&stream, StreamStatus::Live, "started_at")
            .await?;

        Ok(StartedStream {
            id: stream.id,
            status: StreamStatus::Live,
            started_at,
        })
    }

    /// idle|live -> ended, then a best-effort recording lookup
    pub async fn end(&self, stream_id: &str, caller: &str) -> Result<EndedStream, LifecycleError> {
        let stream = self.load_owned(stream_id, caller).await?;
        let ended_at = self
            .transition(&stream, StreamStatus::Ended, "ended_at")
            .await?;

        let recording_url = match self.live_video.latest_recording_url(&stream.cf_stream_id).await {
            Ok(url) => url,
            Err(LiveVideoError::NotConfigured) => None,
            Err(e) => {
                warn!(stream_id = %stream.id, error = %e, "Recording lookup failed");
                None
            }
        };

        Ok(EndedStream {
            id: stream.id,
            status: StreamStatus::Ended,
            ended_at,
            recording_url,
        })
    }
}
