// src/streams/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::access::{OwnedResource, ReadAccess};

/// Broadcast status. Moves forward only: idle -> live -> ended, with idle ->
/// ended allowed for a broadcast that never went live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum StreamStatus {
    Idle,
    Live,
    Ended,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Idle => "idle",
            StreamStatus::Live => "live",
            StreamStatus::Ended => "ended",
        }
    }

    pub fn can_transition_to(&self, next: StreamStatus) -> bool {
        matches!(
            (self, next),
            (StreamStatus::Idle, StreamStatus::Live)
                | (StreamStatus::Idle, StreamStatus::Ended)
                | (StreamStatus::Live, StreamStatus::Ended)
        )
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream record. `stream_key` is only ever returned by the create call.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Stream {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub cf_stream_id: String,
    pub rtmp_url: String,
    #[serde(skip_serializing)]
    pub stream_key: String,
    pub status: StreamStatus,
    pub user_id: String,
    pub viewer_count: i64,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub created_at: String,
}

impl OwnedResource for Stream {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }

    fn read_access(&self) -> ReadAccess {
        ReadAccess::Authenticated
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStreamRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Response to `POST /streams`, the one place the ingest key is shown
#[derive(Debug, Serialize)]
pub struct CreatedStream {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub rtmp_url: String,
    pub stream_key: String,
    pub status: StreamStatus,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct StartedStream {
    pub id: String,
    pub status: StreamStatus,
    pub started_at: String,
}

#[derive(Debug, Serialize)]
pub struct EndedStream {
    pub id: String,
    pub status: StreamStatus,
    pub ended_at: String,
    pub recording_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlaybackResponse {
    pub hls_url: Option<String>,
    pub dash_url: Option<String>,
    pub embed_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
