// src/videos/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::access::{OwnedResource, ReadAccess};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Unlisted,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Unlisted => "unlisted",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            "unlisted" => Ok(Visibility::Unlisted),
            other => Err(format!("invalid visibility '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_key: String,
    pub visibility: Visibility,
    pub user_id: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<f64>,
    pub file_size: Option<i64>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl OwnedResource for Video {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }

    fn read_access(&self) -> ReadAccess {
        match self.visibility {
            Visibility::Public | Visibility::Unlisted => ReadAccess::Anyone,
            Visibility::Private => ReadAccess::OwnerOnly,
        }
    }
}

/// A video as returned by `GET /videos/:id`
#[derive(Debug, Serialize)]
pub struct VideoWithPlayback {
    #[serde(flatten)]
    pub video: Video,
    pub playback_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoList {
    pub videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_key: Option<String>,
    pub visibility: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadUrlRequest {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub video_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ListVideosQuery {
    pub visibility: Option<String>,
}
