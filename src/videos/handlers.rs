// src/videos/handlers.rs

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::models::*;
use super::validators::{UploadUrlValidator, VideoValidator};
use crate::access::authorize_read;
use crate::auth::AuthedUser;
use crate::common::{generate_video_id, ApiError, AppState, Validator};
use crate::services::storage::{build_video_key, StorageError, DEFAULT_CONTENT_TYPE};

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e.body_text())))
}

/// POST /videos/upload-url - Presigned URL for a direct-to-storage upload
pub async fn create_upload_url(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    payload: Result<Json<UploadUrlRequest>, JsonRejection>,
) -> Result<Json<UploadUrlResponse>, ApiError> {
    let request = json_body(payload)?;
    UploadUrlValidator.validate(&request).into_result()?;

    let file_name = request.file_name.as_deref().unwrap_or_default();
    let video_key = build_video_key(file_name);
    let content_type = request
        .content_type
        .as_deref()
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let upload_url = state
        .storage
        .presigned_upload_url(&video_key, content_type)
        .await
        .map_err(|e| match e {
            StorageError::NotConfigured => ApiError::ServiceUnavailable(
                "R2 API credentials not configured. Set R2_ACCESS_KEY_ID and R2_SECRET_ACCESS_KEY for presigned upload URLs.".to_string(),
            ),
            StorageError::PresignFailed(detail) => ApiError::InternalServer(detail),
        })?;

    info!(user_id = %authed.id, video_key = %video_key, "Upload URL issued");

    Ok(Json(UploadUrlResponse {
        upload_url,
        video_key,
    }))
}

/// POST /videos - Register an uploaded video owned by the caller
pub async fn create_video(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    payload: Result<Json<CreateVideoRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    VideoValidator.validate(&request).into_result()?;

    let visibility = match request.visibility.as_deref() {
        Some(v) => v.parse::<Visibility>().map_err(ApiError::BadRequest)?,
        None => Visibility::Private,
    };

    let id = generate_video_id();
    let created_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO videos (id, title, description, video_key, visibility, user_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(request.title.as_deref().map(str::trim))
    .bind(request.description.as_deref())
    .bind(request.video_key.as_deref())
    .bind(visibility)
    .bind(&authed.id)
    .bind(&created_at)
    .execute(&state.db)
    .await?;

    let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    info!(video_id = %id, user_id = %authed.id, visibility = %visibility, "Video created");

    Ok((StatusCode::CREATED, Json(video)))
}

/// GET /videos/:id - Video details, subject to its visibility
pub async fn get_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    authed: Option<AuthedUser>,
) -> Result<Json<VideoWithPlayback>, ApiError> {
    let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    if let Err(e) = authorize_read(&video, authed.as_ref().map(|u| u.id.as_str())) {
        warn!(video_id = %id, "Video read denied");
        return Err(e);
    }

    let playback_url = state.storage.public_url(&video.video_key);

    Ok(Json(VideoWithPlayback {
        video,
        playback_url,
    }))
}

/// GET /videos - The caller's own videos, newest first
pub async fn list_videos(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Query(query): Query<ListVideosQuery>,
) -> Result<Json<VideoList>, ApiError> {
    let visibility = query
        .visibility
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::parse::<Visibility>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let videos = match visibility {
        Some(visibility) => {
            sqlx::query_as::<_, Video>(
                "SELECT * FROM videos WHERE user_id = ? AND visibility = ? ORDER BY created_at DESC",
            )
            .bind(&authed.id)
            .bind(visibility)
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as::<_, Video>(
                "SELECT * FROM videos WHERE user_id = ? ORDER BY created_at DESC",
            )
            .bind(&authed.id)
            .fetch_all(&state.db)
            .await?
        }
    };

    Ok(Json(VideoList { videos }))
}
