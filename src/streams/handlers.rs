// src/streams/handlers.rs

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::models::*;
use crate::access::authorize_read;
use crate::auth::AuthedUser;
use crate::common::{generate_stream_id, ApiError, AppState, ValidationResult};
use crate::services::live_video::LiveVideoError;

/// POST /streams - Create a live input and its stream record
pub async fn create_stream(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    payload: Result<Json<CreateStreamRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e.body_text())))?;

    let mut validation = ValidationResult::new();
    validation.require("title", request.title.as_deref());
    validation.max_len("title", request.title.as_deref(), 200);
    validation.into_result()?;

    let title = request.title.as_deref().unwrap_or_default().trim().to_string();

    let live_input = state
        .live_video
        .create_live_input(&title)
        .await
        .map_err(|e| match e {
            LiveVideoError::NotConfigured => {
                ApiError::ServiceUnavailable("Stream API not configured".to_string())
            }
            other => {
                error!(error = %other, "Failed to create live input");
                ApiError::InternalServer(format!("Failed to create stream: {}", other))
            }
        })?;

    let id = generate_stream_id();
    let created_at = Utc::now().to_rfc3339();

    let inserted = sqlx::query(
        r#"
        INSERT INTO streams (id, title, description, cf_stream_id, rtmp_url, stream_key, status, user_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&title)
    .bind(request.description.as_deref())
    .bind(&live_input.uid)
    .bind(&live_input.rtmps_url)
    .bind(&live_input.stream_key)
    .bind(StreamStatus::Idle)
    .bind(&authed.id)
    .bind(&created_at)
    .execute(&state.db)
    .await;

    if let Err(e) = inserted {
        error!(
            error = %e,
            live_input_id = %live_input.uid,
            user_id = %authed.id,
            "Failed to store stream; live input is orphaned"
        );
        if let Err(cleanup) = state.live_video.delete_live_input(&live_input.uid).await {
            warn!(error = %cleanup, live_input_id = %live_input.uid, "Failed to delete orphaned live input");
        }
        return Err(ApiError::DatabaseError(e));
    }

    info!(stream_id = %id, user_id = %authed.id, live_input_id = %live_input.uid, "Stream created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedStream {
            id,
            title,
            description: request.description,
            rtmp_url: live_input.rtmps_url,
            stream_key: live_input.stream_key,
            status: StreamStatus::Idle,
            created_at,
        }),
    ))
}

/// GET /streams/:id - Stream record for any signed-in caller
pub async fn get_stream(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    authed: AuthedUser,
) -> Result<Json<Stream>, ApiError> {
    let stream = state
        .streams
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Stream not found".to_string()))?;

    authorize_read(&stream, Some(&authed.id))?;

    Ok(Json(stream))
}

/// POST /streams/:id/start
pub async fn start_stream(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    authed: AuthedUser,
) -> Result<Json<StartedStream>, ApiError> {
    let started = state.streams.start(&id, &authed.id).await?;
    Ok(Json(started))
}

/// POST /streams/:id/end
pub async fn end_stream(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    authed: AuthedUser,
) -> Result<Json<EndedStream>, ApiError> {
    let ended = state.streams.end(&id, &authed.id).await?;
    Ok(Json(ended))
}

/// GET /streams/:id/playback - Public playback URLs; spectators need no account
pub async fn get_playback(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackResponse>, ApiError> {
    let stream = state
        .streams
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Stream not found".to_string()))?;

    let embed_url = state.live_video.embed_url(&stream.cf_stream_id);

    if !state.live_video.is_configured() {
        return Ok(Json(PlaybackResponse {
            hls_url: None,
            dash_url: None,
            embed_url,
            message: Some("Playback URLs require CLOUDFLARE_STREAM_API_TOKEN".to_string()),
        }));
    }

    let playback = match state.live_video.get_playback(&stream.cf_stream_id).await {
        Ok(playback) => playback,
        Err(e) => {
            warn!(stream_id = %id, error = %e, "Playback lookup failed");
            Default::default()
        }
    };

    Ok(Json(PlaybackResponse {
        hls_url: playback.hls_url,
        dash_url: playback.dash_url,
        embed_url,
        message: None,
    }))
}
