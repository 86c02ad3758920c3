// src/videos/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// # Routes
/// - `POST /videos/upload-url` - Presigned upload URL (auth)
/// - `POST /videos` - Register a video (auth)
/// - `GET /videos` - List own videos (auth)
/// - `GET /videos/:id` - Video details (visibility rules)
pub fn videos_routes() -> Router {
    Router::new()
        .route("/videos/upload-url", post(handlers::create_upload_url))
        .route(
            "/videos",
            post(handlers::create_video).get(handlers::list_videos),
        )
        .route("/videos/:id", get(handlers::get_video))
}
