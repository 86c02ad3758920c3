// src/streams/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// # Routes
/// - `POST /streams` - Create a stream (auth)
/// - `GET /streams/:id` - Stream record (auth)
/// - `POST /streams/:id/start` - idle -> live (owner)
/// - `POST /streams/:id/end` - -> ended (owner)
/// - `GET /streams/:id/playback` - Playback URLs (anonymous)
pub fn streams_routes() -> Router {
    Router::new()
        .route("/streams", post(handlers::create_stream))
        .route("/streams/:id", get(handlers::get_stream))
        .route("/streams/:id/start", post(handlers::start_stream))
        .route("/streams/:id/end", post(handlers::end_stream))
        .route("/streams/:id/playback", get(handlers::get_playback))
}
