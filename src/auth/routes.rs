//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /auth/google` - Sign in with a Google ID token
/// - `GET /auth/me` - Get current user information
pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/google", post(handlers::google_auth))
        .route("/auth/me", get(handlers::me_handler))
}
