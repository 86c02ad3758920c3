//! Authentication handlers

use axum::extract::{rejection::JsonRejection, Extension, Json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::extractors::AuthedUser;
use super::models::{GoogleIdTokenPayload, SignInResponse, SignInUser, User};
use crate::common::{safe_email_log, ApiError, AppState};

/// POST /auth/google
/// Signs a user in with a Google ID token
///
/// # Request Body
/// ```json
/// {
///   "id_token": "<google id token>"
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "token": "<session credential>",
///   "user": { "id": "...", "email": "...", "name": "..." }
/// }
/// ```
pub async fn google_auth(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<GoogleIdTokenPayload>, JsonRejection>,
) -> Result<Json<SignInResponse>, ApiError> {
    debug!("Received Google sign-in request");

    let id_token = payload
        .ok()
        .and_then(|Json(p)| p.id_token)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("id_token is required".to_string()))?;

    let identity = state
        .identity
        .verify(&id_token, &state.config.google_client_id)
        .await
        .map_err(|e| {
            warn!(reason = %e, "Google sign-in rejected");
            ApiError::Unauthorized("Invalid token".to_string())
        })?;

    let user_id = state
        .users
        .resolve_or_create(
            &identity.email,
            identity.name.as_deref(),
            identity.picture_url.as_deref(),
        )
        .await?;

    let token = state
        .sessions
        .issue(&user_id, &identity.email)
        .map_err(|e| ApiError::InternalServer(e.to_string()))?;

    info!(
        user_id = %user_id,
        email = %safe_email_log(&identity.email),
        "User signed in via Google"
    );

    Ok(Json(SignInResponse {
        token,
        user: SignInUser {
            id: user_id,
            email: identity.email,
            name: identity.name,
        },
    }))
}

/// GET /auth/me
/// Returns the signed-in user's record
pub async fn me_handler(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
) -> Result<Json<User>, ApiError> {
    match state.users.find_by_id(&authed.id).await? {
        Some(user) => Ok(Json(user)),
        None => {
            warn!(user_id = %authed.id, "Session credential refers to a missing user");
            Err(ApiError::NotFound("User not found".to_string()))
        }
    }
}
