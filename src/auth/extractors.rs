//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::session::SessionCodec;
use crate::common::{ApiError, AppState};

/// Authenticated user extractor
///
/// Requires `Authorization: Bearer <session credential>`. Every failure,
/// whatever the cause, is the same `401 Unauthorized`. Only the user id is
/// carried forward; handlers that need the email load it from storage.
///
/// Use `Option<AuthedUser>` on routes where anonymous callers are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedUser {
    pub id: String,
}

/// Checks the bearer credential on a request's headers.
pub fn authenticate(headers: &HeaderMap, sessions: &SessionCodec) -> Result<AuthedUser, ApiError> {
    let header = match headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        Some(h) => h,
        None => {
            debug!("Authentication failed: missing Authorization header");
            return Err(ApiError::unauthenticated());
        }
    };

    // The scheme is checked before any credential parsing
    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            debug!("Authentication failed: unsupported Authorization scheme");
            return Err(ApiError::unauthenticated());
        }
    };

    match sessions.verify(token) {
        Ok(identity) => Ok(AuthedUser {
            id: identity.user_id,
        }),
        Err(_) => {
            warn!("Authentication failed: session credential rejected");
            Err(ApiError::unauthenticated())
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(app_state): Extension<Arc<AppState>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let user = authenticate(&parts.headers, &app_state.sessions)?;
        debug!(user_id = %user.id, "Request authenticated");
        Ok(user)
    }
}
