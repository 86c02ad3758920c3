// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::body::{to_bytes, HttpBody};
use axum::{
    body::Body,
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{debug, Level};

use crate::common::{redact_secrets, safe_token_log};

/// Largest body we buffer for logging
const MAX_LOGGED_BODY_BYTES: usize = 1024 * 1024;

/// Renders a body for the log with secret-bearing JSON fields masked.
/// Non-JSON bodies are reported by size only.
fn render_body(bytes: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(mut json) => {
            redact_secrets(&mut json);
            serde_json::to_string_pretty(&json).unwrap_or_default()
        }
        Err(_) => format!("<{} bytes>", bytes.len()),
    }
}

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !tracing::enabled!(Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();

    let authorization = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(safe_token_log);

    // Bodies that may exceed the buffer limit pass through unread
    let within_limit = body
        .size_hint()
        .upper()
        .map_or(false, |upper| upper <= MAX_LOGGED_BODY_BYTES as u64);

    if !within_limit {
        debug!(
            method = %parts.method,
            uri = %parts.uri,
            authorization = ?authorization,
            request_body_bytes = body.size_hint().lower(),
            "📥 Request (body not logged)"
        );
        let response = next.run(Request::from_parts(parts, body)).await;
        return log_response(response).await;
    }

    // Read request body
    let bytes = to_bytes(body, MAX_LOGGED_BODY_BYTES)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    if bytes.is_empty() {
        debug!(
            method = %parts.method,
            uri = %parts.uri,
            authorization = ?authorization,
            "📥 Request"
        );
    } else {
        debug!(
            method = %parts.method,
            uri = %parts.uri,
            authorization = ?authorization,
            request_body = %render_body(&bytes),
            "📥 Request"
        );
    }

    // Reconstruct request
    let request = Request::from_parts(parts, Body::from(bytes));

    let response = next.run(request).await;
    log_response(response).await
}

async fn log_response(response: Response) -> Result<Response, StatusCode> {
    let (parts, body) = response.into_parts();

    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        debug!(
            status = %parts.status,
            response_body = %render_body(&bytes),
            "📤 Response"
        );
    }

    // Reconstruct response
    Ok(Response::from_parts(parts, Body::from(bytes)))
}
