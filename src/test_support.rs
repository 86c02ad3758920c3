// src/test_support.rs
//! Helpers for driving the composed router in tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::common::{AppConfig, AppState};
use crate::router::build_router;

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

impl TestApp {
    pub async fn new(config: AppConfig) -> Self {
        let state = crate::common::state::test_state(config).await;
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub async fn start() -> Self {
        Self::new(AppConfig::for_tests()).await
    }

    /// Creates a user row directly and returns its id with a session credential.
    pub async fn sign_in_as(&self, email: &str) -> (String, String) {
        let user_id = self
            .state
            .users
            .resolve_or_create(email, None, None)
            .await
            .unwrap();
        let token = self.state.sessions.issue(&user_id, email).unwrap();
        (user_id, token)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
