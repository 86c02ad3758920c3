//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - Session credential issuance and verification
//! - Bearer header handling
//! - Google sign-in and /auth/me

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::{ApiError, AppConfig};
    use crate::test_support::TestApp;
    use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue, Method, StatusCode};
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "test_secret_key";

    fn codec() -> SessionCodec {
        SessionCodec::new(SECRET, 3600)
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    // ------------------------------------------------------------------
    // Session credential
    // ------------------------------------------------------------------

    #[test]
    fn test_issue_and_verify() {
        let codec = codec();
        let token = codec.issue("U_123", "a@x.com").unwrap();

        let identity = codec.verify(&token).unwrap();
        assert_eq!(identity.user_id, "U_123");
        assert_eq!(identity.email, "a@x.com");
    }

    #[test]
    fn test_claims_wire_format() {
        let claims = session::Claims {
            user_id: "U_123".to_string(),
            email: "a@x.com".to_string(),
            exp: 1234567890,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json, json!({ "userId": "U_123", "email": "a@x.com", "exp": 1234567890 }));
    }

    #[test]
    fn test_verify_fails_with_wrong_secret() {
        let token = SessionCodec::new("another_secret", 3600)
            .issue("U_123", "a@x.com")
            .unwrap();
        assert!(codec().verify(&token).is_err());
    }

    #[test]
    fn test_expired_credential_rejected() {
        let codec = codec();
        let expired = codec.issue_with_ttl("U_123", "a@x.com", -10).unwrap();
        assert!(matches!(codec.verify(&expired), Err(session::SessionError::Rejected)));

        // exp == now is already expired
        let boundary = codec.issue_with_ttl("U_123", "a@x.com", 0).unwrap();
        assert!(codec.verify(&boundary).is_err());
    }

    #[test]
    fn test_oversized_lifetime_is_an_error() {
        let codec = SessionCodec::new(SECRET, i64::MAX);
        assert!(matches!(
            codec.issue("U_123", "a@x.com"),
            Err(session::SessionError::ExpiryOverflow(i64::MAX))
        ));
        assert!(codec
            .issue_with_ttl("U_123", "a@x.com", i64::MAX - 1)
            .is_err());
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let codec = codec();
        let alice = codec.issue("U_ALICE", "alice@x.com").unwrap();
        let mallory = codec.issue("U_MALLORY", "mallory@x.com").unwrap();

        let alice_parts: Vec<&str> = alice.split('.').collect();
        let mallory_parts: Vec<&str> = mallory.split('.').collect();
        let spliced = format!("{}.{}.{}", mallory_parts[0], alice_parts[1], mallory_parts[2]);

        assert!(codec.verify(&spliced).is_err());
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let claims = session::Claims {
            user_id: "U_123".to_string(),
            email: "a@x.com".to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(codec().verify(&token).is_err());
    }

    #[test]
    fn test_malformed_credential_rejected() {
        let codec = codec();
        assert!(codec.verify("").is_err());
        assert!(codec.verify("not-a-jwt").is_err());
        assert!(codec.verify("a.b.c").is_err());
    }

    #[test]
    fn test_credential_without_exp_rejected() {
        #[derive(serde::Serialize)]
        struct NoExp<'a> {
            #[serde(rename = "userId")]
            user_id: &'a str,
            email: &'a str,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoExp {
                user_id: "U_123",
                email: "a@x.com",
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(codec().verify(&token).is_err());
    }

    // ------------------------------------------------------------------
    // Authentication gate
    // ------------------------------------------------------------------

    #[test]
    fn test_authenticate_accepts_bearer_credential() {
        let codec = codec();
        let token = codec.issue("U_123", "a@x.com").unwrap();

        let user = extractors::authenticate(&headers_with(&format!("Bearer {}", token)), &codec)
            .unwrap();
        assert_eq!(user, AuthedUser { id: "U_123".to_string() });
    }

    #[test]
    fn test_authenticate_rejections_are_indistinguishable() {
        let codec = codec();
        let valid = codec.issue("U_123", "a@x.com").unwrap();
        let expired = codec.issue_with_ttl("U_123", "a@x.com", -10).unwrap();

        let cases = vec![
            HeaderMap::new(),
            headers_with(&format!("Basic {}", valid)),
            headers_with(&format!("bearer {}", valid)),
            headers_with(&valid),
            headers_with("Bearer "),
            headers_with("Bearer garbage"),
            headers_with(&format!("Bearer {}", expired)),
        ];

        for headers in cases {
            match extractors::authenticate(&headers, &codec) {
                Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, "Unauthorized"),
                other => panic!("expected Unauthorized, got {:?}", other),
            }
        }
    }

    // ------------------------------------------------------------------
    // Sign-in and /auth/me
    // ------------------------------------------------------------------

    async fn app_with_tokeninfo(response: serde_json::Value) -> (TestApp, MockServer) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&server)
            .await;

        let mut config = AppConfig::for_tests();
        config.google_tokeninfo_url = format!("{}/tokeninfo", server.uri());
        (TestApp::new(config).await, server)
    }

    async fn user_count(app: &TestApp) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&app.state.db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_google_sign_in_issues_verifiable_credential() {
        let client_id = AppConfig::for_tests().google_client_id;
        let (app, _server) = app_with_tokeninfo(json!({
            "aud": client_id,
            "email": "a@x.com",
            "name": "Ada"
        }))
        .await;

        let (status, body) = app
            .request(Method::POST, "/auth/google", None, Some(json!({ "id_token": "tok" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "a@x.com");
        assert_eq!(body["user"]["name"], "Ada");

        let token = body["token"].as_str().unwrap();
        let identity = app.state.sessions.verify(token).unwrap();
        assert_eq!(identity.user_id, body["user"]["id"].as_str().unwrap());

        let user = app
            .state
            .users
            .find_by_id(&identity.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_google_sign_in_twice_returns_same_user() {
        let client_id = AppConfig::for_tests().google_client_id;
        let (app, _server) = app_with_tokeninfo(json!({ "aud": client_id, "email": "a@x.com" })).await;

        let (_, first) = app
            .request(Method::POST, "/auth/google", None, Some(json!({ "id_token": "tok1" })))
            .await;
        let (_, second) = app
            .request(Method::POST, "/auth/google", None, Some(json!({ "id_token": "tok2" })))
            .await;

        assert_eq!(first["user"]["id"], second["user"]["id"]);
        assert_eq!(user_count(&app).await, 1);
    }

    #[tokio::test]
    async fn test_google_sign_in_audience_mismatch() {
        let (app, _server) = app_with_tokeninfo(json!({
            "aud": "someone-else.apps.googleusercontent.com",
            "email": "a@x.com"
        }))
        .await;

        let (status, body) = app
            .request(Method::POST, "/auth/google", None, Some(json!({ "id_token": "tok" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");
        assert_eq!(user_count(&app).await, 0);
    }

    #[tokio::test]
    async fn test_google_sign_in_missing_email() {
        let client_id = AppConfig::for_tests().google_client_id;
        let (app, _server) = app_with_tokeninfo(json!({ "aud": client_id, "sub": "42" })).await;

        let (status, _) = app
            .request(Method::POST, "/auth/google", None, Some(json!({ "id_token": "tok" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(user_count(&app).await, 0);
    }

    #[tokio::test]
    async fn test_google_sign_in_provider_unreachable() {
        // Default test config points tokeninfo at a closed port
        let app = TestApp::start().await;
        let (status, body) = app
            .request(Method::POST, "/auth/google", None, Some(json!({ "id_token": "tok" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");
    }

    #[tokio::test]
    async fn test_google_sign_in_requires_id_token() {
        let app = TestApp::start().await;

        let (status, body) = app
            .request(Method::POST, "/auth/google", None, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "id_token is required");

        let (status, _) = app
            .request(Method::POST, "/auth/google", None, Some(json!({ "id_token": "  " })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_me_returns_current_user() {
        let app = TestApp::start().await;
        let (user_id, token) = app.sign_in_as("a@x.com").await;

        let (status, body) = app.request(Method::GET, "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], user_id.as_str());
        assert_eq!(body["email"], "a@x.com");
    }

    #[tokio::test]
    async fn test_me_requires_credential() {
        let app = TestApp::start().await;

        let (status, body) = app.request(Method::GET, "/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let (status, _) = app
            .request(Method::GET, "/auth/me", Some("garbage"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_for_vanished_user() {
        let app = TestApp::start().await;
        let token = app.state.sessions.issue("U_GONE", "gone@x.com").unwrap();

        let (status, body) = app.request(Method::GET, "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User not found");
    }
}
