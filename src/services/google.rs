// src/services/google.rs
//! Google ID token verification through the tokeninfo endpoint.
//! Docs: https://developers.google.com/identity/sign-in/web/backend-auth

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::common::safe_email_log;

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("tokeninfo rejected the token with status {0}")]
    TokenRejected(u16),

    #[error("malformed tokeninfo response: {0}")]
    MalformedResponse(String),

    #[error("token audience mismatch")]
    AudienceMismatch,

    #[error("token carries no email")]
    MissingEmail,
}

/// Fields we read from the tokeninfo response; everything else is ignored.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: Option<String>,
    email: Option<String>,
    email_verified: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    sub: Option<String>,
}

/// Identity established from a verified Google ID token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: Option<String>,
    pub picture_url: Option<String>,
    pub subject_id: Option<String>,
}

/// The audience claim must be exactly our client id. Tokeninfo is trusted for
/// the signature, so this is the one integrity check we perform ourselves.
pub fn check_audience(token_audience: Option<&str>, expected_audience: &str) -> Result<(), GoogleError> {
    match token_audience {
        Some(aud) if aud == expected_audience => Ok(()),
        Some(aud) => {
            warn!(
                token_audience = %aud,
                expected_client_id = %expected_audience,
                "Google token audience validation failed - rejecting token"
            );
            Err(GoogleError::AudienceMismatch)
        }
        None => {
            warn!("Google token missing audience field - rejecting token");
            Err(GoogleError::AudienceMismatch)
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleIdentityVerifier {
    client: Client,
    tokeninfo_url: String,
}

impl GoogleIdentityVerifier {
    pub fn new(client: Client, tokeninfo_url: impl Into<String>) -> Self {
        Self {
            client,
            tokeninfo_url: tokeninfo_url.into(),
        }
    }

    /// Verifies an ID token against `expected_audience`.
    ///
    /// Every failure (transport, non-2xx, malformed body, audience, missing
    /// email) comes back as an `Err`; nothing here panics or escapes.
    pub async fn verify(
        &self,
        id_token: &str,
        expected_audience: &str,
    ) -> Result<VerifiedIdentity, GoogleError> {
        let url = format!(
            "{}?id_token={}",
            self.tokeninfo_url,
            urlencoding::encode(id_token)
        );

        debug!("Initiating Google token validation with tokeninfo endpoint");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "HTTP error contacting Google tokeninfo endpoint");
            GoogleError::RequestFailed(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(http_status = %status, "Google tokeninfo returned error status");
            return Err(GoogleError::TokenRejected(status.as_u16()));
        }

        let info = response.json::<TokenInfo>().await.map_err(|e| {
            warn!(error = %e, "Failed to parse Google tokeninfo JSON response");
            GoogleError::MalformedResponse(e.to_string())
        })?;

        check_audience(info.aud.as_deref(), expected_audience)?;

        let email = match info.email {
            Some(email) if !email.is_empty() => email,
            _ => {
                warn!("Google token missing email - rejecting token");
                return Err(GoogleError::MissingEmail);
            }
        };

        if info.email_verified.as_deref() == Some("false") {
            debug!(email = %safe_email_log(&email), "Google token carries an unverified email");
        }

        debug!(
            email = %safe_email_log(&email),
            "Google token validation successful"
        );

        Ok(VerifiedIdentity {
            email,
            name: info.name,
            picture_url: info.picture,
            subject_id: info.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    const CLIENT_ID: &str = "my-client.apps.googleusercontent.com";

    async fn verifier_for(server: &MockServer) -> GoogleIdentityVerifier {
        GoogleIdentityVerifier::new(test_client(), format!("{}/tokeninfo", server.uri()))
    }

    #[test]
    fn test_check_audience() {
        assert!(check_audience(Some(CLIENT_ID), CLIENT_ID).is_ok());
        assert!(matches!(
            check_audience(Some("someone-else"), CLIENT_ID),
            Err(GoogleError::AudienceMismatch)
        ));
        assert!(matches!(
            check_audience(Some(&format!("{} ", CLIENT_ID)), CLIENT_ID),
            Err(GoogleError::AudienceMismatch)
        ));
        assert!(matches!(
            check_audience(None, CLIENT_ID),
            Err(GoogleError::AudienceMismatch)
        ));
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .and(query_param("id_token", "good+token/="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "aud": CLIENT_ID,
                "email": "a@x.com",
                "email_verified": "true",
                "name": "Ada",
                "picture": "https://lh3.example.com/a.png",
                "sub": "1234567890"
            })))
            .mount(&server)
            .await;

        let identity = verifier_for(&server)
            .await
            .verify("good+token/=", CLIENT_ID)
            .await
            .unwrap();

        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.name.as_deref(), Some("Ada"));
        assert_eq!(identity.picture_url.as_deref(), Some("https://lh3.example.com/a.png"));
        assert_eq!(identity.subject_id.as_deref(), Some("1234567890"));
    }

    #[tokio::test]
    async fn test_verify_rejects_audience_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "aud": "another-app.apps.googleusercontent.com",
                "email": "a@x.com"
            })))
            .mount(&server)
            .await;

        let result = verifier_for(&server).await.verify("tok", CLIENT_ID).await;
        assert!(matches!(result, Err(GoogleError::AudienceMismatch)));
    }

    #[tokio::test]
    async fn test_verify_rejects_missing_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "aud": CLIENT_ID,
                "sub": "1234567890"
            })))
            .mount(&server)
            .await;

        let result = verifier_for(&server).await.verify("tok", CLIENT_ID).await;
        assert!(matches!(result, Err(GoogleError::MissingEmail)));
    }

    #[tokio::test]
    async fn test_verify_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_token"
            })))
            .mount(&server)
            .await;

        let result = verifier_for(&server).await.verify("tok", CLIENT_ID).await;
        assert!(matches!(result, Err(GoogleError::TokenRejected(400))));
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = verifier_for(&server).await.verify("tok", CLIENT_ID).await;
        assert!(matches!(result, Err(GoogleError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_verify_network_failure_is_rejection() {
        // Nothing listens on the discard port
        let verifier = GoogleIdentityVerifier::new(test_client(), "http://127.0.0.1:9/tokeninfo");
        let result = verifier.verify("tok", CLIENT_ID).await;
        assert!(matches!(result, Err(GoogleError::RequestFailed(_))));
    }
}
