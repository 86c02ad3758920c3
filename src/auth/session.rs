//! Session credential codec
//!
//! Session credentials are compact HS256 JWTs carrying `{userId, email, exp}`.
//! They are self-contained: nothing is persisted, and a credential stays valid
//! until `exp` passes.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims embedded in a session credential
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    pub exp: i64,
}

/// The identity a verified credential vouches for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to sign session credential: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("session lifetime of {0} seconds overflows the expiry timestamp")]
    ExpiryOverflow(i64),

    // Deliberately carries no reason
    #[error("session credential rejected")]
    Rejected,
}

#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec")
            .field("algorithm", &SESSION_ALGORITHM)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    /// Issues a credential with the configured lifetime.
    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, SessionError> {
        self.issue_with_ttl(user_id, email, self.ttl_seconds)
    }

    pub fn issue_with_ttl(
        &self,
        user_id: &str,
        email: &str,
        ttl_seconds: i64,
    ) -> Result<String, SessionError> {
        let exp = Utc::now()
            .timestamp()
            .checked_add(ttl_seconds)
            .ok_or(SessionError::ExpiryOverflow(ttl_seconds))?;

        let claims = Claims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            exp,
        };

        Ok(encode(
            &Header::new(SESSION_ALGORITHM),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Verifies signature, algorithm and expiry.
    ///
    /// Expiry is exact: no leeway, and a credential whose `exp` equals the
    /// current second is already expired.
    pub fn verify(&self, token: &str) -> Result<SessionIdentity, SessionError> {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!(error = %e, "Session credential failed validation");
            SessionError::Rejected
        })?;

        if data.claims.exp <= Utc::now().timestamp() {
            debug!(exp = data.claims.exp, "Session credential expired");
            return Err(SessionError::Rejected);
        }

        Ok(SessionIdentity {
            user_id: data.claims.user_id,
            email: data.claims.email,
        })
    }
}
