//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

/// Google ID token payload for sign-in
#[derive(Deserialize, Debug)]
pub struct GoogleIdTokenPayload {
    pub id_token: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct SignInUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct SignInResponse {
    pub token: String,
    pub user: SignInUser,
}
