//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Google ID token sign-in
//! - Session credential issuance and verification
//! - AuthedUser extractor for protected routes

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod session;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use routes::auth_routes;
pub use session::SessionCodec;
