// src/videos/mod.rs
//! Uploaded videos: upload URLs, registration and visibility-gated reads.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;


pub use routes::videos_routes;
