// src/streams/mod.rs
//! Live streams: creation, the idle -> live -> ended lifecycle and playback.

pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod routes;


pub use lifecycle::StreamLifecycle;
pub use routes::streams_routes;
