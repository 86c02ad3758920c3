// src/services/mod.rs
//
// Clients for the identity provider, object storage and the live-video
// provider, plus the user directory backed by the record store.

pub mod google;
pub mod live_video;
pub mod storage;
pub mod users;

// Re-export commonly used types for convenience
pub use google::GoogleIdentityVerifier;
pub use live_video::LiveVideoService;
pub use storage::StorageService;
pub use users::UserDirectory;
