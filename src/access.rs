// src/access.rs
//! Ownership and visibility rules for videos and streams.
//!
//! Ownership is the only authorization relationship: a resource has exactly
//! one owner for its lifetime, and there is no admin override. Owner checks
//! always compare against the stored `user_id`, never a caller-supplied one.

use crate::common::ApiError;

/// Who may read a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAccess {
    /// Anyone, including anonymous callers
    Anyone,
    /// Any authenticated caller
    Authenticated,
    /// The owner only
    OwnerOnly,
}

pub trait OwnedResource {
    fn owner_user_id(&self) -> &str;

    fn read_access(&self) -> ReadAccess;
}

/// Whether `caller` may read `resource`. A refusal carries the precise
/// failure: `Unauthorized` when the caller is anonymous and must sign in,
/// `Forbidden` when an authenticated caller is not the owner.
pub fn authorize_read<R: OwnedResource>(resource: &R, caller: Option<&str>) -> Result<(), ApiError> {
    match (resource.read_access(), caller) {
        (ReadAccess::Anyone, _) => Ok(()),
        (_, None) => Err(ApiError::unauthenticated()),
        (ReadAccess::Authenticated, Some(_)) => Ok(()),
        (ReadAccess::OwnerOnly, Some(caller)) if caller == resource.owner_user_id() => Ok(()),
        (ReadAccess::OwnerOnly, Some(_)) => Err(ApiError::forbidden()),
    }
}

/// Only the owner may mutate.
pub fn can_mutate<R: OwnedResource>(resource: &R, caller: Option<&str>) -> bool {
    matches!(caller, Some(caller) if caller == resource.owner_user_id())
}
