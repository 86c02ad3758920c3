// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXXXXXXXXXXXX (e.g., V_K7NP3X8MWQT2HJ4R for videos)
//!
//! Sixteen random characters carry 80 bits, so an id is never handed out
//! twice in practice; the primary keys in the record store back that up.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const ID_LENGTH: usize = 16;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// User (U_)
    User,
    /// Video (V_)
    Video,
    /// Live stream (L_)
    Stream,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Video => "V",
            EntityPrefix::Stream => "L",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(ID_LENGTH))
}

/// Generate a User ID (U_XXXXXXXXXXXXXXXX)
pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

/// Generate a Video ID (V_XXXXXXXXXXXXXXXX)
pub fn generate_video_id() -> String {
    generate_id(EntityPrefix::Video)
}

/// Generate a Stream ID (L_XXXXXXXXXXXXXXXX)
pub fn generate_stream_id() -> String {
    generate_id(EntityPrefix::Stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_format() {
        let id = generate_user_id();
        assert!(id.starts_with("U_"));
        assert_eq!(id.len(), 2 + ID_LENGTH);
        assert!(id[2..]
            .bytes()
            .all(|b| CROCKFORD_ALPHABET.contains(&b)));

        assert!(generate_video_id().starts_with("V_"));
        assert!(generate_stream_id().starts_with("L_"));
    }

    #[test]
    fn test_ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_stream_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
