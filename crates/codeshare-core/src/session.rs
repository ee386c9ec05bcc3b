//! # Session Module
//!
//! Session records and their identifiers.

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Number of characters in a generated session identifier.
pub const SESSION_ID_LEN: usize = 8;

// =============================================================================
// SESSION ID
// =============================================================================

/// Identifier of a shared session.
///
/// Generated ids are [`SESSION_ID_LEN`] characters from `[A-Za-z0-9]`.
/// Ids received from clients are not validated against that shape: an id
/// that was never generated simply does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a random identifier.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id = rng
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LEN)
            .map(char::from)
            .collect();
        Self(id)
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id has the shape of a generated one.
    pub fn is_well_formed(id: &str) -> bool {
        id.len() == SESSION_ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// A shared text session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Latest content; last write wins.
    pub content: String,
    /// Unix ms of the most recent update, get or heartbeat.
    pub last_accessed: u64,
    /// Unix ms when the session was created.
    pub created_at: u64,
}

impl Session {
    /// Create a session accessed at `now`.
    pub fn new(id: SessionId, content: String, now: u64) -> Self {
        Self {
            id,
            content,
            last_accessed: now,
            created_at: now,
        }
    }

    /// Record an access at `now`. Never moves the timestamp backwards.
    pub fn touch(&mut self, now: u64) {
        self.last_accessed = self.last_accessed.max(now);
    }

    /// Whether the session has been idle for at least `ttl_ms` at `now`.
    pub fn is_expired(&self, now: u64, ttl_ms: u64) -> bool {
        now.saturating_sub(self.last_accessed) >= ttl_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_ids_have_expected_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let id = SessionId::generate(&mut rng);
            assert!(SessionId::is_well_formed(id.as_str()), "bad id {}", id);
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = SessionId::generate(&mut StdRng::seed_from_u64(42));
        let b = SessionId::generate(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn well_formed_rejects_other_shapes() {
        assert!(!SessionId::is_well_formed(""));
        assert!(!SessionId::is_well_formed("abc"));
        assert!(!SessionId::is_well_formed("abcd-efg"));
        assert!(!SessionId::is_well_formed("abcdefghi"));
        assert!(SessionId::is_well_formed("Ab3dE6gH"));
    }

    #[test]
    fn touch_is_monotonic() {
        let mut session = Session::new("Ab3dE6gH".into(), String::new(), 1_000);
        session.touch(5_000);
        assert_eq!(session.last_accessed, 5_000);
        session.touch(2_000);
        assert_eq!(session.last_accessed, 5_000);
        assert_eq!(session.created_at, 1_000);
    }

    #[test]
    fn expiry_boundary() {
        let session = Session::new("Ab3dE6gH".into(), String::new(), 1_000);
        assert!(!session.is_expired(1_999, 1_000));
        assert!(session.is_expired(2_000, 1_000));
        // Clock behind the record never expires it.
        assert!(!session.is_expired(0, 1_000));
    }

    #[test]
    fn id_serializes_as_plain_string() {
        let id = SessionId::from("Ab3dE6gH");
        assert_eq!(serde_json::to_string(&id).unwrap_or_default(), "\"Ab3dE6gH\"");
    }
}
