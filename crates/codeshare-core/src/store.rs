//! # Session Store
//!
//! The in-memory map of live sessions.
//!
//! ## Expiry
//!
//! A session expires once it has gone `ttl_ms` without an update, get or
//! heartbeat. Expiry is enforced twice:
//!
//! - lazily, on every access by id (an expired session is removed and
//!   reported as not found);
//! - eagerly, by [`SessionStore::sweep_expired`], which the server runs on
//!   an interval so idle sessions do not hold memory.
//!
//! ## Determinism
//!
//! Sessions live in a `BTreeMap` and ids come from a seedable RNG, so a
//! store built with [`SessionStore::with_seed`] behaves identically run to
//! run.

use crate::DEFAULT_TTL_MS;
use crate::error::ShareError;
use crate::session::{Session, SessionId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Default maximum number of live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Default maximum content size in bytes (1 MiB).
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 1024 * 1024;

/// Attempts at drawing an unused id before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// Limits applied by a [`SessionStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Inactivity after which a session expires.
    pub ttl_ms: u64,
    /// Maximum number of live sessions.
    pub max_sessions: usize,
    /// Maximum content size in bytes.
    pub max_content_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            max_sessions: DEFAULT_MAX_SESSIONS,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
        }
    }
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Point-in-time view of the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Sessions currently held (including any not yet swept).
    pub sessions: usize,
    /// Sum of content lengths in bytes.
    pub content_bytes: usize,
    /// Sessions created since startup.
    pub sessions_created: u64,
    /// Sessions dropped by expiry since startup.
    pub sessions_expired: u64,
}

// =============================================================================
// SESSION STORE
// =============================================================================

/// Owns every live session.
#[derive(Debug)]
pub struct SessionStore {
    sessions: BTreeMap<SessionId, Session>,
    config: StoreConfig,
    rng: StdRng,
    sessions_created: u64,
    sessions_expired: u64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl SessionStore {
    /// Create an empty store seeded from the operating system.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create an empty store with a fixed id seed.
    pub fn with_seed(config: StoreConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: StoreConfig, rng: StdRng) -> Self {
        Self {
            sessions: BTreeMap::new(),
            config: StoreConfig {
                max_sessions: config.max_sessions.max(1),
                ..config
            },
            rng,
            sessions_created: 0,
            sessions_expired: 0,
        }
    }

    /// The limits this store enforces.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create a session holding `content` and return its id.
    pub fn create(&mut self, content: String, now: u64) -> Result<SessionId, ShareError> {
        self.check_content(&content)?;

        if self.sessions.len() >= self.config.max_sessions {
            self.sweep_expired(now);
            if self.sessions.len() >= self.config.max_sessions {
                return Err(ShareError::CapacityExhausted {
                    limit: self.config.max_sessions,
                });
            }
        }

        let id = self.fresh_id()?;
        self.sessions
            .insert(id.clone(), Session::new(id.clone(), content, now));
        self.sessions_created = self.sessions_created.saturating_add(1);
        Ok(id)
    }

    /// Replace the content of a session.
    pub fn update(&mut self, id: &str, content: String, now: u64) -> Result<(), ShareError> {
        self.check_content(&content)?;
        let session = self.live_mut(id, now)?;
        session.content = content;
        session.touch(now);
        Ok(())
    }

    /// Read the latest content of a session.
    pub fn get(&mut self, id: &str, now: u64) -> Result<&str, ShareError> {
        let session = self.live_mut(id, now)?;
        session.touch(now);
        Ok(&session.content)
    }

    /// Keep a session alive without reading or writing it.
    pub fn heartbeat(&mut self, id: &str, now: u64) -> Result<(), ShareError> {
        self.live_mut(id, now)?.touch(now);
        Ok(())
    }

    /// Look at a held session without counting it as an access. Ignores
    /// expiry.
    #[cfg(test)]
    pub(crate) fn peek(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let ttl = self.config.ttl_ms;
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now, ttl));
        let removed = before - self.sessions.len();
        self.sessions_expired = self.sessions_expired.saturating_add(removed as u64);
        removed
    }

    /// Number of sessions held.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Ids of all held sessions, in order, expired or not.
    #[cfg(test)]
    pub(crate) fn ids(&self) -> impl Iterator<Item = &SessionId> {
        self.sessions.keys()
    }

    /// Current statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            sessions: self.sessions.len(),
            content_bytes: self.sessions.values().map(|s| s.content.len()).sum(),
            sessions_created: self.sessions_created,
            sessions_expired: self.sessions_expired,
        }
    }

    fn check_content(&self, content: &str) -> Result<(), ShareError> {
        if content.len() > self.config.max_content_bytes {
            return Err(ShareError::ContentTooLarge {
                size: content.len(),
                limit: self.config.max_content_bytes,
            });
        }
        Ok(())
    }

    /// Resolve a live session, removing it first if it has expired.
    fn live_mut(&mut self, id: &str, now: u64) -> Result<&mut Session, ShareError> {
        let expired = match self.sessions.get(id) {
            None => return Err(ShareError::SessionNotFound(id.to_string())),
            Some(session) => session.is_expired(now, self.config.ttl_ms),
        };

        if expired {
            self.sessions.remove(id);
            self.sessions_expired = self.sessions_expired.saturating_add(1);
            return Err(ShareError::SessionNotFound(id.to_string()));
        }

        self.sessions
            .get_mut(id)
            .ok_or_else(|| ShareError::SessionNotFound(id.to_string()))
    }

    fn fresh_id(&mut self) -> Result<SessionId, ShareError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = SessionId::generate(&mut self.rng);
            if !self.sessions.contains_key(&id) {
                return Ok(id);
            }
        }
        Err(ShareError::CapacityExhausted {
            limit: self.config.max_sessions,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
