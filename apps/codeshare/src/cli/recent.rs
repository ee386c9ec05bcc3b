//! The recently used session, remembered across invocations.
//!
//! Stored as a small JSON file under the user data directory. A record older
//! than [`MAX_AGE_MS`] or one that fails to parse is removed on load.

use codeshare_core::DEFAULT_TTL_MS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Records older than this are discarded.
pub const MAX_AGE_MS: u64 = DEFAULT_TTL_MS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSession {
    pub session_id: String,
    pub content: String,
    /// Unix milliseconds when the record was written.
    pub timestamp: u64,
}

impl RecentSession {
    pub fn new(session_id: impl Into<String>, content: impl Into<String>, now: u64) -> Self {
        Self {
            session_id: session_id.into(),
            content: content.into(),
            timestamp: now,
        }
    }
}

/// `<data dir>/codeshare/session.json`, if the platform has a data dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("codeshare").join("session.json"))
}

pub fn save(path: &Path, recent: &RecentSession) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(recent).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

/// Load the record at `path` if it is present, readable and fresh.
pub fn load(path: &Path, now: u64) -> Option<RecentSession> {
    let bytes = std::fs::read(path).ok()?;

    let fresh = serde_json::from_slice::<RecentSession>(&bytes)
        .ok()
        .filter(|r| now.saturating_sub(r.timestamp) < MAX_AGE_MS);

    if fresh.is_none() {
        tracing::debug!(path = %path.display(), "discarding stale recent session");
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), "could not remove recent session: {}", e);
        }
    }
    fresh
}
