//! # Server Configuration
//!
//! Runtime settings for `codeshare serve`. Values come from CLI flags with
//! `CODESHARE_*` environment fallbacks (see [`crate::cli::ServeArgs`]) and
//! are validated here before the server starts.

use codeshare_core::StoreConfig;
use codeshare_core::store::{DEFAULT_MAX_CONTENT_BYTES, DEFAULT_MAX_SESSIONS};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default session time-to-live (24 hours).
pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

/// Default interval between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Default sustained API request rate (requests per second).
pub const DEFAULT_RATE_LIMIT_PER_SEC: u32 = 200;

/// Default API request burst.
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 400;

/// Invalid server configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),

    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Settings for the HTTP server and its session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Idle time after which a session expires.
    pub ttl_secs: u64,
    /// How often expired sessions are swept.
    pub sweep_interval_secs: u64,
    pub max_sessions: usize,
    pub max_content_bytes: usize,
    /// Sustained API requests per second; 0 disables rate limiting.
    pub rate_limit_per_sec: u32,
    pub rate_limit_burst: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            ttl_secs: DEFAULT_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            max_sessions: DEFAULT_MAX_SESSIONS,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            rate_limit_per_sec: DEFAULT_RATE_LIMIT_PER_SEC,
            rate_limit_burst: DEFAULT_RATE_LIMIT_BURST,
        }
    }
}

impl ServerConfig {
    /// Check every field; returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "ttl_secs",
                reason: "must be at least 1",
            });
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "sweep_interval_secs",
                reason: "must be at least 1",
            });
        }
        if self.max_sessions == 0 {
            return Err(ConfigError::Invalid {
                field: "max_sessions",
                reason: "must be at least 1",
            });
        }
        if self.max_content_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_content_bytes",
                reason: "must be at least 1",
            });
        }
        if self.rate_limit_per_sec > 0 && self.rate_limit_burst < self.rate_limit_per_sec {
            return Err(ConfigError::Invalid {
                field: "rate_limit_burst",
                reason: "must not be below rate_limit_per_sec",
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            ttl_ms: self.ttl_secs.saturating_mul(1000),
            max_sessions: self.max_sessions,
            max_content_bytes: self.max_content_bytes,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Largest request body accepted. JSON escaping can inflate content, so
    /// this is well above the content limit itself.
    pub fn body_limit(&self) -> usize {
        self.max_content_bytes
            .saturating_mul(2)
            .saturating_add(64 * 1024)
    }

    /// `(rate, burst)` for the API rate limiter, `None` when disabled.
    pub fn rate_limit(&self) -> Option<(NonZeroU32, NonZeroU32)> {
        let rate = NonZeroU32::new(self.rate_limit_per_sec)?;
        let burst = NonZeroU32::new(self.rate_limit_burst).unwrap_or(rate);
        Some((rate, burst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.store_config(), StoreConfig::default());
    }

    #[test]
    fn bad_host_rejected() {
        let config = ServerConfig {
            host: "not-an-ip".into(),
            ..ServerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidAddress("not-an-ip".into()))
        );
    }

    #[test]
    fn zero_limits_rejected() {
        let config = ServerConfig {
            ttl_secs: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "ttl_secs", .. })
        ));

        let config = ServerConfig {
            max_content_bytes: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rate_limit_can_be_disabled() {
        let config = ServerConfig {
            rate_limit_per_sec: 0,
            rate_limit_burst: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
        assert!(config.rate_limit().is_none());
    }

    #[test]
    fn burst_below_rate_rejected() {
        let config = ServerConfig {
            rate_limit_per_sec: 10,
            rate_limit_burst: 5,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn ipv6_host_parses() {
        let config = ServerConfig {
            host: "::1".into(),
            port: 9000,
            ..ServerConfig::default()
        };
        assert_eq!(
            config.socket_addr().map(|a| a.to_string()),
            Ok("[::1]:9000".to_string())
        );
    }
}
