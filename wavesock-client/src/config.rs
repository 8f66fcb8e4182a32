//! Client configuration
//!
//! Configuration is an explicit value passed into the client
//! constructor, never process-wide state, so any target and origin can
//! be exercised in tests.

use std::time::Duration;
use wavesock_core::error::ConfigError;
use wavesock_core::protocol::constants::{DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_IO_TIMEOUT};
use wavesock_core::{Error, Result};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Target authority (`host:port`)
    pub host: String,
    /// Request path
    pub path: String,
    /// Origin header value
    pub origin: String,
    /// Handshake timeout
    pub handshake_timeout: Duration,
    /// Per-operation I/O timeout after the upgrade
    pub io_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8080".to_string(),
            path: "/ws".to_string(),
            origin: "http://localhost:8080".to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() || !self.host.contains(':') {
            return Err(Error::Config(ConfigError::Validation(
                "host must be a host:port authority".to_string(),
            )));
        }

        if !self.path.starts_with('/') {
            return Err(Error::Config(ConfigError::Validation(
                "path must start with '/'".to_string(),
            )));
        }

        if self.origin.is_empty() {
            return Err(Error::Config(ConfigError::Validation(
                "origin must not be empty".to_string(),
            )));
        }

        if self.handshake_timeout.is_zero() {
            return Err(Error::Config(ConfigError::Validation(
                "handshake_timeout must be greater than 0".to_string(),
            )));
        }

        Ok(())
    }

    /// Set the target authority
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the request path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the Origin header value
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the post-upgrade I/O timeout
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }
}
