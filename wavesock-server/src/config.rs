//! Server configuration
//!
//! The allowed origin and greeting are plain configuration values
//! handed to the server constructor; nothing here is process-wide
//! state.

use std::time::Duration;
use wavesock_core::error::ConfigError;
use wavesock_core::protocol::constants::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_IO_TIMEOUT, MAX_HEADER_SIZE, MAX_SINGLE_FRAME_PAYLOAD,
};
use wavesock_core::{Error, Result};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub bind_address: std::net::SocketAddr,
    /// The exact Origin header value upgrades must present
    pub allowed_origin: String,
    /// Text payload sent in the single frame after a successful upgrade
    pub greeting: String,
    /// Handshake timeout
    pub handshake_timeout: Duration,
    /// Per-operation I/O timeout after the upgrade
    pub io_timeout: Duration,
    /// Maximum inbound handshake header block size
    pub max_header_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".parse().expect("static addr parses"),
            allowed_origin: "http://localhost:8080".to_string(),
            greeting: "Hello World".to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
            max_header_size: MAX_HEADER_SIZE,
        }
    }
}

impl ServerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.allowed_origin.is_empty() {
            return Err(Error::Config(ConfigError::Validation(
                "allowed_origin must not be empty".to_string(),
            )));
        }

        // the greeting must fit a single small frame
        if self.greeting.len() > MAX_SINGLE_FRAME_PAYLOAD {
            return Err(Error::Config(ConfigError::Validation(format!(
                "greeting must be at most {} bytes",
                MAX_SINGLE_FRAME_PAYLOAD
            ))));
        }

        if self.max_header_size == 0 {
            return Err(Error::Config(ConfigError::Validation(
                "max_header_size must be greater than 0".to_string(),
            )));
        }

        if self.handshake_timeout.is_zero() {
            return Err(Error::Config(ConfigError::Validation(
                "handshake_timeout must be greater than 0".to_string(),
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.allowed_origin, "http://localhost:8080");
        assert_eq!(config.greeting, "Hello World");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.allowed_origin = String::new();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.greeting = "x".repeat(126);
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.greeting = "x".repeat(125);
        assert!(config.validate().is_ok());

        let mut config = ServerConfig::default();
        config.max_header_size = 0;
        assert!(config.validate().is_err());
    }
}
