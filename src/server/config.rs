//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::parser::Limits;
use crate::server::error::Error;

/// HTTP server configuration.
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes:
///
/// ```
/// use pocket_httpd::ServerConfig;
///
/// let config = ServerConfig::from_json(r#"{ "port": 9000, "read_timeout_ms": 2000 }"#).unwrap();
/// assert_eq!(config.port, 9000);
/// assert_eq!(config.backlog, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind. `None` or an empty string binds all interfaces.
    pub host: Option<String>,
    /// Port to bind. `0` asks the OS for a free port.
    pub port: u16,
    /// Listen backlog for pending connections.
    pub backlog: u32,
    /// How long a worker waits for the next request before closing the connection.
    pub read_timeout_ms: u64,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// Longest request or header line accepted.
    pub max_line_length: usize,
    /// Largest request body accepted.
    pub max_body_size: usize,
    /// Pause after a failed accept before trying again.
    pub accept_backoff_ms: u64,
    /// How long `stop()` waits for closed connections to unregister.
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            host: None,
            port: 8080,
            backlog: 50,
            read_timeout_ms: 5_000,
            max_connections: 1024,
            max_line_length: limits.max_line_length,
            max_body_size: limits.max_body_size,
            accept_backoff_ms: 50,
            shutdown_timeout_ms: 5_000,
        }
    }
}

impl ServerConfig {
    /// Load a configuration from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: ServerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_connections == 0 {
            return Err(Error::InvalidConfig("max_connections must be at least 1".to_string()));
        }
        if self.max_line_length == 0 {
            return Err(Error::InvalidConfig("max_line_length must be at least 1".to_string()));
        }
        if self.read_timeout_ms == 0 {
            return Err(Error::InvalidConfig("read_timeout_ms must be at least 1".to_string()));
        }
        Ok(())
    }

    /// The host to resolve for binding, with an absent host meaning all interfaces.
    pub fn bind_host(&self) -> &str {
        match self.host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => host,
            _ => "0.0.0.0",
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn accept_backoff(&self) -> Duration {
        Duration::from_millis(self.accept_backoff_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Parser limits derived from this configuration.
    pub fn limits(&self) -> Limits {
        Limits {
            max_line_length: self.max_line_length,
            max_body_size: self.max_body_size,
        }
    }
}
