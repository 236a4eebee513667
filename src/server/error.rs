//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::Error as ParserError;

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A body source with a declared length ran dry before that many bytes were sent.
    #[error("Response body ended after {sent} of {expected} bytes")]
    ShortBody { expected: u64, sent: u64 },

    /// The server or a helper was configured with unusable values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The bind host could not be resolved to an address.
    #[error("Could not resolve bind address {0}")]
    AddrResolve(String),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
