//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur while reading an HTTP request off a stream.
///
/// Every variant except [`Error::Io`] describes a protocol problem the
/// server can answer with an error response.
#[derive(Debug, Error)]
pub enum Error {
    /// The request line has no method token.
    #[error("Bad request: missing method")]
    MissingMethod,

    /// The request line has a method but no request target.
    #[error("Bad request: missing request target")]
    MissingTarget,

    /// The request line or a header line exceeds the configured limit.
    #[error("{what} exceeds {limit} bytes")]
    LineTooLong {
        /// Which line overflowed ("request line" or "header line").
        what: &'static str,
        limit: usize,
    },

    /// The request head is not valid UTF-8.
    #[error("Request head is not valid UTF-8")]
    InvalidEncoding,

    /// The Content-Length header is not a non-negative integer.
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// The declared body is larger than the configured limit.
    #[error("Request body of {length} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { length: u64, limit: usize },

    /// The peer closed the stream before sending the declared body.
    #[error("Request body ended after {received} of {expected} bytes")]
    IncompleteBody { expected: u64, received: u64 },

    /// Request bodies with a transfer coding are not supported.
    #[error("Unsupported Transfer-Encoding: {0}")]
    UnsupportedTransferEncoding(String),

    /// A required header is missing from the request.
    #[error("Required header is missing: {0}")]
    MissingHeader(String),

    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing JSON.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
