//! HTTP protocol versions.

use std::fmt;
use std::str::FromStr;

/// HTTP protocol versions recognised on a request line.
///
/// The server always answers with `HTTP/1.1`. The request's version only
/// affects whether headers are read and whether the connection is kept
/// alive by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
    Http20,
}

impl HttpVersion {
    /// Whether a client speaking this version expects keep-alive by default.
    pub fn keep_alive_by_default(&self) -> bool {
        !matches!(self, HttpVersion::Http10)
    }
}

/// Returned when a version token is not one of the known versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVersion(pub String);

impl fmt::Display for UnknownVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown HTTP version: {}", self.0)
    }
}

impl std::error::Error for UnknownVersion {}

impl FromStr for HttpVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP/1.0" => Ok(HttpVersion::Http10),
            "HTTP/1.1" => Ok(HttpVersion::Http11),
            "HTTP/2" | "HTTP/2.0" => Ok(HttpVersion::Http20),
            _ => Err(UnknownVersion(s.to_string())),
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpVersion::Http10 => write!(f, "HTTP/1.0"),
            HttpVersion::Http11 => write!(f, "HTTP/1.1"),
            HttpVersion::Http20 => write!(f, "HTTP/2"),
        }
    }
}
