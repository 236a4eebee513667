//! HTTP request parser module.
//!
//! Turns a byte stream positioned at the start of a request into a
//! [`Request`]: method, decoded path, query parameters and lowercase
//! headers. The body is left on the stream for the caller.

mod decode;
mod error;
mod method;
mod request;
mod tests;
mod version;

// Re-export public items
pub use decode::{decode_path, decode_query_component, parse_query};
pub use error::Error;
pub use method::{Method, UnknownMethod};
pub use request::{parse_request, read_body, Limits, Request};
pub use version::{HttpVersion, UnknownVersion};
