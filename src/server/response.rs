//! HTTP response types and utilities.

use std::fmt;
use std::io::Cursor;
use std::pin::Pin;

use serde::Serialize;
use tokio::io::AsyncRead;

use crate::parser::Method;
use crate::server::error::Error;
use crate::server::mime::Mime;
use crate::server::status::StatusCode;

/// A boxed byte source a response body can stream from.
pub type BodyReader = Pin<Box<dyn AsyncRead + Send>>;

/// Where a response body comes from.
///
/// Dropping a `Body` releases its source. The writer consumes the body, so
/// the source is released once the response has been sent or has failed.
pub enum Body {
    /// No body. Its length is known to be zero.
    Empty,
    /// An in-memory buffer.
    Bytes(Vec<u8>),
    /// A streaming source. `length` is `None` when the size is unknown up front.
    Stream {
        reader: BodyReader,
        length: Option<u64>,
    },
}

impl Body {
    /// The number of bytes the body will produce, if known up front.
    pub fn known_length(&self) -> Option<u64> {
        match self {
            Body::Empty => Some(0),
            Body::Bytes(bytes) => Some(bytes.len() as u64),
            Body::Stream { length, .. } => *length,
        }
    }

    /// Turn the body into a reader, whatever its source.
    pub fn into_reader(self) -> BodyReader {
        match self {
            Body::Empty => Box::pin(tokio::io::empty()),
            Body::Bytes(bytes) => Box::pin(Cursor::new(bytes)),
            Body::Stream { reader, .. } => reader,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Body::Empty"),
            Body::Bytes(bytes) => write!(f, "Body::Bytes({} bytes)", bytes.len()),
            Body::Stream { length, .. } => f
                .debug_struct("Body::Stream")
                .field("length", length)
                .finish_non_exhaustive(),
        }
    }
}

/// How a response body is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `Content-Length` framing. The connection stays open afterwards.
    ContentLength(u64),
    /// `Transfer-Encoding: chunked`. The connection closes afterwards.
    Chunked,
}

impl Framing {
    pub fn keeps_alive(&self) -> bool {
        matches!(self, Framing::ContentLength(_))
    }
}

/// Represents an HTTP response.
#[derive(Debug)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) content_type: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Body,
    pub(crate) chunked: bool,
    pub(crate) method: Option<Method>,
    pub(crate) auth_realm: Option<String>,
}

impl Response {
    /// Create a new HTTP response with the given status code and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            headers: Vec::new(),
            body: Body::Empty,
            chunked: false,
            method: None,
            auth_realm: None,
        }
    }

    /// A plain-text response.
    pub fn text(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status)
            .with_mime(Mime::PlainText)
            .with_body_string(message)
    }

    /// The default answer when no handler claims a request.
    pub fn not_found(path: &str) -> Self {
        Self::text(StatusCode::NotFound, format!("Not found: {path}"))
    }

    /// Set the response body with a string.
    pub fn with_body_string(self, body: impl Into<String>) -> Self {
        self.with_body_bytes(body.into().into_bytes())
    }

    /// Set the response body with bytes.
    pub fn with_body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Body::Bytes(body.into());
        self
    }

    /// Stream the body from a source of unknown length. Forces chunked framing.
    pub fn with_stream(mut self, reader: impl AsyncRead + Send + 'static) -> Self {
        self.body = Body::Stream {
            reader: Box::pin(reader),
            length: None,
        };
        self
    }

    /// Stream the body from a source that will produce exactly `length` bytes.
    pub fn with_sized_stream(mut self, reader: impl AsyncRead + Send + 'static, length: u64) -> Self {
        self.body = Body::Stream {
            reader: Box::pin(reader),
            length: Some(length),
        };
        self
    }

    /// Add or replace a header.
    ///
    /// Names compare case-insensitively. A replaced header keeps its original position.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the content type from the MIME table.
    pub fn with_mime(self, mime: Mime) -> Self {
        self.with_content_type(mime.as_str())
    }

    /// Set the response body with a JSON value.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(value)?;
        Ok(self.with_mime(Mime::Json).with_body_bytes(json))
    }

    /// Send the body chunked even if its length is known.
    pub fn chunked(mut self) -> Self {
        self.chunked = true;
        self
    }

    /// Challenge the client for Basic credentials in the given realm.
    pub fn with_basic_auth(mut self, realm: impl Into<String>) -> Self {
        self.auth_realm = Some(realm.into());
        self
    }

    /// Record the method of the request this response answers.
    ///
    /// A `HEAD` response is written with its headers but without its body.
    pub fn for_method(mut self, method: Option<Method>) -> Self {
        self.method = method;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The content type that will be sent, defaulting to plain text.
    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or(Mime::PlainText.as_str())
    }

    /// Extra headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn auth_realm(&self) -> Option<&str> {
        self.auth_realm.as_deref()
    }

    /// Decide the framing: `Content-Length` when the body length is known
    /// and chunking was not forced, chunked otherwise.
    pub fn framing(&self) -> Framing {
        match (self.chunked, self.body.known_length()) {
            (false, Some(length)) => Framing::ContentLength(length),
            _ => Framing::Chunked,
        }
    }
}
