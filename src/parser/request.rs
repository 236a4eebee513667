//! HTTP request parsing and representation.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt};

use crate::parser::decode::{decode_path, encode_path, encode_query_component, parse_query};
use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Size limits applied while reading a request off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Longest request line or header line accepted, excluding the line terminator.
    pub max_line_length: usize,
    /// Largest `Content-Length` accepted.
    pub max_body_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line_length: 8192,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

/// Represents a parsed HTTP request.
///
/// Requests are handed to handlers behind an `Arc` and never change after
/// parsing. The body holds whatever the connection read after the head,
/// as declared by `Content-Length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method_name: String,
    method: Option<Method>,
    path: String,
    query: Vec<(String, String)>,
    version: Option<HttpVersion>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Request {
    /// Create a new request from already-decoded parts.
    ///
    /// Header names are lowercased. Later duplicates in `headers` replace earlier ones.
    pub fn new(
        method_name: impl Into<String>,
        path: impl Into<String>,
        query: Vec<(String, String)>,
        version: Option<HttpVersion>,
        headers: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let method_name = method_name.into();
        Self {
            method: Method::lookup(&method_name),
            method_name,
            path: path.into(),
            query,
            version,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            body: Vec::new(),
        }
    }

    /// Attach a body to the request.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// The recognised method, or `None` if the method token is unknown.
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    /// The method token exactly as it appeared on the request line.
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// The percent-decoded request path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded query parameters in order of first appearance.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Get a query parameter value.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_param(name).is_some()
    }

    /// The version token, if present and recognised.
    pub fn version(&self) -> Option<HttpVersion> {
        self.version
    }

    /// All headers, keyed by lowercase name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Gets a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Checks if the request has a specific header (case-insensitive).
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// The request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// How many body bytes follow the request head.
    ///
    /// Fails when `Content-Length` is not a number, or when the client used a
    /// transfer coding, which this server does not decode.
    pub fn body_length(&self) -> Result<Option<u64>, Error> {
        if let Some(coding) = self.header("transfer-encoding") {
            return Err(Error::UnsupportedTransferEncoding(coding.to_string()));
        }

        match self.header("content-length") {
            None => Ok(None),
            Some(value) => value
                .parse::<u64>()
                .map(Some)
                .map_err(|_| Error::InvalidContentLength(value.to_string())),
        }
    }

    /// Whether the client is willing to send another request on this connection.
    pub fn wants_keep_alive(&self) -> bool {
        if let Some(connection) = self.header("connection") {
            let tokens = connection.to_ascii_lowercase();
            if tokens.split(',').any(|t| t.trim() == "close") {
                return false;
            }
            if tokens.split(',').any(|t| t.trim() == "keep-alive") {
                return true;
            }
        }

        self.version
            .is_some_and(|version| version.keep_alive_by_default())
    }

    /// Check if the request has a JSON body.
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .is_some_and(|content_type| content_type.starts_with("application/json"))
    }

    /// Parse the request body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(Error::MissingHeader("Content-Type: application/json".to_string()));
        }

        let json = serde_json::from_slice(&self.body)?;
        Ok(json)
    }

    /// Serialize the request line and headers back into wire form.
    ///
    /// The path and query are percent-encoded, so parsing the result yields
    /// an equal request (minus the body). Without a version token no header
    /// section is written, matching what the parser would read.
    pub fn encode_head(&self) -> Vec<u8> {
        let mut target = encode_path(&self.path);
        if !self.query.is_empty() {
            let pairs: Vec<String> = self
                .query
                .iter()
                .map(|(name, value)| {
                    format!(
                        "{}={}",
                        encode_query_component(name),
                        encode_query_component(value)
                    )
                })
                .collect();
            target.push('?');
            target.push_str(&pairs.join("&"));
        }

        let mut head = format!("{} {}", self.method_name, target);
        if let Some(version) = self.version {
            head.push_str(&format!(" {version}\r\n"));
            for (name, value) in &self.headers {
                head.push_str(&format!("{name}: {value}\r\n"));
            }
        }
        head.push_str("\r\n");

        head.into_bytes()
    }
}

/// Read one request head (request line and headers) from a stream.
///
/// Returns `Ok(None)` when the stream is already at EOF, meaning the peer
/// closed the connection between requests. The body is left unread in the
/// stream. Use [`read_body`] for it.
pub async fn parse_request<R>(reader: &mut R, limits: &Limits) -> Result<Option<Request>, Error>
where
    R: AsyncBufRead + Unpin,
{
    let Some(line) = read_line(reader, limits.max_line_length, "request line").await? else {
        return Ok(None);
    };

    let mut tokens = line.split_whitespace();
    let method_name = tokens.next().ok_or(Error::MissingMethod)?;
    let target = tokens.next().ok_or(Error::MissingTarget)?;
    let version_token = tokens.next();

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (decode_path(path), parse_query(query)),
        None => (decode_path(target), Vec::new()),
    };

    // Without a version token this is a bare request line with no headers.
    let mut headers = HashMap::new();
    if version_token.is_some() {
        while let Some(line) = read_line(reader, limits.max_line_length, "header line").await? {
            if line.trim().is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }
    }

    Ok(Some(Request {
        method: Method::lookup(method_name),
        method_name: method_name.to_string(),
        path,
        query,
        version: version_token.and_then(|token| token.parse().ok()),
        headers,
        body: Vec::new(),
    }))
}

/// Read exactly `length` body bytes following a request head.
pub async fn read_body<R>(reader: &mut R, length: u64, limits: &Limits) -> Result<Vec<u8>, Error>
where
    R: AsyncRead + Unpin,
{
    if length > limits.max_body_size as u64 {
        return Err(Error::BodyTooLarge {
            length,
            limit: limits.max_body_size,
        });
    }

    let mut body = Vec::with_capacity(length as usize);
    let received = (&mut *reader).take(length).read_to_end(&mut body).await? as u64;
    if received < length {
        return Err(Error::IncompleteBody {
            expected: length,
            received,
        });
    }

    Ok(body)
}

/// Read a CRLF- or LF-terminated line, without its terminator.
///
/// `None` means EOF before any byte. A final line cut off by EOF is returned as-is.
async fn read_line<R>(reader: &mut R, limit: usize, what: &'static str) -> Result<Option<String>, Error>
where
    R: AsyncBufRead + Unpin,
{
    // Room for the content plus "\r\n".
    let cap = limit as u64 + 2;
    let mut line = Vec::new();
    let read = (&mut *reader).take(cap).read_until(b'\n', &mut line).await?;
    if read == 0 {
        return Ok(None);
    }

    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    } else if read as u64 >= cap {
        return Err(Error::LineTooLong { what, limit });
    }

    if line.len() > limit {
        return Err(Error::LineTooLong { what, limit });
    }

    String::from_utf8(line).map(Some).map_err(|_| Error::InvalidEncoding)
}
