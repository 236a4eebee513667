//! HTTP Basic authentication for handlers.
//!
//! The server core never checks credentials. A handler consults a
//! [`BasicAuth`] and either answers with [`BasicAuth::challenge`] or serves
//! the protected resource; [`protect`] packages that pattern.
//!
//! ```
//! use pocket_httpd::{BasicAuth, Request};
//!
//! let auth = BasicAuth::new("admin area").unwrap()
//!     .with_account("admin", "s3cret").unwrap();
//!
//! let request = Request::new(
//!     "GET", "/admin", Vec::new(), None,
//!     [("authorization".to_string(), "Basic YWRtaW46czNjcmV0".to_string())],
//! );
//! assert!(auth.authorize(&request));
//! assert!(!auth.validate("admin", "guess"));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use log::debug;
use sha2::{Digest, Sha256};

use crate::parser::Request;
use crate::server::error::Error;
use crate::server::handler::HandlerFuture;
use crate::server::response::Response;
use crate::server::status::StatusCode;

type PasswordDigest = [u8; 32];

/// A realm and the accounts allowed into it.
///
/// Passwords are stored only as SHA-256 digests. The value is immutable once
/// shared; adding an account builds a new one.
#[derive(Clone)]
pub struct BasicAuth {
    realm: String,
    accounts: HashMap<String, PasswordDigest>,
}

impl BasicAuth {
    /// Create a realm with no accounts.
    pub fn new(realm: impl Into<String>) -> Result<Self, Error> {
        let realm = realm.into();
        if realm.trim().is_empty() {
            return Err(Error::InvalidConfig("realm must not be empty".to_string()));
        }
        if realm.contains(['"', '\r', '\n']) {
            return Err(Error::InvalidConfig(format!("realm contains a forbidden character: {realm:?}")));
        }

        Ok(Self {
            realm,
            accounts: HashMap::new(),
        })
    }

    /// Add or replace an account.
    pub fn with_account(mut self, username: impl Into<String>, password: impl AsRef<str>) -> Result<Self, Error> {
        let username = username.into();
        let password = password.as_ref();
        if username.is_empty() || username.contains(':') {
            return Err(Error::InvalidConfig(
                "username must be non-empty and must not contain ':'".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(Error::InvalidConfig(format!("empty password for {username}")));
        }

        self.accounts.insert(username, digest(password));
        Ok(self)
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// True only for a known user with exactly this password.
    pub fn validate(&self, username: &str, password: &str) -> bool {
        let offered = digest(password);
        match self.accounts.get(username) {
            Some(expected) => constant_time_eq(expected, &offered),
            None => false,
        }
    }

    /// Decode the `Authorization: Basic ...` credentials of a request.
    pub fn credentials(request: &Request) -> Option<(String, String)> {
        let header = request.header("authorization")?;
        let (scheme, encoded) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = String::from_utf8(base64_decode(encoded.trim())?).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some((username.to_string(), password.to_string()))
    }

    pub fn authorize(&self, request: &Request) -> bool {
        Self::credentials(request).is_some_and(|(username, password)| self.validate(&username, &password))
    }

    /// A 401 response asking for credentials in this realm.
    pub fn challenge(&self) -> Response {
        Response::text(StatusCode::Unauthorized, "Authentication required").with_basic_auth(&self.realm)
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("realm", &self.realm)
            .field("accounts", &self.accounts.len())
            .finish()
    }
}

/// Wrap a handler so it only runs for authorized requests.
///
/// Unauthorized requests get the realm's challenge.
pub fn protect<F, Fut>(auth: BasicAuth, handler: F) -> impl Fn(Arc<Request>) -> HandlerFuture + Send + Sync + 'static
where
    F: Fn(Arc<Request>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Response>, Error>> + Send + 'static,
{
    let auth = Arc::new(auth);
    let handler = Arc::new(handler);

    move |request: Arc<Request>| -> HandlerFuture {
        let auth = Arc::clone(&auth);
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            if auth.authorize(&request) {
                handler(request).await
            } else {
                debug!("Unauthorized request for {path} in realm {realm}", path = request.path(), realm = auth.realm());
                Ok(Some(auth.challenge()))
            }
        })
    }
}

fn digest(password: &str) -> PasswordDigest {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(password.as_bytes()));
    out
}

fn constant_time_eq(a: &PasswordDigest, b: &PasswordDigest) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn base64_value(byte: u8) -> Option<u32> {
    match byte {
        b'A'..=b'Z' => Some((byte - b'A') as u32),
        b'a'..=b'z' => Some((byte - b'a') as u32 + 26),
        b'0'..=b'9' => Some((byte - b'0') as u32 + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Decode standard base64, padded or not.
fn base64_decode(input: &str) -> Option<Vec<u8>> {
    let data = input.trim_end_matches('=').as_bytes();
    if data.len() % 4 == 1 {
        return None;
    }

    let mut out = Vec::with_capacity(data.len() * 3 / 4);
    for chunk in data.chunks(4) {
        let mut n = 0u32;
        for (i, &byte) in chunk.iter().enumerate() {
            n |= base64_value(byte)? << (18 - 6 * i);
        }
        out.push((n >> 16) as u8);
        if chunk.len() > 2 {
            out.push((n >> 8) as u8);
        }
        if chunk.len() > 3 {
            out.push(n as u8);
        }
    }
    Some(out)
}
