//! HTTP server implementation for pocket-httpd.
//!
//! One task accepts connections and one task per connection runs the
//! read/dispatch/write loop. Responses are framed with `Content-Length`
//! when the body length is known and chunked otherwise.

mod auth;
mod config;
mod connection;
mod error;
mod handler;
mod http_server;
mod mime;
mod registry;
mod response;
mod status;
mod storage;
mod writer;

// Re-export public items
pub use auth::{protect, BasicAuth};
pub use config::ServerConfig;
pub use error::Error;
pub use handler::{handler_fn, HandlerChain, HandlerFn, HandlerFuture, Route};
pub use http_server::HttpServer;
pub use mime::{Mime, MimeCategory};
pub use registry::ConnectionInfo;
pub use response::{Body, BodyReader, Framing, Response};
pub use status::StatusCode;
pub use storage::{TempFile, TempFileManager};
pub use writer::{encode_head, write_response, write_response_within, BUFFER_SIZE, SERVER_NAME};
