//! A small embeddable HTTP/1.1 server.
//!
//! pocket-httpd accepts TCP connections, parses requests, passes them through
//! a chain of async handlers and writes framed responses, either with a
//! `Content-Length` or chunked.
//!
//! # Features
//!
//! - Streaming request parser for GET, PUT, POST, DELETE, HEAD and OPTIONS
//! - Keep-alive for fixed-length responses, chunked framing for streamed bodies
//! - Handler chain that can grow while the server is running
//! - Optional HTTP Basic authentication for handlers
//! - JSON request and response bodies via serde
//!
//! # Examples
//!
//! ## Serving requests
//!
//! ```no_run
//! use pocket_httpd::{HttpServer, Method, Response, ServerConfig, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pocket_httpd::ServerError> {
//!     let server = HttpServer::new(ServerConfig::default());
//!
//!     server.add_route("/hello", vec![Method::GET], |request| async move {
//!         let name = request.query_param("name").unwrap_or("World").to_string();
//!         Ok(Some(Response::text(StatusCode::Ok, format!("Hi {name}"))))
//!     });
//!
//!     server.run().await
//! }
//! ```
//!
//! ## Parsing a request
//!
//! ```
//! use pocket_httpd::{parse_request, Limits, Method};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut stream: &[u8] = b"GET /search?q=rust+http HTTP/1.1\r\nHost: example.com\r\n\r\n";
//!
//! let request = parse_request(&mut stream, &Limits::default()).await.unwrap().unwrap();
//! assert_eq!(request.method(), Some(Method::GET));
//! assert_eq!(request.path(), "/search");
//! assert_eq!(request.query_param("q"), Some("rust http"));
//! assert_eq!(request.header("HOST"), Some("example.com"));
//! # });
//! ```
//!
//! ## JSON support
//!
//! ```
//! use pocket_httpd::{Response, StatusCode};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     name: String,
//! }
//!
//! let response = Response::new(StatusCode::Created)
//!     .with_json(&User { name: "Jane".to_string() })
//!     .unwrap();
//! assert_eq!(response.content_type(), "application/json");
//! ```

pub mod parser;

pub mod server;

// Re-export commonly used items for convenience
pub use parser::{
    parse_request, read_body, Error as ParseError, HttpVersion, Limits, Method, Request,
};
pub use server::{
    protect, BasicAuth, Body, ConnectionInfo, Error as ServerError, Framing, HttpServer, Mime,
    Response, ServerConfig, StatusCode,
};
