//! A basic server with a few routes, a JSON endpoint and a catch-all handler.
//!
//! Run with `RUST_LOG=debug cargo run --example hello_server`, then try
//! `curl 'http://127.0.0.1:8080/hello?name=World'`.

use pocket_httpd::{HttpServer, Method, Mime, Response, ServerConfig, ServerError, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Greeting {
    name: String,
    message: String,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    env_logger::init();

    let config = ServerConfig {
        host: Some("127.0.0.1".to_string()),
        ..ServerConfig::default()
    };
    let server = HttpServer::new(config);

    server.add_route("/", vec![Method::GET, Method::HEAD], |_req| async move {
        Ok(Some(
            Response::new(StatusCode::Ok)
                .with_mime(Mime::Html)
                .with_body_string("<html><body><h1>Welcome to pocket-httpd!</h1></body></html>"),
        ))
    });

    server.add_route("/hello", vec![Method::GET], |req| async move {
        let name = req.query_param("name").unwrap_or("World").to_string();
        Ok(Some(Response::text(StatusCode::Ok, format!("Hi {name}"))))
    });

    // POST a JSON greeting and get it back with a message filled in
    server.add_route("/api/greet", vec![Method::POST], |req| async move {
        if !req.is_json() {
            return Ok(Some(Response::text(
                StatusCode::UnsupportedMediaType,
                "Expected application/json",
            )));
        }

        let mut greeting: Greeting = req.json()?;
        greeting.message = format!("Hello, {}!", greeting.name);
        Ok(Some(Response::new(StatusCode::Created).with_json(&greeting)?))
    });

    server.add_handler(|req| async move {
        if req.path() == "/stats" {
            return Ok(Some(Response::text(StatusCode::Ok, "See the server log for counters")));
        }
        Ok(None)
    });

    server.run().await?;

    log::info!(
        "Served {requests} requests over {connections} connections",
        requests = server.total_requests(),
        connections = server.total_connections()
    );
    Ok(())
}
