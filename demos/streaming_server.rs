//! Streaming response bodies.
//!
//! `/stream` has no known length and is sent chunked, which closes the
//! connection afterwards. `/sized` declares its length up front and keeps
//! the connection alive.

use pocket_httpd::{HttpServer, Method, Mime, Response, ServerConfig, StatusCode};

const LINES: usize = 1000;

fn numbered_lines() -> Vec<u8> {
    (0..LINES)
        .map(|n| format!("line {n}\n"))
        .collect::<String>()
        .into_bytes()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ServerConfig::from_json(r#"{ "host": "127.0.0.1", "port": 8081 }"#)?;
    let server = HttpServer::new(config);

    server.add_route("/stream", vec![Method::GET], |_req| async move {
        let (mut writer, reader) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            for n in 0..LINES {
                if writer.write_all(format!("line {n}\n").as_bytes()).await.is_err() {
                    break;
                }
            }
        });

        Ok(Some(Response::new(StatusCode::Ok).with_mime(Mime::PlainText).with_stream(reader)))
    });

    server.add_route("/sized", vec![Method::GET, Method::HEAD], |_req| async move {
        let body = numbered_lines();
        let length = body.len() as u64;
        Ok(Some(
            Response::new(StatusCode::Ok)
                .with_mime(Mime::PlainText)
                .with_sized_stream(std::io::Cursor::new(body), length),
        ))
    });

    server.run().await?;
    Ok(())
}
