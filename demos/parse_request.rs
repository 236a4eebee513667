//! Parsing a request head and body without running a server.

use pocket_httpd::{parse_request, read_body, Limits, ParseError};

#[tokio::main]
async fn main() -> Result<(), ParseError> {
    let raw = b"POST /users/new%20one?role=admin&tag=a+b HTTP/1.1\r\n\
                Host: example.com\r\n\
                Content-Type: application/json\r\n\
                Content-Length: 17\r\n\
                \r\n\
                {\"name\":\"Alice\"}\n";

    let limits = Limits::default();
    let mut stream: &[u8] = raw;

    let Some(request) = parse_request(&mut stream, &limits).await? else {
        println!("Stream was empty");
        return Ok(());
    };

    println!("Method: {}", request.method_name());
    println!("Path: {}", request.path());
    println!("Version: {:?}", request.version());
    for (name, value) in request.query() {
        println!("Query: {name} = {value}");
    }
    for (name, value) in request.headers() {
        println!("Header: {name}: {value}");
    }

    if let Some(length) = request.body_length()? {
        let body = read_body(&mut stream, length, &limits).await?;
        let request = request.with_body(body);
        let json: serde_json::Value = request.json()?;
        println!("JSON body: {json}");
    }

    // A request line with nothing on it
    let mut bad: &[u8] = b"\r\n";
    match parse_request(&mut bad, &limits).await {
        Err(e) => println!("Rejected: {e}"),
        Ok(request) => println!("Unexpectedly parsed {request:?}"),
    }

    Ok(())
}
