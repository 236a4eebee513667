//! Serializes a [`Response`] onto a byte sink.

use std::io;
use std::time::{Duration, SystemTime};

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::parser::Method;
use crate::server::error::Error;
use crate::server::response::{Framing, Response};

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = concat!("pocket-httpd/", env!("CARGO_PKG_VERSION"));

/// Body bytes moved per read/write.
pub const BUFFER_SIZE: usize = 16 * 1024;

/// Headers the writer derives itself; extra headers with these names are dropped.
const MANAGED_HEADERS: [&str; 5] = [
    "content-length",
    "transfer-encoding",
    "connection",
    "content-type",
    "server",
];

/// Write a complete, framed response and return the framing that was used.
///
/// The response is consumed, so its body source is released on every path,
/// including failures. A `HEAD` response gets the same headers as the
/// equivalent `GET` but no body bytes. Callers close the connection after
/// `Framing::Chunked` or after any error.
pub async fn write_response<W>(response: Response, out: &mut W) -> Result<Framing, Error>
where
    W: AsyncWrite + Unpin,
{
    send(response, &mut Sink { out, stall: None }).await
}

/// Like [`write_response`], but fail with `TimedOut` when a single write or
/// flush makes no progress for `stall`.
pub async fn write_response_within<W>(response: Response, out: &mut W, stall: Duration) -> Result<Framing, Error>
where
    W: AsyncWrite + Unpin,
{
    send(response, &mut Sink { out, stall: Some(stall) }).await
}

async fn send<W>(response: Response, sink: &mut Sink<'_, W>) -> Result<Framing, Error>
where
    W: AsyncWrite + Unpin,
{
    let framing = response.framing();
    let head = encode_head(&response, framing);
    let suppress_body = response.method == Some(Method::HEAD);

    sink.write_all(&head).await?;
    sink.flush().await?;

    if suppress_body {
        return Ok(framing);
    }

    let mut reader = response.body.into_reader();
    match framing {
        Framing::ContentLength(length) => copy_exact(&mut reader, sink, length).await?,
        Framing::Chunked => copy_chunked(&mut reader, sink).await?,
    }
    sink.flush().await?;

    Ok(framing)
}

/// The output stream, with an optional limit on how long one write may stall.
struct Sink<'a, W> {
    out: &'a mut W,
    stall: Option<Duration>,
}

impl<W: AsyncWrite + Unpin> Sink<'_, W> {
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.stall {
            Some(stall) => stalled(stall, tokio::time::timeout(stall, self.out.write_all(bytes)).await),
            None => self.out.write_all(bytes).await,
        }
    }

    async fn flush(&mut self) -> io::Result<()> {
        match self.stall {
            Some(stall) => stalled(stall, tokio::time::timeout(stall, self.out.flush()).await),
            None => self.out.flush().await,
        }
    }
}

fn stalled(stall: Duration, result: Result<io::Result<()>, tokio::time::error::Elapsed>) -> io::Result<()> {
    result.unwrap_or_else(|_| {
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("peer accepted no data for {stall:?}"),
        ))
    })
}

/// Build the status line and header block, including the terminating blank line.
pub fn encode_head(response: &Response, framing: Framing) -> Vec<u8> {
    let mut head = format!("HTTP/1.1 {status}\r\n", status = response.status);

    if response.header("date").is_none() {
        head.push_str(&format!("Date: {}\r\n", httpdate::fmt_http_date(SystemTime::now())));
    }
    head.push_str(&format!("Server: {SERVER_NAME}\r\n"));

    if let Some(realm) = response.auth_realm.as_deref().filter(|realm| is_clean(realm)) {
        head.push_str(&format!("WWW-Authenticate: Basic realm=\"{}\"\r\n", quoted(realm)));
    }

    match framing {
        Framing::ContentLength(length) => {
            head.push_str(&format!("Content-Length: {length}\r\n"));
            head.push_str("Accept-Ranges: bytes\r\n");
            head.push_str("Connection: keep-alive\r\n");
        }
        Framing::Chunked => {
            head.push_str("Transfer-Encoding: chunked\r\n");
            head.push_str("Connection: close\r\n");
        }
    }

    head.push_str(&format!("Content-Type: {}\r\n", response.content_type()));

    for (name, value) in &response.headers {
        if MANAGED_HEADERS.iter().any(|managed| name.eq_ignore_ascii_case(managed)) {
            debug!("Dropping managed header {name} from response");
            continue;
        }
        if !is_clean(name) || !is_clean(value) {
            warn!("Dropping header {name:?} containing a line break");
            continue;
        }
        head.push_str(&format!("{name}: {value}\r\n"));
    }

    head.push_str("\r\n");
    head.into_bytes()
}

fn is_clean(text: &str) -> bool {
    !text.contains(['\r', '\n'])
}

/// Escape `\` and `"` for use inside a quoted-string.
fn quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Copy exactly `length` bytes. A source that ends early is a send failure.
async fn copy_exact<R, W>(reader: &mut R, out: &mut Sink<'_, W>, length: u64) -> Result<(), Error>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut remaining = length;

    while remaining > 0 {
        let want = remaining.min(BUFFER_SIZE as u64) as usize;
        let read = reader.read(&mut buf[..want]).await?;
        if read == 0 {
            return Err(Error::ShortBody {
                expected: length,
                sent: length - remaining,
            });
        }
        out.write_all(&buf[..read]).await?;
        remaining -= read as u64;
    }

    Ok(())
}

/// Copy the source as `<hex-length>\r\n<bytes>\r\n` chunks, then the zero-length terminator.
async fn copy_chunked<R, W>(reader: &mut R, out: &mut Sink<'_, W>) -> Result<(), Error>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; BUFFER_SIZE];

    loop {
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        out.write_all(format!("{read:x}\r\n").as_bytes()).await?;
        out.write_all(&buf[..read]).await?;
        out.write_all(b"\r\n").await?;
    }

    out.write_all(b"0\r\n\r\n").await?;
    Ok(())
}
