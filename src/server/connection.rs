//! The per-connection worker: read a request, dispatch it, write the response, repeat.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::{debug, error, warn};
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::AbortHandle;

use crate::parser::{parse_request, read_body, Error as ParserError, Limits, Request};
use crate::server::http_server::Shared;
use crate::server::registry::ConnectionGuard;
use crate::server::response::Response;
use crate::server::status::StatusCode;
use crate::server::writer::write_response_within;

/// Serve requests on one connection until it ends, then return how many were served.
///
/// A close requested through the registry drops the stream wherever the
/// worker is. The connection leaves the registry when `guard` drops, on
/// every exit path.
pub(crate) async fn serve<S>(shared: Arc<Shared>, stream: S, guard: ConnectionGuard) -> u64
where
    S: AsyncRead + AsyncWrite,
{
    tokio::select! {
        _ = serve_requests(&shared, stream, &guard) => {}
        _ = guard.closed() => debug!("Connection {id}: closed by server", id = guard.id()),
    }
    guard.requests()
}

async fn serve_requests<S>(shared: &Arc<Shared>, stream: S, guard: &ConnectionGuard)
where
    S: AsyncRead + AsyncWrite,
{
    let id = guard.id();
    let limits = shared.config.limits();
    let read_timeout = shared.config.read_timeout();

    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    loop {
        let next = tokio::time::timeout(read_timeout, next_request(&mut reader, &mut write_half, &limits)).await;
        let request = match next {
            Err(_) => {
                debug!("Connection {id}: no request within {read_timeout:?}, closing");
                break;
            }
            Ok(Ok(None)) => {
                debug!("Connection {id}: peer closed");
                break;
            }
            Ok(Err(ParserError::Io(e))) => {
                debug!("Connection {id}: read failed: {e}");
                break;
            }
            Ok(Err(e)) => {
                debug!("Connection {id}: rejecting request: {e}");
                if let Err(e) = write_response_within(rejection(&e), &mut write_half, read_timeout).await {
                    debug!("Connection {id}: failed to send rejection: {e}");
                }
                break;
            }
            Ok(Ok(Some(request))) => request,
        };

        guard.record_request();
        shared.total_requests.fetch_add(1, Ordering::Relaxed);

        let keep_alive = request.wants_keep_alive();
        let response = dispatch_isolated(shared, request).await;

        match write_response_within(response, &mut write_half, read_timeout).await {
            Ok(framing) if framing.keeps_alive() && keep_alive => {}
            Ok(_) => break,
            Err(e) => {
                warn!("Connection {id}: failed to send response: {e}");
                break;
            }
        }
    }

    match tokio::time::timeout(read_timeout, write_half.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Connection {id}: shutdown failed: {e}"),
        Err(_) => debug!("Connection {id}: shutdown timed out"),
    }
}

/// Read the next request head and, if one is declared, its body.
async fn next_request<R, W>(reader: &mut R, writer: &mut W, limits: &Limits) -> Result<Option<Request>, ParserError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(request) = parse_request(reader, limits).await? else {
        return Ok(None);
    };

    let length = match request.body_length()? {
        Some(length) if length > 0 => length,
        _ => return Ok(Some(request)),
    };
    if length > limits.max_body_size as u64 {
        return Err(ParserError::BodyTooLarge {
            length,
            limit: limits.max_body_size,
        });
    }

    if request
        .header("expect")
        .is_some_and(|expect| expect.eq_ignore_ascii_case("100-continue"))
    {
        writer
            .write_all(format!("HTTP/1.1 {}\r\n\r\n", StatusCode::Continue).as_bytes())
            .await?;
        writer.flush().await?;
    }

    let body = read_body(reader, length, limits).await?;
    Ok(Some(request.with_body(body)))
}

/// The error response for a request that could not be read.
fn rejection(error: &ParserError) -> Response {
    let status = match error {
        ParserError::LineTooLong { what, .. } if *what == "request line" => StatusCode::RequestUriTooLong,
        ParserError::BodyTooLarge { .. } => StatusCode::RequestEntityTooLarge,
        ParserError::UnsupportedTransferEncoding(_) => StatusCode::NotImplemented,
        _ => StatusCode::BadRequest,
    };
    Response::text(status, error.to_string())
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run the handler chain in its own task. A dispatch that still fails to
/// complete is answered with a 500.
async fn dispatch_isolated(shared: &Arc<Shared>, request: Request) -> Response {
    let method = request.method();
    let path = request.path().to_string();

    let dispatcher = Arc::clone(shared);
    let task = tokio::spawn(async move { dispatcher.handlers.dispatch(Arc::new(request)).await });
    let _abort = AbortOnDrop(task.abort_handle());

    match task.await {
        Ok(response) => response,
        Err(e) => {
            error!("Dispatch for {path} did not complete: {e}");
            Response::text(StatusCode::InternalServerError, "Internal server error").for_method(method)
        }
    }
}
