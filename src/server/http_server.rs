//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpListener, TcpSocket, TcpStream};
use tokio::signal;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

use crate::parser::{Method, Request};
use crate::server::config::ServerConfig;
use crate::server::connection;
use crate::server::error::Error;
use crate::server::handler::{handler_fn, HandlerChain, Route};
use crate::server::registry::{ConnectionInfo, ConnectionRegistry};
use crate::server::response::Response;
use crate::server::status::StatusCode;
use crate::server::writer::write_response;

/// State shared between the server handle, the accept loop and every worker.
pub(crate) struct Shared {
    pub(crate) config: ServerConfig,
    pub(crate) handlers: HandlerChain,
    pub(crate) registry: Arc<ConnectionRegistry>,
    pub(crate) total_connections: AtomicU64,
    pub(crate) total_requests: AtomicU64,
    running: AtomicBool,
}

struct Listening {
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

/// An HTTP server.
///
/// Handlers can be added before or while the server runs. `start` and
/// `stop` can be called repeatedly; the counters keep counting across restarts.
pub struct HttpServer {
    shared: Arc<Shared>,
    listening: Mutex<Option<Listening>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                handlers: HandlerChain::new(),
                registry: Arc::new(ConnectionRegistry::default()),
                total_connections: AtomicU64::new(0),
                total_requests: AtomicU64::new(0),
                running: AtomicBool::new(false),
            }),
            listening: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.shared.config
    }

    /// Append a handler to the chain.
    ///
    /// A handler answers `Ok(Some(response))` to claim a request, `Ok(None)` to
    /// pass it on, or `Err` to be skipped.
    pub fn add_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(Arc<Request>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Response>, Error>> + Send + 'static,
    {
        self.shared.handlers.register(handler_fn(handler));
    }

    /// Append a handler that only sees requests for `path` with one of `methods`.
    pub fn add_route<F, Fut>(&self, path: impl Into<String>, methods: Vec<Method>, handler: F)
    where
        F: Fn(Arc<Request>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Response>, Error>> + Send + 'static,
    {
        let route = Route {
            path: path.into(),
            methods,
            handler: handler_fn(handler),
        };
        let methods = route
            .methods
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        debug!("Registered route {methods} {path}", path = route.path);

        self.shared.handlers.register(route.into_handler());
    }

    /// Bind the listener and start accepting connections.
    ///
    /// Returns the bound address. Calling it on a running server does nothing
    /// and returns the address already bound.
    pub async fn start(&self) -> Result<SocketAddr, Error> {
        let mut listening = self.listening.lock().await;
        if let Some(current) = listening.as_ref() {
            debug!("Server already listening on {addr}", addr = current.local_addr);
            return Ok(current.local_addr);
        }

        self.shared.config.validate()?;
        let listener = bind_listener(&self.shared.config).await?;
        let local_addr = listener.local_addr()?;

        self.shared.running.store(true, Ordering::SeqCst);
        let accept_task = tokio::spawn(accept_loop(Arc::clone(&self.shared), listener));

        info!("Server listening on http://{local_addr}");
        *listening = Some(Listening {
            local_addr,
            accept_task,
        });
        Ok(local_addr)
    }

    /// Close the listener and force-close every live connection, including
    /// those handed in through [`HttpServer::handle_connection`].
    ///
    /// Waits up to the configured shutdown timeout for the connections to
    /// unregister. Does nothing if the server is not running.
    pub async fn stop(&self) {
        let mut listening = self.listening.lock().await;
        let Some(current) = listening.take() else {
            return;
        };

        info!("Shutting down server on {addr}", addr = current.local_addr);
        self.shared.running.store(false, Ordering::SeqCst);

        current.accept_task.abort();
        if let Err(e) = current.accept_task.await {
            if !e.is_cancelled() {
                error!("Accept loop ended abnormally: {e}");
            }
        }

        let closed = self.shared.registry.close_all();
        debug!("Closed {closed} live connections");

        let drained = tokio::time::timeout(self.shared.config.shutdown_timeout(), self.shared.registry.wait_empty()).await;
        if drained.is_err() {
            warn!(
                "{count} connections still open after shutdown timeout",
                count = self.shared.registry.len()
            );
        }

        info!("Server shutdown complete");
    }

    /// Start, serve until Ctrl+C, then stop.
    pub async fn run(&self) -> Result<(), Error> {
        self.start().await?;
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, initiating graceful shutdown");
        self.stop().await;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// The bound address while the server is running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.listening.lock().await.as_ref().map(|current| current.local_addr)
    }

    /// Connections accepted since the server was created.
    pub fn total_connections(&self) -> u64 {
        self.shared.total_connections.load(Ordering::Relaxed)
    }

    /// Requests served since the server was created.
    pub fn total_requests(&self) -> u64 {
        self.shared.total_requests.load(Ordering::Relaxed)
    }

    pub fn live_connections(&self) -> usize {
        self.shared.registry.len()
    }

    /// A snapshot of the live connections, oldest first.
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.shared.registry.snapshot()
    }

    /// Run a request through the handler chain.
    pub async fn dispatch(&self, request: Request) -> Response {
        self.shared.handlers.dispatch(Arc::new(request)).await
    }

    /// Serve an already-established stream as a registered connection.
    ///
    /// Returns once the connection ends, with the number of requests served.
    pub async fn handle_connection<S>(&self, stream: S, peer: SocketAddr) -> u64
    where
        S: AsyncRead + AsyncWrite,
    {
        self.shared.total_connections.fetch_add(1, Ordering::Relaxed);
        let guard = self.shared.registry.register(peer);
        connection::serve(Arc::clone(&self.shared), stream, guard).await
    }
}

/// Resolve the configured host and bind the first address that works.
async fn bind_listener(config: &ServerConfig) -> Result<TcpListener, Error> {
    let host = config.bind_host();
    let addrs = lookup_host((host, config.port))
        .await
        .map_err(|e| Error::AddrResolve(format!("{host}: {e}")))?;

    let mut last_error = None;
    for addr in addrs {
        match bind_addr(addr, config.backlog) {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                debug!("Could not bind {addr}: {e}");
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(e) => Error::IoError(e),
        None => Error::AddrResolve(format!("{host}: no addresses")),
    })
}

fn bind_addr(addr: SocketAddr, backlog: u32) -> std::io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(backlog)
}

/// Accept connections until the task is aborted.
async fn accept_loop(shared: Arc<Shared>, listener: TcpListener) {
    let permits = Arc::new(Semaphore::new(shared.config.max_connections));

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                shared.total_connections.fetch_add(1, Ordering::Relaxed);
                spawn_worker(&shared, &permits, socket, peer);
            }
            Err(e) => {
                error!("Error accepting connection: {e}");
                tokio::time::sleep(shared.config.accept_backoff()).await;
            }
        }
    }
}

fn spawn_worker(shared: &Arc<Shared>, permits: &Arc<Semaphore>, socket: TcpStream, peer: SocketAddr) {
    let Ok(permit) = Arc::clone(permits).try_acquire_owned() else {
        warn!("Connection limit reached, rejecting connection from {peer}");
        tokio::spawn(reject(socket, shared.config.read_timeout()));
        return;
    };

    let guard = shared.registry.register(peer);
    let id = guard.id();
    debug!("Connection {id} accepted from {peer}");

    let worker_shared = Arc::clone(shared);
    tokio::spawn(async move {
        let _permit = permit;
        let served = connection::serve(worker_shared, socket, guard).await;
        debug!("Connection {id} from {peer} closed after {served} requests");
    });
}

/// Tell an over-limit client to come back later, then close.
async fn reject(mut socket: TcpStream, timeout: std::time::Duration) {
    let response = Response::text(
        StatusCode::ServiceUnavailable,
        "Server is at capacity, please try again later",
    );
    match tokio::time::timeout(timeout, write_response(response, &mut socket)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => debug!("Failed to send 503: {e}"),
        Err(_) => debug!("Timed out sending 503"),
    }
    if let Err(e) = socket.shutdown().await {
        debug!("Failed to shut down rejected connection: {e}");
    }
}
