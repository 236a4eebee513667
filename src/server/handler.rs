//! HTTP request handlers and routing.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use futures::FutureExt;
use log::warn;

use crate::parser::{Method, Request};
use crate::server::error::Error;
use crate::server::response::Response;
use crate::server::status::StatusCode;

/// Type alias for a boxed future that resolves to an optional response.
///
/// `Ok(None)` means "not mine, ask the next handler".
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Option<Response>, Error>> + Send>>;

/// Type alias for a handler function that takes a shared Request and returns a HandlerFuture.
pub type HandlerFn = Arc<dyn Fn(Arc<Request>) -> HandlerFuture + Send + Sync>;

/// Box an async closure into a [`HandlerFn`].
pub fn handler_fn<F, Fut>(handler: F) -> HandlerFn
where
    F: Fn(Arc<Request>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Response>, Error>> + Send + 'static,
{
    Arc::new(move |request: Arc<Request>| -> HandlerFuture { Box::pin(handler(request)) })
}

/// A handler that only answers one decoded path and a set of methods.
pub struct Route {
    /// The path to match.
    pub path: String,
    /// The HTTP methods to match.
    pub methods: Vec<Method>,
    /// The handler function.
    pub handler: HandlerFn,
}

impl Route {
    pub fn matches(&self, request: &Request) -> bool {
        request.path() == self.path
            && request
                .method()
                .is_some_and(|method| self.methods.contains(&method))
    }

    /// Turn the route into a chain handler that passes on requests it does not match.
    pub fn into_handler(self) -> HandlerFn {
        let route = Arc::new(self);
        Arc::new(move |request: Arc<Request>| -> HandlerFuture {
            let route = Arc::clone(&route);
            Box::pin(async move {
                if route.matches(&request) {
                    (route.handler)(request).await
                } else {
                    Ok(None)
                }
            })
        })
    }
}

/// Ordered handlers, first registered is asked first.
///
/// Registration publishes a fresh snapshot. A dispatch in flight keeps
/// iterating the snapshot it started with.
#[derive(Default)]
pub struct HandlerChain {
    handlers: RwLock<Arc<Vec<HandlerFn>>>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: HandlerFn) {
        let mut current = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(handler);
        *current = Arc::new(next);
    }

    /// The handlers registered so far.
    pub fn snapshot(&self) -> Arc<Vec<HandlerFn>> {
        Arc::clone(&self.handlers.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce the response for a request.
    ///
    /// Unrecognized methods get 501 without consulting any handler. Otherwise
    /// the first handler to return a response wins, handlers that fail or
    /// panic are skipped, and a 404 is returned when nobody answers.
    pub async fn dispatch(&self, request: Arc<Request>) -> Response {
        let Some(method) = request.method() else {
            return Response::text(
                StatusCode::NotImplemented,
                format!("Method not implemented: {}", request.method_name()),
            );
        };

        let handlers = self.snapshot();
        for (index, handler) in handlers.iter().enumerate() {
            let attempt = AssertUnwindSafe(async { handler(Arc::clone(&request)).await })
                .catch_unwind()
                .await;
            match attempt {
                Ok(Ok(Some(response))) => return response.for_method(Some(method)),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    warn!("Handler #{index} failed on {method} {path}: {e}", path = request.path());
                }
                Err(panic) => {
                    warn!(
                        "Handler #{index} panicked on {method} {path}: {reason}",
                        path = request.path(),
                        reason = panic_message(panic.as_ref())
                    );
                }
            }
        }

        Response::not_found(request.path()).for_method(Some(method))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
