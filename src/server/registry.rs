//! The set of live connections.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

/// A point-in-time view of one live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: u64,
    pub peer: SocketAddr,
    /// Requests served on this connection so far.
    pub requests: u64,
}

struct Entry {
    peer: SocketAddr,
    requests: Arc<AtomicU64>,
    closed: Arc<Notify>,
}

/// Live connections keyed by id, each entry added once and removed once by its guard.
#[derive(Default)]
pub(crate) struct ConnectionRegistry {
    entries: Mutex<HashMap<u64, Entry>>,
    next_id: AtomicU64,
    drained: Notify,
}

impl ConnectionRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection. Dropping the returned guard removes it again.
    pub(crate) fn register(self: &Arc<Self>, peer: SocketAddr) -> ConnectionGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let requests = Arc::new(AtomicU64::new(0));
        let closed = Arc::new(Notify::new());
        self.lock().insert(
            id,
            Entry {
                peer,
                requests: Arc::clone(&requests),
                closed: Arc::clone(&closed),
            },
        );

        ConnectionGuard {
            registry: Arc::clone(self),
            id,
            requests,
            closed,
        }
    }

    fn unregister(&self, id: u64) {
        let mut entries = self.lock();
        entries.remove(&id);
        if entries.is_empty() {
            self.drained.notify_waiters();
        }
    }

    /// Ask every registered connection to close and return how many were asked.
    ///
    /// Each connection unregisters itself once its worker notices.
    pub(crate) fn close_all(&self) -> usize {
        let entries = self.lock();
        for entry in entries.values() {
            entry.closed.notify_one();
        }
        entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn snapshot(&self) -> Vec<ConnectionInfo> {
        let mut connections: Vec<ConnectionInfo> = self
            .lock()
            .iter()
            .map(|(id, entry)| ConnectionInfo {
                id: *id,
                peer: entry.peer,
                requests: entry.requests.load(Ordering::Relaxed),
            })
            .collect();
        connections.sort_by_key(|info| info.id);
        connections
    }

    /// Wait until no connection is registered.
    pub(crate) async fn wait_empty(&self) {
        loop {
            let drained = self.drained.notified();
            if self.len() == 0 {
                return;
            }
            drained.await;
        }
    }
}

/// Membership of one connection in the registry.
pub(crate) struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    id: u64,
    requests: Arc<AtomicU64>,
    closed: Arc<Notify>,
}

impl ConnectionGuard {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Count one more request on this connection and return the new total.
    pub(crate) fn record_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Resolves once the registry has asked this connection to close.
    ///
    /// A close requested before the first poll is not lost.
    pub(crate) async fn closed(&self) {
        self.closed.notified().await;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}
