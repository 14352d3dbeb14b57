//! Id-indexed registry of live native response objects.
//!
//! A [`ResponseController`](crate::response::ResponseController) handed to
//! application code can outlive the native object it fronts: the peer may
//! disconnect, the exchange may complete, the engine may time the socket
//! out. Instead of sharing a raw native reference and trusting every caller
//! to consult an "is it still alive?" flag, the controller holds only a
//! [`ConnectionId`]. The native object itself lives here, and every deferred
//! operation resolves the id at execution time, on the loop thread,
//! receiving either the live object or an explicit gone result.
//!
//! Removal is the single point of invalidation: an engine abort or a
//! terminal write takes the entry out of the map, and from that moment no
//! resolution can ever reach the dead object again.
//!
//! The map is concurrent ([`DashMap`]) so that any thread may *resolve or
//! remove*, but stored values are only ever *used* from the loop thread.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use veyra_core::registry::ConnectionRegistry;
//!
//! # fn native_response() -> Box<dyn veyra_core::engine::RawResponse> { unimplemented!() }
//! let registry = Arc::new(ConnectionRegistry::new());
//! registry.insert("conn_0".to_string(), native_response());
//!
//! // Later, on the loop thread:
//! let resolved = registry.with(&"conn_0".to_string(), |res| {
//!     res.write_header("X-Live", "1");
//! });
//! assert!(resolved.is_some());
//!
//! registry.remove(&"conn_0".to_string());
//! assert!(registry.with(&"conn_0".to_string(), |_| ()).is_none());
//! ```

use dashmap::DashMap;
use tracing::debug;

use crate::engine::RawResponse;

/// A unique identifier for one in-flight exchange.
///
/// Generated by the adapter at handler-invocation time; unique within the
/// lifetime of the application.
pub type ConnectionId = String;

/// Thread-safe map from [`ConnectionId`] to the live native response.
///
/// Shared between the adapter (insert), controllers (resolve from deferred
/// tasks, remove on terminal writes), and abort delivery (remove).
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: DashMap<ConnectionId, Box<dyn RawResponse>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a native response under `id`.
    ///
    /// Called on the loop thread, at controller construction.
    pub fn insert(&self, id: ConnectionId, response: Box<dyn RawResponse>) {
        self.entries.insert(id.clone(), response);
        debug!(connection = %id, live = self.entries.len(), "registered response");
    }

    /// Invalidates `id`, returning the native object if it was still live.
    ///
    /// After removal every later [`with`](ConnectionRegistry::with) for the
    /// same id reports gone.
    pub fn remove(&self, id: &ConnectionId) -> Option<Box<dyn RawResponse>> {
        let removed = self.entries.remove(id).map(|(_, response)| response);
        if removed.is_some() {
            debug!(connection = %id, live = self.entries.len(), "removed response");
        }
        removed
    }

    /// Resolves `id` and runs `f` against the live native object.
    ///
    /// Returns `None`, the explicit gone result, if the entry has been
    /// invalidated. Must only be called from the loop thread; the closure
    /// runs while the map shard is locked, so it must not re-enter the
    /// registry.
    pub fn with<R>(&self, id: &ConnectionId, f: impl FnOnce(&dyn RawResponse) -> R) -> Option<R> {
        self.entries.get(id).map(|entry| f(entry.value().as_ref()))
    }

    /// Whether `id` is still live.
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AbortCallback, DataCallback};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingResponse {
        writes: AtomicUsize,
    }

    impl RawResponse for CountingResponse {
        fn write_status(&self, _status: &str) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        fn write_header(&self, _name: &str, _value: &str) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        fn end(&self, _body: &[u8]) {}
        fn close(&self) {}
        fn on_data(&self, _callback: DataCallback) {}
        fn on_aborted(&self, _callback: AbortCallback) {}
        fn remote_address(&self) -> String {
            "127.0.0.1:1234".to_string()
        }
    }

    #[test]
    fn test_insert_resolve_remove() {
        let registry = ConnectionRegistry::new();
        registry.insert("conn_0".to_string(), Box::new(CountingResponse::default()));

        assert!(registry.contains(&"conn_0".to_string()));
        assert_eq!(registry.len(), 1);

        let resolved = registry.with(&"conn_0".to_string(), |res| res.write_status("200 OK"));
        assert!(resolved.is_some());

        assert!(registry.remove(&"conn_0".to_string()).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolution_after_removal_is_gone() {
        let registry = ConnectionRegistry::new();
        registry.insert("conn_1".to_string(), Box::new(CountingResponse::default()));
        registry.remove(&"conn_1".to_string());

        assert_eq!(registry.with(&"conn_1".to_string(), |_| ()), None);
        assert!(registry.remove(&"conn_1".to_string()).is_none());
    }

    #[test]
    fn test_unknown_id_is_gone() {
        let registry = ConnectionRegistry::new();
        assert!(registry.with(&"missing".to_string(), |_| ()).is_none());
    }

    #[test]
    fn test_concurrent_inserts() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();
        for t in 0..4 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..25 {
                    registry.insert(
                        format!("conn_{t}_{i}"),
                        Box::new(CountingResponse::default()),
                    );
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 100);
    }
}
