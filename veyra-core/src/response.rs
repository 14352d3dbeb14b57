//! Mutable per-response handles and their abort-safe state machine.
//!
//! A [`ResponseController`] is the application's only way to touch an
//! in-flight exchange. It may be cloned, moved to worker threads, and used
//! long after the handler callback returned, while the engine, on its own
//! thread, remains free to invalidate the underlying native object at any
//! moment (peer disconnect, timeout, completion). The controller contains
//! that race instead of exposing it:
//!
//! - The native object never leaves the loop thread. Every mutation is a
//!   deferred task that resolves the
//!   [`ConnectionRegistry`](crate::registry::ConnectionRegistry) at
//!   execution time and silently drops if the entry is gone or the abort
//!   flag is up.
//! - The state machine `Open → {Ended, Closed, Aborted}` is advanced with
//!   atomic transitions on the submitting thread, so late writes are
//!   rejected before they are even queued. All three non-open states are
//!   terminal; `Aborted` is reachable from any state and idempotent.
//! - `end` and `close` set the shared abort flag as a side effect of
//!   completing. Completion and abort are deliberately conflated: a stray
//!   later call must never reach an object the engine may already have
//!   reused.
//! - The remote address is copied out of the native object eagerly, at
//!   construction on the loop thread, so reading it later from any thread
//!   touches no native state.
//!
//! # Examples
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::StatusCode;
//! use veyra_core::response::ResponseController;
//!
//! fn handle(res: ResponseController) {
//!     res.write_status(StatusCode::OK);
//!     res.write_header("Content-Type", "text/plain");
//!
//!     // May run on any thread, any time later; a disconnected peer
//!     // makes this a silent no-op.
//!     std::thread::spawn(move || {
//!         res.end(Bytes::from_static(b"hello"));
//!     });
//! }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::engine::{AbortCallback, DataCallback, RawResponse};
use crate::error::Result;
use crate::event_loop::LoopHandle;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::runtime::RuntimeGate;

const STATE_OPEN: u8 = 0;
const STATE_ENDED: u8 = 1;
const STATE_CLOSED: u8 = 2;
const STATE_ABORTED: u8 = 3;

/// Lifecycle states of a response.
///
/// `Open` is the only state that accepts writes. The other three are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    /// Writes are accepted and queued onto the loop thread.
    Open,
    /// `end` completed the exchange.
    Ended,
    /// `close` tore the connection down.
    Closed,
    /// The engine invalidated the exchange, or it is otherwise done for.
    Aborted,
}

impl ResponseState {
    fn from_u8(value: u8) -> Self {
        match value {
            STATE_OPEN => ResponseState::Open,
            STATE_ENDED => ResponseState::Ended,
            STATE_CLOSED => ResponseState::Closed,
            _ => ResponseState::Aborted,
        }
    }
}

/// Mutable handle to one in-flight exchange.
///
/// Cheaply cloneable; clones share the same state machine, abort flag, and
/// registry entry. See the [module docs](self) for the threading model.
pub struct ResponseController {
    id: ConnectionId,
    state: Arc<AtomicU8>,
    aborted: Arc<AtomicBool>,
    registry: Arc<ConnectionRegistry>,
    loop_handle: LoopHandle,
    gate: Arc<RuntimeGate>,
    abort_callback: Arc<Mutex<Option<AbortCallback>>>,
    remote_address: String,
}

impl ResponseController {
    /// Creates a controller for the exchange registered under `id`.
    ///
    /// Called by the adapter on the loop thread, immediately after the
    /// native response was inserted into `registry`. `remote_address` is
    /// the eager copy taken from the native object at that moment.
    pub fn new(
        id: ConnectionId,
        remote_address: String,
        registry: Arc<ConnectionRegistry>,
        loop_handle: LoopHandle,
        gate: Arc<RuntimeGate>,
    ) -> Self {
        Self {
            id,
            state: Arc::new(AtomicU8::new(STATE_OPEN)),
            aborted: Arc::new(AtomicBool::new(false)),
            registry,
            loop_handle,
            gate,
            abort_callback: Arc::new(Mutex::new(None)),
            remote_address,
        }
    }

    /// The exchange's connection id.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ResponseState {
        ResponseState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether the shared abort flag is up.
    ///
    /// True after an engine abort *or* after a terminal write completed;
    /// the two are deliberately indistinguishable here.
    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// The peer address, cached at construction.
    ///
    /// Readable from any thread at any time; never touches native state.
    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    /// Queues the status line. No-op unless the response is `Open`.
    pub fn write_status(&self, status: StatusCode) {
        if self.state() != ResponseState::Open {
            return;
        }
        let line = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };
        self.defer_mutation(move |res| res.write_status(&line));
    }

    /// Queues one response header. No-op unless the response is `Open`.
    ///
    /// Headers land in submission order relative to other operations
    /// queued from the same thread.
    pub fn write_header(&self, name: impl Into<String>, value: impl Into<String>) {
        if self.state() != ResponseState::Open {
            return;
        }
        let name = name.into();
        let value = value.into();
        self.defer_mutation(move |res| res.write_header(&name, &value));
    }

    /// Writes the body, completes the exchange, and invalidates the handle.
    ///
    /// Transitions `Open → Ended`; any other starting state makes this a
    /// silent no-op. Completion consumes the registry entry and raises the
    /// shared abort flag, so every operation still in flight behind it is
    /// dropped at execution time.
    pub fn end(&self, body: impl Into<Bytes>) {
        if !self.transition(STATE_ENDED) {
            return;
        }
        let body = body.into();
        self.defer_terminal(move |res| res.end(&body));
    }

    /// Serializes `value` as JSON and [`end`](ResponseController::end)s
    /// with it, setting the content type.
    ///
    /// # Errors
    ///
    /// Only serialization can fail; a stale handle stays a silent no-op.
    pub fn end_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let body = serde_json::to_vec(value)?;
        self.write_header("Content-Type", "application/json");
        self.end(body);
        Ok(())
    }

    /// Tears the connection down without a response.
    ///
    /// Transitions `Open → Closed`; otherwise a silent no-op. Like
    /// [`end`](ResponseController::end), consumes the registry entry and
    /// raises the abort flag.
    pub fn close(&self) {
        if !self.transition(STATE_CLOSED) {
            return;
        }
        self.defer_terminal(|res| res.close());
    }

    /// Registers the streaming body callback. No-op unless `Open`.
    ///
    /// The engine invokes the callback on the loop thread as chunks arrive;
    /// the wrapper re-checks the abort flag and re-enters the runtime gate
    /// before running `callback`.
    pub fn on_data(&self, callback: impl FnMut(&[u8], bool) + Send + 'static) {
        if self.state() != ResponseState::Open {
            return;
        }
        let aborted = self.aborted.clone();
        let gate = self.gate.clone();
        let mut callback = callback;
        let wrapped: DataCallback = Box::new(move |chunk, is_last| {
            if aborted.load(Ordering::SeqCst) {
                return;
            }
            let _scope = gate.enter();
            callback(chunk, is_last);
        });
        self.defer_mutation(move |res| res.on_data(wrapped));
    }

    /// Registers the abort callback.
    ///
    /// Runs inside the runtime gate when the engine invalidates the
    /// exchange. Delivered at most once; registering after the abort
    /// already happened delivers immediately. A response that completed
    /// normally never delivers.
    pub fn on_aborted(&self, callback: impl FnOnce() + Send + 'static) {
        {
            let mut slot = self
                .abort_callback
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if self.state() != ResponseState::Aborted {
                *slot = Some(Box::new(callback));
                return;
            }
        }
        let _scope = self.gate.enter();
        callback();
    }

    /// Delivers the engine's abort signal.
    ///
    /// Called on the loop thread by the adapter's wiring (exactly once per
    /// exchange from the engine's side; extra calls are no-ops). Raises the
    /// flag, removes the registry entry, and runs the registered abort
    /// callback inside the runtime gate.
    pub fn engine_abort(&self) {
        if self.aborted.swap(true, Ordering::SeqCst) {
            // Already ended, closed, or aborted; nothing left to invalidate.
            return;
        }
        self.state.store(STATE_ABORTED, Ordering::SeqCst);
        self.registry.remove(&self.id);
        debug!(connection = %self.id, "abort delivered");

        let callback = self
            .abort_callback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(callback) = callback {
            let _scope = self.gate.enter();
            callback();
        }
    }

    /// Atomically advances `Open` to `terminal`. False if already terminal.
    fn transition(&self, terminal: u8) -> bool {
        self.state
            .compare_exchange(STATE_OPEN, terminal, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Queues a non-terminal native mutation, re-checked at execution time.
    fn defer_mutation(&self, mutate: impl FnOnce(&dyn RawResponse) + Send + 'static) {
        let id = self.id.clone();
        let registry = self.registry.clone();
        let aborted = self.aborted.clone();
        self.loop_handle.defer(move || {
            if aborted.load(Ordering::SeqCst) {
                debug!(connection = %id, "dropping deferred write; exchange aborted");
                return;
            }
            if registry.with(&id, mutate).is_none() {
                debug!(connection = %id, "dropping deferred write; exchange gone");
            }
        });
    }

    /// Queues the terminal native write. Consumes the registry entry and
    /// raises the abort flag; loses the race cleanly if the engine aborted
    /// first.
    fn defer_terminal(&self, finish: impl FnOnce(&dyn RawResponse) + Send + 'static) {
        let id = self.id.clone();
        let registry = self.registry.clone();
        let aborted = self.aborted.clone();
        self.loop_handle.defer(move || {
            if aborted.swap(true, Ordering::SeqCst) {
                debug!(connection = %id, "dropping terminal write; exchange aborted");
                return;
            }
            match registry.remove(&id) {
                Some(res) => finish(res.as_ref()),
                None => debug!(connection = %id, "dropping terminal write; exchange gone"),
            }
        });
    }
}

impl Clone for ResponseController {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            state: self.state.clone(),
            aborted: self.aborted.clone(),
            registry: self.registry.clone(),
            loop_handle: self.loop_handle.clone(),
            gate: self.gate.clone(),
            abort_callback: self.abort_callback.clone(),
            remote_address: self.remote_address.clone(),
        }
    }
}

impl std::fmt::Debug for ResponseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseController")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("aborted", &self.aborted())
            .field("remote_address", &self.remote_address)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_loop::EventLoop;
    use std::sync::atomic::AtomicUsize;

    /// Records every native call; hands out its data-callback slot so tests
    /// can play the engine and fire chunks.
    #[derive(Default)]
    struct RecordingResponse {
        events: Arc<Mutex<Vec<String>>>,
        data_callback: Arc<Mutex<Option<DataCallback>>>,
    }

    impl RawResponse for RecordingResponse {
        fn write_status(&self, status: &str) {
            self.events.lock().unwrap().push(format!("status:{status}"));
        }
        fn write_header(&self, name: &str, value: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("header:{name}={value}"));
        }
        fn end(&self, body: &[u8]) {
            self.events
                .lock()
                .unwrap()
                .push(format!("end:{}", String::from_utf8_lossy(body)));
        }
        fn close(&self) {
            self.events.lock().unwrap().push("close".to_string());
        }
        fn on_data(&self, callback: DataCallback) {
            *self.data_callback.lock().unwrap() = Some(callback);
        }
        fn on_aborted(&self, _callback: AbortCallback) {}
        fn remote_address(&self) -> String {
            "203.0.113.7:49152".to_string()
        }
    }

    struct Harness {
        event_loop: EventLoop,
        controller: ResponseController,
        registry: Arc<ConnectionRegistry>,
        events: Arc<Mutex<Vec<String>>>,
        data_callback: Arc<Mutex<Option<DataCallback>>>,
    }

    fn harness() -> Harness {
        let event_loop = EventLoop::new();
        let registry = Arc::new(ConnectionRegistry::new());
        let gate = Arc::new(RuntimeGate::new());

        let native = RecordingResponse::default();
        let events = native.events.clone();
        let data_callback = native.data_callback.clone();
        let remote = native.remote_address();
        registry.insert("conn_0".to_string(), Box::new(native));

        let controller = ResponseController::new(
            "conn_0".to_string(),
            remote,
            registry.clone(),
            event_loop.handle(),
            gate,
        );

        Harness {
            event_loop,
            controller,
            registry,
            events,
            data_callback,
        }
    }

    fn events(h: &Harness) -> Vec<String> {
        h.events.lock().unwrap().clone()
    }

    #[test]
    fn test_writes_execute_in_submission_order() {
        let mut h = harness();
        h.controller.write_status(StatusCode::OK);
        h.controller.write_header("X-One", "1");
        h.controller.write_header("X-Two", "2");
        h.controller.end(Bytes::from_static(b"body"));

        h.event_loop.turn();
        assert_eq!(
            events(&h),
            vec!["status:200 OK", "header:X-One=1", "header:X-Two=2", "end:body"]
        );
    }

    #[test]
    fn test_nothing_runs_before_loop_turns() {
        let mut h = harness();
        h.controller.write_status(StatusCode::OK);
        assert!(events(&h).is_empty());
        h.event_loop.turn();
        assert_eq!(events(&h), vec!["status:200 OK"]);
    }

    #[test]
    fn test_end_consumes_registry_entry_and_sets_flag() {
        let mut h = harness();
        h.controller.end("done");
        h.event_loop.turn();

        assert!(h.controller.aborted());
        assert_eq!(h.controller.state(), ResponseState::Ended);
        assert!(!h.registry.contains(&"conn_0".to_string()));
    }

    #[test]
    fn test_writes_after_end_are_noops() {
        let mut h = harness();
        h.controller.end("first");
        h.controller.write_header("X-Late", "1");
        h.controller.write_status(StatusCode::IM_A_TEAPOT);
        h.controller.end("second");
        h.controller.close();

        h.event_loop.turn();
        assert_eq!(events(&h), vec!["end:first"]);
    }

    #[test]
    fn test_writes_after_abort_are_noops() {
        let mut h = harness();
        h.controller.engine_abort();

        h.controller.write_status(StatusCode::OK);
        h.controller.write_header("X-Late", "1");
        h.controller.end("too late");

        assert_eq!(h.event_loop.turn(), 0);
        assert!(events(&h).is_empty());
        assert_eq!(h.controller.state(), ResponseState::Aborted);
    }

    #[test]
    fn test_queued_write_dropped_when_abort_lands_first() {
        let mut h = harness();
        // Queued while still open...
        h.controller.write_header("X-Racing", "1");
        // ...but the engine kills the exchange before the loop runs it.
        h.controller.engine_abort();

        h.event_loop.turn();
        assert!(events(&h).is_empty());
    }

    #[test]
    fn test_queued_end_dropped_when_abort_lands_first() {
        let mut h = harness();
        h.controller.end("never sent");
        h.controller.engine_abort();

        h.event_loop.turn();
        assert!(events(&h).is_empty());
    }

    #[test]
    fn test_close_tears_down() {
        let mut h = harness();
        h.controller.close();
        h.event_loop.turn();

        assert_eq!(events(&h), vec!["close"]);
        assert_eq!(h.controller.state(), ResponseState::Closed);
        assert!(!h.registry.contains(&"conn_0".to_string()));
    }

    #[test]
    fn test_abort_callback_delivered_exactly_once() {
        let mut h = harness();
        let delivered = Arc::new(AtomicUsize::new(0));
        let delivered2 = delivered.clone();
        h.controller.on_aborted(move || {
            delivered2.fetch_add(1, Ordering::SeqCst);
        });

        h.controller.engine_abort();
        h.controller.engine_abort();
        h.event_loop.turn();

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_abort_callback_after_the_fact_delivers_immediately() {
        let h = harness();
        h.controller.engine_abort();

        let delivered = Arc::new(AtomicUsize::new(0));
        let delivered2 = delivered.clone();
        h.controller.on_aborted(move || {
            delivered2.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_abort_delivery_after_clean_end() {
        let mut h = harness();
        let delivered = Arc::new(AtomicUsize::new(0));
        let delivered2 = delivered.clone();
        h.controller.on_aborted(move || {
            delivered2.fetch_add(1, Ordering::SeqCst);
        });

        h.controller.end("bye");
        h.event_loop.turn();
        h.controller.engine_abort();

        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_on_data_chunks_reach_callback() {
        let mut h = harness();
        let chunks = Arc::new(Mutex::new(Vec::new()));
        let chunks2 = chunks.clone();
        h.controller.on_data(move |chunk, is_last| {
            chunks2
                .lock()
                .unwrap()
                .push((String::from_utf8_lossy(chunk).into_owned(), is_last));
        });
        h.event_loop.turn();

        // Play the engine: feed two chunks through the registered callback.
        let mut slot = h.data_callback.lock().unwrap();
        let callback = slot.as_mut().expect("data callback registered");
        callback(b"part1", false);
        callback(b"part2", true);

        assert_eq!(
            *chunks.lock().unwrap(),
            vec![("part1".to_string(), false), ("part2".to_string(), true)]
        );
    }

    #[test]
    fn test_on_data_stops_after_abort() {
        let mut h = harness();
        let chunks = Arc::new(AtomicUsize::new(0));
        let chunks2 = chunks.clone();
        h.controller.on_data(move |_chunk, _is_last| {
            chunks2.fetch_add(1, Ordering::SeqCst);
        });
        h.event_loop.turn();

        let mut slot = h.data_callback.lock().unwrap();
        let callback = slot.as_mut().expect("data callback registered");
        callback(b"before", false);
        h.controller.engine_abort();
        callback(b"after", true);

        assert_eq!(chunks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remote_address_survives_invalidation() {
        let h = harness();
        h.controller.engine_abort();
        assert_eq!(h.controller.remote_address(), "203.0.113.7:49152");
    }

    #[test]
    fn test_end_json_writes_content_type() {
        let mut h = harness();
        h.controller
            .end_json(&serde_json::json!({"ok": true}))
            .unwrap();
        h.event_loop.turn();

        assert_eq!(
            events(&h),
            vec![
                "header:Content-Type=application/json",
                "end:{\"ok\":true}"
            ]
        );
    }

    #[test]
    fn test_cross_thread_submission_lands_in_order() {
        let mut h = harness();
        let controller = h.controller.clone();
        std::thread::spawn(move || {
            controller.write_header("X-From-Worker", "1");
            controller.write_header("X-From-Worker", "2");
            controller.end("worker done");
        })
        .join()
        .unwrap();

        h.event_loop.turn();
        assert_eq!(
            events(&h),
            vec![
                "header:X-From-Worker=1",
                "header:X-From-Worker=2",
                "end:worker done"
            ]
        );
    }

    #[test]
    fn test_clones_share_state() {
        let mut h = harness();
        let clone = h.controller.clone();
        clone.end("from clone");
        h.event_loop.turn();

        assert_eq!(h.controller.state(), ResponseState::Ended);
        assert!(h.controller.aborted());
    }
}
