//! The embedding runtime's serialization boundary.
//!
//! Application callbacks execute inside an embedded runtime that permits at
//! most one thread in application code at a time. Rather than sprinkling
//! lock calls through every call site, the requirement is modeled as a
//! single explicit scope guard: every boundary that is about to run
//! application code (request handlers, streaming data callbacks, abort
//! callbacks, WebSocket lifecycle events) calls [`RuntimeGate::enter`] and
//! holds the returned [`CallbackScope`] for exactly the duration of the
//! callback. Dropping the scope releases the runtime before control returns
//! to the engine.
//!
//! The gate is not reentrant: a callback must not call back into
//! [`RuntimeGate::enter`] on the same thread, which mirrors how embedded
//! runtimes behave when their serialization lock is already held.
//!
//! # Examples
//!
//! ```
//! use veyra_core::runtime::RuntimeGate;
//!
//! let gate = RuntimeGate::new();
//!
//! {
//!     let _scope = gate.enter();
//!     // application callback runs here
//! } // released before returning to the engine
//!
//! let _scope = gate.enter(); // free again
//! ```

use std::sync::{Mutex, MutexGuard};

use tracing::trace;

/// Serializes entry into the embedding runtime.
///
/// One gate exists per bound application; every callback boundary in the
/// binding layer enters it before touching application code.
#[derive(Debug, Default)]
pub struct RuntimeGate {
    lock: Mutex<()>,
}

/// Proof that the current thread is inside the embedding runtime.
///
/// Held for the full duration of one application callback. Releases the
/// gate on drop.
#[must_use = "the scope must be held for the duration of the callback"]
pub struct CallbackScope<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl RuntimeGate {
    /// Creates a new, unheld gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters the runtime, blocking until no other callback is running.
    ///
    /// A panic inside a previous callback does not wedge the gate; the
    /// poisoned lock is recovered, since there is no state under the lock
    /// to be left inconsistent.
    pub fn enter(&self) -> CallbackScope<'_> {
        let guard = self
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        trace!("entered runtime callback scope");
        CallbackScope { _guard: guard }
    }
}

impl Drop for CallbackScope<'_> {
    fn drop(&mut self) {
        trace!("left runtime callback scope");
    }
}
