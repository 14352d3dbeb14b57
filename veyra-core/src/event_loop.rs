//! Deferred execution onto the engine's event-loop thread.
//!
//! One event-loop thread owns every native connection object, and it is the
//! only thread permitted to touch them. Work originating anywhere else
//! (a response write issued from a worker thread, a header queued from a
//! timer continuation) is expressed as a *deferred task*: a closure
//! submitted through a [`LoopHandle`] and executed later, in submission
//! order, by the [`EventLoop`] running on the loop thread.
//!
//! Tasks submitted from the same thread run in submission order; tasks
//! interleaved from multiple threads have no cross-thread ordering guarantee
//! beyond "earlier-submitted tasks run to completion before later ones."
//! Nothing blocks: submission is a channel send, and a submission after the
//! loop has shut down is a silent no-op.
//!
//! # Examples
//!
//! ```
//! use veyra_core::event_loop::EventLoop;
//!
//! let mut event_loop = EventLoop::new();
//! let handle = event_loop.handle();
//!
//! handle.defer(|| println!("runs on the loop thread"));
//! assert_eq!(event_loop.turn(), 1);
//! ```

use tokio::sync::mpsc;
use tracing::{debug, trace};

/// A unit of work queued for the event-loop thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Cheaply cloneable submitter of deferred tasks.
///
/// Handles may be held and used from any thread. Everything a task needs is
/// captured at submission; the closure runs later with no reply channel, so
/// results are communicated through whatever shared state the task captured.
#[derive(Clone)]
pub struct LoopHandle {
    tx: mpsc::UnboundedSender<Task>,
}

impl LoopHandle {
    /// Submits a task to run on the event-loop thread.
    ///
    /// If the loop has already shut down the task is dropped silently;
    /// by that point every native object the task could have touched is
    /// gone as well.
    pub fn defer(&self, task: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(task)).is_err() {
            trace!("event loop gone; dropping deferred task");
        }
    }
}

/// The consuming side of the deferred-task queue.
///
/// In production the engine integration calls [`run`](EventLoop::run) from
/// the loop thread. Tests (and mock engines) use [`turn`](EventLoop::turn)
/// to drain the queue deterministically from the current thread, which then
/// plays the role of the loop thread.
pub struct EventLoop {
    tx: mpsc::UnboundedSender<Task>,
    rx: mpsc::UnboundedReceiver<Task>,
}

impl EventLoop {
    /// Creates an empty task queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Returns a new handle for submitting tasks to this loop.
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            tx: self.tx.clone(),
        }
    }

    /// Runs queued tasks until every [`LoopHandle`] has been dropped.
    ///
    /// Must be called from the thread that owns the native connection
    /// objects. Tasks execute strictly in queue order.
    pub async fn run(self) {
        let EventLoop { tx, mut rx } = self;
        // The loop's own sender would otherwise keep the channel open
        // forever.
        drop(tx);

        while let Some(task) = rx.recv().await {
            task();
        }
        debug!("event loop drained; all handles dropped");
    }

    /// Synchronously executes every task queued so far, returning how many
    /// ran.
    ///
    /// The caller becomes the loop thread for the duration of the call.
    pub fn turn(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
