//! WebSocket handles and lifecycle behaviors.
//!
//! WebSocket events are simpler than HTTP exchanges: the engine invokes
//! `open`/`message`/`close` already on the loop thread and guarantees the
//! native socket's validity only for that call's duration. There is nothing
//! to defer and no flag to check; instead the constraint is encoded in the
//! type: a [`WebSocketHandle`] *borrows* the native socket, so it cannot be
//! stored, sent to another thread, or replayed after the callback returns.
//!
//! Code that needs to act on a connection from a *later* same-thread
//! callback keeps its own bookkeeping (for example a membership set of
//! topic names consulted from the next `message` event) rather than a
//! handle.
//!
//! # Examples
//!
//! ```
//! use veyra_core::ws::{MessageKind, WebSocketHandle, WsBehavior};
//!
//! let behavior = WsBehavior::new()
//!     .on_open(|socket: WebSocketHandle<'_>| {
//!         socket.subscribe("lobby");
//!         socket.send_text("welcome");
//!     })
//!     .on_message(|socket: WebSocketHandle<'_>, payload: &[u8], kind| {
//!         socket.publish("lobby", payload, kind, false);
//!     })
//!     .on_close(|_socket, code, _reason| {
//!         println!("closed with {code}");
//!     });
//! # let _ = behavior;
//! ```

use std::sync::Arc;

use crate::engine::RawSocket;

/// Payload framing, mirroring the engine's text/binary opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// UTF-8 text frame.
    Text,
    /// Binary frame.
    Binary,
}

/// Borrowed handle to one open WebSocket connection.
///
/// Valid exactly as long as the lifecycle callback it was passed to; the
/// borrow makes retaining it a compile error rather than a use-after-free.
/// All operations are synchronous calls straight into the engine.
#[derive(Clone, Copy)]
pub struct WebSocketHandle<'a> {
    raw: &'a dyn RawSocket,
}

impl<'a> WebSocketHandle<'a> {
    /// Wraps a native socket for the duration of one callback.
    pub fn new(raw: &'a dyn RawSocket) -> Self {
        Self { raw }
    }

    /// Sends one message to the peer.
    pub fn send(&self, payload: &[u8], kind: MessageKind) {
        self.raw.send(payload, kind);
    }

    /// Sends a text frame.
    pub fn send_text(&self, message: &str) {
        self.raw.send(message.as_bytes(), MessageKind::Text);
    }

    /// Sends a binary frame.
    pub fn send_binary(&self, payload: &[u8]) {
        self.raw.send(payload, MessageKind::Binary);
    }

    /// Closes the connection.
    pub fn close(&self) {
        self.raw.close();
    }

    /// Subscribes this connection to a pub/sub topic.
    pub fn subscribe(&self, topic: &str) {
        self.raw.subscribe(topic);
    }

    /// Removes this connection from a pub/sub topic.
    pub fn unsubscribe(&self, topic: &str) {
        self.raw.unsubscribe(topic);
    }

    /// Publishes a message to every subscriber of `topic`.
    pub fn publish(&self, topic: &str, payload: &[u8], kind: MessageKind, compress: bool) {
        self.raw.publish(topic, payload, kind, compress);
    }

    /// The peer address.
    pub fn remote_address(&self) -> String {
        self.raw.remote_address()
    }
}

/// Application callbacks for one WebSocket route.
///
/// All callbacks are optional; an omitted event is simply ignored. The
/// adapter wraps each one so it runs inside the runtime gate with a
/// freshly borrowed [`WebSocketHandle`].
#[derive(Clone, Default)]
pub struct WsBehavior {
    pub(crate) open: Option<Arc<dyn for<'a> Fn(WebSocketHandle<'a>) + Send + Sync>>,
    pub(crate) message:
        Option<Arc<dyn for<'a> Fn(WebSocketHandle<'a>, &[u8], MessageKind) + Send + Sync>>,
    pub(crate) close: Option<Arc<dyn for<'a> Fn(WebSocketHandle<'a>, u16, &str) + Send + Sync>>,
}

impl WsBehavior {
    /// Creates a behavior with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the callback invoked when a connection is established.
    pub fn on_open(mut self, callback: impl for<'a> Fn(WebSocketHandle<'a>) + Send + Sync + 'static) -> Self {
        self.open = Some(Arc::new(callback));
        self
    }

    /// Sets the callback invoked for each inbound message.
    pub fn on_message(
        mut self,
        callback: impl for<'a> Fn(WebSocketHandle<'a>, &[u8], MessageKind) + Send + Sync + 'static,
    ) -> Self {
        self.message = Some(Arc::new(callback));
        self
    }

    /// Sets the callback invoked when the connection closes, with the
    /// close code and reason.
    pub fn on_close(
        mut self,
        callback: impl for<'a> Fn(WebSocketHandle<'a>, u16, &str) + Send + Sync + 'static,
    ) -> Self {
        self.close = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for WsBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsBehavior")
            .field("open", &self.open.is_some())
            .field("message", &self.message.is_some())
            .field("close", &self.close.is_some())
            .finish()
    }
}
