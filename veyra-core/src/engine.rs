//! Traits describing the native network engine.
//!
//! The binding layer never owns socket I/O. An external, single-threaded,
//! event-loop-driven engine parses HTTP and WebSocket traffic and hands the
//! binding layer short-lived native objects; everything this crate knows
//! about those objects is captured by the traits here.
//!
//! - [`RawRequest`] is the engine's view of one parsed request. It is valid
//!   only while the registering handler callback runs, because the engine
//!   reuses its buffers immediately afterwards; the binding layer therefore
//!   copies everything it needs into a
//!   [`RequestSnapshot`](crate::request::RequestSnapshot) up front.
//! - [`RawResponse`] is the writable side of one in-flight exchange. After
//!   registration it lives in the
//!   [`ConnectionRegistry`](crate::registry::ConnectionRegistry) and is only
//!   touched from the loop thread.
//! - [`RawSocket`] is one open WebSocket connection, valid for the duration
//!   of the lifecycle callback that received it.
//! - [`Engine`] is the registration surface the route table binds against.
//!
//! Production integrations implement these traits over the real native
//! objects; the test suite drives them with in-process mocks.

use crate::ws::MessageKind;

/// Streaming body callback: one chunk plus a flag marking the final chunk.
pub type DataCallback = Box<dyn FnMut(&[u8], bool) + Send>;

/// Abort notification callback. Invoked at most once, on the loop thread.
pub type AbortCallback = Box<dyn FnOnce() + Send>;

/// The engine's view of one parsed, matched HTTP request.
///
/// Implementations expose borrowed data only; nothing here may allocate or
/// survive the handler callback that received the request.
pub trait RawRequest {
    /// The request method as the engine reports it.
    fn method(&self) -> &str;

    /// The request path, without the query string.
    fn url(&self) -> &str;

    /// The raw query string, without the leading `?`.
    fn query(&self) -> &str;

    /// Visits headers in arrival order until the visitor returns `false`
    /// or the headers are exhausted.
    fn for_each_header(&self, visitor: &mut dyn FnMut(&str, &str) -> bool);

    /// The positional route parameter at `index`, or `None` once the
    /// matched pattern has no further captures.
    fn parameter(&self, index: usize) -> Option<&str>;
}

/// The writable native side of one in-flight HTTP exchange.
///
/// Owned by the loop thread for its entire life. Every method is callable
/// from that thread only; the binding layer enforces this by funneling all
/// calls through deferred tasks.
pub trait RawResponse: Send + Sync {
    /// Writes the status line, e.g. `200 OK`.
    fn write_status(&self, status: &str);

    /// Writes one response header.
    fn write_header(&self, name: &str, value: &str);

    /// Writes the body and completes the exchange. The native object is
    /// invalid afterwards.
    fn end(&self, body: &[u8]);

    /// Tears the connection down without a response. The native object is
    /// invalid afterwards.
    fn close(&self);

    /// Registers the streaming body callback. The engine invokes it on the
    /// loop thread as chunks arrive.
    fn on_data(&self, callback: DataCallback);

    /// Registers the abort callback the engine fires when the peer
    /// disconnects mid-exchange.
    fn on_aborted(&self, callback: AbortCallback);

    /// The peer address, e.g. `203.0.113.7:49152`.
    fn remote_address(&self) -> String;
}

/// One open WebSocket connection.
///
/// The engine guarantees validity only for the duration of the lifecycle
/// callback that received it, so the binding layer hands applications a
/// borrowed [`WebSocketHandle`](crate::ws::WebSocketHandle) rather than an
/// owned wrapper.
pub trait RawSocket {
    /// Sends one message to the peer.
    fn send(&self, payload: &[u8], kind: MessageKind);

    /// Closes the connection.
    fn close(&self);

    /// Subscribes this connection to a pub/sub topic.
    fn subscribe(&self, topic: &str);

    /// Removes this connection from a pub/sub topic.
    fn unsubscribe(&self, topic: &str);

    /// Publishes a message to every connection subscribed to `topic`.
    fn publish(&self, topic: &str, payload: &[u8], kind: MessageKind, compress: bool);

    /// The peer address.
    fn remote_address(&self) -> String;
}

/// A route handler in the form the engine invokes it: the parsed request
/// plus ownership of the native response object.
pub type NativeHttpHandler = Box<dyn Fn(&dyn RawRequest, Box<dyn RawResponse>) + Send + Sync>;

/// WebSocket lifecycle callbacks in the form the engine invokes them.
///
/// All of them run on the loop thread; the socket reference is valid only
/// until the callback returns.
#[derive(Default)]
pub struct NativeWsHandlers {
    /// Invoked once the connection is established.
    pub open: Option<Box<dyn Fn(&dyn RawSocket) + Send + Sync>>,
    /// Invoked per inbound message.
    pub message: Option<Box<dyn Fn(&dyn RawSocket, &[u8], MessageKind) + Send + Sync>>,
    /// Invoked when the connection closes, with the close code and reason.
    pub close: Option<Box<dyn Fn(&dyn RawSocket, u16, &str) + Send + Sync>>,
}

/// The engine's registration surface.
///
/// The route table compiles its patterns and binds them here once, before
/// the engine starts serving; engines are not required to support
/// registration while running.
pub trait Engine {
    /// Registers an HTTP handler. `method` is lowercase (`get`, `post`,
    /// ...) or `any`; `pattern` is in the engine's native syntax as
    /// produced by [`RoutePattern::compile`](crate::path::RoutePattern::compile).
    fn register_http(&mut self, method: &str, pattern: &str, handler: NativeHttpHandler);

    /// Registers WebSocket lifecycle handlers for a pattern.
    fn register_ws(&mut self, pattern: &str, handlers: NativeWsHandlers);
}
