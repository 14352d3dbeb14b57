//! # Veyra Core - Engine Binding Layer
//!
//! `veyra-core` is the native binding layer of the Veyra web framework. It
//! sits between a single-threaded, event-loop-driven network engine and the
//! application callbacks built on top of it, and it owns the two hard
//! problems of that position:
//!
//! - **Lifetime containment.** The engine may invalidate any native
//!   connection object at any moment (disconnect, completion, timeout)
//!   while application code may act on a handed-out handle at any time,
//!   from any thread. Request state is therefore copied into immutable
//!   snapshots up front, response mutations travel as deferred tasks that
//!   re-validate against an id-indexed registry at execution time, and
//!   WebSocket handles are borrows that cannot outlive their callback.
//! - **Attacker-resistant wire parsing.** Percent-decoding, query strings,
//!   header maps, and `Set-Cookie` construction all follow strict
//!   degradation and validation rules: hostile input is truncated or
//!   passed through literally, never crashed on; injection attempts are
//!   rejected loudly, never sanitized silently.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Application                           │
//! │        handlers over RequestSnapshot / ResponseController    │
//! │                      / WebSocketHandle                       │
//! └──────────────────────────────────────────────────────────────┘
//!                               │  RuntimeGate (one callback at a time)
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Veyra Core                           │
//! │  ┌───────────┐ ┌────────────┐ ┌───────────────────────────┐  │
//! │  │ RouteTable│ │ Connection │ │ EventLoop deferred tasks  │  │
//! │  │  + paths  │ │  Registry  │ │  (loop thread only)       │  │
//! │  └───────────┘ └────────────┘ └───────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!                               │  Raw* traits
//! ┌──────────────────────────────────────────────────────────────┐
//! │              Native engine (socket I/O, HTTP, WS)            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`path`]: declarative route patterns compiled to engine syntax
//! - [`decode`]: percent and query-string decoding
//! - [`cookie`]: injection-safe `Set-Cookie` serialization
//! - [`request`]: immutable per-request snapshots
//! - [`response`]: abort-safe response controllers
//! - [`ws`]: borrowed WebSocket handles and behaviors
//! - [`route`]: the route table and engine binding
//! - [`engine`]: traits describing the native engine
//! - [`registry`]: id-indexed registry of live native responses
//! - [`event_loop`]: deferred execution onto the loop thread
//! - [`runtime`]: the embedding runtime's serialization gate
//! - [`error`]: error types and result handling
//!
//! ## Quick Start
//!
//! ```
//! use http::StatusCode;
//! use veyra_core::prelude::*;
//!
//! let table = RouteTable::new()
//!     .get("/users/{id}", |req, res| {
//!         let id = req.param("id").unwrap_or("unknown").to_string();
//!         res.write_status(StatusCode::OK);
//!         res.write_header("Content-Type", "text/plain");
//!         res.end(format!("user {id}"));
//!     })
//!     .websocket("/live", WsBehavior::new().on_message(|socket, payload, kind| {
//!         socket.send(payload, kind);
//!     }));
//!
//! // At startup the table is bound to an engine implementation:
//! // table.bind(&mut engine, &bridge);
//! # let _ = table;
//! ```
//!
//! ## Threading Model
//!
//! One event-loop thread owns every native connection object and is the
//! only thread that touches them. Application callbacks run synchronously
//! on that thread for the event that triggered them, but may spawn
//! continuations anywhere; anything those continuations do to a response is
//! deferred back onto the loop thread and re-validated at execution time.
//! The [`runtime::RuntimeGate`] serializes every entry into application
//! code, exactly like the embedding runtime's own lock would.

// Enable documentation features for docs.rs
#![cfg_attr(docsrs, feature(doc_cfg))]
// Deny missing docs to ensure comprehensive documentation
#![warn(missing_docs)]

/// Re-export of the [`http`] crate, whose `Method` and `StatusCode` types
/// appear throughout this API.
pub use http;

pub mod cookie;
pub mod decode;
pub mod engine;
pub mod error;
pub mod event_loop;
pub mod path;
pub mod registry;
pub mod request;
pub mod response;
pub mod route;
pub mod runtime;
pub mod ws;

pub use cookie::{CookieDescriptor, SameSite, format_cookie};
pub use decode::{decode_component, parse_query};
pub use error::{Error, Result};
pub use event_loop::{EventLoop, LoopHandle};
pub use path::RoutePattern;
pub use registry::{ConnectionId, ConnectionRegistry};
pub use request::RequestSnapshot;
pub use response::{ResponseController, ResponseState};
pub use route::{EngineBridge, Route, RouteTable};
pub use runtime::{CallbackScope, RuntimeGate};
pub use ws::{MessageKind, WebSocketHandle, WsBehavior};

/// Commonly used types for applications built on the Veyra binding core.
///
/// # Examples
///
/// ```
/// use veyra_core::prelude::*;
///
/// let table = RouteTable::new().get("/", |_req, res| {
///     res.end("hello");
/// });
/// # let _ = table;
/// ```
pub mod prelude {
    pub use crate::cookie::{CookieDescriptor, SameSite, format_cookie};
    pub use crate::decode::{decode_component, parse_query};
    pub use crate::error::{Error, Result};
    pub use crate::event_loop::{EventLoop, LoopHandle};
    pub use crate::path::RoutePattern;
    pub use crate::registry::{ConnectionId, ConnectionRegistry};
    pub use crate::request::RequestSnapshot;
    pub use crate::response::{ResponseController, ResponseState};
    pub use crate::route::{EngineBridge, RouteTable};
    pub use crate::runtime::RuntimeGate;
    pub use crate::ws::{MessageKind, WebSocketHandle, WsBehavior};
}
