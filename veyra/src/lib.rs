//! # Veyra - Event-Loop Web Framework Bindings for Rust
//!
//! Veyra is a web framework core built around a single-threaded, event-loop
//! network engine. This crate is the user-facing facade over
//! [`veyra-core`](veyra_core), which implements the binding layer: route
//! compilation, request snapshots, abort-safe response controllers,
//! WebSocket handles, and the wire-format parsers behind them.
//!
//! ## 🌟 Key Features
//!
//! - **🛡️ Use-after-free containment**: native connection state is reached
//!   only through an id-indexed registry with an explicit "gone" result
//! - **⚡ Non-blocking by construction**: cross-thread work is expressed as
//!   deferred tasks onto the engine's loop thread, never as blocking waits
//! - **🧵 One-callback-at-a-time**: the embedding runtime's serialization
//!   requirement is a single explicit scope guard at every boundary
//! - **🔒 Injection-safe cookies**: validated names, quoted values, and an
//!   end-to-end control-character scan on every `Set-Cookie` header
//! - **🧭 Declarative routes**: `/posts/{category}/{post_id}` compiles once
//!   to the engine's native pattern, preserving parameter order
//! - **📦 Attacker-resistant parsing**: percent-decoding and query parsing
//!   that degrade instead of crashing, with hard resource caps
//!
//! ## Quick Start
//!
//! Add Veyra to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! veyra = "0.1.0"
//! ```
//!
//! Declare routes and bind them to an engine:
//!
//! ```
//! use veyra::http::StatusCode;
//! use veyra::prelude::*;
//!
//! let table = RouteTable::new()
//!     .get("/users/{id}", |req, res| {
//!         let id = req.param("id").unwrap_or("unknown").to_string();
//!         res.write_status(StatusCode::OK);
//!         res.end(format!("user {id}"));
//!     })
//!     .websocket("/live", WsBehavior::new().on_message(|socket, payload, kind| {
//!         socket.send(payload, kind);
//!     }));
//!
//! // table.bind(&mut engine, &bridge) registers everything natively.
//! # let _ = table;
//! ```
//!
//! ## Handling responses from other threads
//!
//! A [`ResponseController`](veyra_core::response::ResponseController) can
//! be moved to a worker thread and completed later; if the peer disconnects
//! first, every operation becomes a silent no-op:
//!
//! ```no_run
//! use veyra::prelude::*;
//!
//! fn handle(req: RequestSnapshot, res: ResponseController) {
//!     std::thread::spawn(move || {
//!         let report = expensive_report(&req);
//!         res.write_header("Content-Type", "text/csv");
//!         res.end(report);
//!     });
//! }
//! # fn expensive_report(_req: &RequestSnapshot) -> String { String::new() }
//! ```
//!
//! ## Setting cookies
//!
//! ```
//! use veyra::prelude::*;
//!
//! let header = CookieDescriptor::new("session", "abc123")
//!     .secure(true)
//!     .http_only(true)
//!     .same_site(SameSite::Strict)
//!     .serialize()
//!     .unwrap();
//! assert_eq!(header, "session=abc123; Path=/; Secure; HttpOnly; SameSite=Strict");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub use veyra_core::*;

/// Commonly used types and traits for Veyra applications.
///
/// # Examples
///
/// ```
/// use veyra::prelude::*;
///
/// let table = RouteTable::new().get("/", |_req, res| {
///     res.end("hello");
/// });
/// # let _ = table;
/// ```
pub mod prelude {
    pub use veyra_core::prelude::*;
}
