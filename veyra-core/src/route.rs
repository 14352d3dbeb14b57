//! Route table and engine binding.
//!
//! Registration happens in two phases, mirroring how the engine itself
//! works. Applications first declare routes against a [`RouteTable`] using
//! the human-friendly pattern syntax; each declaration compiles its pattern
//! once, up front. [`bind`](RouteTable::bind) then registers one native
//! handler per route with the engine.
//!
//! The bound handler is the seam where native state crosses into
//! application code, and it performs the entire crossing ritual on the
//! engine's loop thread, in order:
//!
//! 1. capture the [`RequestSnapshot`] while the engine's request buffers
//!    are still valid, and zip in the compiled pattern's parameter names;
//! 2. copy the remote address out of the native response;
//! 3. move the native response into the
//!    [`ConnectionRegistry`](crate::registry::ConnectionRegistry) under a
//!    fresh [`ConnectionId`] and build the
//!    [`ResponseController`](crate::response::ResponseController) over it;
//! 4. wire the engine's abort signal to the controller;
//! 5. enter the [`RuntimeGate`](crate::runtime::RuntimeGate) and invoke the
//!    application callback, releasing the gate before returning to the
//!    engine.
//!
//! WebSocket routes skip the registry: their handles are borrowed per
//! callback and never outlive it.
//!
//! # Examples
//!
//! ```
//! use http::StatusCode;
//! use veyra_core::route::RouteTable;
//! use veyra_core::ws::WsBehavior;
//!
//! let table = RouteTable::new()
//!     .get("/posts/{category}/{post_id}", |req, res| {
//!         let category = req.param("category").unwrap_or("unknown").to_string();
//!         res.write_status(StatusCode::OK);
//!         res.end(category);
//!     })
//!     .websocket("/live", WsBehavior::new().on_open(|socket| {
//!         socket.subscribe("updates");
//!     }));
//! # let _ = table;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use http::Method;
use tracing::info;

use crate::engine::{Engine, NativeHttpHandler, NativeWsHandlers};
use crate::event_loop::LoopHandle;
use crate::path::RoutePattern;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::request::RequestSnapshot;
use crate::response::ResponseController;
use crate::runtime::RuntimeGate;
use crate::ws::{WebSocketHandle, WsBehavior};

/// Application callback for one HTTP route.
pub type RouteCallback = Arc<dyn Fn(RequestSnapshot, ResponseController) + Send + Sync>;

/// One registered HTTP route: verb filter, compiled pattern, callback.
pub struct Route {
    method: Option<Method>,
    pattern: RoutePattern,
    callback: RouteCallback,
}

impl Route {
    /// The verb this route answers, or `None` for any verb.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }
}

/// One registered WebSocket route.
pub struct WsRoute {
    pattern: RoutePattern,
    behavior: WsBehavior,
}

impl WsRoute {
    /// The compiled pattern.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }
}

/// Shared machinery the bound handlers need at request time.
///
/// One bridge per application: the connection registry, the runtime gate,
/// the loop handle for deferral, and the connection id counter.
pub struct EngineBridge {
    registry: Arc<ConnectionRegistry>,
    gate: Arc<RuntimeGate>,
    loop_handle: LoopHandle,
    counter: AtomicU64,
}

impl EngineBridge {
    /// Creates a bridge deferring onto the given loop.
    pub fn new(loop_handle: LoopHandle) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            gate: Arc::new(RuntimeGate::new()),
            loop_handle,
            counter: AtomicU64::new(0),
        }
    }

    /// The registry of live exchanges.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// The runtime gate every callback enters.
    pub fn gate(&self) -> &Arc<RuntimeGate> {
        &self.gate
    }

    /// Mints a fresh connection id.
    pub fn next_connection_id(&self) -> ConnectionId {
        format!("conn_{}", self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

/// Declarative table of HTTP and WebSocket routes.
///
/// Built once at startup with the builder methods, then bound to an engine
/// with [`bind`](RouteTable::bind). Compiled patterns are immutable from
/// then on.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    ws_routes: Vec<WsRoute>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route for one verb.
    ///
    /// The pattern is compiled here, once, and owns its parameter-name
    /// order for the life of the table.
    pub fn route(
        mut self,
        method: Method,
        path: &str,
        callback: impl Fn(RequestSnapshot, ResponseController) + Send + Sync + 'static,
    ) -> Self {
        self.routes.push(Route {
            method: Some(method),
            pattern: RoutePattern::compile(path),
            callback: Arc::new(callback),
        });
        self
    }

    /// Registers a route answering every verb.
    pub fn any(
        mut self,
        path: &str,
        callback: impl Fn(RequestSnapshot, ResponseController) + Send + Sync + 'static,
    ) -> Self {
        self.routes.push(Route {
            method: None,
            pattern: RoutePattern::compile(path),
            callback: Arc::new(callback),
        });
        self
    }

    /// Registers a `GET` route.
    pub fn get(
        self,
        path: &str,
        callback: impl Fn(RequestSnapshot, ResponseController) + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::GET, path, callback)
    }

    /// Registers a `POST` route.
    pub fn post(
        self,
        path: &str,
        callback: impl Fn(RequestSnapshot, ResponseController) + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::POST, path, callback)
    }

    /// Registers a `PUT` route.
    pub fn put(
        self,
        path: &str,
        callback: impl Fn(RequestSnapshot, ResponseController) + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::PUT, path, callback)
    }

    /// Registers a `DELETE` route.
    pub fn delete(
        self,
        path: &str,
        callback: impl Fn(RequestSnapshot, ResponseController) + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::DELETE, path, callback)
    }

    /// Registers a `PATCH` route.
    pub fn patch(
        self,
        path: &str,
        callback: impl Fn(RequestSnapshot, ResponseController) + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::PATCH, path, callback)
    }

    /// Registers a `HEAD` route.
    pub fn head(
        self,
        path: &str,
        callback: impl Fn(RequestSnapshot, ResponseController) + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::HEAD, path, callback)
    }

    /// Registers an `OPTIONS` route.
    pub fn options(
        self,
        path: &str,
        callback: impl Fn(RequestSnapshot, ResponseController) + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::OPTIONS, path, callback)
    }

    /// Registers a WebSocket route.
    pub fn websocket(mut self, path: &str, behavior: WsBehavior) -> Self {
        self.ws_routes.push(WsRoute {
            pattern: RoutePattern::compile(path),
            behavior,
        });
        self
    }

    /// The registered HTTP routes, in declaration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The registered WebSocket routes, in declaration order.
    pub fn ws_routes(&self) -> &[WsRoute] {
        &self.ws_routes
    }

    /// Registers every route with the engine.
    ///
    /// Each HTTP route becomes one native handler that performs the full
    /// native-to-application crossing described in the [module docs](self).
    pub fn bind(&self, engine: &mut dyn Engine, bridge: &Arc<EngineBridge>) {
        for route in &self.routes {
            let verb = match &route.method {
                Some(method) => method.as_str().to_ascii_lowercase(),
                None => "any".to_string(),
            };
            let param_names = route.pattern.param_names().to_vec();
            let callback = route.callback.clone();
            let bridge = bridge.clone();

            let native: NativeHttpHandler = Box::new(move |req, res| {
                // The engine reuses its request buffers the moment this
                // callback returns; everything is copied now.
                let snapshot = RequestSnapshot::capture(req).with_param_names(&param_names);

                let id = bridge.next_connection_id();
                let remote_address = res.remote_address();
                bridge.registry.insert(id.clone(), res);

                let controller = ResponseController::new(
                    id.clone(),
                    remote_address,
                    bridge.registry.clone(),
                    bridge.loop_handle.clone(),
                    bridge.gate.clone(),
                );

                let abort_controller = controller.clone();
                let wired = bridge.registry.with(&id, |raw| {
                    raw.on_aborted(Box::new(move || abort_controller.engine_abort()));
                });
                debug_assert!(wired.is_some(), "freshly inserted response must resolve");

                let _scope = bridge.gate.enter();
                callback(snapshot, controller);
            });

            info!(
                method = %verb,
                pattern = %route.pattern.engine_pattern(),
                "registered route"
            );
            engine.register_http(&verb, route.pattern.engine_pattern(), native);
        }

        for ws_route in &self.ws_routes {
            let behavior = ws_route.behavior.clone();
            let mut native = NativeWsHandlers::default();

            if let Some(open) = behavior.open {
                let gate = bridge.gate.clone();
                native.open = Some(Box::new(move |raw| {
                    let _scope = gate.enter();
                    open(WebSocketHandle::new(raw));
                }));
            }
            if let Some(message) = behavior.message {
                let gate = bridge.gate.clone();
                native.message = Some(Box::new(move |raw, payload, kind| {
                    let _scope = gate.enter();
                    message(WebSocketHandle::new(raw), payload, kind);
                }));
            }
            if let Some(close) = behavior.close {
                let gate = bridge.gate.clone();
                native.close = Some(Box::new(move |raw, code, reason| {
                    let _scope = gate.enter();
                    close(WebSocketHandle::new(raw), code, reason);
                }));
            }

            info!(pattern = %ws_route.pattern.engine_pattern(), "registered websocket route");
            engine.register_ws(ws_route.pattern.engine_pattern(), native);
        }
    }
}
