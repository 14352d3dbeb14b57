//! Immutable per-request snapshots.
//!
//! The engine's request object is valid only while the registering handler
//! callback runs; its buffers are reused the moment the callback returns.
//! Application code, however, may hold onto request data well past that
//! point, from timers, worker threads, or deferred continuations. The
//! [`RequestSnapshot`] bridges the two lifetimes: it is built synchronously,
//! at handler-invocation time, copies everything it will ever expose, and is
//! immutable from then on.
//!
//! Snapshot construction sits on the attacker-facing path and therefore
//! **never fails**. Malformed input degrades to partial or empty fields:
//!
//! - header iteration stops after [`MAX_HEADERS`] entries, excess is
//!   silently dropped;
//! - header names are case-folded to lowercase, duplicates join with `, `
//!   in arrival order;
//! - positional parameters are read by index up to [`MAX_PARAMS`], in
//!   order, stopping at the first index the engine reports as absent.
//!
//! Positional parameters align 1:1 with the matched
//! [`RoutePattern`](crate::path::RoutePattern)'s capture names; the adapter
//! zips the two with [`with_param_names`](RequestSnapshot::with_param_names)
//! before handing the snapshot to application code.
//!
//! # Examples
//!
//! Reading request data inside a handler:
//!
//! ```
//! use veyra_core::request::RequestSnapshot;
//!
//! fn handle(req: &RequestSnapshot) -> String {
//!     let page = req
//!         .query_params()
//!         .ok()
//!         .and_then(|q| q.get("page").and_then(|v| v.first().cloned()))
//!         .unwrap_or_else(|| "1".to_string());
//!     format!("{} {} page={}", req.method(), req.url(), page)
//! }
//! # let _ = handle;
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::decode::parse_query;
use crate::engine::RawRequest;
use crate::error::Result;

/// Maximum number of header entries copied into a snapshot.
pub const MAX_HEADERS: usize = 100;

/// Maximum number of positional parameters read from the engine's cursor.
pub const MAX_PARAMS: usize = 100;

/// A read-only copy of one HTTP request, safe to use from any thread for as
/// long as the application cares to keep it.
///
/// Built once per request, before the handler callback runs; discarded when
/// the last clone drops.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSnapshot {
    method: String,
    url: String,
    raw_query: String,
    headers: HashMap<String, String>,
    positional_params: Vec<String>,
    params: HashMap<String, String>,
}

impl RequestSnapshot {
    /// Copies everything the snapshot exposes out of the engine's request
    /// object. Never fails; see the [module docs](self) for the
    /// degradation rules.
    pub fn capture(req: &dyn RawRequest) -> Self {
        let mut headers: HashMap<String, String> = HashMap::new();
        let mut entries = 0usize;
        req.for_each_header(&mut |name, value| {
            entries += 1;
            headers
                .entry(name.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
            entries < MAX_HEADERS
        });

        let mut positional_params = Vec::new();
        for index in 0..MAX_PARAMS {
            match req.parameter(index) {
                Some(value) => positional_params.push(value.to_string()),
                None => break,
            }
        }

        Self {
            method: req.method().to_string(),
            url: req.url().to_string(),
            raw_query: req.query().to_string(),
            headers,
            positional_params,
            params: HashMap::new(),
        }
    }

    /// Zips the positional parameters with the capture names of the matched
    /// route pattern, producing the named-parameter view.
    ///
    /// Names beyond what the engine reported are simply absent. Called by
    /// the adapter as the final step of snapshot construction.
    pub fn with_param_names(mut self, names: &[String]) -> Self {
        self.params = names
            .iter()
            .zip(&self.positional_params)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        self
    }

    /// The request method, as the engine reported it.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request path, without the query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The raw query string, without the leading `?`.
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// All headers, keyed by lowercase name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Looks up a header by name, case-insensitively.
    ///
    /// Repeated headers appear joined with `, ` in arrival order.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parses the query string into decoded key/value lists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryLimit`](crate::error::Error::QueryLimit) if
    /// the query exceeds the pair cap; see [`parse_query`].
    pub fn query_params(&self) -> Result<HashMap<String, Vec<String>>> {
        parse_query(&self.raw_query)
    }

    /// The positional parameter at `index`, if the engine reported one.
    pub fn positional_param(&self, index: usize) -> Option<&str> {
        self.positional_params.get(index).map(String::as_str)
    }

    /// All positional parameters, in pattern declaration order.
    pub fn positional_params(&self) -> &[String] {
        &self.positional_params
    }

    /// A named route parameter, e.g. `id` for a `/users/{id}` route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// All named route parameters.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// The `Content-Type` header, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The `Content-Length` header parsed as an integer.
    ///
    /// `None` if the header is absent or not a number.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")?.trim().parse().ok()
    }

    /// Whether the request declares a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }

    /// Whether the request declares a urlencoded form body.
    pub fn is_form(&self) -> bool {
        self.content_type().is_some_and(|ct| {
            ct.to_ascii_lowercase()
                .contains("application/x-www-form-urlencoded")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine request stand-in backed by plain vectors.
    struct MockRequest {
        method: &'static str,
        url: &'static str,
        query: &'static str,
        headers: Vec<(String, String)>,
        params: Vec<String>,
    }

    impl Default for MockRequest {
        fn default() -> Self {
            Self {
                method: "GET",
                url: "/",
                query: "",
                headers: Vec::new(),
                params: Vec::new(),
            }
        }
    }

    impl RawRequest for MockRequest {
        fn method(&self) -> &str {
            self.method
        }
        fn url(&self) -> &str {
            self.url
        }
        fn query(&self) -> &str {
            self.query
        }
        fn for_each_header(&self, visitor: &mut dyn FnMut(&str, &str) -> bool) {
            for (name, value) in &self.headers {
                if !visitor(name, value) {
                    break;
                }
            }
        }
        fn parameter(&self, index: usize) -> Option<&str> {
            self.params.get(index).map(String::as_str)
        }
    }

    #[test]
    fn test_capture_basic_fields() {
        let req = MockRequest {
            method: "POST",
            url: "/api/items",
            query: "limit=10",
            ..Default::default()
        };
        let snapshot = RequestSnapshot::capture(&req);
        assert_eq!(snapshot.method(), "POST");
        assert_eq!(snapshot.url(), "/api/items");
        assert_eq!(snapshot.raw_query(), "limit=10");
    }

    #[test]
    fn test_header_names_case_fold() {
        let req = MockRequest {
            headers: vec![("X-Request-ID".to_string(), "abc".to_string())],
            ..Default::default()
        };
        let snapshot = RequestSnapshot::capture(&req);
        assert_eq!(snapshot.header("x-request-id"), Some("abc"));
        assert_eq!(snapshot.header("X-REQUEST-ID"), Some("abc"));
    }

    #[test]
    fn test_duplicate_headers_join_in_arrival_order() {
        let req = MockRequest {
            headers: vec![
                ("Accept".to_string(), "text/html".to_string()),
                ("accept".to_string(), "application/json".to_string()),
            ],
            ..Default::default()
        };
        let snapshot = RequestSnapshot::capture(&req);
        assert_eq!(
            snapshot.header("accept"),
            Some("text/html, application/json")
        );
    }

    #[test]
    fn test_header_cap_drops_excess() {
        let req = MockRequest {
            headers: (0..150)
                .map(|i| (format!("x-h-{i}"), "v".to_string()))
                .collect(),
            ..Default::default()
        };
        let snapshot = RequestSnapshot::capture(&req);
        assert_eq!(snapshot.headers().len(), 100);
        assert!(snapshot.header("x-h-99").is_some());
        assert!(snapshot.header("x-h-100").is_none());
    }

    #[test]
    fn test_positional_params_in_order() {
        let req = MockRequest {
            params: vec!["books".to_string(), "42".to_string()],
            ..Default::default()
        };
        let snapshot = RequestSnapshot::capture(&req);
        assert_eq!(snapshot.positional_params(), &["books", "42"]);
        assert_eq!(snapshot.positional_param(0), Some("books"));
        assert_eq!(snapshot.positional_param(2), None);
    }

    #[test]
    fn test_param_cap() {
        let req = MockRequest {
            params: (0..500).map(|i| i.to_string()).collect(),
            ..Default::default()
        };
        let snapshot = RequestSnapshot::capture(&req);
        assert_eq!(snapshot.positional_params().len(), MAX_PARAMS);
    }

    #[test]
    fn test_named_params_zip_with_pattern() {
        let req = MockRequest {
            params: vec!["books".to_string(), "42".to_string()],
            ..Default::default()
        };
        let names = vec!["category".to_string(), "post_id".to_string()];
        let snapshot = RequestSnapshot::capture(&req).with_param_names(&names);
        assert_eq!(snapshot.param("category"), Some("books"));
        assert_eq!(snapshot.param("post_id"), Some("42"));
        assert_eq!(snapshot.param("missing"), None);
    }

    #[test]
    fn test_named_params_with_short_engine_report() {
        // Engine reported fewer values than the pattern captures.
        let req = MockRequest {
            params: vec!["only".to_string()],
            ..Default::default()
        };
        let names = vec!["a".to_string(), "b".to_string()];
        let snapshot = RequestSnapshot::capture(&req).with_param_names(&names);
        assert_eq!(snapshot.param("a"), Some("only"));
        assert_eq!(snapshot.param("b"), None);
    }

    #[test]
    fn test_query_params_parse() {
        let req = MockRequest {
            query: "q=rust&q=tokio&empty=",
            ..Default::default()
        };
        let snapshot = RequestSnapshot::capture(&req);
        let params = snapshot.query_params().unwrap();
        assert_eq!(params["q"], vec!["rust", "tokio"]);
        assert_eq!(params["empty"], vec![""]);
    }

    #[test]
    fn test_content_helpers() {
        let req = MockRequest {
            headers: vec![
                (
                    "Content-Type".to_string(),
                    "application/json; charset=utf-8".to_string(),
                ),
                ("Content-Length".to_string(), "42".to_string()),
            ],
            ..Default::default()
        };
        let snapshot = RequestSnapshot::capture(&req);
        assert_eq!(
            snapshot.content_type(),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(snapshot.content_length(), Some(42));
        assert!(snapshot.is_json());
        assert!(!snapshot.is_form());
    }

    #[test]
    fn test_content_length_garbage_degrades_to_none() {
        let req = MockRequest {
            headers: vec![("Content-Length".to_string(), "lots".to_string())],
            ..Default::default()
        };
        let snapshot = RequestSnapshot::capture(&req);
        assert_eq!(snapshot.content_length(), None);
    }

    #[test]
    fn test_is_form() {
        let req = MockRequest {
            headers: vec![(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            ..Default::default()
        };
        let snapshot = RequestSnapshot::capture(&req);
        assert!(snapshot.is_form());
        assert!(!snapshot.is_json());
    }
}
