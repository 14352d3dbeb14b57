//! Route pattern compilation.
//!
//! Application routes are declared in a human-friendly syntax and compiled
//! once, at registration time, into the pattern syntax the network engine
//! matches natively:
//!
//! - a literal segment matches verbatim,
//! - `{name}` captures one segment and becomes `/:name`,
//! - a bare `*` passes through for engine-native wildcard handling.
//!
//! Compilation also records the capture names in declaration order. The
//! engine later reports matched values by index only, so the ordered name
//! list is what lets the adapter map index `i` back to `{name}`.
//!
//! # Examples
//!
//! ```
//! use veyra_core::path::RoutePattern;
//!
//! let route = RoutePattern::compile("/posts/{category}/{post_id}");
//! assert_eq!(route.engine_pattern(), "/posts/:category/:post_id");
//! assert_eq!(route.param_names(), &["category", "post_id"]);
//! ```

/// A compiled route pattern.
///
/// Created once when a route is registered, then owned (immutably) by the
/// route table for the lifetime of the application. The number of entries in
/// [`param_names`](RoutePattern::param_names) always equals the number of
/// `{}` groups in the source pattern, and their order is declaration order.
///
/// # Examples
///
/// ```
/// use veyra_core::path::RoutePattern;
///
/// let route = RoutePattern::compile("/users/{id}/files/*");
/// assert_eq!(route.pattern(), "/users/{id}/files/*");
/// assert_eq!(route.engine_pattern(), "/users/:id/files/*");
/// assert_eq!(route.param_names(), &["id"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pattern: String,
    engine_pattern: String,
    param_names: Vec<String>,
}

impl RoutePattern {
    /// Compiles a declarative route pattern into its engine-native form.
    ///
    /// The pattern is split on `/`; empty segments (leading, trailing, or
    /// doubled slashes) are dropped. Each `{name}` segment strips its braces,
    /// appends the inner text to the capture list, and emits `/:name`. Every
    /// other segment, including a bare `*`, is emitted verbatim. A pattern
    /// that produces no segments compiles to `/`.
    ///
    /// Pure and deterministic: the same input always yields the same output,
    /// and nothing is validated against the engine here.
    ///
    /// # Examples
    ///
    /// ```
    /// use veyra_core::path::RoutePattern;
    ///
    /// assert_eq!(RoutePattern::compile("/").engine_pattern(), "/");
    /// assert_eq!(RoutePattern::compile("").engine_pattern(), "/");
    /// assert_eq!(RoutePattern::compile("/static/*").engine_pattern(), "/static/*");
    /// ```
    pub fn compile(pattern: &str) -> Self {
        let mut param_names = Vec::new();
        let mut engine_pattern = String::new();

        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            if let Some(name) = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            {
                param_names.push(name.to_string());
                engine_pattern.push_str("/:");
                engine_pattern.push_str(name);
            } else {
                engine_pattern.push('/');
                engine_pattern.push_str(segment);
            }
        }

        if engine_pattern.is_empty() {
            engine_pattern.push('/');
        }

        Self {
            pattern: pattern.to_string(),
            engine_pattern,
            param_names,
        }
    }

    /// Returns the pattern as it was declared.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the pattern in the engine's native syntax.
    pub fn engine_pattern(&self) -> &str {
        &self.engine_pattern
    }

    /// Returns the capture names in declaration order.
    ///
    /// Index-aligned with the positional values the engine reports for a
    /// matched request.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_literal_path() {
        let route = RoutePattern::compile("/api/users");
        assert_eq!(route.engine_pattern(), "/api/users");
        assert!(route.param_names().is_empty());
    }

    #[test]
    fn test_compile_captures_in_order() {
        let route = RoutePattern::compile("/posts/{category}/{post_id}");
        assert_eq!(route.engine_pattern(), "/posts/:category/:post_id");
        assert_eq!(route.param_names(), &["category", "post_id"]);
    }

    #[test]
    fn test_compile_mixed_segments() {
        let route = RoutePattern::compile("/users/{id}/files/{name}");
        assert_eq!(route.engine_pattern(), "/users/:id/files/:name");
        assert_eq!(route.param_names(), &["id", "name"]);
    }

    #[test]
    fn test_compile_wildcard_passes_through() {
        let route = RoutePattern::compile("/static/*");
        assert_eq!(route.engine_pattern(), "/static/*");
        assert!(route.param_names().is_empty());
    }

    #[test]
    fn test_compile_empty_maps_to_root() {
        assert_eq!(RoutePattern::compile("").engine_pattern(), "/");
        assert_eq!(RoutePattern::compile("/").engine_pattern(), "/");
        assert_eq!(RoutePattern::compile("///").engine_pattern(), "/");
    }

    #[test]
    fn test_compile_ignores_empty_segments() {
        let route = RoutePattern::compile("//api//{id}/");
        assert_eq!(route.engine_pattern(), "/api/:id");
        assert_eq!(route.param_names(), &["id"]);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let a = RoutePattern::compile("/a/{b}/c");
        let b = RoutePattern::compile("/a/{b}/c");
        assert_eq!(a, b);
    }

    #[test]
    fn test_unbalanced_braces_stay_literal() {
        let route = RoutePattern::compile("/a/{b/c}");
        assert_eq!(route.engine_pattern(), "/a/{b/c}");
        assert!(route.param_names().is_empty());
    }

    #[test]
    fn test_pattern_is_preserved() {
        let route = RoutePattern::compile("/posts/{id}");
        assert_eq!(route.pattern(), "/posts/{id}");
    }
}
