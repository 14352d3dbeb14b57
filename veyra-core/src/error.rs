//! Error types and result handling for the Veyra binding core.
//!
//! This module provides a unified error type covering everything the binding
//! layer can reject synchronously. The categories are deliberately narrow:
//!
//! - **Validation errors**: invalid cookie material or a query string that
//!   blows past the pair cap. These signal programmer error or a potential
//!   injection/DoS attempt and are never masked.
//! - **Serialization errors**: JSON encoding failures from [`serde_json`].
//! - **Engine errors**: registration-time failures reported by the engine
//!   adapter.
//! - **Custom errors**: application-defined conditions.
//!
//! Two whole classes of trouble intentionally do *not* appear here. Malformed
//! percent-encoding and header/parameter overflow degrade silently (the
//! parsers sit on the attacker-facing path and must never raise), and any
//! operation on an already-invalidated response or socket handle is a silent
//! no-op, because the caller cannot always know the peer is gone.
//!
//! # Examples
//!
//! ```
//! use veyra_core::error::{Error, Result};
//!
//! fn check_topic(topic: &str) -> Result<()> {
//!     if topic.is_empty() {
//!         return Err(Error::custom("topic cannot be empty"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_topic("updates").is_ok());
//! assert!(check_topic("").is_err());
//! ```

use std::fmt;
use thiserror::Error;

/// The main error type for Veyra binding operations.
///
/// Uses [`thiserror`](https://docs.rs/thiserror) to implement
/// `std::error::Error` and provide display messages.
///
/// # Examples
///
/// ```
/// use veyra_core::error::Error;
///
/// let err = Error::cookie("invalid character in cookie path");
/// assert_eq!(err.to_string(), "Invalid cookie: invalid character in cookie path");
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// Cookie name, value, or attribute failed validation.
    ///
    /// Raised at serialization time, before any header text is produced.
    /// Violations are rejected outright rather than sanitized, since a
    /// sanitized cookie silently changes meaning.
    #[error("Invalid cookie: {0}")]
    InvalidCookie(String),

    /// A query string contained more than the permitted number of pairs.
    ///
    /// The variant carries the cap that was exceeded. Parsing a hostile
    /// query must fail loudly instead of allocating without bound.
    #[error("Query string exceeded {0} parameters")]
    QueryLimit(usize),

    /// JSON serialization error from `serde_json`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The engine adapter rejected a registration.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Custom application-defined error.
    #[error("Custom error: {0}")]
    Custom(String),
}

/// A type alias for `Result<T, Error>`.
///
/// Most fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates an [`Error::InvalidCookie`] with the given message.
    ///
    /// # Examples
    ///
    /// ```
    /// use veyra_core::error::Error;
    ///
    /// let err = Error::cookie("invalid character in cookie name");
    /// assert!(matches!(err, Error::InvalidCookie(_)));
    /// ```
    pub fn cookie<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidCookie(msg.to_string())
    }

    /// Creates an [`Error::Engine`] with the given message.
    ///
    /// # Examples
    ///
    /// ```
    /// use veyra_core::error::Error;
    ///
    /// let err = Error::engine("pattern already registered");
    /// assert!(matches!(err, Error::Engine(_)));
    /// ```
    pub fn engine<T: fmt::Display>(msg: T) -> Self {
        Error::Engine(msg.to_string())
    }

    /// Creates an [`Error::Custom`] with the given message.
    ///
    /// Use this for application-specific conditions that don't fit the
    /// other categories.
    ///
    /// # Examples
    ///
    /// ```
    /// use veyra_core::error::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(matches!(err, Error::Custom(_)));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}
