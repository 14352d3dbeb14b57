//! URL component and query-string decoding.
//!
//! Everything in this module sits directly on the attacker-facing path, so
//! the rules are strict about what may fail and what must degrade:
//!
//! - `%XY` consumes exactly two hex digits; an invalid sequence (`%zz`, a
//!   truncated `%4`) passes through literally, unconsumed.
//! - A decoded NUL byte is replaced with `?`, blocking null-byte smuggling
//!   into downstream C-string or filesystem APIs.
//! - `+` decodes to a space, but an encoded `%2B` stays a literal `+`.
//! - Query parsing accumulates repeated keys and enforces a hard cap of
//!   [`MAX_QUERY_PAIRS`] non-empty pairs; the cap is the only condition that
//!   fails the parse.
//!
//! Percent-decoding proper is delegated to the [`percent_encoding`] crate,
//! which already implements the pass-through rule for malformed sequences.
//!
//! # Examples
//!
//! ```
//! use veyra_core::decode::{decode_component, parse_query};
//!
//! assert_eq!(decode_component("%68%65%6c%6c%6f"), "hello");
//! assert_eq!(decode_component("a+b%2Bc"), "a b+c");
//!
//! let params = parse_query("q=rust&page=2&q=tokio").unwrap();
//! assert_eq!(params["q"], vec!["rust", "tokio"]);
//! assert_eq!(params["page"], vec!["2"]);
//! ```

use std::collections::HashMap;

use percent_encoding::percent_decode;

use crate::error::{Error, Result};

/// Hard cap on non-empty `key=value` pairs accepted from one query string.
pub const MAX_QUERY_PAIRS: usize = 1000;

/// Decodes one percent-encoded URL component.
///
/// `+` becomes a space, valid `%XY` sequences become their byte, invalid
/// sequences pass through unchanged, and any decoded NUL byte is replaced
/// with `?`. Bytes that do not form valid UTF-8 are replaced with
/// `U+FFFD` rather than rejected. This function cannot fail.
///
/// # Examples
///
/// ```
/// use veyra_core::decode::decode_component;
///
/// assert_eq!(decode_component("%68%65%6c%6c%6f"), "hello");
/// assert_eq!(decode_component("%zz"), "%zz");
/// assert_eq!(decode_component("a%00b"), "a?b");
/// assert_eq!(decode_component("one+two"), "one two");
/// ```
pub fn decode_component(raw: &str) -> String {
    // Plus-as-space applies to the raw text only; an encoded %2B must
    // survive as a literal plus, so the substitution happens before
    // percent-decoding.
    let spaced: Vec<u8> = raw
        .bytes()
        .map(|b| if b == b'+' { b' ' } else { b })
        .collect();

    let decoded: Vec<u8> = percent_decode(&spaced)
        .map(|b| if b == 0 { b'?' } else { b })
        .collect();

    String::from_utf8_lossy(&decoded).into_owned()
}

/// Parses a raw query string into a map of decoded keys to decoded values.
///
/// The input is split on `&`; empty pieces (from leading, trailing, or
/// doubled ampersands) are skipped without counting. Each remaining piece is
/// split once on its first `=` (a piece without `=` yields an empty value)
/// and both sides are decoded independently with [`decode_component`].
/// Repeated keys accumulate their values in arrival order.
///
/// # Errors
///
/// Returns [`Error::QueryLimit`] once more than [`MAX_QUERY_PAIRS`] non-empty
/// pairs are seen. This is the sole failure mode; malformed encoding within
/// a pair degrades silently.
///
/// # Examples
///
/// ```
/// use veyra_core::decode::parse_query;
///
/// let params = parse_query("a=1&a=2&b=").unwrap();
/// assert_eq!(params["a"], vec!["1", "2"]);
/// assert_eq!(params["b"], vec![""]);
/// ```
pub fn parse_query(query: &str) -> Result<HashMap<String, Vec<String>>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    let mut pairs = 0usize;

    for piece in query.split('&') {
        if piece.is_empty() {
            continue;
        }

        pairs += 1;
        if pairs > MAX_QUERY_PAIRS {
            return Err(Error::QueryLimit(MAX_QUERY_PAIRS));
        }

        let (key, value) = match piece.split_once('=') {
            Some((key, value)) => (key, value),
            None => (piece, ""),
        };

        params
            .entry(decode_component(key))
            .or_default()
            .push(decode_component(value));
    }

    Ok(params)
}
