//! Injection-safe `Set-Cookie` serialization.
//!
//! A cookie header is assembled from attacker-influenced strings and then
//! handed to the engine verbatim, which makes it a prime header-injection
//! target. This module takes the strict road: anything that could change the
//! meaning of the serialized header is a [`ValidationError`](crate::error::Error)
//! at serialization time, never a silent rewrite.
//!
//! The rules, in order of application:
//!
//! - the cookie **name** must consist of token characters (printable ASCII
//!   excluding separators);
//! - a **value** containing a raw `;` or any control character is rejected;
//!   a value containing a space, quote, comma, or backslash is emitted
//!   quoted, with `\` and `"` backslash-escaped;
//! - **path** and **domain** reject `;` and control characters;
//! - `SameSite=None` requires `Secure`;
//! - the fully assembled header text is scanned end to end for control
//!   characters before it is handed out.
//!
//! Attribute order is fixed:
//! `name=value[; Max-Age=n][; Expires=date][; Path=p][; Domain=d][; Secure][; HttpOnly][; SameSite=mode]`.
//!
//! # Examples
//!
//! ```
//! use veyra_core::cookie::{CookieDescriptor, SameSite, format_cookie};
//!
//! let cookie = CookieDescriptor::new("session", "abc123")
//!     .secure(true)
//!     .http_only(true)
//!     .same_site(SameSite::None);
//!
//! let header = format_cookie(&cookie).unwrap();
//! assert_eq!(header, "session=abc123; Path=/; Secure; HttpOnly; SameSite=None");
//! ```

use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::{Error, Result};

/// `SameSite` cookie attribute modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Cookie is only sent in a first-party context.
    Strict,
    /// Cookie is withheld on cross-site subrequests but sent on navigation.
    Lax,
    /// Cookie is sent in all contexts. Requires the `Secure` attribute.
    None,
}

impl SameSite {
    /// The attribute value as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Structured description of one `Set-Cookie` header.
///
/// Built with a consuming builder, validated and serialized by
/// [`format_cookie`] (or [`serialize`](CookieDescriptor::serialize)).
/// Construction itself never fails; all validation happens when the header
/// text is produced, so a descriptor can be assembled incrementally.
///
/// # Examples
///
/// ```
/// use veyra_core::cookie::CookieDescriptor;
///
/// let cookie = CookieDescriptor::new("theme", "dark")
///     .path("/app")
///     .max_age(3600);
///
/// assert_eq!(
///     cookie.serialize().unwrap(),
///     "theme=dark; Max-Age=3600; Path=/app",
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CookieDescriptor {
    name: String,
    value: String,
    max_age: Option<i64>,
    expires: Option<OffsetDateTime>,
    path: String,
    domain: Option<String>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl CookieDescriptor {
    /// Creates a descriptor with the given name and value.
    ///
    /// Defaults: `Path=/`, no expiry, not `Secure`, not `HttpOnly`, no
    /// `SameSite` attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: None,
            expires: None,
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// Creates a descriptor that instructs the client to drop the cookie.
    ///
    /// The value is emptied and both expiry attributes are forced into the
    /// past.
    ///
    /// # Examples
    ///
    /// ```
    /// use veyra_core::cookie::CookieDescriptor;
    ///
    /// let header = CookieDescriptor::removal("session").serialize().unwrap();
    /// assert!(header.starts_with("session=; Max-Age=0; Expires=Thu, 01 Jan 1970"));
    /// ```
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "")
            .max_age(0)
            .expires(OffsetDateTime::UNIX_EPOCH)
    }

    /// Sets the `Max-Age` attribute, in seconds.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Sets the `Expires` attribute.
    ///
    /// Serialized as an IMF-fixdate in UTC regardless of the offset carried
    /// by `at`.
    pub fn expires(mut self, at: OffsetDateTime) -> Self {
        self.expires = Some(at);
        self
    }

    /// Sets the `Path` attribute.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the `Domain` attribute.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets or clears the `Secure` attribute.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets or clears the `HttpOnly` attribute.
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Sets the `SameSite` attribute.
    pub fn same_site(mut self, mode: SameSite) -> Self {
        self.same_site = Some(mode);
        self
    }

    /// Validates the descriptor and produces the `Set-Cookie` header value.
    ///
    /// Equivalent to [`format_cookie`]`(self)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCookie`] on any of the violations described
    /// in the [module documentation](self).
    pub fn serialize(&self) -> Result<String> {
        format_cookie(self)
    }
}

/// Serializes a [`CookieDescriptor`] into an injection-safe header value.
///
/// # Errors
///
/// Returns [`Error::InvalidCookie`] if the name is not a valid token, the
/// value cannot be represented safely, an attribute embeds `;` or a control
/// character, or `SameSite=None` is requested without `Secure`.
///
/// # Examples
///
/// ```
/// use veyra_core::cookie::{CookieDescriptor, format_cookie};
///
/// let ok = CookieDescriptor::new("id", "a b");
/// assert_eq!(format_cookie(&ok).unwrap(), r#"id="a b"; Path=/"#);
///
/// let bad = CookieDescriptor::new("bad;name", "x");
/// assert!(format_cookie(&bad).is_err());
/// ```
pub fn format_cookie(cookie: &CookieDescriptor) -> Result<String> {
    validate_name(&cookie.name)?;

    if let Some(SameSite::None) = cookie.same_site {
        if !cookie.secure {
            return Err(Error::cookie("SameSite=None requires the Secure attribute"));
        }
    }

    let mut out = String::with_capacity(64);
    out.push_str(&cookie.name);
    out.push('=');
    out.push_str(&render_value(&cookie.value)?);

    if let Some(max_age) = cookie.max_age {
        out.push_str("; Max-Age=");
        out.push_str(&max_age.to_string());
    }

    if let Some(expires) = cookie.expires {
        out.push_str("; Expires=");
        out.push_str(&format_http_date(expires)?);
    }

    validate_attribute("path", &cookie.path)?;
    out.push_str("; Path=");
    out.push_str(&cookie.path);

    if let Some(ref domain) = cookie.domain {
        validate_attribute("domain", domain)?;
        out.push_str("; Domain=");
        out.push_str(domain);
    }

    if cookie.secure {
        out.push_str("; Secure");
    }

    if cookie.http_only {
        out.push_str("; HttpOnly");
    }

    if let Some(mode) = cookie.same_site {
        out.push_str("; SameSite=");
        out.push_str(mode.as_str());
    }

    // The assembled header must never carry a control byte, whatever path
    // it arrived by.
    if out.bytes().any(is_control) {
        return Err(Error::cookie("control character in serialized cookie"));
    }

    Ok(out)
}

/// Formats an HTTP date (IMF-fixdate), always in GMT.
fn format_http_date(at: OffsetDateTime) -> Result<String> {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(&format)
        .map_err(|e| Error::cookie(format!("unformattable Expires date: {e}")))
}

fn is_control(byte: u8) -> bool {
    byte < 0x20 || byte == 0x7f
}

/// Token characters per RFC 6265: printable ASCII minus separators.
fn is_token_char(byte: u8) -> bool {
    if !(0x21..=0x7e).contains(&byte) {
        return false;
    }
    !matches!(
        byte,
        b'(' | b')'
            | b'<'
            | b'>'
            | b'@'
            | b','
            | b';'
            | b':'
            | b'\\'
            | b'"'
            | b'/'
            | b'['
            | b']'
            | b'?'
            | b'='
            | b'{'
            | b'}'
    )
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::cookie("cookie name cannot be empty"));
    }
    if !name.bytes().all(is_token_char) {
        return Err(Error::cookie(format!(
            "invalid character in cookie name {name:?}"
        )));
    }
    Ok(())
}

/// Renders the cookie value, quoting it when it contains characters that
/// would otherwise terminate or restructure the header.
fn render_value(value: &str) -> Result<String> {
    if value.contains(';') {
        return Err(Error::cookie("cookie value cannot contain ';'"));
    }
    if value.bytes().any(is_control) {
        return Err(Error::cookie("control character in cookie value"));
    }

    let needs_quoting = value
        .bytes()
        .any(|b| matches!(b, b' ' | b'"' | b',' | b'\\'));
    if !needs_quoting {
        return Ok(value.to_string());
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if ch == '\\' || ch == '"' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    Ok(quoted)
}

fn validate_attribute(what: &str, value: &str) -> Result<()> {
    if value.contains(';') || value.bytes().any(is_control) {
        return Err(Error::cookie(format!(
            "invalid character in cookie {what}"
        )));
    }
    Ok(())
}
