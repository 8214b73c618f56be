//! Unified error-code interface for the bus.
//!
//! Every error type that can leave a shellbus crate implements
//! [`ErrorCode`], so the host shell and UI surfaces can branch on a
//! stable machine-readable code instead of matching display strings.
//!
//! # Example
//!
//! ```
//! use shellbus_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum LinkError {
//!     Closed,
//!     Busy,
//! }
//!
//! impl ErrorCode for LinkError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Closed => "LINK_CLOSED",
//!             Self::Busy => "LINK_BUSY",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//! }
//!
//! assert_eq!(LinkError::Busy.code(), "LINK_BUSY");
//! assert!(!LinkError::Closed.is_recoverable());
//! ```

/// Machine-readable classification of a bus error.
///
/// # Code Format
///
/// - `UPPER_SNAKE_CASE`
/// - prefixed with the owning layer (`EVENT_`, `BUS_`, `TRANSPORT_`)
/// - stable once published; surfaces may match on them
///
/// # Recoverability
///
/// An error is recoverable when repeating the same operation later can
/// succeed without changing the input: a timed-out blocking request, a
/// surface that was busy tearing down. Malformed envelopes and invalid
/// channel names are never recoverable.
pub trait ErrorCode {
    /// Returns the stable error code.
    fn code(&self) -> &'static str;

    /// Returns whether a retry may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code is non-empty, prefixed and `UPPER_SNAKE_CASE`.
///
/// # Panics
///
/// Panics with a descriptive message when any check fails.
///
/// # Example
///
/// ```
/// use shellbus_types::{assert_error_code, ErrorCode};
///
/// struct Timeout;
///
/// impl ErrorCode for Timeout {
///     fn code(&self) -> &'static str { "BUS_TIMEOUT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&Timeout, "BUS_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Runs [`assert_error_code`] over every variant in `errors`.
///
/// Keep one `all_variants()` helper per error enum in its test module and
/// feed it here so a new variant cannot ship with a malformed code.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
