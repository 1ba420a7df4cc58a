//! Typed conversion of raw parameter strings
//!
//! Path and query values arrive as text. These helpers parse them into
//! concrete types, returning `None` when the text does not represent a value
//! of that type. For path parameters, [`Params::parse`](crate::router::Params::parse)
//! covers any `FromStr` type directly.
//!
//! ```rust
//! use restgate::convert;
//!
//! assert_eq!(convert::to_u32("42"), Some(42));
//! assert_eq!(convert::to_bool("T"), Some(true));
//! assert_eq!(convert::to_i32("4294967296"), None);
//! ```

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

/// Parse a boolean
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and their false
/// counterparts `0`, `f`, `F`, `FALSE`, `false`, `False`.
#[must_use]
pub fn to_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[must_use]
pub fn to_i32(value: &str) -> Option<i32> {
    value.parse().ok()
}

#[must_use]
pub fn to_i64(value: &str) -> Option<i64> {
    value.parse().ok()
}

#[must_use]
pub fn to_u32(value: &str) -> Option<u32> {
    value.parse().ok()
}

#[must_use]
pub fn to_u64(value: &str) -> Option<u64> {
    value.parse().ok()
}

#[must_use]
pub fn to_usize(value: &str) -> Option<usize> {
    value.parse().ok()
}

#[must_use]
pub fn to_f32(value: &str) -> Option<f32> {
    value.parse().ok()
}

#[must_use]
pub fn to_f64(value: &str) -> Option<f64> {
    value.parse().ok()
}

/// The value itself, unless it is empty
#[must_use]
pub fn to_string(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Decode padded URL-safe base64 (`-` and `_` alphabet)
#[must_use]
pub fn to_bytes(value: &str) -> Option<Vec<u8>> {
    URL_SAFE.decode(value).ok()
}
