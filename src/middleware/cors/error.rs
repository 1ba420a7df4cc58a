use std::fmt;

/// CORS configuration error
///
/// Returned by [`super::CorsPolicy::new`] and `CorsPolicyBuilder::build()` when
/// an origin entry cannot be turned into a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfigError {
    /// An allowed-origin entry failed to compile
    ///
    /// Entries are literal text with `*` and `?` wildcards, so this only
    /// happens for pathological input such as an entry exceeding the regex
    /// size limit.
    InvalidOriginPattern {
        /// The configured origin entry
        origin: String,
        /// Why compilation failed
        reason: String,
    },
}

impl fmt::Display for CorsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsConfigError::InvalidOriginPattern { origin, reason } => {
                write!(
                    f,
                    "CORS configuration error: origin pattern '{origin}' is invalid: {reason}"
                )
            }
        }
    }
}

impl std::error::Error for CorsConfigError {}
