use std::time::Duration;

use http::Method;

use super::{CorsConfigError, CorsOptions, CorsPolicy};

/// Builder for creating a [`CorsPolicy`] with a fluent API
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use restgate::middleware::CorsPolicyBuilder;
///
/// let cors = CorsPolicyBuilder::new()
///     .allowed_origins(&["https://example.com", "https://*.example.com"])
///     .allowed_methods(&[Method::GET, Method::POST])
///     .allowed_headers(&["Content-Type", "X-Custom-Header"])
///     .allow_credentials(true)
///     .expose_headers(&["X-Total-Count"])
///     .max_age(std::time::Duration::from_secs(3600))
///     .build()
///     .unwrap();
///
/// assert!(cors.is_origin_allowed("https://api.example.com"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CorsPolicyBuilder {
    options: CorsOptions,
}

impl CorsPolicyBuilder {
    /// Start from an empty policy: no origins allowed, default allow headers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow every origin (`Access-Control-Allow-Origin: *`)
    #[must_use]
    pub fn allow_all_origins(mut self, allow: bool) -> Self {
        self.options.allow_all_origins = allow;
        self
    }

    /// Set allowed origins
    ///
    /// Entries are literal origins in which `*` matches any run of
    /// characters and `?` matches exactly one.
    #[must_use]
    pub fn allowed_origins(mut self, origins: &[&str]) -> Self {
        self.options.allow_origins = origins.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Set allowed HTTP methods, kept in the given order
    #[must_use]
    pub fn allowed_methods(mut self, methods: &[Method]) -> Self {
        self.options.allow_methods = methods.iter().map(|m| m.as_str().to_string()).collect();
        self
    }

    /// Set allowed headers; an empty list falls back to the default set
    #[must_use]
    pub fn allowed_headers(mut self, headers: &[&str]) -> Self {
        self.options.allow_headers = headers.iter().map(|s| (*s).to_string()).collect();
        self
    }

    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.options.allow_credentials = allow;
        self
    }

    /// Set headers to expose to JavaScript
    #[must_use]
    pub fn expose_headers(mut self, headers: &[&str]) -> Self {
        self.options.expose_headers = headers.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Set preflight cache duration; only whole seconds are sent
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.options.max_age_secs = max_age.as_secs();
        self
    }

    /// Compile the policy
    ///
    /// # Errors
    ///
    /// [`CorsConfigError::InvalidOriginPattern`] if an origin entry fails to compile.
    pub fn build(self) -> Result<CorsPolicy, CorsConfigError> {
        CorsPolicy::new(self.options)
    }
}
