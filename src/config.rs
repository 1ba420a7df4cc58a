//! # Service Configuration
//!
//! Loads a [`ServiceConfig`] from a YAML or TOML file (picked by extension),
//! applies environment overrides, and turns it into the [`Configuration`]
//! that [`AppService::new`](crate::server::AppService::new) takes.
//!
//! ## File Format
//!
//! ```yaml
//! base_uri: /v1
//! trim_trailing_slash: true
//! cors: true
//! cors_options:
//!   allow_origins: ["https://*.example.com"]
//!   allow_methods: [GET, POST]
//!   allow_credentials: true
//!   max_age_secs: 600
//! routes:
//!   - { method: GET, path: /users/:id, name: get_user }
//!   - { method: GET, path: /files/*path }
//! ```
//!
//! The `routes` manifest lets a binary build a service without code; each
//! entry is bound to a handler by [`ServiceConfig::manifest_routes`].
//!
//! ## Environment Variables
//!
//! ### `RESTGATE_BASE_URI`
//!
//! Replaces `base_uri`.
//!
//! ### `RESTGATE_CORS`
//!
//! Replaces `cors`. Accepts `true`/`false`/`1`/`0`/`yes`/`no`; anything else
//! is ignored.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use http::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dispatcher::{BoxedHandler, ErrorHandler};
use crate::middleware::{CorsConfigError, CorsOptions, CorsPolicy};
use crate::server::{Configuration, HandlerRegistration, RouteRegistration};

/// Environment variable overriding `base_uri`
pub const ENV_BASE_URI: &str = "RESTGATE_BASE_URI";
/// Environment variable overriding `cors`
pub const ENV_CORS: &str = "RESTGATE_CORS";

fn default_trim_trailing_slash() -> bool {
    true
}

/// One route in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteManifestEntry {
    pub method: String,
    pub path: String,
    /// Label handed to the handler factory; defaults to `METHOD path`
    #[serde(default)]
    pub name: Option<String>,
}

impl RouteManifestEntry {
    /// The entry's name, or `METHOD path` when unnamed
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.method.to_uppercase(), self.path),
        }
    }
}

/// Declarative service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub base_uri: String,
    #[serde(default = "default_trim_trailing_slash")]
    pub trim_trailing_slash: bool,
    /// Run the CORS stage; `cors_options` absent means allow-all
    #[serde(default)]
    pub cors: bool,
    #[serde(default)]
    pub cors_options: Option<CorsOptions>,
    #[serde(default)]
    pub routes: Vec<RouteManifestEntry>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_uri: String::new(),
            trim_trailing_slash: true,
            cors: false,
            cors_options: None,
            routes: Vec::new(),
        }
    }
}

/// Invalid configuration content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file extension is neither YAML nor TOML
    UnsupportedFormat { path: String },
    /// A manifest entry names a method `http` cannot represent
    InvalidMethod { method: String, path: String },
    /// The CORS options did not compile
    Cors(CorsConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedFormat { path } => {
                write!(f, "unsupported config format for '{path}' (expected .yaml, .yml or .toml)")
            }
            ConfigError::InvalidMethod { method, path } => {
                write!(f, "invalid HTTP method '{method}' for route '{path}'")
            }
            ConfigError::Cors(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Cors(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CorsConfigError> for ConfigError {
    fn from(e: CorsConfigError) -> Self {
        ConfigError::Cors(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Yaml,
    Toml,
}

fn detect_format(path: &Path) -> Option<ConfigFormat> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "yaml" | "yml" => Some(ConfigFormat::Yaml),
        "toml" => Some(ConfigFormat::Toml),
        _ => None,
    }
}

/// Load a configuration file and apply environment overrides
///
/// # Errors
///
/// Unreadable files, unknown extensions and parse failures, with the path
/// in the error context.
pub fn load_config(path: impl AsRef<Path>) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::from_file(path)?;
    config.apply_env_overrides();
    Ok(config)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ServiceConfig {
    /// Parse a configuration file without applying overrides
    ///
    /// # Errors
    ///
    /// See [`load_config`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = detect_format(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.display().to_string(),
        })?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config {}", path.display()))?,
            ConfigFormat::Toml => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config {}", path.display()))?,
        };

        info!(
            path = %path.display(),
            base_uri = %config.base_uri,
            cors = config.cors,
            routes = config.routes.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Apply `RESTGATE_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_uri) = lookup(ENV_BASE_URI) {
            debug!(base_uri = %base_uri, "base_uri overridden from environment");
            self.base_uri = base_uri;
        }
        if let Some(raw) = lookup(ENV_CORS) {
            match parse_bool(&raw) {
                Some(cors) => {
                    debug!(cors, "cors overridden from environment");
                    self.cors = cors;
                }
                None => warn!(value = %raw, "Ignoring unparseable {ENV_CORS}"),
            }
        }
    }

    /// Build the service settings; handlers, chain and error handler stay empty
    ///
    /// # Errors
    ///
    /// [`ConfigError::Cors`] when an origin pattern does not compile.
    pub fn to_configuration(&self) -> Result<Configuration, ConfigError> {
        let cors_policy = match (self.cors, &self.cors_options) {
            (true, Some(options)) => Some(CorsPolicy::new(options.clone())?),
            _ => None,
        };
        Ok(Configuration {
            base_uri: self.base_uri.clone(),
            cors: self.cors,
            cors_policy,
            trim_trailing_slash: self.trim_trailing_slash,
            ..Configuration::default()
        })
    }

    /// Bind every manifest entry to a handler built by `factory`
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidMethod`] for a method token `http` rejects.
    pub fn manifest_routes<F>(&self, factory: F) -> Result<ManifestRoutes, ConfigError>
    where
        F: Fn(&RouteManifestEntry) -> BoxedHandler,
    {
        let mut routes = Vec::with_capacity(self.routes.len());
        for entry in &self.routes {
            let method = Method::from_bytes(entry.method.to_uppercase().as_bytes()).map_err(
                |_| ConfigError::InvalidMethod {
                    method: entry.method.clone(),
                    path: entry.path.clone(),
                },
            )?;
            routes.push(RouteRegistration::new(method, &entry.path, factory(entry)));
        }
        Ok(ManifestRoutes {
            routes,
            error_handler: None,
        })
    }
}

/// Routes declared in a configuration file, registered like any component
#[derive(Default)]
pub struct ManifestRoutes {
    routes: Vec<RouteRegistration>,
    error_handler: Option<ErrorHandler>,
}

impl fmt::Debug for ManifestRoutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestRoutes")
            .field("routes", &self.routes)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

impl ManifestRoutes {
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The error handler received from the service, once registered
    #[must_use]
    pub fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error_handler.as_ref()
    }
}

impl HandlerRegistration for ManifestRoutes {
    fn base_uri(&self) -> &str {
        ""
    }

    fn handlers_to_register(&self) -> Vec<RouteRegistration> {
        self.routes.clone()
    }

    fn set_error_handler(
        &mut self,
        handler: ErrorHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.error_handler = Some(handler);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::handler_fn;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(ext: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(ext)
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            ".yaml",
            "base_uri: /v1\ncors: true\ncors_options:\n  allow_origins: [\"https://*.cs.com\"]\n  max_age_secs: 60\nroutes:\n  - { method: get, path: /users/:id, name: get_user }\n",
        );
        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_uri, "/v1");
        assert!(config.cors);
        assert!(config.trim_trailing_slash);
        let options = config.cors_options.as_ref().unwrap();
        assert_eq!(options.allow_origins, vec!["https://*.cs.com"]);
        assert_eq!(options.max_age_secs, 60);
        assert_eq!(config.routes[0].display_name(), "get_user");
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            "base_uri = \"/api\"\ntrim_trailing_slash = false\n\n[[routes]]\nmethod = \"POST\"\npath = \"/items\"\n",
        );
        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_uri, "/api");
        assert!(!config.trim_trailing_slash);
        assert!(!config.cors);
        assert_eq!(config.routes[0].display_name(), "POST /items");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_config(".json", "{}");
        let err = ServiceConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_parse_error_has_context() {
        let file = write_config(".yaml", "base_uri: [unclosed");
        let err = ServiceConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [(ENV_BASE_URI, "/v2"), (ENV_CORS, "yes")].into();
        let mut config = ServiceConfig::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.base_uri, "/v2");
        assert!(config.cors);

        config.apply_overrides_from(|k| (k == ENV_CORS).then(|| "maybe".to_string()));
        assert!(config.cors, "unparseable value leaves the setting alone");
    }

    #[test]
    fn test_to_configuration() {
        let config = ServiceConfig {
            cors: true,
            cors_options: Some(CorsOptions {
                allow_origins: vec!["http://a.com".to_string()],
                ..CorsOptions::default()
            }),
            ..ServiceConfig::default()
        };
        let cfg = config.to_configuration().unwrap();
        assert!(cfg.cors);
        let policy = cfg.cors_policy.unwrap();
        assert!(policy.is_origin_allowed("http://a.com"));
        assert!(!policy.is_origin_allowed("http://b.com"));

        let off = ServiceConfig {
            cors_options: config.cors_options.clone(),
            ..ServiceConfig::default()
        };
        assert!(off.to_configuration().unwrap().cors_policy.is_none());
    }

    #[test]
    fn test_manifest_routes() {
        let config = ServiceConfig {
            routes: vec![
                RouteManifestEntry {
                    method: "get".to_string(),
                    path: "/a".to_string(),
                    name: None,
                },
                RouteManifestEntry {
                    method: "DELETE".to_string(),
                    path: "/b/:id".to_string(),
                    name: Some("drop".to_string()),
                },
            ],
            ..ServiceConfig::default()
        };
        let routes = config
            .manifest_routes(|_| handler_fn(|_req, res| res.write_text(200, "ok")))
            .unwrap();
        assert_eq!(routes.len(), 2);
        let regs = routes.handlers_to_register();
        assert_eq!(regs[0].method, Method::GET);
        assert_eq!(regs[1].method, Method::DELETE);
        assert_eq!(regs[1].path, "/b/:id");
    }

    #[test]
    fn test_manifest_invalid_method() {
        let config = ServiceConfig {
            routes: vec![RouteManifestEntry {
                method: "GE T".to_string(),
                path: "/a".to_string(),
                name: None,
            }],
            ..ServiceConfig::default()
        };
        let err = config
            .manifest_routes(|_| handler_fn(|_req, _res| {}))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMethod { .. }));
    }
}
