use crate::{
    config::{load_config, ServiceConfig},
    dispatcher::HandlerRequest,
    echo::echo_handler,
    middleware::{CorsPolicy, Middleware, TracingMiddleware},
    server::{status_reason, AppService, HandlerRegistration},
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line interface for restgate
///
/// Inspects a service described by a configuration file: its route table,
/// how it answers a request, and which CORS headers it sends.
#[derive(Parser, Debug)]
#[command(name = "restgate")]
#[command(about = "restgate route and CORS inspector", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the route table built from the config's route manifest
    Routes {
        /// Path to the service configuration (YAML or TOML)
        #[arg(short, long, env = "RESTGATE_CONFIG")]
        config: PathBuf,
    },
    /// Send one request through the full service and print the response
    ///
    /// Every manifest route is bound to an echo handler that reports the
    /// route name, bound parameters, query and body.
    Match {
        /// Path to the service configuration (YAML or TOML)
        #[arg(short, long, env = "RESTGATE_CONFIG")]
        config: PathBuf,

        /// HTTP method, e.g. GET
        method: String,

        /// Request target: path with optional query string
        target: String,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Print the CORS headers the config's policy sends for an origin
    Cors {
        /// Path to the service configuration (YAML or TOML)
        #[arg(short, long, env = "RESTGATE_CONFIG")]
        config: PathBuf,

        /// Value of the request's Origin header
        origin: String,

        /// Treat as a preflight requesting this method
        #[arg(long)]
        preflight: Option<String>,

        /// Access-Control-Request-Headers value for a preflight
        #[arg(long, default_value = "")]
        request_headers: String,
    },
}

/// Execute a parsed command, writing its report to `out`
///
/// # Errors
///
/// Returns an error if:
/// - The configuration cannot be loaded or parsed
/// - The route manifest or CORS options are invalid
/// - A header or body argument is malformed
pub fn run_cli(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Commands::Routes { config } => {
            let config = load_config(config)?;
            let service = build_service(&config)?;
            let routes = service.routes();
            writeln!(out, "{} routes under {}", routes.len(), service.base_uri())?;
            for (method, pattern) in routes {
                writeln!(out, "{:<7} {}", method.as_str(), pattern)?;
            }
            Ok(())
        }
        Commands::Match {
            config,
            method,
            target,
            headers,
            body,
        } => {
            let config = load_config(config)?;
            let service = build_service(&config)?;
            let mut req = build_request(method, target, headers, body.as_deref())?;

            let res = service.serve(&mut req);

            writeln!(out, "{} {}", res.status, status_reason(res.status))?;
            for (name, value) in &res.headers {
                writeln!(out, "{name}: {value}")?;
            }
            let body = res.body_text();
            if !body.is_empty() {
                writeln!(out)?;
                writeln!(out, "{body}")?;
            }
            Ok(())
        }
        Commands::Cors {
            config,
            origin,
            preflight,
            request_headers,
        } => {
            let config = load_config(config)?;
            let Some(policy) = cors_policy(&config)? else {
                writeln!(out, "CORS is disabled")?;
                return Ok(());
            };
            let headers = match preflight {
                Some(method) => policy.preflight_headers(origin, method, request_headers),
                None => policy.simple_headers(origin),
            };
            if headers.is_empty() {
                writeln!(out, "origin {origin} is not allowed")?;
            }
            for (name, value) in &headers {
                writeln!(out, "{name}: {value}")?;
            }
            Ok(())
        }
    }
}

/// Build a service from `config` with echo handlers for every manifest route
///
/// # Errors
///
/// Invalid manifest entries, CORS options or route patterns.
pub fn build_service(config: &ServiceConfig) -> Result<AppService> {
    let mut cfg = config
        .to_configuration()
        .context("Invalid service configuration")?;
    let tracing: Arc<dyn Middleware> = Arc::new(TracingMiddleware);
    cfg.chain.push(tracing);

    let mut routes = config
        .manifest_routes(|entry| echo_handler(entry.display_name()))
        .context("Invalid route manifest")?;
    let registrators: Vec<&mut dyn HandlerRegistration> = vec![&mut routes];

    AppService::new(cfg, registrators).context("Failed to register routes")
}

/// The policy the service would run, `None` when CORS is off
fn cors_policy(config: &ServiceConfig) -> Result<Option<CorsPolicy>> {
    let cfg = config
        .to_configuration()
        .context("Invalid service configuration")?;
    if !cfg.cors {
        return Ok(None);
    }
    Ok(Some(cfg.cors_policy.unwrap_or_else(CorsPolicy::allow_all)))
}

fn build_request(
    method: &str,
    target: &str,
    headers: &[String],
    body: Option<&str>,
) -> Result<HandlerRequest> {
    let method = Method::from_bytes(method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method '{method}'"))?;
    let mut req = HandlerRequest::new(method, target);
    for header in headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("Invalid header '{header}', expected 'Name: value'");
        };
        req = req.with_header(name.trim(), value.trim());
    }
    if let Some(body) = body {
        let body = serde_json::from_str(body).context("Request body is not valid JSON")?;
        req = req.with_body(body);
    }
    Ok(req)
}

/// Parse arguments from the process and run against stdout
///
/// # Errors
///
/// See [`run_cli`].
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_cli(&cli, &mut out)
}
