//! # CLI Module
//!
//! Command-line inspection of a service described by a configuration file.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the route table built from the config's `routes` manifest:
//!
//! ```bash
//! restgate routes --config service.yaml
//! ```
//!
//! ### `match`
//!
//! Send one request through the full service (CORS stage, routing,
//! middleware) and print the response. Manifest routes answer with an echo
//! of the route name, parameters, query and body:
//!
//! ```bash
//! restgate match --config service.yaml GET '/v1/users/42?verbose=1' \
//!     -H 'Origin: https://app.example.com'
//! ```
//!
//! ### `cors`
//!
//! Print the headers the CORS policy sends for an origin, optionally as a
//! preflight. Prints `CORS is disabled` when the config leaves `cors` off:
//!
//! ```bash
//! restgate cors --config service.yaml https://app.example.com \
//!     --preflight PUT --request-headers 'X-Trace-Id'
//! ```
//!
//! `--config` may also come from `RESTGATE_CONFIG`. Reports go to stdout and
//! logs to stderr.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use restgate::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run_cli(&cli, &mut std::io::stdout())?;
//! ```

mod commands;


pub use commands::{build_service, run, run_cli, Cli, Commands};
