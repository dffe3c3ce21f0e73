//! Logging and tracing setup.
//!
//! All logs are written to **stderr**; stdout belongs to the plugin host.
//!
//! # Environment Variables
//!
//! The filter is taken from the first of these that is set and non-empty:
//!
//! - `RUST_LOG`: a full `tracing` filter, e.g. `replicate_provider=debug`
//! - `TF_LOG_PROVIDER`: a Terraform log level for providers only
//! - `TF_LOG`: the global Terraform log level
//!
//! Terraform levels are `TRACE`, `DEBUG`, `INFO`, `WARN`, `ERROR` and `JSON`;
//! `JSON` is treated as `trace`.
//!
//! ```bash
//! TF_LOG=DEBUG terraform apply
//! RUST_LOG=replicate_provider::client=debug terraform plan
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ENV_RUST_LOG: &str = "RUST_LOG";
const ENV_TF_LOG_PROVIDER: &str = "TF_LOG_PROVIDER";
const ENV_TF_LOG: &str = "TF_LOG";

/// Initialize the default logging subscriber at `info` level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Initialize logging with a custom default level, used when none of the
/// environment variables is set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
///
/// # Example
///
/// ```ignore
/// use replicate_provider::init_logging_with_default;
///
/// init_logging_with_default("debug");
/// tracing::debug!("provider starting");
/// ```
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(stderr_layer())
        .init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Unlike [`init_logging`] this never panics, which makes it safe to call
/// from every test.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

fn env_filter(default_level: &str) -> EnvFilter {
    let directive = resolve_filter(|key| std::env::var(key).ok(), default_level);
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Pick the filter directive from the environment, looked up through `var`.
fn resolve_filter<F>(var: F, default_level: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let set = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(filter) = set(ENV_RUST_LOG) {
        return filter;
    }

    [ENV_TF_LOG_PROVIDER, ENV_TF_LOG]
        .into_iter()
        .find_map(|key| set(key).and_then(|level| terraform_level(&level)))
        .unwrap_or_else(|| default_level.to_string())
}

/// Map a Terraform log level to a `tracing` level.
fn terraform_level(level: &str) -> Option<String> {
    let level = match level.to_ascii_uppercase().as_str() {
        "TRACE" | "JSON" => "trace",
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        "OFF" => "off",
        _ => return None,
    };
    Some(level.to_string())
}
