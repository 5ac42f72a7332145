//! Structured logging setup shared by tutor front ends.

#![warn(missing_docs, clippy::pedantic)]

use anyhow::{Context, anyhow};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const FILTER_ENV: &str = "RUST_LOG";

/// Installs the global `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` wins over `default_filter` when it is set.
///
/// # Errors
///
/// Fails if a filter directive does not parse or a global subscriber is
/// already installed.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let env_value = std::env::var(FILTER_ENV).ok();
    let filter = resolve_filter(env_value.as_deref(), default_filter)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("failed to install tracing subscriber")?;

    tracing::debug!(default_filter, "tracing initialised");
    Ok(())
}

/// Picks the filter directive: a non-blank `env_value` first, then
/// `default_filter`.
///
/// # Errors
///
/// Returns an error naming the directive that failed to parse.
pub fn resolve_filter(env_value: Option<&str>, default_filter: &str) -> anyhow::Result<EnvFilter> {
    let directive = env_value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default_filter);
    EnvFilter::try_new(directive).with_context(|| format!("invalid log filter `{directive}`"))
}
