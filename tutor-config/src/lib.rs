//! Runtime configuration for the tutor.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `LINGUA_*` environment variables. Front ends apply their own flags last
//! and call [`TutorConfig::validate`] before use.

#![warn(missing_docs, clippy::pedantic)]

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Endpoint root used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/";

/// Environment variable overriding [`TutorConfig::model`].
pub const ENV_MODEL: &str = "LINGUA_MODEL";
/// Environment variable overriding [`TutorConfig::base_url`].
pub const ENV_BASE_URL: &str = "LINGUA_BASE_URL";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding [`TutorConfig::max_tokens`].
pub const ENV_MAX_TOKENS: &str = "LINGUA_MAX_TOKENS";
/// Environment variable overriding [`TutorConfig::temperature`].
pub const ENV_TEMPERATURE: &str = "LINGUA_TEMPERATURE";
/// Environment variable overriding [`TutorConfig::request_timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "LINGUA_TIMEOUT_SECS";
/// Environment variable overriding [`TutorConfig::max_retries`].
pub const ENV_MAX_RETRIES: &str = "LINGUA_MAX_RETRIES";
/// Environment variable overriding [`TutorConfig::log_filter`].
pub const ENV_LOG: &str = "LINGUA_LOG";

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`TutorConfig`].
    #[error("failed to parse config {origin}: {source}")]
    Parse {
        /// File path, or `<inline>` for in-memory text.
        origin: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// An environment variable holds a value of the wrong type.
    #[error("environment variable {var}={value:?} is invalid: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure description.
        reason: String,
    },

    /// A field failed validation.
    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Settings for the completion service and the front end.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TutorConfig {
    /// Chat model identifier.
    pub model: String,
    /// Endpoint root; `v1/chat/completions` is appended.
    pub base_url: String,
    /// API key. Read from files or the environment, never written out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Upper bound on generated tokens per reply.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-attempt timeout in seconds.
    pub request_timeout_secs: u64,
    /// Retries after a transient failure.
    pub max_retries: u32,
    /// Delay between attempts when the provider gives no hint.
    pub retry_backoff_ms: u64,
    /// Default `tracing` filter directive.
    pub log_filter: String,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            max_tokens: 150,
            temperature: 0.7,
            request_timeout_secs: 60,
            max_retries: 1,
            retry_backoff_ms: 500,
            log_filter: "info".to_owned(),
        }
    }
}

impl fmt::Debug for TutorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TutorConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

impl TutorConfig {
    /// Loads defaults, the optional file at `path`, then the process
    /// environment, and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, an
    /// environment variable is malformed, or validation fails.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Reads a JSON file. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        })
    }

    /// Parses JSON text. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown fields.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            origin: "<inline>".to_owned(),
            source,
        })
    }

    /// Overrides fields from environment variables resolved by `lookup`.
    ///
    /// Unset and blank variables are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a numeric variable does not
    /// parse.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        if let Some(model) = get(ENV_MODEL) {
            self.model = model.trim().to_owned();
        }
        if let Some(base_url) = get(ENV_BASE_URL) {
            self.base_url = base_url.trim().to_owned();
        }
        if let Some(api_key) = get(ENV_API_KEY) {
            self.api_key = Some(api_key.trim().to_owned());
        }
        if let Some(raw) = get(ENV_MAX_TOKENS) {
            self.max_tokens = parse_env(ENV_MAX_TOKENS, &raw)?;
        }
        if let Some(raw) = get(ENV_TEMPERATURE) {
            self.temperature = parse_env(ENV_TEMPERATURE, &raw)?;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_env(ENV_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = get(ENV_MAX_RETRIES) {
            self.max_retries = parse_env(ENV_MAX_RETRIES, &raw)?;
        }
        if let Some(filter) = get(ENV_LOG) {
            self.log_filter = filter;
        }
        Ok(())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an empty model, a
    /// temperature outside `0.0..=2.0`, zero `max_tokens` or a zero timeout.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid_value("model", "must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::invalid_value(
                "temperature",
                format!("{} is outside 0.0..=2.0", self.temperature),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::invalid_value("max_tokens", "must be positive"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "request_timeout_secs",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Per-attempt timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay between retry attempts.
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn parse_env<T>(var: &'static str, raw: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| ConfigError::InvalidEnv {
        var,
        value: raw.to_owned(),
        reason: err.to_string(),
    })
}
