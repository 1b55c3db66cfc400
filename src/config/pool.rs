//! Worker pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound on the worker count picked when none is configured.
pub const MAX_DEFAULT_WORKERS: usize = 4;

const DEFAULT_STACK_SIZE: usize = 8 * 1024 * 1024;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_THREAD_NAME_PREFIX: &str = "mminte-worker";

/// Environment variable overriding the worker count.
pub const ENV_WORKERS: &str = "MMINTE_WORKERS";
/// Environment variable overriding the worker thread stack size in bytes.
pub const ENV_STACK_SIZE: &str = "MMINTE_STACK_SIZE";
/// Environment variable overriding the shutdown timeout in milliseconds.
pub const ENV_SHUTDOWN_TIMEOUT_MS: &str = "MMINTE_SHUTDOWN_TIMEOUT_MS";

/// Default pool width: the host parallelism, capped at [`MAX_DEFAULT_WORKERS`].
#[must_use]
pub fn default_worker_count() -> usize {
    num_cpus::get().clamp(1, MAX_DEFAULT_WORKERS)
}

/// Configuration for an [`InteractionPool`](crate::core::InteractionPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of dedicated worker threads.
    pub worker_count: usize,
    /// Stack size for each worker thread, in bytes.
    pub thread_stack_size: usize,
    /// Prefix for worker thread names (`{prefix}-{id}`).
    pub thread_name_prefix: String,
    /// How long `terminate` waits for workers before detaching them.
    pub shutdown_timeout_ms: u64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            thread_stack_size: DEFAULT_STACK_SIZE,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Override the worker count only when a value is given.
    #[must_use]
    pub fn with_optional_worker_count(self, worker_count: Option<usize>) -> Self {
        match worker_count {
            Some(count) => self.with_worker_count(count),
            None => self,
        }
    }

    /// Set the worker thread stack size in bytes.
    #[must_use]
    pub const fn with_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set how long `terminate` waits for workers to exit.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Shutdown timeout as a `Duration`.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        if self.shutdown_timeout_ms == 0 {
            return Err("shutdown_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate it. Missing
    /// fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading a `.env`
    /// file first when one exists.
    ///
    /// Reads `MMINTE_WORKERS`, `MMINTE_STACK_SIZE` and
    /// `MMINTE_SHUTDOWN_TIMEOUT_MS`; unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of any unparsable or invalid value.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(value) = lookup(ENV_WORKERS) {
            cfg.worker_count = parse_var(ENV_WORKERS, &value)?;
        }
        if let Some(value) = lookup(ENV_STACK_SIZE) {
            cfg.thread_stack_size = parse_var(ENV_STACK_SIZE, &value)?;
        }
        if let Some(value) = lookup(ENV_SHUTDOWN_TIMEOUT_MS) {
            cfg.shutdown_timeout_ms = parse_var(ENV_SHUTDOWN_TIMEOUT_MS, &value)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{key}={value:?} is invalid: {e}"))
}
