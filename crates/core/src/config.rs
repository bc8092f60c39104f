//! Immutable configuration value objects.
//!
//! Configuration is resolved once at startup (environment variables, with
//! CLI overrides applied by the binary) and passed into the scheduler at
//! construction. Nothing reads the environment during ticks.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Credentials and endpoint for the DOI registration service.
#[derive(Clone)]
pub struct DoiConfig {
    /// Base URL of the registration API, e.g. `https://api.test.datacite.org`.
    pub base_url: String,
    /// Repository account username.
    pub username: String,
    /// Repository account password.
    pub password: String,
    /// DOI prefix assigned to the repository, e.g. `10.12345`.
    pub prefix: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

// Manual Debug so the password never lands in logs.
impl std::fmt::Debug for DoiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoiConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("prefix", &self.prefix)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl DoiConfig {
    /// Build from `DOI_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns a config error if any required variable is missing or empty.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: required_env("DOI_BASE_URL")?,
            username: required_env("DOI_USERNAME")?,
            password: required_env("DOI_PASSWORD")?,
            prefix: required_env("DOI_PREFIX")?,
            request_timeout: Duration::from_secs(30),
        })
    }
}

/// Scheduler tuning knobs.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Fixed interval between reconciliation ticks.
    pub poll_interval: Duration,
    /// Maximum concurrent registration calls within one tick.
    pub workers: usize,
    /// Run the remote drift audit every N ticks; 0 disables it.
    pub audit_every_ticks: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            workers: 4,
            audit_every_ticks: 12,
        }
    }
}

fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::config(format!(
            "missing required environment variable {name}"
        ))),
    }
}
