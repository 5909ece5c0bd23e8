//! Runtime configuration sourced from the process environment.

use std::time::Duration;

use regex::Regex;

use crate::error::ConfigError;
use crate::reconciler::backoff::BackoffPolicy;

/// Page size for list calls.
pub const ENV_RESOURCES_PER_LIST_QUERY: &str = "RESOURCES_PER_LIST_QUERY";
/// Minimum delay between two reconciliation passes, in seconds.
pub const ENV_RECONCILE_INTERVAL_SECONDS: &str = "RECONCILE_INTERVAL_SECONDS";
/// Regex of namespace names that are never watched.
pub const ENV_NAMESPACE_IGNORE_PATTERN: &str = "NAMESPACE_IGNORE_PATTERN";

pub const DEFAULT_LIST_LIMIT: u32 = 5;
pub const DEFAULT_PASS_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Maximum items requested per list page.
    pub page_size: u32,
    /// Minimum delay between the end of one pass and the start of the next.
    pub pass_interval: Duration,
    /// Retry schedule for list calls.
    pub backoff: BackoffPolicy,
    /// Namespaces whose name matches are excluded from the watch scope.
    pub namespace_ignore_pattern: Option<Regex>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_LIST_LIMIT,
            pass_interval: DEFAULT_PASS_INTERVAL,
            backoff: BackoffPolicy::default(),
            namespace_ignore_pattern: None,
        }
    }
}

impl ReconcilerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| match std::env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { name }),
        })
    }

    /// Reads the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<Option<String>, ConfigError>,
    {
        let read = |name: &'static str| -> Result<Option<String>, ConfigError> {
            Ok(lookup(name)?.filter(|value| !value.is_empty()))
        };

        let mut config = Self::default();

        if let Some(value) = read(ENV_RESOURCES_PER_LIST_QUERY)? {
            config.page_size = parse_integer(ENV_RESOURCES_PER_LIST_QUERY, &value)?;
        }

        if let Some(value) = read(ENV_RECONCILE_INTERVAL_SECONDS)? {
            let secs: u64 = parse_integer(ENV_RECONCILE_INTERVAL_SECONDS, &value)?;
            config.pass_interval = Duration::from_secs(secs);
        }

        if let Some(pattern) = read(ENV_NAMESPACE_IGNORE_PATTERN)? {
            let regex = Regex::new(&pattern)
                .map_err(|source| ConfigError::InvalidPattern { pattern, source })?;
            config.namespace_ignore_pattern = Some(regex);
        }

        Ok(config)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_pass_interval(mut self, pass_interval: Duration) -> Self {
        self.pass_interval = pass_interval;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

fn parse_integer<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidInteger {
            name,
            value: value.to_string(),
            source,
        })
}
