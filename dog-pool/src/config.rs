//! # Pool configuration
//!
//! `PoolConfig` is built in code and may be layered with environment
//! overrides, following the DogRS convention of a prefix plus an upper-case
//! key:
//!
//! ```bash
//! export FETCHER_POOL__CONCURRENCY=8
//! export FETCHER_POOL__WATCHDOG_INTERVAL_SECS=120
//! ```
//!
//! ```rust
//! use dog_pool::PoolConfig;
//!
//! let config = PoolConfig::from_env("FETCHER_POOL__").unwrap();
//! assert!(config.concurrency > 0);
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{PoolError, PoolResult};

/// Default number of workers per pool
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default watchdog reporting interval
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(60);

/// Default capacity of the lifecycle event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Configuration for a job pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of jobs executing at once (fixed worker count)
    pub concurrency: usize,
    /// How often the watchdog reports a job that is still running
    pub watchdog_interval: Duration,
    /// Buffered lifecycle events per subscriber before lagging
    pub event_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            watchdog_interval: DEFAULT_WATCHDOG_INTERVAL,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Create a config with the given concurrency and defaults elsewhere
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Self::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_watchdog_interval(mut self, interval: Duration) -> Self {
        self.watchdog_interval = interval;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Reject configurations that could never drain a queue
    pub fn validate(&self) -> PoolResult<()> {
        if self.concurrency == 0 {
            return Err(PoolError::InvalidConcurrency(self.concurrency));
        }
        if self.watchdog_interval.is_zero() {
            return Err(PoolError::Config("watchdog_interval must be non-zero".to_string()));
        }
        if self.event_capacity == 0 {
            return Err(PoolError::Config("event_capacity must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Defaults overridden by `{prefix}CONCURRENCY`,
    /// `{prefix}WATCHDOG_INTERVAL_SECS` and `{prefix}EVENT_CAPACITY`.
    pub fn from_env(prefix: &str) -> PoolResult<Self> {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Same as [`from_env`](Self::from_env) over an explicit variable set
    pub fn from_vars<I, K, V>(prefix: &str, vars: I) -> PoolResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (key, value) in vars {
            let Some(stripped) = key.as_ref().strip_prefix(prefix) else {
                continue;
            };
            let value = value.as_ref().trim();

            match stripped {
                "CONCURRENCY" => config.concurrency = parse_number(stripped, value)?,
                "WATCHDOG_INTERVAL_SECS" => {
                    config.watchdog_interval = Duration::from_secs(parse_number(stripped, value)?)
                }
                "EVENT_CAPACITY" => config.event_capacity = parse_number(stripped, value)?,
                _ => {}
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_number<N>(key: &str, value: &str) -> PoolResult<N>
where
    N: FromStr,
    N::Err: fmt::Display,
{
    value.parse::<N>().map_err(|e| {
        PoolError::Config(format!("{} must be a non-negative integer, got {:?}: {}", key, value, e))
    })
}
