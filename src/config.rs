// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Requeue interval for objects that are in sync
    pub poll_interval: Duration,
    /// Number of objects of one kind reconciled in parallel
    pub max_concurrent_reconciles: u16,
    pub error_backoff_base: Duration,
    pub error_backoff_max: Duration,
    /// Requeue interval after errors only the user can fix
    pub terminal_error_requeue: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            poll_interval: Duration::from_secs(60),
            max_concurrent_reconciles: 10,
            error_backoff_base: Duration::from_secs(5),
            error_backoff_max: Duration::from_secs(300),
            terminal_error_requeue: Duration::from_secs(600),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(v) => {
                    let secs: u64 = v
                        .parse()
                        .with_context(|| format!("{} must be a number of seconds, got {:?}", key, v))?;
                    Ok(Duration::from_secs(secs))
                }
                None => Ok(default),
            }
        };

        let max_concurrent_reconciles = match lookup("MAX_CONCURRENT_RECONCILES") {
            Some(v) => v
                .parse()
                .with_context(|| format!("MAX_CONCURRENT_RECONCILES must be a number, got {:?}", v))?,
            None => defaults.max_concurrent_reconciles,
        };

        Ok(Config {
            poll_interval: secs("POLL_INTERVAL_SECS", defaults.poll_interval)?,
            max_concurrent_reconciles,
            error_backoff_base: secs("ERROR_BACKOFF_BASE_SECS", defaults.error_backoff_base)?,
            error_backoff_max: secs("ERROR_BACKOFF_MAX_SECS", defaults.error_backoff_max)?,
            terminal_error_requeue: secs(
                "TERMINAL_ERROR_REQUEUE_SECS",
                defaults.terminal_error_requeue,
            )?,
        })
    }

    /// Exponential backoff for the given number of consecutive failures
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.min(16));
        self.error_backoff_base
            .saturating_mul(factor)
            .min(self.error_backoff_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.max_concurrent_reconciles, 10);
        assert_eq!(config.terminal_error_requeue, Duration::from_secs(600));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("POLL_INTERVAL_SECS", "15"),
            ("MAX_CONCURRENT_RECONCILES", "3"),
            ("ERROR_BACKOFF_BASE_SECS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.max_concurrent_reconciles, 3);
        assert_eq!(config.error_backoff_base, Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = Config::from_lookup(lookup(&[("POLL_INTERVAL_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("POLL_INTERVAL_SECS"));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = Config::default();
        assert_eq!(config.backoff(0), Duration::from_secs(5));
        assert_eq!(config.backoff(1), Duration::from_secs(10));
        assert_eq!(config.backoff(3), Duration::from_secs(40));
        assert_eq!(config.backoff(10), Duration::from_secs(300));
        assert_eq!(config.backoff(u32::MAX), Duration::from_secs(300));
    }
}
