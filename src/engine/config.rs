//! Engine defaults and environment overrides.

use std::time::Duration;

use crate::{Error, ErrorContext, Result};

/// Defaults applied when a recovery rule leaves a field unset.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Used when `max_retries` is absent or zero.
    pub default_max_retries: u32,
    /// Used when `backoff_ms` is absent or empty.
    pub default_backoff_ms: Vec<u64>,
    /// Used when `wait_seconds` is absent.
    pub default_wait: Duration,
    /// Upper bound applied to every backoff or wait delay.
    pub max_delay: Duration,
    /// Cancel invocations that exceed `execution.timeout_seconds`.
    pub enforce_timeouts: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_max_retries: 3,
            default_backoff_ms: vec![1000, 2000, 4000],
            default_wait: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            enforce_timeouts: true,
        }
    }
}

impl EngineConfig {
    pub const ENV_ENFORCE_TIMEOUT: &'static str = "AITOOL_ENFORCE_TIMEOUT";
    pub const ENV_MAX_RETRIES: &'static str = "AITOOL_DEFAULT_MAX_RETRIES";
    pub const ENV_WAIT_SECONDS: &'static str = "AITOOL_DEFAULT_WAIT_SECONDS";

    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `AITOOL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(Self::ENV_ENFORCE_TIMEOUT) {
            cfg.enforce_timeouts = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid_env(Self::ENV_ENFORCE_TIMEOUT, &raw, "expected a boolean")),
            };
        }

        if let Some(raw) = lookup(Self::ENV_MAX_RETRIES) {
            cfg.default_max_retries = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid_env(Self::ENV_MAX_RETRIES, &raw, "expected a positive integer"))?;
        }

        if let Some(raw) = lookup(Self::ENV_WAIT_SECONDS) {
            let wait = raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|s| Duration::try_from_secs_f64(s).ok())
                .ok_or_else(|| invalid_env(Self::ENV_WAIT_SECONDS, &raw, "expected non-negative seconds"))?;
            cfg.default_wait = wait;
        }

        Ok(cfg)
    }

    pub fn with_default_max_retries(mut self, n: u32) -> Self {
        self.default_max_retries = n.max(1);
        self
    }

    pub fn with_default_backoff_ms(mut self, schedule: Vec<u64>) -> Self {
        if !schedule.is_empty() {
            self.default_backoff_ms = schedule;
        }
        self
    }

    pub fn with_default_wait(mut self, wait: Duration) -> Self {
        self.default_wait = wait;
        self
    }

    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.max_delay = max;
        self
    }

    pub fn with_enforce_timeouts(mut self, enforce: bool) -> Self {
        self.enforce_timeouts = enforce;
        self
    }

    pub(crate) fn clamp(&self, delay: Duration) -> Duration {
        delay.min(self.max_delay)
    }
}

fn invalid_env(key: &str, raw: &str, expected: &str) -> Error {
    Error::configuration_with_context(
        format!("invalid value '{}': {}", raw, expected),
        ErrorContext::new()
            .with_field_path(key)
            .with_source("engine_config"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let cfg = EngineConfig::from_lookup(lookup(&[
            ("AITOOL_ENFORCE_TIMEOUT", "off"),
            ("AITOOL_DEFAULT_MAX_RETRIES", "5"),
            ("AITOOL_DEFAULT_WAIT_SECONDS", "0.25"),
        ]))
        .unwrap();
        assert!(!cfg.enforce_timeouts);
        assert_eq!(cfg.default_max_retries, 5);
        assert_eq!(cfg.default_wait, Duration::from_millis(250));
        assert_eq!(cfg.default_backoff_ms, vec![1000, 2000, 4000]);
    }

    #[test]
    fn test_bad_env_value_is_configuration_error() {
        let err = EngineConfig::from_lookup(lookup(&[("AITOOL_DEFAULT_MAX_RETRIES", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("AITOOL_DEFAULT_MAX_RETRIES")
        );
    }

    #[test]
    fn test_clamp() {
        let cfg = EngineConfig::new().with_max_delay(Duration::from_millis(500));
        assert_eq!(cfg.clamp(Duration::from_secs(2)), Duration::from_millis(500));
        assert_eq!(cfg.clamp(Duration::from_millis(20)), Duration::from_millis(20));
    }
}
