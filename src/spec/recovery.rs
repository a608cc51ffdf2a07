//! Error recovery rules (`error_handling` section)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::error::SpecError;

/// How an invocation failure is handled once a rule matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    Retry,
    RetryWithBackoff,
    WaitAndRetry,
    AlternateTool,
    Fail,
    PromptUser,
}

impl RecoveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::RetryWithBackoff => "retry_with_backoff",
            Self::WaitAndRetry => "wait_and_retry",
            Self::AlternateTool => "alternate_tool",
            Self::Fail => "fail",
            Self::PromptUser => "prompt_user",
        }
    }
}

impl FromStr for RecoveryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retry" => Ok(Self::Retry),
            "retry_with_backoff" => Ok(Self::RetryWithBackoff),
            "wait_and_retry" => Ok(Self::WaitAndRetry),
            "alternate_tool" => Ok(Self::AlternateTool),
            "fail" => Ok(Self::Fail),
            "prompt_user" => Ok(Self::PromptUser),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `error_handling`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecovery {
    pub error_type: String,
    pub error_code: Option<String>,
    pub strategy: RecoveryStrategy,
    pub max_retries: Option<u32>,
    pub backoff_ms: Option<Vec<u64>>,
    pub wait_seconds: Option<f64>,
    pub fallback_tool: Option<String>,
    pub message_to_user: Option<String>,
}

#[derive(Deserialize)]
struct RawRule {
    error_type: String,
    #[serde(default)]
    error_code: Option<String>,
    recovery: RawRecovery,
}

#[derive(Deserialize)]
struct RawRecovery {
    strategy: String,
    #[serde(default)]
    max_retries: Option<u32>,
    #[serde(default)]
    backoff_ms: Option<Vec<u64>>,
    #[serde(default)]
    wait_seconds: Option<f64>,
    #[serde(default)]
    fallback_tool: Option<String>,
    #[serde(default)]
    message_to_user: Option<String>,
}

impl ErrorRecovery {
    /// Parse the rule at `error_handling[index]`.
    pub(crate) fn from_value(index: usize, value: &serde_json::Value) -> Result<Self, SpecError> {
        let raw: RawRule = serde_json::from_value(value.clone()).map_err(|e| {
            SpecError::invalid(format!("error_handling[{}]", index), e.to_string())
        })?;
        let strategy = raw
            .recovery
            .strategy
            .parse::<RecoveryStrategy>()
            .map_err(|value| SpecError::UnknownStrategy { index, value })?;

        if let Some(wait) = raw.recovery.wait_seconds {
            if !wait.is_finite() || wait < 0.0 {
                return Err(SpecError::invalid(
                    format!("error_handling[{}].recovery.wait_seconds", index),
                    "must be a non-negative number",
                ));
            }
        }

        Ok(Self {
            error_type: raw.error_type,
            error_code: raw.error_code,
            strategy,
            max_retries: raw.recovery.max_retries,
            backoff_ms: raw.recovery.backoff_ms,
            wait_seconds: raw.recovery.wait_seconds,
            fallback_tool: raw.recovery.fallback_tool,
            message_to_user: raw.recovery.message_to_user,
        })
    }

    /// True when `kind` equals `error_code`, or `error_type` occurs inside `message`.
    ///
    /// An empty `error_type` is a substring of everything, so it acts as a catch-all.
    pub fn matches(&self, kind: &str, message: &str) -> bool {
        self.error_code.as_deref() == Some(kind) || message.contains(&self.error_type)
    }

    /// Delay before retry number `attempt`. Attempt 0 is the original call and never waits.
    ///
    /// Once the configured sequence runs out its last value is reused.
    pub fn backoff_before(&self, attempt: u32, defaults: &[u64]) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let schedule = match self.backoff_ms.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => defaults,
        };
        let idx = (attempt as usize - 1).min(schedule.len().saturating_sub(1));
        Duration::from_millis(schedule.get(idx).copied().unwrap_or(0))
    }
}
