use serde_json::Value;
use std::time::Duration;

use super::classification::select_rule;
use super::{EngineConfig, ExecuteOptions, ExecutionEngine};
use crate::events::ExecutionEvent;
use crate::function::{InvocationError, Params};
use crate::spec::{ErrorRecovery, RecoveryStrategy};
use crate::tool::Tool;
use crate::{Error, Result};

/// What to do after a failed invocation matched a rule.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Decision {
    /// Up to `retries` further attempts; delays come from the rule's schedule.
    Backoff { retries: u32 },
    WaitAndRetry {
        wait: Duration,
        message: Option<String>,
    },
    Notify { message: String },
    Fail,
}

impl Decision {
    pub(crate) fn plan(rule: &ErrorRecovery, failure: &InvocationError, config: &EngineConfig) -> Self {
        match rule.strategy {
            RecoveryStrategy::RetryWithBackoff => {
                let retries = rule
                    .max_retries
                    .filter(|n| *n > 0)
                    .unwrap_or(config.default_max_retries);
                Decision::Backoff { retries }
            }
            RecoveryStrategy::WaitAndRetry => {
                // Zero or negative means "use the default", like an absent value.
                let wait = rule
                    .wait_seconds
                    .filter(|s| *s > 0.0)
                    .map(|s| Duration::try_from_secs_f64(s).unwrap_or(Duration::MAX))
                    .unwrap_or(config.default_wait);
                Decision::WaitAndRetry {
                    wait: config.clamp(wait),
                    message: rule.message_to_user.clone(),
                }
            }
            RecoveryStrategy::PromptUser => Decision::Notify {
                message: rule
                    .message_to_user
                    .clone()
                    .unwrap_or_else(|| failure.to_string()),
            },
            // Plain retry and alternate_tool are surfaced to the caller; the
            // fallback id travels in the RecoverySelected event.
            RecoveryStrategy::Retry | RecoveryStrategy::AlternateTool | RecoveryStrategy::Fail => {
                Decision::Fail
            }
        }
    }
}

impl ExecutionEngine {
    pub(crate) async fn recover(
        &self,
        tool: &Tool,
        params: &Params,
        options: ExecuteOptions,
        failure: InvocationError,
    ) -> Result<Value> {
        let Some((rule_index, rule)) = select_rule(tool, &failure) else {
            self.emit(ExecutionEvent::Unhandled {
                tool: tool.id().to_string(),
                kind: failure.kind.clone(),
            })
            .await;
            return Err(Error::Invocation(failure));
        };

        self.emit(ExecutionEvent::RecoverySelected {
            tool: tool.id().to_string(),
            rule_index,
            strategy: rule.strategy.to_string(),
            fallback_tool: rule.fallback_tool.clone(),
        })
        .await;

        match Decision::plan(rule, &failure, &self.config) {
            Decision::Backoff { retries } => {
                self.retry_with_backoff(tool, params, options.single_attempt(), rule, retries, failure)
                    .await
            }
            Decision::WaitAndRetry { wait, message } => {
                if let Some(message) = message {
                    self.emit(ExecutionEvent::UserNotice {
                        tool: tool.id().to_string(),
                        message,
                    })
                    .await;
                }
                self.emit(ExecutionEvent::RetryScheduled {
                    tool: tool.id().to_string(),
                    attempt: 1,
                    max_attempts: 1,
                    delay_ms: wait.as_millis() as u64,
                })
                .await;
                tokio::time::sleep(wait).await;
                self.execute_once(tool, params, options.single_attempt()).await
            }
            Decision::Notify { message } => {
                self.emit(ExecutionEvent::UserNotice {
                    tool: tool.id().to_string(),
                    message,
                })
                .await;
                Err(Error::Invocation(failure))
            }
            Decision::Fail => Err(Error::Invocation(failure)),
        }
    }

    async fn retry_with_backoff(
        &self,
        tool: &Tool,
        params: &Params,
        options: ExecuteOptions,
        rule: &ErrorRecovery,
        max_attempts: u32,
        original: InvocationError,
    ) -> Result<Value> {
        let mut last = original;

        for attempt in 1..=max_attempts {
            let delay = self
                .config
                .clamp(rule.backoff_before(attempt, &self.config.default_backoff_ms));
            self.emit(ExecutionEvent::RetryScheduled {
                tool: tool.id().to_string(),
                attempt,
                max_attempts,
                delay_ms: delay.as_millis() as u64,
            })
            .await;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.execute_once(tool, params, options).await {
                Err(Error::Invocation(failure)) => last = failure,
                // Success, or a failure no rule may handle.
                outcome => return outcome,
            }
        }

        self.emit(ExecutionEvent::RecoveryExhausted {
            tool: tool.id().to_string(),
            attempts: max_attempts,
        })
        .await;
        Err(Error::RecoveryExhausted {
            attempts: max_attempts,
            last,
        })
    }
}
