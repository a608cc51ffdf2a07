//! 执行事件：引擎向可注入的观测接收器报告每个阶段。
//!
//! Execution events and observability sinks.
//!
//! The engine reports every stage of an `execute` call to an injected
//! [`EventSink`]. Sinks only observe; a failing sink never changes the outcome of
//! a call.
//!
//! | Sink | Description |
//! |------|-------------|
//! | [`NoopEventSink`] | Drops everything |
//! | [`TracingEventSink`] | Forwards to `tracing`; the engine default |
//! | [`InMemoryEventSink`] | Bounded buffer, for tests |

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Something that happened while executing a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    Started {
        tool: String,
    },
    Succeeded {
        tool: String,
        elapsed_ms: u64,
    },
    /// The result did not match `success_schema`; the result is still returned.
    OutputInvalid {
        tool: String,
        diagnostic: String,
    },
    Failed {
        tool: String,
        kind: String,
        message: String,
    },
    RecoverySelected {
        tool: String,
        rule_index: usize,
        strategy: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback_tool: Option<String>,
    },
    /// No rule matched the failure; it is returned to the caller unchanged.
    Unhandled {
        tool: String,
        kind: String,
    },
    RetryScheduled {
        tool: String,
        attempt: u32,
        max_attempts: u32,
        delay_ms: u64,
    },
    UserNotice {
        tool: String,
        message: String,
    },
    RecoveryExhausted {
        tool: String,
        attempts: u32,
    },
}

/// Destination for execution events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn report(&self, event: ExecutionEvent) -> Result<()>;
}

/// Sink that discards all events.
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn report(&self, _event: ExecutionEvent) -> Result<()> {
        Ok(())
    }
}

pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoopEventSink)
}

/// Sink that turns events into `tracing` records.
#[derive(Debug, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn report(&self, event: ExecutionEvent) -> Result<()> {
        match &event {
            ExecutionEvent::Started { tool } => tracing::info!(tool = %tool, "Executing tool"),
            ExecutionEvent::Succeeded { tool, elapsed_ms } => {
                tracing::info!(tool = %tool, elapsed_ms, "Tool executed successfully")
            }
            ExecutionEvent::OutputInvalid { tool, diagnostic } => {
                tracing::warn!(tool = %tool, diagnostic = %diagnostic, "Output validation failed")
            }
            ExecutionEvent::Failed { tool, kind, message } => {
                tracing::warn!(tool = %tool, error_kind = %kind, "Tool invocation failed: {}", message)
            }
            ExecutionEvent::RecoverySelected {
                tool,
                rule_index,
                strategy,
                fallback_tool,
            } => tracing::info!(
                tool = %tool,
                rule_index,
                strategy = %strategy,
                fallback_tool = fallback_tool.as_deref().unwrap_or(""),
                "Handling error with strategy: {}",
                strategy
            ),
            ExecutionEvent::Unhandled { tool, kind } => {
                tracing::error!(tool = %tool, error_kind = %kind, "No error handler found for {}", kind)
            }
            ExecutionEvent::RetryScheduled {
                tool,
                attempt,
                max_attempts,
                delay_ms,
            } => tracing::info!(
                tool = %tool,
                attempt,
                max_attempts,
                delay_ms,
                "Retry attempt {}/{} after {}ms",
                attempt,
                max_attempts,
                delay_ms
            ),
            ExecutionEvent::UserNotice { tool, message } => {
                tracing::warn!(tool = %tool, "{}", message)
            }
            ExecutionEvent::RecoveryExhausted { tool, attempts } => {
                tracing::error!(tool = %tool, attempts, "All {} retry attempts failed", attempts)
            }
        }
        Ok(())
    }
}

/// In-memory sink for testing.
pub struct InMemoryEventSink {
    events: Arc<RwLock<Vec<ExecutionEvent>>>,
    max_events: usize,
}

impl InMemoryEventSink {
    pub fn new(max: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            max_events: max,
        }
    }

    pub fn get_events(&self) -> Vec<ExecutionEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delays (ms) of every `RetryScheduled` event, in order.
    pub fn retry_delays(&self) -> Vec<u64> {
        self.get_events()
            .into_iter()
            .filter_map(|e| match e {
                ExecutionEvent::RetryScheduled { delay_ms, .. } => Some(delay_ms),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn report(&self, event: ExecutionEvent) -> Result<()> {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        events.push(event);
        if events.len() > self.max_events {
            events.remove(0);
        }
        Ok(())
    }
}
