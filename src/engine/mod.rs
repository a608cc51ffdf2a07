//! 执行引擎：校验输入、调用工具实现，并按工具声明的错误恢复规则处理失败。
//!
//! Execution engine.
//!
//! [`ExecutionEngine::execute`] runs one tool call through a fixed pipeline:
//!
//! 1. validate `params` against `execution.parameters`
//! 2. resolve the implementation through the [`FunctionTable`]
//! 3. invoke it, bounded by `execution.timeout_seconds` when enforcement is on
//! 4. validate the result against `returns.success_schema` (advisory only)
//! 5. on invocation failure, dispatch to the first matching recovery rule
//!
//! Only failures raised by the implementation reach step 5. Everything else is
//! returned as-is.

pub mod classification;
pub mod config;
mod execution;
mod recovery;

pub use classification::is_recoverable;
pub use config::EngineConfig;

use std::sync::Arc;

use crate::events::{EventSink, ExecutionEvent, TracingEventSink};
use crate::function::{global_functions, FunctionTable};
use crate::validation::{default_validator, SchemaValidator};

/// Per-call switches. All default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    pub validate_input: bool,
    pub validate_output: bool,
    pub handle_errors: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            validate_input: true,
            validate_output: true,
            handle_errors: true,
        }
    }
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate_input(mut self, on: bool) -> Self {
        self.validate_input = on;
        self
    }

    pub fn validate_output(mut self, on: bool) -> Self {
        self.validate_output = on;
        self
    }

    pub fn handle_errors(mut self, on: bool) -> Self {
        self.handle_errors = on;
        self
    }

    /// Options for one attempt made from inside a recovery strategy.
    pub(crate) fn single_attempt(self) -> Self {
        self.handle_errors(false)
    }
}

/// Runs tools against a function table with error recovery.
#[derive(Clone)]
pub struct ExecutionEngine {
    functions: Arc<FunctionTable>,
    validator: Arc<dyn SchemaValidator>,
    sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(global_functions())
    }
}

impl ExecutionEngine {
    pub fn new(functions: Arc<FunctionTable>) -> Self {
        Self {
            functions,
            validator: default_validator(),
            sink: Arc::new(TracingEventSink),
            config: EngineConfig::default(),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn functions(&self) -> &Arc<FunctionTable> {
        &self.functions
    }

    pub fn validator(&self) -> &Arc<dyn SchemaValidator> {
        &self.validator
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn emit(&self, event: ExecutionEvent) {
        if let Err(e) = self.sink.report(event).await {
            tracing::debug!(error = %e, "event sink rejected event");
        }
    }
}
