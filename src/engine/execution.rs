use serde_json::Value;
use std::time::Instant;

use super::{ExecuteOptions, ExecutionEngine};
use crate::events::ExecutionEvent;
use crate::function::{InvocationError, Params, ToolFunction};
use crate::tool::Tool;
use crate::{Error, Result};

impl ExecutionEngine {
    /// Execute `tool` with default options.
    pub async fn run(&self, tool: &Tool, params: &Params) -> Result<Value> {
        self.execute(tool, params, ExecuteOptions::default()).await
    }

    /// Execute `tool`, applying its recovery rules when `handle_errors` is set.
    pub async fn execute(
        &self,
        tool: &Tool,
        params: &Params,
        options: ExecuteOptions,
    ) -> Result<Value> {
        match self.execute_once(tool, params, options).await {
            Err(Error::Invocation(failure)) if options.handle_errors => {
                self.recover(tool, params, options, failure).await
            }
            outcome => outcome,
        }
    }

    /// One pass through validate, resolve, invoke. Never applies recovery.
    pub(crate) async fn execute_once(
        &self,
        tool: &Tool,
        params: &Params,
        options: ExecuteOptions,
    ) -> Result<Value> {
        if options.validate_input {
            tool.validate_input(params, self.validator.as_ref())?;
        }

        let function = tool.resolve(&self.functions)?;

        self.emit(ExecutionEvent::Started {
            tool: tool.id().to_string(),
        })
        .await;
        let started = Instant::now();

        let result = match self.invoke(tool, function.as_ref(), params).await {
            Ok(v) => v,
            Err(failure) => {
                self.emit(ExecutionEvent::Failed {
                    tool: tool.id().to_string(),
                    kind: failure.kind.clone(),
                    message: failure.message.clone(),
                })
                .await;
                return Err(Error::Invocation(failure));
            }
        };

        if options.validate_output {
            if let Err(diag) = tool.validate_output(&result, self.validator.as_ref()) {
                self.emit(ExecutionEvent::OutputInvalid {
                    tool: tool.id().to_string(),
                    diagnostic: diag.to_string(),
                })
                .await;
            }
        }

        self.emit(ExecutionEvent::Succeeded {
            tool: tool.id().to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
        .await;
        Ok(result)
    }

    async fn invoke(
        &self,
        tool: &Tool,
        function: &dyn ToolFunction,
        params: &Params,
    ) -> std::result::Result<Value, InvocationError> {
        let call = function.call(params.clone());
        match tool.execution().timeout() {
            Some(limit) if self.config.enforce_timeouts => {
                match tokio::time::timeout(limit, call).await {
                    Ok(r) => r,
                    Err(_) => Err(InvocationError::timeout(limit)),
                }
            }
            _ => call.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{noop_sink, InMemoryEventSink};
    use crate::function::FunctionTable;
    use serde_json::json;
    use std::sync::Arc;

    fn tool(returns: Value) -> Tool {
        Tool::from_value(json!({
            "manifest": {"id": "com.acme.add", "name": "add", "version": "1.0.0", "category": "computation"},
            "capabilities": {"primary_function": "add"},
            "execution": {
                "protocol": "function_call",
                "endpoint": {"type": "rust_function", "module": "math", "function": "add"},
                "parameters": {
                    "type": "object",
                    "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                    "required": ["a", "b"]
                },
                "returns": returns
            },
            "usage_guidance": {}
        }))
        .unwrap()
    }

    fn table() -> Arc<FunctionTable> {
        let table = FunctionTable::new();
        table.register_sync("math", "add", |p| {
            let a = p.get("a").and_then(Value::as_f64).unwrap_or_default();
            let b = p.get("b").and_then(Value::as_f64).unwrap_or_default();
            Ok(json!({"sum": a + b}))
        });
        Arc::new(table)
    }

    fn params(v: Value) -> Params {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_success_reports_started_and_succeeded() {
        let sink = Arc::new(InMemoryEventSink::default());
        let engine = ExecutionEngine::new(table()).with_sink(sink.clone());
        let out = engine
            .run(&tool(json!({})), &params(json!({"a": 1, "b": 2})))
            .await
            .unwrap();
        assert_eq!(out, json!({"sum": 3.0}));

        let events = sink.get_events();
        assert!(matches!(events[0], ExecutionEvent::Started { .. }));
        assert!(matches!(events[1], ExecutionEvent::Succeeded { .. }));
    }

    #[tokio::test]
    async fn test_invalid_input_skips_resolution() {
        let engine = ExecutionEngine::new(Arc::new(FunctionTable::new())).with_sink(noop_sink());
        let t = tool(json!({}));
        let err = engine.run(&t, &params(json!({"a": 1}))).await.unwrap_err();
        assert!(err.is_validation());
        assert!(!t.is_resolved());
    }

    #[tokio::test]
    async fn test_input_validation_can_be_disabled() {
        let engine = ExecutionEngine::new(table());
        let out = engine
            .execute(
                &tool(json!({})),
                &params(json!({"a": 4})),
                ExecuteOptions::new().validate_input(false),
            )
            .await
            .unwrap();
        assert_eq!(out["sum"], json!(4.0));
    }

    #[tokio::test]
    async fn test_output_mismatch_is_advisory() {
        let sink = Arc::new(InMemoryEventSink::default());
        let engine = ExecutionEngine::new(table()).with_sink(sink.clone());
        let t = tool(json!({"success_schema": {"type": "object", "required": ["total"]}}));
        let out = engine.run(&t, &params(json!({"a": 1, "b": 1}))).await.unwrap();
        assert_eq!(out["sum"], json!(2.0));
        assert!(sink
            .get_events()
            .iter()
            .any(|e| matches!(e, ExecutionEvent::OutputInvalid { .. })));
    }

    #[tokio::test]
    async fn test_unresolvable_tool_is_resolution_error() {
        let engine = ExecutionEngine::new(Arc::new(FunctionTable::new()));
        let err = engine
            .run(&tool(json!({})), &params(json!({"a": 1, "b": 2})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Resolution(_)));
    }
}
