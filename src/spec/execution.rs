//! Execution descriptor (`execution` section)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// The only invocation protocol the runtime implements.
pub const FUNCTION_CALL_PROTOCOL: &str = "function_call";

/// Endpoint types that name a callable inside a namespace.
pub const NAMED_FUNCTION_TYPES: &[&str] = &["python_function", "rust_function"];

/// How a tool is invoked and what it accepts and returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSpec {
    pub protocol: String,
    pub endpoint: EndpointSpec,
    /// JSON Schema for the input parameters.
    #[serde(default = "empty_object_schema")]
    pub parameters: Value,
    #[serde(default)]
    pub returns: ReturnsSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,
}

impl ExecutionSpec {
    /// Declared per-attempt timeout. Absent, zero, negative or non-finite values mean "none".
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .filter(|s| *s > 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object" })
}

/// Endpoint descriptor, discriminated by `type`.
///
/// Any `type` parses; unsupported ones are rejected when the tool is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EndpointSpec {
    pub fn is_named_function(&self) -> bool {
        NAMED_FUNCTION_TYPES.contains(&self.kind.as_str())
    }

    /// `(namespace, function)` pair for named-function endpoints.
    pub fn target(&self) -> Option<(&str, &str)> {
        if !self.is_named_function() {
            return None;
        }
        Some((self.module.as_deref()?, self.function.as_deref()?))
    }
}

/// `execution.returns`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_schema: Option<Value>,
    #[serde(default)]
    pub success_criteria: Vec<Value>,
}
