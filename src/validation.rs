//! 模式校验边界：把 JSON Schema 校验委托给外部校验器。
//!
//! Schema validation boundary.
//!
//! The engine never interprets JSON Schema itself. It calls a [`SchemaValidator`];
//! [`JsonSchemaValidator`] delegates to the `jsonschema` crate, and
//! [`NoopSchemaValidator`] is the degraded "always valid" fallback.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Diagnostic returned when a document does not satisfy a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDiagnostic {
    pub messages: Vec<String>,
}

impl SchemaDiagnostic {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }
}

impl fmt::Display for SchemaDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("; "))
    }
}

/// validate(document, schema) capability.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, document: &Value, schema: &Value) -> Result<(), SchemaDiagnostic>;
}

/// Validator backed by the `jsonschema` crate (Draft 7).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl JsonSchemaValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, document: &Value, schema: &Value) -> Result<(), SchemaDiagnostic> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| SchemaDiagnostic::single(format!("invalid schema: {}", e)))?;

        let result = compiled.validate(document);
        if let Err(errors) = result {
            let messages: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect();
            return Err(SchemaDiagnostic::new(messages));
        }
        Ok(())
    }
}

/// Always-valid validator, used when schema checking is unavailable or disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSchemaValidator;

impl SchemaValidator for NoopSchemaValidator {
    fn validate(&self, _document: &Value, _schema: &Value) -> Result<(), SchemaDiagnostic> {
        Ok(())
    }
}

/// Shared default validator.
pub fn default_validator() -> Arc<dyn SchemaValidator> {
    Arc::new(JsonSchemaValidator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {"type": "string"},
                "limit": {"type": "integer", "minimum": 1}
            }
        })
    }

    #[test]
    fn test_valid_document_passes() {
        let v = JsonSchemaValidator::new();
        assert!(v.validate(&json!({"query": "red shirts", "limit": 10}), &schema()).is_ok());
    }

    #[test]
    fn test_invalid_document_reports_every_error() {
        let v = JsonSchemaValidator::new();
        let diag = v
            .validate(&json!({"limit": 0}), &schema())
            .unwrap_err();
        assert_eq!(diag.messages.len(), 2, "{diag}");
        assert!(diag.to_string().contains("query"));
    }

    #[test]
    fn test_broken_schema_is_a_diagnostic_not_a_panic() {
        let v = JsonSchemaValidator::new();
        let diag = v
            .validate(&json!({}), &json!({"type": 12}))
            .unwrap_err();
        assert!(diag.messages[0].starts_with("invalid schema"));
    }

    #[test]
    fn test_noop_accepts_anything() {
        assert!(NoopSchemaValidator
            .validate(&json!(42), &json!({"type": "object"}))
            .is_ok());
    }
}
