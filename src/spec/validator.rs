//! Whole-document validation against a JSON Schema

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use super::error::SpecError;
use crate::validation::{JsonSchemaValidator, SchemaValidator};

/// Validates a raw tool document against a document schema.
///
/// Without an explicit schema the built-in minimal schema is used: it requires the
/// four mandatory sections and the identity fields, nothing more.
pub struct SpecValidator {
    schema: Value,
    validator: Arc<dyn SchemaValidator>,
}

impl SpecValidator {
    pub fn new() -> Self {
        Self::with_schema(Self::builtin_minimal_schema())
    }

    pub fn with_schema(schema: Value) -> Self {
        Self {
            schema,
            validator: Arc::new(JsonSchemaValidator),
        }
    }

    /// Load the document schema from a JSON file.
    pub async fn from_schema_file(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SpecError::Load {
                path: path.to_string_lossy().to_string(),
                reason: e.to_string(),
                hint: Some("Pass a readable JSON Schema file to --schema.".to_string()),
            })?;
        let schema: Value =
            serde_json::from_str(&content).map_err(|e| SpecError::Json(e.to_string()))?;
        Ok(Self::with_schema(schema))
    }

    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn validate(&self, document: &Value) -> Result<(), SpecError> {
        self.validator
            .validate(document, &self.schema)
            .map_err(|diag| SpecError::SchemaViolation(diag.messages))
    }

    fn builtin_minimal_schema() -> Value {
        serde_json::json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "required": ["manifest", "capabilities", "execution", "usage_guidance"],
            "properties": {
                "manifest": {
                    "type": "object",
                    "required": ["id", "name", "version", "category"],
                    "properties": {
                        "id": { "type": "string", "minLength": 1 },
                        "name": { "type": "string", "minLength": 1 },
                        "version": { "type": "string", "minLength": 1 },
                        "category": { "type": "string" },
                        "tags": { "type": "array", "items": { "type": "string" } }
                    }
                },
                "capabilities": {
                    "type": "object",
                    "required": ["primary_function"]
                },
                "execution": {
                    "type": "object",
                    "required": ["protocol", "endpoint"],
                    "properties": {
                        "endpoint": { "type": "object", "required": ["type"] }
                    }
                },
                "usage_guidance": { "type": "object" },
                "error_handling": { "type": "array" },
                "examples": { "type": "array" }
            },
            "additionalProperties": true
        })
    }
}

impl Default for SpecValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_schema_flags_missing_sections() {
        let err = SpecValidator::new()
            .validate(&json!({"manifest": {"id": "x", "name": "x", "version": "1", "category": "other"}}))
            .unwrap_err();
        match err {
            SpecError::SchemaViolation(msgs) => {
                assert!(msgs.iter().any(|m| m.contains("capabilities")), "{msgs:?}")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_custom_schema() {
        let v = SpecValidator::with_schema(json!({"type": "object", "required": ["aitool_version"]}));
        assert!(v.validate(&json!({"aitool_version": "1.0.0"})).is_ok());
        assert!(v.validate(&json!({})).is_err());
    }
}
