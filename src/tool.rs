//! A loaded tool: parsed specification plus a lazily resolved implementation.

use once_cell::sync::OnceCell;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::function::{FunctionTable, Params, ResolutionError, ToolFunction};
use crate::registry::matcher::{KeywordTriggerMatcher, TriggerMatcher};
use crate::spec::{
    Capabilities, ErrorRecovery, ExecutionSpec, SpecError, SpecLoader, ToolManifest, ToolSpec,
    UsageGuidance,
};
use crate::validation::{SchemaDiagnostic, SchemaValidator};
use crate::{Error, ErrorContext, Result};

/// A tool built from one declarative document.
///
/// Immutable after construction, except for the resolved handler which is cached
/// on first successful resolution.
pub struct Tool {
    spec: ToolSpec,
    resolved: OnceCell<Arc<dyn ToolFunction>>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("id", &self.spec.manifest.id)
            .field("name", &self.spec.manifest.name)
            .field("version", &self.spec.manifest.version)
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}

impl Tool {
    pub fn new(spec: ToolSpec) -> Self {
        Self {
            spec,
            resolved: OnceCell::new(),
        }
    }

    pub fn from_value(value: Value) -> std::result::Result<Self, SpecError> {
        ToolSpec::from_value(value).map(Self::new)
    }

    pub fn from_json_str(json: &str) -> std::result::Result<Self, SpecError> {
        let value: Value = serde_json::from_str(json).map_err(|e| SpecError::Json(e.to_string()))?;
        Self::from_value(value)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, SpecError> {
        SpecLoader::new().load_file(path).await.map(Self::new)
    }

    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    pub fn manifest(&self) -> &ToolManifest {
        &self.spec.manifest
    }

    pub fn id(&self) -> &str {
        &self.spec.manifest.id
    }

    pub fn name(&self) -> &str {
        &self.spec.manifest.name
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.spec.capabilities
    }

    pub fn execution(&self) -> &ExecutionSpec {
        &self.spec.execution
    }

    pub fn usage_guidance(&self) -> &UsageGuidance {
        &self.spec.usage_guidance
    }

    pub fn error_handlers(&self) -> &[ErrorRecovery] {
        &self.spec.error_handling
    }

    /// `"<display name or name>: <description>"`
    pub fn describe(&self) -> String {
        let m = &self.spec.manifest;
        format!("{}: {}", m.title(), m.description)
    }

    /// The source document.
    pub fn to_value(&self) -> &Value {
        self.spec.raw()
    }

    /// Validate input parameters against `execution.parameters`.
    pub fn validate_input(&self, params: &Params, validator: &dyn SchemaValidator) -> Result<()> {
        let document = Value::Object(params.clone());
        validator
            .validate(&document, &self.spec.execution.parameters)
            .map_err(|diag| {
                Error::validation_with_context(
                    format!("Invalid input parameters: {}", diag),
                    ErrorContext::new()
                        .with_field_path("execution.parameters")
                        .with_details(self.id().to_string())
                        .with_source("input_validator"),
                )
            })
    }

    /// Validate a result against `execution.returns.success_schema`, if one is declared.
    pub fn validate_output(
        &self,
        result: &Value,
        validator: &dyn SchemaValidator,
    ) -> std::result::Result<(), SchemaDiagnostic> {
        match &self.spec.execution.returns.success_schema {
            Some(schema) => validator.validate(result, schema),
            None => Ok(()),
        }
    }

    /// Resolve the implementation, caching it for the lifetime of this tool.
    pub fn resolve(
        &self,
        functions: &FunctionTable,
    ) -> std::result::Result<Arc<dyn ToolFunction>, ResolutionError> {
        self.resolved
            .get_or_try_init(|| functions.resolve(&self.spec.execution))
            .cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// First rule matching the failure, with its position in `error_handling`.
    pub fn find_recovery(&self, kind: &str, message: &str) -> Option<(usize, &ErrorRecovery)> {
        self.spec
            .error_handling
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(kind, message))
    }

    /// Keyword heuristic over `usage_guidance.when_to_use`; see [`KeywordTriggerMatcher`].
    pub fn matches_trigger(&self, query: &str) -> bool {
        KeywordTriggerMatcher.matches(self, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::JsonSchemaValidator;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doc() -> Value {
        json!({
            "manifest": {
                "id": "com.acme.search",
                "name": "search",
                "version": "1.0.0",
                "display_name": "Product Search",
                "description": "Searches products",
                "category": "data_retrieval"
            },
            "capabilities": {"primary_function": "search"},
            "execution": {
                "protocol": "function_call",
                "endpoint": {"type": "python_function", "module": "acme", "function": "search"},
                "parameters": {"type": "object", "required": ["q"]}
            },
            "usage_guidance": {}
        })
    }

    #[test]
    fn test_describe() {
        let tool = Tool::from_value(doc()).unwrap();
        assert_eq!(tool.describe(), "Product Search: Searches products");
        assert_eq!(tool.to_value(), &doc());
    }

    #[test]
    fn test_resolution_is_cached() {
        let tool = Tool::from_value(doc()).unwrap();
        let table = FunctionTable::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        table.register_sync("acme", "search", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        });

        assert!(!tool.is_resolved());
        let first = tool.resolve(&table).unwrap();
        // An empty table would fail, so a second success proves the cache was used.
        let second = tool.resolve(&FunctionTable::new()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(tool.is_resolved());
        // Resolving never invokes the handler.
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failed_resolution_is_not_cached() {
        let tool = Tool::from_value(doc()).unwrap();
        assert!(tool.resolve(&FunctionTable::new()).is_err());
        let table = FunctionTable::new();
        table.register_sync("acme", "search", |_| Ok(Value::Null));
        assert!(tool.resolve(&table).is_ok());
    }

    #[test]
    fn test_validate_input_error_is_validation() {
        let tool = Tool::from_value(doc()).unwrap();
        let err = tool
            .validate_input(&Params::new(), &JsonSchemaValidator)
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.context().and_then(|c| c.source.as_deref()),
            Some("input_validator")
        );
    }
}
