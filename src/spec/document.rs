//! Whole-document parsing: raw JSON value to typed [`ToolSpec`]

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::capabilities::Capabilities;
use super::error::SpecError;
use super::execution::ExecutionSpec;
use super::guidance::UsageGuidance;
use super::manifest::ToolManifest;
use super::recovery::ErrorRecovery;

/// Top-level sections every tool document must carry.
pub const REQUIRED_SECTIONS: [&str; 4] = ["manifest", "capabilities", "execution", "usage_guidance"];

/// Typed view of a tool document.
///
/// Construction is pure deserialization plus presence checks: no I/O and no code loading.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub manifest: ToolManifest,
    pub capabilities: Capabilities,
    pub execution: ExecutionSpec,
    pub usage_guidance: UsageGuidance,
    /// Ordered; the first matching rule wins.
    pub error_handling: Vec<ErrorRecovery>,
    pub examples: Vec<Value>,
    raw: Value,
}

impl ToolSpec {
    pub fn from_value(raw: Value) -> Result<Self, SpecError> {
        let obj = raw.as_object().ok_or(SpecError::NotAnObject)?;

        for section in REQUIRED_SECTIONS {
            if !obj.contains_key(section) {
                return Err(SpecError::MissingSection {
                    section: section.to_string(),
                });
            }
        }

        let manifest: ToolManifest = section(obj, "manifest")?;
        manifest.check()?;
        let capabilities: Capabilities = section(obj, "capabilities")?;
        let execution: ExecutionSpec = section(obj, "execution")?;
        let usage_guidance: UsageGuidance = section(obj, "usage_guidance")?;

        let error_handling = match obj.get("error_handling") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(rules)) => rules
                .iter()
                .enumerate()
                .map(|(i, rule)| ErrorRecovery::from_value(i, rule))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(SpecError::invalid("error_handling", "must be an array")),
        };

        let examples = match obj.get("examples") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return Err(SpecError::invalid("examples", "must be an array")),
        };

        Ok(Self {
            manifest,
            capabilities,
            execution,
            usage_guidance,
            error_handling,
            examples,
            raw,
        })
    }

    /// The source document, unchanged.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Optional top-level section not modelled by the runtime (`testing`, `operations`, ...).
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

fn section<T: DeserializeOwned>(
    obj: &serde_json::Map<String, Value>,
    name: &str,
) -> Result<T, SpecError> {
    let value = obj.get(name).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| SpecError::invalid(name, e.to_string()))
}
