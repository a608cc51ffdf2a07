//! Usage guidance (`usage_guidance` section)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// When (and when not) an agent should pick this tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageGuidance {
    #[serde(default)]
    pub when_to_use: Vec<Trigger>,
    #[serde(default)]
    pub when_not_to_use: Vec<Value>,
    #[serde(default)]
    pub best_practices: Vec<Value>,
    #[serde(default)]
    pub common_mistakes: Vec<Value>,
}

/// A trigger phrase with example queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub trigger: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form: documents use both labels (`"high"`) and scores (`0.9`).
    pub confidence: Option<Value>,
    #[serde(default)]
    pub examples: Vec<String>,
}
