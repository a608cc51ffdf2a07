//! Capability flags (`capabilities` section)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Descriptive capability metadata.
///
/// The engine does not act on these flags; they are for callers (an agent may,
/// for example, only auto-retry tools that declare themselves idempotent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub primary_function: String,
    #[serde(default)]
    pub supported_operations: Vec<String>,
    #[serde(default)]
    pub idempotent: bool,
    #[serde(default)]
    pub stateful: bool,
    #[serde(default)]
    pub requires_auth: bool,
    /// Keys outside the well-known set, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Capabilities {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
