//! Tool manifest: identity and catalogue metadata

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::error::SpecError;

/// Identity block of a tool document (`manifest` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub provider: HashMap<String, String>,
}

impl ToolManifest {
    /// Check the invariants serde cannot express.
    pub(crate) fn check(&self) -> Result<(), SpecError> {
        if self.id.trim().is_empty() {
            return Err(SpecError::invalid("manifest.id", "must not be empty")
                .with_hint("Use a reverse-domain id such as com.company.tool-name"));
        }
        if self.name.trim().is_empty() {
            return Err(SpecError::invalid("manifest.name", "must not be empty"));
        }
        Ok(())
    }

    /// Display name when present, otherwise the function name.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Tool category.
///
/// Unrecognized strings are preserved as [`Category::Other`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    DataRetrieval,
    DataManipulation,
    Communication,
    Computation,
    FileOperations,
    ApiIntegration,
    Automation,
    Monitoring,
    Security,
    /// The literal `other` category, or any value outside the known set.
    Other(String),
}

impl Category {
    pub const KNOWN: [&'static str; 10] = [
        "data_retrieval",
        "data_manipulation",
        "communication",
        "computation",
        "file_operations",
        "api_integration",
        "automation",
        "monitoring",
        "security",
        "other",
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::DataRetrieval => "data_retrieval",
            Self::DataManipulation => "data_manipulation",
            Self::Communication => "communication",
            Self::Computation => "computation",
            Self::FileOperations => "file_operations",
            Self::ApiIntegration => "api_integration",
            Self::Automation => "automation",
            Self::Monitoring => "monitoring",
            Self::Security => "security",
            Self::Other(s) => s,
        }
    }

    /// Whether this is one of the recognized category values.
    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(&self.as_str())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "data_retrieval" => Self::DataRetrieval,
            "data_manipulation" => Self::DataManipulation,
            "communication" => Self::Communication,
            "computation" => Self::Computation,
            "file_operations" => Self::FileOperations,
            "api_integration" => Self::ApiIntegration,
            "automation" => Self::Automation,
            "monitoring" => Self::Monitoring,
            "security" => Self::Security,
            _ => Self::Other(value),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Other("other".to_string())
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a tool inside a registry index.
///
/// Only `active` entries are loaded; any other string is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ToolStatus {
    Active,
    Deprecated,
    Other(String),
}

impl ToolStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Deprecated => "deprecated",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ToolStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => Self::Active,
            "deprecated" => Self::Deprecated,
            _ => Self::Other(value),
        }
    }
}

impl From<ToolStatus> for String {
    fn from(value: ToolStatus) -> Self {
        value.as_str().to_string()
    }
}
