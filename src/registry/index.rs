//! `registry.json`: the on-disk catalogue of a tool directory.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::discovery;
use super::RegistryError;
use crate::spec::{Category, ToolStatus};
use crate::tool::Tool;

pub const INDEX_FILE_NAME: &str = "registry.json";
pub const INDEX_VERSION: &str = "1.0.0";

/// Parsed `registry.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryIndex {
    pub registry_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Malformed entries are logged and dropped rather than failing the index.
    #[serde(default, deserialize_with = "lenient_entries")]
    pub tools: Vec<IndexEntry>,
    /// Category name to a count or a list of ids; informational only.
    #[serde(default)]
    pub categories: BTreeMap<String, Value>,
}

/// One `tools[]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub category: Category,
    /// Relative to the directory holding `registry.json`.
    pub aitool_file: String,
    pub status: ToolStatus,
}

impl IndexEntry {
    pub fn from_tool(tool: &Tool, aitool_file: impl Into<String>) -> Self {
        let m = tool.manifest();
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            version: m.version.clone(),
            display_name: m.display_name.clone(),
            category: m.category.clone(),
            aitool_file: aitool_file.into(),
            status: ToolStatus::Active,
        }
    }
}

impl Default for RegistryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryIndex {
    /// An empty index stamped with the current time.
    pub fn new() -> Self {
        Self {
            registry_version: INDEX_VERSION.to_string(),
            last_updated: Some(now_rfc3339()),
            description: Some("Tool registry".to_string()),
            tools: Vec::new(),
            categories: BTreeMap::new(),
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RegistryError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| RegistryError::InvalidIndex {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let path = path.as_ref();
        let body = serde_json::to_string_pretty(self).map_err(|e| RegistryError::InvalidIndex {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(path, body)
            .await
            .map_err(|e| RegistryError::io(path, e))
    }

    /// Entries whose status is `active`.
    pub fn active(&self) -> impl Iterator<Item = &IndexEntry> {
        self.tools.iter().filter(|e| e.status.is_active())
    }

    /// Replace `tools` with every `*.aitool.json` directly inside `dir`.
    ///
    /// Files that fail to load are skipped with a warning. Returns the number of
    /// entries recorded.
    pub async fn rebuild_from_directory(
        &mut self,
        dir: impl AsRef<Path>,
    ) -> Result<usize, RegistryError> {
        let dir = dir.as_ref();
        let files = discovery::tool_files(dir, false)?;
        tracing::info!(dir = %dir.display(), count = files.len(), "Found tool files");

        let mut tools = Vec::with_capacity(files.len());
        for file in files {
            match Tool::from_file(&file).await {
                Ok(tool) => {
                    let rel = file
                        .file_name()
                        .map(|n| format!("./{}", n.to_string_lossy()))
                        .unwrap_or_else(|| file.display().to_string());
                    tools.push(IndexEntry::from_tool(&tool, rel));
                }
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "Skipped tool file")
                }
            }
        }

        let mut categories: BTreeMap<String, Value> = BTreeMap::new();
        for entry in &tools {
            let count = categories
                .entry(entry.category.to_string())
                .or_insert(Value::from(0u64));
            *count = Value::from(count.as_u64().unwrap_or(0) + 1);
        }

        self.tools = tools;
        self.categories = categories;
        self.last_updated = Some(now_rfc3339());
        Ok(self.tools.len())
    }
}

fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<IndexEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value(entry) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(index = i, error = %e, "Skipped malformed registry entry");
                None
            }
        })
        .collect())
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
