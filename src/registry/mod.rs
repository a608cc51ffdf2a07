//! 工具注册表：按 id、名称、类别、标签和触发短语查找工具。
//!
//! Tool registry.
//!
//! A [`ToolRegistry`] is built once (from a directory, a `registry.json` index,
//! or by hand) and then read. Mutation needs `&mut self`; callers sharing one
//! across tasks wrap it themselves.

pub mod discovery;
pub mod index;
pub mod matcher;

pub use index::{IndexEntry, RegistryIndex, INDEX_FILE_NAME};
pub use matcher::{KeywordTriggerMatcher, TriggerMatcher};

use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::tool::Tool;

/// Registry loading failures.
///
/// Individual tool files that fail to load are logged and skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Invalid discovery pattern: {0}")]
    Pattern(String),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid registry index {path}: {reason}")]
    InvalidIndex { path: String, reason: String },
}

impl RegistryError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Row returned by [`ToolRegistry::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    pub display_name: Option<String>,
    pub category: String,
    pub description: String,
}

/// Filters for [`ToolRegistry::find`]. Unset filters match everything.
#[derive(Debug, Clone, Default)]
pub struct ToolQuery {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub text: Option<String>,
}

impl ToolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Natural-language query matched against usage triggers.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Tools keyed by id, in registration order.
pub struct ToolRegistry {
    tools: IndexMap<String, Tool>,
    categories: IndexMap<String, Vec<String>>,
    matcher: Arc<dyn TriggerMatcher>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .field("categories", &self.categories)
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
            categories: IndexMap::new(),
            matcher: Arc::new(KeywordTriggerMatcher),
        }
    }

    /// Replace the trigger heuristic used by `find`.
    pub fn with_matcher(mut self, matcher: Arc<dyn TriggerMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Load from `dir/registry.json` when present, otherwise discover
    /// `**/*.aitool.json` recursively.
    pub async fn from_directory(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        let index_path = dir.join(INDEX_FILE_NAME);
        if index_path.is_file() {
            return Self::load_index(&index_path).await;
        }

        let mut registry = Self::new();
        for file in discovery::tool_files(dir, true)? {
            match Tool::from_file(&file).await {
                Ok(tool) => {
                    tracing::info!(tool = %tool.name(), file = %file.display(), "Loaded tool");
                    registry.register(tool);
                }
                Err(e) => {
                    tracing::error!(file = %file.display(), error = %e, "Failed to load tool")
                }
            }
        }
        Ok(registry)
    }

    /// Load the active entries of a `registry.json` index.
    ///
    /// Entry paths resolve against the index's directory. Category buckets are
    /// rebuilt from what actually loaded.
    pub async fn load_index(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let index = RegistryIndex::load(path).await?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut registry = Self::new();
        for entry in index.active() {
            match Tool::from_file(base.join(&entry.aitool_file)).await {
                Ok(tool) => {
                    registry.register(tool);
                }
                Err(e) => tracing::error!(tool = %entry.name, error = %e, "Failed to load tool"),
            }
        }
        Ok(registry)
    }

    /// Insert or replace by id. Returns the replaced tool, if any.
    pub fn register(&mut self, tool: Tool) -> Option<Tool> {
        let id = tool.id().to_string();
        let category = tool.manifest().category.to_string();

        let previous = self.tools.insert(id.clone(), tool);
        if let Some(old) = &previous {
            let old_category = old.manifest().category.to_string();
            if old_category != category {
                self.forget_in_category(&old_category, &id);
            }
        }

        let bucket = self.categories.entry(category).or_default();
        if !bucket.contains(&id) {
            bucket.push(id);
        }
        previous
    }

    fn forget_in_category(&mut self, category: &str, id: &str) {
        if let Some(bucket) = self.categories.get_mut(category) {
            bucket.retain(|x| x != id);
            if bucket.is_empty() {
                self.categories.shift_remove(category);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Tool> {
        self.tools.get(id)
    }

    /// First tool whose `manifest.name` equals `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&Tool> {
        self.tools.values().find(|t| t.name() == name)
    }

    /// Tools satisfying every filter of `query`, in registration order.
    pub fn find(&self, query: &ToolQuery) -> Vec<&Tool> {
        self.tools
            .values()
            .filter(|t| {
                query
                    .category
                    .as_deref()
                    .map_or(true, |c| t.manifest().category.as_str() == c)
            })
            .filter(|t| query.tags.iter().all(|tag| t.manifest().has_tag(tag)))
            .filter(|t| {
                query
                    .text
                    .as_deref()
                    .map_or(true, |q| self.matcher.matches(t, q))
            })
            .collect()
    }

    pub fn list(&self) -> Vec<ToolSummary> {
        self.tools
            .values()
            .map(|t| {
                let m = t.manifest();
                ToolSummary {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    version: m.version.clone(),
                    display_name: m.display_name.clone(),
                    category: m.category.to_string(),
                    description: m.description.clone(),
                }
            })
            .collect()
    }

    /// Category name to number of registered tools.
    pub fn categories(&self) -> IndexMap<String, usize> {
        self.categories
            .iter()
            .map(|(c, ids)| (c.clone(), ids.len()))
            .collect()
    }

    /// Ids recorded under `category`.
    pub fn ids_in_category(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(id: &str, category: &str) -> Tool {
        Tool::from_value(json!({
            "manifest": {"id": id, "name": id, "version": "1.0.0", "category": category},
            "capabilities": {"primary_function": "x"},
            "execution": {
                "protocol": "function_call",
                "endpoint": {"type": "python_function", "module": "m", "function": "f"}
            },
            "usage_guidance": {}
        }))
        .unwrap()
    }

    #[test]
    fn test_reregister_same_category_does_not_duplicate() {
        let mut reg = ToolRegistry::new();
        assert!(reg.register(tool("a", "automation")).is_none());
        assert!(reg.register(tool("a", "automation")).is_some());
        assert_eq!(reg.ids_in_category("automation"), ["a".to_string()]);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_reregister_moves_category() {
        let mut reg = ToolRegistry::new();
        reg.register(tool("a", "automation"));
        reg.register(tool("a", "security"));
        assert!(reg.ids_in_category("automation").is_empty());
        assert_eq!(reg.categories().get("security"), Some(&1));
        assert!(!reg.categories().contains_key("automation"));
    }

    #[test]
    fn test_get_by_name() {
        let mut reg = ToolRegistry::new();
        reg.register(tool("com.x.one", "other"));
        assert_eq!(reg.get_by_name("com.x.one").map(Tool::id), Some("com.x.one"));
        assert!(reg.get_by_name("two").is_none());
    }
}
