//! Tool document loader for local JSON and YAML files

use serde_json::Value;
use std::path::Path;

use super::document::ToolSpec;
use super::error::SpecError;

/// Document encodings the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `*.yaml` / `*.yml` are YAML, everything else (notably `*.aitool.json`) is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Reads tool documents from disk.
#[derive(Debug, Clone, Default)]
pub struct SpecLoader {
    _private: (),
}

impl SpecLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and parse a tool document.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<ToolSpec, SpecError> {
        let value = self.load_value(path).await?;
        ToolSpec::from_value(value)
    }

    /// Load the raw document without interpreting it.
    pub async fn load_value(&self, path: impl AsRef<Path>) -> Result<Value, SpecError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            let hint = if e.kind() == std::io::ErrorKind::NotFound {
                "Tool file not found; check the path."
            } else {
                "Check if you have read permissions."
            };
            SpecError::Load {
                path: path.to_string_lossy().to_string(),
                reason: e.to_string(),
                hint: Some(hint.to_string()),
            }
        })?;

        // Strip a UTF-8 BOM left behind by some editors.
        let bytes = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            bytes[3..].to_vec()
        } else {
            bytes
        };
        let content = String::from_utf8(bytes).map_err(|e| SpecError::Load {
            path: path.to_string_lossy().to_string(),
            reason: format!("Invalid UTF-8: {}", e),
            hint: None,
        })?;

        Self::parse_str(&content, DocumentFormat::from_path(path))
    }

    /// Parse document text in the given format.
    pub fn parse_str(content: &str, format: DocumentFormat) -> Result<Value, SpecError> {
        match format {
            DocumentFormat::Json => {
                serde_json::from_str(content).map_err(|e| SpecError::Json(e.to_string()))
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| SpecError::Yaml(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/search.aitool.json")),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("search.aitool.yml")),
            DocumentFormat::Yaml
        );
    }

    #[test]
    fn test_yaml_parses_to_same_value_as_json() {
        let yaml = "manifest:\n  id: x\n  tags: [a, b]\n";
        let json = r#"{"manifest": {"id": "x", "tags": ["a", "b"]}}"#;
        assert_eq!(
            SpecLoader::parse_str(yaml, DocumentFormat::Yaml).unwrap(),
            SpecLoader::parse_str(json, DocumentFormat::Json).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_file_has_hint() {
        let err = SpecLoader::new()
            .load_file("/definitely/not/here.aitool.json")
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("not/here.aitool.json"));
        assert!(text.contains("Hint"));
    }
}
