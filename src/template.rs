//! Starter documents for new tools.

use serde_json::{json, Value};

use crate::spec::Category;

/// Document format version written into new templates.
pub const AITOOL_VERSION: &str = "1.0.0";

/// A complete, loadable tool document for `name` with placeholder content.
///
/// The id is `com.company.<name>` with underscores turned into hyphens.
pub fn scaffold(name: &str, category: &Category) -> Value {
    json!({
        "aitool_version": AITOOL_VERSION,
        "manifest": {
            "id": format!("com.company.{}", name.replace('_', "-")),
            "name": name,
            "version": "0.1.0",
            "display_name": title_case(name),
            "description": "Description of what this tool does",
            "category": category.as_str(),
            "tags": [],
            "provider": {
                "name": "Your Company",
                "contact": "tools@company.com"
            }
        },
        "capabilities": {
            "primary_function": "describe_primary_function",
            "supported_operations": [],
            "idempotent": true,
            "stateful": false,
            "requires_auth": false
        },
        "execution": {
            "protocol": "function_call",
            "endpoint": {
                "type": "python_function",
                "module": "your.module",
                "function": name
            },
            "parameters": {
                "type": "object",
                "required": [],
                "properties": {}
            },
            "returns": {
                "success_schema": {
                    "type": "object",
                    "properties": {}
                },
                "success_criteria": []
            },
            "timeout_seconds": 30
        },
        "usage_guidance": {
            "when_to_use": [
                {
                    "trigger": "Describe when to use this tool",
                    "confidence": "high",
                    "examples": []
                }
            ],
            "when_not_to_use": [],
            "best_practices": [],
            "common_mistakes": []
        },
        "error_handling": [],
        "examples": []
    })
}

/// `search_product_db` -> `Search Product Db`
fn title_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::Tool;

    #[test]
    fn test_scaffold_is_loadable() {
        let doc = scaffold("search_product_db", &Category::DataRetrieval);
        assert_eq!(doc["manifest"]["id"], "com.company.search-product-db");
        assert_eq!(doc["manifest"]["display_name"], "Search Product Db");

        let tool = Tool::from_value(doc).unwrap();
        assert_eq!(tool.manifest().category, Category::DataRetrieval);
        assert_eq!(tool.execution().endpoint.target(), Some(("your.module", "search_product_db")));
        assert_eq!(tool.execution().timeout(), Some(std::time::Duration::from_secs(30)));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("SEND_email"), "Send Email");
        assert_eq!(title_case("x"), "X");
    }
}
