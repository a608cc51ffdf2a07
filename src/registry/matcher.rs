//! Trigger matching for natural-language tool lookup.

use crate::tool::Tool;

/// Decides whether a free-text query should select a tool.
pub trait TriggerMatcher: Send + Sync {
    fn matches(&self, tool: &Tool, query: &str) -> bool;
}

/// Keyword heuristic over `usage_guidance.when_to_use`.
///
/// A tool matches when any whitespace-separated word of any trigger phrase
/// occurs in the lowercased query, or when any trigger example does.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTriggerMatcher;

impl TriggerMatcher for KeywordTriggerMatcher {
    fn matches(&self, tool: &Tool, query: &str) -> bool {
        let query = query.to_lowercase();
        tool.usage_guidance().when_to_use.iter().any(|t| {
            t.trigger
                .to_lowercase()
                .split_whitespace()
                .any(|word| query.contains(word))
                || t
                    .examples
                    .iter()
                    .any(|ex| query.contains(&ex.to_lowercase()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool() -> Tool {
        Tool::from_value(json!({
            "manifest": {"id": "w", "name": "weather", "version": "1.0.0", "category": "api_integration"},
            "capabilities": {"primary_function": "forecast"},
            "execution": {
                "protocol": "function_call",
                "endpoint": {"type": "python_function", "module": "w", "function": "get"}
            },
            "usage_guidance": {
                "when_to_use": [
                    {"trigger": "Forecast lookup", "confidence": 0.9,
                     "examples": ["Will it rain tomorrow"]}
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_trigger_word_substring() {
        let m = KeywordTriggerMatcher;
        assert!(m.matches(&tool(), "Show me the FORECAST for Paris"));
        assert!(m.matches(&tool(), "quick lookups please"));
        assert!(!m.matches(&tool(), "translate this sentence"));
    }

    #[test]
    fn test_example_phrase() {
        assert!(tool().matches_trigger("so, will it rain tomorrow?"));
    }

    #[test]
    fn test_no_triggers_never_matches() {
        let mut doc = tool().to_value().clone();
        doc["usage_guidance"] = json!({});
        let t = Tool::from_value(doc).unwrap();
        assert!(!KeywordTriggerMatcher.matches(&t, "forecast"));
    }
}
