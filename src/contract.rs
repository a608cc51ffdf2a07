//! Contract tests declared in a tool's `testing.contract_tests` section.
//!
//! Each case names an input and a list of assertions over the response:
//!
//! ```json
//! {"name": "basic search", "input": {"query": "laptop"},
//!  "assertions": ["response.products is array", "response.total exists"]}
//! ```
//!
//! Assertions have the form `response.<path> is <type>` or
//! `response.<path> exists`. Other forms are skipped with a warning.

use serde::Deserialize;
use serde_json::Value;

use crate::engine::{ExecuteOptions, ExecutionEngine};
use crate::function::Params;
use crate::spec::SpecError;
use crate::tool::Tool;

#[derive(Debug, Clone, Deserialize)]
pub struct ContractCase {
    #[serde(default = "unnamed")]
    pub name: String,
    #[serde(default = "empty_input")]
    pub input: Value,
    #[serde(default)]
    pub assertions: Vec<String>,
}

fn unnamed() -> String {
    "unnamed".to_string()
}

fn empty_input() -> Value {
    Value::Object(Params::new())
}

/// A parsed assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    IsType { path: Vec<String>, ty: JsonType },
    Exists { path: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Array,
    Object,
    String,
    Number,
    Boolean,
    Null,
}

impl JsonType {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "array" => Self::Array,
            "object" => Self::Object,
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            _ => return None,
        })
    }

    fn check(self, v: &Value) -> bool {
        match self {
            Self::Array => v.is_array(),
            Self::Object => v.is_object(),
            Self::String => v.is_string(),
            Self::Number => v.is_number(),
            Self::Boolean => v.is_boolean(),
            Self::Null => v.is_null(),
        }
    }
}

impl Assertion {
    /// `None` for forms this runner does not understand.
    pub fn parse(text: &str) -> Option<Self> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let path: Vec<String> = words
            .first()?
            .strip_prefix("response.")?
            .split('.')
            .map(str::to_string)
            .collect();
        match words.as_slice() {
            [_, "is", ty] => JsonType::parse(ty).map(|ty| Self::IsType { path, ty }),
            [_, "exists"] => Some(Self::Exists { path }),
            _ => None,
        }
    }

    pub fn holds(&self, response: &Value) -> bool {
        let (path, ty) = match self {
            Self::IsType { path, ty } => (path, Some(*ty)),
            Self::Exists { path } => (path, None),
        };
        let found = path.iter().try_fold(response, |v, key| v.get(key));
        match (found, ty) {
            (Some(v), Some(ty)) => ty.check(v),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutcome {
    pub name: String,
    /// `None` when the case passed.
    pub failure: Option<String>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractReport {
    pub cases: Vec<CaseOutcome>,
}

impl ContractReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs a tool's contract cases through an [`ExecutionEngine`].
pub struct ContractRunner {
    engine: ExecutionEngine,
    dry_run: bool,
}

impl ContractRunner {
    pub fn new(engine: ExecutionEngine) -> Self {
        Self {
            engine,
            dry_run: false,
        }
    }

    /// Only validate inputs; never invoke the tool.
    pub fn dry_run(mut self, on: bool) -> Self {
        self.dry_run = on;
        self
    }

    /// Cases declared by `tool`. A missing section yields none.
    pub fn cases(tool: &Tool) -> crate::Result<Vec<ContractCase>> {
        match tool.spec().extension("testing").and_then(|t| t.get("contract_tests")) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
                SpecError::invalid("testing.contract_tests", e.to_string()).into()
            }),
        }
    }

    pub async fn run(&self, tool: &Tool) -> crate::Result<ContractReport> {
        let cases = Self::cases(tool)?;
        let mut report = ContractReport::default();
        for case in cases {
            tracing::info!(tool = %tool.id(), case = %case.name, "Running contract test");
            let failure = self.run_case(tool, &case).await.err();
            match &failure {
                None => tracing::info!(case = %case.name, "passed"),
                Some(reason) => tracing::error!(case = %case.name, "failed: {}", reason),
            }
            report.cases.push(CaseOutcome {
                name: case.name,
                failure,
            });
        }
        Ok(report)
    }

    async fn run_case(&self, tool: &Tool, case: &ContractCase) -> Result<(), String> {
        let params = match &case.input {
            Value::Object(m) => m.clone(),
            other => return Err(format!("input must be an object, got {}", other)),
        };
        tool.validate_input(&params, self.engine.validator().as_ref())
            .map_err(|e| e.to_string())?;
        if self.dry_run {
            return Ok(());
        }

        let response = self
            .engine
            .execute(tool, &params, ExecuteOptions::default())
            .await
            .map_err(|e| e.to_string())?;

        for text in &case.assertions {
            match Assertion::parse(text) {
                Some(a) if a.holds(&response) => {}
                Some(_) => return Err(format!("Assertion failed: {}", text)),
                None => tracing::warn!(assertion = %text, "Unsupported assertion skipped"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assertions() {
        assert_eq!(
            Assertion::parse("response.products is array"),
            Some(Assertion::IsType {
                path: vec!["products".into()],
                ty: JsonType::Array
            })
        );
        assert_eq!(
            Assertion::parse("response.meta.total exists"),
            Some(Assertion::Exists {
                path: vec!["meta".into(), "total".into()]
            })
        );
        assert!(Assertion::parse("latency < 200ms").is_none());
        assert!(Assertion::parse("response.x is purple").is_none());
    }

    #[test]
    fn test_assertion_holds() {
        let resp = json!({"products": [], "meta": {"total": 0}});
        assert!(Assertion::parse("response.products is array").unwrap().holds(&resp));
        assert!(Assertion::parse("response.meta.total is number").unwrap().holds(&resp));
        assert!(!Assertion::parse("response.meta is array").unwrap().holds(&resp));
        assert!(!Assertion::parse("response.missing exists").unwrap().holds(&resp));
    }
}
