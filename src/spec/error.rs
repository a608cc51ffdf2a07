//! Tool specification error types

/// Errors raised while loading or parsing a tool document.
///
/// A `SpecError` is always fatal: a malformed document never produces a [`crate::Tool`].
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("Failed to load tool document from {path}: {reason}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    Load {
        path: String,
        reason: String,
        hint: Option<String>,
    },

    #[error("Tool document is missing required section '{section}'")]
    MissingSection { section: String },

    #[error("Invalid field '{field}': {reason}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    InvalidField {
        field: String,
        reason: String,
        hint: Option<String>,
    },

    #[error("Unknown recovery strategy '{value}' in error_handling[{index}]")]
    UnknownStrategy { index: usize, value: String },

    #[error("Tool document does not match schema:\n  - {}", .0.join("\n  - "))]
    SchemaViolation(Vec<String>),

    #[error("Tool document must be a JSON object")]
    NotAnObject,

    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("YAML syntax error: {0}")]
    Yaml(String),
}

impl SpecError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SpecError::InvalidField {
            field: field.into(),
            reason: reason.into(),
            hint: None,
        }
    }

    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        match self {
            SpecError::Load { ref mut hint, .. } => *hint = hint_val,
            SpecError::InvalidField { ref mut hint, .. } => *hint = hint_val,
            _ => (),
        }
        self
    }

    /// Name of the field or section this error points at, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            SpecError::MissingSection { section } => Some(section),
            SpecError::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }
}
