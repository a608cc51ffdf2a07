//! Error classification logic

use crate::function::InvocationError;
use crate::spec::ErrorRecovery;
use crate::tool::Tool;
use crate::Error;

/// Only failures raised by the tool itself are candidates for recovery rules.
///
/// Validation, spec and resolution failures are fatal to the call.
pub fn is_recoverable(error: &Error) -> bool {
    matches!(error, Error::Invocation(_))
}

/// First rule of `tool` that matches the failure, in declaration order.
///
/// A rule matches when its `error_code` equals the failure kind, or its
/// `error_type` occurs in the failure message.
pub(crate) fn select_rule<'a>(
    tool: &'a Tool,
    error: &InvocationError,
) -> Option<(usize, &'a ErrorRecovery)> {
    tool.find_recovery(&error.kind, &error.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::ResolutionError;
    use crate::spec::RecoveryStrategy;
    use serde_json::json;

    fn tool() -> Tool {
        Tool::from_value(json!({
            "manifest": {"id": "t", "name": "t", "version": "1.0.0", "category": "other"},
            "capabilities": {"primary_function": "t"},
            "execution": {
                "protocol": "function_call",
                "endpoint": {"type": "python_function", "module": "m", "function": "f"}
            },
            "usage_guidance": {},
            "error_handling": [
                {"error_type": "quota", "recovery": {"strategy": "fail"}},
                {"error_type": "rate limit", "error_code": "RateLimitError",
                 "recovery": {"strategy": "retry_with_backoff"}},
                {"error_type": "rate limit", "recovery": {"strategy": "prompt_user"}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let tool = tool();
        let err = InvocationError::generic("rate limit exceeded");
        let (idx, rule) = select_rule(&tool, &err).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(rule.strategy, RecoveryStrategy::RetryWithBackoff);
    }

    #[test]
    fn test_kind_match_without_message_match() {
        let tool = tool();
        let err = InvocationError::rate_limited("slow down");
        assert_eq!(select_rule(&tool, &err).map(|(i, _)| i), Some(1));
    }

    #[test]
    fn test_no_match() {
        let tool = tool();
        assert!(select_rule(&tool, &InvocationError::generic("disk full")).is_none());
    }

    #[test]
    fn test_only_invocation_errors_are_recoverable() {
        assert!(is_recoverable(&Error::Invocation(InvocationError::generic("x"))));
        assert!(!is_recoverable(&Error::Resolution(
            ResolutionError::UnsupportedProtocol("grpc".into())
        )));
    }
}
