// ABOUTME: Error types for evaluation failures in the cozy interpreter

use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_ZERO_OR_ONE: &str = "0-1";
pub const ARITY_ONE_OR_TWO: &str = "1-2";

// ===== Common error message strings =====
pub const ERR_SANDBOX_NOT_INIT: &str = "Sandbox not initialized";

#[allow(dead_code)]
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Type mismatch error with function name, expected type, actual type
    #[error("{function}: expected {expected}, got {actual}")]
    TypeMismatch {
        function: String,
        expected: String,
        actual: String,
    },

    /// Arity error with function name, expected count/range, and actual count
    #[error("{function}: expected {expected} argument{}, got {actual}", if *.expected == "1" { "" } else { "s" })]
    ArityError {
        function: String,
        expected: String, // "2", "1-3", "at least 1"
        actual: usize,
    },

    /// Runtime error with function context
    #[error("{function}: {message}")]
    RuntimeError { function: String, message: String },

    #[error("identifier not found: {0}")]
    UndefinedIdentifier(String),

    #[error("attempting to modify '{0}' denied; it was defined as a constant")]
    ReadonlyViolation(String),

    #[error("no mutable variables at the top level! {0} must be bound with let")]
    RootAssignToUndefined(String),

    #[error("Value is not callable: {0}")]
    NotCallable(String),

    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(String),

    #[error("unusable as hash key: {0}")]
    UnusableHashKey(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid regex `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("module not found on COZYPATH: {0}")]
    ModuleNotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("sandbox denied: {0}")]
    Sandbox(String),

    #[error("evaluation cancelled: {0}")]
    Cancelled(String),

    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    /// Create a type mismatch error with full context
    pub fn type_error(function: &str, expected: &str, actual: &str) -> Self {
        EvalError::TypeMismatch {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an arity error with expected and actual counts
    pub fn arity_error(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::ArityError {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    /// Create a runtime error with function context
    pub fn runtime_error(function: &str, message: impl Into<String>) -> Self {
        EvalError::RuntimeError {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_message() {
        let e = EvalError::type_error("+", "INTEGER", "STRING");
        assert!(e.to_string().contains("expected INTEGER"));
    }

    #[test]
    fn arity_pluralizes_correctly() {
        let one = EvalError::arity_error("first", ARITY_ONE, 0);
        assert!(one.to_string().contains("1 argument,"));
        let two = EvalError::arity_error("append", ARITY_TWO, 1);
        assert!(two.to_string().contains("2 arguments,"));
    }

    #[test]
    fn undefined_identifier_message() {
        let e = EvalError::UndefinedIdentifier("foo".into());
        assert_eq!(e.to_string(), "identifier not found: foo");
    }

    #[test]
    fn readonly_violation_mentions_constant() {
        let e = EvalError::ReadonlyViolation("x".into());
        assert!(e.to_string().contains("constant"));
        assert!(e.to_string().contains('x'));
    }
}
