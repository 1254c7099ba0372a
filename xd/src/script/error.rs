//! Script error types

use thiserror::Error;

/// Errors raised while parsing or executing a payload
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("Parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unknown builtin: {name}")]
    UnknownBuiltin { name: String },

    #[error("{name}() takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("{name}() argument {index} must be {expected}")]
    ArgType {
        name: String,
        index: usize,
        expected: &'static str,
    },

    #[error("Raised: {0}")]
    Raised(String),

    #[error("Builtin panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = ScriptError::Parse {
            line: 2,
            column: 5,
            message: "expected '('".to_string(),
        };
        assert_eq!(err.to_string(), "Parse error at 2:5: expected '('");
    }

    #[test]
    fn test_arity_message() {
        let err = ScriptError::Arity {
            name: "log".to_string(),
            expected: "2".to_string(),
            found: 1,
        };
        assert!(err.to_string().contains("log() takes 2"));
    }
}
