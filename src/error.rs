use crate::ast::OperatorKind;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Unsupported field kind: {field} is a {kind}")]
    UnsupportedKind { field: String, kind: &'static str },

    #[error("Malformed literal for {field}: {literal:?} is not a valid {expected}")]
    MalformedLiteral {
        field: String,
        literal: String,
        expected: &'static str,
    },

    #[error("Unsupported operator: {operator} is not defined for {kind} field {field}")]
    UnsupportedOperator {
        field: String,
        operator: OperatorKind,
        kind: &'static str,
    },

    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, EvalError>;
