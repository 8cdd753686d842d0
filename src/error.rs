use std::path::PathBuf;

use thiserror::Error;

use crate::ast::Category;

/// Failures raised while evaluating or coercing literals.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("type mismatch: cannot apply '{op}' to {left} and {right}")]
    TypeMismatch {
        op: String,
        left: Category,
        right: Category,
    },
    #[error("operator '{op}' is not supported for {category}")]
    UnsupportedOperator { op: String, category: Category },
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow: '{op}' does not fit in {category}")]
    Overflow { op: String, category: Category },
    #[error("invalid {category} literal '{value}'")]
    InvalidLiteral { value: String, category: Category },
    #[error("cannot convert {from} value '{value}' to {to}")]
    InvalidConversion {
        value: String,
        from: Category,
        to: Category,
    },
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
}

/// Failures while loading sources, ASTs or configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("file {} is too large ({size} bytes, max {max} bytes)", path.display())]
    TooLarge { path: PathBuf, size: u64, max: u64 },
    #[error("invalid test pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
