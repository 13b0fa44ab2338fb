//! Error types for sqlshift.

use thiserror::Error;

/// Why a call site was left untouched.
///
/// None of these are fatal: the gate turns every one of them into a
/// pass-through and records it as a diagnostic on the scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// The SQL argument is not a literal string or a constant concatenation.
    #[error("SQL argument is not a literal string")]
    ExtractionFailure,

    /// Literal SQL with a leading keyword outside SELECT/INSERT/UPDATE/DELETE.
    #[error("Unknown statement kind: '{0}'")]
    UnknownStatementKind(String),

    /// A clause the builders cannot express.
    #[error("Unsupported clause: {0}")]
    UnsupportedClause(String),

    /// Unbalanced quotes or parentheses in a boolean expression.
    #[error("Malformed boolean expression: {0}")]
    MalformedBooleanExpression(String),

    /// Execute/bind arguments do not line up with the statement's placeholders.
    #[error("Parameter mismatch: {0}")]
    ParameterMismatch(String),

    /// A call shape the dispatcher has no rewrite for.
    #[error("Unsupported call: {0}")]
    UnsupportedCall(String),
}

impl TranslateError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedClause(message.into())
    }

    pub fn mismatch(message: impl Into<String>) -> Self {
        Self::ParameterMismatch(message.into())
    }
}

/// Errors from the ambient surface: configuration, files, JSON input.
#[derive(Debug, Error)]
pub enum ShiftError {
    /// Config file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config or input file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unit input is not valid JSON, or output could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for sqlshift operations.
pub type ShiftResult<T> = Result<T, ShiftError>;
