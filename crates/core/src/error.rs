use thiserror::Error;

/// Errors that abort an evaluation call.
///
/// Only conditions that make a definite answer impossible end up here.
/// Value-level uncertainty (missing fields, unparsable values) is absorbed
/// into tri-state predicate logic and never surfaces as an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Malformed model graph: missing mandatory score, dangling default
    /// child, nesting beyond the depth guard.
    #[error("Structural error: {0}")]
    Structural(String),

    /// No model registered under the requested name.
    #[error("Model not found: {0}")]
    NotFound(String),

    /// No definite outcome: nothing fired and no default was declared,
    /// or a combination could not be computed.
    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

/// Result alias for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// A raw value could not be converted to the field's declared type.
///
/// Recovered as `Unknown` inside predicate evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("value '{value}' of field '{field}' is not a number")]
    NotNumeric { field: String, value: String },

    #[error("value '{value}' of field '{field}' is not a finite number")]
    NonFinite { field: String, value: String },

    #[error("value '{value}' is not a valid value of field '{field}'")]
    InvalidValue { field: String, value: String },
}

/// A JSON value could not be turned into a [`Record`](crate::Record).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("record must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("field '{field}' must be a scalar, got {value}")]
    NonScalar { field: String, value: String },
}
