//! Error types for expression evaluation and type checking.

use crate::value::ValueType;
use thiserror::Error;

/// Errors that can occur while evaluating or checking a predicate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
        context: String,
    },

    #[error("Invalid operand types for operator {operator}: left={left_type:?}, right={right_type:?}")]
    InvalidOperandTypes {
        operator: String,
        left_type: Option<ValueType>,
        right_type: Option<ValueType>,
    },

    #[error("Entity has no property {property}")]
    UnknownProperty { property: String },
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
