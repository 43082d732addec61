//! Compilation error types.

use crate::expression::ExpressionError;
use crate::value::ValueType;
use thiserror::Error;

/// Errors that abort a compilation call. No partial output accompanies them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Cannot parse '{value}' as {value_type}: {reason}")]
    LiteralParse {
        value: String,
        value_type: ValueType,
        reason: String,
    },

    #[error("Property path '{0}' has more than two segments")]
    PathTooDeep(String),

    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    #[error("Entity {entity} has no property {property}")]
    UnknownProperty { entity: String, property: String },

    #[error("Property {entity}.{property} is not a {expected} navigation")]
    NotANavigation {
        entity: String,
        property: String,
        expected: &'static str,
    },

    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    #[error("Table alias '{alias}' is still ambiguous after renaming")]
    AliasCollision { alias: String },

    #[error(transparent)]
    Expression(#[from] ExpressionError),
}

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompileError::PathTooDeep("a.b.c".to_string());
        assert_eq!(
            err.to_string(),
            "Property path 'a.b.c' has more than two segments"
        );

        let err = CompileError::UnknownProperty {
            entity: "Menu".to_string(),
            property: "Color".to_string(),
        };
        assert_eq!(err.to_string(), "Entity Menu has no property Color");

        let err = CompileError::LiteralParse {
            value: "x".to_string(),
            value_type: ValueType::Int32,
            reason: "invalid digit found in string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot parse 'x' as Int32: invalid digit found in string"
        );
    }
}
