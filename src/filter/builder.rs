//! Static helpers for building common predicates.

use crate::catalog::EntityType;
use crate::error::CompileResult;
use crate::expression::{Expression, PropertyPath};
use crate::value::Value;

/// Builder for creating predicates by property name
pub struct PredicateBuilder;

impl PredicateBuilder {
    /// Create a property reference from a dotted path
    pub fn property_path(path: &str) -> CompileResult<Expression> {
        Ok(Expression::property(PropertyPath::parse(path)?))
    }

    /// Create a filter for property equals value
    pub fn equals(property: &str, value: impl Into<Value>) -> CompileResult<Expression> {
        Ok(Expression::eq(
            Self::property_path(property)?,
            Expression::literal(value),
        ))
    }

    /// Create a filter matching the entity with the given key
    pub fn id_equals(entity: &EntityType, id: impl Into<Value>) -> Expression {
        Expression::eq(Expression::column(entity.key.as_str()), Expression::literal(id))
    }

    /// `gt` (any case) builds greater-than; every other operator builds equality.
    pub fn simple(property: &str, op: &str, value: impl Into<Value>) -> CompileResult<Expression> {
        let left = Self::property_path(property)?;
        let right = Expression::literal(value);
        Ok(if op.eq_ignore_ascii_case("gt") {
            Expression::gt(left, right)
        } else {
            Expression::eq(left, right)
        })
    }

    /// Conjunction of all predicates, or `None` if there are none
    pub fn all(predicates: impl IntoIterator<Item = Expression>) -> Option<Expression> {
        predicates.into_iter().reduce(Expression::and)
    }

    /// Disjunction of all predicates, or `None` if there are none
    pub fn any_of(predicates: impl IntoIterator<Item = Expression>) -> Option<Expression> {
        predicates.into_iter().reduce(Expression::or)
    }
}
