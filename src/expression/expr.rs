//! Predicate tree definitions.

use crate::error::{CompileError, CompileResult};
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::value::Value;
use std::fmt;

/// Dotted property path with at most one navigation hop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Parse a dotted path. More than two segments is rejected.
    pub fn parse(path: &str) -> CompileResult<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.len() > 2 {
            return Err(CompileError::PathTooDeep(path.to_string()));
        }
        Ok(Self { segments })
    }

    /// Single-segment path
    pub fn property(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// Path through a navigation to a member of the related entity
    pub fn nested(navigation: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            segments: vec![navigation.into(), member.into()],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// The member behind the navigation, if this path has one
    pub fn member(&self) -> Option<&str> {
        self.segments.get(1).map(String::as_str)
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() == 2
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Predicate tree node over an entity type
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant value
    Literal(Value),

    /// Property of the entity the predicate is evaluated against
    Property(PropertyPath),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Membership in a literal list
    In {
        expr: Box<Expression>,
        list: Vec<Value>,
        negated: bool,
    },

    /// True iff at least one element of the collection satisfies `predicate`,
    /// which is evaluated against the element type.
    Any {
        navigation: String,
        predicate: Box<Expression>,
    },
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn null() -> Self {
        Expression::Literal(Value::Null)
    }

    /// Create a property reference
    pub fn property(path: PropertyPath) -> Self {
        Expression::Property(path)
    }

    /// Create a reference to a single-segment property
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Property(PropertyPath::property(name))
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ne, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    pub fn le(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Le, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ge, left, right)
    }

    pub fn bit_and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::BitAnd, left, right)
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNull, operand)
    }

    pub fn is_not_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNotNull, operand)
    }

    pub fn in_list(expr: Expression, list: Vec<Value>) -> Self {
        Expression::In {
            expr: Box::new(expr),
            list,
            negated: false,
        }
    }

    /// Collection-any quantifier
    pub fn any(navigation: impl Into<String>, predicate: Expression) -> Self {
        Expression::Any {
            navigation: navigation.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Check if this expression is a constant (contains no property references)
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Property(_) | Expression::Any { .. } => false,
            Expression::BinaryOp { left, right, .. } => left.is_constant() && right.is_constant(),
            Expression::UnaryOp { operand, .. } => operand.is_constant(),
            Expression::In { expr, .. } => expr.is_constant(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Expression::Literal(Value::DateTime(dt)) => {
                write!(f, "'{}'", Value::DateTime(*dt))
            }
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Property(path) => write!(f, "{}", path),
            Expression::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            Expression::UnaryOp {
                op: UnaryOperator::Not,
                operand,
            } => write!(f, "NOT {}", operand),
            Expression::UnaryOp { op, operand } => write!(f, "({} {})", operand, op.as_str()),
            Expression::In {
                expr,
                list,
                negated,
            } => {
                let items: Vec<String> = list.iter().map(|v| v.to_sql_literal()).collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                write!(f, "({} {} ({}))", expr, keyword, items.join(", "))
            }
            Expression::Any {
                navigation,
                predicate,
            } => write!(f, "{}.Any({})", navigation, predicate),
        }
    }
}
