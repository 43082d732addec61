//! Predicate evaluation against in-memory entities.

use crate::entity::Entity;
use crate::expression::{
    BinaryOperator, Expression, ExpressionError, ExpressionResult, PropertyPath, UnaryOperator,
};
use crate::value::Value;
use std::cmp::Ordering;

/// Evaluator for predicates over one entity
pub struct ExpressionEvaluator<'a> {
    entity: &'a dyn Entity,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(entity: &'a dyn Entity) -> Self {
        Self { entity }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),

            Expression::Property(path) => self.evaluate_property(path),

            Expression::BinaryOp { op, left, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                self.evaluate_binary_op(*op, left_val, right_val)
            }

            Expression::UnaryOp { op, operand } => {
                let operand_val = self.evaluate(operand)?;
                self.evaluate_unary_op(*op, operand_val)
            }

            Expression::In {
                expr,
                list,
                negated,
            } => {
                let value = self.evaluate(expr)?;
                if value.is_null() {
                    return Ok(Value::Null);
                }
                let found = list
                    .iter()
                    .any(|item| value.partial_compare(item) == Some(Ordering::Equal));
                Ok(Value::Boolean(found != *negated))
            }

            Expression::Any {
                navigation,
                predicate,
            } => {
                for element in self.entity.collection(navigation) {
                    let result = ExpressionEvaluator::new(element).evaluate(predicate)?;
                    if result == Value::Boolean(true) {
                        return Ok(Value::Boolean(true));
                    }
                }
                Ok(Value::Boolean(false))
            }
        }
    }

    fn evaluate_property(&self, path: &PropertyPath) -> ExpressionResult<Value> {
        let unknown = || ExpressionError::UnknownProperty {
            property: path.to_string(),
        };

        match path.member() {
            None => self.entity.value(path.first()).ok_or_else(unknown),
            Some(member) => match self.entity.reference(path.first()) {
                // A missing related entity reads as NULL, like an outer join.
                None => Ok(Value::Null),
                Some(related) => related.value(member).ok_or_else(unknown),
            },
        }
    }

    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: Value,
        right: Value,
    ) -> ExpressionResult<Value> {
        // Handle NULL propagation for most operators
        if left.is_null() || right.is_null() {
            return Ok(match op {
                // NULL AND false = false, NULL AND true = NULL
                BinaryOperator::And => match (&left, &right) {
                    (Value::Boolean(false), _) | (_, Value::Boolean(false)) => {
                        Value::Boolean(false)
                    }
                    _ => Value::Null,
                },
                // NULL OR true = true, NULL OR false = NULL
                BinaryOperator::Or => match (&left, &right) {
                    (Value::Boolean(true), _) | (_, Value::Boolean(true)) => Value::Boolean(true),
                    _ => Value::Null,
                },
                _ => Value::Null,
            });
        }

        let invalid = |left: &Value, right: &Value| ExpressionError::InvalidOperandTypes {
            operator: op.as_str().to_string(),
            left_type: left.value_type(),
            right_type: right.value_type(),
        };

        match op {
            BinaryOperator::Eq => self.compare_values(op, &left, &right, |c| c == Ordering::Equal),
            BinaryOperator::Ne => self.compare_values(op, &left, &right, |c| c != Ordering::Equal),
            BinaryOperator::Lt => self.compare_values(op, &left, &right, |c| c == Ordering::Less),
            BinaryOperator::Le => {
                self.compare_values(op, &left, &right, |c| c != Ordering::Greater)
            }
            BinaryOperator::Gt => {
                self.compare_values(op, &left, &right, |c| c == Ordering::Greater)
            }
            BinaryOperator::Ge => self.compare_values(op, &left, &right, |c| c != Ordering::Less),

            BinaryOperator::And => match (&left, &right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a && *b)),
                _ => Err(invalid(&left, &right)),
            },

            BinaryOperator::Or => match (&left, &right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a || *b)),
                _ => Err(invalid(&left, &right)),
            },

            BinaryOperator::BitAnd => match (&left, &right) {
                (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(a & b)),
                _ => match (left.as_i64(), right.as_i64()) {
                    (Some(a), Some(b)) => Ok(Value::Int64(a & b)),
                    _ => Err(invalid(&left, &right)),
                },
            },
        }
    }

    fn evaluate_unary_op(&self, op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
        match op {
            UnaryOperator::Not => match operand {
                Value::Null => Ok(Value::Null),
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: operand.value_type(),
                    right_type: None,
                }),
            },

            UnaryOperator::IsNull => Ok(Value::Boolean(operand.is_null())),

            UnaryOperator::IsNotNull => Ok(Value::Boolean(!operand.is_null())),
        }
    }

    /// Compare two values and apply a comparison function
    fn compare_values<F>(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
        cmp_fn: F,
    ) -> ExpressionResult<Value>
    where
        F: FnOnce(Ordering) -> bool,
    {
        match left.partial_compare(right) {
            Some(ordering) => Ok(Value::Boolean(cmp_fn(ordering))),
            None => Err(ExpressionError::InvalidOperandTypes {
                operator: op.as_str().to_string(),
                left_type: left.value_type(),
                right_type: right.value_type(),
            }),
        }
    }
}

/// Helper function to evaluate an expression against an entity
pub fn evaluate_expression(expr: &Expression, entity: &dyn Entity) -> ExpressionResult<Value> {
    ExpressionEvaluator::new(entity).evaluate(expr)
}

/// Type alias for predicate functions
pub type Predicate = Box<dyn Fn(&dyn Entity) -> bool + Send + Sync + 'static>;

/// Helper function to create a predicate function from an expression
pub fn expression_to_predicate(expr: Expression) -> Predicate {
    Box::new(move |entity| expr.matches(entity))
}

impl Expression {
    /// Whether the entity satisfies this predicate. NULL and errors count as false.
    pub fn matches(&self, entity: &dyn Entity) -> bool {
        matches!(evaluate_expression(self, entity), Ok(Value::Boolean(true)))
    }
}
