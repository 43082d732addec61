//! Operator definitions for predicate expressions.

use crate::value::ValueType;

/// Binary operators supported in predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // Bitwise
    BitAnd,
}

impl BinaryOperator {
    /// Get the output type of this operator given input types
    pub fn output_type(&self, left: ValueType, right: ValueType) -> Option<ValueType> {
        match self {
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => {
                if types_compatible_for_comparison(left, right) {
                    Some(ValueType::Boolean)
                } else {
                    None
                }
            }

            BinaryOperator::And | BinaryOperator::Or => match (left, right) {
                (ValueType::Boolean, ValueType::Boolean) => Some(ValueType::Boolean),
                _ => None,
            },

            BinaryOperator::BitAnd => match (left, right) {
                (ValueType::Int32, ValueType::Int32) => Some(ValueType::Int32),
                (ValueType::Int32 | ValueType::Int64, ValueType::Int32 | ValueType::Int64) => {
                    Some(ValueType::Int64)
                }
                _ => None,
            },
        }
    }

    pub fn is_comparison(&self) -> bool {
        !matches!(
            self,
            BinaryOperator::And | BinaryOperator::Or | BinaryOperator::BitAnd
        )
    }

    /// Binding strength when rendered infix; higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::BitAnd => 4,
            _ => 3,
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::BitAnd => "&",
        }
    }
}

/// Numeric types compare with each other; everything else only with itself.
fn types_compatible_for_comparison(left: ValueType, right: ValueType) -> bool {
    let numeric = |t| matches!(t, ValueType::Int32 | ValueType::Int64 | ValueType::Double);
    left == right || (numeric(left) && numeric(right))
}

/// Unary operators supported in predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    IsNull,
    IsNotNull,
}

impl UnaryOperator {
    /// Get the output type of this operator given input type
    pub fn output_type(&self, operand: ValueType) -> Option<ValueType> {
        match self {
            UnaryOperator::Not => match operand {
                ValueType::Boolean => Some(ValueType::Boolean),
                _ => None,
            },

            UnaryOperator::IsNull | UnaryOperator::IsNotNull => Some(ValueType::Boolean),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::IsNull => "IS NULL",
            UnaryOperator::IsNotNull => "IS NOT NULL",
        }
    }
}
