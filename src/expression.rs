//! Predicate trees over entity types.
//!
//! This module provides:
//! - The predicate tree (leaf comparisons, AND/OR, collection ANY)
//! - Type checking against entity metadata
//! - Evaluation against in-memory entities

pub mod error;
pub mod eval;
pub mod expr;
pub mod operator;
pub mod type_checker;

pub use error::{ExpressionError, ExpressionResult};
pub use eval::{evaluate_expression, expression_to_predicate, ExpressionEvaluator, Predicate};
pub use expr::{Expression, PropertyPath};
pub use operator::{BinaryOperator, UnaryOperator};
pub use type_checker::{validate_filter_predicate, TypeChecker};
