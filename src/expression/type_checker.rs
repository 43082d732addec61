//! Type checking for predicates against entity metadata.

use crate::catalog::{EntityType, MetadataAdapter, PropertyKind};
use crate::error::{CompileError, CompileResult};
use crate::expression::{Expression, ExpressionError, PropertyPath};
use crate::value::ValueType;

/// Type checker for predicates over one entity type
pub struct TypeChecker<'a> {
    metadata: &'a dyn MetadataAdapter,
    entity: &'a EntityType,
}

impl<'a> TypeChecker<'a> {
    pub fn new(metadata: &'a dyn MetadataAdapter, entity: &'a EntityType) -> Self {
        Self { metadata, entity }
    }

    /// Type check an expression and return its output type (`None` for NULL)
    pub fn check(&self, expr: &Expression) -> CompileResult<Option<ValueType>> {
        match expr {
            Expression::Literal(value) => Ok(value.value_type()),

            Expression::Property(path) => self.resolve_path(path).map(Some),

            Expression::BinaryOp { op, left, right } => {
                let left_type = self.check(left)?;
                let right_type = self.check(right)?;

                match (left_type, right_type) {
                    (Some(lt), Some(rt)) => match op.output_type(lt, rt) {
                        Some(output_type) => Ok(Some(output_type)),
                        None => Err(ExpressionError::InvalidOperandTypes {
                            operator: op.as_str().to_string(),
                            left_type: Some(lt),
                            right_type: Some(rt),
                        }
                        .into()),
                    },
                    // NULL literals are allowed and will be handled at runtime
                    _ if op.is_comparison() => Ok(Some(ValueType::Boolean)),
                    _ => Ok(None),
                }
            }

            Expression::UnaryOp { op, operand } => match self.check(operand)? {
                Some(ot) => match op.output_type(ot) {
                    Some(output_type) => Ok(Some(output_type)),
                    None => Err(ExpressionError::InvalidOperandTypes {
                        operator: op.as_str().to_string(),
                        left_type: Some(ot),
                        right_type: None,
                    }
                    .into()),
                },
                None => Ok(Some(ValueType::Boolean)),
            },

            Expression::In { expr, .. } => {
                self.check(expr)?;
                Ok(Some(ValueType::Boolean))
            }

            Expression::Any {
                navigation,
                predicate,
            } => {
                let (target, _) = self.entity.collection_target(navigation)?;
                let element = self.metadata.entity(target)?;
                TypeChecker::new(self.metadata, &element).check_filter_predicate(predicate)?;
                Ok(Some(ValueType::Boolean))
            }
        }
    }

    /// Check if an expression is valid for use as a filter predicate
    pub fn check_filter_predicate(&self, expr: &Expression) -> CompileResult<()> {
        match self.check(expr)? {
            Some(ValueType::Boolean) | None => Ok(()),
            Some(other_type) => Err(ExpressionError::TypeMismatch {
                expected: ValueType::Boolean,
                actual: other_type,
                context: "filter predicate".to_string(),
            }
            .into()),
        }
    }

    /// Resolve a property path to the scalar type it reads.
    pub fn resolve_path(&self, path: &PropertyPath) -> CompileResult<ValueType> {
        let property = self.entity.property(path.first())?;
        match (&property.kind, path.member()) {
            (PropertyKind::Scalar { value_type }, None) => Ok(*value_type),
            (PropertyKind::Reference { target, .. }, Some(member)) => {
                let related = self.metadata.entity(target)?;
                let member = related.property(member)?;
                member.value_type().ok_or_else(|| {
                    CompileError::UnsupportedPredicate(format!(
                        "{} does not end in a scalar property",
                        path
                    ))
                })
            }
            (PropertyKind::Collection { .. }, _) => Err(CompileError::UnsupportedPredicate(
                format!("collection {} must be quantified with Any", path.first()),
            )),
            _ => Err(CompileError::UnsupportedPredicate(format!(
                "{} does not end in a scalar property",
                path
            ))),
        }
    }
}

/// Helper function to validate a filter predicate against an entity type
pub fn validate_filter_predicate(
    expr: &Expression,
    metadata: &dyn MetadataAdapter,
    entity: &EntityType,
) -> CompileResult<()> {
    TypeChecker::new(metadata, entity).check_filter_predicate(expr)
}
