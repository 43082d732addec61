//! Authorization predicates over an entity's permission assignments.
//!
//! A permission assignment element carries a `RoleId`, an `Operation` and an
//! `IsRefused` value. Both entry points quantify over the assignment
//! collection with `Any`. They treat `for_deny` differently:
//! [`compile_authorization`] tests `IsRefused` instead of `Operation` and
//! never negates, while [`compile_authorization_with`] negates the quantifier.

use crate::catalog::MetadataAdapter;
use crate::error::CompileResult;
use crate::expression::{validate_filter_predicate, Expression};
use crate::value::Value;
use log::debug;

/// Collection navigation holding permission assignments
pub const DEFAULT_NAVIGATION: &str = "PermissionAssign";

pub const ROLE_ID_PROPERTY: &str = "RoleId";
pub const OPERATION_PROPERTY: &str = "Operation";
pub const IS_REFUSED_PROPERTY: &str = "IsRefused";

/// Predicate over one permission assignment element.
///
/// `RoleId IN roles AND field = operation`, or with `bitmask`
/// `RoleId IN roles AND (field & operation) = operation`. The field is
/// `IsRefused` when `for_deny` is set and `Operation` otherwise.
pub fn permission_predicate(
    roles: &[i32],
    operation: i32,
    for_deny: bool,
    bitmask: bool,
) -> Expression {
    let field = if for_deny {
        IS_REFUSED_PROPERTY
    } else {
        OPERATION_PROPERTY
    };
    let role_test = Expression::in_list(
        Expression::column(ROLE_ID_PROPERTY),
        roles.iter().copied().map(Value::Int32).collect(),
    );
    let operation_test = if bitmask {
        Expression::eq(
            Expression::bit_and(Expression::column(field), Expression::literal(operation)),
            Expression::literal(operation),
        )
    } else {
        Expression::eq(Expression::column(field), Expression::literal(operation))
    };
    Expression::and(role_test, operation_test)
}

/// Quantify `condition` over the assignment collection of `entity`,
/// negating the quantifier when `for_deny` is set.
///
/// The navigation must be a collection of `entity` and `condition` must
/// type check against its element type.
pub fn compile_authorization_with(
    metadata: &dyn MetadataAdapter,
    entity: &str,
    condition: Expression,
    for_deny: bool,
    navigation: &str,
) -> CompileResult<Expression> {
    let entity_type = metadata.entity(entity)?;
    let any = Expression::any(navigation, condition);
    validate_filter_predicate(&any, metadata, &entity_type)?;

    debug!(
        "Compiled authorization over {}.{} (deny: {})",
        entity, navigation, for_deny
    );
    Ok(if for_deny {
        Expression::not_expr(any)
    } else {
        any
    })
}

/// Test whether any assignment of `entity` grants (or, with `for_deny`,
/// refuses) `operation` to one of `roles`. The result is never negated.
pub fn compile_authorization(
    metadata: &dyn MetadataAdapter,
    entity: &str,
    roles: &[i32],
    operation: i32,
    for_deny: bool,
    bitmask: bool,
    navigation: &str,
) -> CompileResult<Expression> {
    let condition = permission_predicate(roles, operation, for_deny, bitmask);
    compile_authorization_with(metadata, entity, condition, false, navigation)
}
