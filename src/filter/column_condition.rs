//! Compiling the conditions on one view column into a single predicate.

use crate::catalog::{EntityType, FilterMode, MetadataAdapter, PropertyKind, SearchMode};
use crate::error::CompileResult;
use crate::expression::{Expression, PropertyPath, TypeChecker};
use crate::filter::condition::Condition;
use crate::filter::date_range::date_range;
use crate::value::ValueType;
use log::debug;

/// Compile all conditions on one column into one predicate over `entity`.
///
/// Conditions are folded left to right under `filter_mode`. Returns `None`
/// when no condition produced a predicate (unknown operators and the
/// `Contains` modes contribute nothing). A literal that fails to parse aborts
/// the whole call.
///
/// If the first path segment is a collection navigation, the remainder is
/// compiled against the element type and wrapped in `Any`.
pub fn compile_column_condition(
    entity: &EntityType,
    metadata: &dyn MetadataAdapter,
    property_path: &str,
    value_type: ValueType,
    search_mode: SearchMode,
    filter_mode: FilterMode,
    conditions: &[Condition],
) -> CompileResult<Option<Expression>> {
    let path = PropertyPath::parse(property_path)?;

    if let Some(member) = path.member() {
        if let PropertyKind::Collection { target, .. } = &entity.property(path.first())?.kind {
            let element = metadata.entity(target)?;
            let inner = compile_column_condition(
                &element,
                metadata,
                member,
                value_type,
                search_mode,
                filter_mode,
                conditions,
            )?;
            return Ok(inner.map(|predicate| Expression::any(path.first(), predicate)));
        }
    }

    TypeChecker::new(metadata, entity).resolve_path(&path)?;
    let property = Expression::property(path);

    let mut accumulated: Option<Expression> = None;
    for condition in conditions {
        let Some(next) = condition_predicate(&property, value_type, search_mode, condition)? else {
            continue;
        };
        accumulated = Some(match accumulated {
            None => next,
            Some(prev) => match filter_mode {
                FilterMode::And => Expression::and(prev, next),
                FilterMode::Or => Expression::or(prev, next),
            },
        });
    }
    Ok(accumulated)
}

fn condition_predicate(
    property: &Expression,
    value_type: ValueType,
    search_mode: SearchMode,
    condition: &Condition,
) -> CompileResult<Option<Expression>> {
    let literal = condition.value.as_str();
    let typed = || -> CompileResult<Expression> {
        Ok(Expression::literal(value_type.parse_literal(literal)?))
    };

    let predicate = match (condition.operator.as_str(), search_mode) {
        (_, SearchMode::Contains | SearchMode::ContainsOr) => None,

        ("eq", SearchMode::Flag | SearchMode::FlagOr) => {
            let mask = typed()?;
            Some(Expression::eq(
                Expression::bit_and(property.clone(), mask.clone()),
                mask,
            ))
        }
        (
            "eq",
            SearchMode::DateTimeYear | SearchMode::DateTimeMonth | SearchMode::DateTimeDay,
        ) => {
            let (start, end) = date_range(search_mode, literal)?;
            Some(Expression::and(
                Expression::ge(property.clone(), Expression::literal(start)),
                Expression::lt(property.clone(), Expression::literal(end)),
            ))
        }
        ("eq", SearchMode::StringValue) => Some(match literal {
            "NULL" => Expression::is_null(property.clone()),
            "*" => Expression::is_not_null(property.clone()),
            _ => Expression::eq(property.clone(), typed()?),
        }),
        ("eq", _) => Some(Expression::eq(property.clone(), typed()?)),
        ("gt", _) => Some(Expression::gt(property.clone(), typed()?)),
        ("lt", _) => Some(Expression::lt(property.clone(), typed()?)),

        (operator, _) => {
            debug!("Ignoring unknown filter operator '{}'", operator);
            None
        }
    };
    Ok(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ModelRegistry, PropertyInfo};
    use crate::entity::Record;
    use crate::error::CompileError;
    use time::macros::datetime;

    fn registry() -> ModelRegistry {
        let registry = ModelRegistry::new();
        registry.register(
            EntityType::new("Menu", "menus")
                .with_property(PropertyInfo::scalar("Id", ValueType::Int32))
                .with_property(PropertyInfo::scalar("Age", ValueType::Int32))
                .with_property(PropertyInfo::scalar("Flags", ValueType::Int32))
                .with_property(PropertyInfo::scalar("Name", ValueType::String))
                .with_property(PropertyInfo::scalar("Created", ValueType::DateTime))
                .with_property(PropertyInfo::reference("Owner", "User", "OwnerId"))
                .with_property(PropertyInfo::collection("Tags", "Tag", "MenuId")),
        );
        registry.register(
            EntityType::new("User", "users")
                .with_property(PropertyInfo::scalar("Name", ValueType::String)),
        );
        registry.register(
            EntityType::new("Tag", "tags")
                .with_property(PropertyInfo::scalar("Code", ValueType::Int32)),
        );
        registry
    }

    fn compile(
        path: &str,
        value_type: ValueType,
        search_mode: SearchMode,
        filter_mode: FilterMode,
        conditions: &[Condition],
    ) -> CompileResult<Option<Expression>> {
        let registry = registry();
        let menu = registry.entity("Menu").unwrap();
        compile_column_condition(
            &menu,
            &registry,
            path,
            value_type,
            search_mode,
            filter_mode,
            conditions,
        )
    }

    #[test]
    fn test_normal_equality() {
        let expr = compile(
            "Age",
            ValueType::Int32,
            SearchMode::Normal,
            FilterMode::And,
            &[Condition::eq("30")],
        )
        .unwrap();
        assert_eq!(
            expr,
            Some(Expression::eq(
                Expression::column("Age"),
                Expression::literal(30)
            ))
        );
    }

    #[test]
    fn test_strict_comparisons() {
        let expr = compile(
            "Age",
            ValueType::Int32,
            SearchMode::Normal,
            FilterMode::And,
            &[Condition::gt("30"), Condition::lt("40")],
        )
        .unwrap();
        assert_eq!(
            expr,
            Some(Expression::and(
                Expression::gt(Expression::column("Age"), Expression::literal(30)),
                Expression::lt(Expression::column("Age"), Expression::literal(40)),
            ))
        );
    }

    #[test]
    fn test_flag_mode() {
        let expr = compile(
            "Flags",
            ValueType::Int32,
            SearchMode::Flag,
            FilterMode::And,
            &[Condition::eq("6")],
        )
        .unwrap()
        .unwrap();

        assert!(expr.matches(&Record::new().with_value("Flags", 6)));
        assert!(expr.matches(&Record::new().with_value("Flags", 7)));
        assert!(!expr.matches(&Record::new().with_value("Flags", 4)));
    }

    #[test]
    fn test_date_modes() {
        let expr = compile(
            "Created",
            ValueType::DateTime,
            SearchMode::DateTimeMonth,
            FilterMode::And,
            &[Condition::eq("202303")],
        )
        .unwrap();
        assert_eq!(
            expr,
            Some(Expression::and(
                Expression::ge(
                    Expression::column("Created"),
                    Expression::literal(datetime!(2023-03-01 0:00))
                ),
                Expression::lt(
                    Expression::column("Created"),
                    Expression::literal(datetime!(2023-04-01 0:00))
                ),
            ))
        );

        let expr = expr.unwrap();
        let at = |dt: time::PrimitiveDateTime| Record::new().with_value("Created", dt);
        assert!(expr.matches(&at(datetime!(2023-03-01 0:00))));
        assert!(expr.matches(&at(datetime!(2023-03-31 23:59:59))));
        assert!(!expr.matches(&at(datetime!(2023-04-01 0:00))));
    }

    #[test]
    fn test_string_value_mode() {
        let compile_one = |literal: &str| {
            compile(
                "Name",
                ValueType::String,
                SearchMode::StringValue,
                FilterMode::And,
                &[Condition::eq(literal)],
            )
            .unwrap()
            .unwrap()
        };

        assert_eq!(
            compile_one("*"),
            Expression::is_not_null(Expression::column("Name"))
        );
        assert_eq!(
            compile_one("NULL"),
            Expression::is_null(Expression::column("Name"))
        );
        assert_eq!(
            compile_one("bob"),
            Expression::eq(Expression::column("Name"), Expression::literal("bob"))
        );
    }

    #[test]
    fn test_filter_mode_order() {
        let conditions = [Condition::eq("1"), Condition::eq("2"), Condition::eq("3")];
        let eq = |v: i32| Expression::eq(Expression::column("Age"), Expression::literal(v));

        let or = compile(
            "Age",
            ValueType::Int32,
            SearchMode::NormalOr,
            FilterMode::Or,
            &conditions,
        )
        .unwrap();
        assert_eq!(
            or,
            Some(Expression::or(Expression::or(eq(1), eq(2)), eq(3)))
        );

        let and = compile(
            "Age",
            ValueType::Int32,
            SearchMode::Normal,
            FilterMode::And,
            &conditions,
        )
        .unwrap();
        assert_eq!(
            and,
            Some(Expression::and(Expression::and(eq(1), eq(2)), eq(3)))
        );
    }

    #[test]
    fn test_ignored_conditions() {
        let expr = compile(
            "Name",
            ValueType::String,
            SearchMode::Contains,
            FilterMode::And,
            &[Condition::eq("bob")],
        )
        .unwrap();
        assert!(expr.is_none());

        // Operator keys are case-sensitive
        let expr = compile(
            "Age",
            ValueType::Int32,
            SearchMode::Normal,
            FilterMode::And,
            &[Condition::new("GT", "3"), Condition::new("like", "3")],
        )
        .unwrap();
        assert!(expr.is_none());
    }

    #[test]
    fn test_nested_paths() {
        let expr = compile(
            "Owner.Name",
            ValueType::String,
            SearchMode::Normal,
            FilterMode::And,
            &[Condition::eq("ann")],
        )
        .unwrap();
        assert_eq!(
            expr,
            Some(Expression::eq(
                Expression::property(PropertyPath::nested("Owner", "Name")),
                Expression::literal("ann")
            ))
        );

        let expr = compile(
            "Tags.Code",
            ValueType::Int32,
            SearchMode::Normal,
            FilterMode::Or,
            &[Condition::eq("1"), Condition::eq("2")],
        )
        .unwrap();
        let code = |v: i32| Expression::eq(Expression::column("Code"), Expression::literal(v));
        assert_eq!(
            expr,
            Some(Expression::any("Tags", Expression::or(code(1), code(2))))
        );
    }

    #[test]
    fn test_fatal_errors() {
        assert!(matches!(
            compile(
                "Age",
                ValueType::Int32,
                SearchMode::Normal,
                FilterMode::And,
                &[Condition::eq("1"), Condition::eq("abc")],
            ),
            Err(CompileError::LiteralParse { .. })
        ));
        assert!(matches!(
            compile(
                "Owner.Address.City",
                ValueType::String,
                SearchMode::Normal,
                FilterMode::And,
                &[Condition::eq("x")],
            ),
            Err(CompileError::PathTooDeep(_))
        ));
        assert!(matches!(
            compile(
                "Height",
                ValueType::Int32,
                SearchMode::Normal,
                FilterMode::And,
                &[Condition::eq("1")],
            ),
            Err(CompileError::UnknownProperty { .. })
        ));
        assert!(matches!(
            compile(
                "Created",
                ValueType::DateTime,
                SearchMode::DateTimeYear,
                FilterMode::And,
                &[Condition::eq("23")],
            ),
            Err(CompileError::LiteralParse { .. })
        ));
    }
}
