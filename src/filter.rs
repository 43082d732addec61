//! Predicate compiler: free-form filter tokens to predicate trees.
//!
//! A filter token has the shape `column operator value`. Tokens are grouped by
//! the view column they name and each group compiles to one predicate; callers
//! combine the groups with AND.

pub mod builder;
pub mod column_condition;
pub mod condition;
pub mod date_range;

pub use builder::PredicateBuilder;
pub use column_condition::compile_column_condition;
pub use condition::{Condition, FilterInfo, FilterToken};
pub use date_range::date_range;

use crate::catalog::{ColumnInfo, MetadataAdapter, ViewModel};
use crate::error::CompileResult;
use crate::expression::Expression;
use log::debug;

/// Compile filter tokens against a view into one predicate per column.
///
/// Malformed tokens and tokens naming a column the view does not expose are
/// dropped. Groups are emitted in order of first appearance.
pub fn compile_where<S: AsRef<str>>(
    metadata: &dyn MetadataAdapter,
    view: &ViewModel,
    tokens: &[S],
) -> CompileResult<Vec<Expression>> {
    let mut groups: Vec<(&ColumnInfo, Vec<Condition>)> = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        let Some(parsed) = FilterToken::parse(token) else {
            debug!("Dropping malformed filter token '{}'", token);
            continue;
        };
        let Some(column) = view.column_info(&parsed.column) else {
            debug!(
                "Dropping filter on unknown column '{}' of view {}",
                parsed.column, view.name
            );
            continue;
        };
        match groups
            .iter_mut()
            .find(|(existing, _)| existing.column_name == column.column_name)
        {
            Some((_, conditions)) => conditions.push(parsed.condition),
            None => groups.push((column, vec![parsed.condition])),
        }
    }

    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let entity = metadata.entity(&view.entity)?;
    let mut predicates = Vec::with_capacity(groups.len());
    for (column, conditions) in groups {
        let predicate = compile_column_condition(
            &entity,
            metadata,
            &column.property_name,
            column.property_value_type,
            column.search_mode,
            column.filter_mode,
            &conditions,
        )?;
        if let Some(predicate) = predicate {
            predicates.push(predicate);
        }
    }
    Ok(predicates)
}

/// Compile the filters of a [`FilterInfo`]. `None` when it carries no filters.
pub fn compile_filter_info(
    metadata: &dyn MetadataAdapter,
    view: &ViewModel,
    info: &FilterInfo,
) -> CompileResult<Option<Vec<Expression>>> {
    if info.filters.is_empty() {
        return Ok(None);
    }
    compile_where(metadata, view, info.filters.as_slice()).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityType, FilterMode, ModelRegistry, PropertyInfo, SearchMode};
    use crate::entity::Record;
    use crate::error::CompileError;
    use crate::value::ValueType;

    fn setup() -> (ModelRegistry, ViewModel) {
        let registry = ModelRegistry::new();
        registry.register(
            EntityType::new("Person", "people")
                .with_property(PropertyInfo::scalar("Age", ValueType::Int32))
                .with_property(PropertyInfo::scalar("Name", ValueType::String))
                .with_property(PropertyInfo::scalar("Flags", ValueType::Int32)),
        );
        let view = ViewModel::new("people", "Person")
            .with_column(ColumnInfo::new("age", "Age", ValueType::Int32))
            .with_column(
                ColumnInfo::new("name", "Name", ValueType::String)
                    .with_search_mode(SearchMode::NormalOr)
                    .with_filter_mode(FilterMode::Or),
            )
            .with_column(
                ColumnInfo::new("flags", "Flags", ValueType::Int32)
                    .with_search_mode(SearchMode::Flag),
            );
        (registry, view)
    }

    #[test]
    fn test_single_group() {
        let (registry, view) = setup();
        let predicates = compile_where(&registry, &view, &["age gt 30"]).unwrap();
        assert_eq!(
            predicates,
            vec![Expression::gt(
                Expression::column("Age"),
                Expression::literal(30)
            )]
        );
    }

    #[test]
    fn test_dropped_tokens() {
        let (registry, view) = setup();
        let predicates =
            compile_where(&registry, &view, &["height gt 30", "age gt", "", "age gt 1 2"])
                .unwrap();
        assert!(predicates.is_empty());
    }

    #[test]
    fn test_grouping_by_column() {
        let (registry, view) = setup();
        let predicates = compile_where(
            &registry,
            &view,
            &["name eq ann", "age gt 30", "name eq bob", "flags eq 2"],
        )
        .unwrap();
        assert_eq!(predicates.len(), 3);

        let name = |v: &str| Expression::eq(Expression::column("Name"), Expression::literal(v));
        assert_eq!(predicates[0], Expression::or(name("ann"), name("bob")));
        assert_eq!(
            predicates[1],
            Expression::gt(Expression::column("Age"), Expression::literal(30))
        );

        let row = Record::new()
            .with_value("Name", "bob")
            .with_value("Age", 31)
            .with_value("Flags", 3);
        assert!(predicates.iter().all(|p| p.matches(&row)));
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let (registry, view) = setup();
        assert!(matches!(
            compile_where(&registry, &view, &["age gt 30", "age lt abc"]),
            Err(CompileError::LiteralParse { .. })
        ));
    }

    #[test]
    fn test_compile_filter_info() {
        let (registry, view) = setup();
        assert_eq!(
            compile_filter_info(&registry, &view, &FilterInfo::new()).unwrap(),
            None
        );

        let info = FilterInfo::new().with_filter("age eq 3");
        assert_eq!(
            compile_filter_info(&registry, &view, &info).unwrap(),
            Some(vec![Expression::eq(
                Expression::column("Age"),
                Expression::literal(3)
            )])
        );
    }
}
