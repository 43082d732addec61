//! Entity queries handed to a query compiler, and the compiled result.

use crate::expression::{Expression, PropertyPath};
use crate::value::Value;
use std::fmt;

/// One projected column and its output name
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionItem {
    pub path: PropertyPath,
    pub name: String,
}

/// A result-shaping selector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub items: Vec<ProjectionItem>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: PropertyPath, name: impl Into<String>) -> Self {
        self.items.push(ProjectionItem {
            path,
            name: name.into(),
        });
        self
    }

    /// Project a single-segment property under its own name
    pub fn with_property(self, property: &str) -> Self {
        self.with(PropertyPath::property(property), property)
    }
}

/// One ORDER BY key
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub path: PropertyPath,
    pub descending: bool,
}

/// A query over one entity type, composed from predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    pub entity: String,
    /// Explicit table alias. Derived from the table name when absent.
    pub alias: Option<String>,
    /// Conjuncts
    pub filters: Vec<Expression>,
    pub projection: Option<Projection>,
    pub ordering: Vec<OrderTerm>,
    pub distinct: bool,
}

impl EntityQuery {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            alias: None,
            filters: Vec::new(),
            projection: None,
            ordering: Vec::new(),
            distinct: false,
        }
    }

    pub fn filter(mut self, predicate: Expression) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn select(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Replace any existing ordering with `path`
    pub fn order_by(mut self, path: PropertyPath, descending: bool) -> Self {
        self.ordering = vec![OrderTerm { path, descending }];
        self
    }

    /// Add a secondary ordering key
    pub fn then_by(mut self, path: PropertyPath, descending: bool) -> Self {
        self.ordering.push(OrderTerm { path, descending });
        self
    }
}

/// SQL text plus its bound parameters in placeholder order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub parameters: Vec<Value>,
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = EntityQuery::new("Menu")
            .filter(Expression::is_null(Expression::column("Pid")))
            .alias("t")
            .distinct()
            .order_by(PropertyPath::property("Name"), false)
            .then_by(PropertyPath::property("Id"), true);

        assert_eq!(query.alias.as_deref(), Some("t"));
        assert!(query.distinct);
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.ordering.len(), 2);
        assert!(query.ordering[1].descending);

        let query = query.order_by(PropertyPath::property("Id"), false);
        assert_eq!(query.ordering.len(), 1);
    }

    #[test]
    fn test_projection() {
        let projection = Projection::new()
            .with_property("Id")
            .with(PropertyPath::nested("Owner", "Name"), "OwnerName");
        assert_eq!(projection.items[0].name, "Id");
        assert_eq!(projection.items[1].path.to_string(), "Owner.Name");
    }
}
