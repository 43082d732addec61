//! Query builders for the common tree lookups of one entity type.

use crate::catalog::{EntityType, MetadataAdapter};
use crate::error::CompileResult;
use crate::expression::{Expression, PropertyPath};
use crate::filter::PredicateBuilder;
use crate::hierarchy::compiler::HierarchicalQueryCompiler;
use crate::hierarchy::tree_query::TreeQuery;
use crate::sql::{CompiledQuery, EntityQuery, Projection, QueryCompiler};
use crate::value::Value;
use std::sync::Arc;

/// Builds and compiles the tree lookups of `entity`
pub struct TreeRepository<'a> {
    metadata: &'a dyn MetadataAdapter,
    queries: &'a dyn QueryCompiler,
    entity: Arc<EntityType>,
}

impl<'a> TreeRepository<'a> {
    pub fn new(
        metadata: &'a dyn MetadataAdapter,
        queries: &'a dyn QueryCompiler,
        entity: &str,
    ) -> CompileResult<Self> {
        let entity = metadata.entity(entity)?;
        Ok(Self {
            metadata,
            queries,
            entity,
        })
    }

    fn tree(&self, query: &TreeQuery) -> CompileResult<CompiledQuery> {
        HierarchicalQueryCompiler::new(self.metadata, self.queries).compile(query)
    }

    fn base(&self) -> EntityQuery {
        EntityQuery::new(self.entity.name.clone())
    }

    fn parent_equals(&self, parent_id: Value) -> Expression {
        Expression::eq(
            Expression::column(self.entity.parent.as_str()),
            Expression::literal(parent_id),
        )
    }

    fn key_projection(&self) -> Projection {
        Projection::new().with_property(&self.entity.key)
    }

    /// Children of the node `id`.
    ///
    /// Recursive lookups walk the whole subtree and include the node itself;
    /// otherwise only direct children are returned.
    pub fn children(
        &self,
        id: impl Into<Value>,
        recursive: bool,
        filter: Option<Expression>,
        order: Option<&str>,
    ) -> CompileResult<CompiledQuery> {
        let id = id.into();
        if recursive {
            let start = PredicateBuilder::id_equals(&self.entity, id);
            let mut query = TreeQuery::new(self.base(), start);
            query.filter = filter;
            query.order_property = order.map(str::to_string);
            return self.tree(&query);
        }

        let mut query = self.base();
        if let Some(filter) = filter {
            query = query.filter(filter);
        }
        query = query.filter(self.parent_equals(id));
        if let Some(order) = order {
            query = query.order_by(PropertyPath::parse(order)?, false);
        }
        self.queries.compile_to_sql_with_params(&query)
    }

    /// Nodes sharing `parent_id`; `None` selects the roots
    pub fn siblings(&self, parent_id: Option<Value>) -> CompileResult<CompiledQuery> {
        let query = self
            .base()
            .filter(self.parent_equals(parent_id.unwrap_or(Value::Null)));
        self.queries.compile_to_sql_with_params(&query)
    }

    /// Every node below the roots.
    ///
    /// With `start_query` the walk starts at the rows matching `filter`
    /// instead, and repeated rows are collapsed.
    pub fn all_children(
        &self,
        filter: Option<Expression>,
        start_query: bool,
        order: Option<&str>,
    ) -> CompileResult<CompiledQuery> {
        let roots = Expression::is_null(Expression::column(self.entity.parent.as_str()));
        let mut query = match (start_query, filter) {
            (true, Some(start)) => TreeQuery::new(self.base(), start).distinct(),
            (true, None) => TreeQuery::new(self.base(), roots).distinct(),
            (false, filter) => {
                let mut query = TreeQuery::new(self.base(), roots);
                query.filter = filter;
                query
            }
        };
        query.order_property = order.map(str::to_string);
        self.tree(&query)
    }

    /// The node `id` and its ancestors
    pub fn parents(&self, id: impl Into<Value>) -> CompileResult<CompiledQuery> {
        let query =
            TreeQuery::new(self.base(), PredicateBuilder::id_equals(&self.entity, id)).ancestors();
        self.tree(&query)
    }

    /// Distinct ancestors of the rows matching `start`, shaped by `projection`
    pub fn parents_with(
        &self,
        start: Expression,
        projection: Projection,
    ) -> CompileResult<CompiledQuery> {
        let query = TreeQuery::new(self.base(), start)
            .ancestors()
            .distinct()
            .select(projection);
        self.tree(&query)
    }

    /// Distinct descendants of the rows matching `start`, shaped by `projection`
    pub fn children_recursion(
        &self,
        start: Expression,
        projection: Projection,
    ) -> CompileResult<CompiledQuery> {
        let query = TreeQuery::new(self.base(), start)
            .distinct()
            .select(projection);
        self.tree(&query)
    }

    /// Keys of the rows matching `start` and their ancestors
    pub fn parent_ids(&self, start: Expression) -> CompileResult<CompiledQuery> {
        self.parents_with(start, self.key_projection())
    }

    /// Keys of the rows matching `start` and their descendants
    pub fn children_ids(&self, start: Expression) -> CompileResult<CompiledQuery> {
        self.children_recursion(start, self.key_projection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ModelRegistry, PropertyInfo};
    use crate::error::CompileError;
    use crate::sql::{Dialect, RelationalCompiler};
    use crate::value::ValueType;

    fn registry() -> ModelRegistry {
        let registry = ModelRegistry::new();
        registry.register(
            EntityType::new("Dept", "departments")
                .with_property(PropertyInfo::scalar("Id", ValueType::Int32))
                .with_property(
                    PropertyInfo::scalar("Pid", ValueType::Int32).with_column("parent_id"),
                )
                .with_property(PropertyInfo::scalar("Title", ValueType::String)),
        );
        registry
    }

    const COLUMNS: &str = "\"d\".\"Id\", \"d\".\"parent_id\", \"d\".\"Title\"";

    fn with_repository<T>(f: impl FnOnce(&TreeRepository) -> T) -> T {
        let registry = registry();
        let queries = RelationalCompiler::new(&registry, Dialect::sqlite());
        let repository = TreeRepository::new(&registry, &queries, "Dept").unwrap();
        f(&repository)
    }

    #[test]
    fn test_direct_children() {
        let compiled = with_repository(|r| r.children(3, false, None, Some("Title")).unwrap());
        assert_eq!(
            compiled.sql,
            format!(
                "SELECT {} FROM \"departments\" AS \"d\" WHERE \"d\".\"parent_id\" = ? ORDER BY \"d\".\"Title\"",
                COLUMNS
            )
        );
        assert_eq!(compiled.parameters, vec![Value::Int32(3)]);
    }

    #[test]
    fn test_recursive_children() {
        let filter = Expression::ne(Expression::column("Title"), Expression::literal("x"));
        let compiled = with_repository(|r| r.children(3, true, Some(filter), None).unwrap());
        assert!(compiled.sql.starts_with("WITH RECURSIVE mytree AS (SELECT "));
        assert!(compiled
            .sql
            .contains("WHERE \"d\".\"Id\" = ? UNION ALL"));
        assert!(compiled.sql.contains(
            "JOIN \"mytree\" ON \"dd\".\"parent_id\" = \"mytree\".\"Id\" WHERE \"dd\".\"Title\" <> ?"
        ));
        assert_eq!(
            compiled.parameters,
            vec![Value::Int32(3), Value::from("x"), Value::from("x")]
        );
    }

    #[test]
    fn test_siblings_and_roots() {
        let compiled = with_repository(|r| r.siblings(Some(Value::Int32(1))).unwrap());
        assert!(compiled.sql.ends_with("WHERE \"d\".\"parent_id\" = ?"));

        let compiled = with_repository(|r| r.siblings(None).unwrap());
        assert!(compiled.sql.ends_with("WHERE \"d\".\"parent_id\" IS NULL"));
        assert!(compiled.parameters.is_empty());
    }

    #[test]
    fn test_all_children() {
        let compiled = with_repository(|r| r.all_children(None, false, None).unwrap());
        assert!(compiled.sql.contains("WHERE \"d\".\"parent_id\" IS NULL UNION ALL"));
        assert!(compiled.sql.contains(") SELECT \"d\"."));

        let start = Expression::eq(Expression::column("Title"), Expression::literal("ops"));
        let compiled = with_repository(|r| r.all_children(Some(start), true, None).unwrap());
        assert!(compiled.sql.contains("WHERE \"d\".\"Title\" = ? UNION ALL"));
        assert!(compiled.sql.contains(") SELECT DISTINCT "));
    }

    #[test]
    fn test_parents() {
        let compiled = with_repository(|r| r.parents(9).unwrap());
        assert!(compiled
            .sql
            .contains("JOIN \"mytree\" ON \"dd\".\"Id\" = \"mytree\".\"parent_id\""));
        assert_eq!(compiled.parameters, vec![Value::Int32(9)]);
    }

    #[test]
    fn test_id_projections() {
        let start = Expression::eq(Expression::column("Id"), Expression::literal(4));

        let compiled = with_repository(|r| r.parent_ids(start.clone()).unwrap());
        assert_eq!(
            compiled.sql,
            "WITH RECURSIVE mytree AS (\
             SELECT \"d\".\"Id\" AS \"Id\", \"d\".\"parent_id\", 0 AS level \
             FROM \"departments\" AS \"d\" WHERE \"d\".\"Id\" = ? \
             UNION ALL \
             SELECT \"dd\".\"Id\" AS \"Id\", \"dd\".\"parent_id\", mytree.level + 1 \
             FROM \"departments\" AS \"dd\" JOIN \"mytree\" ON \"dd\".\"Id\" = \"mytree\".\"parent_id\" \
             ORDER BY level DESC) \
             SELECT DISTINCT \"d\".\"Id\" FROM \"mytree\" AS \"d\""
        );

        let compiled = with_repository(|r| r.children_ids(start).unwrap());
        assert!(compiled
            .sql
            .contains("JOIN \"mytree\" ON \"dd\".\"parent_id\" = \"mytree\".\"Id\""));
        assert!(compiled
            .sql
            .ends_with("SELECT DISTINCT \"d\".\"Id\" FROM \"mytree\" AS \"d\""));
    }

    #[test]
    fn test_unknown_entity() {
        let registry = registry();
        let queries = RelationalCompiler::new(&registry, Dialect::sqlite());
        assert!(matches!(
            TreeRepository::new(&registry, &queries, "Menu"),
            Err(CompileError::UnknownEntity(_))
        ));
    }
}
