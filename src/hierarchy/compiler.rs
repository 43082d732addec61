//! Recursive CTE synthesis for tree-shaped entities.
//!
//! A traversal is compiled in stages:
//!
//! 1. resolve the table, key, parent and order columns
//! 2. compile the seed member (base query filtered by the start predicate)
//! 3. compile the step member (base query, filtered when a filter is given)
//!    and rename its alias when it shadows the seed's
//! 4. splice the level and path-order columns and the join on `mytree`
//! 5. assemble the statement reading from `mytree`
//! 6. restrict it to one depth when a level is requested
//!
//! The output has the shape
//!
//! ```text
//! WITH RECURSIVE mytree AS (<seed> UNION ALL <step>[ ORDER BY level DESC[, col]]) <outer>
//! ```
//!
//! Dialects with array aggregation carry a `sorder` path array instead of
//! ordering inside the recursive member and sort the outer select by it.

use crate::catalog::MetadataAdapter;
use crate::error::{CompileError, CompileResult};
use crate::expression::Expression;
use crate::hierarchy::tree_query::{Traversal, TreeQuery};
use crate::sql::{
    CompiledQuery, EntityQuery, Join, JoinKind, ParameterMode, QueryCompiler, SelectItem,
    SelectStatement, SqlPart, SqlText, SqlWriter, TableRef,
};
use crate::value::Value;
use log::{debug, trace};

/// Name of the recursive common table expression
pub const CTE_NAME: &str = "mytree";
/// Depth column; 0 for seed rows
pub const LEVEL_COLUMN: &str = "level";
/// Path-order column under array aggregation
pub const SORDER_COLUMN: &str = "sorder";

/// Table and column names of the traversed entity
#[derive(Debug, Clone, PartialEq)]
struct TreeMetadata {
    table: String,
    key_column: String,
    parent_column: String,
    order_column: Option<String>,
}

/// Both recursive members. `compiled_step` is the step before renaming and
/// splicing, which the outer select is derived from.
#[derive(Debug, Clone)]
struct Members {
    seed: SelectStatement,
    step: SelectStatement,
    compiled_step: SelectStatement,
}

#[derive(Debug, Clone)]
struct Assembled {
    seed: SelectStatement,
    step: SelectStatement,
    outer: SelectStatement,
}

/// Compiles [`TreeQuery`] traversals into a single recursive statement.
///
/// Table and column names come from `metadata`. The seed and step selects
/// come from `queries`, whose dialect also decides whether path ordering
/// uses array aggregation.
pub struct HierarchicalQueryCompiler<'a> {
    metadata: &'a dyn MetadataAdapter,
    queries: &'a dyn QueryCompiler,
}

impl<'a> HierarchicalQueryCompiler<'a> {
    pub fn new(metadata: &'a dyn MetadataAdapter, queries: &'a dyn QueryCompiler) -> Self {
        Self { metadata, queries }
    }

    /// SQL with placeholders and the parameters in placeholder order
    pub fn compile(&self, query: &TreeQuery) -> CompileResult<CompiledQuery> {
        self.compile_with_mode(query, ParameterMode::Bind)
    }

    /// SQL with literals inlined
    pub fn compile_to_sql(&self, query: &TreeQuery) -> CompileResult<String> {
        Ok(self.compile_with_mode(query, ParameterMode::Inline)?.sql)
    }

    fn compile_with_mode(
        &self,
        query: &TreeQuery,
        mode: ParameterMode,
    ) -> CompileResult<CompiledQuery> {
        trace!("Resolving tree metadata for {}", query.base.entity);
        let tree = self.resolve_metadata(query)?;

        trace!("Compiling seed member over {}", tree.table);
        let seed = self.compile_seed(query)?;

        trace!("Compiling step member (filtered: {})", query.filter.is_some());
        let mut members = self.compile_step(query, seed)?;

        trace!("Splicing {:?} traversal", query.traversal);
        self.splice(query, &tree, &mut members);

        trace!("Assembling outer select over {}", CTE_NAME);
        let mut assembled = self.assemble(query, &tree, members);

        if query.level > 0 {
            trace!("Restricting to level {}", query.level);
            apply_level_filter(&mut assembled.outer, query.level);
        }

        let compiled = self.render(&assembled, mode);
        debug!(
            "Compiled tree query over {} with {} parameters: {}",
            query.base.entity,
            compiled.parameters.len(),
            compiled.sql
        );
        Ok(compiled)
    }

    fn resolve_metadata(&self, query: &TreeQuery) -> CompileResult<TreeMetadata> {
        let entity = self.metadata.entity(&query.base.entity)?;

        if let Some(projection) = &query.base.projection {
            if let Some(item) = projection.items.iter().find(|item| item.path.is_nested()) {
                return Err(CompileError::UnsupportedPredicate(format!(
                    "tree projection '{}' must select a property of {}",
                    item.path, entity.name
                )));
            }
        }

        let order_column = match &query.order_property {
            Some(property) => Some(entity.column_name(property)?.to_string()),
            None => None,
        };
        Ok(TreeMetadata {
            table: entity.table.clone(),
            key_column: entity.key_column().to_string(),
            parent_column: entity.parent_column().to_string(),
            order_column,
        })
    }

    /// The base query with `predicate` added and its ordering dropped
    fn member(query: &TreeQuery, predicate: Option<&Expression>) -> EntityQuery {
        let mut member = query.base.clone();
        member.ordering.clear();
        if let Some(predicate) = predicate {
            member.filters.push(predicate.clone());
        }
        member
    }

    fn compile_seed(&self, query: &TreeQuery) -> CompileResult<SelectStatement> {
        self.queries
            .compile_select(&Self::member(query, Some(&query.start)))
    }

    fn compile_step(&self, query: &TreeQuery, seed: SelectStatement) -> CompileResult<Members> {
        let compiled_step = self
            .queries
            .compile_select(&Self::member(query, query.filter.as_ref()))?;

        let mut step = compiled_step.clone();
        let alias = step.alias().to_string();
        if alias == seed.alias() {
            let renamed = format!("{}{}", alias, alias);
            if renamed == CTE_NAME || step.aliases().contains(&renamed) {
                return Err(CompileError::AliasCollision { alias: renamed });
            }
            trace!("Renaming step alias {} to {}", alias, renamed);
            step.rename_alias(&alias, &renamed);
        }

        Ok(Members {
            seed,
            step,
            compiled_step,
        })
    }

    fn splice(&self, query: &TreeQuery, tree: &TreeMetadata, members: &mut Members) {
        let array_aggregation = self.queries.dialect().array_aggregation;

        // The recursive join and the member ordering read these through mytree
        let mut carried = vec![tree.key_column.as_str(), tree.parent_column.as_str()];
        if !array_aggregation {
            carried.extend(tree.order_column.as_deref());
        }
        for column in carried {
            ensure_column(&mut members.seed, column);
            ensure_column(&mut members.step, column);
        }
        // The outer select keeps the filter, so mytree must expose what it reads
        let compiled_step = &members.compiled_step;
        for column in compiled_step.filter_columns(compiled_step.alias()) {
            ensure_column(&mut members.seed, &column);
            ensure_column(&mut members.step, &column);
        }

        let seed_alias = members.seed.alias().to_string();
        members.seed.push_item(SelectItem::new(SqlText::raw(format!(
            "0 AS {}",
            LEVEL_COLUMN
        ))));

        let step_alias = members.step.alias().to_string();
        members.step.push_item(SelectItem::new(SqlText::raw(format!(
            "{}.{} + 1",
            CTE_NAME, LEVEL_COLUMN
        ))));

        if let (true, Some(order_column)) = (array_aggregation, tree.order_column.as_deref()) {
            members.seed.push_item(SelectItem::new(
                SqlText::raw("ARRAY[")
                    .then(SqlText::column(Some(&seed_alias), order_column))
                    .then_raw(format!("] AS {}", SORDER_COLUMN)),
            ));
            members.step.push_item(SelectItem::new(
                SqlText::raw(format!("{} || ", SORDER_COLUMN))
                    .then(SqlText::column(Some(&step_alias), order_column))
                    .then_raw(format!(" AS {}", SORDER_COLUMN)),
            ));
        }

        let (step_column, tree_column) = match query.traversal {
            Traversal::Descendants => (&tree.parent_column, &tree.key_column),
            Traversal::Ancestors => (&tree.key_column, &tree.parent_column),
        };
        members.step.push_join(Join {
            kind: JoinKind::Inner,
            table: TableRef::new(CTE_NAME),
            on: SqlText::column(Some(&step_alias), step_column.as_str())
                .then_raw(" = ")
                .then(SqlText::column(Some(CTE_NAME), tree_column.as_str())),
        });

        if !array_aggregation {
            members
                .step
                .order_by
                .push(SqlText::raw(format!("{} DESC", LEVEL_COLUMN)));
            if let Some(order_column) = &tree.order_column {
                members
                    .step
                    .order_by
                    .push(SqlText::column(None, order_column.as_str()));
            }
        }
    }

    fn assemble(&self, query: &TreeQuery, tree: &TreeMetadata, members: Members) -> Assembled {
        let mut outer = members.compiled_step;
        outer.replace_table(&tree.table, CTE_NAME);
        outer.distinct = outer.distinct || query.distinct;

        // Projected rows in mytree are named by their output names
        if query.base.projection.is_some() {
            let alias = outer.alias().to_string();
            for item in &mut outer.items {
                if let Some(name) = item.output_name().map(str::to_string) {
                    *item = SelectItem::new(SqlText::column(Some(&alias), name));
                }
            }
        }

        if self.queries.dialect().array_aggregation && tree.order_column.is_some() {
            outer.order_by = vec![SqlText::raw(SORDER_COLUMN)];
        }

        Assembled {
            seed: members.seed,
            step: members.step,
            outer,
        }
    }

    fn render(&self, assembled: &Assembled, mode: ParameterMode) -> CompiledQuery {
        let mut writer = SqlWriter::new(self.queries.dialect(), mode);
        writer.write_str(&format!("WITH RECURSIVE {} AS (", CTE_NAME));
        writer.write_select(&assembled.seed);
        writer.write_str(" UNION ALL ");
        writer.write_select(&assembled.step);
        writer.write_str(") ");
        writer.write_select(&assembled.outer);
        writer.finish()
    }
}

/// Select `column` from the FROM table unless an item already produces it
fn ensure_column(select: &mut SelectStatement, column: &str) {
    let produced = select.items.iter().any(|item| {
        item.output_name() == Some(column)
            || matches!(item.expr.parts(), [SqlPart::Raw(sql)] if sql == "*")
    });
    if produced {
        return;
    }
    let alias = select.alias().to_string();
    select.push_item(SelectItem::new(SqlText::column(Some(&alias), column)));
}

fn apply_level_filter(outer: &mut SelectStatement, level: i32) {
    outer.push_where(
        SqlText::raw(format!("{} = ", LEVEL_COLUMN)).then(SqlText::param(Value::Int32(level))),
    );
}
