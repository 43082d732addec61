//! The query-compilation contract and a relational implementation of it.

use crate::catalog::{EntityType, MetadataAdapter};
use crate::error::{CompileError, CompileResult};
use crate::expression::{BinaryOperator, Expression, PropertyPath, TypeChecker, UnaryOperator};
use crate::sql::dialect::Dialect;
use crate::sql::fragment::{Join, JoinKind, SelectItem, SelectStatement, SqlText, TableRef};
use crate::sql::query::{CompiledQuery, EntityQuery};
use crate::sql::writer::{render_select, ParameterMode};
use crate::value::Value;
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Turns entity queries into SQL for one dialect.
pub trait QueryCompiler {
    fn dialect(&self) -> &Dialect;

    /// Compile to a structural SELECT
    fn compile_select(&self, query: &EntityQuery) -> CompileResult<SelectStatement>;

    /// SQL text with literals inlined
    fn compile_to_sql(&self, query: &EntityQuery) -> CompileResult<String> {
        let select = self.compile_select(query)?;
        Ok(render_select(&select, self.dialect(), ParameterMode::Inline).sql)
    }

    /// SQL text with placeholders, plus the parameters in placeholder order
    fn compile_to_sql_with_params(&self, query: &EntityQuery) -> CompileResult<CompiledQuery> {
        let select = self.compile_select(query)?;
        let compiled = render_select(&select, self.dialect(), ParameterMode::Bind);
        debug!(
            "Compiled {} query with {} parameters: {}",
            query.entity,
            compiled.parameters.len(),
            compiled.sql
        );
        Ok(compiled)
    }
}

/// Table aliases in use within one statement and its subqueries
#[derive(Debug, Default)]
struct AliasAllocator {
    used: BTreeSet<String>,
}

impl AliasAllocator {
    fn reserve(&mut self, alias: &str) -> String {
        self.used.insert(alias.to_string());
        alias.to_string()
    }

    /// First letter of the table, lowercased, then numbered on reuse
    fn allocate(&mut self, table: &str) -> String {
        let base: String = match table.chars().next() {
            Some(c) => c.to_lowercase().collect(),
            None => "t".to_string(),
        };
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 0;
        loop {
            let candidate = format!("{}{}", base, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// The entity a predicate is evaluated against within a statement
struct Scope {
    entity: Arc<EntityType>,
    alias: String,
    joins: Vec<Join>,
    /// Reference navigation to the alias it was joined under
    joined: Vec<(String, String)>,
}

impl Scope {
    fn new(entity: Arc<EntityType>, alias: String) -> Self {
        Self {
            entity,
            alias,
            joins: Vec::new(),
            joined: Vec::new(),
        }
    }
}

/// Compiles entity queries against relational metadata.
///
/// Selects list every scalar column explicitly, alias the root table by its
/// first letter, reach reference navigations through `LEFT JOIN` and test
/// collection navigations with a correlated `EXISTS`.
pub struct RelationalCompiler<M: MetadataAdapter> {
    metadata: M,
    dialect: Dialect,
}

impl<M: MetadataAdapter> RelationalCompiler<M> {
    pub fn new(metadata: M, dialect: Dialect) -> Self {
        Self { metadata, dialect }
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    fn path_column(
        &self,
        scope: &mut Scope,
        aliases: &mut AliasAllocator,
        path: &PropertyPath,
    ) -> CompileResult<SqlText> {
        let (qualifier, entity, name) = match path.member() {
            None => (scope.alias.clone(), Arc::clone(&scope.entity), path.first()),
            Some(member) => {
                let (qualifier, related) = self.join_reference(scope, aliases, path.first())?;
                (qualifier, related, member)
            }
        };

        let property = entity.property(name)?;
        if !property.is_scalar() {
            return Err(CompileError::UnsupportedPredicate(format!(
                "{} is a navigation, not a column",
                path
            )));
        }
        Ok(SqlText::column(Some(&qualifier), property.column_name()))
    }

    fn join_reference(
        &self,
        scope: &mut Scope,
        aliases: &mut AliasAllocator,
        navigation: &str,
    ) -> CompileResult<(String, Arc<EntityType>)> {
        let entity = Arc::clone(&scope.entity);
        let (target, foreign_key) = entity.reference_target(navigation)?;
        let related = self.metadata.entity(target)?;

        if let Some((_, alias)) = scope.joined.iter().find(|(nav, _)| nav == navigation) {
            return Ok((alias.clone(), related));
        }

        let alias = aliases.allocate(&related.table);
        let on = SqlText::column(Some(&scope.alias), entity.column_or_name(foreign_key))
            .then_raw(" = ")
            .then(SqlText::column(Some(&alias), related.key_column()));
        scope.joins.push(Join {
            kind: JoinKind::Left,
            table: TableRef::aliased(related.table.clone(), alias.clone()),
            on,
        });
        scope.joined.push((navigation.to_string(), alias.clone()));
        Ok((alias, related))
    }

    /// Render a predicate. `parent` is the binding strength of the enclosing
    /// operator; looser children are parenthesized.
    fn render(
        &self,
        scope: &mut Scope,
        aliases: &mut AliasAllocator,
        expr: &Expression,
        parent: u8,
    ) -> CompileResult<SqlText> {
        match expr {
            Expression::Literal(Value::Null) => Ok(SqlText::raw("NULL")),

            Expression::Literal(value) => Ok(SqlText::param(value.clone())),

            Expression::Property(path) => self.path_column(scope, aliases, path),

            Expression::BinaryOp {
                op: op @ (BinaryOperator::Eq | BinaryOperator::Ne),
                left,
                right,
            } if matches!(**right, Expression::Literal(Value::Null))
                || matches!(**left, Expression::Literal(Value::Null)) =>
            {
                let operand = match **right {
                    Expression::Literal(Value::Null) => left,
                    _ => right,
                };
                let test = match op {
                    BinaryOperator::Eq => " IS NULL",
                    _ => " IS NOT NULL",
                };
                Ok(self.render(scope, aliases, operand, u8::MAX)?.then_raw(test))
            }

            Expression::BinaryOp { op, left, right } => {
                let precedence = op.precedence();
                let wrap = *op == BinaryOperator::BitAnd || precedence < parent;

                let mut text = SqlText::new();
                if wrap {
                    text.push_raw("(");
                }
                text.append(self.render(scope, aliases, left, precedence)?);
                text.push_raw(format!(" {} ", op.as_str()));
                text.append(self.render(scope, aliases, right, precedence + 1)?);
                if wrap {
                    text.push_raw(")");
                }
                Ok(text)
            }

            Expression::UnaryOp {
                op: UnaryOperator::Not,
                operand,
            } => Ok(SqlText::raw("NOT (")
                .then(self.render(scope, aliases, operand, 0)?)
                .then_raw(")")),

            Expression::UnaryOp { op, operand } => Ok(self
                .render(scope, aliases, operand, u8::MAX)?
                .then_raw(format!(" {}", op.as_str()))),

            Expression::In {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    return Ok(SqlText::raw(if *negated { "1 = 1" } else { "0 = 1" }));
                }
                let mut text = self.render(scope, aliases, expr, u8::MAX)?;
                text.push_raw(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in list.iter().enumerate() {
                    if i > 0 {
                        text.push_raw(", ");
                    }
                    text.append(SqlText::param(value.clone()));
                }
                text.push_raw(")");
                Ok(text)
            }

            Expression::Any {
                navigation,
                predicate,
            } => {
                let entity = Arc::clone(&scope.entity);
                let (target, foreign_key) = entity.collection_target(navigation)?;
                let element = self.metadata.entity(target)?;
                let alias = aliases.allocate(&element.table);

                let mut sub =
                    SelectStatement::new(TableRef::aliased(element.table.clone(), alias.clone()));
                sub.push_item(SelectItem::new(SqlText::raw("1")));
                sub.push_where(
                    SqlText::column(Some(&alias), element.column_or_name(foreign_key))
                        .then_raw(" = ")
                        .then(SqlText::column(Some(&scope.alias), entity.key_column())),
                );

                let mut inner = Scope::new(Arc::clone(&element), alias);
                let condition = self.render(
                    &mut inner,
                    aliases,
                    predicate,
                    BinaryOperator::And.precedence(),
                )?;
                sub.push_where(condition);
                sub.joins = inner.joins;
                Ok(SqlText::exists(sub))
            }
        }
    }
}

impl<M: MetadataAdapter> QueryCompiler for RelationalCompiler<M> {
    fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    fn compile_select(&self, query: &EntityQuery) -> CompileResult<SelectStatement> {
        let entity = self.metadata.entity(&query.entity)?;

        // Reject bad predicates before producing any SQL
        let checker = TypeChecker::new(&self.metadata, &entity);
        for filter in &query.filters {
            checker.check_filter_predicate(filter)?;
        }

        let mut aliases = AliasAllocator::default();
        let alias = match &query.alias {
            Some(alias) => aliases.reserve(alias),
            None => aliases.allocate(&entity.table),
        };
        let mut statement =
            SelectStatement::new(TableRef::aliased(entity.table.clone(), alias.clone()));
        statement.distinct = query.distinct;
        let mut scope = Scope::new(Arc::clone(&entity), alias);

        match &query.projection {
            Some(projection) => {
                for item in &projection.items {
                    let column = self.path_column(&mut scope, &mut aliases, &item.path)?;
                    statement.push_item(SelectItem::aliased(column, item.name.clone()));
                }
            }
            None => {
                for property in entity.scalar_properties() {
                    statement.push_item(SelectItem::new(SqlText::column(
                        Some(&scope.alias),
                        property.column_name(),
                    )));
                }
            }
        }
        if statement.items.is_empty() {
            statement.push_item(SelectItem::new(SqlText::raw("*")));
        }

        for filter in &query.filters {
            let conjunct = self.render(
                &mut scope,
                &mut aliases,
                filter,
                BinaryOperator::And.precedence(),
            )?;
            statement.push_where(conjunct);
        }

        for term in &query.ordering {
            let mut key = self.path_column(&mut scope, &mut aliases, &term.path)?;
            if term.descending {
                key.push_raw(" DESC");
            }
            statement.order_by.push(key);
        }

        statement.joins = scope.joins;
        Ok(statement)
    }
}
