//! Structural SELECT fragments.
//!
//! Compiled queries are kept as a small tree of clauses instead of text so
//! that columns, joins and conjuncts can be inserted, aliases renamed and
//! tables retargeted without searching the rendered SQL.

use crate::value::Value;
use std::collections::BTreeSet;

/// One piece of SQL text
#[derive(Debug, Clone, PartialEq)]
pub enum SqlPart {
    /// Verbatim SQL
    Raw(String),
    /// A quoted column reference, optionally qualified by a table alias
    Column {
        qualifier: Option<String>,
        name: String,
    },
    /// A literal bound as a parameter (or inlined)
    Param(Value),
    /// `EXISTS (<select>)`
    Exists(Box<SelectStatement>),
}

/// A run of SQL parts rendered back to back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlText(pub Vec<SqlPart>);

impl SqlText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Self(vec![SqlPart::Raw(sql.into())])
    }

    pub fn column(qualifier: Option<&str>, name: impl Into<String>) -> Self {
        Self(vec![SqlPart::Column {
            qualifier: qualifier.map(str::to_string),
            name: name.into(),
        }])
    }

    pub fn param(value: Value) -> Self {
        Self(vec![SqlPart::Param(value)])
    }

    pub fn exists(select: SelectStatement) -> Self {
        Self(vec![SqlPart::Exists(Box::new(select))])
    }

    pub fn parts(&self) -> &[SqlPart] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, part: SqlPart) {
        self.0.push(part);
    }

    pub fn push_raw(&mut self, sql: impl Into<String>) {
        self.0.push(SqlPart::Raw(sql.into()));
    }

    pub fn append(&mut self, other: SqlText) {
        self.0.extend(other.0);
    }

    /// Builder form of [`SqlText::push_raw`]
    pub fn then_raw(mut self, sql: impl Into<String>) -> Self {
        self.push_raw(sql);
        self
    }

    /// Builder form of [`SqlText::append`]
    pub fn then(mut self, other: SqlText) -> Self {
        self.append(other);
        self
    }

    /// Parameters in emission order
    pub fn parameters(&self) -> Vec<&Value> {
        let mut out = Vec::new();
        self.collect_parameters(&mut out);
        out
    }

    fn collect_parameters<'a>(&'a self, out: &mut Vec<&'a Value>) {
        for part in &self.0 {
            match part {
                SqlPart::Param(value) => out.push(value),
                SqlPart::Exists(select) => select.collect_parameters(out),
                _ => {}
            }
        }
    }

    fn collect_aliases(&self, out: &mut BTreeSet<String>) {
        for part in &self.0 {
            if let SqlPart::Exists(select) = part {
                select.collect_aliases(out);
            }
        }
    }

    fn collect_columns(&self, qualifier: &str, out: &mut BTreeSet<String>) {
        for part in &self.0 {
            match part {
                SqlPart::Column {
                    qualifier: Some(q),
                    name,
                } if q == qualifier => {
                    out.insert(name.clone());
                }
                SqlPart::Exists(select) => select.collect_columns(qualifier, out),
                _ => {}
            }
        }
    }

    fn rename_qualifier(&mut self, from: &str, to: &str) {
        for part in &mut self.0 {
            match part {
                SqlPart::Column {
                    qualifier: Some(qualifier),
                    ..
                } if qualifier == from => *qualifier = to.to_string(),
                SqlPart::Exists(select) => select.rename_alias(from, to),
                _ => {}
            }
        }
    }

    fn replace_table(&mut self, from: &str, to: &str) {
        for part in &mut self.0 {
            if let SqlPart::Exists(select) = part {
                select.replace_table(from, to);
            }
        }
    }
}

/// A table in FROM or JOIN position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
        }
    }

    pub fn aliased(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: Some(alias.into()),
        }
    }

    /// The name columns of this table are qualified with
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub on: SqlText,
}

/// One entry of the select list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: SqlText,
    /// Output name (`AS "alias"`)
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(expr: SqlText) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: SqlText, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// Name of the column this item produces, if it is knowable
    pub fn output_name(&self) -> Option<&str> {
        if let Some(alias) = &self.alias {
            return Some(alias);
        }
        match self.expr.parts() {
            [SqlPart::Column { name, .. }] => Some(name),
            _ => None,
        }
    }
}

/// A single SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub distinct: bool,
    pub items: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<Join>,
    /// Conjuncts, rendered joined by AND
    pub where_clause: Vec<SqlText>,
    pub order_by: Vec<SqlText>,
}

impl SelectStatement {
    pub fn new(from: TableRef) -> Self {
        Self {
            distinct: false,
            items: Vec::new(),
            from,
            joins: Vec::new(),
            where_clause: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Qualifier of the FROM table
    pub fn alias(&self) -> &str {
        self.from.qualifier()
    }

    pub fn push_item(&mut self, item: SelectItem) {
        self.items.push(item);
    }

    pub fn push_join(&mut self, join: Join) {
        self.joins.push(join);
    }

    pub fn push_where(&mut self, conjunct: SqlText) {
        self.where_clause.push(conjunct);
    }

    /// Every table alias declared in this statement or its subqueries
    pub fn aliases(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_aliases(&mut out);
        out
    }

    fn collect_aliases(&self, out: &mut BTreeSet<String>) {
        out.insert(self.from.qualifier().to_string());
        for join in &self.joins {
            out.insert(join.table.qualifier().to_string());
            join.on.collect_aliases(out);
        }
        for text in self.texts() {
            text.collect_aliases(out);
        }
    }

    /// Columns of `qualifier` read by the WHERE conjuncts, subqueries included
    pub fn filter_columns(&self, qualifier: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for conjunct in &self.where_clause {
            conjunct.collect_columns(qualifier, &mut out);
        }
        out
    }

    fn collect_columns(&self, qualifier: &str, out: &mut BTreeSet<String>) {
        for text in self.texts().chain(self.joins.iter().map(|j| &j.on)) {
            text.collect_columns(qualifier, out);
        }
    }

    fn tables_mut(&mut self) -> impl Iterator<Item = &mut TableRef> {
        std::iter::once(&mut self.from).chain(self.joins.iter_mut().map(|j| &mut j.table))
    }

    /// Rename a table alias everywhere it is declared or referenced
    pub fn rename_alias(&mut self, from: &str, to: &str) {
        for table in self.tables_mut() {
            if table.alias.as_deref() == Some(from) {
                table.alias = Some(to.to_string());
            }
        }
        for join in &mut self.joins {
            join.on.rename_qualifier(from, to);
        }
        for text in self.texts_mut() {
            text.rename_qualifier(from, to);
        }
    }

    /// Retarget every reference to table `from`, including subqueries
    pub fn replace_table(&mut self, from: &str, to: &str) {
        for table in self.tables_mut() {
            if table.table == from {
                table.table = to.to_string();
            }
        }
        for join in &mut self.joins {
            join.on.replace_table(from, to);
        }
        for text in self.texts_mut() {
            text.replace_table(from, to);
        }
    }

    /// Every table named in this statement or its subqueries
    pub fn tables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables(&self, out: &mut BTreeSet<String>) {
        out.insert(self.from.table.clone());
        for join in &self.joins {
            out.insert(join.table.table.clone());
        }
        for text in self.texts().chain(self.joins.iter().map(|j| &j.on)) {
            for part in text.parts() {
                if let SqlPart::Exists(select) = part {
                    select.collect_tables(out);
                }
            }
        }
    }

    fn collect_parameters<'a>(&'a self, out: &mut Vec<&'a Value>) {
        for item in &self.items {
            item.expr.collect_parameters(out);
        }
        for join in &self.joins {
            join.on.collect_parameters(out);
        }
        for text in self.where_clause.iter().chain(&self.order_by) {
            text.collect_parameters(out);
        }
    }

    /// Parameters in the order a writer emits them
    pub fn parameters(&self) -> Vec<&Value> {
        let mut out = Vec::new();
        self.collect_parameters(&mut out);
        out
    }

    fn texts(&self) -> impl Iterator<Item = &SqlText> {
        self.items
            .iter()
            .map(|i| &i.expr)
            .chain(&self.where_clause)
            .chain(&self.order_by)
    }

    fn texts_mut(&mut self) -> impl Iterator<Item = &mut SqlText> {
        self.items
            .iter_mut()
            .map(|i| &mut i.expr)
            .chain(&mut self.where_clause)
            .chain(&mut self.order_by)
    }
}
