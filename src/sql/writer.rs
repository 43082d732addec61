//! Rendering structural fragments to SQL text.

use crate::sql::dialect::Dialect;
use crate::sql::fragment::{SelectStatement, SqlPart, SqlText};
use crate::sql::query::CompiledQuery;
use crate::value::Value;

/// What to do with literal parameters while rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterMode {
    /// Emit placeholders and collect the values
    Bind,
    /// Write the values as SQL literals
    Inline,
}

/// Accumulates SQL text and bound parameters.
///
/// Placeholders are numbered in emission order, so fragments compiled
/// separately can be combined without their parameters colliding.
pub struct SqlWriter<'a> {
    dialect: &'a Dialect,
    mode: ParameterMode,
    sql: String,
    parameters: Vec<Value>,
}

impl<'a> SqlWriter<'a> {
    pub fn new(dialect: &'a Dialect, mode: ParameterMode) -> Self {
        Self {
            dialect,
            mode,
            sql: String::new(),
            parameters: Vec::new(),
        }
    }

    pub fn write_str(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub fn write_identifier(&mut self, identifier: &str) {
        let quoted = self.dialect.quote_identifier(identifier);
        self.sql.push_str(&quoted);
    }

    pub fn write_param(&mut self, value: &Value) {
        match self.mode {
            ParameterMode::Inline => self.sql.push_str(&value.to_sql_literal()),
            ParameterMode::Bind => {
                self.parameters.push(value.clone());
                let placeholder = self.dialect.placeholder(self.parameters.len());
                self.sql.push_str(&placeholder);
            }
        }
    }

    pub fn write_text(&mut self, text: &SqlText) {
        for part in text.parts() {
            match part {
                SqlPart::Raw(sql) => self.write_str(sql),
                SqlPart::Column { qualifier, name } => {
                    if let Some(qualifier) = qualifier {
                        self.write_identifier(qualifier);
                        self.write_str(".");
                    }
                    self.write_identifier(name);
                }
                SqlPart::Param(value) => self.write_param(value),
                SqlPart::Exists(select) => {
                    self.write_str("EXISTS (");
                    self.write_select(select);
                    self.write_str(")");
                }
            }
        }
    }

    fn write_list(&mut self, texts: &[SqlText], separator: &str) {
        for (i, text) in texts.iter().enumerate() {
            if i > 0 {
                self.write_str(separator);
            }
            self.write_text(text);
        }
    }

    pub fn write_select(&mut self, select: &SelectStatement) {
        self.write_str("SELECT ");
        if select.distinct {
            self.write_str("DISTINCT ");
        }
        for (i, item) in select.items.iter().enumerate() {
            if i > 0 {
                self.write_str(", ");
            }
            self.write_text(&item.expr);
            if let Some(alias) = &item.alias {
                self.write_str(" AS ");
                self.write_identifier(alias);
            }
        }

        self.write_str(" FROM ");
        self.write_identifier(&select.from.table);
        if let Some(alias) = &select.from.alias {
            self.write_str(" AS ");
            self.write_identifier(alias);
        }

        for join in &select.joins {
            self.write_str(" ");
            self.write_str(join.kind.keyword());
            self.write_str(" ");
            self.write_identifier(&join.table.table);
            if let Some(alias) = &join.table.alias {
                self.write_str(" AS ");
                self.write_identifier(alias);
            }
            self.write_str(" ON ");
            self.write_text(&join.on);
        }

        if !select.where_clause.is_empty() {
            self.write_str(" WHERE ");
            self.write_list(&select.where_clause, " AND ");
        }

        if !select.order_by.is_empty() {
            self.write_str(" ORDER BY ");
            self.write_list(&select.order_by, ", ");
        }
    }

    pub fn finish(self) -> CompiledQuery {
        CompiledQuery {
            sql: self.sql,
            parameters: self.parameters,
        }
    }
}

/// Render one statement
pub fn render_select(
    select: &SelectStatement,
    dialect: &Dialect,
    mode: ParameterMode,
) -> CompiledQuery {
    let mut writer = SqlWriter::new(dialect, mode);
    writer.write_select(select);
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::fragment::{Join, JoinKind, SelectItem, TableRef};

    fn statement() -> SelectStatement {
        let mut select = SelectStatement::new(TableRef::aliased("menus", "m"));
        select.push_item(SelectItem::new(SqlText::column(Some("m"), "Id")));
        select.push_item(SelectItem::aliased(
            SqlText::column(Some("m"), "Name"),
            "Title",
        ));
        select.push_join(Join {
            kind: JoinKind::Inner,
            table: TableRef::new("mytree"),
            on: SqlText::column(Some("m"), "Pid")
                .then_raw(" = ")
                .then(SqlText::column(Some("mytree"), "Id")),
        });
        select.push_where(
            SqlText::column(Some("m"), "Group")
                .then_raw(" = ")
                .then(SqlText::param(Value::Int32(0))),
        );
        select.push_where(
            SqlText::raw("level = ").then(SqlText::param(Value::Int32(2))),
        );
        select
            .order_by
            .push(SqlText::column(Some("m"), "Name").then_raw(" DESC"));
        select
    }

    #[test]
    fn test_bind_numbered() {
        let compiled = render_select(&statement(), &Dialect::postgres(), ParameterMode::Bind);
        assert_eq!(
            compiled.sql,
            "SELECT \"m\".\"Id\", \"m\".\"Name\" AS \"Title\" FROM \"menus\" AS \"m\" \
             JOIN \"mytree\" ON \"m\".\"Pid\" = \"mytree\".\"Id\" \
             WHERE \"m\".\"Group\" = $1 AND level = $2 ORDER BY \"m\".\"Name\" DESC"
        );
        assert_eq!(compiled.parameters, vec![Value::Int32(0), Value::Int32(2)]);
    }

    #[test]
    fn test_bind_question() {
        let compiled = render_select(&statement(), &Dialect::sqlite(), ParameterMode::Bind);
        assert!(compiled.sql.contains("\"m\".\"Group\" = ? AND level = ?"));
        assert_eq!(compiled.parameters.len(), 2);
    }

    #[test]
    fn test_inline() {
        let mut select = SelectStatement::new(TableRef::aliased("users", "u"));
        select.distinct = true;
        select.push_item(SelectItem::new(SqlText::column(Some("u"), "Name")));
        select.push_where(
            SqlText::column(Some("u"), "Name")
                .then_raw(" = ")
                .then(SqlText::param(Value::from("O'Hara"))),
        );

        let compiled = render_select(&select, &Dialect::sqlite(), ParameterMode::Inline);
        assert_eq!(
            compiled.sql,
            "SELECT DISTINCT \"u\".\"Name\" FROM \"users\" AS \"u\" WHERE \"u\".\"Name\" = 'O''Hara'"
        );
        assert!(compiled.parameters.is_empty());
    }
}
