//! SQL dialects.
//!
//! A [`Dialect`] turns a statement template into SQL text. The clause
//! emitters both supported databases agree on are provided methods and
//! helpers here; each dialect implements the points where they differ:
//! quoting, literal syntax, function names, `TOP` vs `LIMIT`, `OUTPUT` vs
//! `RETURNING`, hints and locking clauses.
//!
//! Every emitter takes the alias mode of the statement being rendered and an
//! optional parameter sink. With a sink, values become placeholders numbered
//! in text order; without one they are inlined as escaped literals.

mod keywords;
mod postgres;
mod sqlserver;

use std::fmt;

pub use postgres::PostgresDialect;
pub use sqlserver::SqlServerDialect;

use crate::condition::{Condition, LikeKind};
use crate::expr::{Expr, FunctionCall, FunctionKind};
use crate::params::{Parameters, PlaceholderStyle};
use crate::query::{
    Assignment, DeleteStatement, InsertStatement, Join, OrderBy, SelectCore, SelectStatement,
    SortOrder, Statement, TruncateStatement, UpdateStatement,
};
use crate::schema::{ColumnRef, Table};
use crate::value::SqlValue;

/// Identifies a dialect, e.g. as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    /// Microsoft SQL Server.
    SqlServer,
    /// PostgreSQL.
    Postgres,
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SqlServer => "sqlserver",
            Self::Postgres => "postgres",
        })
    }
}

/// SQL generation for one database.
pub trait Dialect: Send + Sync {
    /// Which dialect this is.
    fn kind(&self) -> DialectKind;

    /// How bound parameters are spelled.
    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Opening and closing identifier quote characters.
    fn quote_chars(&self) -> (char, char);

    /// Writes `value` as an escaped literal.
    fn write_literal(&self, sql: &mut String, value: &SqlValue);

    /// SQL name of a function.
    fn function_name<'a>(&self, kind: &'a FunctionKind) -> &'a str;

    /// Writes a SELECT.
    ///
    /// `outer_use_alias` is set when the statement is nested in one whose
    /// columns are alias-qualified.
    fn write_select(
        &self,
        sql: &mut String,
        statement: &SelectStatement,
        outer_use_alias: bool,
        params: Option<&mut Parameters>,
    );

    /// Writes an INSERT.
    fn write_insert(
        &self,
        sql: &mut String,
        statement: &InsertStatement,
        params: Option<&mut Parameters>,
    );

    /// Writes an UPDATE.
    fn write_update(
        &self,
        sql: &mut String,
        statement: &UpdateStatement,
        params: Option<&mut Parameters>,
    );

    /// Writes a DELETE.
    fn write_delete(
        &self,
        sql: &mut String,
        statement: &DeleteStatement,
        params: Option<&mut Parameters>,
    );

    /// Whether `word` is reserved.
    fn is_reserved(&self, word: &str) -> bool {
        keywords::contains(keywords::COMMON, word)
    }

    /// Whether `name` must be quoted to be used as an identifier.
    fn needs_quoting(&self, name: &str) -> bool {
        !is_plain_identifier(name) || self.is_reserved(name)
    }

    /// Writes an identifier, quoted when `enclose` is set or when required.
    fn write_identifier(&self, sql: &mut String, name: &str, enclose: bool) {
        if !enclose && !self.needs_quoting(name) {
            sql.push_str(name);
            return;
        }
        let (open, close) = self.quote_chars();
        sql.push(open);
        for ch in name.chars() {
            if ch == close {
                sql.push(close);
            }
            sql.push(ch);
        }
        sql.push(close);
    }

    /// Writes `schema.name`.
    fn write_table_name(&self, sql: &mut String, table: &Table) {
        if let Some(schema) = table.schema() {
            self.write_identifier(sql, schema, table.is_enclosed());
            sql.push('.');
        }
        self.write_identifier(sql, table.name(), table.is_enclosed());
    }

    /// Writes a table reference, with its alias when `use_alias` is set.
    fn write_table(&self, sql: &mut String, table: &Table, use_alias: bool) {
        self.write_table_name(sql, table);
        if use_alias {
            sql.push_str(" AS ");
            sql.push_str(table.alias());
        }
    }

    /// Writes a column reference, alias-qualified when `use_alias` is set.
    fn write_column(&self, sql: &mut String, column: &ColumnRef, use_alias: bool) {
        if use_alias {
            sql.push_str(column.table.alias());
            sql.push('.');
        }
        self.write_identifier(sql, column.name, column.enclose);
    }

    /// Writes a function call.
    fn write_function(
        &self,
        sql: &mut String,
        call: &FunctionCall,
        use_alias: bool,
        params: Option<&mut Parameters>,
    ) {
        if call.kind == FunctionKind::CountAll {
            sql.push_str("COUNT(*)");
            return;
        }
        sql.push_str(self.function_name(&call.kind));
        sql.push('(');
        if call.kind == FunctionKind::CountDistinct {
            sql.push_str("DISTINCT ");
        }
        write_list(sql, self, &call.args, use_alias, params);
        sql.push(')');
    }

    /// Writes a pattern match.
    fn write_like(
        &self,
        sql: &mut String,
        expr: &Expr,
        pattern: &Expr,
        kind: LikeKind,
        use_alias: bool,
        params: Option<&mut Parameters>,
    ) {
        let mut params = params;
        expr.render(sql, self, use_alias, params.as_deref_mut());
        sql.push_str(match kind {
            LikeKind::Like => " LIKE ",
            LikeKind::NotLike => " NOT LIKE ",
            LikeKind::ILike => " ILIKE ",
            LikeKind::NotILike => " NOT ILIKE ",
        });
        pattern.render(sql, self, use_alias, params);
    }

    /// Writes a TRUNCATE.
    fn write_truncate(&self, sql: &mut String, statement: &TruncateStatement) {
        sql.push_str("TRUNCATE TABLE ");
        self.write_table_name(sql, &statement.table);
    }

    /// Writes any statement.
    fn write_statement(
        &self,
        sql: &mut String,
        statement: &Statement,
        outer_use_alias: bool,
        params: Option<&mut Parameters>,
    ) {
        match statement {
            Statement::Select(s) => self.write_select(sql, s, outer_use_alias, params),
            Statement::Insert(s) => self.write_insert(sql, s, params),
            Statement::Update(s) => self.write_update(sql, s, params),
            Statement::Delete(s) => self.write_delete(sql, s, params),
            Statement::Truncate(s) => self.write_truncate(sql, s),
        }
    }

    /// Renders a top-level statement.
    fn generate(&self, statement: &Statement, params: Option<&mut Parameters>) -> String {
        let mut sql = String::new();
        self.write_statement(&mut sql, statement, false, params);
        sql
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Function names shared by both dialects.
pub(crate) fn standard_function_name(kind: &FunctionKind) -> &str {
    match kind {
        FunctionKind::CountAll | FunctionKind::Count | FunctionKind::CountDistinct => "COUNT",
        FunctionKind::Sum => "SUM",
        FunctionKind::Avg => "AVG",
        FunctionKind::Min => "MIN",
        FunctionKind::Max => "MAX",
        FunctionKind::Coalesce => "COALESCE",
        FunctionKind::Lower => "LOWER",
        FunctionKind::Upper => "UPPER",
        FunctionKind::Length => "LENGTH",
        FunctionKind::CurrentTimestamp => "CURRENT_TIMESTAMP",
        FunctionKind::NewGuid => "NEWID",
        FunctionKind::Custom(name) => name,
    }
}

/// Writes comma-separated expressions.
pub(crate) fn write_list<D: Dialect + ?Sized>(
    sql: &mut String,
    dialect: &D,
    exprs: &[Expr],
    use_alias: bool,
    params: Option<&mut Parameters>,
) {
    let mut params = params;
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        expr.render(sql, dialect, use_alias, params.as_deref_mut());
    }
}

/// Writes the column list of an INSERT, without parentheses.
pub(crate) fn write_columns<D: Dialect + ?Sized>(
    sql: &mut String,
    dialect: &D,
    assignments: &[Assignment],
) {
    for (i, assignment) in assignments.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        dialect.write_identifier(sql, assignment.column.name, assignment.column.enclose);
    }
}

/// Writes the value list of an INSERT, without parentheses.
pub(crate) fn write_values<D: Dialect + ?Sized>(
    sql: &mut String,
    dialect: &D,
    assignments: &[Assignment],
    params: Option<&mut Parameters>,
) {
    let mut params = params;
    for (i, assignment) in assignments.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        assignment
            .value
            .render(sql, dialect, false, params.as_deref_mut());
    }
}

/// Writes ` SET a=x,b=y`. Targets are never qualified.
pub(crate) fn write_set_list<D: Dialect + ?Sized>(
    sql: &mut String,
    dialect: &D,
    assignments: &[Assignment],
    use_alias: bool,
    params: Option<&mut Parameters>,
) {
    let mut params = params;
    sql.push_str(" SET ");
    for (i, assignment) in assignments.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        dialect.write_identifier(sql, assignment.column.name, assignment.column.enclose);
        sql.push('=');
        assignment
            .value
            .render(sql, dialect, use_alias, params.as_deref_mut());
    }
}

/// Writes `SELECT [DISTINCT ]` followed by `top_clause` and the select list.
pub(crate) fn write_select_head<D: Dialect + ?Sized>(
    sql: &mut String,
    dialect: &D,
    core: &SelectCore,
    top_clause: Option<&str>,
    use_alias: bool,
    params: Option<&mut Parameters>,
) {
    sql.push_str("SELECT ");
    if core.distinct {
        sql.push_str("DISTINCT ");
    }
    if let Some(top) = top_clause {
        sql.push_str(top);
    }
    write_list(sql, dialect, &core.fields, use_alias, params);
}

/// Writes the joins of a body.
pub(crate) fn write_joins<D: Dialect + ?Sized>(
    sql: &mut String,
    dialect: &D,
    joins: &[Join],
    use_alias: bool,
    params: Option<&mut Parameters>,
) {
    let mut params = params;
    for join in joins {
        sql.push(' ');
        sql.push_str(join.kind.as_str());
        sql.push(' ');
        dialect.write_table(sql, &join.table, use_alias);
        sql.push_str(" ON ");
        join.on.render(sql, dialect, use_alias, params.as_deref_mut());
    }
}

/// Writes ` WHERE condition` when there is one.
pub(crate) fn write_where<D: Dialect + ?Sized>(
    sql: &mut String,
    dialect: &D,
    condition: Option<&Condition>,
    use_alias: bool,
    params: Option<&mut Parameters>,
) {
    if let Some(condition) = condition {
        sql.push_str(" WHERE ");
        condition.render(sql, dialect, use_alias, params);
    }
}

/// Writes ` GROUP BY ...` and ` HAVING ...` of a body.
pub(crate) fn write_grouping<D: Dialect + ?Sized>(
    sql: &mut String,
    dialect: &D,
    core: &SelectCore,
    use_alias: bool,
    params: Option<&mut Parameters>,
) {
    let mut params = params;
    if !core.group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        write_list(sql, dialect, &core.group_by, use_alias, params.as_deref_mut());
    }
    if let Some(having) = &core.having {
        sql.push_str(" HAVING ");
        having.render(sql, dialect, use_alias, params);
    }
}

/// Writes ` ORDER BY ...` when there are terms.
pub(crate) fn write_order_by<D: Dialect + ?Sized>(
    sql: &mut String,
    dialect: &D,
    order_by: &[OrderBy],
    use_alias: bool,
    params: Option<&mut Parameters>,
) {
    if order_by.is_empty() {
        return;
    }
    let mut params = params;
    sql.push_str(" ORDER BY ");
    for (i, term) in order_by.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        term.expr.render(sql, dialect, use_alias, params.as_deref_mut());
        if term.order == SortOrder::Desc {
            sql.push_str(" DESC");
        }
    }
}

/// Alias mode of a SELECT and of its ORDER BY.
///
/// ORDER BY of a UNION chain refers to result columns, which carry no alias.
pub(crate) fn select_alias_modes(statement: &SelectStatement, outer_use_alias: bool) -> (bool, bool) {
    let use_alias = outer_use_alias || statement.uses_alias();
    (use_alias, use_alias && statement.unions.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifiers() {
        assert!(is_plain_identifier("Invoice"));
        assert!(is_plain_identifier("_x1"));
        assert!(!is_plain_identifier("1abc"));
        assert!(!is_plain_identifier("Order Line"));
        assert!(!is_plain_identifier(""));
    }

    #[test]
    fn test_quoting_rules() {
        let mut sql = String::new();
        SqlServerDialect.write_identifier(&mut sql, "Order", false);
        sql.push(' ');
        SqlServerDialect.write_identifier(&mut sql, "Invoice", true);
        sql.push(' ');
        SqlServerDialect.write_identifier(&mut sql, "a]b", false);
        assert_eq!(sql, "[Order] [Invoice] [a]]b]");

        let mut sql = String::new();
        PostgresDialect.write_identifier(&mut sql, "invoice", false);
        sql.push(' ');
        PostgresDialect.write_identifier(&mut sql, "Invoice", false);
        sql.push(' ');
        PostgresDialect.write_identifier(&mut sql, "limit", false);
        assert_eq!(sql, r#"invoice "Invoice" "limit""#);
    }

    #[test]
    fn test_dialect_is_object_safe() {
        let dialects: Vec<Box<dyn Dialect>> = vec![Box::new(SqlServerDialect), Box::new(PostgresDialect)];
        let kinds: Vec<_> = dialects.iter().map(|d| d.kind()).collect();
        assert_eq!(kinds, vec![DialectKind::SqlServer, DialectKind::Postgres]);
    }
}
