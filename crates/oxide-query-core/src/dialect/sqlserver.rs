//! Microsoft SQL Server dialect.

use super::{
    keywords, select_alias_modes, standard_function_name, write_columns, write_grouping,
    write_joins, write_order_by, write_select_head, write_set_list, write_values, write_where,
    Dialect, DialectKind,
};
use crate::condition::LikeKind;
use crate::expr::{Expr, FunctionKind};
use crate::params::{Parameters, PlaceholderStyle};
use crate::query::{DeleteStatement, InsertStatement, SelectStatement, TableHint, UpdateStatement};
use crate::value::SqlValue;

/// SQL Server: `[quoted]` names, `@0` placeholders, `TOP n`, `OUTPUT`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Creates the dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn write_hints(sql: &mut String, hints: &[TableHint]) {
        if hints.is_empty() {
            return;
        }
        sql.push_str(" WITH(");
        for (i, hint) in hints.iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            sql.push_str(hint.as_str());
        }
        sql.push(')');
    }

    /// ` OUTPUT INSERTED.a,INSERTED.b`
    fn write_output(
        &self,
        sql: &mut String,
        source: &str,
        exprs: &[Expr],
        params: Option<&mut Parameters>,
    ) {
        if exprs.is_empty() {
            return;
        }
        let mut params = params;
        sql.push_str(" OUTPUT ");
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            match expr {
                Expr::Column(column) => {
                    sql.push_str(source);
                    sql.push('.');
                    self.write_identifier(sql, column.name, column.enclose);
                }
                other => other.render(sql, self, false, params.as_deref_mut()),
            }
        }
    }
}

fn quoted(sql: &mut String, text: &str) {
    sql.push('\'');
    sql.push_str(&text.replace('\'', "''"));
    sql.push('\'');
}

impl Dialect for SqlServerDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::AtZero
    }

    fn quote_chars(&self) -> (char, char) {
        ('[', ']')
    }

    fn is_reserved(&self, word: &str) -> bool {
        keywords::contains(keywords::COMMON, word) || keywords::contains(keywords::SQL_SERVER, word)
    }

    fn write_literal(&self, sql: &mut String, value: &SqlValue) {
        match value {
            SqlValue::Null => sql.push_str("NULL"),
            SqlValue::Bool(v) => sql.push(if *v { '1' } else { '0' }),
            SqlValue::TinyInt(v) => sql.push_str(&v.to_string()),
            SqlValue::SmallInt(v) => sql.push_str(&v.to_string()),
            SqlValue::Int(v) => sql.push_str(&v.to_string()),
            SqlValue::BigInt(v) => sql.push_str(&v.to_string()),
            SqlValue::Real(v) if v.is_finite() => sql.push_str(&v.to_string()),
            SqlValue::Double(v) if v.is_finite() => sql.push_str(&v.to_string()),
            // SQL Server floats have no NaN or infinities.
            SqlValue::Real(_) | SqlValue::Double(_) => sql.push_str("NULL"),
            SqlValue::Text(v) => {
                sql.push('N');
                quoted(sql, v);
            }
            SqlValue::Guid(v) => quoted(sql, &v.to_string()),
            SqlValue::Blob(v) => {
                sql.push_str("0x");
                for byte in v {
                    sql.push_str(&format!("{byte:02X}"));
                }
            }
            SqlValue::Date(v) => quoted(sql, &v.format("%Y-%m-%d").to_string()),
            SqlValue::Time(v) => quoted(sql, &v.format("%H:%M:%S%.f").to_string()),
            SqlValue::DateTime(v) => quoted(sql, &v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            SqlValue::DateTimeOffset(v) => {
                quoted(sql, &v.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string());
            }
        }
    }

    fn function_name<'a>(&self, kind: &'a FunctionKind) -> &'a str {
        match kind {
            FunctionKind::Length => "LEN",
            FunctionKind::CurrentTimestamp => "GETDATE",
            FunctionKind::NewGuid => "NEWID",
            other => standard_function_name(other),
        }
    }

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
        let fold = kind.is_case_insensitive();
        if fold {
            sql.push_str("LOWER(");
        }
        expr.render(sql, self, use_alias, params.as_deref_mut());
        if fold {
            sql.push(')');
        }
        sql.push_str(if kind.is_negated() { " NOT LIKE " } else { " LIKE " });
        if fold {
            sql.push_str("LOWER(");
        }
        pattern.render(sql, self, use_alias, params);
        if fold {
            sql.push(')');
        }
    }

    fn write_select(
        &self,
        sql: &mut String,
        statement: &SelectStatement,
        outer_use_alias: bool,
        params: Option<&mut Parameters>,
    ) {
        let mut params = params;
        let (use_alias, order_alias) = select_alias_modes(statement, outer_use_alias);

        for (union, core) in statement.parts() {
            if let Some(union) = union {
                sql.push(' ');
                sql.push_str(union.as_str());
                sql.push(' ');
            }
            let top = core.top.map(|n| format!("TOP {n} "));
            write_select_head(sql, self, core, top.as_deref(), use_alias, params.as_deref_mut());
            if let Some(from) = &core.from {
                sql.push_str(" FROM ");
                self.write_table(sql, from, use_alias);
                Self::write_hints(sql, &core.hints);
            }
            write_joins(sql, self, &core.joins, use_alias, params.as_deref_mut());
            write_where(sql, self, core.where_.as_ref(), use_alias, params.as_deref_mut());
            write_grouping(sql, self, core, use_alias, params.as_deref_mut());
        }

        write_order_by(sql, self, &statement.order_by, order_alias, params);

        if !statement.options.is_empty() {
            let options: Vec<String> = statement.options.iter().map(|o| o.to_sql()).collect();
            sql.push_str(" OPTION(");
            sql.push_str(&options.join(","));
            sql.push(')');
        }
    }

    fn write_insert(
        &self,
        sql: &mut String,
        statement: &InsertStatement,
        params: Option<&mut Parameters>,
    ) {
        let mut params = params;
        sql.push_str("INSERT INTO ");
        self.write_table_name(sql, &statement.table);
        sql.push('(');
        write_columns(sql, self, &statement.assignments);
        sql.push(')');
        self.write_output(sql, "INSERTED", &statement.returning, params.as_deref_mut());
        sql.push_str(" VALUES(");
        write_values(sql, self, &statement.assignments, params);
        sql.push(')');
    }

    fn write_update(
        &self,
        sql: &mut String,
        statement: &UpdateStatement,
        params: Option<&mut Parameters>,
    ) {
        let mut params = params;
        let use_alias = statement.uses_alias();

        sql.push_str("UPDATE ");
        if use_alias {
            sql.push_str(statement.table.alias());
        } else {
            self.write_table_name(sql, &statement.table);
        }
        write_set_list(sql, self, &statement.assignments, use_alias, params.as_deref_mut());
        self.write_output(sql, "INSERTED", &statement.returning, params.as_deref_mut());
        if use_alias {
            sql.push_str(" FROM ");
            self.write_table(sql, &statement.table, true);
            for table in &statement.from {
                sql.push(',');
                self.write_table(sql, table, true);
            }
        }
        write_where(sql, self, statement.where_.as_ref(), use_alias, params);
    }

    fn write_delete(
        &self,
        sql: &mut String,
        statement: &DeleteStatement,
        params: Option<&mut Parameters>,
    ) {
        let mut params = params;
        let use_alias = statement.uses_alias();

        sql.push_str("DELETE ");
        if use_alias {
            sql.push_str(statement.table.alias());
        } else {
            sql.push_str("FROM ");
            self.write_table_name(sql, &statement.table);
        }
        self.write_output(sql, "DELETED", &statement.returning, params.as_deref_mut());
        if use_alias {
            sql.push_str(" FROM ");
            self.write_table(sql, &statement.table, true);
            write_joins(sql, self, &statement.joins, true, params.as_deref_mut());
        }
        write_where(sql, self, statement.where_.as_ref(), use_alias, params);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;

    fn literal(value: SqlValue) -> String {
        let mut sql = String::new();
        SqlServerDialect.write_literal(&mut sql, &value);
        sql
    }

    #[test]
    fn test_literals() {
        assert_eq!(literal(SqlValue::Null), "NULL");
        assert_eq!(literal(SqlValue::Bool(true)), "1");
        assert_eq!(literal(SqlValue::Int(-4)), "-4");
        assert_eq!(literal(SqlValue::Double(2.5)), "2.5");
        assert_eq!(literal(SqlValue::Double(f64::NAN)), "NULL");
        assert_eq!(literal(SqlValue::Text("O'Hara".into())), "N'O''Hara'");
        assert_eq!(literal(SqlValue::Blob(vec![0x0a, 0xff])), "0x0AFF");
        assert_eq!(
            literal(SqlValue::Guid(Uuid::nil())),
            "'00000000-0000-0000-0000-000000000000'"
        );
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(literal(SqlValue::Date(date)), "'2024-02-29'");
        assert_eq!(
            literal(SqlValue::DateTime(date.and_hms_opt(13, 5, 0).unwrap())),
            "'2024-02-29T13:05:00'"
        );
    }

    #[test]
    fn test_function_names() {
        assert_eq!(SqlServerDialect.function_name(&FunctionKind::Length), "LEN");
        assert_eq!(SqlServerDialect.function_name(&FunctionKind::Sum), "SUM");
        assert_eq!(
            SqlServerDialect.function_name(&FunctionKind::Custom("ABS".into())),
            "ABS"
        );
    }
}
