//! PostgreSQL dialect.

use super::{
    keywords, select_alias_modes, standard_function_name, write_columns, write_grouping,
    write_joins, write_list, write_order_by, write_select_head, write_set_list, write_values,
    write_where, Dialect, DialectKind,
};
use crate::condition::Condition;
use crate::expr::{Expr, FunctionKind};
use crate::params::{Parameters, PlaceholderStyle};
use crate::query::{
    DeleteStatement, ForLock, InsertStatement, LockStrength, LockWait, SelectStatement,
    UpdateStatement,
};
use crate::value::SqlValue;

/// PostgreSQL: `"quoted"` names, `$1` placeholders, `LIMIT n`, `RETURNING`.
///
/// Unquoted identifiers are folded to lower case by the server, so names
/// containing upper-case letters are always quoted.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates the dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn write_returning(
        &self,
        sql: &mut String,
        exprs: &[Expr],
        use_alias: bool,
        params: Option<&mut Parameters>,
    ) {
        if exprs.is_empty() {
            return;
        }
        sql.push_str(" RETURNING ");
        write_list(sql, self, exprs, use_alias, params);
    }

    fn write_lock(&self, sql: &mut String, lock: &ForLock, use_alias: bool) {
        sql.push_str(match lock.strength {
            LockStrength::Update => " FOR UPDATE",
            LockStrength::NoKeyUpdate => " FOR NO KEY UPDATE",
            LockStrength::Share => " FOR SHARE",
        });
        if !lock.of.is_empty() {
            sql.push_str(" OF ");
            for (i, table) in lock.of.iter().enumerate() {
                if i > 0 {
                    sql.push(',');
                }
                if use_alias {
                    sql.push_str(table.alias());
                } else {
                    self.write_identifier(sql, table.name(), table.is_enclosed());
                }
            }
        }
        match lock.wait {
            LockWait::Wait => {}
            LockWait::NoWait => sql.push_str(" NOWAIT"),
            LockWait::SkipLocked => sql.push_str(" SKIP LOCKED"),
        }
    }
}

fn quoted(sql: &mut String, text: &str) {
    sql.push('\'');
    sql.push_str(&text.replace('\'', "''"));
    sql.push('\'');
}

fn cast(sql: &mut String, text: &str, type_name: &str) {
    quoted(sql, text);
    sql.push_str("::");
    sql.push_str(type_name);
}

fn write_float(sql: &mut String, value: f64, type_name: &str) {
    if value.is_nan() {
        cast(sql, "NaN", type_name);
    } else if value.is_infinite() {
        cast(sql, if value > 0.0 { "Infinity" } else { "-Infinity" }, type_name);
    } else {
        sql.push_str(&value.to_string());
    }
}

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::DollarOne
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn is_reserved(&self, word: &str) -> bool {
        keywords::contains(keywords::COMMON, word) || keywords::contains(keywords::POSTGRES, word)
    }

    fn needs_quoting(&self, name: &str) -> bool {
        name.chars().any(|c| c.is_ascii_uppercase())
            || !super::is_plain_identifier(name)
            || self.is_reserved(name)
    }

    fn write_literal(&self, sql: &mut String, value: &SqlValue) {
        match value {
            SqlValue::Null => sql.push_str("NULL"),
            SqlValue::Bool(v) => sql.push_str(if *v { "TRUE" } else { "FALSE" }),
            SqlValue::TinyInt(v) => sql.push_str(&v.to_string()),
            SqlValue::SmallInt(v) => sql.push_str(&v.to_string()),
            SqlValue::Int(v) => sql.push_str(&v.to_string()),
            SqlValue::BigInt(v) => sql.push_str(&v.to_string()),
            SqlValue::Real(v) if v.is_finite() => sql.push_str(&v.to_string()),
            SqlValue::Real(v) => write_float(sql, f64::from(*v), "float4"),
            SqlValue::Double(v) => write_float(sql, *v, "float8"),
            SqlValue::Text(v) => quoted(sql, v),
            SqlValue::Guid(v) => cast(sql, &v.to_string(), "uuid"),
            SqlValue::Blob(v) => {
                let mut hex = String::with_capacity(2 + v.len() * 2);
                hex.push_str("\\x");
                for byte in v {
                    hex.push_str(&format!("{byte:02x}"));
                }
                cast(sql, &hex, "bytea");
            }
            SqlValue::Date(v) => cast(sql, &v.format("%Y-%m-%d").to_string(), "date"),
            SqlValue::Time(v) => cast(sql, &v.format("%H:%M:%S%.f").to_string(), "time"),
            SqlValue::DateTime(v) => {
                cast(sql, &v.format("%Y-%m-%d %H:%M:%S%.f").to_string(), "timestamp");
            }
            SqlValue::DateTimeOffset(v) => {
                cast(sql, &v.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string(), "timestamptz");
            }
        }
    }

    fn function_name<'a>(&self, kind: &'a FunctionKind) -> &'a str {
        match kind {
            FunctionKind::Length => "LENGTH",
            FunctionKind::CurrentTimestamp => "NOW",
            FunctionKind::NewGuid => "gen_random_uuid",
            other => standard_function_name(other),
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
        let chained = !statement.unions.is_empty();

        for (union, core) in statement.parts() {
            if let Some(union) = union {
                sql.push(' ');
                sql.push_str(union.as_str());
                sql.push(' ');
            }
            // A limited part of a UNION chain must be parenthesised.
            let wrap = chained && core.top.is_some();
            if wrap {
                sql.push('(');
            }
            write_select_head(sql, self, core, None, use_alias, params.as_deref_mut());
            if let Some(from) = &core.from {
                sql.push_str(" FROM ");
                self.write_table(sql, from, use_alias);
            }
            write_joins(sql, self, &core.joins, use_alias, params.as_deref_mut());
            write_where(sql, self, core.where_.as_ref(), use_alias, params.as_deref_mut());
            write_grouping(sql, self, core, use_alias, params.as_deref_mut());
            if let (true, Some(n)) = (wrap, core.top) {
                sql.push_str(&format!(" LIMIT {n})"));
            }
        }

        write_order_by(sql, self, &statement.order_by, order_alias, params);

        if let (false, Some(n)) = (chained, statement.head.top) {
            sql.push_str(&format!(" LIMIT {n}"));
        }
        if let Some(lock) = &statement.lock {
            self.write_lock(sql, lock, use_alias);
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
        sql.push_str(") VALUES(");
        write_values(sql, self, &statement.assignments, params.as_deref_mut());
        sql.push(')');
        self.write_returning(sql, &statement.returning, false, params);
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
        self.write_table(sql, &statement.table, use_alias);
        write_set_list(sql, self, &statement.assignments, use_alias, params.as_deref_mut());
        for (i, table) in statement.from.iter().enumerate() {
            sql.push_str(if i == 0 { " FROM " } else { "," });
            self.write_table(sql, table, true);
        }
        write_where(sql, self, statement.where_.as_ref(), use_alias, params.as_deref_mut());
        self.write_returning(sql, &statement.returning, use_alias, params);
    }

    fn write_delete(
        &self,
        sql: &mut String,
        statement: &DeleteStatement,
        params: Option<&mut Parameters>,
    ) {
        let mut params = params;
        let use_alias = statement.uses_alias();

        sql.push_str("DELETE FROM ");
        self.write_table(sql, &statement.table, use_alias);
        for (i, join) in statement.joins.iter().enumerate() {
            sql.push_str(if i == 0 { " USING " } else { "," });
            self.write_table(sql, &join.table, true);
        }
        // Join conditions move into WHERE, ahead of the user's condition.
        let condition = Condition::all(
            statement
                .joins
                .iter()
                .map(|j| j.on.clone())
                .chain(statement.where_.clone()),
        );
        write_where(sql, self, condition.as_ref(), use_alias, params.as_deref_mut());
        self.write_returning(sql, &statement.returning, use_alias, params);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn literal(value: SqlValue) -> String {
        let mut sql = String::new();
        PostgresDialect.write_literal(&mut sql, &value);
        sql
    }

    #[test]
    fn test_literals() {
        assert_eq!(literal(SqlValue::Bool(false)), "FALSE");
        assert_eq!(literal(SqlValue::Text("it's".into())), "'it''s'");
        assert_eq!(literal(SqlValue::Blob(vec![0xde, 0xad])), r"'\xdead'::bytea");
        assert_eq!(literal(SqlValue::Double(f64::INFINITY)), "'Infinity'::float8");
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(literal(SqlValue::Date(date)), "'2024-01-31'::date");
        assert_eq!(
            literal(SqlValue::DateTime(date.and_hms_opt(8, 30, 0).unwrap())),
            "'2024-01-31 08:30:00'::timestamp"
        );
    }

    #[test]
    fn test_upper_case_names_are_quoted() {
        assert!(PostgresDialect.needs_quoting("InvoiceId"));
        assert!(!PostgresDialect.needs_quoting("invoice_id"));
        assert!(PostgresDialect.needs_quoting("offset"));
    }
}
