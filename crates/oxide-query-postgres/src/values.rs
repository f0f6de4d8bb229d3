//! Conversions between core values and sqlx.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use oxide_query_core::params::Parameter;
use oxide_query_core::value::{DbType, SqlValue};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row, TypeInfo};
use uuid::Uuid;

use crate::error::{PgError, Result};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Binds one parameter. `NULL`s are bound with the declared type so the
/// server sees e.g. a typed `int4` null rather than an untyped one.
pub(crate) fn bind_parameter<'q>(query: PgQuery<'q>, parameter: &Parameter) -> PgQuery<'q> {
    match &parameter.value {
        SqlValue::Null => bind_null(query, parameter.db_type),
        SqlValue::Bool(v) => query.bind(*v),
        // PostgreSQL has no single-byte integer.
        SqlValue::TinyInt(v) => query.bind(i16::from(*v)),
        SqlValue::SmallInt(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::BigInt(v) => query.bind(*v),
        SqlValue::Real(v) => query.bind(*v),
        SqlValue::Double(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.clone()),
        SqlValue::Guid(v) => query.bind(*v),
        SqlValue::Blob(v) => query.bind(v.clone()),
        SqlValue::Date(v) => query.bind(*v),
        SqlValue::Time(v) => query.bind(*v),
        SqlValue::DateTime(v) => query.bind(*v),
        SqlValue::DateTimeOffset(v) => query.bind(*v),
    }
}

fn bind_null(query: PgQuery<'_>, db_type: DbType) -> PgQuery<'_> {
    match db_type {
        DbType::Bool => query.bind(Option::<bool>::None),
        DbType::TinyInt | DbType::SmallInt => query.bind(Option::<i16>::None),
        DbType::Int => query.bind(Option::<i32>::None),
        DbType::BigInt => query.bind(Option::<i64>::None),
        DbType::Real => query.bind(Option::<f32>::None),
        DbType::Double => query.bind(Option::<f64>::None),
        DbType::Text => query.bind(Option::<String>::None),
        DbType::Guid => query.bind(Option::<Uuid>::None),
        DbType::Blob => query.bind(Option::<Vec<u8>>::None),
        DbType::Date => query.bind(Option::<NaiveDate>::None),
        DbType::Time => query.bind(Option::<NaiveTime>::None),
        DbType::DateTime => query.bind(Option::<NaiveDateTime>::None),
        DbType::DateTimeOffset => query.bind(Option::<DateTime<FixedOffset>>::None),
    }
}

fn get<'r, T>(row: &'r PgRow, ordinal: usize, wrap: impl FnOnce(T) -> SqlValue) -> Result<SqlValue>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    let value: Option<T> = row.try_get(ordinal)?;
    Ok(value.map_or(SqlValue::Null, wrap))
}

/// Reads the value at `ordinal`, choosing the native type from the column's
/// PostgreSQL type name.
pub(crate) fn read_value(row: &PgRow, ordinal: usize) -> Result<SqlValue> {
    let type_name = row.column(ordinal).type_info().name();
    match type_name {
        "BOOL" => get(row, ordinal, SqlValue::Bool),
        "INT2" => get(row, ordinal, SqlValue::SmallInt),
        "INT4" => get(row, ordinal, SqlValue::Int),
        "INT8" => get(row, ordinal, SqlValue::BigInt),
        "FLOAT4" => get(row, ordinal, SqlValue::Real),
        "FLOAT8" => get(row, ordinal, SqlValue::Double),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => get(row, ordinal, SqlValue::Text),
        "UUID" => get(row, ordinal, SqlValue::Guid),
        "BYTEA" => get(row, ordinal, SqlValue::Blob),
        "DATE" => get(row, ordinal, SqlValue::Date),
        "TIME" => get(row, ordinal, SqlValue::Time),
        "TIMESTAMP" => get(row, ordinal, SqlValue::DateTime),
        "TIMESTAMPTZ" => get(row, ordinal, |v: DateTime<chrono::Utc>| {
            SqlValue::DateTimeOffset(v.fixed_offset())
        }),
        other => Err(PgError::UnsupportedType {
            ordinal,
            type_name: other.to_string(),
        }),
    }
}

/// Reads every column of `row`.
pub(crate) fn read_row(row: &PgRow) -> Result<Vec<SqlValue>> {
    (0..row.len()).map(|ordinal| read_value(row, ordinal)).collect()
}

#[cfg(test)]
mod tests {
    use oxide_query_core::dialect::PostgresDialect;
    use oxide_query_core::params::Parameters;

    use super::*;

    #[test]
    fn test_binding_keeps_argument_count() {
        let mut params = Parameters::new(&PostgresDialect);
        params.add(DbType::Int, SqlValue::Int(1));
        params.add(DbType::Text, SqlValue::Null);
        params.add(DbType::TinyInt, SqlValue::TinyInt(7));
        let resolved = params.resolve(None).unwrap();

        let query = resolved
            .iter()
            .fold(sqlx::query("SELECT $1, $2, $3"), bind_parameter);
        assert_eq!(sqlx::Execute::sql(&query), "SELECT $1, $2, $3");
    }
}
