//! Result-row decoding.
//!
//! A [`Row`] walks the columns of the current cursor row strictly in order:
//! each [`Row::get`] reads the next ordinal. The same selector closure is run
//! once in *collect* mode when a query is built, which is how the select list
//! is derived, and then once per row in *read* mode.
//!
//! Selectors must therefore call `get` unconditionally and in a fixed order.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::error::{DecodeError, ExecResult};
use crate::expr::{Expr, Function, NullableFunction, TypedExpr};
use crate::schema::{Column, NullableColumn};
use crate::value::{ColumnValue, SqlValue};

/// Maps one row to a value of type `R`.
pub type Selector<R> = Arc<dyn Fn(&mut Row<'_>) -> Result<R, DecodeError> + Send + Sync>;

/// A forward-only result cursor.
pub trait ResultCursor: Send {
    /// Advances to the next row; false when exhausted.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if the row cannot be fetched.
    fn read_next_row(&mut self) -> ExecResult<bool>;

    /// Number of columns per row.
    fn field_count(&self) -> usize;

    /// Value at `ordinal` in the current row.
    ///
    /// # Errors
    ///
    /// Fails before the first row or when `ordinal` is out of range.
    fn get_value(&self, ordinal: usize) -> Result<SqlValue, DecodeError>;

    /// Rows affected by the statement, as reported by the server.
    fn records_affected(&self) -> u64;

    /// Whether the value at `ordinal` is `NULL`.
    ///
    /// # Errors
    ///
    /// Fails before the first row or when `ordinal` is out of range.
    fn is_null(&self, ordinal: usize) -> Result<bool, DecodeError> {
        self.get_value(ordinal).map(|v| v.is_null())
    }

    /// Reads a boolean.
    ///
    /// # Errors
    ///
    /// Fails on `NULL` or a type mismatch.
    fn get_bool(&self, ordinal: usize) -> Result<bool, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads a 16-bit integer.
    ///
    /// # Errors
    ///
    /// Fails on `NULL`, a type mismatch or an out-of-range value.
    fn get_i16(&self, ordinal: usize) -> Result<i16, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads a 32-bit integer.
    ///
    /// # Errors
    ///
    /// Fails on `NULL`, a type mismatch or an out-of-range value.
    fn get_i32(&self, ordinal: usize) -> Result<i32, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads a 64-bit integer.
    ///
    /// # Errors
    ///
    /// Fails on `NULL` or a type mismatch.
    fn get_i64(&self, ordinal: usize) -> Result<i64, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads a 64-bit float.
    ///
    /// # Errors
    ///
    /// Fails on `NULL` or a type mismatch.
    fn get_f64(&self, ordinal: usize) -> Result<f64, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads a string.
    ///
    /// # Errors
    ///
    /// Fails on `NULL` or a type mismatch.
    fn get_string(&self, ordinal: usize) -> Result<String, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads a UUID.
    ///
    /// # Errors
    ///
    /// Fails on `NULL` or a type mismatch.
    fn get_guid(&self, ordinal: usize) -> Result<Uuid, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads binary data.
    ///
    /// # Errors
    ///
    /// Fails on `NULL` or a type mismatch.
    fn get_bytes(&self, ordinal: usize) -> Result<Vec<u8>, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads a date.
    ///
    /// # Errors
    ///
    /// Fails on `NULL` or a type mismatch.
    fn get_date(&self, ordinal: usize) -> Result<NaiveDate, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads a time of day.
    ///
    /// # Errors
    ///
    /// Fails on `NULL` or a type mismatch.
    fn get_time(&self, ordinal: usize) -> Result<NaiveTime, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads a date and time.
    ///
    /// # Errors
    ///
    /// Fails on `NULL` or a type mismatch.
    fn get_datetime(&self, ordinal: usize) -> Result<NaiveDateTime, DecodeError> {
        get_typed(self, ordinal)
    }

    /// Reads a date and time with offset.
    ///
    /// # Errors
    ///
    /// Fails on `NULL` or a type mismatch.
    fn get_datetime_offset(&self, ordinal: usize) -> Result<DateTime<FixedOffset>, DecodeError> {
        get_typed(self, ordinal)
    }
}

fn get_typed<C: ResultCursor + ?Sized, T: ColumnValue>(
    cursor: &C,
    ordinal: usize,
) -> Result<T, DecodeError> {
    let value = cursor.get_value(ordinal)?;
    if value.is_null() {
        return Err(DecodeError::TypeMismatch {
            ordinal,
            expected: T::DB_TYPE,
            found: value.describe(),
        });
    }
    T::from_sql_value(value).map_err(|e| e.at(ordinal))
}

/// An in-memory cursor over materialised rows.
#[derive(Debug, Clone, Default)]
pub struct BufferedCursor {
    field_count: usize,
    rows: VecDeque<Vec<SqlValue>>,
    current: Option<Vec<SqlValue>>,
    records_affected: u64,
}

impl BufferedCursor {
    /// Creates a cursor over `rows`, each with `field_count` values.
    #[must_use]
    pub fn new(field_count: usize, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            field_count,
            rows: rows.into(),
            current: None,
            records_affected: 0,
        }
    }

    /// Creates a cursor with no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the affected-row count reported by [`ResultCursor::records_affected`].
    #[must_use]
    pub const fn with_records_affected(mut self, records_affected: u64) -> Self {
        self.records_affected = records_affected;
        self
    }
}

impl ResultCursor for BufferedCursor {
    fn read_next_row(&mut self) -> ExecResult<bool> {
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }

    fn field_count(&self) -> usize {
        self.field_count
    }

    fn get_value(&self, ordinal: usize) -> Result<SqlValue, DecodeError> {
        let row = self.current.as_ref().ok_or(DecodeError::NoCurrentRow)?;
        row.get(ordinal)
            .cloned()
            .ok_or(DecodeError::ColumnOutOfRange {
                ordinal,
                field_count: row.len(),
            })
    }

    fn records_affected(&self) -> u64 {
        self.records_affected
    }
}

enum Mode<'a> {
    Collect(&'a mut Vec<Expr>),
    Read(&'a dyn ResultCursor),
}

/// Positional accessor over the current row.
pub struct Row<'a> {
    mode: Mode<'a>,
    position: usize,
}

impl<'a> Row<'a> {
    /// Accessor that records each requested field instead of reading.
    pub fn collect(fields: &'a mut Vec<Expr>) -> Self {
        Self {
            mode: Mode::Collect(fields),
            position: 0,
        }
    }

    /// Accessor reading the cursor's current row.
    pub fn read(cursor: &'a dyn ResultCursor) -> Self {
        Self {
            mode: Mode::Read(cursor),
            position: 0,
        }
    }

    /// Reads the next field.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] carrying the column ordinal if the value
    /// cannot be converted.
    pub fn get<S: Selectable>(&mut self, field: &S) -> Result<S::Output, DecodeError> {
        let ordinal = self.position;
        self.position += 1;
        match &mut self.mode {
            Mode::Collect(fields) => {
                fields.push(field.field());
                Ok(S::placeholder())
            }
            Mode::Read(cursor) => {
                let value = cursor.get_value(ordinal)?;
                S::decode(value).map_err(|e| e.at(ordinal))
            }
        }
    }

    /// Number of fields read so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Whether this accessor is collecting the select list.
    #[must_use]
    pub const fn is_collecting(&self) -> bool {
        matches!(self.mode, Mode::Collect(_))
    }
}

/// Something a selector can read from a row.
pub trait Selectable {
    /// Decoded type.
    type Output;

    /// The select-list expression.
    fn field(&self) -> Expr;

    /// Decodes a value, which may be `NULL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be converted.
    fn decode(value: SqlValue) -> Result<Self::Output, DecodeError>;

    /// Value returned while collecting the select list.
    fn placeholder() -> Self::Output;
}

fn decode_or_default<T: ColumnValue>(value: SqlValue) -> Result<T, DecodeError> {
    if value.is_null() {
        Ok(T::null_default())
    } else {
        T::from_sql_value(value)
    }
}

fn decode_optional<T: ColumnValue>(value: SqlValue) -> Result<Option<T>, DecodeError> {
    if value.is_null() {
        Ok(None)
    } else {
        T::from_sql_value(value).map(Some)
    }
}

macro_rules! impl_selectable {
    ($($ty:ident: $output:ty => $decode:ident, $placeholder:expr, $field:expr;)+) => {
        $(
            impl<T: ColumnValue> Selectable for $ty<T> {
                type Output = $output;

                fn field(&self) -> Expr {
                    $field(self)
                }

                fn decode(value: SqlValue) -> Result<Self::Output, DecodeError> {
                    $decode(value)
                }

                fn placeholder() -> Self::Output {
                    $placeholder
                }
            }
        )+
    };
}

impl_selectable! {
    Column: T => decode_or_default, T::null_default(), |c: &Column<T>| Expr::Column(c.column_ref().clone());
    NullableColumn: Option<T> => decode_optional, None, |c: &NullableColumn<T>| Expr::Column(c.column_ref().clone());
    Function: T => decode_or_default, T::null_default(), |f: &Function<T>| Expr::Function(f.call().clone());
    NullableFunction: Option<T> => decode_optional, None, |f: &NullableFunction<T>| Expr::Function(f.call().clone());
    TypedExpr: T => decode_or_default, T::null_default(), |e: &TypedExpr<T>| e.expr().clone();
}

/// Collects the select list of `selector`.
pub(crate) fn collect_fields<R>(selector: &Selector<R>) -> Vec<Expr> {
    let mut fields = Vec::new();
    let mut row = Row::collect(&mut fields);
    // Collect mode returns placeholders, never decoded values.
    let _ = selector(&mut row);
    fields
}

/// Decodes every remaining row of `cursor`.
///
/// # Errors
///
/// Returns the first cursor or decode error.
pub fn read_all<R>(cursor: &mut dyn ResultCursor, selector: &Selector<R>) -> ExecResult<Vec<R>> {
    let mut rows = Vec::new();
    while cursor.read_next_row()? {
        let mut row = Row::read(&*cursor);
        rows.push(selector(&mut row)?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Table;
    use crate::value::DbType;

    fn cursor(rows: Vec<Vec<SqlValue>>) -> BufferedCursor {
        BufferedCursor::new(rows.first().map_or(0, Vec::len), rows)
    }

    #[test]
    fn test_null_decodes_to_sentinel() {
        let t = Table::new(None, "Invoice").unwrap();
        let total: Column<i64> = t.column("Total");
        let note: NullableColumn<String> = t.nullable_column("Note");

        let mut c = cursor(vec![vec![SqlValue::Null, SqlValue::Null]]);
        assert!(c.read_next_row().unwrap());
        let mut row = Row::read(&c);
        assert_eq!(row.get(&total).unwrap(), 0);
        assert_eq!(row.get(&note).unwrap(), None);
        assert_eq!(row.position(), 2);
    }

    #[test]
    fn test_values_decode() {
        let t = Table::new(None, "Invoice").unwrap();
        let id: Column<i32> = t.column("Id");
        let note: NullableColumn<String> = t.nullable_column("Note");

        let mut c = cursor(vec![vec![
            SqlValue::SmallInt(4),
            SqlValue::Text(String::from("hi")),
        ]]);
        c.read_next_row().unwrap();
        let mut row = Row::read(&c);
        assert_eq!(row.get(&id).unwrap(), 4);
        assert_eq!(row.get(&note).unwrap(), Some(String::from("hi")));
    }

    #[test]
    fn test_error_carries_ordinal() {
        let t = Table::new(None, "Invoice").unwrap();
        let id: Column<i32> = t.column("Id");
        let name: Column<String> = t.column("Name");

        let mut c = cursor(vec![vec![SqlValue::Int(1), SqlValue::Int(2)]]);
        c.read_next_row().unwrap();
        let mut row = Row::read(&c);
        row.get(&id).unwrap();
        assert_eq!(
            row.get(&name).unwrap_err(),
            DecodeError::TypeMismatch {
                ordinal: 1,
                expected: DbType::Text,
                found: String::from("Int"),
            }
        );
    }

    #[test]
    fn test_read_past_last_column() {
        let t = Table::new(None, "Invoice").unwrap();
        let id: Column<i32> = t.column("Id");

        let mut c = cursor(vec![vec![SqlValue::Int(1)]]);
        c.read_next_row().unwrap();
        let mut row = Row::read(&c);
        row.get(&id).unwrap();
        assert!(matches!(
            row.get(&id).unwrap_err(),
            DecodeError::ColumnOutOfRange { ordinal: 1, .. }
        ));
    }

    #[test]
    fn test_no_current_row() {
        let c = cursor(vec![vec![SqlValue::Int(1)]]);
        assert_eq!(c.get_value(0).unwrap_err(), DecodeError::NoCurrentRow);
    }

    #[test]
    fn test_collect_mode_records_fields() {
        let t = Table::new(None, "Invoice").unwrap();
        let id: Column<i32> = t.column("Id");
        let note: NullableColumn<String> = t.nullable_column("Note");

        let selector: Selector<(i32, Option<String>)> = Arc::new(move |row: &mut Row<'_>| {
            Ok((row.get(&id)?, row.get(&note)?))
        });
        let fields = collect_fields(&selector);
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_read_all() {
        let t = Table::new(None, "Invoice").unwrap();
        let id: Column<i32> = t.column("Id");
        let selector: Selector<i32> = Arc::new(move |row: &mut Row<'_>| row.get(&id));

        let mut c = cursor(vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2)]]);
        assert_eq!(read_all(&mut c, &selector).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_typed_getters() {
        let mut c = cursor(vec![vec![SqlValue::TinyInt(3), SqlValue::Null]]);
        c.read_next_row().unwrap();
        assert_eq!(c.get_i64(0).unwrap(), 3);
        assert!(c.is_null(1).unwrap());
        assert!(c.get_string(1).is_err());
    }
}
