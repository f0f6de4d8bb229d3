//! SQL values and their declared column types.
//!
//! [`SqlValue`] is the native representation handed to a driver as a bound
//! parameter or read back from a result cursor. [`DbType`] is the declared
//! logical type of a column, kept separately so that a driver can pick the
//! right parameter kind even when the value is `NULL`.
//!
//! [`ColumnValue`] ties a Rust type to both: every type that can be stored in
//! a column implements it once, and the generators, the parameter sink and
//! the row decoder all go through that single implementation.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use uuid::Uuid;

use crate::error::DecodeError;

/// Declared logical type of a column or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    /// Boolean (`bit` / `boolean`).
    Bool,
    /// Unsigned 8-bit integer (`tinyint`).
    TinyInt,
    /// 16-bit integer (`smallint`).
    SmallInt,
    /// 32-bit integer (`int` / `integer`).
    Int,
    /// 64-bit integer (`bigint`).
    BigInt,
    /// 32-bit float (`real`).
    Real,
    /// 64-bit float (`float` / `double precision`).
    Double,
    /// Character data.
    Text,
    /// 128-bit identifier (`uniqueidentifier` / `uuid`).
    Guid,
    /// Binary data (`varbinary` / `bytea`).
    Blob,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time without offset.
    DateTime,
    /// Date and time with a UTC offset.
    DateTimeOffset,
}

impl DbType {
    /// Returns true for the integer types.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::TinyInt | Self::SmallInt | Self::Int | Self::BigInt)
    }
}

/// A native SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Unsigned 8-bit integer.
    TinyInt(u8),
    /// 16-bit integer.
    SmallInt(i16),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    BigInt(i64),
    /// 32-bit float.
    Real(f32),
    /// 64-bit float.
    Double(f64),
    /// Text value.
    Text(String),
    /// UUID value.
    Guid(Uuid),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Date value.
    Date(NaiveDate),
    /// Time value.
    Time(NaiveTime),
    /// Date and time value.
    DateTime(NaiveDateTime),
    /// Date and time with offset.
    DateTimeOffset(DateTime<FixedOffset>),
}

impl SqlValue {
    /// Returns true if this is `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the type this value naturally maps to, or `None` for `NULL`.
    #[must_use]
    pub const fn db_type(&self) -> Option<DbType> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => DbType::Bool,
            Self::TinyInt(_) => DbType::TinyInt,
            Self::SmallInt(_) => DbType::SmallInt,
            Self::Int(_) => DbType::Int,
            Self::BigInt(_) => DbType::BigInt,
            Self::Real(_) => DbType::Real,
            Self::Double(_) => DbType::Double,
            Self::Text(_) => DbType::Text,
            Self::Guid(_) => DbType::Guid,
            Self::Blob(_) => DbType::Blob,
            Self::Date(_) => DbType::Date,
            Self::Time(_) => DbType::Time,
            Self::DateTime(_) => DbType::DateTime,
            Self::DateTimeOffset(_) => DbType::DateTimeOffset,
        })
    }

    /// Returns the value as an `i64` if it is any integer width.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Self::TinyInt(v) => Some(i64::from(v)),
            Self::SmallInt(v) => Some(i64::from(v)),
            Self::Int(v) => Some(i64::from(v)),
            Self::BigInt(v) => Some(v),
            _ => None,
        }
    }

    /// Short description used in decode errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.db_type() {
            Some(t) => format!("{t:?}"),
            None => String::from("NULL"),
        }
    }
}

/// A Rust type that can be stored in a column.
///
/// Implemented for the supported primitives, for identity wrappers
/// ([`Key`](crate::types::Key)) and for every [`DbEnum`](crate::types::DbEnum).
pub trait ColumnValue: Clone + Send + Sync + 'static {
    /// The declared type used when binding this value.
    const DB_TYPE: DbType;

    /// Converts the value to its native representation.
    fn to_sql_value(&self) -> SqlValue;

    /// Converts a non-null native value back.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has an incompatible type or is out of range.
    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError>;

    /// Value returned when a non-nullable field reads `NULL`.
    ///
    /// Outer joins can produce `NULL` in columns declared `NOT NULL`; those
    /// reads yield this sentinel instead of failing.
    fn null_default() -> Self;
}

fn mismatch(expected: DbType, found: &SqlValue) -> DecodeError {
    DecodeError::TypeMismatch {
        ordinal: 0,
        expected,
        found: found.describe(),
    }
}

macro_rules! impl_integer_value {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl ColumnValue for $ty {
                const DB_TYPE: DbType = DbType::$variant;

                fn to_sql_value(&self) -> SqlValue {
                    SqlValue::$variant(*self)
                }

                fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
                    let n = value
                        .as_integer()
                        .ok_or_else(|| mismatch(Self::DB_TYPE, &value))?;
                    Self::try_from(n).map_err(|_| DecodeError::OutOfRange {
                        ordinal: 0,
                        expected: Self::DB_TYPE,
                        value: n.to_string(),
                    })
                }

                fn null_default() -> Self {
                    0
                }
            }
        )+
    };
}

impl_integer_value!(u8 => TinyInt, i16 => SmallInt, i32 => Int, i64 => BigInt);

impl ColumnValue for bool {
    const DB_TYPE: DbType = DbType::Bool;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            other => match other.as_integer() {
                Some(n) => Ok(n != 0),
                None => Err(mismatch(Self::DB_TYPE, &other)),
            },
        }
    }

    fn null_default() -> Self {
        false
    }
}

impl ColumnValue for f32 {
    const DB_TYPE: DbType = DbType::Real;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Real(*self)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Real(v) => Ok(v),
            SqlValue::Double(v) => Ok(v as Self),
            other => match other.as_integer() {
                Some(n) => Ok(n as Self),
                None => Err(mismatch(Self::DB_TYPE, &other)),
            },
        }
    }

    fn null_default() -> Self {
        0.0
    }
}

impl ColumnValue for f64 {
    const DB_TYPE: DbType = DbType::Double;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Double(*self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Double(v) => Ok(v),
            SqlValue::Real(v) => Ok(Self::from(v)),
            other => match other.as_integer() {
                Some(n) => Ok(n as Self),
                None => Err(mismatch(Self::DB_TYPE, &other)),
            },
        }
    }

    fn null_default() -> Self {
        0.0
    }
}

impl ColumnValue for String {
    const DB_TYPE: DbType = DbType::Text;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Text(s) => Ok(s),
            other => Err(mismatch(Self::DB_TYPE, &other)),
        }
    }

    fn null_default() -> Self {
        Self::new()
    }
}

impl ColumnValue for Uuid {
    const DB_TYPE: DbType = DbType::Guid;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Guid(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Guid(g) => Ok(g),
            SqlValue::Text(ref s) => Self::parse_str(s).map_err(|_| mismatch(Self::DB_TYPE, &value)),
            other => Err(mismatch(Self::DB_TYPE, &other)),
        }
    }

    fn null_default() -> Self {
        Self::nil()
    }
}

impl ColumnValue for Vec<u8> {
    const DB_TYPE: DbType = DbType::Blob;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Blob(self.clone())
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Blob(b) => Ok(b),
            other => Err(mismatch(Self::DB_TYPE, &other)),
        }
    }

    fn null_default() -> Self {
        Self::new()
    }
}

impl ColumnValue for NaiveDate {
    const DB_TYPE: DbType = DbType::Date;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Date(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Date(d) => Ok(d),
            SqlValue::DateTime(dt) => Ok(dt.date()),
            other => Err(mismatch(Self::DB_TYPE, &other)),
        }
    }

    fn null_default() -> Self {
        Self::MIN
    }
}

impl ColumnValue for NaiveTime {
    const DB_TYPE: DbType = DbType::Time;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Time(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::Time(t) => Ok(t),
            other => Err(mismatch(Self::DB_TYPE, &other)),
        }
    }

    fn null_default() -> Self {
        Self::MIN
    }
}

impl ColumnValue for NaiveDateTime {
    const DB_TYPE: DbType = DbType::DateTime;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::DateTime(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::DateTime(dt) => Ok(dt),
            SqlValue::DateTimeOffset(dt) => Ok(dt.naive_utc()),
            SqlValue::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            other => Err(mismatch(Self::DB_TYPE, &other)),
        }
    }

    fn null_default() -> Self {
        Self::MIN
    }
}

impl ColumnValue for DateTime<FixedOffset> {
    const DB_TYPE: DbType = DbType::DateTimeOffset;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::DateTimeOffset(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        match value {
            SqlValue::DateTimeOffset(dt) => Ok(dt),
            SqlValue::DateTime(dt) => Ok(Self::from_naive_utc_and_offset(dt, Utc.fix())),
            other => Err(mismatch(Self::DB_TYPE, &other)),
        }
    }

    fn null_default() -> Self {
        Self::from_naive_utc_and_offset(NaiveDateTime::MIN, Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_type_of_values() {
        assert_eq!(SqlValue::Null.db_type(), None);
        assert_eq!(SqlValue::SmallInt(1).db_type(), Some(DbType::SmallInt));
        assert_eq!(
            SqlValue::Text(String::from("a")).db_type(),
            Some(DbType::Text)
        );
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(i64::from_sql_value(SqlValue::TinyInt(7)), Ok(7));
        assert_eq!(i32::from_sql_value(SqlValue::SmallInt(-3)), Ok(-3));
        assert_eq!(i16::from_sql_value(SqlValue::BigInt(300)), Ok(300));
    }

    #[test]
    fn test_integer_out_of_range() {
        let err = u8::from_sql_value(SqlValue::Int(300)).unwrap_err();
        assert!(matches!(err, DecodeError::OutOfRange { .. }));
    }

    #[test]
    fn test_type_mismatch() {
        let err = String::from_sql_value(SqlValue::Int(1)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TypeMismatch {
                ordinal: 0,
                expected: DbType::Text,
                found: String::from("Int"),
            }
        );
    }

    #[test]
    fn test_bool_from_bit() {
        assert_eq!(bool::from_sql_value(SqlValue::TinyInt(1)), Ok(true));
        assert_eq!(bool::from_sql_value(SqlValue::Bool(false)), Ok(false));
    }

    #[test]
    fn test_uuid_from_text() {
        let id = Uuid::new_v4();
        assert_eq!(
            Uuid::from_sql_value(SqlValue::Text(id.to_string())),
            Ok(id)
        );
    }

    #[test]
    fn test_null_defaults() {
        assert_eq!(i32::null_default(), 0);
        assert_eq!(String::null_default(), "");
        assert_eq!(Uuid::null_default(), Uuid::nil());
        assert_eq!(NaiveDate::null_default(), NaiveDate::MIN);
        assert!(!bool::null_default());
    }

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(2.5_f64.to_sql_value(), SqlValue::Double(2.5));
        assert_eq!(
            String::from("hello").to_sql_value(),
            SqlValue::Text(String::from("hello"))
        );
    }
}
