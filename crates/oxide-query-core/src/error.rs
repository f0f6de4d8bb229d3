//! Error types for query construction, row decoding and execution.

use std::error::Error as StdError;

use crate::value::DbType;

/// Usage errors raised while a query is being constructed.
///
/// These are programming mistakes and surface before any SQL reaches the
/// database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// An `IN`/`NOT IN` list was given no items.
    #[error("IN list must contain at least one item")]
    EmptyInList,

    /// A WHERE condition was assigned twice on the same template.
    #[error("WHERE condition has already been set on this query")]
    WhereAlreadySet,

    /// A HAVING condition was assigned twice on the same template.
    #[error("HAVING condition has already been set on this query")]
    HavingAlreadySet,

    /// `TOP`/`LIMIT` was given zero rows.
    #[error("TOP must be greater than zero")]
    InvalidTop,

    /// A statement has no source table.
    #[error("query has no FROM table")]
    MissingFrom,

    /// The selector of a SELECT read no fields.
    #[error("SELECT must read at least one field")]
    NoSelectFields,

    /// The UPDATE target table was listed in its own FROM list.
    #[error("table '{0}' is the UPDATE target and cannot appear in its FROM list")]
    UpdateTableInFrom(String),

    /// A table was declared with an empty name.
    #[error("table name must not be empty")]
    EmptyTableName,

    /// An INSERT or UPDATE has no assignments.
    #[error("{0} requires at least one column assignment")]
    EmptySetList(&'static str),

    /// A prepared-query parameter was used in a query that was not prepared.
    #[error("parameter slot {0} has no value; use the prepared query API")]
    UnboundParameter(usize),
}

/// Errors raised while decoding result rows into typed values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The value read does not match the requested type.
    #[error("column {ordinal}: expected {expected:?}, found {found}")]
    TypeMismatch {
        /// Zero-based column ordinal.
        ordinal: usize,
        /// The requested type.
        expected: DbType,
        /// Description of the value encountered.
        found: String,
    },

    /// A numeric value does not fit in the requested type.
    #[error("column {ordinal}: value {value} is out of range for {expected:?}")]
    OutOfRange {
        /// Zero-based column ordinal.
        ordinal: usize,
        /// The requested type.
        expected: DbType,
        /// The value encountered.
        value: String,
    },

    /// An integer does not correspond to any variant of a database enum.
    #[error("value {value} is not a valid {type_name}")]
    UnknownEnumValue {
        /// The enum type name.
        type_name: &'static str,
        /// The integer value encountered.
        value: i64,
    },

    /// A read went past the last column of the row.
    #[error("column ordinal {ordinal} is out of range (row has {field_count} columns)")]
    ColumnOutOfRange {
        /// Zero-based column ordinal.
        ordinal: usize,
        /// Number of columns in the row.
        field_count: usize,
    },

    /// A value was read before the cursor was positioned on a row.
    #[error("cursor is not positioned on a row")]
    NoCurrentRow,
}

impl DecodeError {
    /// Re-targets a conversion error at the given column ordinal.
    #[must_use]
    pub fn at(self, ordinal: usize) -> Self {
        match self {
            Self::TypeMismatch {
                expected, found, ..
            } => Self::TypeMismatch {
                ordinal,
                expected,
                found,
            },
            Self::OutOfRange {
                expected, value, ..
            } => Self::OutOfRange {
                ordinal,
                expected,
                value,
            },
            other => other,
        }
    }
}

/// Errors raised while executing a query.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The query could not be constructed.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// A result row could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A connection could not be opened or used.
    #[error("connection error: {0}")]
    Connection(String),

    /// The database driver reported an error; the source is passed through unchanged.
    #[error("database error: {0}")]
    Database(Box<dyn StdError + Send + Sync>),

    /// The command did not complete within its timeout.
    #[error("command timed out")]
    Timeout,

    /// A single-row read returned more than one row.
    #[error("query returned more than one row when at most one was expected")]
    MultipleRows,

    /// A single-row read returned no rows.
    #[error("query returned no rows when exactly one was expected")]
    NoRows,

    /// A transaction was used against a database other than the one it is bound to.
    #[error("transaction is bound to database '{bound}' and cannot be used with '{requested}'")]
    TransactionDatabaseMismatch {
        /// Name of the database the transaction is bound to.
        bound: String,
        /// Name of the database that was requested.
        requested: String,
    },

    /// A transaction was used after commit or rollback.
    #[error("transaction has already been completed")]
    TransactionCompleted,
}

impl ExecError {
    /// Wraps a driver error.
    pub fn database(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Database(Box::new(err))
    }
}

/// Result type for query construction.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Result type for execution.
pub type ExecResult<T> = std::result::Result<T, ExecError>;
