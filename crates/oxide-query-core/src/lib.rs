//! # oxide-query-core
//!
//! Type-safe SQL query templates rendered for SQL Server or PostgreSQL,
//! executed through a pluggable connection provider and decoded into typed
//! rows.
//!
//! This crate provides:
//! - Table and column descriptors with process-unique aliases
//! - A typed expression and condition tree
//! - Typestate builders for SELECT, INSERT, UPDATE, DELETE and TRUNCATE
//! - Per-dialect SQL generation with bound parameters or inline literals
//! - A positional row decoder with null sentinels
//! - An execution harness with transactions, lifecycle hooks and prepared
//!   queries
//!
//! ## Building queries
//!
//! The builders use the type system to reject invalid call sequences:
//!
//! ```rust
//! use oxide_query_core::prelude::*;
//!
//! let invoice = Table::new(None, "Invoice").unwrap();
//! let id: Column<i32> = invoice.column("Id");
//! let total: Column<i64> = invoice.column("Total");
//!
//! let query = select(move |row| row.get(&id))
//!     .from(&invoice)
//!     .where_(total.gt(100))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(query.to_sql(&SqlServerDialect), "SELECT Id FROM Invoice WHERE Total>@0");
//!
//! // This would NOT compile: a query needs a FROM table.
//! // select(|row| row.get(&id)).build();
//! ```
//!
//! ## Values never reach the SQL text
//!
//! Unless inline rendering is requested explicitly, values are bound:
//!
//! ```rust
//! use oxide_query_core::prelude::*;
//!
//! let user = Table::new(None, "User").unwrap();
//! let id: Column<i32> = user.column("Id");
//! let name: Column<String> = user.column("Name");
//!
//! let query = select(move |row| row.get(&id))
//!     .from(&user)
//!     .where_(name.eq("'; DROP TABLE User; --"))
//!     .build()
//!     .unwrap();
//!
//! let (sql, params) = query.render(&PostgresDialect).unwrap();
//! assert_eq!(sql, r#"SELECT "Id" FROM "User" WHERE "Name"=$1"#);
//! assert_eq!(params[0].value, SqlValue::Text("'; DROP TABLE User; --".into()));
//! ```

pub mod condition;
pub mod decode;
pub mod dialect;
pub mod error;
pub mod execute;
pub mod expr;
pub mod params;
pub mod prepared;
pub mod query;
pub mod schema;
pub mod settings;
pub mod types;
pub mod value;

pub use error::{DecodeError, ExecError, ExecResult, QueryError, Result};

/// Everything needed to declare tables, build queries and run them.
pub mod prelude {
    pub use crate::condition::{exists, not, not_exists, Condition, Term, TextTerm};
    pub use crate::decode::{ResultCursor, Row};
    pub use crate::dialect::{Dialect, PostgresDialect, SqlServerDialect};
    pub use crate::error::{DecodeError, ExecError, QueryError};
    pub use crate::execute::{
        ConnectionProvider, Database, IsolationLevel, NonQueryResult, QueryEvents, QueryResult,
        Transaction,
    };
    pub use crate::expr::{
        avg, coalesce, count, count_all, count_distinct, current_timestamp, length, lower, max,
        min, new_guid, sum, upper, Function, NullableFunction, Operand, TypedExpr,
    };
    pub use crate::prepared::{Param, PreparedParams};
    pub use crate::query::{
        delete_from, insert_into, select, truncate_table, update, ForLock, QueryOption,
        TableHint,
    };
    pub use crate::schema::{Column, NullableColumn, Table, TableDef};
    pub use crate::settings::{ExecuteOptions, ParameterMode};
    pub use crate::types::{
        BoolValue, DbEnum, GuidKey, IntKey, Key, LongKey, ShortKey, StringKey,
    };
    pub use crate::value::{ColumnValue, SqlValue};
}
