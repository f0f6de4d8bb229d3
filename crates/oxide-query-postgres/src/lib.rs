//! # oxide-query-postgres
//!
//! PostgreSQL execution backend for `oxide-query-core`, built on [sqlx].
//!
//! # How PostgreSQL differs from SQL Server
//!
//! - **Placeholders**: parameters are written `$1`, `$2`, ... rather than
//!   `@0`, `@1`, ...
//! - **Identifier quoting**: identifiers are folded to lower case unless
//!   double-quoted, so every mixed-case name is quoted.
//! - **[Isolation levels]**: there is no `SNAPSHOT` level. It is mapped to
//!   `REPEATABLE READ`, which PostgreSQL implements as snapshot isolation.
//! - **No single-byte integer**: `TinyInt` values are bound as `int2`.
//!
//! [sqlx]: https://docs.rs/sqlx
//! [Isolation levels]: https://www.postgresql.org/docs/current/transaction-iso.html
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxide_query_core::prelude::*;
//! use oxide_query_postgres::{PgConfig, PgProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = PgProvider::connect(&PgConfig::from_env()?).await?;
//! let db = Database::new("app", provider);
//!
//! let users = Table::new(None, "User")?;
//! let id: Column<i32> = users.column("Id");
//! let name: Column<String> = users.column("Name");
//!
//! let query = select(move |row| Ok((row.get(&id)?, row.get(&name)?)))
//!     .from(&users)
//!     .build()?;
//! let result = query.execute_async(&db).await?;
//! for (id, name) in result {
//!     println!("{id}: {name}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod connection;
mod error;
mod provider;
mod values;

pub use config::PgConfig;
pub use connection::PgConnection;
pub use error::{PgError, Result};
pub use provider::PgProvider;
