//! Capabilities a database backend provides.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::decode::ResultCursor;
use crate::dialect::Dialect;
use crate::error::ExecResult;
use crate::params::Parameter;
use crate::query::QueryKind;

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationLevel {
    /// READ UNCOMMITTED
    ReadUncommitted,
    /// READ COMMITTED
    #[default]
    ReadCommitted,
    /// REPEATABLE READ
    RepeatableRead,
    /// SERIALIZABLE
    Serializable,
    /// SNAPSHOT; SQL Server only.
    Snapshot,
}

impl IsolationLevel {
    /// SQL spelling.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
            Self::Snapshot => "SNAPSHOT",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A command ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// SQL text.
    pub sql: String,
    /// Statement kind.
    pub kind: QueryKind,
    /// Timeout; the backend default when `None`.
    pub timeout: Option<Duration>,
    /// Parameters in placeholder order.
    pub parameters: Vec<Parameter>,
}

/// One open database connection.
///
/// The async methods default to calling their blocking counterparts; backends
/// with native async I/O override them.
pub trait Connection: Send {
    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    fn begin(&mut self, isolation: IsolationLevel) -> ExecResult<()>;

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    fn commit(&mut self) -> ExecResult<()>;

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    fn rollback(&mut self) -> ExecResult<()>;

    /// Runs a row-returning command.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    fn execute_reader(&mut self, command: &Command) -> ExecResult<Box<dyn ResultCursor>>;

    /// Runs a command and returns the rows affected.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    fn execute_non_query(&mut self, command: &Command) -> ExecResult<u64>;

    /// Async [`Connection::begin`].
    fn begin_async(
        &mut self,
        isolation: IsolationLevel,
    ) -> impl Future<Output = ExecResult<()>> + Send {
        async move { self.begin(isolation) }
    }

    /// Async [`Connection::commit`].
    fn commit_async(&mut self) -> impl Future<Output = ExecResult<()>> + Send {
        async move { self.commit() }
    }

    /// Async [`Connection::rollback`].
    fn rollback_async(&mut self) -> impl Future<Output = ExecResult<()>> + Send {
        async move { self.rollback() }
    }

    /// Async [`Connection::execute_reader`].
    fn execute_reader_async(
        &mut self,
        command: &Command,
    ) -> impl Future<Output = ExecResult<Box<dyn ResultCursor>>> + Send {
        async move { self.execute_reader(command) }
    }

    /// Async [`Connection::execute_non_query`].
    fn execute_non_query_async(
        &mut self,
        command: &Command,
    ) -> impl Future<Output = ExecResult<u64>> + Send {
        async move { self.execute_non_query(command) }
    }
}

/// Opens connections to one database.
pub trait ConnectionProvider: Send + Sync + 'static {
    /// Connection type.
    type Connection: Connection;

    /// SQL dialect the database speaks.
    fn dialect(&self) -> &dyn Dialect;

    /// Opens a connection.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExecError::Connection`] on transport failure.
    fn open_new_connection(&self) -> ExecResult<Self::Connection>;

    /// Async [`ConnectionProvider::open_new_connection`].
    fn open_new_connection_async(
        &self,
    ) -> impl Future<Output = ExecResult<Self::Connection>> + Send {
        async move { self.open_new_connection() }
    }
}
