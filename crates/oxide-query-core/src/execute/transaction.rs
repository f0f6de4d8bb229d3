//! Transactions.

use std::fmt;

use tracing::{debug, warn};

use super::connection::{Connection, ConnectionProvider, IsolationLevel};
use super::database::Database;
use crate::error::{ExecError, ExecResult};

enum State<P: ConnectionProvider> {
    Unbound,
    Open {
        database: Database<P>,
        connection: P::Connection,
    },
    Completed,
}

/// A transaction that owns one connection.
///
/// The connection is opened and the transaction begun on first use, against
/// the database that use names. Every later use must name the same database.
/// Dropping an open transaction discards it without committing.
pub struct Transaction<P: ConnectionProvider> {
    isolation: IsolationLevel,
    state: State<P>,
}

impl<P: ConnectionProvider> fmt::Debug for Transaction<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Unbound => "unbound",
            State::Open { .. } => "open",
            State::Completed => "completed",
        };
        f.debug_struct("Transaction")
            .field("isolation", &self.isolation)
            .field("state", &state)
            .finish()
    }
}

impl<P: ConnectionProvider> Default for Transaction<P> {
    fn default() -> Self {
        Self::new(IsolationLevel::default())
    }
}

impl<P: ConnectionProvider> Transaction<P> {
    /// Creates an unbound transaction.
    #[must_use]
    pub const fn new(isolation: IsolationLevel) -> Self {
        Self {
            isolation,
            state: State::Unbound,
        }
    }

    /// Isolation level.
    #[must_use]
    pub const fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// Whether a connection is bound and the transaction not yet finished.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    /// Whether commit or rollback has been called.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.state, State::Completed)
    }

    /// Name of the bound database, once bound.
    #[must_use]
    pub fn database_name(&self) -> Option<&str> {
        match &self.state {
            State::Open { database, .. } => Some(database.name()),
            State::Unbound | State::Completed => None,
        }
    }

    pub(crate) fn connection(&mut self, database: &Database<P>) -> ExecResult<&mut P::Connection> {
        if matches!(self.state, State::Unbound) {
            let mut connection = database.provider().open_new_connection()?;
            connection.begin(self.isolation)?;
            debug!(database = database.name(), isolation = %self.isolation, "Transaction started");
            self.state = State::Open {
                database: database.clone(),
                connection,
            };
        }
        self.bound_connection(database)
    }

    pub(crate) async fn connection_async(
        &mut self,
        database: &Database<P>,
    ) -> ExecResult<&mut P::Connection> {
        if matches!(self.state, State::Unbound) {
            let mut connection = database.provider().open_new_connection_async().await?;
            connection.begin_async(self.isolation).await?;
            debug!(database = database.name(), isolation = %self.isolation, "Transaction started");
            self.state = State::Open {
                database: database.clone(),
                connection,
            };
        }
        self.bound_connection(database)
    }

    fn bound_connection(&mut self, requested: &Database<P>) -> ExecResult<&mut P::Connection> {
        match &mut self.state {
            State::Open {
                database,
                connection,
            } => {
                if database.same_as(requested) {
                    Ok(connection)
                } else {
                    Err(ExecError::TransactionDatabaseMismatch {
                        bound: database.name().to_string(),
                        requested: requested.name().to_string(),
                    })
                }
            }
            State::Completed => Err(ExecError::TransactionCompleted),
            State::Unbound => Err(ExecError::Connection(String::from(
                "transaction has no connection",
            ))),
        }
    }

    fn finish(&mut self) -> ExecResult<Option<(Database<P>, P::Connection)>> {
        match std::mem::replace(&mut self.state, State::Completed) {
            State::Open {
                database,
                connection,
            } => Ok(Some((database, connection))),
            State::Unbound => Ok(None),
            State::Completed => Err(ExecError::TransactionCompleted),
        }
    }

    /// Commits. A transaction that was never used commits trivially.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::TransactionCompleted`] on a second call, or the
    /// backend's error.
    pub fn commit(&mut self) -> ExecResult<()> {
        if let Some((database, mut connection)) = self.finish()? {
            connection.commit()?;
            debug!(database = database.name(), "Transaction committed");
        }
        Ok(())
    }

    /// Rolls back. A transaction that was never used rolls back trivially.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::TransactionCompleted`] on a second call, or the
    /// backend's error.
    pub fn rollback(&mut self) -> ExecResult<()> {
        if let Some((database, mut connection)) = self.finish()? {
            connection.rollback()?;
            debug!(database = database.name(), "Transaction rolled back");
        }
        Ok(())
    }

    /// Async [`Transaction::commit`].
    ///
    /// # Errors
    ///
    /// Same as [`Transaction::commit`].
    pub async fn commit_async(&mut self) -> ExecResult<()> {
        if let Some((database, mut connection)) = self.finish()? {
            connection.commit_async().await?;
            debug!(database = database.name(), "Transaction committed");
        }
        Ok(())
    }

    /// Async [`Transaction::rollback`].
    ///
    /// # Errors
    ///
    /// Same as [`Transaction::rollback`].
    pub async fn rollback_async(&mut self) -> ExecResult<()> {
        if let Some((database, mut connection)) = self.finish()? {
            connection.rollback_async().await?;
            debug!(database = database.name(), "Transaction rolled back");
        }
        Ok(())
    }
}

impl<P: ConnectionProvider> Drop for Transaction<P> {
    fn drop(&mut self) {
        if let State::Open { database, .. } = &self.state {
            warn!(
                database = database.name(),
                "Transaction dropped without commit or rollback; discarding"
            );
        }
    }
}
