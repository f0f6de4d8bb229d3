//! Pooled PostgreSQL connection.

use std::future::Future;
use std::time::Duration;

use oxide_query_core::decode::{BufferedCursor, ResultCursor};
use oxide_query_core::execute::{Command, Connection, IsolationLevel};
use oxide_query_core::query::QueryKind;
use oxide_query_core::{ExecError, ExecResult};
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::{Executor, Postgres};
use tracing::{debug, warn};

use crate::error::PgError;
use crate::provider::block_on;
use crate::values::{bind_parameter, read_row};

/// A connection checked out of a [`crate::PgProvider`] pool.
///
/// Returned to the pool on drop. A transaction still open at that point is
/// abandoned and the connection is closed instead of being reused.
#[derive(Debug)]
pub struct PgConnection {
    conn: PoolConnection<Postgres>,
    in_transaction: bool,
    default_timeout: Option<Duration>,
}

impl PgConnection {
    pub(crate) const fn new(conn: PoolConnection<Postgres>, default_timeout: Option<Duration>) -> Self {
        Self {
            conn,
            in_transaction: false,
            default_timeout,
        }
    }

    /// Whether a transaction is open on this connection.
    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    async fn run_raw(&mut self, sql: &str) -> ExecResult<()> {
        debug!(sql = %sql, "Sending transaction command");
        (&mut *self.conn)
            .execute(sql)
            .await
            .map_err(|e| ExecError::from(PgError::from(e)))?;
        Ok(())
    }

    async fn begin_native(&mut self, isolation: IsolationLevel) -> ExecResult<()> {
        let sql = format!("BEGIN ISOLATION LEVEL {}", pg_isolation(isolation));
        self.run_raw(&sql).await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn finish_native(&mut self, sql: &str) -> ExecResult<()> {
        // The transaction is over on the server even if the command fails.
        self.in_transaction = false;
        self.run_raw(sql).await
    }

    async fn fetch_native(&mut self, command: &Command) -> ExecResult<Box<dyn ResultCursor>> {
        let timeout = command.timeout.or(self.default_timeout);
        let query = command
            .parameters
            .iter()
            .fold(sqlx::query(&command.sql), bind_parameter);
        let rows: Vec<PgRow> = with_timeout(timeout, query.fetch_all(&mut *self.conn))
            .await?
            .map_err(|e| ExecError::from(PgError::from(e)))?;

        let field_count = rows.first().map_or(0, sqlx::Row::len);
        let values = rows
            .iter()
            .map(read_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ExecError::from)?;
        let affected = if command.kind == QueryKind::Select {
            0
        } else {
            u64::try_from(values.len()).unwrap_or(u64::MAX)
        };
        Ok(Box::new(
            BufferedCursor::new(field_count, values).with_records_affected(affected),
        ))
    }

    async fn execute_native(&mut self, command: &Command) -> ExecResult<u64> {
        let timeout = command.timeout.or(self.default_timeout);
        let query = command
            .parameters
            .iter()
            .fold(sqlx::query(&command.sql), bind_parameter);
        let done = with_timeout(timeout, query.execute(&mut *self.conn))
            .await?
            .map_err(|e| ExecError::from(PgError::from(e)))?;
        Ok(done.rows_affected())
    }
}

/// PostgreSQL has no SNAPSHOT level; REPEATABLE READ is its snapshot isolation.
const fn pg_isolation(isolation: IsolationLevel) -> &'static str {
    match isolation {
        IsolationLevel::Snapshot => IsolationLevel::RepeatableRead.as_sql(),
        other => other.as_sql(),
    }
}

async fn with_timeout<F: Future>(timeout: Option<Duration>, fut: F) -> ExecResult<F::Output> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ExecError::Timeout),
        None => Ok(fut.await),
    }
}

impl Connection for PgConnection {
    fn begin(&mut self, isolation: IsolationLevel) -> ExecResult<()> {
        block_on(self.begin_native(isolation))?
    }

    fn commit(&mut self) -> ExecResult<()> {
        block_on(self.finish_native("COMMIT"))?
    }

    fn rollback(&mut self) -> ExecResult<()> {
        block_on(self.finish_native("ROLLBACK"))?
    }

    fn execute_reader(&mut self, command: &Command) -> ExecResult<Box<dyn ResultCursor>> {
        block_on(self.fetch_native(command))?
    }

    fn execute_non_query(&mut self, command: &Command) -> ExecResult<u64> {
        block_on(self.execute_native(command))?
    }

    fn begin_async(
        &mut self,
        isolation: IsolationLevel,
    ) -> impl Future<Output = ExecResult<()>> + Send {
        self.begin_native(isolation)
    }

    fn commit_async(&mut self) -> impl Future<Output = ExecResult<()>> + Send {
        self.finish_native("COMMIT")
    }

    fn rollback_async(&mut self) -> impl Future<Output = ExecResult<()>> + Send {
        self.finish_native("ROLLBACK")
    }

    fn execute_reader_async(
        &mut self,
        command: &Command,
    ) -> impl Future<Output = ExecResult<Box<dyn ResultCursor>>> + Send {
        self.fetch_native(command)
    }

    fn execute_non_query_async(
        &mut self,
        command: &Command,
    ) -> impl Future<Output = ExecResult<u64>> + Send {
        self.execute_native(command)
    }
}

impl Drop for PgConnection {
    fn drop(&mut self) {
        if self.in_transaction {
            warn!("Connection dropped inside a transaction, closing it");
            self.conn.close_on_drop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_maps_to_repeatable_read() {
        assert_eq!(pg_isolation(IsolationLevel::Snapshot), "REPEATABLE READ");
        assert_eq!(pg_isolation(IsolationLevel::Serializable), "SERIALIZABLE");
        assert_eq!(pg_isolation(IsolationLevel::ReadCommitted), "READ COMMITTED");
    }

    #[tokio::test]
    async fn test_timeout_elapses() {
        let result = with_timeout(Some(Duration::from_millis(5)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
        })
        .await;
        assert!(matches!(result, Err(ExecError::Timeout)));
    }

    #[tokio::test]
    async fn test_no_timeout_runs_to_completion() {
        let result = with_timeout(None, async { 7 }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
