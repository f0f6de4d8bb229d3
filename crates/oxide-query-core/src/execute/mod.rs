//! Execution harness.
//!
//! Built queries run against a [`Database`], either on a fresh connection
//! (auto-commit) or inside a [`Transaction`]. Every execution is logged and
//! reported to the database's [`QueryEvents`]; driver errors are reported and
//! then returned unchanged.

mod connection;
mod database;
mod events;
mod result;
mod transaction;

use std::time::{Duration, Instant};

use tracing::{debug, warn};

pub use connection::{Command, Connection, ConnectionProvider, IsolationLevel};
pub use database::Database;
pub use events::{QueryEvents, QueryExecuting, QueryPerformed};
pub use result::{NonQueryResult, QueryResult};
pub use transaction::Transaction;

use crate::decode::{read_all, ResultCursor, Selector};
use crate::error::ExecResult;
use crate::prepared::{Compiled, PreparedNonQuery, PreparedQuery};
use crate::query::{NonQuery, Query, QueryKind};
use crate::settings::ExecuteOptions;
use crate::value::SqlValue;
use events::notify;
use result::Outcome;

struct Execution<'a> {
    executing: QueryExecuting<'a>,
    events: Option<&'a dyn QueryEvents>,
    started: Instant,
}

impl<'a> Execution<'a> {
    fn start<P: ConnectionProvider>(
        database: &'a Database<P>,
        command: &'a Command,
        isolation: Option<IsolationLevel>,
        options: &'a ExecuteOptions,
    ) -> Self {
        let executing = QueryExecuting {
            database: database.name(),
            sql: &command.sql,
            kind: command.kind,
            isolation,
            timeout: command.timeout,
            debug_name: options.debug_name.as_deref(),
        };
        debug!(
            sql = %command.sql,
            kind = %command.kind,
            parameters = command.parameters.len(),
            debug_name = ?executing.debug_name,
            database = executing.database,
            "Executing query"
        );
        let events = database.events();
        if let Some(events) = events {
            notify("query_executing", || events.query_executing(&executing));
        }
        Self {
            executing,
            events,
            started: Instant::now(),
        }
    }

    fn finish<T: Outcome>(&self, result: &ExecResult<T>) {
        let elapsed = self.started.elapsed();
        let elapsed_ms = duration_ms(elapsed);
        let (rows, rows_affected, error) = match result {
            Ok(outcome) => (outcome.rows(), outcome.rows_affected(), None),
            Err(err) => (None, 0, Some(err)),
        };
        match error {
            None => debug!(
                kind = %self.executing.kind,
                rows = ?rows,
                rows_affected,
                elapsed_ms,
                debug_name = ?self.executing.debug_name,
                "Query completed"
            ),
            Some(err) => warn!(
                sql = %self.executing.sql,
                kind = %self.executing.kind,
                elapsed_ms,
                debug_name = ?self.executing.debug_name,
                error = %err,
                "Query failed"
            ),
        }
        if let Some(events) = self.events {
            let performed = QueryPerformed {
                executing: self.executing,
                rows,
                rows_affected,
                elapsed,
                error,
            };
            notify("query_performed", || events.query_performed(&performed));
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn build_command<P: ConnectionProvider>(
    database: &Database<P>,
    kind: QueryKind,
    compiled: &Compiled,
    slots: Option<&[SqlValue]>,
    options: &ExecuteOptions,
) -> ExecResult<Command> {
    Ok(Command {
        sql: compiled.sql().to_string(),
        kind,
        timeout: options.timeout.or_else(|| database.default_timeout()),
        parameters: compiled.parameters(slots)?,
    })
}

fn read_rows<R>(
    mut cursor: Box<dyn ResultCursor>,
    selector: &Selector<R>,
) -> ExecResult<QueryResult<R>> {
    let rows = read_all(cursor.as_mut(), selector)?;
    Ok(QueryResult::new(rows, cursor.records_affected()))
}

fn acquire<'t, P: ConnectionProvider>(
    database: &Database<P>,
    transaction: Option<&'t mut Transaction<P>>,
    owned: &'t mut Option<P::Connection>,
) -> ExecResult<&'t mut P::Connection> {
    match transaction {
        Some(transaction) => transaction.connection(database),
        None => Ok(owned.insert(database.provider().open_new_connection()?)),
    }
}

async fn acquire_async<'t, P: ConnectionProvider>(
    database: &Database<P>,
    transaction: Option<&'t mut Transaction<P>>,
    owned: &'t mut Option<P::Connection>,
) -> ExecResult<&'t mut P::Connection> {
    match transaction {
        Some(transaction) => transaction.connection_async(database).await,
        None => Ok(owned.insert(database.provider().open_new_connection_async().await?)),
    }
}

fn send_query<P: ConnectionProvider, R>(
    database: &Database<P>,
    transaction: Option<&mut Transaction<P>>,
    command: &Command,
    selector: &Selector<R>,
) -> ExecResult<QueryResult<R>> {
    let mut owned = None;
    let connection = acquire(database, transaction, &mut owned)?;
    let cursor = connection.execute_reader(command)?;
    read_rows(cursor, selector)
}

async fn send_query_async<P: ConnectionProvider, R: Send>(
    database: &Database<P>,
    transaction: Option<&mut Transaction<P>>,
    command: &Command,
    selector: &Selector<R>,
) -> ExecResult<QueryResult<R>> {
    let mut owned = None;
    let connection = acquire_async(database, transaction, &mut owned).await?;
    let cursor = connection.execute_reader_async(command).await?;
    read_rows(cursor, selector)
}

fn send_non_query<P: ConnectionProvider>(
    database: &Database<P>,
    transaction: Option<&mut Transaction<P>>,
    command: &Command,
) -> ExecResult<NonQueryResult> {
    let mut owned = None;
    let connection = acquire(database, transaction, &mut owned)?;
    let rows_affected = connection.execute_non_query(command)?;
    Ok(NonQueryResult { rows_affected })
}

async fn send_non_query_async<P: ConnectionProvider>(
    database: &Database<P>,
    transaction: Option<&mut Transaction<P>>,
    command: &Command,
) -> ExecResult<NonQueryResult> {
    let mut owned = None;
    let connection = acquire_async(database, transaction, &mut owned).await?;
    let rows_affected = connection.execute_non_query_async(command).await?;
    Ok(NonQueryResult { rows_affected })
}

fn run_query<P: ConnectionProvider, R>(
    database: &Database<P>,
    transaction: Option<&mut Transaction<P>>,
    options: &ExecuteOptions,
    kind: QueryKind,
    compiled: &Compiled,
    slots: Option<&[SqlValue]>,
    selector: &Selector<R>,
) -> ExecResult<QueryResult<R>> {
    let command = build_command(database, kind, compiled, slots, options)?;
    let isolation = transaction.as_ref().map(|t| t.isolation());
    let execution = Execution::start(database, &command, isolation, options);
    let result = send_query(database, transaction, &command, selector);
    execution.finish(&result);
    result
}

async fn run_query_async<P: ConnectionProvider, R: Send>(
    database: &Database<P>,
    transaction: Option<&mut Transaction<P>>,
    options: &ExecuteOptions,
    kind: QueryKind,
    compiled: &Compiled,
    slots: Option<&[SqlValue]>,
    selector: &Selector<R>,
) -> ExecResult<QueryResult<R>> {
    let command = build_command(database, kind, compiled, slots, options)?;
    let isolation = transaction.as_ref().map(|t| t.isolation());
    let execution = Execution::start(database, &command, isolation, options);
    let result = send_query_async(database, transaction, &command, selector).await;
    execution.finish(&result);
    result
}

fn run_non_query<P: ConnectionProvider>(
    database: &Database<P>,
    transaction: Option<&mut Transaction<P>>,
    options: &ExecuteOptions,
    kind: QueryKind,
    compiled: &Compiled,
    slots: Option<&[SqlValue]>,
) -> ExecResult<NonQueryResult> {
    let command = build_command(database, kind, compiled, slots, options)?;
    let isolation = transaction.as_ref().map(|t| t.isolation());
    let execution = Execution::start(database, &command, isolation, options);
    let result = send_non_query(database, transaction, &command);
    execution.finish(&result);
    result
}

async fn run_non_query_async<P: ConnectionProvider>(
    database: &Database<P>,
    transaction: Option<&mut Transaction<P>>,
    options: &ExecuteOptions,
    kind: QueryKind,
    compiled: &Compiled,
    slots: Option<&[SqlValue]>,
) -> ExecResult<NonQueryResult> {
    let command = build_command(database, kind, compiled, slots, options)?;
    let isolation = transaction.as_ref().map(|t| t.isolation());
    let execution = Execution::start(database, &command, isolation, options);
    let result = send_non_query_async(database, transaction, &command).await;
    execution.finish(&result);
    result
}

impl<R> Query<R> {
    /// Runs on a fresh connection with default options.
    ///
    /// # Errors
    ///
    /// Returns the connection, driver or decode error.
    pub fn execute<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
    ) -> ExecResult<QueryResult<R>> {
        self.execute_with(database, None, &ExecuteOptions::default())
    }

    /// Runs inside `transaction` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::TransactionDatabaseMismatch`] if the transaction
    /// is bound to another database, or the connection, driver or decode error.
    pub fn execute_in<P: ConnectionProvider>(
        &self,
        transaction: &mut Transaction<P>,
        database: &Database<P>,
    ) -> ExecResult<QueryResult<R>> {
        self.execute_with(database, Some(transaction), &ExecuteOptions::default())
    }

    /// Runs with explicit options, inside `transaction` when given.
    ///
    /// # Errors
    ///
    /// Same as [`Query::execute_in`].
    pub fn execute_with<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        transaction: Option<&mut Transaction<P>>,
        options: &ExecuteOptions,
    ) -> ExecResult<QueryResult<R>> {
        let compiled = self.compiled(database.dialect(), options.effective_mode());
        run_query(
            database,
            transaction,
            options,
            self.kind(),
            &compiled,
            None,
            self.selector(),
        )
    }
}

impl<R: Send> Query<R> {
    /// Async [`Query::execute`].
    ///
    /// # Errors
    ///
    /// Same as [`Query::execute`].
    pub async fn execute_async<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
    ) -> ExecResult<QueryResult<R>> {
        self.execute_with_async(database, None, &ExecuteOptions::default())
            .await
    }

    /// Async [`Query::execute_in`].
    ///
    /// # Errors
    ///
    /// Same as [`Query::execute_in`].
    pub async fn execute_in_async<P: ConnectionProvider>(
        &self,
        transaction: &mut Transaction<P>,
        database: &Database<P>,
    ) -> ExecResult<QueryResult<R>> {
        self.execute_with_async(database, Some(transaction), &ExecuteOptions::default())
            .await
    }

    /// Async [`Query::execute_with`].
    ///
    /// # Errors
    ///
    /// Same as [`Query::execute_in`].
    pub async fn execute_with_async<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        transaction: Option<&mut Transaction<P>>,
        options: &ExecuteOptions,
    ) -> ExecResult<QueryResult<R>> {
        let compiled = self.compiled(database.dialect(), options.effective_mode());
        run_query_async(
            database,
            transaction,
            options,
            self.kind(),
            &compiled,
            None,
            self.selector(),
        )
        .await
    }
}

impl NonQuery {
    /// Runs on a fresh connection with default options.
    ///
    /// # Errors
    ///
    /// Returns the connection or driver error.
    pub fn execute<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
    ) -> ExecResult<NonQueryResult> {
        self.execute_with(database, None, &ExecuteOptions::default())
    }

    /// Runs inside `transaction` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::TransactionDatabaseMismatch`] if the transaction
    /// is bound to another database, or the connection or driver error.
    pub fn execute_in<P: ConnectionProvider>(
        &self,
        transaction: &mut Transaction<P>,
        database: &Database<P>,
    ) -> ExecResult<NonQueryResult> {
        self.execute_with(database, Some(transaction), &ExecuteOptions::default())
    }

    /// Runs with explicit options, inside `transaction` when given.
    ///
    /// # Errors
    ///
    /// Same as [`NonQuery::execute_in`].
    pub fn execute_with<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        transaction: Option<&mut Transaction<P>>,
        options: &ExecuteOptions,
    ) -> ExecResult<NonQueryResult> {
        let compiled = self.compiled(database.dialect(), options.effective_mode());
        run_non_query(database, transaction, options, self.kind(), &compiled, None)
    }

    /// Async [`NonQuery::execute`].
    ///
    /// # Errors
    ///
    /// Same as [`NonQuery::execute`].
    pub async fn execute_async<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
    ) -> ExecResult<NonQueryResult> {
        self.execute_with_async(database, None, &ExecuteOptions::default())
            .await
    }

    /// Async [`NonQuery::execute_in`].
    ///
    /// # Errors
    ///
    /// Same as [`NonQuery::execute_in`].
    pub async fn execute_in_async<P: ConnectionProvider>(
        &self,
        transaction: &mut Transaction<P>,
        database: &Database<P>,
    ) -> ExecResult<NonQueryResult> {
        self.execute_with_async(database, Some(transaction), &ExecuteOptions::default())
            .await
    }

    /// Async [`NonQuery::execute_with`].
    ///
    /// # Errors
    ///
    /// Same as [`NonQuery::execute_in`].
    pub async fn execute_with_async<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        transaction: Option<&mut Transaction<P>>,
        options: &ExecuteOptions,
    ) -> ExecResult<NonQueryResult> {
        let compiled = self.compiled(database.dialect(), options.effective_mode());
        run_non_query_async(database, transaction, options, self.kind(), &compiled, None).await
    }
}

impl<A, R> PreparedQuery<A, R> {
    /// Runs on a fresh connection with values read from `args`.
    ///
    /// # Errors
    ///
    /// Returns the connection, driver or decode error.
    pub fn execute<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        args: &A,
    ) -> ExecResult<QueryResult<R>> {
        self.execute_with(database, None, args, &ExecuteOptions::default())
    }

    /// Runs inside `transaction` with values read from `args`.
    ///
    /// # Errors
    ///
    /// Same as [`Query::execute_in`].
    pub fn execute_in<P: ConnectionProvider>(
        &self,
        transaction: &mut Transaction<P>,
        database: &Database<P>,
        args: &A,
    ) -> ExecResult<QueryResult<R>> {
        self.execute_with(database, Some(transaction), args, &ExecuteOptions::default())
    }

    /// Runs with explicit options. The parameter mode is ignored; prepared
    /// queries always bind.
    ///
    /// # Errors
    ///
    /// Same as [`Query::execute_in`].
    pub fn execute_with<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        transaction: Option<&mut Transaction<P>>,
        args: &A,
        options: &ExecuteOptions,
    ) -> ExecResult<QueryResult<R>> {
        let compiled = self.compiled(database.dialect());
        let values = self.params().values(args);
        run_query(
            database,
            transaction,
            options,
            self.query().kind(),
            &compiled,
            Some(&values),
            self.query().selector(),
        )
    }
}

impl<A: Sync, R: Send> PreparedQuery<A, R> {
    /// Async [`PreparedQuery::execute`].
    ///
    /// # Errors
    ///
    /// Same as [`PreparedQuery::execute`].
    pub async fn execute_async<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        args: &A,
    ) -> ExecResult<QueryResult<R>> {
        self.execute_with_async(database, None, args, &ExecuteOptions::default())
            .await
    }

    /// Async [`PreparedQuery::execute_in`].
    ///
    /// # Errors
    ///
    /// Same as [`PreparedQuery::execute_in`].
    pub async fn execute_in_async<P: ConnectionProvider>(
        &self,
        transaction: &mut Transaction<P>,
        database: &Database<P>,
        args: &A,
    ) -> ExecResult<QueryResult<R>> {
        self.execute_with_async(database, Some(transaction), args, &ExecuteOptions::default())
            .await
    }

    /// Async [`PreparedQuery::execute_with`].
    ///
    /// # Errors
    ///
    /// Same as [`PreparedQuery::execute_with`].
    pub async fn execute_with_async<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        transaction: Option<&mut Transaction<P>>,
        args: &A,
        options: &ExecuteOptions,
    ) -> ExecResult<QueryResult<R>> {
        let compiled = self.compiled(database.dialect());
        let values = self.params().values(args);
        run_query_async(
            database,
            transaction,
            options,
            self.query().kind(),
            &compiled,
            Some(&values),
            self.query().selector(),
        )
        .await
    }
}

impl<A> PreparedNonQuery<A> {
    /// Runs on a fresh connection with values read from `args`.
    ///
    /// # Errors
    ///
    /// Returns the connection or driver error.
    pub fn execute<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        args: &A,
    ) -> ExecResult<NonQueryResult> {
        self.execute_with(database, None, args, &ExecuteOptions::default())
    }

    /// Runs inside `transaction` with values read from `args`.
    ///
    /// # Errors
    ///
    /// Same as [`NonQuery::execute_in`].
    pub fn execute_in<P: ConnectionProvider>(
        &self,
        transaction: &mut Transaction<P>,
        database: &Database<P>,
        args: &A,
    ) -> ExecResult<NonQueryResult> {
        self.execute_with(database, Some(transaction), args, &ExecuteOptions::default())
    }

    /// Runs with explicit options. The parameter mode is ignored; prepared
    /// statements always bind.
    ///
    /// # Errors
    ///
    /// Same as [`NonQuery::execute_in`].
    pub fn execute_with<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        transaction: Option<&mut Transaction<P>>,
        args: &A,
        options: &ExecuteOptions,
    ) -> ExecResult<NonQueryResult> {
        let compiled = self.compiled(database.dialect());
        let values = self.params().values(args);
        run_non_query(
            database,
            transaction,
            options,
            self.statement().kind(),
            &compiled,
            Some(&values),
        )
    }
}

impl<A: Sync> PreparedNonQuery<A> {
    /// Async [`PreparedNonQuery::execute`].
    ///
    /// # Errors
    ///
    /// Same as [`PreparedNonQuery::execute`].
    pub async fn execute_async<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        args: &A,
    ) -> ExecResult<NonQueryResult> {
        self.execute_with_async(database, None, args, &ExecuteOptions::default())
            .await
    }

    /// Async [`PreparedNonQuery::execute_in`].
    ///
    /// # Errors
    ///
    /// Same as [`PreparedNonQuery::execute_in`].
    pub async fn execute_in_async<P: ConnectionProvider>(
        &self,
        transaction: &mut Transaction<P>,
        database: &Database<P>,
        args: &A,
    ) -> ExecResult<NonQueryResult> {
        self.execute_with_async(database, Some(transaction), args, &ExecuteOptions::default())
            .await
    }

    /// Async [`PreparedNonQuery::execute_with`].
    ///
    /// # Errors
    ///
    /// Same as [`PreparedNonQuery::execute_with`].
    pub async fn execute_with_async<P: ConnectionProvider>(
        &self,
        database: &Database<P>,
        transaction: Option<&mut Transaction<P>>,
        args: &A,
        options: &ExecuteOptions,
    ) -> ExecResult<NonQueryResult> {
        let compiled = self.compiled(database.dialect());
        let values = self.params().values(args);
        run_non_query_async(
            database,
            transaction,
            options,
            self.statement().kind(),
            &compiled,
            Some(&values),
        )
        .await
    }
}
