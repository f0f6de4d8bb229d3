//! Pool-backed [`ConnectionProvider`].

use std::future::Future;
use std::time::Duration;

use oxide_query_core::dialect::{Dialect, PostgresDialect};
use oxide_query_core::execute::ConnectionProvider;
use oxide_query_core::{ExecError, ExecResult};
use sqlx::postgres::PgPool;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info};

use crate::config::PgConfig;
use crate::connection::PgConnection;
use crate::error::{PgError, Result};

/// Opens [`PgConnection`]s from a sqlx pool.
///
/// The blocking [`ConnectionProvider`] methods need a multi-threaded Tokio
/// runtime; prefer the `_async` execution methods where possible.
///
/// ```no_run
/// use oxide_query_core::execute::Database;
/// use oxide_query_postgres::{PgConfig, PgProvider};
///
/// # async fn run() -> Result<(), oxide_query_postgres::PgError> {
/// let provider = PgProvider::connect(&PgConfig::from_env()?).await?;
/// let db = Database::new("app", provider);
/// # let _ = db;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PgProvider {
    pool: PgPool,
    dialect: PostgresDialect,
    statement_timeout: Option<Duration>,
}

impl PgProvider {
    /// Connects a pool with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PgError::Database`] if the first connection fails.
    pub async fn connect(config: &PgConfig) -> Result<Self> {
        let pool = config.pool_options().connect(&config.url).await?;
        info!(
            max_connections = config.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(Self::from_pool(pool, config.statement_timeout()))
    }

    /// Creates a pool that connects on first use.
    ///
    /// # Errors
    ///
    /// Returns [`PgError::Database`] if the URL does not parse.
    pub fn connect_lazy(config: &PgConfig) -> Result<Self> {
        let pool = config.pool_options().connect_lazy(&config.url)?;
        Ok(Self::from_pool(pool, config.statement_timeout()))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool, statement_timeout: Option<Duration>) -> Self {
        Self {
            pool,
            dialect: PostgresDialect,
            statement_timeout,
        }
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn acquire(&self) -> ExecResult<PgConnection> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ExecError::from(PgError::from(e)))?;
        debug!(idle = self.pool.num_idle(), "Acquired pooled connection");
        Ok(PgConnection::new(conn, self.statement_timeout))
    }
}

impl ConnectionProvider for PgProvider {
    type Connection = PgConnection;

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn open_new_connection(&self) -> ExecResult<PgConnection> {
        block_on(self.acquire())?
    }

    fn open_new_connection_async(&self) -> impl Future<Output = ExecResult<PgConnection>> + Send {
        self.acquire()
    }
}

/// Drives `fut` to completion from synchronous code running on a
/// multi-threaded Tokio worker.
pub(crate) fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let handle = Handle::try_current().map_err(|_| PgError::NoRuntime)?;
    if handle.runtime_flavor() != RuntimeFlavor::MultiThread {
        return Err(PgError::NoRuntime);
    }
    Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
}
