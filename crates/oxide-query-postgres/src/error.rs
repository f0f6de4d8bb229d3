//! Error types for the PostgreSQL backend.

use oxide_query_core::ExecError;

/// Errors raised while configuring or talking to PostgreSQL.
#[derive(Debug, thiserror::Error)]
pub enum PgError {
    /// No connection URL was configured.
    #[error("DATABASE_URL is not set")]
    MissingUrl,

    /// A configuration variable holds an unusable value.
    #[error("Invalid value '{value}' for {name}")]
    InvalidSetting {
        /// Variable name.
        name: String,
        /// Value found.
        value: String,
    },

    /// A result column has a type this backend cannot decode.
    #[error("Column {ordinal} has unsupported type {type_name}")]
    UnsupportedType {
        /// Zero-based column ordinal.
        ordinal: usize,
        /// PostgreSQL type name.
        type_name: String,
    },

    /// A blocking call was made outside a multi-threaded Tokio runtime.
    #[error("Blocking calls require a multi-threaded Tokio runtime")]
    NoRuntime,

    /// Error reported by sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<PgError> for ExecError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
                Self::Connection(err.to_string())
            }
            PgError::Database(sqlx::Error::Io(io)) => Self::Connection(io.to_string()),
            PgError::Database(db) => Self::database(db),
            PgError::NoRuntime => Self::Connection(err.to_string()),
            other => Self::database(other),
        }
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, PgError>;
