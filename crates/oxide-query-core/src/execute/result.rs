//! Execution results.

use crate::error::{ExecError, ExecResult};

/// Decoded rows of a row-returning statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult<R> {
    rows: Vec<R>,
    rows_affected: u64,
}

impl<R> QueryResult<R> {
    /// Wraps decoded rows.
    #[must_use]
    pub const fn new(rows: Vec<R>, rows_affected: u64) -> Self {
        Self {
            rows,
            rows_affected,
        }
    }

    /// The decoded rows.
    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Takes the decoded rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    /// Rows affected as reported by the server; zero for plain SELECTs on
    /// most backends.
    #[must_use]
    pub const fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Number of decoded rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first row, if any.
    #[must_use]
    pub fn first(self) -> Option<R> {
        self.rows.into_iter().next()
    }

    /// Exactly one row.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::NoRows`] or [`ExecError::MultipleRows`].
    pub fn single(self) -> ExecResult<R> {
        self.single_or_default()?.ok_or(ExecError::NoRows)
    }

    /// At most one row.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::MultipleRows`] if more than one row was returned.
    pub fn single_or_default(self) -> ExecResult<Option<R>> {
        if self.rows.len() > 1 {
            return Err(ExecError::MultipleRows);
        }
        Ok(self.first())
    }
}

impl<R> IntoIterator for QueryResult<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonQueryResult {
    /// Rows affected as reported by the server.
    pub rows_affected: u64,
}

pub(crate) trait Outcome {
    fn rows(&self) -> Option<usize>;
    fn rows_affected(&self) -> u64;
}

impl<R> Outcome for QueryResult<R> {
    fn rows(&self) -> Option<usize> {
        Some(self.rows.len())
    }

    fn rows_affected(&self) -> u64 {
        self.rows_affected
    }
}

impl Outcome for NonQueryResult {
    fn rows(&self) -> Option<usize> {
        None
    }

    fn rows_affected(&self) -> u64 {
        self.rows_affected
    }
}
