//! TRUNCATE templates.

use super::{NonQuery, Statement};
use crate::error::Result;
use crate::schema::Table;

/// A TRUNCATE template.
#[derive(Debug, Clone)]
pub struct TruncateStatement {
    /// Emptied table.
    pub table: Table,
}

/// A TRUNCATE ready to build.
pub struct Truncate {
    statement: TruncateStatement,
}

/// Starts a TRUNCATE of `table`.
#[must_use]
pub fn truncate_table(table: &impl AsRef<Table>) -> Truncate {
    Truncate {
        statement: TruncateStatement {
            table: table.as_ref().clone(),
        },
    }
}

impl Truncate {
    /// Builds the statement.
    ///
    /// # Errors
    ///
    /// Never fails today; kept fallible like the other builders.
    pub fn build(self) -> Result<NonQuery> {
        NonQuery::new(Statement::Truncate(self.statement))
    }
}
