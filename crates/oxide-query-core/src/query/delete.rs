//! DELETE templates.

use std::marker::PhantomData;

use super::clauses::{Join, JoinKind};
use super::select::Filtered;
use super::{returning_parts, NonQuery, Returning, Statement};
use crate::condition::Condition;
use crate::decode::Row;
use crate::error::{DecodeError, QueryError, Result};
use crate::expr::Expr;
use crate::schema::Table;

/// A DELETE template.
#[derive(Debug, Clone)]
pub struct DeleteStatement {
    /// Target table.
    pub table: Table,
    /// Inner joins restricting the deleted rows.
    pub joins: Vec<Join>,
    /// `WHERE`
    pub where_: Option<Condition>,
    /// `OUTPUT DELETED.` / `RETURNING` list.
    pub returning: Vec<Expr>,
}

impl DeleteStatement {
    /// Creates an unfiltered template for `table`.
    #[must_use]
    pub const fn new(table: Table) -> Self {
        Self {
            table,
            joins: Vec::new(),
            where_: None,
            returning: Vec::new(),
        }
    }

    /// Whether column references must carry table aliases.
    #[must_use]
    pub fn uses_alias(&self) -> bool {
        !self.joins.is_empty() || self.where_.as_ref().is_some_and(Condition::has_subquery)
    }

    /// Sets the WHERE condition.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::WhereAlreadySet`] if one is already set.
    pub fn set_where(&mut self, condition: Condition) -> Result<()> {
        if self.where_.is_some() {
            return Err(QueryError::WhereAlreadySet);
        }
        self.where_ = Some(condition);
        Ok(())
    }

    pub(crate) fn first_slot(&self) -> Option<usize> {
        self.joins
            .iter()
            .find_map(|j| j.on.first_slot())
            .or_else(|| self.where_.as_ref().and_then(Condition::first_slot))
    }
}

/// Builder state: WHERE not decided yet.
pub struct Unfiltered;

/// A DELETE under construction.
pub struct Delete<S> {
    statement: DeleteStatement,
    _state: PhantomData<S>,
}

/// Starts a DELETE from `table`.
#[must_use]
pub fn delete_from(table: &impl AsRef<Table>) -> Delete<Unfiltered> {
    Delete {
        statement: DeleteStatement::new(table.as_ref().clone()),
        _state: PhantomData,
    }
}

impl<S> Delete<S> {
    fn into_state<N>(self) -> Delete<N> {
        Delete {
            statement: self.statement,
            _state: PhantomData,
        }
    }

    /// The template built so far.
    #[must_use]
    pub const fn statement(&self) -> &DeleteStatement {
        &self.statement
    }
}

/// A pending join, completed by [`DeleteJoin::on`].
pub struct DeleteJoin {
    delete: Delete<Unfiltered>,
    table: Table,
}

impl DeleteJoin {
    /// Sets the join condition.
    #[must_use]
    pub fn on(mut self, condition: Condition) -> Delete<Unfiltered> {
        self.delete.statement.joins.push(Join {
            kind: JoinKind::Inner,
            table: self.table,
            on: condition,
        });
        self.delete
    }
}

impl Delete<Unfiltered> {
    /// Restricts the deleted rows to those matching `table`.
    #[must_use]
    pub fn join(self, table: &impl AsRef<Table>) -> DeleteJoin {
        DeleteJoin {
            delete: self,
            table: table.as_ref().clone(),
        }
    }

    /// Restricts the deleted rows.
    #[must_use]
    pub fn where_(mut self, condition: Condition) -> Delete<Filtered> {
        self.statement.where_ = Some(condition);
        self.into_state()
    }

    /// Deletes every row (matched by the joins, if any).
    #[must_use]
    pub fn no_where(self) -> Delete<Filtered> {
        self.into_state()
    }
}

impl Delete<Filtered> {
    /// Reads columns of the deleted rows back.
    #[must_use]
    pub fn returning<R, F>(mut self, selector: F) -> Returning<R>
    where
        F: Fn(&mut Row<'_>) -> std::result::Result<R, DecodeError> + Send + Sync + 'static,
    {
        let (fields, selector) = returning_parts(selector);
        self.statement.returning = fields;
        Returning {
            statement: Statement::Delete(self.statement),
            selector,
        }
    }

    /// Builds the statement.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnboundParameter`] if a value is a prepared-query
    /// parameter.
    pub fn build(self) -> Result<NonQuery> {
        NonQuery::new(Statement::Delete(self.statement))
    }

    pub(crate) fn into_statement(self) -> Statement {
        Statement::Delete(self.statement)
    }
}
