//! UPDATE templates.
//!
//! ```text
//! update(&t) .set(col, v)+ [.from(&[&other])?] (.where_(c) | .no_where())
//!     [.returning(sel)] .build()?
//! ```

use std::marker::PhantomData;

use super::insert::{HasValues, NoValues};
use super::select::Filtered;
use super::{returning_parts, Assignable, Assignment, NonQuery, Returning, Statement};
use crate::condition::Condition;
use crate::decode::Row;
use crate::error::{DecodeError, QueryError, Result};
use crate::expr::{Expr, Operand};
use crate::schema::{NullableColumn, Table};
use crate::value::{ColumnValue, SqlValue};

/// An UPDATE template.
#[derive(Debug, Clone)]
pub struct UpdateStatement {
    /// Target table.
    pub table: Table,
    /// `SET` list.
    pub assignments: Vec<Assignment>,
    /// Additional source tables.
    pub from: Vec<Table>,
    /// `WHERE`
    pub where_: Option<Condition>,
    /// `OUTPUT INSERTED.` / `RETURNING` list.
    pub returning: Vec<Expr>,
}

impl UpdateStatement {
    /// Creates an empty template for `table`.
    #[must_use]
    pub const fn new(table: Table) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            from: Vec::new(),
            where_: None,
            returning: Vec::new(),
        }
    }

    /// Whether column references must carry table aliases.
    #[must_use]
    pub fn uses_alias(&self) -> bool {
        !self.from.is_empty() || self.where_.as_ref().is_some_and(Condition::has_subquery)
    }

    /// Adds a source table.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UpdateTableInFrom`] if `table` is the target.
    pub fn add_from(&mut self, table: &Table) -> Result<()> {
        if table.same_instance(&self.table) {
            return Err(QueryError::UpdateTableInFrom(table.name().to_string()));
        }
        self.from.push(table.clone());
        Ok(())
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
        self.assignments
            .iter()
            .find_map(|a| a.value.first_slot())
            .or_else(|| self.where_.as_ref().and_then(Condition::first_slot))
    }
}

/// An UPDATE under construction.
pub struct Update<S> {
    statement: UpdateStatement,
    _state: PhantomData<S>,
}

/// Starts an UPDATE of `table`.
#[must_use]
pub fn update(table: &impl AsRef<Table>) -> Update<NoValues> {
    Update {
        statement: UpdateStatement::new(table.as_ref().clone()),
        _state: PhantomData,
    }
}

impl<S> Update<S> {
    fn into_state<N>(self) -> Update<N> {
        Update {
            statement: self.statement,
            _state: PhantomData,
        }
    }

    /// The template built so far.
    #[must_use]
    pub const fn statement(&self) -> &UpdateStatement {
        &self.statement
    }
}

impl<S> Update<S>
where
    S: SetState,
{
    /// Sets `column` to `value`.
    #[must_use]
    pub fn set<T>(mut self, column: &impl Assignable<T>, value: impl Operand<T>) -> Update<HasValues> {
        self.statement.assignments.push(Assignment {
            column: column.target().clone(),
            value: value.into_expr(),
        });
        self.into_state()
    }

    /// Sets `column` to `NULL`.
    #[must_use]
    pub fn set_null<T>(mut self, column: &NullableColumn<T>) -> Update<HasValues> {
        let target = column.column_ref();
        self.statement.assignments.push(Assignment {
            column: target.clone(),
            value: Expr::Value(target.db_type, SqlValue::Null),
        });
        self.into_state()
    }

    /// Sets `column` to `value`, or to `NULL` when `None`.
    #[must_use]
    pub fn set_opt<T: ColumnValue>(
        self,
        column: &NullableColumn<T>,
        value: Option<T>,
    ) -> Update<HasValues> {
        match value {
            Some(v) => self.set(column, v),
            None => self.set_null(column),
        }
    }
}

/// States that still accept `set`.
pub trait SetState {}
impl SetState for NoValues {}
impl SetState for HasValues {}

impl Update<HasValues> {
    /// Adds source tables, typically referenced by the WHERE condition.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UpdateTableInFrom`] if the target table is
    /// among them.
    pub fn from(mut self, tables: &[&Table]) -> Result<Self> {
        for table in tables {
            self.statement.add_from(table)?;
        }
        Ok(self)
    }

    /// Restricts the updated rows.
    #[must_use]
    pub fn where_(mut self, condition: Condition) -> Update<Filtered> {
        self.statement.where_ = Some(condition);
        self.into_state()
    }

    /// Updates every row of the table.
    #[must_use]
    pub fn no_where(self) -> Update<Filtered> {
        self.into_state()
    }
}

impl Update<Filtered> {
    /// Reads columns of the updated rows back.
    #[must_use]
    pub fn returning<R, F>(mut self, selector: F) -> Returning<R>
    where
        F: Fn(&mut Row<'_>) -> std::result::Result<R, DecodeError> + Send + Sync + 'static,
    {
        let (fields, selector) = returning_parts(selector);
        self.statement.returning = fields;
        Returning {
            statement: Statement::Update(self.statement),
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
        NonQuery::new(Statement::Update(self.statement))
    }

    pub(crate) fn into_statement(self) -> Statement {
        Statement::Update(self.statement)
    }
}
