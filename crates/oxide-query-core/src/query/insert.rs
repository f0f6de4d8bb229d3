//! INSERT templates.

use std::marker::PhantomData;

use super::{returning_parts, Assignable, Assignment, NonQuery, Returning, Statement};
use crate::decode::Row;
use crate::error::{DecodeError, Result};
use crate::expr::{Expr, Operand};
use crate::schema::{NullableColumn, Table};
use crate::value::{ColumnValue, SqlValue};

/// An INSERT template.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    /// Target table.
    pub table: Table,
    /// Column values, in `set` order.
    pub assignments: Vec<Assignment>,
    /// `OUTPUT INSERTED.` / `RETURNING` list.
    pub returning: Vec<Expr>,
}

impl InsertStatement {
    /// Creates an empty template for `table`.
    #[must_use]
    pub const fn new(table: Table) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            returning: Vec::new(),
        }
    }

    pub(crate) fn first_slot(&self) -> Option<usize> {
        self.assignments.iter().find_map(|a| a.value.first_slot())
    }
}

/// Builder state: no value set yet.
pub struct NoValues;
/// Builder state: at least one value set.
pub struct HasValues;

/// An INSERT under construction.
pub struct Insert<S> {
    statement: InsertStatement,
    _state: PhantomData<S>,
}

/// Starts an INSERT into `table`.
#[must_use]
pub fn insert_into(table: &impl AsRef<Table>) -> Insert<NoValues> {
    Insert {
        statement: InsertStatement::new(table.as_ref().clone()),
        _state: PhantomData,
    }
}

impl<S> Insert<S> {
    fn push(mut self, column: &crate::schema::ColumnRef, value: Expr) -> Insert<HasValues> {
        self.statement.assignments.push(Assignment {
            column: column.clone(),
            value,
        });
        Insert {
            statement: self.statement,
            _state: PhantomData,
        }
    }

    /// Sets `column` to `value`.
    #[must_use]
    pub fn set<T>(self, column: &impl Assignable<T>, value: impl Operand<T>) -> Insert<HasValues> {
        self.push(column.target(), value.into_expr())
    }

    /// Sets `column` to `NULL`.
    #[must_use]
    pub fn set_null<T>(self, column: &NullableColumn<T>) -> Insert<HasValues> {
        let target = column.column_ref();
        let value = Expr::Value(target.db_type, SqlValue::Null);
        self.push(target, value)
    }

    /// Sets `column` to `value`, or to `NULL` when `None`.
    #[must_use]
    pub fn set_opt<T: ColumnValue>(
        self,
        column: &NullableColumn<T>,
        value: Option<T>,
    ) -> Insert<HasValues> {
        match value {
            Some(v) => self.set(column, v),
            None => self.set_null(column),
        }
    }

    /// The template built so far.
    #[must_use]
    pub const fn statement(&self) -> &InsertStatement {
        &self.statement
    }
}

impl Insert<HasValues> {
    /// Reads columns of the inserted row back.
    #[must_use]
    pub fn returning<R, F>(mut self, selector: F) -> Returning<R>
    where
        F: Fn(&mut Row<'_>) -> std::result::Result<R, DecodeError> + Send + Sync + 'static,
    {
        let (fields, selector) = returning_parts(selector);
        self.statement.returning = fields;
        Returning {
            statement: Statement::Insert(self.statement),
            selector,
        }
    }

    /// Builds the statement.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueryError::UnboundParameter`] if a value is a
    /// prepared-query parameter.
    pub fn build(self) -> Result<NonQuery> {
        NonQuery::new(Statement::Insert(self.statement))
    }

    pub(crate) fn into_statement(self) -> Statement {
        Statement::Insert(self.statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    #[test]
    fn test_assignments_in_order() {
        let t = Table::new(None, "Invoice").unwrap();
        let id: Column<i32> = t.column("Id");
        let note: NullableColumn<String> = t.nullable_column("Note");

        let insert = insert_into(&t).set(&id, 7).set_opt(&note, None);
        let names: Vec<_> = insert
            .statement()
            .assignments
            .iter()
            .map(|a| a.column.name)
            .collect();
        assert_eq!(names, vec!["Id", "Note"]);
        assert!(matches!(
            insert.statement().assignments[1].value,
            Expr::Value(_, SqlValue::Null)
        ));
        assert!(insert.build().is_ok());
    }

    #[test]
    fn test_returning_collects_fields() {
        let t = Table::new(None, "Invoice").unwrap();
        let id: Column<i32> = t.column("Id");
        let number: Column<String> = t.column("Number");

        let query = insert_into(&t)
            .set(&number, "INV-1")
            .returning(move |r| r.get(&id))
            .build()
            .unwrap();
        match query.statement().as_ref() {
            Statement::Insert(s) => assert_eq!(s.returning.len(), 1),
            other => panic!("unexpected statement {other:?}"),
        }
    }
}
