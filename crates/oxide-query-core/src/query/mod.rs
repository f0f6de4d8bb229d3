//! Query templates and builders.
//!
//! Each statement kind has an untyped template ([`SelectStatement`],
//! [`InsertStatement`], ...) and a typestate builder that only allows legal
//! call sequences. Building yields an immutable, cheaply cloneable
//! [`Query<R>`] (returns rows) or [`NonQuery`] that can be rendered for any
//! dialect and executed any number of times.
//!
//! ```rust
//! use oxide_query_core::prelude::*;
//!
//! let t = Table::new(Some("dbo"), "Invoice").unwrap();
//! let id: Column<i32> = t.column("Id");
//! let number: Column<String> = t.column("Number");
//!
//! let query = select({
//!     let (id, number) = (id.clone(), number.clone());
//!     move |row| Ok((row.get(&id)?, row.get(&number)?))
//! })
//! .top(10)
//! .unwrap()
//! .from(&t)
//! .where_(id.gt(100))
//! .order_by(number.asc())
//! .build()
//! .unwrap();
//!
//! assert_eq!(
//!     query.to_sql(&SqlServerDialect),
//!     "SELECT TOP 10 Id,Number FROM dbo.Invoice WHERE Id>@0 ORDER BY Number"
//! );
//! assert_eq!(
//!     query.to_sql(&PostgresDialect),
//!     r#"SELECT "Id","Number" FROM dbo."Invoice" WHERE "Id">$1 ORDER BY "Number" LIMIT 10"#
//! );
//! ```

mod clauses;
mod delete;
mod insert;
mod select;
mod truncate;
mod update;

use std::fmt;
use std::sync::Arc;

pub use clauses::{
    ForLock, Join, JoinKind, LockStrength, LockWait, OrderBy, QueryOption, SortOrder, TableHint,
    UnionKind,
};
pub use delete::{delete_from, Delete, DeleteJoin, DeleteStatement, Unfiltered};
pub use insert::{insert_into, HasValues, Insert, InsertStatement, NoValues};
pub use select::{
    select, CanGroup, CanOrder, Complete, Filtered, Grouped, HavingSet, Initial, JoinBuilder,
    Ordered, Select, SelectCore, SelectStatement, Sourced,
};
pub use truncate::{truncate_table, Truncate, TruncateStatement};
pub use update::{update, SetState, Update, UpdateStatement};

use crate::decode::{collect_fields, Row, Selector};
use crate::dialect::Dialect;
use crate::error::{DecodeError, QueryError, Result};
use crate::expr::Expr;
use crate::params::Parameters;
use crate::prepared::{Compiled, CompiledCache};
use crate::schema::{Column, ColumnRef, NullableColumn};
use crate::settings::ParameterMode;

/// Statement kind, reported to lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// SELECT
    Select,
    /// INSERT
    Insert,
    /// UPDATE
    Update,
    /// DELETE
    Delete,
    /// TRUNCATE
    Truncate,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
        })
    }
}

/// Any statement template.
#[derive(Debug, Clone)]
pub enum Statement {
    /// SELECT
    Select(SelectStatement),
    /// INSERT
    Insert(InsertStatement),
    /// UPDATE
    Update(UpdateStatement),
    /// DELETE
    Delete(DeleteStatement),
    /// TRUNCATE
    Truncate(TruncateStatement),
}

impl Statement {
    /// Statement kind.
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::Select(_) => QueryKind::Select,
            Self::Insert(_) => QueryKind::Insert,
            Self::Update(_) => QueryKind::Update,
            Self::Delete(_) => QueryKind::Delete,
            Self::Truncate(_) => QueryKind::Truncate,
        }
    }

    /// Checks the template is complete.
    ///
    /// # Errors
    ///
    /// Returns the [`QueryError`] describing what is missing.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Select(s) => s.validate(),
            Self::Insert(s) if s.assignments.is_empty() => Err(QueryError::EmptySetList("INSERT")),
            Self::Update(s) if s.assignments.is_empty() => Err(QueryError::EmptySetList("UPDATE")),
            Self::Insert(_) | Self::Update(_) | Self::Delete(_) | Self::Truncate(_) => Ok(()),
        }
    }

    /// Returns the first prepared-parameter slot, if any.
    #[must_use]
    pub fn first_slot(&self) -> Option<usize> {
        match self {
            Self::Select(s) => s.first_slot(),
            Self::Insert(s) => s.first_slot(),
            Self::Update(s) => s.first_slot(),
            Self::Delete(s) => s.first_slot(),
            Self::Truncate(_) => None,
        }
    }
}

/// A `column = value` pair of an INSERT or UPDATE.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Target column.
    pub column: ColumnRef,
    /// Assigned value.
    pub value: Expr,
}

/// A column that can be assigned a `T`.
pub trait Assignable<T> {
    /// The target column.
    fn target(&self) -> &ColumnRef;
}

impl<T> Assignable<T> for Column<T> {
    fn target(&self) -> &ColumnRef {
        self.column_ref()
    }
}

impl<T> Assignable<T> for NullableColumn<T> {
    fn target(&self) -> &ColumnRef {
        self.column_ref()
    }
}

fn returning_parts<R, F>(selector: F) -> (Vec<Expr>, Selector<R>)
where
    F: Fn(&mut Row<'_>) -> std::result::Result<R, DecodeError> + Send + Sync + 'static,
{
    let selector: Selector<R> = Arc::new(selector);
    (collect_fields(&selector), selector)
}

fn render_with<D: Dialect + ?Sized>(
    statement: &Statement,
    dialect: &D,
    mode: ParameterMode,
) -> (String, Parameters) {
    let mut params = Parameters::new(dialect);
    let mut sql = String::new();
    match mode {
        ParameterMode::Bind => dialect.write_statement(&mut sql, statement, false, Some(&mut params)),
        ParameterMode::Inline => dialect.write_statement(&mut sql, statement, false, None),
    }
    (sql, params)
}

/// A built query that returns rows of type `R`.
pub struct Query<R> {
    statement: Arc<Statement>,
    selector: Selector<R>,
    cache: Arc<CompiledCache>,
}

impl<R> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            statement: Arc::clone(&self.statement),
            selector: Arc::clone(&self.selector),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<R> fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("statement", &self.statement)
            .finish_non_exhaustive()
    }
}

impl<R> Query<R> {
    pub(crate) fn new(statement: Statement, selector: Selector<R>) -> Result<Self> {
        statement.validate()?;
        if let Some(index) = statement.first_slot() {
            return Err(QueryError::UnboundParameter(index));
        }
        Ok(Self::unchecked(statement, selector))
    }

    pub(crate) fn unchecked(statement: Statement, selector: Selector<R>) -> Self {
        Self {
            statement: Arc::new(statement),
            selector,
            cache: Arc::new(CompiledCache::default()),
        }
    }

    /// The template.
    #[must_use]
    pub const fn statement(&self) -> &Arc<Statement> {
        &self.statement
    }

    /// Statement kind.
    #[must_use]
    pub fn kind(&self) -> QueryKind {
        self.statement.kind()
    }

    /// The row mapper.
    #[must_use]
    pub const fn selector(&self) -> &Selector<R> {
        &self.selector
    }

    /// SQL text with placeholders, for `dialect`.
    #[must_use]
    pub fn to_sql<D: Dialect + ?Sized>(&self, dialect: &D) -> String {
        render_with(&self.statement, dialect, ParameterMode::Bind).0
    }

    /// SQL text with every value inlined as a literal. For logging and debugging.
    #[must_use]
    pub fn to_inline_sql<D: Dialect + ?Sized>(&self, dialect: &D) -> String {
        render_with(&self.statement, dialect, ParameterMode::Inline).0
    }

    /// SQL text and parameters for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnboundParameter`] for prepared templates.
    pub fn render<D: Dialect + ?Sized>(
        &self,
        dialect: &D,
    ) -> Result<(String, Vec<crate::params::Parameter>)> {
        let (sql, params) = render_with(&self.statement, dialect, ParameterMode::Bind);
        Ok((sql, params.resolve(None)?))
    }

    /// Cached SQL text and binding shape for `dialect` and `mode`.
    #[must_use]
    pub fn compiled(&self, dialect: &dyn Dialect, mode: ParameterMode) -> Arc<Compiled> {
        self.cache.get_or_compile(&self.statement, dialect, mode)
    }
}

/// A built statement that returns no rows.
#[derive(Clone)]
pub struct NonQuery {
    statement: Arc<Statement>,
    cache: Arc<CompiledCache>,
}

impl fmt::Debug for NonQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonQuery")
            .field("statement", &self.statement)
            .finish_non_exhaustive()
    }
}

impl NonQuery {
    pub(crate) fn new(statement: Statement) -> Result<Self> {
        statement.validate()?;
        if let Some(index) = statement.first_slot() {
            return Err(QueryError::UnboundParameter(index));
        }
        Ok(Self::unchecked(statement))
    }

    pub(crate) fn unchecked(statement: Statement) -> Self {
        Self {
            statement: Arc::new(statement),
            cache: Arc::new(CompiledCache::default()),
        }
    }

    /// The template.
    #[must_use]
    pub const fn statement(&self) -> &Arc<Statement> {
        &self.statement
    }

    /// Statement kind.
    #[must_use]
    pub fn kind(&self) -> QueryKind {
        self.statement.kind()
    }

    /// SQL text with placeholders, for `dialect`.
    #[must_use]
    pub fn to_sql<D: Dialect + ?Sized>(&self, dialect: &D) -> String {
        render_with(&self.statement, dialect, ParameterMode::Bind).0
    }

    /// SQL text with every value inlined as a literal.
    #[must_use]
    pub fn to_inline_sql<D: Dialect + ?Sized>(&self, dialect: &D) -> String {
        render_with(&self.statement, dialect, ParameterMode::Inline).0
    }

    /// SQL text and parameters for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnboundParameter`] for prepared templates.
    pub fn render<D: Dialect + ?Sized>(
        &self,
        dialect: &D,
    ) -> Result<(String, Vec<crate::params::Parameter>)> {
        let (sql, params) = render_with(&self.statement, dialect, ParameterMode::Bind);
        Ok((sql, params.resolve(None)?))
    }

    /// Cached SQL text and binding shape for `dialect` and `mode`.
    #[must_use]
    pub fn compiled(&self, dialect: &dyn Dialect, mode: ParameterMode) -> Arc<Compiled> {
        self.cache.get_or_compile(&self.statement, dialect, mode)
    }
}

/// An INSERT, UPDATE or DELETE with a returning clause.
pub struct Returning<R> {
    statement: Statement,
    selector: Selector<R>,
}

impl<R> Returning<R> {
    /// Builds the query.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the template is incomplete.
    pub fn build(self) -> Result<Query<R>> {
        Query::new(self.statement, self.selector)
    }

    pub(crate) fn into_parts(self) -> (Statement, Selector<R>) {
        (self.statement, self.selector)
    }
}
