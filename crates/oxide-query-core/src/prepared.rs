//! Prepared queries and the compiled-SQL cache.
//!
//! A prepared query is built once with typed [`Param`] placeholders whose
//! values are read from an argument struct on every execution. The SQL text
//! and binding shape are computed once per dialect and cached.
//!
//! ```rust
//! use oxide_query_core::prelude::*;
//!
//! struct ByCustomer {
//!     customer: i32,
//!     min_total: i64,
//! }
//!
//! let t = Table::new(None, "Invoice").unwrap();
//! let id: Column<i32> = t.column("Id");
//! let customer: Column<i32> = t.column("CustomerId");
//! let total: Column<i64> = t.column("Total");
//!
//! let mut params = PreparedParams::new();
//! let p_customer = params.add(|a: &ByCustomer| a.customer);
//! let p_total = params.add(|a: &ByCustomer| a.min_total);
//!
//! let query = select(move |r| r.get(&id))
//!     .from(&t)
//!     .where_(customer.eq(p_customer).and(total.ge(p_total)))
//!     .build_prepared(params)
//!     .unwrap();
//!
//! let (sql, values) = query
//!     .render(&SqlServerDialect, &ByCustomer { customer: 3, min_total: 100 })
//!     .unwrap();
//! assert_eq!(sql, "SELECT Id FROM Invoice WHERE (CustomerId=@0) AND (Total>=@1)");
//! assert_eq!(values.len(), 2);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::decode::Selector;
use crate::dialect::{Dialect, DialectKind};
use crate::error::Result;
use crate::expr::{Expr, Operand};
use crate::params::{self, Binding, Parameter, Parameters, PlaceholderStyle};
use crate::query::{
    Complete, Delete, Filtered, HasValues, Insert, NonQuery, Query, Returning, Select, Statement,
    Update,
};
use crate::settings::ParameterMode;
use crate::value::{ColumnValue, SqlValue};

/// SQL text and binding shape of a statement for one dialect and mode.
#[derive(Debug, Clone)]
pub struct Compiled {
    sql: String,
    style: PlaceholderStyle,
    bindings: Vec<Binding>,
}

impl Compiled {
    /// Renders `statement`.
    #[must_use]
    pub fn new(statement: &Statement, dialect: &dyn Dialect, mode: ParameterMode) -> Self {
        let mut sink = Parameters::new(dialect);
        let sql = match mode {
            ParameterMode::Bind => dialect.generate(statement, Some(&mut sink)),
            ParameterMode::Inline => dialect.generate(statement, None),
        };
        Self {
            sql,
            style: sink.style(),
            bindings: sink.into_bindings(),
        }
    }

    /// SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bindings in placeholder order.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Materialises the parameters, taking slot values from `slots`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueryError::UnboundParameter`] if a slot has no value.
    pub fn parameters(&self, slots: Option<&[SqlValue]>) -> Result<Vec<Parameter>> {
        params::resolve(self.style, &self.bindings, slots)
    }
}

/// Per-query cache of [`Compiled`] forms.
///
/// Racing first renders of the same key produce identical results, so the
/// last writer wins without harm.
#[derive(Debug, Default)]
pub struct CompiledCache {
    entries: RwLock<HashMap<(DialectKind, ParameterMode), Arc<Compiled>>>,
}

impl CompiledCache {
    /// Returns the cached form, rendering it on first use.
    pub fn get_or_compile(
        &self,
        statement: &Statement,
        dialect: &dyn Dialect,
        mode: ParameterMode,
    ) -> Arc<Compiled> {
        let key = (dialect.kind(), mode);
        let cached = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(compiled) = cached {
            return compiled;
        }

        let compiled = Arc::new(Compiled::new(statement, dialect, mode));
        trace!(dialect = %key.0, ?mode, sql = %compiled.sql, "Caching compiled query");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&compiled));
        compiled
    }

    /// Number of cached forms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A typed placeholder whose value comes from the argument struct.
pub struct Param<T> {
    index: usize,
    _type: PhantomData<fn() -> T>,
}

impl<T> Param<T> {
    /// Position of the value among the registered getters.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for Param<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Param<T> {}

impl<T> fmt::Debug for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Param").field(&self.index).finish()
    }
}

impl<T: ColumnValue> Operand<T> for Param<T> {
    fn into_expr(self) -> Expr {
        Expr::Slot {
            index: self.index,
            db_type: T::DB_TYPE,
        }
    }
}

type Getter<P> = Box<dyn Fn(&P) -> SqlValue + Send + Sync>;

/// Getters reading parameter values from an argument struct `P`.
pub struct PreparedParams<P> {
    getters: Vec<Getter<P>>,
}

impl<P> Default for PreparedParams<P> {
    fn default() -> Self {
        Self {
            getters: Vec::new(),
        }
    }
}

impl<P> fmt::Debug for PreparedParams<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedParams")
            .field("count", &self.getters.len())
            .finish()
    }
}

impl<P> PreparedParams<P> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a getter and returns its placeholder.
    pub fn add<T, F>(&mut self, getter: F) -> Param<T>
    where
        T: ColumnValue,
        F: Fn(&P) -> T + Send + Sync + 'static,
    {
        self.push(Box::new(move |args| getter(args).to_sql_value()))
    }

    /// Registers a getter whose `None` binds `NULL`.
    pub fn add_nullable<T, F>(&mut self, getter: F) -> Param<T>
    where
        T: ColumnValue,
        F: Fn(&P) -> Option<T> + Send + Sync + 'static,
    {
        self.push(Box::new(move |args| {
            getter(args).map_or(SqlValue::Null, |v| v.to_sql_value())
        }))
    }

    fn push<T>(&mut self, getter: Getter<P>) -> Param<T> {
        let index = self.getters.len();
        self.getters.push(getter);
        Param {
            index,
            _type: PhantomData,
        }
    }

    /// Number of registered getters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.getters.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.getters.is_empty()
    }

    /// Reads every value from `args`, in registration order.
    #[must_use]
    pub fn values(&self, args: &P) -> Vec<SqlValue> {
        self.getters.iter().map(|getter| getter(args)).collect()
    }
}

/// A prepared query returning rows of type `R`.
pub struct PreparedQuery<P, R> {
    query: Query<R>,
    params: Arc<PreparedParams<P>>,
}

impl<P, R> Clone for PreparedQuery<P, R> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            params: Arc::clone(&self.params),
        }
    }
}

impl<P, R> PreparedQuery<P, R> {
    fn new(statement: Statement, selector: Selector<R>, params: PreparedParams<P>) -> Result<Self> {
        statement.validate()?;
        Ok(Self {
            query: Query::unchecked(statement, selector),
            params: Arc::new(params),
        })
    }

    /// The underlying query.
    #[must_use]
    pub const fn query(&self) -> &Query<R> {
        &self.query
    }

    /// The registered getters.
    #[must_use]
    pub fn params(&self) -> &PreparedParams<P> {
        &self.params
    }

    /// Cached SQL and binding shape for `dialect`; always bound.
    #[must_use]
    pub fn compiled(&self, dialect: &dyn Dialect) -> Arc<Compiled> {
        self.query.compiled(dialect, ParameterMode::Bind)
    }

    /// SQL text for `dialect`.
    #[must_use]
    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        self.compiled(dialect).sql().to_string()
    }

    /// SQL text and parameters for `args`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueryError::UnboundParameter`] if the query uses a
    /// [`Param`] not registered in its [`PreparedParams`].
    pub fn render(&self, dialect: &dyn Dialect, args: &P) -> Result<(String, Vec<Parameter>)> {
        let compiled = self.compiled(dialect);
        let values = self.params.values(args);
        let parameters = compiled.parameters(Some(&values))?;
        Ok((compiled.sql().to_string(), parameters))
    }
}

/// A prepared statement returning no rows.
pub struct PreparedNonQuery<P> {
    statement: NonQuery,
    params: Arc<PreparedParams<P>>,
}

impl<P> Clone for PreparedNonQuery<P> {
    fn clone(&self) -> Self {
        Self {
            statement: self.statement.clone(),
            params: Arc::clone(&self.params),
        }
    }
}

impl<P> PreparedNonQuery<P> {
    fn new(statement: Statement, params: PreparedParams<P>) -> Result<Self> {
        statement.validate()?;
        Ok(Self {
            statement: NonQuery::unchecked(statement),
            params: Arc::new(params),
        })
    }

    /// The underlying statement.
    #[must_use]
    pub const fn statement(&self) -> &NonQuery {
        &self.statement
    }

    /// The registered getters.
    #[must_use]
    pub fn params(&self) -> &PreparedParams<P> {
        &self.params
    }

    /// Cached SQL and binding shape for `dialect`; always bound.
    #[must_use]
    pub fn compiled(&self, dialect: &dyn Dialect) -> Arc<Compiled> {
        self.statement.compiled(dialect, ParameterMode::Bind)
    }

    /// SQL text for `dialect`.
    #[must_use]
    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        self.compiled(dialect).sql().to_string()
    }

    /// SQL text and parameters for `args`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueryError::UnboundParameter`] if the statement uses a
    /// [`Param`] not registered in its [`PreparedParams`].
    pub fn render(&self, dialect: &dyn Dialect, args: &P) -> Result<(String, Vec<Parameter>)> {
        let compiled = self.compiled(dialect);
        let values = self.params.values(args);
        let parameters = compiled.parameters(Some(&values))?;
        Ok((compiled.sql().to_string(), parameters))
    }
}

impl<S: Complete, R> Select<S, R> {
    /// Builds a prepared query whose [`Param`]s read from `params`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::QueryError`] if the template is incomplete.
    pub fn build_prepared<P>(self, params: PreparedParams<P>) -> Result<PreparedQuery<P, R>> {
        let (statement, selector) = self.into_parts();
        PreparedQuery::new(Statement::Select(statement), selector, params)
    }
}

impl<R> Returning<R> {
    /// Builds a prepared query whose [`Param`]s read from `params`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::QueryError`] if the template is incomplete.
    pub fn build_prepared<P>(self, params: PreparedParams<P>) -> Result<PreparedQuery<P, R>> {
        let (statement, selector) = self.into_parts();
        PreparedQuery::new(statement, selector, params)
    }
}

impl Insert<HasValues> {
    /// Builds a prepared statement whose [`Param`]s read from `params`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::QueryError`] if the template is incomplete.
    pub fn build_prepared<P>(self, params: PreparedParams<P>) -> Result<PreparedNonQuery<P>> {
        PreparedNonQuery::new(self.into_statement(), params)
    }
}

impl Update<Filtered> {
    /// Builds a prepared statement whose [`Param`]s read from `params`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::QueryError`] if the template is incomplete.
    pub fn build_prepared<P>(self, params: PreparedParams<P>) -> Result<PreparedNonQuery<P>> {
        PreparedNonQuery::new(self.into_statement(), params)
    }
}

impl Delete<Filtered> {
    /// Builds a prepared statement whose [`Param`]s read from `params`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::QueryError`] if the template is incomplete.
    pub fn build_prepared<P>(self, params: PreparedParams<P>) -> Result<PreparedNonQuery<P>> {
        PreparedNonQuery::new(self.into_statement(), params)
    }
}
