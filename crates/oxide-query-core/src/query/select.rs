//! SELECT templates and their typestate builder.
//!
//! The builder only exposes the calls that are legal in the current state:
//!
//! ```text
//! select(sel) [.distinct()] [.top(n)?] .from(&t)
//!     [.with_hints(..)] [.join(&t).on(c)]* [.where_(c)]
//!     [.group_by(x)+ [.having(c)]] [.order_by(o)+]
//!     [.lock(l)] [.option(o)]* .build()?
//! ```
//!
//! `union_select` / `union_all_select` start a new SELECT part that is
//! rendered after the current one; the whole chain builds into one query.

use std::marker::PhantomData;
use std::sync::Arc;

use super::clauses::{ForLock, Join, JoinKind, OrderBy, QueryOption, TableHint, UnionKind};
use super::{Query, Statement};
use crate::condition::{Condition, Term};
use crate::decode::{collect_fields, Row, Selector};
use crate::error::{DecodeError, QueryError, Result};
use crate::expr::Expr;
use crate::schema::Table;

/// One SELECT body: everything up to, but excluding, ORDER BY.
#[derive(Debug, Clone, Default)]
pub struct SelectCore {
    /// `DISTINCT`
    pub distinct: bool,
    /// `TOP n` / `LIMIT n`
    pub top: Option<u64>,
    /// Select list.
    pub fields: Vec<Expr>,
    /// Source table.
    pub from: Option<Table>,
    /// Hints on the source table.
    pub hints: Vec<TableHint>,
    /// Joined tables.
    pub joins: Vec<Join>,
    /// `WHERE`
    pub where_: Option<Condition>,
    /// `GROUP BY`
    pub group_by: Vec<Expr>,
    /// `HAVING`
    pub having: Option<Condition>,
}

impl SelectCore {
    /// Creates a body with the given select list.
    #[must_use]
    pub fn new(fields: Vec<Expr>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Whether column references must carry table aliases.
    ///
    /// True as soon as more than one table participates: a join or a
    /// nested statement in WHERE/HAVING.
    #[must_use]
    pub fn uses_alias(&self) -> bool {
        !self.joins.is_empty()
            || self.where_.as_ref().is_some_and(Condition::has_subquery)
            || self.having.as_ref().is_some_and(Condition::has_subquery)
    }

    fn validate(&self) -> Result<()> {
        if self.from.is_none() {
            return Err(QueryError::MissingFrom);
        }
        if self.fields.is_empty() {
            return Err(QueryError::NoSelectFields);
        }
        Ok(())
    }

    fn first_slot(&self) -> Option<usize> {
        self.fields
            .iter()
            .find_map(Expr::first_slot)
            .or_else(|| self.joins.iter().find_map(|j| j.on.first_slot()))
            .or_else(|| self.where_.as_ref().and_then(Condition::first_slot))
            .or_else(|| self.group_by.iter().find_map(Expr::first_slot))
            .or_else(|| self.having.as_ref().and_then(Condition::first_slot))
    }
}

/// A complete SELECT template, possibly a UNION chain.
#[derive(Debug, Clone)]
pub struct SelectStatement {
    /// First SELECT body.
    pub head: SelectCore,
    /// Further bodies, each with the operator joining it to the previous one.
    pub unions: Vec<(UnionKind, SelectCore)>,
    /// `ORDER BY`, applied to the whole statement.
    pub order_by: Vec<OrderBy>,
    /// Row-locking clause (PostgreSQL).
    pub lock: Option<ForLock>,
    /// Query hints (SQL Server).
    pub options: Vec<QueryOption>,
}

impl SelectStatement {
    /// Creates a statement from its first body.
    #[must_use]
    pub const fn new(head: SelectCore) -> Self {
        Self {
            head,
            unions: Vec::new(),
            order_by: Vec::new(),
            lock: None,
            options: Vec::new(),
        }
    }

    /// All bodies in render order, with the operator preceding each.
    pub fn parts(&self) -> impl Iterator<Item = (Option<UnionKind>, &SelectCore)> {
        std::iter::once((None, &self.head))
            .chain(self.unions.iter().map(|(kind, core)| (Some(*kind), core)))
    }

    /// The body currently being built: the last one in the chain.
    pub fn current_mut(&mut self) -> &mut SelectCore {
        match self.unions.last_mut() {
            Some((_, core)) => core,
            None => &mut self.head,
        }
    }

    /// Whether any body needs table aliases.
    #[must_use]
    pub fn uses_alias(&self) -> bool {
        self.parts().any(|(_, core)| core.uses_alias())
    }

    /// Sets the source table of the current body.
    pub fn set_from(&mut self, table: &Table) {
        self.current_mut().from = Some(table.clone());
    }

    /// Sets the WHERE condition of the current body.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::WhereAlreadySet`] if one is already set.
    pub fn set_where(&mut self, condition: Condition) -> Result<()> {
        let core = self.current_mut();
        if core.where_.is_some() {
            return Err(QueryError::WhereAlreadySet);
        }
        core.where_ = Some(condition);
        Ok(())
    }

    /// Sets the HAVING condition of the current body.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::HavingAlreadySet`] if one is already set.
    pub fn set_having(&mut self, condition: Condition) -> Result<()> {
        let core = self.current_mut();
        if core.having.is_some() {
            return Err(QueryError::HavingAlreadySet);
        }
        core.having = Some(condition);
        Ok(())
    }

    /// Limits the current body to `n` rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidTop`] if `n` is zero.
    pub fn set_top(&mut self, n: u64) -> Result<()> {
        if n == 0 {
            return Err(QueryError::InvalidTop);
        }
        self.current_mut().top = Some(n);
        Ok(())
    }

    /// Adds a join to the current body.
    pub fn add_join(&mut self, kind: JoinKind, table: &Table, on: Condition) {
        self.current_mut().joins.push(Join {
            kind,
            table: table.clone(),
            on,
        });
    }

    /// Appends a UNION part.
    pub fn add_union(&mut self, kind: UnionKind, core: SelectCore) {
        self.unions.push((kind, core));
    }

    /// Checks every body has a source table and at least one field.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingFrom`] or [`QueryError::NoSelectFields`].
    pub fn validate(&self) -> Result<()> {
        self.parts().try_for_each(|(_, core)| core.validate())
    }

    /// Returns the first prepared-parameter slot, if any.
    #[must_use]
    pub fn first_slot(&self) -> Option<usize> {
        self.parts()
            .find_map(|(_, core)| core.first_slot())
            .or_else(|| self.order_by.iter().find_map(|o| o.expr.first_slot()))
    }
}

/// Builder state: nothing but the select list.
pub struct Initial;
/// Builder state: FROM set; joins and WHERE may follow.
pub struct Sourced;
/// Builder state: WHERE set.
pub struct Filtered;
/// Builder state: GROUP BY set.
pub struct Grouped;
/// Builder state: HAVING set.
pub struct HavingSet;
/// Builder state: ORDER BY set.
pub struct Ordered;

/// States that accept GROUP BY.
pub trait CanGroup {}
impl CanGroup for Sourced {}
impl CanGroup for Filtered {}

/// States that accept ORDER BY and UNION.
pub trait CanOrder {}
impl CanOrder for Sourced {}
impl CanOrder for Filtered {}
impl CanOrder for Grouped {}
impl CanOrder for HavingSet {}

/// States a query can be built from.
pub trait Complete {}
impl Complete for Sourced {}
impl Complete for Filtered {}
impl Complete for Grouped {}
impl Complete for HavingSet {}
impl Complete for Ordered {}

/// A SELECT under construction.
pub struct Select<S, R> {
    statement: SelectStatement,
    selector: Selector<R>,
    _state: PhantomData<S>,
}

/// Starts a SELECT whose rows are read by `selector`.
///
/// The selector is also run once immediately, without a database, to
/// collect the select list: it must read the same fields in the same order
/// on every call.
#[must_use]
pub fn select<R, F>(selector: F) -> Select<Initial, R>
where
    F: Fn(&mut Row<'_>) -> std::result::Result<R, DecodeError> + Send + Sync + 'static,
{
    let selector: Selector<R> = Arc::new(selector);
    let fields = collect_fields(&selector);
    Select {
        statement: SelectStatement::new(SelectCore::new(fields)),
        selector,
        _state: PhantomData,
    }
}

impl<S, R> Select<S, R> {
    fn into_state<N>(self) -> Select<N, R> {
        Select {
            statement: self.statement,
            selector: self.selector,
            _state: PhantomData,
        }
    }

    /// The template built so far.
    #[must_use]
    pub const fn statement(&self) -> &SelectStatement {
        &self.statement
    }
}

impl<R> Select<Initial, R> {
    /// Adds `DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.statement.current_mut().distinct = true;
        self
    }

    /// Limits the result to `n` rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidTop`] if `n` is zero.
    pub fn top(mut self, n: u64) -> Result<Self> {
        self.statement.set_top(n)?;
        Ok(self)
    }

    /// Sets the source table.
    #[must_use]
    pub fn from(mut self, table: &impl AsRef<Table>) -> Select<Sourced, R> {
        self.statement.set_from(table.as_ref());
        self.into_state()
    }
}

/// A pending join, completed by [`JoinBuilder::on`].
pub struct JoinBuilder<R> {
    select: Select<Sourced, R>,
    kind: JoinKind,
    table: Table,
}

impl<R> JoinBuilder<R> {
    /// Sets the join condition.
    #[must_use]
    pub fn on(mut self, condition: Condition) -> Select<Sourced, R> {
        self.select
            .statement
            .add_join(self.kind, &self.table, condition);
        self.select
    }
}

impl<R> Select<Sourced, R> {
    /// Adds SQL Server table hints to the source table.
    #[must_use]
    pub fn with_hints(mut self, hints: &[TableHint]) -> Self {
        self.statement.current_mut().hints.extend_from_slice(hints);
        self
    }

    /// Starts an `INNER JOIN`.
    #[must_use]
    pub fn join(self, table: &impl AsRef<Table>) -> JoinBuilder<R> {
        JoinBuilder {
            select: self,
            kind: JoinKind::Inner,
            table: table.as_ref().clone(),
        }
    }

    /// Starts a `LEFT JOIN`.
    ///
    /// Non-nullable columns of the joined table read their sentinel default
    /// when no row matches.
    #[must_use]
    pub fn left_join(self, table: &impl AsRef<Table>) -> JoinBuilder<R> {
        JoinBuilder {
            select: self,
            kind: JoinKind::Left,
            table: table.as_ref().clone(),
        }
    }

    /// Sets the WHERE condition; `None` leaves the query unfiltered.
    #[must_use]
    pub fn where_(mut self, condition: impl Into<Option<Condition>>) -> Select<Filtered, R> {
        self.statement.current_mut().where_ = condition.into();
        self.into_state()
    }
}

impl<S: CanGroup, R> Select<S, R> {
    /// Adds a GROUP BY term.
    ///
    /// Available straight after `from` or a join as well as after `where_`;
    /// an unfiltered grouping needs no WHERE clause.
    #[must_use]
    pub fn group_by<T>(mut self, term: &impl Term<T>) -> Select<Grouped, R> {
        self.statement.current_mut().group_by.push(term.to_expr());
        self.into_state()
    }
}

impl<R> Select<Grouped, R> {
    /// Adds another GROUP BY term.
    #[must_use]
    pub fn then_group_by<T>(mut self, term: &impl Term<T>) -> Self {
        self.statement.current_mut().group_by.push(term.to_expr());
        self
    }

    /// Sets the HAVING condition.
    #[must_use]
    pub fn having(mut self, condition: Condition) -> Select<HavingSet, R> {
        self.statement.current_mut().having = Some(condition);
        self.into_state()
    }
}

impl<S: CanOrder, R> Select<S, R> {
    /// Adds an ORDER BY term; it sorts the whole statement, unions included.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Select<Ordered, R> {
        self.statement.order_by.push(order);
        self.into_state()
    }

    /// Appends a `UNION` part read by the same row shape.
    #[must_use]
    pub fn union_select<F>(self, selector: F) -> Select<Initial, R>
    where
        F: Fn(&mut Row<'_>) -> std::result::Result<R, DecodeError> + Send + Sync + 'static,
    {
        self.union_part(UnionKind::Union, selector)
    }

    /// Appends a `UNION ALL` part read by the same row shape.
    #[must_use]
    pub fn union_all_select<F>(self, selector: F) -> Select<Initial, R>
    where
        F: Fn(&mut Row<'_>) -> std::result::Result<R, DecodeError> + Send + Sync + 'static,
    {
        self.union_part(UnionKind::UnionAll, selector)
    }

    fn union_part<F>(mut self, kind: UnionKind, selector: F) -> Select<Initial, R>
    where
        F: Fn(&mut Row<'_>) -> std::result::Result<R, DecodeError> + Send + Sync + 'static,
    {
        let part: Selector<R> = Arc::new(selector);
        let fields = collect_fields(&part);
        self.statement.add_union(kind, SelectCore::new(fields));
        self.into_state()
    }
}

impl<R> Select<Ordered, R> {
    /// Adds another ORDER BY term.
    #[must_use]
    pub fn then_by(mut self, order: OrderBy) -> Self {
        self.statement.order_by.push(order);
        self
    }
}

impl<S: Complete, R> Select<S, R> {
    /// Adds a row-locking clause (PostgreSQL; ignored by SQL Server).
    #[must_use]
    pub fn lock(mut self, lock: ForLock) -> Self {
        self.statement.lock = Some(lock);
        self
    }

    /// Adds a query hint (SQL Server; ignored by PostgreSQL).
    #[must_use]
    pub fn option(mut self, option: QueryOption) -> Self {
        self.statement.options.push(option);
        self
    }

    /// Builds the query.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the template is incomplete or uses
    /// prepared-query parameters.
    pub fn build(self) -> Result<Query<R>> {
        Query::new(Statement::Select(self.statement), self.selector)
    }

    pub(crate) fn into_parts(self) -> (SelectStatement, Selector<R>) {
        (self.statement, self.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    fn invoice() -> (Table, Column<i32>) {
        let t = Table::new(None, "Invoice").unwrap();
        let id = t.column("Id");
        (t, id)
    }

    #[test]
    fn test_where_single_assignment() {
        let (t, id) = invoice();
        let mut stmt = SelectStatement::new(SelectCore::new(vec![id.to_expr()]));
        stmt.set_from(&t);
        stmt.set_where(id.eq(1)).unwrap();
        assert_eq!(stmt.set_where(id.eq(2)).unwrap_err(), QueryError::WhereAlreadySet);
    }

    #[test]
    fn test_having_single_assignment() {
        let (_, id) = invoice();
        let mut stmt = SelectStatement::new(SelectCore::new(vec![id.to_expr()]));
        stmt.set_having(id.gt(1)).unwrap();
        assert_eq!(stmt.set_having(id.gt(2)).unwrap_err(), QueryError::HavingAlreadySet);
    }

    #[test]
    fn test_top_zero_rejected() {
        let (_, id) = invoice();
        let err = select(move |r| r.get(&id)).top(0).err();
        assert_eq!(err, Some(QueryError::InvalidTop));
    }

    #[test]
    fn test_missing_from() {
        let (_, id) = invoice();
        let stmt = SelectStatement::new(SelectCore::new(vec![id.to_expr()]));
        assert_eq!(stmt.validate().unwrap_err(), QueryError::MissingFrom);
    }

    #[test]
    fn test_no_select_fields() {
        let (t, _) = invoice();
        let result = select(|_: &mut Row<'_>| Ok(())).from(&t).build();
        assert_eq!(result.err(), Some(QueryError::NoSelectFields));
    }

    #[test]
    fn test_selector_collects_fields() {
        let (t, id) = invoice();
        let q = select(move |r| r.get(&id)).from(&t);
        assert_eq!(q.statement().head.fields.len(), 1);
    }

    #[test]
    fn test_union_parts_in_order() {
        let (a, a_id) = invoice();
        let b = Table::new(None, "Archive").unwrap();
        let b_id: Column<i32> = b.column("Id");

        let q = select(move |r| r.get(&a_id))
            .from(&a)
            .union_all_select(move |r| r.get(&b_id))
            .from(&b);
        let kinds: Vec<_> = q.statement().parts().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![None, Some(UnionKind::UnionAll)]);
    }

    #[test]
    fn test_alias_rule() {
        let (t, id) = invoice();
        let mut core = SelectCore::new(vec![id.to_expr()]);
        core.from = Some(t.clone());
        assert!(!core.uses_alias());
        core.joins.push(Join {
            kind: JoinKind::Inner,
            table: t,
            on: id.eq(1),
        });
        assert!(core.uses_alias());
    }
}
