//! Condition tree.
//!
//! Conditions are built from typed terms (columns, functions, arithmetic) and
//! combined with [`Condition::and`] / [`Condition::or`]. Every node renders
//! itself given a dialect, the alias mode of the enclosing statement and an
//! optional parameter sink.
//!
//! ```rust
//! use oxide_query_core::prelude::*;
//!
//! let t = Table::new(None, "Invoice").unwrap();
//! let id: Column<i32> = t.column("Id");
//! let number: Column<String> = t.column("Number");
//!
//! let cond = id.gt(10).and(number.like("INV-%"));
//! assert_eq!(cond.to_inline_sql(&SqlServerDialect), "(Id>10) AND (Number LIKE N'INV-%')");
//! ```

use std::ops::Not;
use std::sync::Arc;

use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::expr::{Expr, Operand};
use crate::params::Parameters;
use crate::query::{OrderBy, Query, SortOrder, Statement};
use crate::schema::{Column, NullableColumn};

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// SQL symbol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Pattern-match flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeKind {
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// Case-insensitive `LIKE`.
    ILike,
    /// Case-insensitive `NOT LIKE`.
    NotILike,
}

impl LikeKind {
    /// Whether the match is case-insensitive.
    #[must_use]
    pub const fn is_case_insensitive(self) -> bool {
        matches!(self, Self::ILike | Self::NotILike)
    }

    /// Whether the match is negated.
    #[must_use]
    pub const fn is_negated(self) -> bool {
        matches!(self, Self::NotLike | Self::NotILike)
    }
}

/// A boolean condition node.
#[derive(Debug, Clone)]
pub enum Condition {
    /// `left op right`
    Compare {
        /// Left operand.
        left: Expr,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        right: Expr,
    },
    /// `(left) AND (right)`
    And(Box<Condition>, Box<Condition>),
    /// `(left) OR (right)`
    Or(Box<Condition>, Box<Condition>),
    /// `NOT (inner)`
    Not(Box<Condition>),
    /// `expr [NOT] BETWEEN low AND high`
    Between {
        /// Tested expression.
        expr: Expr,
        /// Lower bound.
        low: Expr,
        /// Upper bound.
        high: Expr,
        /// `NOT BETWEEN`.
        negated: bool,
    },
    /// `expr [NOT] IN(items)`; never empty.
    InList {
        /// Tested expression.
        expr: Expr,
        /// Candidate values.
        items: Vec<Expr>,
        /// `NOT IN`.
        negated: bool,
    },
    /// `expr [NOT] IN(subquery)`
    InQuery {
        /// Tested expression.
        expr: Expr,
        /// Nested statement.
        query: Arc<Statement>,
        /// `NOT IN`.
        negated: bool,
    },
    /// `[NOT] EXISTS(subquery)`
    Exists {
        /// Nested statement.
        query: Arc<Statement>,
        /// `NOT EXISTS`.
        negated: bool,
    },
    /// `expr IS [NOT] NULL`
    IsNull {
        /// Tested expression.
        expr: Expr,
        /// `IS NOT NULL`.
        negated: bool,
    },
    /// Pattern match.
    Like {
        /// Tested expression.
        expr: Expr,
        /// Pattern.
        pattern: Expr,
        /// Flavour.
        kind: LikeKind,
    },
    /// SQL text emitted verbatim.
    Raw(String),
}

impl Condition {
    /// `(self) AND (other)`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// `(self) OR (other)`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// SQL text emitted verbatim. Never pass user input here.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// Joins conditions with AND; `None` when there are none.
    pub fn all(conditions: impl IntoIterator<Item = Self>) -> Option<Self> {
        conditions.into_iter().reduce(Self::and)
    }

    /// Joins conditions with OR; `None` when there are none.
    pub fn any(conditions: impl IntoIterator<Item = Self>) -> Option<Self> {
        conditions.into_iter().reduce(Self::or)
    }

    /// Renders the condition.
    pub fn render<D: Dialect + ?Sized>(
        &self,
        sql: &mut String,
        dialect: &D,
        use_alias: bool,
        params: Option<&mut Parameters>,
    ) {
        let mut params = params;
        match self {
            Self::Compare { left, op, right } => {
                left.render(sql, dialect, use_alias, params.as_deref_mut());
                sql.push_str(op.as_str());
                right.render(sql, dialect, use_alias, params);
            }
            Self::And(left, right) | Self::Or(left, right) => {
                let keyword = if matches!(self, Self::And(..)) { " AND " } else { " OR " };
                sql.push('(');
                left.render(sql, dialect, use_alias, params.as_deref_mut());
                sql.push(')');
                sql.push_str(keyword);
                sql.push('(');
                right.render(sql, dialect, use_alias, params);
                sql.push(')');
            }
            Self::Not(inner) => {
                sql.push_str("NOT (");
                inner.render(sql, dialect, use_alias, params);
                sql.push(')');
            }
            Self::Between {
                expr,
                low,
                high,
                negated,
            } => {
                expr.render(sql, dialect, use_alias, params.as_deref_mut());
                sql.push_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                low.render(sql, dialect, use_alias, params.as_deref_mut());
                sql.push_str(" AND ");
                high.render(sql, dialect, use_alias, params);
            }
            Self::InList {
                expr,
                items,
                negated,
            } => {
                expr.render(sql, dialect, use_alias, params.as_deref_mut());
                sql.push_str(if *negated { " NOT IN(" } else { " IN(" });
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        sql.push(',');
                    }
                    item.render(sql, dialect, use_alias, params.as_deref_mut());
                }
                sql.push(')');
            }
            Self::InQuery {
                expr,
                query,
                negated,
            } => {
                expr.render(sql, dialect, use_alias, params.as_deref_mut());
                sql.push_str(if *negated { " NOT IN(" } else { " IN(" });
                dialect.write_statement(sql, query, use_alias, params);
                sql.push(')');
            }
            Self::Exists { query, negated } => {
                sql.push_str(if *negated { "NOT EXISTS(" } else { "EXISTS(" });
                dialect.write_statement(sql, query, use_alias, params);
                sql.push(')');
            }
            Self::IsNull { expr, negated } => {
                expr.render(sql, dialect, use_alias, params);
                sql.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Self::Like {
                expr,
                pattern,
                kind,
            } => dialect.write_like(sql, expr, pattern, *kind, use_alias, params),
            Self::Raw(text) => sql.push_str(text),
        }
    }

    /// Renders with values inlined as literals.
    #[must_use]
    pub fn to_inline_sql<D: Dialect + ?Sized>(&self, dialect: &D) -> String {
        let mut sql = String::new();
        self.render(&mut sql, dialect, false, None);
        sql
    }

    /// Whether a nested statement appears anywhere in the tree.
    #[must_use]
    pub fn has_subquery(&self) -> bool {
        match self {
            Self::InQuery { .. } | Self::Exists { .. } => true,
            Self::And(left, right) | Self::Or(left, right) => {
                left.has_subquery() || right.has_subquery()
            }
            Self::Not(inner) => inner.has_subquery(),
            _ => false,
        }
    }

    /// Returns the first unbound prepared-parameter slot, if any.
    #[must_use]
    pub fn first_slot(&self) -> Option<usize> {
        match self {
            Self::Compare { left, right, .. } => left.first_slot().or_else(|| right.first_slot()),
            Self::And(left, right) | Self::Or(left, right) => {
                left.first_slot().or_else(|| right.first_slot())
            }
            Self::Not(inner) => inner.first_slot(),
            Self::Between {
                expr, low, high, ..
            } => expr
                .first_slot()
                .or_else(|| low.first_slot())
                .or_else(|| high.first_slot()),
            Self::InList { expr, items, .. } => expr
                .first_slot()
                .or_else(|| items.iter().find_map(Expr::first_slot)),
            Self::InQuery { expr, query, .. } => {
                expr.first_slot().or_else(|| query.first_slot())
            }
            Self::Exists { query, .. } => query.first_slot(),
            Self::IsNull { expr, .. } => expr.first_slot(),
            Self::Like { expr, pattern, .. } => expr.first_slot().or_else(|| pattern.first_slot()),
            Self::Raw(_) => None,
        }
    }
}

impl Not for Condition {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

/// `NOT (condition)`.
#[must_use]
pub fn not(condition: Condition) -> Condition {
    !condition
}

/// `EXISTS(query)`.
#[must_use]
pub fn exists<R>(query: &Query<R>) -> Condition {
    Condition::Exists {
        query: query.statement().clone(),
        negated: false,
    }
}

/// `NOT EXISTS(query)`.
#[must_use]
pub fn not_exists<R>(query: &Query<R>) -> Condition {
    Condition::Exists {
        query: query.statement().clone(),
        negated: true,
    }
}

fn compare(left: Expr, op: CompareOp, right: Expr) -> Condition {
    Condition::Compare { left, op, right }
}

fn in_list<T, O: Operand<T>>(
    expr: Expr,
    items: impl IntoIterator<Item = O>,
    negated: bool,
) -> Result<Condition> {
    let items: Vec<Expr> = items.into_iter().map(Operand::into_expr).collect();
    if items.is_empty() {
        return Err(QueryError::EmptyInList);
    }
    Ok(Condition::InList {
        expr,
        items,
        negated,
    })
}

/// A typed term conditions can be built from.
///
/// Implemented by columns, functions and typed expressions.
pub trait Term<T> {
    /// The untyped node.
    fn to_expr(&self) -> Expr;

    /// `self = value`
    fn eq(&self, value: impl Operand<T>) -> Condition {
        compare(self.to_expr(), CompareOp::Eq, value.into_expr())
    }

    /// `self <> value`
    fn ne(&self, value: impl Operand<T>) -> Condition {
        compare(self.to_expr(), CompareOp::Ne, value.into_expr())
    }

    /// `self < value`
    fn lt(&self, value: impl Operand<T>) -> Condition {
        compare(self.to_expr(), CompareOp::Lt, value.into_expr())
    }

    /// `self <= value`
    fn le(&self, value: impl Operand<T>) -> Condition {
        compare(self.to_expr(), CompareOp::Le, value.into_expr())
    }

    /// `self > value`
    fn gt(&self, value: impl Operand<T>) -> Condition {
        compare(self.to_expr(), CompareOp::Gt, value.into_expr())
    }

    /// `self >= value`
    fn ge(&self, value: impl Operand<T>) -> Condition {
        compare(self.to_expr(), CompareOp::Ge, value.into_expr())
    }

    /// `self IS NULL`
    fn is_null(&self) -> Condition {
        Condition::IsNull {
            expr: self.to_expr(),
            negated: false,
        }
    }

    /// `self IS NOT NULL`
    fn is_not_null(&self) -> Condition {
        Condition::IsNull {
            expr: self.to_expr(),
            negated: true,
        }
    }

    /// `self BETWEEN low AND high`
    fn between(&self, low: impl Operand<T>, high: impl Operand<T>) -> Condition {
        Condition::Between {
            expr: self.to_expr(),
            low: low.into_expr(),
            high: high.into_expr(),
            negated: false,
        }
    }

    /// `self NOT BETWEEN low AND high`
    fn not_between(&self, low: impl Operand<T>, high: impl Operand<T>) -> Condition {
        Condition::Between {
            expr: self.to_expr(),
            low: low.into_expr(),
            high: high.into_expr(),
            negated: true,
        }
    }

    /// `self IN(items)`
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyInList`] if `items` is empty.
    fn in_list<O: Operand<T>>(&self, items: impl IntoIterator<Item = O>) -> Result<Condition> {
        in_list(self.to_expr(), items, false)
    }

    /// `self NOT IN(items)`
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyInList`] if `items` is empty.
    fn not_in_list<O: Operand<T>>(
        &self,
        items: impl IntoIterator<Item = O>,
    ) -> Result<Condition> {
        in_list(self.to_expr(), items, true)
    }

    /// Ascending sort on this term.
    fn asc(&self) -> OrderBy {
        OrderBy {
            expr: self.to_expr(),
            order: SortOrder::Asc,
        }
    }

    /// Descending sort on this term.
    fn desc(&self) -> OrderBy {
        OrderBy {
            expr: self.to_expr(),
            order: SortOrder::Desc,
        }
    }

    /// `self IN(subquery)`
    fn in_query(&self, query: &Query<T>) -> Condition {
        Condition::InQuery {
            expr: self.to_expr(),
            query: query.statement().clone(),
            negated: false,
        }
    }

    /// `self NOT IN(subquery)`
    fn not_in_query(&self, query: &Query<T>) -> Condition {
        Condition::InQuery {
            expr: self.to_expr(),
            query: query.statement().clone(),
            negated: true,
        }
    }
}

/// Pattern matching on text terms.
pub trait TextTerm: Term<String> {
    /// `self LIKE pattern`
    fn like(&self, pattern: impl Operand<String>) -> Condition {
        self.pattern(pattern, LikeKind::Like)
    }

    /// `self NOT LIKE pattern`
    fn not_like(&self, pattern: impl Operand<String>) -> Condition {
        self.pattern(pattern, LikeKind::NotLike)
    }

    /// Case-insensitive `LIKE`.
    fn ilike(&self, pattern: impl Operand<String>) -> Condition {
        self.pattern(pattern, LikeKind::ILike)
    }

    /// Case-insensitive `NOT LIKE`.
    fn not_ilike(&self, pattern: impl Operand<String>) -> Condition {
        self.pattern(pattern, LikeKind::NotILike)
    }

    #[doc(hidden)]
    fn pattern(&self, pattern: impl Operand<String>, kind: LikeKind) -> Condition {
        Condition::Like {
            expr: self.to_expr(),
            pattern: pattern.into_expr(),
            kind,
        }
    }
}

impl<X: Term<String> + ?Sized> TextTerm for X {}

impl<T> Term<T> for Column<T> {
    fn to_expr(&self) -> Expr {
        Expr::Column(self.column_ref().clone())
    }
}

impl<T> Term<T> for NullableColumn<T> {
    fn to_expr(&self) -> Expr {
        Expr::Column(self.column_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{PostgresDialect, SqlServerDialect};
    use crate::schema::Table;
    use crate::value::SqlValue;

    fn invoice() -> (Table, Column<i32>, Column<String>, NullableColumn<i32>) {
        let t = Table::new(None, "Invoice").unwrap();
        let id = t.column("Id");
        let number = t.column("Number");
        let customer = t.nullable_column("CustomerId");
        (t, id, number, customer)
    }

    #[test]
    fn test_compare_compact() {
        let (_, id, _, _) = invoice();
        let mut params = Parameters::new(&SqlServerDialect);
        let mut sql = String::new();
        id.eq(5).render(&mut sql, &SqlServerDialect, false, Some(&mut params));
        assert_eq!(sql, "Id=@0");
    }

    #[test]
    fn test_and_or_parenthesised() {
        let (_, id, number, _) = invoice();
        let cond = id.gt(1).or(id.lt(0)).and(number.ne("x"));
        assert_eq!(
            cond.to_inline_sql(&SqlServerDialect),
            "((Id>1) OR (Id<0)) AND (Number<>N'x')"
        );
    }

    #[test]
    fn test_empty_in_list_rejected() {
        let (_, id, _, _) = invoice();
        let err = id.in_list(Vec::<i32>::new()).unwrap_err();
        assert_eq!(err, QueryError::EmptyInList);
        assert!(id.not_in_list(Vec::<i32>::new()).is_err());
    }

    #[test]
    fn test_in_list_renders_items() {
        let (_, id, _, _) = invoice();
        let mut params = Parameters::new(&SqlServerDialect);
        let mut sql = String::new();
        id.in_list([1, 2, 3])
            .unwrap()
            .render(&mut sql, &SqlServerDialect, false, Some(&mut params));
        assert_eq!(sql, "Id IN(@0,@1,@2)");
    }

    #[test]
    fn test_parameter_order_is_left_to_right() {
        let (_, id, number, _) = invoice();
        let cond = number.eq("a").and(id.between(10, 20)).or(id.eq(30));

        for _ in 0..2 {
            let mut params = Parameters::new(&PostgresDialect);
            let mut sql = String::new();
            cond.render(&mut sql, &PostgresDialect, false, Some(&mut params));
            assert_eq!(
                sql,
                r#"(("Number"=$1) AND ("Id" BETWEEN $2 AND $3)) OR ("Id"=$4)"#
            );
            let values: Vec<SqlValue> = params
                .resolve(None)
                .unwrap()
                .into_iter()
                .map(|p| p.value)
                .collect();
            assert_eq!(
                values,
                vec![
                    SqlValue::Text(String::from("a")),
                    SqlValue::Int(10),
                    SqlValue::Int(20),
                    SqlValue::Int(30),
                ]
            );
        }
    }

    #[test]
    fn test_null_checks() {
        let (_, _, _, customer) = invoice();
        assert_eq!(
            customer.is_null().to_inline_sql(&SqlServerDialect),
            "CustomerId IS NULL"
        );
        assert_eq!(
            customer.is_not_null().to_inline_sql(&SqlServerDialect),
            "CustomerId IS NOT NULL"
        );
    }

    #[test]
    fn test_not() {
        let (_, id, _, _) = invoice();
        assert_eq!(not(id.eq(1)).to_inline_sql(&SqlServerDialect), "NOT (Id=1)");
    }

    #[test]
    fn test_ilike_per_dialect() {
        let (_, _, number, _) = invoice();
        let cond = number.ilike("inv%");
        assert_eq!(
            cond.to_inline_sql(&SqlServerDialect),
            "LOWER(Number) LIKE LOWER(N'inv%')"
        );
        assert_eq!(
            cond.to_inline_sql(&PostgresDialect),
            "\"Number\" ILIKE 'inv%'"
        );
        assert_eq!(
            number.not_ilike("x").to_inline_sql(&PostgresDialect),
            "\"Number\" NOT ILIKE 'x'"
        );
    }

    #[test]
    fn test_all_and_any() {
        let (_, id, _, _) = invoice();
        assert!(Condition::all(Vec::new()).is_none());
        let cond = Condition::any([id.eq(1), id.eq(2)]).unwrap();
        assert_eq!(cond.to_inline_sql(&SqlServerDialect), "(Id=1) OR (Id=2)");
    }

    #[test]
    fn test_column_comparison() {
        let a = Table::new(None, "A").unwrap();
        let b = Table::new(None, "B").unwrap();
        let a_id: Column<i32> = a.column("Id");
        let b_id: Column<i32> = b.column("AId");

        let mut sql = String::new();
        a_id.eq(&b_id).render(&mut sql, &SqlServerDialect, true, None);
        assert_eq!(sql, format!("{}.Id={}.AId", a.alias(), b.alias()));
    }
}
