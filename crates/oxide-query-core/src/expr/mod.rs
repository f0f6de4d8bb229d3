//! Expression nodes.
//!
//! [`Expr`] is the untyped node stored in templates. The typed surface is
//! [`Operand<T>`] (anything usable where a `T` is expected) and [`Term<T>`]
//! (anything a condition can be built from, see [`crate::condition`]).

mod function;

use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Sub};

pub use function::{
    avg, coalesce, count, count_all, count_distinct, current_timestamp, length, lower, max, min,
    new_guid, sum, upper, Function, FunctionCall, FunctionKind, NullableFunction,
};

use crate::condition::Term;
use crate::dialect::Dialect;
use crate::params::Parameters;
use crate::schema::{Column, ColumnRef, NullableColumn};
use crate::value::{ColumnValue, DbType, SqlValue};

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl ArithOp {
    /// SQL symbol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// An untyped expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference.
    Column(ColumnRef),
    /// A value, bound as a parameter or inlined as a literal.
    Value(DbType, SqlValue),
    /// A prepared-query parameter, materialised per execution.
    Slot {
        /// Index into the prepared parameter list.
        index: usize,
        /// Declared type.
        db_type: DbType,
    },
    /// Scalar or aggregate function call.
    Function(FunctionCall),
    /// Binary arithmetic, always parenthesised.
    Arithmetic {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: ArithOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// SQL text emitted verbatim.
    Raw(String),
}

impl Expr {
    /// Renders the expression.
    ///
    /// With `params`, values become placeholders registered in the sink; without,
    /// they are inlined as escaped literals.
    pub fn render<D: Dialect + ?Sized>(
        &self,
        sql: &mut String,
        dialect: &D,
        use_alias: bool,
        params: Option<&mut Parameters>,
    ) {
        match self {
            Self::Column(column) => dialect.write_column(sql, column, use_alias),
            Self::Value(db_type, value) => match params {
                Some(params) => sql.push_str(&params.add(*db_type, value.clone())),
                None => dialect.write_literal(sql, value),
            },
            Self::Slot { index, db_type } => match params {
                Some(params) => sql.push_str(&params.add_slot(*index, *db_type)),
                None => sql.push('?'),
            },
            Self::Function(call) => dialect.write_function(sql, call, use_alias, params),
            Self::Arithmetic { left, op, right } => {
                let mut params = params;
                sql.push('(');
                left.render(sql, dialect, use_alias, params.as_deref_mut());
                sql.push_str(op.as_str());
                right.render(sql, dialect, use_alias, params);
                sql.push(')');
            }
            Self::Raw(text) => sql.push_str(text),
        }
    }

    /// Returns the first unbound prepared-parameter slot, if any.
    #[must_use]
    pub fn first_slot(&self) -> Option<usize> {
        match self {
            Self::Slot { index, .. } => Some(*index),
            Self::Function(call) => call.args.iter().find_map(Self::first_slot),
            Self::Arithmetic { left, right, .. } => left.first_slot().or_else(|| right.first_slot()),
            Self::Column(_) | Self::Value(..) | Self::Raw(_) => None,
        }
    }
}

/// Anything usable where a value of type `T` is expected.
pub trait Operand<T> {
    /// Converts into an expression node.
    fn into_expr(self) -> Expr;
}

impl<T: ColumnValue> Operand<T> for T {
    fn into_expr(self) -> Expr {
        Expr::Value(T::DB_TYPE, self.to_sql_value())
    }
}

impl Operand<String> for &str {
    fn into_expr(self) -> Expr {
        Expr::Value(DbType::Text, SqlValue::Text(self.to_owned()))
    }
}

impl<T> Operand<T> for &Column<T> {
    fn into_expr(self) -> Expr {
        Expr::Column(self.column_ref().clone())
    }
}

impl<T> Operand<T> for &NullableColumn<T> {
    fn into_expr(self) -> Expr {
        Expr::Column(self.column_ref().clone())
    }
}

/// A typed expression, produced by arithmetic or [`TypedExpr::raw`].
pub struct TypedExpr<T> {
    expr: Expr,
    _type: PhantomData<fn() -> T>,
}

impl<T> TypedExpr<T> {
    /// Wraps an untyped node.
    #[must_use]
    pub const fn new(expr: Expr) -> Self {
        Self {
            expr,
            _type: PhantomData,
        }
    }

    /// SQL text emitted verbatim. Never pass user input here.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(Expr::Raw(sql.into()))
    }

    /// The untyped node.
    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl<T> Clone for TypedExpr<T> {
    fn clone(&self) -> Self {
        Self::new(self.expr.clone())
    }
}

impl<T> std::fmt::Debug for TypedExpr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.expr.fmt(f)
    }
}

impl<T> Operand<T> for TypedExpr<T> {
    fn into_expr(self) -> Expr {
        self.expr
    }
}

impl<T> Term<T> for TypedExpr<T> {
    fn to_expr(&self) -> Expr {
        self.expr.clone()
    }
}

/// Column types arithmetic is defined for.
pub trait Numeric: ColumnValue {}

impl Numeric for u8 {}
impl Numeric for i16 {}
impl Numeric for i32 {}
impl Numeric for i64 {}
impl Numeric for f32 {}
impl Numeric for f64 {}

fn arithmetic<T>(left: Expr, op: ArithOp, right: Expr) -> TypedExpr<T> {
    TypedExpr::new(Expr::Arithmetic {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}

macro_rules! impl_arithmetic {
    ($($lhs:ty),+ $(,)?) => {
        $(
            impl<T: Numeric, O: Operand<T>> Add<O> for $lhs {
                type Output = TypedExpr<T>;

                fn add(self, rhs: O) -> TypedExpr<T> {
                    arithmetic(self.to_expr(), ArithOp::Add, rhs.into_expr())
                }
            }

            impl<T: Numeric, O: Operand<T>> Sub<O> for $lhs {
                type Output = TypedExpr<T>;

                fn sub(self, rhs: O) -> TypedExpr<T> {
                    arithmetic(self.to_expr(), ArithOp::Sub, rhs.into_expr())
                }
            }

            impl<T: Numeric, O: Operand<T>> Mul<O> for $lhs {
                type Output = TypedExpr<T>;

                fn mul(self, rhs: O) -> TypedExpr<T> {
                    arithmetic(self.to_expr(), ArithOp::Mul, rhs.into_expr())
                }
            }

            impl<T: Numeric, O: Operand<T>> Div<O> for $lhs {
                type Output = TypedExpr<T>;

                fn div(self, rhs: O) -> TypedExpr<T> {
                    arithmetic(self.to_expr(), ArithOp::Div, rhs.into_expr())
                }
            }
        )+
    };
}

impl_arithmetic!(TypedExpr<T>, &Column<T>, &NullableColumn<T>);
