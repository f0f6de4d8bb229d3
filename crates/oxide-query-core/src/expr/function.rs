//! Scalar and aggregate functions.
//!
//! Names that differ between dialects (`LEN`/`LENGTH`, `GETDATE()`/`NOW()`)
//! are resolved by the dialect at render time, so a template stays portable.

use std::marker::PhantomData;

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::{Expr, Numeric, Operand};
use crate::condition::Term;

/// Which function a call invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionKind {
    /// `COUNT(*)`
    CountAll,
    /// `COUNT(x)`
    Count,
    /// `COUNT(DISTINCT x)`
    CountDistinct,
    /// `SUM(x)`
    Sum,
    /// `AVG(x)`
    Avg,
    /// `MIN(x)`
    Min,
    /// `MAX(x)`
    Max,
    /// `COALESCE(x, y, ...)`
    Coalesce,
    /// `LOWER(x)`
    Lower,
    /// `UPPER(x)`
    Upper,
    /// String length.
    Length,
    /// Current date and time.
    CurrentTimestamp,
    /// New random identifier.
    NewGuid,
    /// Any other function, by name.
    Custom(String),
}

/// An untyped function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Function invoked.
    pub kind: FunctionKind,
    /// Arguments.
    pub args: Vec<Expr>,
}

macro_rules! function_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name<T> {
            call: FunctionCall,
            _type: PhantomData<fn() -> T>,
        }

        impl<T> $name<T> {
            fn new(kind: FunctionKind, args: Vec<Expr>) -> Self {
                Self {
                    call: FunctionCall { kind, args },
                    _type: PhantomData,
                }
            }

            /// Calls a function the library has no builder for.
            #[must_use]
            pub fn custom(name: impl Into<String>, args: Vec<Expr>) -> Self {
                Self::new(FunctionKind::Custom(name.into()), args)
            }

            /// The untyped call.
            #[must_use]
            pub const fn call(&self) -> &FunctionCall {
                &self.call
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                Self::new(self.call.kind.clone(), self.call.args.clone())
            }
        }

        impl<T> std::fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.call.fmt(f)
            }
        }

        impl<T> Operand<T> for $name<T> {
            fn into_expr(self) -> Expr {
                Expr::Function(self.call)
            }
        }

        impl<T> Term<T> for $name<T> {
            fn to_expr(&self) -> Expr {
                Expr::Function(self.call.clone())
            }
        }
    };
}

function_type!(
    /// A function whose result is never `NULL`.
    Function
);

function_type!(
    /// A function that may return `NULL`, such as an aggregate over no rows.
    NullableFunction
);

/// `COUNT(*)`.
#[must_use]
pub fn count_all() -> Function<i64> {
    Function::new(FunctionKind::CountAll, Vec::new())
}

/// `COUNT(x)`: non-null values of `x`.
#[must_use]
pub fn count<T>(term: &impl Term<T>) -> Function<i64> {
    Function::new(FunctionKind::Count, vec![term.to_expr()])
}

/// `COUNT(DISTINCT x)`.
#[must_use]
pub fn count_distinct<T>(term: &impl Term<T>) -> Function<i64> {
    Function::new(FunctionKind::CountDistinct, vec![term.to_expr()])
}

/// `SUM(x)`.
#[must_use]
pub fn sum<T: Numeric>(term: &impl Term<T>) -> NullableFunction<T> {
    NullableFunction::new(FunctionKind::Sum, vec![term.to_expr()])
}

/// `AVG(x)`.
#[must_use]
pub fn avg<T: Numeric>(term: &impl Term<T>) -> NullableFunction<T> {
    NullableFunction::new(FunctionKind::Avg, vec![term.to_expr()])
}

/// `MIN(x)`.
#[must_use]
pub fn min<T>(term: &impl Term<T>) -> NullableFunction<T> {
    NullableFunction::new(FunctionKind::Min, vec![term.to_expr()])
}

/// `MAX(x)`.
#[must_use]
pub fn max<T>(term: &impl Term<T>) -> NullableFunction<T> {
    NullableFunction::new(FunctionKind::Max, vec![term.to_expr()])
}

/// `COALESCE(x, fallback)`.
#[must_use]
pub fn coalesce<T>(term: &impl Term<T>, fallback: impl Operand<T>) -> Function<T> {
    Function::new(FunctionKind::Coalesce, vec![term.to_expr(), fallback.into_expr()])
}

/// `LOWER(x)`.
#[must_use]
pub fn lower(term: &impl Term<String>) -> Function<String> {
    Function::new(FunctionKind::Lower, vec![term.to_expr()])
}

/// `UPPER(x)`.
#[must_use]
pub fn upper(term: &impl Term<String>) -> Function<String> {
    Function::new(FunctionKind::Upper, vec![term.to_expr()])
}

/// Character length of `x`.
#[must_use]
pub fn length(term: &impl Term<String>) -> Function<i32> {
    Function::new(FunctionKind::Length, vec![term.to_expr()])
}

/// The database server's current date and time.
#[must_use]
pub fn current_timestamp() -> Function<NaiveDateTime> {
    Function::new(FunctionKind::CurrentTimestamp, Vec::new())
}

/// A new random identifier generated by the database.
#[must_use]
pub fn new_guid() -> Function<Uuid> {
    Function::new(FunctionKind::NewGuid, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, PostgresDialect, SqlServerDialect};
    use crate::schema::{Column, NullableColumn, Table};

    fn render<D: Dialect, T>(dialect: &D, term: &impl Term<T>) -> String {
        let mut sql = String::new();
        term.to_expr().render(&mut sql, dialect, false, None);
        sql
    }

    #[test]
    fn test_aggregates() {
        let t = Table::new(None, "Invoice").unwrap();
        let total: Column<i64> = t.column("Total");

        assert_eq!(render(&SqlServerDialect, &count_all()), "COUNT(*)");
        assert_eq!(render(&SqlServerDialect, &sum(&total)), "SUM(Total)");
        assert_eq!(
            render(&SqlServerDialect, &count_distinct(&total)),
            "COUNT(DISTINCT Total)"
        );
    }

    #[test]
    fn test_dialect_spellings() {
        let t = Table::new(None, "customer").unwrap();
        let name: Column<String> = t.column("name");

        assert_eq!(render(&SqlServerDialect, &length(&name)), "LEN(name)");
        assert_eq!(render(&PostgresDialect, &length(&name)), "LENGTH(name)");
        assert_eq!(render(&SqlServerDialect, &current_timestamp()), "GETDATE()");
        assert_eq!(render(&PostgresDialect, &current_timestamp()), "NOW()");
        assert_eq!(render(&SqlServerDialect, &new_guid()), "NEWID()");
        assert_eq!(render(&PostgresDialect, &new_guid()), "gen_random_uuid()");
    }

    #[test]
    fn test_coalesce_with_literal() {
        let t = Table::new(None, "customer").unwrap();
        let nick: NullableColumn<String> = t.nullable_column("nick");

        assert_eq!(
            render(&PostgresDialect, &coalesce(&nick, "none")),
            "COALESCE(nick,'none')"
        );
    }

    #[test]
    fn test_custom_function() {
        let f: Function<i32> = Function::custom("ABS", vec![Expr::Raw(String::from("-1"))]);
        assert_eq!(render(&SqlServerDialect, &f), "ABS(-1)");
    }
}
