//! Clause building blocks shared by the statement templates.

use crate::condition::Condition;
use crate::expr::Expr;
use crate::schema::Table;

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
}

impl JoinKind {
    /// SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// A joined table.
#[derive(Debug, Clone)]
pub struct Join {
    /// Join flavour.
    pub kind: JoinKind,
    /// Joined table instance.
    pub table: Table,
    /// `ON` condition.
    pub on: Condition,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone)]
pub struct OrderBy {
    /// Sorted expression.
    pub expr: Expr,
    /// Direction.
    pub order: SortOrder,
}

/// SQL Server table hint, emitted as `WITH(...)` after the FROM table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableHint {
    /// `NOLOCK`
    NoLock,
    /// `UPDLOCK`
    UpdLock,
    /// `ROWLOCK`
    RowLock,
    /// `READPAST`
    ReadPast,
    /// `HOLDLOCK`
    HoldLock,
    /// `NOWAIT`
    NoWait,
}

impl TableHint {
    /// SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoLock => "NOLOCK",
            Self::UpdLock => "UPDLOCK",
            Self::RowLock => "ROWLOCK",
            Self::ReadPast => "READPAST",
            Self::HoldLock => "HOLDLOCK",
            Self::NoWait => "NOWAIT",
        }
    }
}

/// SQL Server query hint, emitted as `OPTION(...)` at the end of a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOption {
    /// `RECOMPILE`
    Recompile,
    /// `OPTIMIZE FOR UNKNOWN`
    OptimizeForUnknown,
    /// `MAXDOP n`
    MaxDop(u32),
    /// `FAST n`
    Fast(u32),
}

impl QueryOption {
    /// SQL text.
    #[must_use]
    pub fn to_sql(self) -> String {
        match self {
            Self::Recompile => String::from("RECOMPILE"),
            Self::OptimizeForUnknown => String::from("OPTIMIZE FOR UNKNOWN"),
            Self::MaxDop(n) => format!("MAXDOP {n}"),
            Self::Fast(n) => format!("FAST {n}"),
        }
    }
}

/// Lock strength of a PostgreSQL row-locking clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrength {
    /// `FOR UPDATE`
    Update,
    /// `FOR NO KEY UPDATE`
    NoKeyUpdate,
    /// `FOR SHARE`
    Share,
}

/// What a locking read does when a row is already locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockWait {
    /// Block until the lock is released.
    Wait,
    /// `NOWAIT`
    NoWait,
    /// `SKIP LOCKED`
    SkipLocked,
}

/// PostgreSQL row-locking clause (`FOR UPDATE ...`).
#[derive(Debug, Clone)]
pub struct ForLock {
    /// Lock strength.
    pub strength: LockStrength,
    /// Tables to lock; all when empty.
    pub of: Vec<Table>,
    /// Behaviour on contention.
    pub wait: LockWait,
}

impl ForLock {
    /// `FOR UPDATE`
    #[must_use]
    pub const fn update() -> Self {
        Self::new(LockStrength::Update)
    }

    /// `FOR NO KEY UPDATE`
    #[must_use]
    pub const fn no_key_update() -> Self {
        Self::new(LockStrength::NoKeyUpdate)
    }

    /// `FOR SHARE`
    #[must_use]
    pub const fn share() -> Self {
        Self::new(LockStrength::Share)
    }

    const fn new(strength: LockStrength) -> Self {
        Self {
            strength,
            of: Vec::new(),
            wait: LockWait::Wait,
        }
    }

    /// Restricts locking to `table`.
    #[must_use]
    pub fn of(mut self, table: &impl AsRef<Table>) -> Self {
        self.of.push(table.as_ref().clone());
        self
    }

    /// Fails immediately instead of waiting.
    #[must_use]
    pub fn no_wait(mut self) -> Self {
        self.wait = LockWait::NoWait;
        self
    }

    /// Skips rows that are already locked.
    #[must_use]
    pub fn skip_locked(mut self) -> Self {
        self.wait = LockWait::SkipLocked;
        self
    }
}

/// How a SELECT is combined with the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    /// `UNION`
    Union,
    /// `UNION ALL`
    UnionAll,
}

impl UnionKind {
    /// SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
        }
    }
}
