//! Table and column descriptors.
//!
//! A [`Table`] is created once per table *instance* and receives a
//! process-unique alias from an [`AliasGenerator`]. Two instances of the same
//! physical table are different tables, which is what makes self-joins
//! possible. Columns keep a back-reference to their owning table so that the
//! generators can qualify them with the table alias when a statement involves
//! more than one table.
//!
//! These types are normally produced by `#[derive(Table)]`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{QueryError, Result};
use crate::value::{ColumnValue, DbType};

/// Hands out short hexadecimal table aliases.
#[derive(Debug, Default)]
pub struct AliasGenerator {
    next: AtomicU64,
}

static GLOBAL_ALIASES: AliasGenerator = AliasGenerator::new();

impl AliasGenerator {
    /// Creates an isolated generator starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// The process-wide generator used by [`Table::new`].
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_ALIASES
    }

    /// Returns the next alias, `_` followed by lowercase hex.
    pub fn next_alias(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("_{n:x}")
    }
}

#[derive(Debug)]
struct TableInner {
    schema: Option<&'static str>,
    name: &'static str,
    enclose: bool,
    alias: String,
}

/// A table instance.
///
/// Cloning is cheap and yields a handle to the *same* instance; equality is
/// identity, not name.
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    /// Creates a table instance with an alias from the global generator.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyTableName`] if `name` is empty.
    pub fn new(schema: Option<&'static str>, name: &'static str) -> Result<Self> {
        Self::with_generator(AliasGenerator::global(), schema, name)
    }

    /// Creates a table instance with an alias from `aliases`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyTableName`] if `name` is empty.
    pub fn with_generator(
        aliases: &AliasGenerator,
        schema: Option<&'static str>,
        name: &'static str,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(QueryError::EmptyTableName);
        }
        Ok(Self::from_parts(schema, name, false, aliases.next_alias()))
    }

    /// Constructor for derived descriptors, whose names are checked at compile time.
    #[doc(hidden)]
    #[must_use]
    pub fn __derived(schema: Option<&'static str>, name: &'static str, enclose: bool) -> Self {
        Self::from_parts(schema, name, enclose, AliasGenerator::global().next_alias())
    }

    fn from_parts(
        schema: Option<&'static str>,
        name: &'static str,
        enclose: bool,
        alias: String,
    ) -> Self {
        Self {
            inner: Arc::new(TableInner {
                schema: schema.filter(|s| !s.is_empty()),
                name,
                enclose,
                alias,
            }),
        }
    }

    /// Schema name, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&'static str> {
        self.inner.schema
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Whether the name is always quoted.
    #[must_use]
    pub fn is_enclosed(&self) -> bool {
        self.inner.enclose
    }

    /// The alias of this instance.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.inner.alias
    }

    /// Creates a typed column on this table.
    #[must_use]
    pub fn column<T: ColumnValue>(&self, name: &'static str) -> Column<T> {
        Column::new(self, name)
    }

    /// Creates a typed nullable column on this table.
    #[must_use]
    pub fn nullable_column<T: ColumnValue>(&self, name: &'static str) -> NullableColumn<T> {
        NullableColumn::new(self, name)
    }

    /// Returns true if both handles refer to the same instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl AsRef<Self> for Table {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

impl Eq for Table {}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("schema", &self.inner.schema)
            .field("name", &self.inner.name)
            .field("alias", &self.inner.alias)
            .finish()
    }
}

/// Untyped reference to a column, as stored in expression trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Owning table instance.
    pub table: Table,
    /// Column name.
    pub name: &'static str,
    /// Whether the name is always quoted.
    pub enclose: bool,
    /// Declared type.
    pub db_type: DbType,
}

macro_rules! column_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name<T> {
            column: ColumnRef,
            _type: PhantomData<fn() -> T>,
        }

        impl<T: ColumnValue> $name<T> {
            /// Creates a column on `table`.
            #[must_use]
            pub fn new(table: &Table, name: &'static str) -> Self {
                Self {
                    column: ColumnRef {
                        table: table.clone(),
                        name,
                        enclose: false,
                        db_type: T::DB_TYPE,
                    },
                    _type: PhantomData,
                }
            }
        }

        impl<T> $name<T> {
            /// Forces the column name to be quoted.
            #[must_use]
            pub fn enclose(mut self) -> Self {
                self.column.enclose = true;
                self
            }

            /// Column name.
            #[must_use]
            pub fn name(&self) -> &'static str {
                self.column.name
            }

            /// Owning table instance.
            #[must_use]
            pub fn table(&self) -> &Table {
                &self.column.table
            }

            /// Untyped reference used by expressions.
            #[must_use]
            pub fn column_ref(&self) -> &ColumnRef {
                &self.column
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                Self {
                    column: self.column.clone(),
                    _type: PhantomData,
                }
            }
        }

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("table", &self.column.table.name())
                    .field("name", &self.column.name)
                    .finish()
            }
        }
    };
}

column_type!(
    /// A column whose reads never yield `NULL`.
    ///
    /// A `NULL` met by a read (an outer join, typically) decodes to the
    /// type's sentinel default.
    Column
);

column_type!(
    /// A column that may hold `NULL`; reads yield `Option<T>`.
    NullableColumn
);

/// Implemented by table descriptors generated by `#[derive(Table)]`.
pub trait TableDef: Sized {
    /// The row type the descriptor maps to.
    type Row;

    /// SQL table name.
    const NAME: &'static str;

    /// SQL schema name, if any.
    const SCHEMA: Option<&'static str>;

    /// All column names, in declaration order.
    const COLUMNS: &'static [&'static str];

    /// Primary key column name, if any.
    const PRIMARY_KEY: Option<&'static str>;

    /// The table instance.
    fn table(&self) -> &Table;

    /// A shared process-wide instance.
    fn instance() -> &'static Self;

    /// A fresh instance with its own alias (for self-joins).
    fn fresh() -> Self;
}
