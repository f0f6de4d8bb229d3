//! Parameter sink.
//!
//! Values are registered during the same tree walk that writes placeholders
//! into the SQL buffer, so placeholder numbering always matches bind order.

use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::value::{DbType, SqlValue};

/// How a dialect spells positional placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderStyle {
    /// `@0`, `@1`, ...
    AtZero,
    /// `$1`, `$2`, ...
    DollarOne,
}

impl PlaceholderStyle {
    /// Placeholder for the zero-based position `index`.
    #[must_use]
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::AtZero => format!("@{index}"),
            Self::DollarOne => format!("${}", index + 1),
        }
    }
}

/// One registered parameter, before values are materialised.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A value fixed when the template was built.
    Fixed(DbType, SqlValue),
    /// A prepared-query slot, filled per execution.
    Slot(usize, DbType),
}

/// A named, typed parameter ready to attach to a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Placeholder name as written in the SQL.
    pub name: String,
    /// Declared type; drivers use it to pick the parameter kind for `NULL`.
    pub db_type: DbType,
    /// Native value.
    pub value: SqlValue,
}

/// Collects parameters in encounter order.
#[derive(Debug, Clone)]
pub struct Parameters {
    style: PlaceholderStyle,
    bindings: Vec<Binding>,
}

impl Parameters {
    /// Creates an empty sink using the dialect's placeholder style.
    #[must_use]
    pub fn new<D: Dialect + ?Sized>(dialect: &D) -> Self {
        Self::with_style(dialect.placeholder_style())
    }

    /// Creates an empty sink with an explicit placeholder style.
    #[must_use]
    pub const fn with_style(style: PlaceholderStyle) -> Self {
        Self {
            style,
            bindings: Vec::new(),
        }
    }

    /// Registers a value and returns its placeholder.
    pub fn add(&mut self, db_type: DbType, value: SqlValue) -> String {
        self.push(Binding::Fixed(db_type, value))
    }

    /// Registers a prepared-query slot and returns its placeholder.
    pub fn add_slot(&mut self, index: usize, db_type: DbType) -> String {
        self.push(Binding::Slot(index, db_type))
    }

    fn push(&mut self, binding: Binding) -> String {
        let name = self.style.placeholder(self.bindings.len());
        self.bindings.push(binding);
        name
    }

    /// Number of registered parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Placeholder style in use.
    #[must_use]
    pub const fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// Registered bindings, in order.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Consumes the sink and returns its bindings.
    #[must_use]
    pub fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }

    /// Materialises the registered bindings.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnboundParameter`] if a slot has no value in `slots`.
    pub fn resolve(&self, slots: Option<&[SqlValue]>) -> Result<Vec<Parameter>> {
        resolve(self.style, &self.bindings, slots)
    }
}

/// Materialises `bindings`, taking slot values from `slots`.
///
/// # Errors
///
/// Returns [`QueryError::UnboundParameter`] if a slot has no value in `slots`.
pub fn resolve(
    style: PlaceholderStyle,
    bindings: &[Binding],
    slots: Option<&[SqlValue]>,
) -> Result<Vec<Parameter>> {
    bindings
        .iter()
        .enumerate()
        .map(|(i, binding)| {
            let (db_type, value) = match binding {
                Binding::Fixed(db_type, value) => (*db_type, value.clone()),
                Binding::Slot(index, db_type) => {
                    let value = slots
                        .and_then(|values| values.get(*index))
                        .ok_or(QueryError::UnboundParameter(*index))?;
                    (*db_type, value.clone())
                }
            };
            Ok(Parameter {
                name: style.placeholder(i),
                db_type,
                value,
            })
        })
        .collect()
}
