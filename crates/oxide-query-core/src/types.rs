//! Type-identity primitives.
//!
//! A [`Key`] wraps a primitive value and tags it with the entity it
//! identifies, so that a `GuidKey<Customer>` cannot be passed where a
//! `GuidKey<Invoice>` is expected even though both hold a UUID.
//!
//! ```rust
//! use oxide_query_core::types::GuidKey;
//!
//! struct Customer;
//!
//! let id: GuidKey<Customer> = GuidKey::generate();
//! assert!(id.is_set());
//! assert!(!GuidKey::<Customer>::not_set().is_set());
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use uuid::Uuid;

use crate::error::DecodeError;
use crate::value::{ColumnValue, DbType, SqlValue};

/// A primitive value tagged with the entity type it identifies.
///
/// Equality, ordering and hashing use the wrapped value only.
pub struct Key<Tag, V> {
    value: V,
    _tag: PhantomData<fn() -> Tag>,
}

/// A UUID identity.
pub type GuidKey<Tag> = Key<Tag, Uuid>;
/// A string identity.
pub type StringKey<Tag> = Key<Tag, String>;
/// A 32-bit integer identity.
pub type IntKey<Tag> = Key<Tag, i32>;
/// A 16-bit integer identity.
pub type ShortKey<Tag> = Key<Tag, i16>;
/// A 64-bit integer identity.
pub type LongKey<Tag> = Key<Tag, i64>;
/// A tagged boolean.
pub type BoolValue<Tag> = Key<Tag, bool>;

impl<Tag, V> Key<Tag, V> {
    /// Wraps a value.
    #[must_use]
    pub const fn new(value: V) -> Self {
        Self {
            value,
            _tag: PhantomData,
        }
    }

    /// Returns the wrapped value.
    #[must_use]
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the key and returns the wrapped value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }
}

impl<Tag, V: ColumnValue + PartialEq> Key<Tag, V> {
    /// The unset key: the wrapped type's null sentinel.
    #[must_use]
    pub fn not_set() -> Self {
        Self::new(V::null_default())
    }

    /// Returns true unless this is the unset key.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.value != V::null_default()
    }
}

impl<Tag> Key<Tag, Uuid> {
    /// Generates a random key.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4())
    }
}

impl<Tag, V: Clone> Clone for Key<Tag, V> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<Tag, V: Copy> Copy for Key<Tag, V> {}

impl<Tag, V: PartialEq> PartialEq for Key<Tag, V> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<Tag, V: Eq> Eq for Key<Tag, V> {}

impl<Tag, V: PartialOrd> PartialOrd for Key<Tag, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<Tag, V: Ord> Ord for Key<Tag, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<Tag, V: Hash> Hash for Key<Tag, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<Tag, V: fmt::Debug> fmt::Debug for Key<Tag, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.value).finish()
    }
}

impl<Tag, V: fmt::Display> fmt::Display for Key<Tag, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<Tag, V: ColumnValue + PartialEq> Default for Key<Tag, V> {
    fn default() -> Self {
        Self::not_set()
    }
}

impl<Tag: 'static, V: ColumnValue> ColumnValue for Key<Tag, V> {
    const DB_TYPE: DbType = V::DB_TYPE;

    fn to_sql_value(&self) -> SqlValue {
        self.value.to_sql_value()
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        V::from_sql_value(value).map(Self::new)
    }

    fn null_default() -> Self {
        Self::new(V::null_default())
    }
}

/// Integer representation backing a [`DbEnum`].
pub trait EnumRepr: ColumnValue + Copy + Into<i64> + TryFrom<i64> {}

impl EnumRepr for u8 {}
impl EnumRepr for i16 {}
impl EnumRepr for i32 {}
impl EnumRepr for i64 {}

/// An enum stored as an integer column.
///
/// The [`Default`] variant is returned when a non-nullable read meets `NULL`.
///
/// ```rust
/// use oxide_query_core::types::DbEnum;
///
/// #[derive(Debug, Clone, Copy, Default, PartialEq)]
/// enum Status {
///     #[default]
///     Draft,
///     Sent,
/// }
///
/// impl DbEnum for Status {
///     type Repr = i16;
///
///     fn to_repr(self) -> i16 {
///         self as i16
///     }
///
///     fn from_repr(repr: i16) -> Option<Self> {
///         match repr {
///             0 => Some(Self::Draft),
///             1 => Some(Self::Sent),
///             _ => None,
///         }
///     }
/// }
///
/// assert_eq!(Status::from_repr(1), Some(Status::Sent));
/// ```
pub trait DbEnum: Copy + Default + Send + Sync + 'static {
    /// The integer type stored in the database.
    type Repr: EnumRepr;

    /// Converts the variant to its stored integer.
    fn to_repr(self) -> Self::Repr;

    /// Converts a stored integer back, or `None` if no variant matches.
    fn from_repr(repr: Self::Repr) -> Option<Self>;
}

impl<E: DbEnum> ColumnValue for E {
    const DB_TYPE: DbType = <E::Repr as ColumnValue>::DB_TYPE;

    fn to_sql_value(&self) -> SqlValue {
        self.to_repr().to_sql_value()
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, DecodeError> {
        let raw = value.as_integer();
        let repr = E::Repr::from_sql_value(value)?;
        Self::from_repr(repr).ok_or_else(|| DecodeError::UnknownEnumValue {
            type_name: std::any::type_name::<E>(),
            value: raw.unwrap_or_else(|| repr.into()),
        })
    }

    fn null_default() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Customer;

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    enum Priority {
        #[default]
        Low,
        High,
    }

    impl DbEnum for Priority {
        type Repr = u8;

        fn to_repr(self) -> u8 {
            self as u8
        }

        fn from_repr(repr: u8) -> Option<Self> {
            match repr {
                0 => Some(Self::Low),
                1 => Some(Self::High),
                _ => None,
            }
        }
    }

    #[test]
    fn test_key_equality_ignores_tag_bounds() {
        let a = IntKey::<Customer>::new(5);
        let b = IntKey::<Customer>::new(5);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_not_set() {
        assert!(!GuidKey::<Customer>::not_set().is_set());
        assert!(GuidKey::<Customer>::generate().is_set());
        assert!(!StringKey::<Customer>::default().is_set());
        assert!(LongKey::<Customer>::new(1).is_set());
    }

    #[test]
    fn test_key_round_trips_through_primitive() {
        let key = ShortKey::<Customer>::new(12);
        assert_eq!(key.to_sql_value(), SqlValue::SmallInt(12));
        assert_eq!(
            ShortKey::<Customer>::from_sql_value(SqlValue::SmallInt(12)),
            Ok(key)
        );
    }

    #[test]
    fn test_enum_widened_from_narrow_integer() {
        assert_eq!(
            Priority::from_sql_value(SqlValue::BigInt(1)),
            Ok(Priority::High)
        );
        assert_eq!(<Priority as ColumnValue>::DB_TYPE, DbType::TinyInt);
    }

    #[test]
    fn test_enum_unknown_value() {
        let err = Priority::from_sql_value(SqlValue::TinyInt(9)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownEnumValue { value: 9, .. }
        ));
    }

    #[test]
    fn test_enum_null_default() {
        assert_eq!(<Priority as ColumnValue>::null_default(), Priority::Low);
    }
}
