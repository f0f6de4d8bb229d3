//! Named database handles.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::connection::ConnectionProvider;
use super::events::QueryEvents;
use crate::dialect::Dialect;

struct Inner<P> {
    name: String,
    provider: P,
    default_timeout: Option<Duration>,
    events: Option<Arc<dyn QueryEvents>>,
}

/// A named database reached through a [`ConnectionProvider`].
///
/// Cheap to clone; clones refer to the same database.
pub struct Database<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for Database<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> fmt::Debug for Database<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.inner.name)
            .field("default_timeout", &self.inner.default_timeout)
            .field("events", &self.inner.events.is_some())
            .finish_non_exhaustive()
    }
}

impl<P: ConnectionProvider> Database<P> {
    /// Creates a handle with no default timeout and no hooks.
    pub fn new(name: impl Into<String>, provider: P) -> Self {
        Self::with_options(name, provider, None, None)
    }

    /// Creates a handle with a default timeout and optional hooks.
    pub fn with_options(
        name: impl Into<String>,
        provider: P,
        default_timeout: Option<Duration>,
        events: Option<Arc<dyn QueryEvents>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                provider,
                default_timeout,
                events,
            }),
        }
    }

    /// Database name, as reported to hooks.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The connection provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    /// The dialect the database speaks.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.inner.provider.dialect()
    }

    /// Timeout for commands that do not set one.
    #[must_use]
    pub fn default_timeout(&self) -> Option<Duration> {
        self.inner.default_timeout
    }

    /// Lifecycle hooks.
    #[must_use]
    pub fn events(&self) -> Option<&dyn QueryEvents> {
        self.inner.events.as_deref()
    }

    /// Whether both handles refer to the same database.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
