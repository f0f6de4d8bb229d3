//! Query lifecycle hooks.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use tracing::warn;

use super::IsolationLevel;
use crate::error::ExecError;
use crate::query::QueryKind;

/// Reported before a command is sent.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecuting<'a> {
    /// Database name.
    pub database: &'a str,
    /// SQL text as sent.
    pub sql: &'a str,
    /// Statement kind.
    pub kind: QueryKind,
    /// Isolation level when run inside a transaction.
    pub isolation: Option<IsolationLevel>,
    /// Command timeout.
    pub timeout: Option<Duration>,
    /// Caller-supplied name.
    pub debug_name: Option<&'a str>,
}

/// Reported after a command completes or fails.
#[derive(Debug, Clone, Copy)]
pub struct QueryPerformed<'a> {
    /// What was reported before execution.
    pub executing: QueryExecuting<'a>,
    /// Rows decoded, for row-returning statements.
    pub rows: Option<usize>,
    /// Rows affected as reported by the server.
    pub rows_affected: u64,
    /// Wall time including connection acquisition.
    pub elapsed: Duration,
    /// The failure, if the command failed.
    pub error: Option<&'a ExecError>,
}

/// Observer of query execution.
///
/// Both methods default to doing nothing. A panic raised by either is caught
/// and logged; it never reaches the caller.
pub trait QueryEvents: Send + Sync {
    /// Called before the command is sent.
    fn query_executing(&self, _event: &QueryExecuting<'_>) {}

    /// Called after the command completes, successfully or not.
    fn query_performed(&self, _event: &QueryPerformed<'_>) {}
}

/// Runs a hook, swallowing any panic.
pub(crate) fn notify(hook: &str, call: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(call)).is_err() {
        warn!(hook, "Query lifecycle hook panicked; ignoring");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_panicking_hook_is_swallowed() {
        let calls = AtomicUsize::new(0);
        notify("query_executing", || {
            calls.fetch_add(1, Ordering::SeqCst);
            panic!("hook failure");
        });
        notify("query_performed", || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
