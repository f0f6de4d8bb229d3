//! Process-wide defaults and per-execution options.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// How values reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterMode {
    /// Values are sent as bound parameters.
    #[default]
    Bind,
    /// Values are written into the SQL text as escaped literals.
    Inline,
}

static DEFAULT_MODE: AtomicU8 = AtomicU8::new(0);

impl ParameterMode {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Bind => 0,
            Self::Inline => 1,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Inline,
            _ => Self::Bind,
        }
    }
}

/// Sets the mode used when an execution does not choose one.
pub fn set_default_parameter_mode(mode: ParameterMode) {
    DEFAULT_MODE.store(mode.to_u8(), Ordering::Relaxed);
}

/// The mode used when an execution does not choose one.
#[must_use]
pub fn default_parameter_mode() -> ParameterMode {
    ParameterMode::from_u8(DEFAULT_MODE.load(Ordering::Relaxed))
}

/// Options for one execution.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Command timeout; the database default when `None`.
    pub timeout: Option<Duration>,
    /// Parameter mode; the process default when `None`.
    pub parameter_mode: Option<ParameterMode>,
    /// Name reported in logs and to lifecycle hooks.
    pub debug_name: Option<String>,
}

impl ExecuteOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the parameter mode.
    #[must_use]
    pub fn parameter_mode(mut self, mode: ParameterMode) -> Self {
        self.parameter_mode = Some(mode);
        self
    }

    /// Sets the name reported in logs.
    #[must_use]
    pub fn debug_name(mut self, name: impl Into<String>) -> Self {
        self.debug_name = Some(name.into());
        self
    }

    /// The effective parameter mode.
    #[must_use]
    pub fn effective_mode(&self) -> ParameterMode {
        self.parameter_mode.unwrap_or_else(default_parameter_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_mode_wins() {
        let options = ExecuteOptions::new().parameter_mode(ParameterMode::Inline);
        assert_eq!(options.effective_mode(), ParameterMode::Inline);
    }

    #[test]
    fn test_mode_round_trips_through_atomic() {
        for mode in [ParameterMode::Bind, ParameterMode::Inline] {
            assert_eq!(ParameterMode::from_u8(mode.to_u8()), mode);
        }
    }
}
