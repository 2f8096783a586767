//! Structured error types for the simulation kernel.
//!
//! All fallible public APIs return `Result<T, SimError>`. Every error is a
//! programming or configuration mistake and is fail-fast: the engine stops
//! on the first one. Balking at a full queue or server is a modeled
//! outcome and never surfaces here.

use thiserror::Error;

use crate::time::SimTime;

/// Coarse classification of a [`SimError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required input is missing or does not belong to the callee.
    InvalidArgument,
    /// A numeric input lies outside its permitted range.
    OutOfRange,
    /// The call is not allowed in the callee's current lifecycle state.
    InvalidOperation,
}

/// The top-level error type for the simulation kernel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A required input was not supplied or was addressed to the wrong owner.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A configuration value or call argument is out of range.
    #[error("{what} out of range: {detail}")]
    OutOfRange { what: &'static str, detail: String },

    /// Attempted to schedule an event earlier than the current clock.
    #[error("cannot schedule event at {requested} when clock is at {current}")]
    NonCausalEvent { requested: SimTime, current: SimTime },

    /// The operation is not valid in the current state (e.g. before initialize).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl SimError {
    /// Map the error onto the kernel's three-way taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            SimError::OutOfRange { .. } | SimError::NonCausalEvent { .. } => {
                ErrorKind::OutOfRange
            }
            SimError::InvalidOperation(_) => ErrorKind::InvalidOperation,
        }
    }

    pub(crate) fn out_of_range(what: &'static str, detail: impl Into<String>) -> Self {
        SimError::OutOfRange {
            what,
            detail: detail.into(),
        }
    }

    pub(crate) fn not_initialized(component: impl std::fmt::Display) -> Self {
        SimError::InvalidOperation(format!("{} used before initialize", component))
    }
}

/// Convenience alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;
