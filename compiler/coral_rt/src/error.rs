//! Runtime error taxonomy.
//!
//! Every variant is a programmer or code-generator error: the runtime never
//! recovers from one. Internal code propagates them with `?`; the C ABI layer
//! hands them to [`crate::fatal::report_fatal`], which terminates the process.

use thiserror::Error;

/// Result of a fallible runtime operation.
pub type RtResult<T> = Result<T, RuntimeError>;

/// A violated runtime precondition.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("received null value")]
    NullValue { operation: &'static str },

    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{op}' cannot be applied between {left} and {right}")]
    InvalidOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("equality cannot be applied between {left} and {right}")]
    EqualityNotApplicable {
        left: &'static str,
        right: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("{type_name} is not a callable")]
    NotCallable { type_name: &'static str },

    #[error("function expects {expected} arguments, but got {found}")]
    ArityMismatch { expected: u16, found: usize },

    #[error("function returned no value")]
    NullResult,

    #[error("tried to push to a full array (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("index {index} out of bounds for capacity {capacity}")]
    IndexOutOfBounds { index: usize, capacity: usize },

    #[error("unknown value kind {code:#04x}")]
    UnknownKind { code: u8 },

    #[error("value nesting exceeds the maximum depth of {limit}")]
    DepthExceeded { limit: usize },

    #[error("cannot set a global of a function while it is running")]
    GlobalsBusy,

    #[error("failed to write output: {message}")]
    Output { message: String },
}

impl RuntimeError {
    /// Shorthand for a [`RuntimeError::TypeMismatch`].
    pub(crate) fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        RuntimeError::TypeMismatch { expected, found }
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::Output {
            message: err.to_string(),
        }
    }
}
