//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building or evaluating annealing programs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A symbolic value references a name the kernel does not declare.
    #[error("'{name}' is not a parameter of kernel '{kernel}'")]
    UnboundParameter {
        /// The unresolved symbol.
        name: String,
        /// Kernel in which the symbol was used.
        kernel: String,
    },

    /// A symbol has no value in the supplied bindings.
    #[error("No value bound for symbol '{0}'")]
    UnresolvedSymbol(String),

    /// A kernel contains more than one anneal directive.
    #[error("Kernel '{0}' already has an anneal directive; only one is allowed")]
    DuplicateAnneal(String),

    /// The anneal schedule parameters do not describe a valid schedule.
    #[error("Invalid anneal schedule: {0}")]
    InvalidSchedule(String),

    /// A kernel call passes the wrong number of arguments.
    #[error("Kernel '{kernel}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        /// The called kernel.
        kernel: String,
        /// Number of declared parameters.
        expected: usize,
        /// Number of arguments supplied.
        got: usize,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
