//! Error types for the HAL crate.

use anneal_ir::IrError;
use thiserror::Error;

/// Errors that can occur while preparing, running or decoding an anneal job.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Invalid or missing configuration (unknown solver, bad option value).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The program could not be compiled or bound.
    #[error("Compile error: {0}")]
    Compile(String),

    /// HTTP or network failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote service reported a terminal, non-completed status.
    #[error("Remote execution failed with status {status}")]
    RemoteExecution { status: String },

    /// The solver response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// More than one kernel was submitted at once.
    #[error("Only one kernel per submission is supported, got {0}")]
    UnsupportedBatch(usize),

    /// No valid embedding of the problem onto the hardware.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Timeout waiting for job.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IrError> for HalError {
    fn from(err: IrError) -> Self {
        HalError::Compile(err.to_string())
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
