//! Error types for the QMI compiler.

use thiserror::Error;

/// Errors that can occur while compiling QMI source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Lexer error (invalid token).
    #[error("Lexer error at line {line}: {message}")]
    LexerError { line: usize, message: String },

    /// Unexpected token.
    #[error("Unexpected token at line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// A coupling term whose qubit indices are not non-negative integers.
    #[error("Malformed instruction at line {line}: {message}")]
    MalformedInstruction { line: usize, message: String },

    /// Call to a kernel that has not been declared before the call.
    #[error("Undefined kernel: {0}")]
    UndefinedKernel(String),

    /// Two kernels share a name.
    #[error("Duplicate kernel: {0}")]
    DuplicateKernel(String),

    /// IR error during kernel construction.
    #[error("Kernel error: {0}")]
    Ir(#[from] anneal_ir::IrError),
}

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
