//! QMI Kernel Compiler
//!
//! Parses the quantum machine instruction (QMI) kernel language into
//! [`anneal_ir::Kernel`]s.
//!
//! # Syntax
//!
//! | Construct | Example |
//! |-----------|---------|
//! | Kernel | `__qpu__ name(double x) { ... }` |
//! | Bias | `0 0 1.5;` |
//! | Coupling | `0 1 -0.5;` or `0 1 x;` |
//! | Anneal schedule | `anneal 20 5 15 reverse;` |
//! | Kernel call | `other(x, 0.25);` |
//! | Comments | `// line`, `/* block */` |
//!
//! A kernel may call any kernel declared before it; the callee's terms are
//! inlined and its parameters are bound positionally to the arguments.
//!
//! # Example
//!
//! ```rust
//! use anneal_qmi::compile;
//!
//! let source = r"
//!     __qpu__ ising(double j) {
//!         0 0 1.5;
//!         1 1 -2.0;
//!         0 1 j;
//!     }
//! ";
//!
//! let kernels = compile(source).unwrap();
//! assert_eq!(kernels[0].graph().num_vertices(), 2);
//! assert!(!kernels[0].is_bound());
//! ```

mod ast;
mod error;
mod lexer;
mod parser;

pub use error::{CompileError, CompileResult};
pub use parser::{compile, parse_ast};

// Re-export AST types for advanced users
pub mod syntax {
    pub use crate::ast::*;
}
