//! Abstract syntax tree for QMI kernel source.

use anneal_ir::{AnnealDirection, ParameterExpression};
use serde::{Deserialize, Serialize};

/// A parsed QMI source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Kernel declarations in source order.
    pub kernels: Vec<KernelDecl>,
}

/// `__qpu__ name(Type p, ...) { ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Statement>,
    /// Line of the `__qpu__` keyword.
    pub line: usize,
}

/// A typed kernel parameter, e.g. `double x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub ty: String,
    pub name: String,
}

/// A literal number or a parameter reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Ident(String),
}

impl Value {
    /// Convert to an IR parameter expression.
    pub fn to_parameter(&self) -> ParameterExpression {
        match self {
            Value::Number(v) => ParameterExpression::Constant(*v),
            Value::Ident(name) => ParameterExpression::Symbol(name.clone()),
        }
    }
}

/// A statement inside a kernel body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Coupling or bias term: `a b weight;`
    Term { a: u32, b: u32, weight: Value },

    /// Anneal directive: `anneal ta tp tq [forward|reverse];`
    Anneal {
        ta: Value,
        tp: Value,
        tq: Value,
        direction: AnnealDirection,
    },

    /// Kernel call: `name(args);`
    Call { callee: String, args: Vec<Value> },
}
