//! Annealing kernels (named QMI programs).
//!
//! A [`Kernel`] is created through a [`KernelBuilder`] while a kernel block
//! is being read and is immutable once [`KernelBuilder::finish`] has built
//! its [`InteractionGraph`].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::graph::InteractionGraph;
use crate::instruction::{AnnealDirective, CouplingTerm, Instruction};
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;

/// A finalized annealing program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kernel {
    name: String,
    parameters: Vec<String>,
    instructions: Vec<Instruction>,
    max_bit_idx: u32,
    #[serde(skip)]
    graph: InteractionGraph,
}

impl Kernel {
    /// Kernel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter names, in order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Instructions in program order (called kernels already inlined).
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Coupling and bias terms in program order.
    pub fn coupling_terms(&self) -> impl Iterator<Item = &CouplingTerm> + '_ {
        self.instructions.iter().filter_map(Instruction::as_coupling)
    }

    /// The anneal directive, if the kernel has one.
    pub fn anneal(&self) -> Option<&AnnealDirective> {
        self.instructions.iter().find_map(Instruction::as_anneal)
    }

    /// Largest qubit index referenced by any term.
    pub fn max_bit_idx(&self) -> u32 {
        self.max_bit_idx
    }

    /// Number of logical variables (`max_bit_idx + 1`).
    pub fn num_vertices(&self) -> usize {
        self.max_bit_idx as usize + 1
    }

    /// The logical problem graph.
    pub fn graph(&self) -> &InteractionGraph {
        &self.graph
    }

    /// Whether every parameter of every instruction is a constant.
    pub fn is_bound(&self) -> bool {
        self.instructions
            .iter()
            .flat_map(Instruction::parameters)
            .all(|p| !p.is_symbolic())
    }

    /// Bind parameter values, returning a new kernel.
    ///
    /// Symbols without an entry in `bindings` are left symbolic.
    pub fn bind(&self, bindings: &FxHashMap<String, f64>) -> Kernel {
        let instructions: Vec<Instruction> = self
            .instructions
            .iter()
            .map(|inst| inst.map_parameters(|p| p.bind_all(bindings)))
            .collect();
        let graph = InteractionGraph::from_instructions(self.num_vertices(), &instructions);
        Kernel {
            name: self.name.clone(),
            parameters: self.parameters.clone(),
            instructions,
            max_bit_idx: self.max_bit_idx,
            graph,
        }
    }

    /// Rebuild the interaction graph (e.g. after deserialization).
    pub fn rebuild_graph(&mut self) {
        self.graph = InteractionGraph::from_instructions(self.num_vertices(), &self.instructions);
    }
}

/// Builder used while a kernel block is open.
#[derive(Debug, Clone)]
pub struct KernelBuilder {
    name: String,
    parameters: Vec<String>,
    instructions: Vec<Instruction>,
    max_bit_idx: u32,
    has_anneal: bool,
}

impl KernelBuilder {
    /// Start a kernel with the given declared parameter names.
    pub fn new<S: Into<String>>(name: impl Into<String>, parameters: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            instructions: Vec::new(),
            max_bit_idx: 0,
            has_anneal: false,
        }
    }

    /// Kernel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter names.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    fn check_bound(&self, param: &ParameterExpression) -> IrResult<()> {
        match param.as_symbol() {
            Some(name) if !self.parameters.iter().any(|p| p == name) => {
                Err(IrError::UnboundParameter {
                    name: name.to_string(),
                    kernel: self.name.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Append a coupling term (a bias when `a == b`).
    pub fn coupling(
        &mut self,
        a: impl Into<QubitId>,
        b: impl Into<QubitId>,
        weight: impl Into<ParameterExpression>,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::coupling(a, b, weight))
    }

    /// Append the anneal directive.
    pub fn anneal(&mut self, directive: AnnealDirective) -> IrResult<&mut Self> {
        self.push(Instruction::Anneal(directive))
    }

    /// Append any instruction, enforcing parameter binding and the single
    /// anneal rule.
    pub fn push(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        for param in instruction.parameters() {
            self.check_bound(param)?;
        }
        match &instruction {
            Instruction::Coupling(term) => {
                self.max_bit_idx = self.max_bit_idx.max(term.a.0).max(term.b.0);
            }
            Instruction::Anneal(_) => {
                if self.has_anneal {
                    return Err(IrError::DuplicateAnneal(self.name.clone()));
                }
                self.has_anneal = true;
            }
        }
        self.instructions.push(instruction);
        Ok(self)
    }

    /// Inline a previously finished kernel.
    ///
    /// With no arguments the callee's symbols must already be parameters of
    /// this kernel. Otherwise `args` binds the callee's parameters
    /// positionally.
    pub fn call(&mut self, callee: &Kernel, args: &[ParameterExpression]) -> IrResult<&mut Self> {
        if !args.is_empty() && args.len() != callee.parameters().len() {
            return Err(IrError::ArityMismatch {
                kernel: callee.name().to_string(),
                expected: callee.parameters().len(),
                got: args.len(),
            });
        }

        for inst in callee.instructions() {
            let inlined = if args.is_empty() {
                inst.clone()
            } else {
                inst.map_parameters(|p| {
                    p.as_symbol()
                        .and_then(|s| callee.parameters().iter().position(|n| n == s))
                        .map_or_else(|| p.clone(), |i| args[i].clone())
                })
            };
            self.push(inlined)?;
        }
        Ok(self)
    }

    /// Close the block: build the interaction graph of `max_bit_idx + 1`
    /// vertices.
    pub fn finish(self) -> Kernel {
        let graph =
            InteractionGraph::from_instructions(self.max_bit_idx as usize + 1, &self.instructions);
        Kernel {
            name: self.name,
            parameters: self.parameters,
            instructions: self.instructions,
            max_bit_idx: self.max_bit_idx,
            graph,
        }
    }
}
