//! Kernel instructions: QMI coupling terms and anneal directives.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;

/// Direction of an anneal schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnnealDirection {
    /// Anneal fraction ramps up from 0 towards 1.
    #[default]
    Forward,
    /// Anneal fraction starts at 1 and ramps down.
    Reverse,
}

impl fmt::Display for AnnealDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnealDirection::Forward => write!(f, "forward"),
            AnnealDirection::Reverse => write!(f, "reverse"),
        }
    }
}

/// A quantum macro instruction: `a b weight`.
///
/// When `a == b` the term is a bias on that qubit, otherwise it is the
/// coupling strength between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingTerm {
    /// First qubit.
    pub a: QubitId,
    /// Second qubit.
    pub b: QubitId,
    /// Bias or coupling weight.
    pub weight: ParameterExpression,
}

impl CouplingTerm {
    /// Whether this term is a bias (self-loop).
    pub fn is_bias(&self) -> bool {
        self.a == self.b
    }
}

/// Anneal schedule directive `(ta, tp, tq, direction)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnealDirective {
    /// Total anneal time.
    pub ta: ParameterExpression,
    /// Time at which the pause begins.
    pub tp: ParameterExpression,
    /// Time at which the pause ends.
    pub tq: ParameterExpression,
    /// Ramp direction.
    pub direction: AnnealDirection,
}

impl AnnealDirective {
    /// Create an anneal directive.
    pub fn new(
        ta: impl Into<ParameterExpression>,
        tp: impl Into<ParameterExpression>,
        tq: impl Into<ParameterExpression>,
        direction: AnnealDirection,
    ) -> Self {
        Self {
            ta: ta.into(),
            tp: tp.into(),
            tq: tq.into(),
            direction,
        }
    }

    /// The three time parameters in declaration order.
    pub fn times(&self) -> [&ParameterExpression; 3] {
        [&self.ta, &self.tp, &self.tq]
    }
}

/// A single kernel instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Bias or coupling term.
    Coupling(CouplingTerm),
    /// Anneal schedule directive.
    Anneal(AnnealDirective),
}

impl Instruction {
    /// Create a coupling (or bias, when `a == b`) instruction.
    pub fn coupling(
        a: impl Into<QubitId>,
        b: impl Into<QubitId>,
        weight: impl Into<ParameterExpression>,
    ) -> Self {
        Instruction::Coupling(CouplingTerm {
            a: a.into(),
            b: b.into(),
            weight: weight.into(),
        })
    }

    /// Create an anneal instruction.
    pub fn anneal(directive: AnnealDirective) -> Self {
        Instruction::Anneal(directive)
    }

    /// Get the coupling term if this is one.
    pub fn as_coupling(&self) -> Option<&CouplingTerm> {
        match self {
            Instruction::Coupling(term) => Some(term),
            Instruction::Anneal(_) => None,
        }
    }

    /// Get the anneal directive if this is one.
    pub fn as_anneal(&self) -> Option<&AnnealDirective> {
        match self {
            Instruction::Anneal(directive) => Some(directive),
            Instruction::Coupling(_) => None,
        }
    }

    /// Check if this is an anneal directive.
    pub fn is_anneal(&self) -> bool {
        matches!(self, Instruction::Anneal(_))
    }

    /// Every parameter expression this instruction carries.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            Instruction::Coupling(term) => vec![&term.weight],
            Instruction::Anneal(directive) => directive.times().to_vec(),
        }
    }

    /// Apply `f` to every parameter expression, returning a new instruction.
    pub fn map_parameters(&self, f: impl Fn(&ParameterExpression) -> ParameterExpression) -> Self {
        match self {
            Instruction::Coupling(term) => Instruction::Coupling(CouplingTerm {
                a: term.a,
                b: term.b,
                weight: f(&term.weight),
            }),
            Instruction::Anneal(d) => Instruction::Anneal(AnnealDirective {
                ta: f(&d.ta),
                tp: f(&d.tp),
                tq: f(&d.tq),
                direction: d.direction,
            }),
        }
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Coupling(_) => "qmi",
            Instruction::Anneal(_) => "anneal",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Coupling(t) => write!(f, "{} {} {}", t.a, t.b, t.weight),
            Instruction::Anneal(d) => {
                write!(f, "anneal {} {} {} {}", d.ta, d.tp, d.tq, d.direction)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupling_instruction() {
        let inst = Instruction::coupling(0u32, 1u32, 0.5);
        let term = inst.as_coupling().unwrap();
        assert!(!term.is_bias());
        assert_eq!(inst.name(), "qmi");
        assert_eq!(inst.to_string(), "0 1 0.5");
    }

    #[test]
    fn test_bias_instruction() {
        let inst = Instruction::coupling(3u32, 3u32, -1.0);
        assert!(inst.as_coupling().unwrap().is_bias());
    }

    #[test]
    fn test_anneal_instruction() {
        let inst = Instruction::anneal(AnnealDirective::new(20.0, "tp", 15.0, AnnealDirection::Reverse));
        assert!(inst.is_anneal());
        assert_eq!(inst.parameters().len(), 3);
        assert_eq!(inst.to_string(), "anneal 20 tp 15 reverse");
    }

    #[test]
    fn test_map_parameters() {
        let inst = Instruction::coupling(0u32, 1u32, "x");
        let bound = inst.map_parameters(|p| p.bind("x", 2.0));
        assert_eq!(bound.as_coupling().unwrap().weight.as_f64(), Some(2.0));
    }
}
