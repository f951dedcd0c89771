//! Rescaling of problem weights into a solver's allowed ranges.
//!
//! Couplings and biases are checked independently. When the observed
//! weights of a kind leave the solver's range, every weight of that kind is
//! divided by `max(|min|, |max|)`. In-range weights are left untouched, so
//! normalizing twice changes nothing.

use anneal_hal::{SolverDescriptor, WeightRange};
use tracing::debug;

use crate::problem::IsingProblem;

/// Divisors applied by [`normalize`], if any.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Normalization {
    pub coupling_divisor: Option<f64>,
    pub bias_divisor: Option<f64>,
}

/// Divisor that brings `weights` into `range`, or `None` when they already
/// fit, there is no range, no weights, or all weights are zero.
pub fn divisor(weights: impl IntoIterator<Item = f64>, range: Option<WeightRange>) -> Option<f64> {
    let range = range?;
    let (min, max) = weights
        .into_iter()
        .fold(None, |acc: Option<(f64, f64)>, w| match acc {
            None => Some((w, w)),
            Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
        })?;

    if min >= range.min && max <= range.max {
        return None;
    }
    let divisor = min.abs().max(max.abs());
    (divisor > 0.0).then_some(divisor)
}

/// Normalize couplings against the solver's j range and, when
/// `include_biases` is set, biases against its h range.
pub fn normalize(
    problem: &mut IsingProblem,
    solver: &SolverDescriptor,
    include_biases: bool,
) -> Normalization {
    let coupling_divisor = divisor(
        problem.terms().iter().filter(|t| !t.is_bias()).map(|t| t.weight),
        solver.j_range,
    );
    let bias_divisor = if include_biases {
        divisor(
            problem.terms().iter().filter(|t| t.is_bias()).map(|t| t.weight),
            solver.h_range,
        )
    } else {
        None
    };

    for term in problem.terms_mut() {
        let d = if term.is_bias() {
            bias_divisor
        } else {
            coupling_divisor
        };
        if let Some(d) = d {
            term.weight /= d;
        }
    }

    if coupling_divisor.is_some() || bias_divisor.is_some() {
        debug!(
            ?coupling_divisor,
            ?bias_divisor,
            solver = %solver.name,
            "rescaled weights into solver range"
        );
    }
    Normalization {
        coupling_divisor,
        bias_divisor,
    }
}
