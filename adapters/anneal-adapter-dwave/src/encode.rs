//! Job submission payloads.
//!
//! ```text
//! [{
//!   "solver": "DW_2000Q_VFYC_1",
//!   "type": "ising",
//!   "data": "2048 3\n0 0 1.5\n1 1 -2\n0 1 0.5",
//!   "params": { "num_reads": 100, "annealing_time": 20 }
//! }]
//! ```
//!
//! `annealing_time` is always sent. A schedule generated from an anneal
//! directive travels with the result buffer, not with the request.

use anneal_hal::{HalError, HalResult, SolverDescriptor};
use anneal_ir::Kernel;

use crate::api::{ProblemParams, ProblemSubmission};
use crate::problem::IsingProblem;

/// Problem type tag of every submission.
pub const PROBLEM_TYPE: &str = "ising";

/// The single kernel of a submission.
pub fn single_kernel(kernels: &[Kernel]) -> HalResult<&Kernel> {
    match kernels {
        [kernel] => Ok(kernel),
        [] => Err(HalError::Configuration("no kernel to submit".into())),
        _ => Err(HalError::UnsupportedBatch(kernels.len())),
    }
}

/// Build the submission for an embedded, normalized problem.
pub fn encode(
    problem: &IsingProblem,
    solver: &SolverDescriptor,
    num_reads: u32,
    anneal_time: f64,
) -> HalResult<ProblemSubmission> {
    if num_reads == 0 {
        return Err(HalError::Configuration(
            "num_reads must be greater than 0".into(),
        ));
    }

    let annealing_time = time_value(anneal_time)?;

    Ok(ProblemSubmission {
        solver: solver.name.clone(),
        problem_type: PROBLEM_TYPE.to_string(),
        data: problem.to_data(solver.num_qubits()),
        params: ProblemParams {
            num_reads,
            annealing_time,
        },
    })
}

/// Whole anneal times go on the wire as integers.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn time_value(t: f64) -> HalResult<serde_json::Number> {
    if !(t.is_finite() && t > 0.0) {
        return Err(HalError::Configuration(format!(
            "annealing_time must be positive, got {t}"
        )));
    }
    if t.fract() == 0.0 && t <= 9_007_199_254_740_992.0 {
        return Ok(serde_json::Number::from(t as u64));
    }
    serde_json::Number::from_f64(t)
        .ok_or_else(|| HalError::Configuration(format!("annealing_time {t} is not a number")))
}
